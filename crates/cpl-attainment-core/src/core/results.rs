// crates/cpl-attainment-core/src/core/results.rs
// ============================================================================
// Module: CPL Attainment Result Records
// Description: Computed records for the four aggregation levels.
// Purpose: Define the stable shapes the engine reads back and upserts.
// Dependencies: crate::core::{catalog, classification, identifiers, time}, bigdecimal, serde
// ============================================================================

//! ## Overview
//! Each level owns one record family keyed by a unique composite key:
//!
//! | Level | Record | Key |
//! |-------|--------|-----|
//! | 1 | [`SubOutcomeResult`] | (enrollment, sub-outcome) |
//! | 2 | [`OutcomeResult`] | (enrollment, outcome) |
//! | 3 | [`CourseContribution`] | (enrollment, program outcome) |
//! | 4 | [`ProgramOutcomeResult`] | (student, program outcome) |
//!
//! A record flagged `stale` keeps its last computed value but no longer has
//! inputs backing it; stale records never feed a parent level.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;

use crate::core::catalog::EnrollmentStatus;
use crate::core::classification::AchievementStatus;
use crate::core::classification::ProgramOutcomeStatus;
use crate::core::classification::StageTag;
use crate::core::identifiers::CourseId;
use crate::core::identifiers::EnrollmentId;
use crate::core::identifiers::OutcomeId;
use crate::core::identifiers::ProgramOutcomeId;
use crate::core::identifiers::StudentId;
use crate::core::identifiers::SubOutcomeId;
use crate::core::identifiers::Term;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// A child value paired with its aggregation weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedScore {
    /// Child value.
    pub value: BigDecimal,
    /// Raw weight as stored with the mapping (percentages are not rescaled).
    pub weight: BigDecimal,
}

impl WeightedScore {
    /// Creates a weighted score.
    #[must_use]
    pub const fn new(value: BigDecimal, weight: BigDecimal) -> Self {
        Self {
            value,
            weight,
        }
    }
}

/// A per-course contribution joined with its enrollment status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRow {
    /// Stored contribution.
    pub contribution: CourseContribution,
    /// Current status of the contributing enrollment.
    pub enrollment_status: EnrollmentStatus,
}

// ============================================================================
// SECTION: Level Records
// ============================================================================

/// Level 1: sub-outcome value for one enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubOutcomeResult {
    /// Enrollment.
    pub enrollment_id: EnrollmentId,
    /// Sub-outcome.
    pub sub_outcome_id: SubOutcomeId,
    /// Weighted value on the 0-100 scale, two decimals.
    pub value: BigDecimal,
    /// Number of graded instruments that contributed.
    pub instrument_count: u32,
    /// Score classification.
    pub status: AchievementStatus,
    /// Caller-supplied computation time.
    pub computed_at: Timestamp,
    /// True when the latest recalculation found no inputs.
    pub stale: bool,
}

/// Level 2: course-level outcome (CPMK) value for one enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeResult {
    /// Enrollment.
    pub enrollment_id: EnrollmentId,
    /// Outcome.
    pub outcome_id: OutcomeId,
    /// Weighted value on the 0-100 scale, two decimals.
    pub value: BigDecimal,
    /// Score classification.
    pub status: AchievementStatus,
    /// Caller-supplied computation time.
    pub computed_at: Timestamp,
    /// True when the latest recalculation found no inputs.
    pub stale: bool,
}

/// Level 3: program outcome contribution from one enrollment's course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseContribution {
    /// Enrollment.
    pub enrollment_id: EnrollmentId,
    /// Program outcome.
    pub program_outcome_id: ProgramOutcomeId,
    /// Enrolled student.
    pub student_id: StudentId,
    /// Course of the enrollment.
    pub course_id: CourseId,
    /// Contribution value normalized to 0-100, two decimals.
    pub value: BigDecimal,
    /// Development stage of the outcome in this course.
    pub stage: StageTag,
    /// Stage weight used by stage-weighted aggregation.
    pub stage_weight: BigDecimal,
    /// Course credit weight (SKS).
    pub credits: u32,
    /// Term of the enrollment.
    pub term: Term,
    /// Caller-supplied computation time.
    pub computed_at: Timestamp,
    /// True when the latest recalculation found no inputs.
    pub stale: bool,
}

/// Level 4: student-level program outcome attainment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramOutcomeResult {
    /// Student.
    pub student_id: StudentId,
    /// Program outcome.
    pub program_outcome_id: ProgramOutcomeId,
    /// Value on the 0-4 scale, two decimals.
    pub value: BigDecimal,
    /// Number of contributing course rows.
    pub course_count: u32,
    /// Sum of contributing course credit weights.
    pub total_credits: u32,
    /// Stage-coverage classification.
    pub status: ProgramOutcomeStatus,
    /// True when `value` meets the program outcome's minimum.
    pub passing: bool,
    /// Term of the student's latest registration.
    pub latest_term: Option<Term>,
    /// Caller-supplied computation time.
    pub computed_at: Timestamp,
    /// True when the latest recalculation found no inputs.
    pub stale: bool,
}

// ============================================================================
// SECTION: Result Keys
// ============================================================================

/// Unique key of a computed record, used for stale marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ResultKey {
    /// Level 1 key.
    SubOutcome {
        /// Enrollment.
        enrollment_id: EnrollmentId,
        /// Sub-outcome.
        sub_outcome_id: SubOutcomeId,
    },
    /// Level 2 key.
    Outcome {
        /// Enrollment.
        enrollment_id: EnrollmentId,
        /// Outcome.
        outcome_id: OutcomeId,
    },
    /// Level 3 key.
    CourseContribution {
        /// Enrollment.
        enrollment_id: EnrollmentId,
        /// Program outcome.
        program_outcome_id: ProgramOutcomeId,
    },
    /// Level 4 key.
    ProgramOutcome {
        /// Student.
        student_id: StudentId,
        /// Program outcome.
        program_outcome_id: ProgramOutcomeId,
    },
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubOutcome {
                enrollment_id,
                sub_outcome_id,
            } => write!(f, "sub_outcome/{enrollment_id}/{sub_outcome_id}"),
            Self::Outcome {
                enrollment_id,
                outcome_id,
            } => write!(f, "outcome/{enrollment_id}/{outcome_id}"),
            Self::CourseContribution {
                enrollment_id,
                program_outcome_id,
            } => write!(f, "course_contribution/{enrollment_id}/{program_outcome_id}"),
            Self::ProgramOutcome {
                student_id,
                program_outcome_id,
            } => write!(f, "program_outcome/{student_id}/{program_outcome_id}"),
        }
    }
}
