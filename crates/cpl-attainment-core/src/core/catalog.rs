// crates/cpl-attainment-core/src/core/catalog.rs
// ============================================================================
// Module: CPL Attainment Catalog Records
// Description: Read-only curriculum, enrollment, and mapping records.
// Purpose: Describe the data the engine reads but never writes.
// Dependencies: crate::core::{classification, identifiers, time}, bigdecimal, serde
// ============================================================================

//! ## Overview
//! Catalog records are owned by external subsystems (registration, curriculum
//! authoring, grading). The engine only reads them through
//! [`crate::interfaces::CatalogReader`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;

use crate::core::classification::StageTag;
use crate::core::identifiers::CourseId;
use crate::core::identifiers::EnrollmentId;
use crate::core::identifiers::InstrumentId;
use crate::core::identifiers::OutcomeId;
use crate::core::identifiers::ProgramOutcomeId;
use crate::core::identifiers::StudentId;
use crate::core::identifiers::SubOutcomeId;
use crate::core::identifiers::Term;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Enrollment
// ============================================================================

/// Enrollment lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Student is currently taking the course.
    Active,
    /// Student completed and passed the course.
    Passed,
    /// Any other registrar status (withdrawn, failed, ...).
    Other(String),
}

impl EnrollmentStatus {
    /// Returns true when the enrollment feeds student-level aggregates.
    ///
    /// Compares labels, so `Other("active")` qualifies exactly like
    /// [`Self::Active`] and a stored label round-trips to the same answer.
    #[must_use]
    pub fn qualifies(&self) -> bool {
        matches!(self.as_str(), "active" | "passed")
    }

    /// Parses a stored status label; unknown labels become [`Self::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "active" => Self::Active,
            "passed" => Self::Passed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the stored status label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Passed => "passed",
            Self::Other(label) => label,
        }
    }
}

/// A student's registration in one course instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Enrollment identifier.
    pub id: EnrollmentId,
    /// Enrolled student.
    pub student_id: StudentId,
    /// Course taken.
    pub course_id: CourseId,
    /// Registrar status.
    pub status: EnrollmentStatus,
    /// Academic term of the enrollment.
    pub term: Term,
    /// Registration time; the latest registration defines a student's current term.
    pub registered_at: Timestamp,
}

// ============================================================================
// SECTION: Curriculum
// ============================================================================

/// Course catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course identifier.
    pub id: CourseId,
    /// Course code.
    pub code: String,
    /// Credit weight (SKS).
    pub credits: u32,
}

/// Program-level outcome (CPL) definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramOutcome {
    /// Program outcome identifier.
    pub id: ProgramOutcomeId,
    /// Program outcome code (e.g. `CPL-04`).
    pub code: String,
    /// Minimum passing value on the 0-4 scale.
    pub minimum_passing: BigDecimal,
    /// Inactive outcomes are skipped by the student-level pass.
    pub active: bool,
}

/// Course-level outcome (CPMK) definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Outcome identifier.
    pub id: OutcomeId,
    /// Owning course.
    pub course_id: CourseId,
}

/// Sub-outcome (Sub-CPMK) definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubOutcome {
    /// Sub-outcome identifier.
    pub id: SubOutcomeId,
    /// Parent outcome.
    pub outcome_id: OutcomeId,
    /// Weight inside the parent outcome, as a percentage.
    pub weight_percent: BigDecimal,
}

// ============================================================================
// SECTION: Mappings
// ============================================================================

/// Maps an assessment instrument onto a sub-outcome with a weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentMapping {
    /// Assessment instrument.
    pub instrument_id: InstrumentId,
    /// Sub-outcome the instrument measures.
    pub sub_outcome_id: SubOutcomeId,
    /// Instrument weight for the sub-outcome, as a percentage.
    pub weight_percent: BigDecimal,
}

/// Maps a course-level outcome onto a program outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeMapping {
    /// Course-level outcome.
    pub outcome_id: OutcomeId,
    /// Program outcome receiving the contribution.
    pub program_outcome_id: ProgramOutcomeId,
    /// Contribution percentage (not divided by 100).
    pub contribution_percent: BigDecimal,
}

/// Course to program outcome stage mapping (I/R/M/A).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMapping {
    /// Program outcome.
    pub program_outcome_id: ProgramOutcomeId,
    /// Course developing the outcome.
    pub course_id: CourseId,
    /// Development stage.
    pub stage: StageTag,
    /// Explicit stage weight; the configured stage table applies when absent.
    pub stage_weight: Option<BigDecimal>,
}

// ============================================================================
// SECTION: Leaf Scores
// ============================================================================

/// One instrument score inside one enrollment.
///
/// # Invariants
/// - `score` is on the 0-100 scale when present; `None` means not yet graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentScore {
    /// Enrollment being graded.
    pub enrollment_id: EnrollmentId,
    /// Instrument graded.
    pub instrument_id: InstrumentId,
    /// Numeric score.
    pub score: Option<BigDecimal>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::EnrollmentStatus;

    #[test]
    fn qualification_follows_the_label() {
        assert!(EnrollmentStatus::Active.qualifies());
        assert!(EnrollmentStatus::Passed.qualifies());
        assert!(EnrollmentStatus::Other("active".to_string()).qualifies());
        assert!(EnrollmentStatus::Other("passed".to_string()).qualifies());
        assert!(!EnrollmentStatus::Other("withdrawn".to_string()).qualifies());
    }

    #[test]
    fn stored_label_round_trip_keeps_qualification() {
        for status in [
            EnrollmentStatus::Other("active".to_string()),
            EnrollmentStatus::Other("failed".to_string()),
            EnrollmentStatus::Passed,
        ] {
            let restored = EnrollmentStatus::from_label(status.as_str());
            assert_eq!(restored.qualifies(), status.qualifies());
        }
    }
}
