// crates/cpl-attainment-core/src/interfaces/mod.rs
// ============================================================================
// Module: CPL Attainment Interfaces
// Description: Backend-agnostic persistence interfaces for catalog and results.
// Purpose: Define the contract surfaces used by the recalculation runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The engine reaches its data store only through two traits. [`CatalogReader`]
//! exposes the read-only curriculum, enrollment, and score data owned by other
//! subsystems. [`ResultStore`] exposes the four computed record families.
//! [`PersistenceGateway`] is the combination every orchestrator needs.
//!
//! Implementations treat each upsert as atomic: one row per key, last write
//! wins, no merged writes. Query methods return only the rows the engine is
//! allowed to aggregate (graded scores, non-stale results).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::ContributionRow;
use crate::core::Course;
use crate::core::CourseContribution;
use crate::core::CourseId;
use crate::core::Enrollment;
use crate::core::EnrollmentId;
use crate::core::OutcomeId;
use crate::core::OutcomeResult;
use crate::core::ProgramOutcome;
use crate::core::ProgramOutcomeId;
use crate::core::ProgramOutcomeResult;
use crate::core::ResultKey;
use crate::core::StageMapping;
use crate::core::StudentId;
use crate::core::SubOutcomeId;
use crate::core::SubOutcomeResult;
use crate::core::Term;
use crate::core::WeightedScore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Persistence errors surfaced by gateway implementations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store I/O error.
    #[error("attainment store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("attainment store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("attainment store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("attainment store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("attainment store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Catalog Reader
// ============================================================================

/// Read-only access to catalog, enrollment, and leaf score data.
pub trait CatalogReader {
    /// Loads an enrollment by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn enrollment(&self, enrollment_id: EnrollmentId) -> Result<Option<Enrollment>, StoreError>;

    /// Lists every enrollment of a student, regardless of status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn student_enrollments(&self, student_id: StudentId) -> Result<Vec<Enrollment>, StoreError>;

    /// Loads a course by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn course(&self, course_id: CourseId) -> Result<Option<Course>, StoreError>;

    /// Loads a program outcome by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn program_outcome(
        &self,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<ProgramOutcome>, StoreError>;

    /// Lists every active program outcome, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn active_program_outcomes(&self) -> Result<Vec<ProgramOutcomeId>, StoreError>;

    /// Lists sub-outcomes belonging to any outcome of the course.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn course_sub_outcomes(&self, course_id: CourseId) -> Result<Vec<SubOutcomeId>, StoreError>;

    /// Lists the course-level outcomes of a course.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn course_outcomes(&self, course_id: CourseId) -> Result<Vec<OutcomeId>, StoreError>;

    /// Lists program outcomes mapped to the course, either by a stage mapping
    /// or through an outcome mapping of one of the course's outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn course_program_outcomes(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<ProgramOutcomeId>, StoreError>;

    /// Loads the stage mapping of a program outcome inside a course.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn stage_mapping(
        &self,
        program_outcome_id: ProgramOutcomeId,
        course_id: CourseId,
    ) -> Result<Option<StageMapping>, StoreError>;

    /// Lists graded instrument scores mapped to a sub-outcome, weighted by the
    /// instrument mapping percentage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn instrument_scores(
        &self,
        enrollment_id: EnrollmentId,
        sub_outcome_id: SubOutcomeId,
    ) -> Result<Vec<WeightedScore>, StoreError>;

    /// Resolves the term of the student's most recent registration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the student's registrations mix
    /// unix and logical timestamps, or [`StoreError`] when the read fails.
    fn latest_term(&self, student_id: StudentId) -> Result<Option<Term>, StoreError> {
        let mut latest: Option<Enrollment> = None;
        for enrollment in self.student_enrollments(student_id)? {
            if let Some(current) = &latest {
                let Some(order) = enrollment.registered_at.partial_cmp(&current.registered_at)
                else {
                    return Err(StoreError::Invalid(format!(
                        "student {student_id} registrations mix timestamp kinds"
                    )));
                };
                if order.is_lt() {
                    continue;
                }
            }
            latest = Some(enrollment);
        }
        Ok(latest.map(|enrollment| enrollment.term))
    }
}

// ============================================================================
// SECTION: Result Store
// ============================================================================

/// Read/write access to computed records.
pub trait ResultStore {
    /// Lists non-stale sub-outcome values of an outcome, weighted by the raw
    /// sub-outcome weight percentage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn sub_outcome_scores(
        &self,
        enrollment_id: EnrollmentId,
        outcome_id: OutcomeId,
    ) -> Result<Vec<WeightedScore>, StoreError>;

    /// Lists non-stale outcome values of the course that map to a program
    /// outcome, weighted by the contribution percentage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn outcome_scores(
        &self,
        enrollment_id: EnrollmentId,
        program_outcome_id: ProgramOutcomeId,
        course_id: CourseId,
    ) -> Result<Vec<WeightedScore>, StoreError>;

    /// Lists every stored contribution of a student to a program outcome,
    /// joined with the contributing enrollment's status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn course_contributions(
        &self,
        student_id: StudentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Vec<ContributionRow>, StoreError>;

    /// Loads a level 1 record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn sub_outcome_result(
        &self,
        enrollment_id: EnrollmentId,
        sub_outcome_id: SubOutcomeId,
    ) -> Result<Option<SubOutcomeResult>, StoreError>;

    /// Loads a level 2 record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn outcome_result(
        &self,
        enrollment_id: EnrollmentId,
        outcome_id: OutcomeId,
    ) -> Result<Option<OutcomeResult>, StoreError>;

    /// Loads a level 3 record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn course_contribution(
        &self,
        enrollment_id: EnrollmentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<CourseContribution>, StoreError>;

    /// Loads a level 4 record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn program_outcome_result(
        &self,
        student_id: StudentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<ProgramOutcomeResult>, StoreError>;

    /// Inserts or replaces a level 1 record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert_sub_outcome_result(&self, result: &SubOutcomeResult) -> Result<(), StoreError>;

    /// Inserts or replaces a level 2 record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert_outcome_result(&self, result: &OutcomeResult) -> Result<(), StoreError>;

    /// Inserts or replaces a level 3 record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert_course_contribution(&self, result: &CourseContribution) -> Result<(), StoreError>;

    /// Inserts or replaces a level 4 record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn upsert_program_outcome_result(
        &self,
        result: &ProgramOutcomeResult,
    ) -> Result<(), StoreError>;

    /// Flags an existing record as stale, keeping its last value.
    ///
    /// Returns `true` when a record existed for the key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn mark_stale(&self, key: ResultKey) -> Result<bool, StoreError>;
}

// ============================================================================
// SECTION: Persistence Gateway
// ============================================================================

/// Full persistence collaborator used by the recalculation runtime.
pub trait PersistenceGateway: CatalogReader + ResultStore {}

impl<T> PersistenceGateway for T where T: CatalogReader + ResultStore + ?Sized {}
