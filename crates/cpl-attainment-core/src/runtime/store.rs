// crates/cpl-attainment-core/src/runtime/store.rs
// ============================================================================
// Module: CPL Attainment In-Memory Gateway
// Description: Mutex-guarded in-memory catalog and result store.
// Purpose: Provide a deterministic gateway without external dependencies.
// Dependencies: crate::{core, interfaces}, bigdecimal
// ============================================================================

//! ## Overview
//! [`InMemoryGateway`] implements both [`CatalogReader`] and [`ResultStore`]
//! over ordered maps, so every listing is returned in identifier order.
//! Clones share state. It backs unit tests and hosts that keep the catalog
//! in memory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use bigdecimal::BigDecimal;

use crate::core::ContributionRow;
use crate::core::Course;
use crate::core::CourseContribution;
use crate::core::CourseId;
use crate::core::Enrollment;
use crate::core::EnrollmentId;
use crate::core::EnrollmentStatus;
use crate::core::InstrumentId;
use crate::core::InstrumentMapping;
use crate::core::InstrumentScore;
use crate::core::Outcome;
use crate::core::OutcomeId;
use crate::core::OutcomeMapping;
use crate::core::OutcomeResult;
use crate::core::ProgramOutcome;
use crate::core::ProgramOutcomeId;
use crate::core::ProgramOutcomeResult;
use crate::core::ResultKey;
use crate::core::StageMapping;
use crate::core::StudentId;
use crate::core::SubOutcome;
use crate::core::SubOutcomeId;
use crate::core::SubOutcomeResult;
use crate::core::WeightedScore;
use crate::interfaces::CatalogReader;
use crate::interfaces::ResultStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: State
// ============================================================================

/// Catalog and result tables.
#[derive(Debug, Default)]
struct GatewayState {
    /// Enrollments by identifier.
    enrollments: BTreeMap<EnrollmentId, Enrollment>,
    /// Courses by identifier.
    courses: BTreeMap<CourseId, Course>,
    /// Program outcomes by identifier.
    program_outcomes: BTreeMap<ProgramOutcomeId, ProgramOutcome>,
    /// Course-level outcomes by identifier.
    outcomes: BTreeMap<OutcomeId, Outcome>,
    /// Sub-outcomes by identifier.
    sub_outcomes: BTreeMap<SubOutcomeId, SubOutcome>,
    /// Instrument mappings by (sub-outcome, instrument).
    instrument_mappings: BTreeMap<(SubOutcomeId, InstrumentId), InstrumentMapping>,
    /// Outcome mappings by (program outcome, outcome).
    outcome_mappings: BTreeMap<(ProgramOutcomeId, OutcomeId), OutcomeMapping>,
    /// Stage mappings by (program outcome, course).
    stage_mappings: BTreeMap<(ProgramOutcomeId, CourseId), StageMapping>,
    /// Instrument scores by (enrollment, instrument).
    scores: BTreeMap<(EnrollmentId, InstrumentId), Option<BigDecimal>>,
    /// Level 1 records.
    sub_outcome_results: BTreeMap<(EnrollmentId, SubOutcomeId), SubOutcomeResult>,
    /// Level 2 records.
    outcome_results: BTreeMap<(EnrollmentId, OutcomeId), OutcomeResult>,
    /// Level 3 records.
    contributions: BTreeMap<(EnrollmentId, ProgramOutcomeId), CourseContribution>,
    /// Level 4 records.
    program_outcome_results: BTreeMap<(StudentId, ProgramOutcomeId), ProgramOutcomeResult>,
}

impl GatewayState {
    /// Returns true when the outcome belongs to the course.
    fn outcome_in_course(&self, outcome_id: OutcomeId, course_id: CourseId) -> bool {
        self.outcomes.get(&outcome_id).is_some_and(|outcome| outcome.course_id == course_id)
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// In-memory persistence gateway.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGateway {
    /// Shared tables protected by a mutex.
    state: Arc<Mutex<GatewayState>>,
}

impl InMemoryGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the shared tables.
    fn lock(&self) -> Result<MutexGuard<'_, GatewayState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Store("attainment gateway mutex poisoned".to_string()))
    }

    /// Inserts or replaces an enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn insert_enrollment(&self, enrollment: Enrollment) -> Result<(), StoreError> {
        self.lock()?.enrollments.insert(enrollment.id, enrollment);
        Ok(())
    }

    /// Changes the status of an existing enrollment.
    ///
    /// Returns `false` when the enrollment does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn set_enrollment_status(
        &self,
        enrollment_id: EnrollmentId,
        status: EnrollmentStatus,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let Some(enrollment) = state.enrollments.get_mut(&enrollment_id) else {
            return Ok(false);
        };
        enrollment.status = status;
        Ok(true)
    }

    /// Inserts or replaces a course.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn insert_course(&self, course: Course) -> Result<(), StoreError> {
        self.lock()?.courses.insert(course.id, course);
        Ok(())
    }

    /// Inserts or replaces a program outcome.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn insert_program_outcome(&self, program_outcome: ProgramOutcome) -> Result<(), StoreError> {
        self.lock()?.program_outcomes.insert(program_outcome.id, program_outcome);
        Ok(())
    }

    /// Inserts or replaces a course-level outcome.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn insert_outcome(&self, outcome: Outcome) -> Result<(), StoreError> {
        self.lock()?.outcomes.insert(outcome.id, outcome);
        Ok(())
    }

    /// Inserts or replaces a sub-outcome.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn insert_sub_outcome(&self, sub_outcome: SubOutcome) -> Result<(), StoreError> {
        self.lock()?.sub_outcomes.insert(sub_outcome.id, sub_outcome);
        Ok(())
    }

    /// Inserts or replaces an instrument mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn insert_instrument_mapping(&self, mapping: InstrumentMapping) -> Result<(), StoreError> {
        self.lock()?
            .instrument_mappings
            .insert((mapping.sub_outcome_id, mapping.instrument_id), mapping);
        Ok(())
    }

    /// Inserts or replaces an outcome to program outcome mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn insert_outcome_mapping(&self, mapping: OutcomeMapping) -> Result<(), StoreError> {
        self.lock()?
            .outcome_mappings
            .insert((mapping.program_outcome_id, mapping.outcome_id), mapping);
        Ok(())
    }

    /// Inserts or replaces a course stage mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn insert_stage_mapping(&self, mapping: StageMapping) -> Result<(), StoreError> {
        self.lock()?
            .stage_mappings
            .insert((mapping.program_outcome_id, mapping.course_id), mapping);
        Ok(())
    }

    /// Records (or clears, with `score: None`) an instrument score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn record_score(&self, score: InstrumentScore) -> Result<(), StoreError> {
        self.lock()?.scores.insert((score.enrollment_id, score.instrument_id), score.score);
        Ok(())
    }
}

// ============================================================================
// SECTION: Catalog Reader
// ============================================================================

impl CatalogReader for InMemoryGateway {
    fn enrollment(&self, enrollment_id: EnrollmentId) -> Result<Option<Enrollment>, StoreError> {
        Ok(self.lock()?.enrollments.get(&enrollment_id).cloned())
    }

    fn student_enrollments(&self, student_id: StudentId) -> Result<Vec<Enrollment>, StoreError> {
        Ok(self
            .lock()?
            .enrollments
            .values()
            .filter(|enrollment| enrollment.student_id == student_id)
            .cloned()
            .collect())
    }

    fn course(&self, course_id: CourseId) -> Result<Option<Course>, StoreError> {
        Ok(self.lock()?.courses.get(&course_id).cloned())
    }

    fn program_outcome(
        &self,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<ProgramOutcome>, StoreError> {
        Ok(self.lock()?.program_outcomes.get(&program_outcome_id).cloned())
    }

    fn active_program_outcomes(&self) -> Result<Vec<ProgramOutcomeId>, StoreError> {
        Ok(self
            .lock()?
            .program_outcomes
            .values()
            .filter(|program_outcome| program_outcome.active)
            .map(|program_outcome| program_outcome.id)
            .collect())
    }

    fn course_sub_outcomes(&self, course_id: CourseId) -> Result<Vec<SubOutcomeId>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .sub_outcomes
            .values()
            .filter(|sub_outcome| state.outcome_in_course(sub_outcome.outcome_id, course_id))
            .map(|sub_outcome| sub_outcome.id)
            .collect())
    }

    fn course_outcomes(&self, course_id: CourseId) -> Result<Vec<OutcomeId>, StoreError> {
        Ok(self
            .lock()?
            .outcomes
            .values()
            .filter(|outcome| outcome.course_id == course_id)
            .map(|outcome| outcome.id)
            .collect())
    }

    fn course_program_outcomes(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<ProgramOutcomeId>, StoreError> {
        let state = self.lock()?;
        let staged = state
            .stage_mappings
            .values()
            .filter(|mapping| mapping.course_id == course_id)
            .map(|mapping| mapping.program_outcome_id);
        let mapped = state
            .outcome_mappings
            .values()
            .filter(|mapping| state.outcome_in_course(mapping.outcome_id, course_id))
            .map(|mapping| mapping.program_outcome_id);
        let union: BTreeSet<ProgramOutcomeId> = staged.chain(mapped).collect();
        Ok(union.into_iter().collect())
    }

    fn stage_mapping(
        &self,
        program_outcome_id: ProgramOutcomeId,
        course_id: CourseId,
    ) -> Result<Option<StageMapping>, StoreError> {
        Ok(self.lock()?.stage_mappings.get(&(program_outcome_id, course_id)).cloned())
    }

    fn instrument_scores(
        &self,
        enrollment_id: EnrollmentId,
        sub_outcome_id: SubOutcomeId,
    ) -> Result<Vec<WeightedScore>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .instrument_mappings
            .values()
            .filter(|mapping| mapping.sub_outcome_id == sub_outcome_id)
            .filter_map(|mapping| {
                let score = state.scores.get(&(enrollment_id, mapping.instrument_id))?.clone()?;
                Some(WeightedScore::new(score, mapping.weight_percent.clone()))
            })
            .collect())
    }
}

// ============================================================================
// SECTION: Result Store
// ============================================================================

impl ResultStore for InMemoryGateway {
    fn sub_outcome_scores(
        &self,
        enrollment_id: EnrollmentId,
        outcome_id: OutcomeId,
    ) -> Result<Vec<WeightedScore>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .sub_outcomes
            .values()
            .filter(|sub_outcome| sub_outcome.outcome_id == outcome_id)
            .filter_map(|sub_outcome| {
                let result = state.sub_outcome_results.get(&(enrollment_id, sub_outcome.id))?;
                (!result.stale).then(|| {
                    WeightedScore::new(result.value.clone(), sub_outcome.weight_percent.clone())
                })
            })
            .collect())
    }

    fn outcome_scores(
        &self,
        enrollment_id: EnrollmentId,
        program_outcome_id: ProgramOutcomeId,
        course_id: CourseId,
    ) -> Result<Vec<WeightedScore>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .outcome_mappings
            .values()
            .filter(|mapping| {
                mapping.program_outcome_id == program_outcome_id
                    && state.outcome_in_course(mapping.outcome_id, course_id)
            })
            .filter_map(|mapping| {
                let result = state.outcome_results.get(&(enrollment_id, mapping.outcome_id))?;
                (!result.stale).then(|| {
                    WeightedScore::new(result.value.clone(), mapping.contribution_percent.clone())
                })
            })
            .collect())
    }

    fn course_contributions(
        &self,
        student_id: StudentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Vec<ContributionRow>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .contributions
            .values()
            .filter(|contribution| {
                contribution.student_id == student_id
                    && contribution.program_outcome_id == program_outcome_id
            })
            .filter_map(|contribution| {
                let enrollment = state.enrollments.get(&contribution.enrollment_id)?;
                Some(ContributionRow {
                    contribution: contribution.clone(),
                    enrollment_status: enrollment.status.clone(),
                })
            })
            .collect())
    }

    fn sub_outcome_result(
        &self,
        enrollment_id: EnrollmentId,
        sub_outcome_id: SubOutcomeId,
    ) -> Result<Option<SubOutcomeResult>, StoreError> {
        Ok(self.lock()?.sub_outcome_results.get(&(enrollment_id, sub_outcome_id)).cloned())
    }

    fn outcome_result(
        &self,
        enrollment_id: EnrollmentId,
        outcome_id: OutcomeId,
    ) -> Result<Option<OutcomeResult>, StoreError> {
        Ok(self.lock()?.outcome_results.get(&(enrollment_id, outcome_id)).cloned())
    }

    fn course_contribution(
        &self,
        enrollment_id: EnrollmentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<CourseContribution>, StoreError> {
        Ok(self.lock()?.contributions.get(&(enrollment_id, program_outcome_id)).cloned())
    }

    fn program_outcome_result(
        &self,
        student_id: StudentId,
        program_outcome_id: ProgramOutcomeId,
    ) -> Result<Option<ProgramOutcomeResult>, StoreError> {
        Ok(self.lock()?.program_outcome_results.get(&(student_id, program_outcome_id)).cloned())
    }

    fn upsert_sub_outcome_result(&self, result: &SubOutcomeResult) -> Result<(), StoreError> {
        self.lock()?
            .sub_outcome_results
            .insert((result.enrollment_id, result.sub_outcome_id), result.clone());
        Ok(())
    }

    fn upsert_outcome_result(&self, result: &OutcomeResult) -> Result<(), StoreError> {
        self.lock()?
            .outcome_results
            .insert((result.enrollment_id, result.outcome_id), result.clone());
        Ok(())
    }

    fn upsert_course_contribution(&self, result: &CourseContribution) -> Result<(), StoreError> {
        self.lock()?
            .contributions
            .insert((result.enrollment_id, result.program_outcome_id), result.clone());
        Ok(())
    }

    fn upsert_program_outcome_result(
        &self,
        result: &ProgramOutcomeResult,
    ) -> Result<(), StoreError> {
        self.lock()?
            .program_outcome_results
            .insert((result.student_id, result.program_outcome_id), result.clone());
        Ok(())
    }

    fn mark_stale(&self, key: ResultKey) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let stale = match key {
            ResultKey::SubOutcome {
                enrollment_id,
                sub_outcome_id,
            } => state
                .sub_outcome_results
                .get_mut(&(enrollment_id, sub_outcome_id))
                .map(|record| &mut record.stale),
            ResultKey::Outcome {
                enrollment_id,
                outcome_id,
            } => state
                .outcome_results
                .get_mut(&(enrollment_id, outcome_id))
                .map(|record| &mut record.stale),
            ResultKey::CourseContribution {
                enrollment_id,
                program_outcome_id,
            } => state
                .contributions
                .get_mut(&(enrollment_id, program_outcome_id))
                .map(|record| &mut record.stale),
            ResultKey::ProgramOutcome {
                student_id,
                program_outcome_id,
            } => state
                .program_outcome_results
                .get_mut(&(student_id, program_outcome_id))
                .map(|record| &mut record.stale),
        };
        let Some(flag) = stale else {
            return Ok(false);
        };
        *flag = true;
        Ok(true)
    }
}
