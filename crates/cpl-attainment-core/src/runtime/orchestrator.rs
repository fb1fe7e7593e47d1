// crates/cpl-attainment-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: CPL Attainment Recalculation Orchestrator
// Description: Drives the four calculation levels in dependency order.
// Purpose: Recompute every record affected by an enrollment or a student.
// Dependencies: crate::{core, interfaces, runtime}, rayon, serde, tracing
// ============================================================================

//! ## Overview
//! The orchestrator owns a [`PersistenceGateway`] and a [`RecalcConfig`].
//! For one enrollment it recomputes, in order:
//! 1. every sub-outcome of the course,
//! 2. every outcome of the course,
//! 3. every program outcome mapped to the course,
//! 4. every active program outcome for the student.
//!
//! Each level reads the records the previous level just wrote. The parallel
//! student entry point runs steps 1-3 per enrollment on the rayon pool and a
//! single step 4 after all enrollments finish.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::core::Enrollment;
use crate::core::EnrollmentId;
use crate::core::StudentId;
use crate::core::Timestamp;
use crate::interfaces::PersistenceGateway;
use crate::runtime::error::CalcError;
use crate::runtime::levels::recalc_course_contribution;
use crate::runtime::levels::recalc_outcome;
use crate::runtime::levels::recalc_program_outcome;
use crate::runtime::levels::recalc_sub_outcome;
use crate::runtime::policy::RecalcConfig;

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Per-level count of recomputed and stale-flagged keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTally {
    /// Keys that produced a value and were upserted.
    pub computed: u32,
    /// Keys with no contributing data, left stale.
    pub stale: u32,
}

impl LevelTally {
    /// Records one level outcome.
    fn record<T>(&mut self, outcome: Option<&T>) {
        if outcome.is_some() {
            self.computed = self.computed.saturating_add(1);
        } else {
            self.stale = self.stale.saturating_add(1);
        }
    }

    /// Total keys visited.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.computed.saturating_add(self.stale)
    }
}

/// Summary of one enrollment recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecalcReport {
    /// Recalculated enrollment.
    pub enrollment_id: EnrollmentId,
    /// Owning student.
    pub student_id: StudentId,
    /// Level 1 tally.
    pub sub_outcomes: LevelTally,
    /// Level 2 tally.
    pub outcomes: LevelTally,
    /// Level 3 tally.
    pub course_contributions: LevelTally,
    /// Level 4 tally; zero when the student-level pass ran separately.
    pub program_outcomes: LevelTally,
}

/// Summary of one student recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecalcReport {
    /// Recalculated student.
    pub student_id: StudentId,
    /// Per-enrollment reports, in enrollment identifier order.
    pub enrollments: Vec<EnrollmentRecalcReport>,
    /// Tally of the final level 4 pass.
    pub program_outcomes: LevelTally,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Recalculation driver over a persistence gateway.
///
/// # Invariants
/// - Levels always run bottom-up; a level never reads results older than the
///   ones the previous level wrote during the same call.
#[derive(Debug, Clone)]
pub struct RecalculationOrchestrator<G> {
    /// Persistence collaborator.
    gateway: G,
    /// Calculation policy.
    config: RecalcConfig,
}

impl<G> RecalculationOrchestrator<G>
where
    G: PersistenceGateway,
{
    /// Creates an orchestrator over `gateway` with `config`.
    #[must_use]
    pub const fn new(gateway: G, config: RecalcConfig) -> Self {
        Self {
            gateway,
            config,
        }
    }

    /// Returns the persistence gateway.
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the calculation policy.
    #[must_use]
    pub const fn config(&self) -> &RecalcConfig {
        &self.config
    }

    /// Recomputes every record affected by one enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::NotFound`] when the enrollment does not resolve,
    /// or any error raised by a level calculation.
    pub fn recalc_for_enrollment(
        &self,
        enrollment_id: EnrollmentId,
        computed_at: Timestamp,
    ) -> Result<EnrollmentRecalcReport, CalcError> {
        let enrollment = self
            .gateway
            .enrollment(enrollment_id)?
            .ok_or_else(|| CalcError::not_found("enrollment", enrollment_id.get()))?;
        let mut report = self.recalc_course_levels(&enrollment, computed_at)?;
        report.program_outcomes = self.recalc_student_level(enrollment.student_id, computed_at)?;
        info!(
            enrollment_id = %enrollment_id,
            student_id = %enrollment.student_id,
            sub_outcomes = report.sub_outcomes.computed,
            outcomes = report.outcomes.computed,
            contributions = report.course_contributions.computed,
            program_outcomes = report.program_outcomes.computed,
            "enrollment recalculated"
        );
        Ok(report)
    }

    /// Recomputes every qualifying enrollment of a student in sequence.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an enrollment recalculation.
    pub fn recalc_for_student(
        &self,
        student_id: StudentId,
        computed_at: Timestamp,
    ) -> Result<StudentRecalcReport, CalcError> {
        let enrollments = self.qualifying_enrollments(student_id)?;
        let mut reports = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            reports.push(self.recalc_for_enrollment(enrollment.id, computed_at)?);
        }
        let program_outcomes = match reports.last() {
            Some(last) => last.program_outcomes,
            None => self.recalc_student_level(student_id, computed_at)?,
        };
        info!(
            student_id = %student_id,
            enrollments = reports.len(),
            program_outcomes = program_outcomes.computed,
            "student recalculated"
        );
        Ok(StudentRecalcReport {
            student_id,
            enrollments: reports,
            program_outcomes,
        })
    }

    /// Recomputes levels 1-3 of each qualifying enrollment concurrently, then
    /// runs one level 4 pass for the student.
    ///
    /// # Errors
    ///
    /// Returns an error raised by any enrollment or by the level 4 pass.
    pub fn recalc_for_student_parallel(
        &self,
        student_id: StudentId,
        computed_at: Timestamp,
    ) -> Result<StudentRecalcReport, CalcError>
    where
        G: Sync,
    {
        let enrollments = self.qualifying_enrollments(student_id)?;
        let reports = enrollments
            .par_iter()
            .map(|enrollment| self.recalc_course_levels(enrollment, computed_at))
            .collect::<Result<Vec<_>, _>>()?;
        let program_outcomes = self.recalc_student_level(student_id, computed_at)?;
        info!(
            student_id = %student_id,
            enrollments = reports.len(),
            program_outcomes = program_outcomes.computed,
            "student recalculated in parallel"
        );
        Ok(StudentRecalcReport {
            student_id,
            enrollments: reports,
            program_outcomes,
        })
    }

    /// Lists the student's active or passed enrollments by identifier.
    fn qualifying_enrollments(&self, student_id: StudentId) -> Result<Vec<Enrollment>, CalcError> {
        let mut enrollments: Vec<Enrollment> = self
            .gateway
            .student_enrollments(student_id)?
            .into_iter()
            .filter(|enrollment| enrollment.status.qualifies())
            .collect();
        enrollments.sort_by_key(|enrollment| enrollment.id);
        Ok(enrollments)
    }

    /// Runs levels 1-3 for one enrollment.
    fn recalc_course_levels(
        &self,
        enrollment: &Enrollment,
        computed_at: Timestamp,
    ) -> Result<EnrollmentRecalcReport, CalcError> {
        let mut report = EnrollmentRecalcReport {
            enrollment_id: enrollment.id,
            student_id: enrollment.student_id,
            sub_outcomes: LevelTally::default(),
            outcomes: LevelTally::default(),
            course_contributions: LevelTally::default(),
            program_outcomes: LevelTally::default(),
        };

        for sub_outcome_id in self.gateway.course_sub_outcomes(enrollment.course_id)? {
            let result = recalc_sub_outcome(&self.gateway, enrollment.id, sub_outcome_id, computed_at)?;
            report.sub_outcomes.record(result.as_ref());
        }
        for outcome_id in self.gateway.course_outcomes(enrollment.course_id)? {
            let result = recalc_outcome(&self.gateway, enrollment.id, outcome_id, computed_at)?;
            report.outcomes.record(result.as_ref());
        }
        for program_outcome_id in self.gateway.course_program_outcomes(enrollment.course_id)? {
            let result = recalc_course_contribution(
                &self.gateway,
                &self.config,
                enrollment.id,
                program_outcome_id,
                enrollment.course_id,
                computed_at,
            )?;
            report.course_contributions.record(result.as_ref());
        }
        Ok(report)
    }

    /// Runs level 4 for every active program outcome of the student.
    fn recalc_student_level(
        &self,
        student_id: StudentId,
        computed_at: Timestamp,
    ) -> Result<LevelTally, CalcError> {
        let mut tally = LevelTally::default();
        for program_outcome_id in self.gateway.active_program_outcomes()? {
            let result = recalc_program_outcome(
                &self.gateway,
                &self.config,
                student_id,
                program_outcome_id,
                computed_at,
            )?;
            tally.record(result.as_ref());
        }
        Ok(tally)
    }
}
