// crates/cpl-attainment-core/src/runtime/levels.rs
// ============================================================================
// Module: CPL Attainment Level Calculators
// Description: One stateless calculation per hierarchy level.
// Purpose: Read child values, compute the parent value, and persist it.
// Dependencies: crate::{core, interfaces, runtime}, bigdecimal, tracing
// ============================================================================

//! ## Overview
//! Every level follows the same protocol:
//! 1. read the child rows through the gateway,
//! 2. aggregate them (`None` on empty input or zero total weight),
//! 3. upsert the parent record, or flag the previous record stale when the
//!    aggregate is `None`.
//!
//! Weight conventions differ per level and are applied here, not by the
//! gateway: instruments use raw percentages, sub-outcomes use percentage/100,
//! outcome-to-program mappings use raw contribution percentages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use tracing::debug;
use tracing::warn;

use crate::core::AchievementStatus;
use crate::core::CourseContribution;
use crate::core::CourseId;
use crate::core::EnrollmentId;
use crate::core::OutcomeId;
use crate::core::OutcomeResult;
use crate::core::ProgramOutcomeId;
use crate::core::ProgramOutcomeResult;
use crate::core::ResultKey;
use crate::core::StudentId;
use crate::core::SubOutcomeId;
use crate::core::SubOutcomeResult;
use crate::core::Timestamp;
use crate::core::WeightedScore;
use crate::interfaces::PersistenceGateway;
use crate::runtime::aggregate::weighted_average;
use crate::runtime::error::CalcError;
use crate::runtime::policy::RecalcConfig;
use crate::runtime::strategy::evaluate_program_outcome;

// ============================================================================
// SECTION: Pure Evaluators
// ============================================================================

/// Evaluates a sub-outcome from weighted instrument scores.
///
/// Returns the rounded value and the number of contributing instruments.
#[must_use]
pub fn evaluate_sub_outcome(scores: &[WeightedScore]) -> Option<(BigDecimal, u32)> {
    let value = weighted_average(scores)?;
    Some((value, u32::try_from(scores.len()).unwrap_or(u32::MAX)))
}

/// Evaluates an outcome from sub-outcome values weighted by percentage.
///
/// Percentages are divided by 100 before averaging.
#[must_use]
pub fn evaluate_outcome(scores: &[WeightedScore]) -> Option<BigDecimal> {
    let hundred = BigDecimal::from(100_u32);
    let fractional: Vec<WeightedScore> = scores
        .iter()
        .map(|score| WeightedScore::new(score.value.clone(), &score.weight / &hundred))
        .collect();
    weighted_average(&fractional)
}

/// Evaluates a course contribution from outcome values weighted by raw
/// contribution percentages.
#[must_use]
pub fn evaluate_course_contribution(scores: &[WeightedScore]) -> Option<BigDecimal> {
    weighted_average(scores)
}

// ============================================================================
// SECTION: Level 1
// ============================================================================

/// Recomputes the sub-outcome record for one enrollment.
///
/// # Errors
///
/// Returns [`CalcError`] when the gateway fails.
pub fn recalc_sub_outcome<G>(
    gateway: &G,
    enrollment_id: EnrollmentId,
    sub_outcome_id: SubOutcomeId,
    computed_at: Timestamp,
) -> Result<Option<SubOutcomeResult>, CalcError>
where
    G: PersistenceGateway + ?Sized,
{
    let scores = gateway.instrument_scores(enrollment_id, sub_outcome_id)?;
    let Some((value, instrument_count)) = evaluate_sub_outcome(&scores) else {
        flag_stale(
            gateway,
            ResultKey::SubOutcome {
                enrollment_id,
                sub_outcome_id,
            },
        )?;
        return Ok(None);
    };
    let result = SubOutcomeResult {
        enrollment_id,
        sub_outcome_id,
        status: AchievementStatus::from_score(&value),
        value,
        instrument_count,
        computed_at,
        stale: false,
    };
    gateway.upsert_sub_outcome_result(&result)?;
    debug!(
        enrollment_id = %enrollment_id,
        sub_outcome_id = %sub_outcome_id,
        value = %result.value,
        instruments = instrument_count,
        "sub-outcome recomputed"
    );
    Ok(Some(result))
}

// ============================================================================
// SECTION: Level 2
// ============================================================================

/// Recomputes the outcome (CPMK) record for one enrollment.
///
/// # Errors
///
/// Returns [`CalcError`] when the gateway fails.
pub fn recalc_outcome<G>(
    gateway: &G,
    enrollment_id: EnrollmentId,
    outcome_id: OutcomeId,
    computed_at: Timestamp,
) -> Result<Option<OutcomeResult>, CalcError>
where
    G: PersistenceGateway + ?Sized,
{
    let scores = gateway.sub_outcome_scores(enrollment_id, outcome_id)?;
    let Some(value) = evaluate_outcome(&scores) else {
        flag_stale(
            gateway,
            ResultKey::Outcome {
                enrollment_id,
                outcome_id,
            },
        )?;
        return Ok(None);
    };
    let result = OutcomeResult {
        enrollment_id,
        outcome_id,
        status: AchievementStatus::from_score(&value),
        value,
        computed_at,
        stale: false,
    };
    gateway.upsert_outcome_result(&result)?;
    debug!(
        enrollment_id = %enrollment_id,
        outcome_id = %outcome_id,
        value = %result.value,
        "outcome recomputed"
    );
    Ok(Some(result))
}

// ============================================================================
// SECTION: Level 3
// ============================================================================

/// Recomputes the program outcome contribution of one enrollment's course.
///
/// Student, term, and credit weight are resolved from the enrollment and
/// course records. A missing stage mapping falls back to the configured
/// default stage and weight.
///
/// # Errors
///
/// Returns [`CalcError::NotFound`] when the enrollment or course does not
/// resolve, or [`CalcError::Store`] when the gateway fails.
pub fn recalc_course_contribution<G>(
    gateway: &G,
    config: &RecalcConfig,
    enrollment_id: EnrollmentId,
    program_outcome_id: ProgramOutcomeId,
    course_id: CourseId,
    computed_at: Timestamp,
) -> Result<Option<CourseContribution>, CalcError>
where
    G: PersistenceGateway + ?Sized,
{
    let enrollment = gateway
        .enrollment(enrollment_id)?
        .ok_or_else(|| CalcError::not_found("enrollment", enrollment_id.get()))?;
    let course =
        gateway.course(course_id)?.ok_or_else(|| CalcError::not_found("course", course_id.get()))?;

    let scores = gateway.outcome_scores(enrollment_id, program_outcome_id, course_id)?;
    let Some(value) = evaluate_course_contribution(&scores) else {
        flag_stale(
            gateway,
            ResultKey::CourseContribution {
                enrollment_id,
                program_outcome_id,
            },
        )?;
        return Ok(None);
    };

    let mapping = gateway.stage_mapping(program_outcome_id, course_id)?;
    let (stage, stage_weight, defaulted) = config.resolve_stage(mapping.as_ref());
    if defaulted {
        warn!(
            course_id = %course_id,
            program_outcome_id = %program_outcome_id,
            stage = %stage,
            "no stage mapping; using default stage"
        );
    }

    let result = CourseContribution {
        enrollment_id,
        program_outcome_id,
        student_id: enrollment.student_id,
        course_id,
        value,
        stage,
        stage_weight,
        credits: course.credits,
        term: enrollment.term,
        computed_at,
        stale: false,
    };
    gateway.upsert_course_contribution(&result)?;
    debug!(
        enrollment_id = %enrollment_id,
        program_outcome_id = %program_outcome_id,
        value = %result.value,
        stage = %result.stage,
        "course contribution recomputed"
    );
    Ok(Some(result))
}

// ============================================================================
// SECTION: Level 4
// ============================================================================

/// Recomputes a student's aggregate attainment of one program outcome.
///
/// Only contributions from active or passed enrollments that are not stale
/// participate.
///
/// # Errors
///
/// Returns [`CalcError::NotFound`] when the program outcome does not resolve,
/// or [`CalcError::Store`] when the gateway fails.
pub fn recalc_program_outcome<G>(
    gateway: &G,
    config: &RecalcConfig,
    student_id: StudentId,
    program_outcome_id: ProgramOutcomeId,
    computed_at: Timestamp,
) -> Result<Option<ProgramOutcomeResult>, CalcError>
where
    G: PersistenceGateway + ?Sized,
{
    let program_outcome = gateway
        .program_outcome(program_outcome_id)?
        .ok_or_else(|| CalcError::not_found("program outcome", program_outcome_id.get()))?;
    let rows: Vec<CourseContribution> = gateway
        .course_contributions(student_id, program_outcome_id)?
        .into_iter()
        .filter(|row| row.enrollment_status.qualifies() && !row.contribution.stale)
        .map(|row| row.contribution)
        .collect();

    let Some(evaluation) = evaluate_program_outcome(
        config.aggregation_method,
        &rows,
        &program_outcome.minimum_passing,
    ) else {
        flag_stale(
            gateway,
            ResultKey::ProgramOutcome {
                student_id,
                program_outcome_id,
            },
        )?;
        return Ok(None);
    };

    let result = ProgramOutcomeResult {
        student_id,
        program_outcome_id,
        value: evaluation.value,
        course_count: evaluation.course_count,
        total_credits: evaluation.total_credits,
        status: evaluation.status,
        passing: evaluation.passing,
        latest_term: gateway.latest_term(student_id)?,
        computed_at,
        stale: false,
    };
    gateway.upsert_program_outcome_result(&result)?;
    debug!(
        student_id = %student_id,
        program_outcome_id = %program_outcome_id,
        method = %config.aggregation_method,
        value = %result.value,
        passing = result.passing,
        "program outcome recomputed"
    );
    Ok(Some(result))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Flags the record under `key` stale after a no-data evaluation.
fn flag_stale<G>(gateway: &G, key: ResultKey) -> Result<(), CalcError>
where
    G: PersistenceGateway + ?Sized,
{
    let existed = gateway.mark_stale(key)?;
    debug!(key = %key, existed, "no contributing data; record left stale");
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
