// crates/cpl-attainment-core/src/runtime/strategy.rs
// ============================================================================
// Module: CPL Attainment Aggregation Strategies
// Description: Level-4 strategy dispatch over per-course contributions.
// Purpose: Combine a student's course contributions into one 0-4 value.
// Dependencies: crate::core, crate::runtime::aggregate, bigdecimal
// ============================================================================

//! ## Overview
//! Each [`AggregationMethod`] is a stateless function over the same input
//! shape. Weighted strategies round the 0-100 average before rescaling; mean
//! strategies rescale the unrounded mean. Both paths round the 0-4 value
//! half-up to two decimals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;

use crate::core::AggregationMethod;
use crate::core::CourseContribution;
use crate::core::ProgramOutcomeStatus;
use crate::core::StageTag;
use crate::core::WeightedScore;
use crate::runtime::aggregate::arithmetic_mean;
use crate::runtime::aggregate::round_half_up;
use crate::runtime::aggregate::weighted_average;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Divisor mapping the 0-100 scale onto the 0-4 scale.
const FOUR_POINT_DIVISOR: u32 = 25;

// ============================================================================
// SECTION: Strategy Dispatch
// ============================================================================

/// Aggregates contributions on the 0-100 scale using `method`.
///
/// Returns `None` when the strategy has nothing to aggregate.
#[must_use]
pub fn aggregate_contributions(
    method: AggregationMethod,
    rows: &[CourseContribution],
) -> Option<BigDecimal> {
    match method {
        AggregationMethod::Simple => arithmetic_mean(rows.iter().map(|row| &row.value)),
        AggregationMethod::WeightedByCredit => weighted_average(
            &rows
                .iter()
                .map(|row| WeightedScore::new(row.value.clone(), BigDecimal::from(row.credits)))
                .collect::<Vec<_>>(),
        ),
        AggregationMethod::WeightedByStage => weighted_average(
            &rows
                .iter()
                .map(|row| WeightedScore::new(row.value.clone(), row.stage_weight.clone()))
                .collect::<Vec<_>>(),
        ),
        AggregationMethod::LastAssessment => arithmetic_mean(
            rows.iter().filter(|row| row.stage == StageTag::Assessed).map(|row| &row.value),
        ),
    }
}

/// Maps a 0-100 value onto the 0-4 scale, rounded half-up.
#[must_use]
pub fn to_four_point_scale(value: &BigDecimal) -> BigDecimal {
    round_half_up(&(value / &BigDecimal::from(FOUR_POINT_DIVISOR)))
}

// ============================================================================
// SECTION: Program Outcome Evaluation
// ============================================================================

/// Outcome of a level-4 evaluation before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOutcomeEvaluation {
    /// Value on the 0-4 scale.
    pub value: BigDecimal,
    /// Number of contributing rows.
    pub course_count: u32,
    /// Sum of contributing credit weights.
    pub total_credits: u32,
    /// Stage-coverage classification.
    pub status: ProgramOutcomeStatus,
    /// True when `value` meets the minimum.
    pub passing: bool,
}

/// Evaluates qualifying contributions against a program outcome minimum.
///
/// `rows` must already be limited to qualifying, non-stale contributions.
#[must_use]
pub fn evaluate_program_outcome(
    method: AggregationMethod,
    rows: &[CourseContribution],
    minimum_passing: &BigDecimal,
) -> Option<ProgramOutcomeEvaluation> {
    let aggregate = aggregate_contributions(method, rows)?;
    let value = to_four_point_scale(&aggregate);
    let passing = value >= *minimum_passing;
    Some(ProgramOutcomeEvaluation {
        course_count: u32::try_from(rows.len()).unwrap_or(u32::MAX),
        total_credits: rows.iter().fold(0_u32, |total, row| total.saturating_add(row.credits)),
        status: ProgramOutcomeStatus::from_stages(rows.iter().map(|row| row.stage)),
        passing,
        value,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
