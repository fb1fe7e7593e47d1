// crates/cpl-attainment-core/src/runtime/aggregate.rs
// ============================================================================
// Module: CPL Attainment Weighted Aggregator
// Description: Decimal weighted average and mean helpers.
// Purpose: Combine child values without binary floating point drift.
// Dependencies: crate::core, bigdecimal
// ============================================================================

//! ## Overview
//! All arithmetic uses [`BigDecimal`]. A weighted average is
//! `Σ(value × weight) / Σ(weight)` rounded half-up to two decimals. Empty
//! input or a zero total weight yields `None`; division by zero is never
//! attempted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use bigdecimal::RoundingMode;
use bigdecimal::Zero;

use crate::core::WeightedScore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Decimal places kept on every percentage-scale and 0-4 scale result.
pub const RESULT_SCALE: i64 = 2;

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Rounds a value half-up to [`RESULT_SCALE`] decimals.
#[must_use]
pub fn round_half_up(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(RESULT_SCALE, RoundingMode::HalfUp)
}

/// Computes the rounded weighted average of `scores`.
///
/// Returns `None` when `scores` is empty or the weights sum to zero.
#[must_use]
pub fn weighted_average(scores: &[WeightedScore]) -> Option<BigDecimal> {
    let mut total_weighted = BigDecimal::zero();
    let mut total_weight = BigDecimal::zero();
    for score in scores {
        total_weighted += &score.value * &score.weight;
        total_weight += &score.weight;
    }
    if total_weight.is_zero() {
        return None;
    }
    Some(round_half_up(&(total_weighted / total_weight)))
}

/// Computes the unrounded arithmetic mean of `values`.
///
/// Returns `None` for empty input.
#[must_use]
pub fn arithmetic_mean<'a, I>(values: I) -> Option<BigDecimal>
where
    I: IntoIterator<Item = &'a BigDecimal>,
{
    let mut total = BigDecimal::zero();
    let mut count: u64 = 0;
    for value in values {
        total += value;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(total / BigDecimal::from(count))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
