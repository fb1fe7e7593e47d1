// crates/cpl-attainment-core/tests/proptest_aggregate.rs
// ============================================================================
// Module: Aggregation Property-Based Tests
// Description: Property tests for weighted averages and classification.
// Purpose: Check rounding, bounds, and threshold coverage across inputs.
// ============================================================================

//! Property-based tests for aggregation and classification invariants.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use bigdecimal::BigDecimal;
use cpl_attainment_core::AchievementStatus;
use cpl_attainment_core::LetterGrade;
use cpl_attainment_core::ProgramOutcomeStatus;
use cpl_attainment_core::StageTag;
use cpl_attainment_core::WeightedScore;
use cpl_attainment_core::runtime::round_half_up;
use cpl_attainment_core::runtime::to_four_point_scale;
use cpl_attainment_core::runtime::weighted_average;
use proptest::prelude::*;

/// Builds a decimal from an integer count of hundredths.
fn hundredths(raw: u32) -> BigDecimal {
    BigDecimal::new(raw.into(), 2)
}

/// Weighted average computed in integer hundredths, rounded half-up.
///
/// `floor((2n + d) / 2d)` is `n / d` rounded half-up for non-negative `n`.
fn integer_weighted_average(pairs: &[(u32, u32)]) -> Option<BigDecimal> {
    let numerator: u64 = pairs.iter().map(|(value, weight)| u64::from(*value) * u64::from(*weight)).sum();
    let denominator: u64 = pairs.iter().map(|(_, weight)| u64::from(*weight)).sum();
    if denominator == 0 {
        return None;
    }
    let rounded = (2 * numerator + denominator) / (2 * denominator);
    Some(BigDecimal::new(rounded.into(), 2))
}

fn score_strategy() -> impl Strategy<Value = (u32, u32)> {
    (0_u32 ..= 10_000, 0_u32 ..= 100)
}

fn stage_strategy() -> impl Strategy<Value = StageTag> {
    prop::sample::select(StageTag::ALL.to_vec())
}

proptest! {
    #[test]
    fn weighted_average_matches_integer_hundredths(pairs in prop::collection::vec(score_strategy(), 0 .. 12)) {
        let scores: Vec<WeightedScore> = pairs
            .iter()
            .map(|(value, weight)| WeightedScore::new(hundredths(*value), BigDecimal::from(*weight)))
            .collect();
        prop_assert_eq!(weighted_average(&scores), integer_weighted_average(&pairs));
    }

    #[test]
    fn round_half_up_matches_integer_rounding(thousandths in 0_u32 ..= 100_000) {
        let rounded = round_half_up(&BigDecimal::new(thousandths.into(), 3));
        let expected = BigDecimal::new(((thousandths + 5) / 10).into(), 2);
        prop_assert_eq!(rounded, expected);
    }

    #[test]
    fn weighted_average_stays_within_input_bounds(pairs in prop::collection::vec((0_u32 ..= 10_000, 1_u32 ..= 100), 1 .. 12)) {
        let scores: Vec<WeightedScore> = pairs
            .iter()
            .map(|(value, weight)| WeightedScore::new(hundredths(*value), BigDecimal::from(*weight)))
            .collect();
        let min = pairs.iter().map(|(value, _)| *value).min().map(hundredths).unwrap();
        let max = pairs.iter().map(|(value, _)| *value).max().map(hundredths).unwrap();
        let result = weighted_average(&scores).unwrap();
        prop_assert!(result >= min && result <= max);
    }

    #[test]
    fn four_point_scale_is_bounded(raw in 0_u32 ..= 10_000) {
        let value = to_four_point_scale(&hundredths(raw));
        prop_assert!(value >= BigDecimal::from(0) && value <= BigDecimal::from(4));
    }

    #[test]
    fn achievement_status_is_closed_below(raw in 0_u32 ..= 10_000) {
        let expected = match raw {
            8_500 .. => AchievementStatus::Excellent,
            7_000 .. => AchievementStatus::Good,
            5_500 .. => AchievementStatus::Adequate,
            _ => AchievementStatus::Poor,
        };
        prop_assert_eq!(AchievementStatus::from_score(&hundredths(raw)), expected);
    }

    #[test]
    fn grade_points_never_decrease_with_score(low in 0_u32 ..= 10_000, high in 0_u32 ..= 10_000) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let low_points = LetterGrade::from_score(&hundredths(low)).grade_point();
        let high_points = LetterGrade::from_score(&hundredths(high)).grade_point();
        prop_assert!(low_points <= high_points);
    }

    #[test]
    fn program_status_reflects_highest_stage(stages in prop::collection::vec(stage_strategy(), 0 .. 6)) {
        let status = ProgramOutcomeStatus::from_stages(stages.iter().copied());
        let expected = match stages.iter().max() {
            None => ProgramOutcomeStatus::NotStarted,
            Some(StageTag::Introduce) => ProgramOutcomeStatus::Introduce,
            Some(StageTag::Reinforce) => ProgramOutcomeStatus::Reinforce,
            Some(StageTag::Master) => ProgramOutcomeStatus::Master,
            Some(StageTag::Assessed) => ProgramOutcomeStatus::Assessed,
        };
        prop_assert_eq!(status, expected);
    }
}
