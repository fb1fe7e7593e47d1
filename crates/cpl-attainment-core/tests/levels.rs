// crates/cpl-attainment-core/tests/levels.rs
// ============================================================================
// Module: Level Calculator Tests
// Description: Gateway-backed tests for the four calculation levels.
// Purpose: Validate values, classifications, stale handling, and lookups.
// ============================================================================

//! Level calculator tests over the shared in-memory curriculum.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use cpl_attainment_core::AchievementStatus;
use cpl_attainment_core::AggregationMethod;
use cpl_attainment_core::CalcError;
use cpl_attainment_core::CatalogReader;
use cpl_attainment_core::Enrollment;
use cpl_attainment_core::EnrollmentStatus;
use cpl_attainment_core::InMemoryGateway;
use cpl_attainment_core::ProgramOutcomeStatus;
use cpl_attainment_core::RecalcConfig;
use cpl_attainment_core::ResultStore;
use cpl_attainment_core::StageTag;
use cpl_attainment_core::StoreError;
use cpl_attainment_core::Term;
use cpl_attainment_core::Timestamp;
use cpl_attainment_core::runtime::recalc_course_contribution;
use cpl_attainment_core::runtime::recalc_outcome;
use cpl_attainment_core::runtime::recalc_program_outcome;
use cpl_attainment_core::runtime::recalc_sub_outcome;

use crate::common::TERM_EVEN;
use crate::common::TERM_ODD;
use crate::common::course;
use crate::common::dec;
use crate::common::enrollment;
use crate::common::graded_curriculum;
use crate::common::outcome;
use crate::common::program_outcome;
use crate::common::score;
use crate::common::student;
use crate::common::sub_outcome;

const NOW: Timestamp = Timestamp::UnixMillis(1_700_000_000_000);

/// Runs levels 1-3 for both fixture enrollments.
fn compute_course_levels(gateway: &InMemoryGateway, config: &RecalcConfig) {
    for (enrollment_raw, course_raw, subs, outcome_raw, pos) in
        [(1, 1, vec![1, 2], 1, vec![1, 2]), (2, 2, vec![3], 2, vec![1])]
    {
        for sub in subs {
            recalc_sub_outcome(gateway, enrollment(enrollment_raw), sub_outcome(sub), NOW).unwrap();
        }
        recalc_outcome(gateway, enrollment(enrollment_raw), outcome(outcome_raw), NOW).unwrap();
        for po in pos {
            recalc_course_contribution(
                gateway,
                config,
                enrollment(enrollment_raw),
                program_outcome(po),
                course(course_raw),
                NOW,
            )
            .unwrap();
        }
    }
}

// ============================================================================
// SECTION: Levels 1-3
// ============================================================================

#[test]
fn sub_outcome_weights_instrument_percentages() {
    let gateway = graded_curriculum();
    let result = recalc_sub_outcome(&gateway, enrollment(1), sub_outcome(1), NOW).unwrap().unwrap();
    assert_eq!(result.value, dec("83.00"));
    assert_eq!(result.instrument_count, 2);
    assert_eq!(result.status, AchievementStatus::Good);
    assert!(!result.stale);
    let stored = gateway.sub_outcome_result(enrollment(1), sub_outcome(1)).unwrap();
    assert_eq!(stored, Some(result));
}

#[test]
fn ungraded_instruments_are_skipped() {
    let gateway = graded_curriculum();
    score(&gateway, 1, 2, None);
    let result = recalc_sub_outcome(&gateway, enrollment(1), sub_outcome(1), NOW).unwrap().unwrap();
    assert_eq!(result.value, dec("80.00"));
    assert_eq!(result.instrument_count, 1);
}

#[test]
fn outcome_divides_sub_outcome_weights_by_hundred() {
    let gateway = graded_curriculum();
    recalc_sub_outcome(&gateway, enrollment(1), sub_outcome(1), NOW).unwrap();
    recalc_sub_outcome(&gateway, enrollment(1), sub_outcome(2), NOW).unwrap();
    let result = recalc_outcome(&gateway, enrollment(1), outcome(1), NOW).unwrap().unwrap();
    // (83 * 0.60 + 90 * 0.40) / 1.00
    assert_eq!(result.value, dec("85.80"));
    assert_eq!(result.status, AchievementStatus::Excellent);
}

#[test]
fn contribution_takes_stage_weight_from_table_when_mapping_omits_it() {
    let gateway = graded_curriculum();
    let config = RecalcConfig::default();
    compute_course_levels(&gateway, &config);
    let row = gateway.course_contribution(enrollment(1), program_outcome(1)).unwrap().unwrap();
    assert_eq!(row.value, dec("85.80"));
    assert_eq!(row.stage, StageTag::Assessed);
    assert_eq!(row.stage_weight, dec("2.0"));
    assert_eq!(row.credits, 3);
    assert_eq!(row.student_id, student(1));
    assert_eq!(row.term, Term::new(TERM_ODD));

    let explicit = gateway.course_contribution(enrollment(2), program_outcome(1)).unwrap().unwrap();
    assert_eq!(explicit.value, dec("70.00"));
    assert_eq!(explicit.stage, StageTag::Introduce);
    assert_eq!(explicit.stage_weight, dec("0.5"));
}

#[test]
fn contribution_without_stage_mapping_uses_default_stage() {
    let gateway = graded_curriculum();
    let config = RecalcConfig::default();
    compute_course_levels(&gateway, &config);
    let row = gateway.course_contribution(enrollment(1), program_outcome(2)).unwrap().unwrap();
    assert_eq!(row.stage, StageTag::Reinforce);
    assert_eq!(row.stage_weight, dec("1"));
}

#[test]
fn contribution_for_unknown_enrollment_is_not_found() {
    let gateway = graded_curriculum();
    let error = recalc_course_contribution(
        &gateway,
        &RecalcConfig::default(),
        enrollment(99),
        program_outcome(1),
        course(1),
        NOW,
    )
    .unwrap_err();
    assert_eq!(error, CalcError::not_found("enrollment", 99));
}

#[test]
fn contribution_for_unknown_course_is_not_found() {
    let gateway = graded_curriculum();
    let error = recalc_course_contribution(
        &gateway,
        &RecalcConfig::default(),
        enrollment(1),
        program_outcome(1),
        course(42),
        NOW,
    )
    .unwrap_err();
    assert_eq!(error, CalcError::not_found("course", 42));
}

// ============================================================================
// SECTION: Level 4
// ============================================================================

#[test]
fn program_outcome_weighted_by_stage() {
    let gateway = graded_curriculum();
    let config = RecalcConfig::default();
    compute_course_levels(&gateway, &config);
    let result =
        recalc_program_outcome(&gateway, &config, student(1), program_outcome(1), NOW).unwrap().unwrap();
    // (85.80 * 2.0 + 70.00 * 0.5) / 2.5 = 82.64 -> 3.3056
    assert_eq!(result.value, dec("3.31"));
    assert_eq!(result.course_count, 2);
    assert_eq!(result.total_credits, 5);
    assert_eq!(result.status, ProgramOutcomeStatus::Assessed);
    assert!(result.passing);
    assert_eq!(result.latest_term, Some(Term::new(TERM_ODD)));
}

#[test]
fn program_outcome_below_minimum_is_not_passing() {
    let gateway = graded_curriculum();
    let config = RecalcConfig::default();
    compute_course_levels(&gateway, &config);
    let result =
        recalc_program_outcome(&gateway, &config, student(1), program_outcome(2), NOW).unwrap().unwrap();
    assert_eq!(result.value, dec("3.43"));
    assert_eq!(result.status, ProgramOutcomeStatus::Reinforce);
    assert!(!result.passing);
}

#[test]
fn program_outcome_weighted_by_credit() {
    let gateway = graded_curriculum();
    let config = RecalcConfig {
        aggregation_method: AggregationMethod::WeightedByCredit,
        ..RecalcConfig::default()
    };
    compute_course_levels(&gateway, &config);
    let result =
        recalc_program_outcome(&gateway, &config, student(1), program_outcome(1), NOW).unwrap().unwrap();
    // (85.80 * 3 + 70.00 * 2) / 5 = 79.48 -> 3.1792
    assert_eq!(result.value, dec("3.18"));
}

#[test]
fn program_outcome_last_assessment_uses_assessed_rows_only() {
    let gateway = graded_curriculum();
    let config = RecalcConfig::with_method_name("last_assessment").unwrap();
    compute_course_levels(&gateway, &config);
    let result =
        recalc_program_outcome(&gateway, &config, student(1), program_outcome(1), NOW).unwrap().unwrap();
    assert_eq!(result.value, dec("3.43"));
    assert_eq!(result.course_count, 2);

    let none =
        recalc_program_outcome(&gateway, &config, student(1), program_outcome(2), NOW).unwrap();
    assert!(none.is_none());
}

#[test]
fn non_qualifying_enrollments_are_excluded() {
    let gateway = graded_curriculum();
    let config = RecalcConfig::default();
    compute_course_levels(&gateway, &config);
    gateway
        .set_enrollment_status(enrollment(2), EnrollmentStatus::Other("withdrawn".to_string()))
        .unwrap();
    let result =
        recalc_program_outcome(&gateway, &config, student(1), program_outcome(1), NOW).unwrap().unwrap();
    assert_eq!(result.value, dec("3.43"));
    assert_eq!(result.course_count, 1);
    assert_eq!(result.total_credits, 3);
}

#[test]
fn unknown_program_outcome_is_not_found() {
    let gateway = graded_curriculum();
    let error =
        recalc_program_outcome(&gateway, &RecalcConfig::default(), student(1), program_outcome(77), NOW)
            .unwrap_err();
    assert_eq!(error, CalcError::not_found("program outcome", 77));
}

#[test]
fn latest_term_follows_most_recent_registration() {
    let gateway = graded_curriculum();
    assert_eq!(gateway.latest_term(student(1)).unwrap(), Some(Term::new(TERM_ODD)));
    assert_eq!(gateway.latest_term(student(2)).unwrap(), None);
}

#[test]
fn latest_term_rejects_mixed_timestamp_kinds() {
    let gateway = graded_curriculum();
    gateway
        .insert_enrollment(Enrollment {
            id: enrollment(3),
            student_id: student(1),
            course_id: course(2),
            status: EnrollmentStatus::Other("failed".to_string()),
            term: Term::new(TERM_EVEN),
            registered_at: Timestamp::UnixMillis(1_600_000_000_000),
        })
        .unwrap();
    let error = gateway.latest_term(student(1)).unwrap_err();
    assert!(matches!(error, StoreError::Invalid(_)));

    let config = RecalcConfig::default();
    compute_course_levels(&gateway, &config);
    let error = recalc_program_outcome(&gateway, &config, student(1), program_outcome(1), NOW)
        .unwrap_err();
    assert!(matches!(error, CalcError::Store(StoreError::Invalid(_))));
}

// ============================================================================
// SECTION: Stale Handling and Idempotence
// ============================================================================

#[test]
fn missing_data_keeps_previous_record_as_stale() {
    let gateway = graded_curriculum();
    recalc_sub_outcome(&gateway, enrollment(1), sub_outcome(1), NOW).unwrap();
    recalc_sub_outcome(&gateway, enrollment(1), sub_outcome(2), NOW).unwrap();

    score(&gateway, 1, 3, None);
    let later = Timestamp::UnixMillis(1_700_000_100_000);
    assert!(recalc_sub_outcome(&gateway, enrollment(1), sub_outcome(2), later).unwrap().is_none());
    let stale = gateway.sub_outcome_result(enrollment(1), sub_outcome(2)).unwrap().unwrap();
    assert!(stale.stale);
    assert_eq!(stale.value, dec("90.00"));
    assert_eq!(stale.computed_at, NOW);

    let outcome_value = recalc_outcome(&gateway, enrollment(1), outcome(1), later).unwrap().unwrap();
    assert_eq!(outcome_value.value, dec("83.00"));

    score(&gateway, 1, 3, Some("95"));
    let fresh = recalc_sub_outcome(&gateway, enrollment(1), sub_outcome(2), later).unwrap().unwrap();
    assert_eq!(fresh.value, dec("95.00"));
    assert!(!gateway.sub_outcome_result(enrollment(1), sub_outcome(2)).unwrap().unwrap().stale);
}

#[test]
fn missing_data_without_previous_record_writes_nothing() {
    let gateway = graded_curriculum();
    score(&gateway, 2, 4, None);
    assert!(recalc_sub_outcome(&gateway, enrollment(2), sub_outcome(3), NOW).unwrap().is_none());
    assert!(gateway.sub_outcome_result(enrollment(2), sub_outcome(3)).unwrap().is_none());
}

#[test]
fn level_calculations_are_idempotent() {
    let gateway = graded_curriculum();
    let config = RecalcConfig::default();
    compute_course_levels(&gateway, &config);
    let first =
        recalc_program_outcome(&gateway, &config, student(1), program_outcome(1), NOW).unwrap();
    let first_row = gateway.course_contribution(enrollment(1), program_outcome(1)).unwrap();

    compute_course_levels(&gateway, &config);
    let second =
        recalc_program_outcome(&gateway, &config, student(1), program_outcome(1), NOW).unwrap();
    let second_row = gateway.course_contribution(enrollment(1), program_outcome(1)).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_row, second_row);
}
