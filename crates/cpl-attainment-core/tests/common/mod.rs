// crates/cpl-attainment-core/tests/common/mod.rs
// ============================================================================
// Module: CPL Attainment Test Fixtures
// Description: Shared curriculum fixture for core integration tests.
// Purpose: Seed an in-memory gateway with a small two-course curriculum.
// ============================================================================

//! Shared fixture: one student, two courses, two active program outcomes.
//!
//! Course 1 (3 credits) has outcome 1 with sub-outcomes 1 (60%) and 2 (40%).
//! Instruments 1 (20%) and 2 (30%) measure sub-outcome 1, instrument 3 (100%)
//! measures sub-outcome 2. Outcome 1 maps to CPL-01 (staged `assessed`, no
//! explicit weight) and to CPL-02 (no stage mapping).
//!
//! Course 2 (2 credits) has outcome 2 with sub-outcome 3 (100%), measured by
//! instrument 4. Outcome 2 maps to CPL-01 (staged `introduce`, weight 0.5).

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared test helpers are not used by every test binary."
)]

use std::str::FromStr;

use bigdecimal::BigDecimal;
use cpl_attainment_core::Course;
use cpl_attainment_core::CourseId;
use cpl_attainment_core::Enrollment;
use cpl_attainment_core::EnrollmentId;
use cpl_attainment_core::EnrollmentStatus;
use cpl_attainment_core::InMemoryGateway;
use cpl_attainment_core::InstrumentId;
use cpl_attainment_core::InstrumentMapping;
use cpl_attainment_core::InstrumentScore;
use cpl_attainment_core::Outcome;
use cpl_attainment_core::OutcomeId;
use cpl_attainment_core::OutcomeMapping;
use cpl_attainment_core::ProgramOutcome;
use cpl_attainment_core::ProgramOutcomeId;
use cpl_attainment_core::StageMapping;
use cpl_attainment_core::StageTag;
use cpl_attainment_core::StudentId;
use cpl_attainment_core::SubOutcome;
use cpl_attainment_core::SubOutcomeId;
use cpl_attainment_core::Term;
use cpl_attainment_core::Timestamp;

pub const TERM_ODD: &str = "2024/2025 Ganjil";
pub const TERM_EVEN: &str = "2023/2024 Genap";

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).expect("decimal literal")
}

pub fn student(raw: u64) -> StudentId {
    StudentId::from_raw(raw).expect("nonzero student id")
}

pub fn course(raw: u64) -> CourseId {
    CourseId::from_raw(raw).expect("nonzero course id")
}

pub fn enrollment(raw: u64) -> EnrollmentId {
    EnrollmentId::from_raw(raw).expect("nonzero enrollment id")
}

pub fn instrument(raw: u64) -> InstrumentId {
    InstrumentId::from_raw(raw).expect("nonzero instrument id")
}

pub fn sub_outcome(raw: u64) -> SubOutcomeId {
    SubOutcomeId::from_raw(raw).expect("nonzero sub-outcome id")
}

pub fn outcome(raw: u64) -> OutcomeId {
    OutcomeId::from_raw(raw).expect("nonzero outcome id")
}

pub fn program_outcome(raw: u64) -> ProgramOutcomeId {
    ProgramOutcomeId::from_raw(raw).expect("nonzero program outcome id")
}

pub fn score(
    gateway: &InMemoryGateway,
    enrollment_raw: u64,
    instrument_raw: u64,
    value: Option<&str>,
) {
    gateway
        .record_score(InstrumentScore {
            enrollment_id: enrollment(enrollment_raw),
            instrument_id: instrument(instrument_raw),
            score: value.map(dec),
        })
        .unwrap();
}

/// Seeds the two-course curriculum without any scores.
pub fn curriculum() -> InMemoryGateway {
    let gateway = InMemoryGateway::new();
    for (id, code, credits) in [(1, "IF101", 3), (2, "IF201", 2)] {
        gateway
            .insert_course(Course {
                id: course(id),
                code: code.to_string(),
                credits,
            })
            .unwrap();
    }

    gateway
        .insert_program_outcome(ProgramOutcome {
            id: program_outcome(1),
            code: "CPL-01".to_string(),
            minimum_passing: dec("2.75"),
            active: true,
        })
        .unwrap();
    gateway
        .insert_program_outcome(ProgramOutcome {
            id: program_outcome(2),
            code: "CPL-02".to_string(),
            minimum_passing: dec("3.50"),
            active: true,
        })
        .unwrap();
    gateway
        .insert_program_outcome(ProgramOutcome {
            id: program_outcome(3),
            code: "CPL-03".to_string(),
            minimum_passing: dec("2.75"),
            active: false,
        })
        .unwrap();

    for (id, course_raw) in [(1, 1), (2, 2)] {
        gateway
            .insert_outcome(Outcome {
                id: outcome(id),
                course_id: course(course_raw),
            })
            .unwrap();
    }

    for (id, parent, weight) in [(1, 1, "60"), (2, 1, "40"), (3, 2, "100")] {
        gateway
            .insert_sub_outcome(SubOutcome {
                id: sub_outcome(id),
                outcome_id: outcome(parent),
                weight_percent: dec(weight),
            })
            .unwrap();
    }

    let instrument_weights = [(1, 1, "20"), (2, 1, "30"), (3, 2, "100"), (4, 3, "100")];
    for (instrument_raw, sub_raw, weight) in instrument_weights {
        gateway
            .insert_instrument_mapping(InstrumentMapping {
                instrument_id: instrument(instrument_raw),
                sub_outcome_id: sub_outcome(sub_raw),
                weight_percent: dec(weight),
            })
            .unwrap();
    }

    for (outcome_raw, po_raw) in [(1, 1), (1, 2), (2, 1)] {
        gateway
            .insert_outcome_mapping(OutcomeMapping {
                outcome_id: outcome(outcome_raw),
                program_outcome_id: program_outcome(po_raw),
                contribution_percent: dec("100"),
            })
            .unwrap();
    }

    gateway
        .insert_stage_mapping(StageMapping {
            program_outcome_id: program_outcome(1),
            course_id: course(1),
            stage: StageTag::Assessed,
            stage_weight: None,
        })
        .unwrap();
    gateway
        .insert_stage_mapping(StageMapping {
            program_outcome_id: program_outcome(1),
            course_id: course(2),
            stage: StageTag::Introduce,
            stage_weight: Some(dec("0.5")),
        })
        .unwrap();

    gateway
        .insert_enrollment(Enrollment {
            id: enrollment(1),
            student_id: student(1),
            course_id: course(1),
            status: EnrollmentStatus::Active,
            term: Term::new(TERM_ODD),
            registered_at: Timestamp::Logical(2),
        })
        .unwrap();
    gateway
        .insert_enrollment(Enrollment {
            id: enrollment(2),
            student_id: student(1),
            course_id: course(2),
            status: EnrollmentStatus::Passed,
            term: Term::new(TERM_EVEN),
            registered_at: Timestamp::Logical(1),
        })
        .unwrap();
    gateway
}

/// Seeds the curriculum plus a full set of scores.
///
/// Enrollment 1: instruments 80, 85, 90. Enrollment 2: instrument 70.
pub fn graded_curriculum() -> InMemoryGateway {
    let gateway = curriculum();
    score(&gateway, 1, 1, Some("80"));
    score(&gateway, 1, 2, Some("85"));
    score(&gateway, 1, 3, Some("90"));
    score(&gateway, 2, 4, Some("70"));
    gateway
}
