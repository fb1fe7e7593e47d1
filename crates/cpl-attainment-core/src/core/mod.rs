// crates/cpl-attainment-core/src/core/mod.rs
// ============================================================================
// Module: CPL Attainment Core Types
// Description: Identifiers, catalog records, result records, and classifiers.
// Purpose: Provide stable, serializable types shared by every crate.
// Dependencies: bigdecimal, serde, thiserror
// ============================================================================

//! ## Overview
//! Core types describe the curriculum catalog the engine reads, the four
//! record families it computes, and the fixed classification and grading
//! tables. These types are the canonical source of truth for storage adapters.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod classification;
pub mod grading;
pub mod identifiers;
pub mod method;
pub mod results;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::Course;
pub use catalog::Enrollment;
pub use catalog::EnrollmentStatus;
pub use catalog::InstrumentMapping;
pub use catalog::InstrumentScore;
pub use catalog::Outcome;
pub use catalog::OutcomeMapping;
pub use catalog::ProgramOutcome;
pub use catalog::StageMapping;
pub use catalog::SubOutcome;
pub use classification::AchievementStatus;
pub use classification::ParseLabelError;
pub use classification::ProgramOutcomeStatus;
pub use classification::StageTag;
pub use classification::StageWeights;
pub use grading::LetterGrade;
pub use grading::grade_point_for_label;
pub use identifiers::CourseId;
pub use identifiers::EnrollmentId;
pub use identifiers::InstrumentId;
pub use identifiers::OutcomeId;
pub use identifiers::ProgramOutcomeId;
pub use identifiers::StudentId;
pub use identifiers::SubOutcomeId;
pub use identifiers::Term;
pub use method::AggregationMethod;
pub use method::UnknownAggregationMethod;
pub use results::ContributionRow;
pub use results::CourseContribution;
pub use results::OutcomeResult;
pub use results::ProgramOutcomeResult;
pub use results::ResultKey;
pub use results::SubOutcomeResult;
pub use results::WeightedScore;
pub use time::Timestamp;
