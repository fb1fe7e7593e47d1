// crates/cpl-attainment-core/src/runtime/mod.rs
// ============================================================================
// Module: CPL Attainment Runtime
// Description: Aggregation, level calculators, strategies, and orchestration.
// Purpose: Turn leaf scores into sub-outcome through program outcome records.
// Dependencies: crate::{core, interfaces}, bigdecimal, rayon, tracing
// ============================================================================

//! ## Overview
//! Runtime modules hold every calculation rule. Gateways only move rows; all
//! weighting, rounding, classification, and stale handling happen here so
//! every storage backend produces identical records.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregate;
pub mod error;
pub mod levels;
pub mod orchestrator;
pub mod policy;
pub mod store;
pub mod strategy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::RESULT_SCALE;
pub use aggregate::arithmetic_mean;
pub use aggregate::round_half_up;
pub use aggregate::weighted_average;
pub use error::CalcError;
pub use levels::evaluate_course_contribution;
pub use levels::evaluate_outcome;
pub use levels::evaluate_sub_outcome;
pub use levels::recalc_course_contribution;
pub use levels::recalc_outcome;
pub use levels::recalc_program_outcome;
pub use levels::recalc_sub_outcome;
pub use orchestrator::EnrollmentRecalcReport;
pub use orchestrator::LevelTally;
pub use orchestrator::RecalculationOrchestrator;
pub use orchestrator::StudentRecalcReport;
pub use policy::RecalcConfig;
pub use store::InMemoryGateway;
pub use strategy::ProgramOutcomeEvaluation;
pub use strategy::aggregate_contributions;
pub use strategy::evaluate_program_outcome;
pub use strategy::to_four_point_scale;
