// crates/cpl-attainment-core/src/lib.rs
// ============================================================================
// Module: CPL Attainment Core Library
// Description: Public API surface for the attainment calculation engine.
// Purpose: Expose core types, persistence interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! CPL attainment core computes learning-outcome attainment bottom-up through
//! a four-level hierarchy: instrument scores roll into sub-outcomes,
//! sub-outcomes into course outcomes (CPMK), course outcomes into per-course
//! program outcome contributions, and contributions into a student's program
//! outcome (CPL) attainment. All arithmetic is decimal. Storage is reached
//! only through [`PersistenceGateway`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::CatalogReader;
pub use interfaces::PersistenceGateway;
pub use interfaces::ResultStore;
pub use interfaces::StoreError;
pub use runtime::CalcError;
pub use runtime::EnrollmentRecalcReport;
pub use runtime::InMemoryGateway;
pub use runtime::LevelTally;
pub use runtime::RecalcConfig;
pub use runtime::RecalculationOrchestrator;
pub use runtime::StudentRecalcReport;
