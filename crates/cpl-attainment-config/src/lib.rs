// crates/cpl-attainment-config/src/lib.rs
// ============================================================================
// Module: CPL Attainment Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for cpl-attainment.toml semantics.
// Dependencies: cpl-attainment-core, cpl-attainment-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `cpl-attainment-config` loads the calculation policy and the optional
//! `SQLite` gateway settings from TOML. Loading is fail-closed: oversized,
//! non-UTF-8, unknown-field, or inconsistent files are rejected before any
//! recalculation runs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
