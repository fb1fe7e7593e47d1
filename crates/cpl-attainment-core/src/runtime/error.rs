// crates/cpl-attainment-core/src/runtime/error.rs
// ============================================================================
// Module: CPL Attainment Runtime Errors
// Description: Error taxonomy for level calculation and recalculation.
// Purpose: Separate fatal lookups and configuration errors from store failures.
// Dependencies: crate::{core, interfaces}, thiserror
// ============================================================================

//! ## Overview
//! Missing input data is not an error: calculators return `None` and flag the
//! previous record stale. Errors are reserved for unresolved required keys,
//! invalid configuration, and gateway failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::UnknownAggregationMethod;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Recalculation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalcError {
    /// A required record does not resolve.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity family (`enrollment`, `course`, `program outcome`).
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: u64,
    },
    /// Calculation configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Persistence gateway failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CalcError {
    /// Builds a not-found error.
    #[must_use]
    pub const fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound {
            entity,
            id,
        }
    }
}

impl From<UnknownAggregationMethod> for CalcError {
    fn from(error: UnknownAggregationMethod) -> Self {
        Self::Configuration(error.to_string())
    }
}
