// crates/cpl-attainment-core/src/core/identifiers.rs
// ============================================================================
// Module: CPL Attainment Identifiers
// Description: Canonical opaque identifiers for catalog and result records.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the identifiers used throughout the attainment engine.
//! Numeric identifiers mirror database surrogate keys and enforce non-zero,
//! 1-based invariants at construction boundaries. Terms are opaque labels such
//! as `2024/2025 Ganjil`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Numeric Identifiers
// ============================================================================

/// Declares a non-zero numeric identifier newtype.
macro_rules! numeric_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        ///
        /// # Invariants
        /// - Always >= 1 (non-zero, 1-based).
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            #[doc = concat!("Creates a new ", $label, " identifier from a non-zero value.")]
            #[must_use]
            pub const fn new(id: NonZeroU64) -> Self {
                Self(id)
            }

            #[doc = concat!("Creates a ", $label, " identifier from a raw value (returns `None` if zero).")]
            #[must_use]
            pub fn from_raw(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }

            /// Returns the raw identifier value (always >= 1).
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.get().fmt(f)
            }
        }
    };
}

numeric_identifier!(
    /// Student identifier (the owner of enrollments and aggregate results).
    StudentId,
    "student"
);
numeric_identifier!(
    /// Course identifier.
    CourseId,
    "course"
);
numeric_identifier!(
    /// Enrollment identifier: one student registered in one course instance.
    EnrollmentId,
    "enrollment"
);
numeric_identifier!(
    /// Assessment instrument identifier (quiz, exam, assignment).
    InstrumentId,
    "instrument"
);
numeric_identifier!(
    /// Sub-outcome (Sub-CPMK) identifier.
    SubOutcomeId,
    "sub-outcome"
);
numeric_identifier!(
    /// Course-level outcome (CPMK) identifier.
    OutcomeId,
    "outcome"
);
numeric_identifier!(
    /// Program-level outcome (CPL) identifier.
    ProgramOutcomeId,
    "program outcome"
);

// ============================================================================
// SECTION: Term
// ============================================================================

/// Academic term label attached to enrollments and contributions.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(String);

impl Term {
    /// Creates a new term label.
    #[must_use]
    pub fn new(term: impl Into<String>) -> Self {
        Self(term.into())
    }

    /// Returns the term as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
