// crates/cpl-attainment-core/src/core/time.rs
// ============================================================================
// Module: CPL Attainment Time Model
// Description: Canonical timestamp representations for computed records.
// Purpose: Keep recalculation output deterministic and replayable.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The engine stamps every computed record with a caller-supplied time value.
//! The core never reads wall-clock time directly, so recomputing with the same
//! inputs and the same timestamp yields identical records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Time value used for registrations and last-computed markers.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - Only values of the same kind are ordered. A unix value and a logical value
///   are incomparable, so a student's registrations must all use one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// Monotonic logical time value.
    Logical(u64),
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::UnixMillis(left), Self::UnixMillis(right)) => Some(left.cmp(right)),
            (Self::Logical(left), Self::Logical(right)) => Some(left.cmp(right)),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::Timestamp;

    #[test]
    fn same_kind_values_order_by_magnitude() {
        assert!(Timestamp::Logical(2) > Timestamp::Logical(1));
        assert!(Timestamp::UnixMillis(-5) < Timestamp::UnixMillis(0));
        assert_eq!(
            Timestamp::Logical(7).partial_cmp(&Timestamp::Logical(7)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn mixed_kinds_are_incomparable() {
        let unix = Timestamp::UnixMillis(1_700_000_000_000);
        let logical = Timestamp::Logical(1);
        assert_eq!(unix.partial_cmp(&logical), None);
        assert_eq!(logical.partial_cmp(&unix), None);
    }
}
