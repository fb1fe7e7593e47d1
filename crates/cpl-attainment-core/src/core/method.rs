// crates/cpl-attainment-core/src/core/method.rs
// ============================================================================
// Module: CPL Attainment Aggregation Method
// Description: Student-level aggregation method selector.
// Purpose: Name the four level-4 strategies and parse them strictly.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The aggregation method picks how per-course contributions combine into a
//! student's program outcome value. Parsing is strict: an unrecognized name
//! is a configuration error and never falls back to the default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Aggregation Method
// ============================================================================

/// Level-4 aggregation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    /// Arithmetic mean of contribution values.
    Simple,
    /// Weighted average by course credit weight.
    #[serde(alias = "weighted_by_sks")]
    WeightedByCredit,
    /// Weighted average by stage weight.
    #[default]
    #[serde(alias = "weighted_by_status")]
    WeightedByStage,
    /// Arithmetic mean over assessed-stage rows only.
    LastAssessment,
}

impl AggregationMethod {
    /// Returns the canonical method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::WeightedByCredit => "weighted_by_credit",
            Self::WeightedByStage => "weighted_by_stage",
            Self::LastAssessment => "last_assessment",
        }
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMethod {
    type Err = UnknownAggregationMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "simple" => Ok(Self::Simple),
            "weighted_by_credit" | "weighted_by_sks" => Ok(Self::WeightedByCredit),
            "weighted_by_stage" | "weighted_by_status" => Ok(Self::WeightedByStage),
            "last_assessment" => Ok(Self::LastAssessment),
            other => Err(UnknownAggregationMethod(other.to_string())),
        }
    }
}

/// Error raised for an unrecognized aggregation method name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown aggregation method: {0}")]
pub struct UnknownAggregationMethod(pub String);

// ============================================================================
// SECTION: Tests
// ============================================================================
