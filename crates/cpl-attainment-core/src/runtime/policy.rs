// crates/cpl-attainment-core/src/runtime/policy.rs
// ============================================================================
// Module: CPL Attainment Recalculation Policy
// Description: Explicit defaults passed into every calculation call.
// Purpose: Replace process-wide defaults with a value owned by the caller.
// Dependencies: crate::core, bigdecimal
// ============================================================================

//! ## Overview
//! [`RecalcConfig`] carries the level-4 aggregation method, the stage used
//! when a course has no stage mapping, and the stage weight table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use bigdecimal::One;

use crate::core::AggregationMethod;
use crate::core::StageMapping;
use crate::core::StageTag;
use crate::core::StageWeights;
use crate::runtime::error::CalcError;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Calculation policy shared by all levels of one recalculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalcConfig {
    /// Level-4 aggregation strategy.
    pub aggregation_method: AggregationMethod,
    /// Stage assumed when a course has no stage mapping for a program outcome.
    pub default_stage: StageTag,
    /// Stage weight assumed when a course has no stage mapping.
    pub default_stage_weight: BigDecimal,
    /// Stage weights applied when a stage mapping omits its weight.
    pub stage_weights: StageWeights,
}

impl Default for RecalcConfig {
    fn default() -> Self {
        Self {
            aggregation_method: AggregationMethod::default(),
            default_stage: StageTag::Reinforce,
            default_stage_weight: BigDecimal::one(),
            stage_weights: StageWeights::default(),
        }
    }
}

impl RecalcConfig {
    /// Builds the default policy with the named aggregation method.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::Configuration`] when the method name is unknown.
    pub fn with_method_name(name: &str) -> Result<Self, CalcError> {
        Ok(Self {
            aggregation_method: name.parse()?,
            ..Self::default()
        })
    }

    /// Resolves the stage and stage weight for a course contribution.
    ///
    /// Returns `true` in the last position when the mapping default was used.
    #[must_use]
    pub fn resolve_stage(&self, mapping: Option<&StageMapping>) -> (StageTag, BigDecimal, bool) {
        match mapping {
            Some(mapping) => {
                let weight = mapping
                    .stage_weight
                    .clone()
                    .unwrap_or_else(|| self.stage_weights.weight_for(mapping.stage).clone());
                (mapping.stage, weight, false)
            }
            None => (self.default_stage, self.default_stage_weight.clone(), true),
        }
    }
}
