// crates/cpl-attainment-config/src/config.rs
// ============================================================================
// Module: CPL Attainment Configuration
// Description: Configuration loading and validation for the attainment engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: cpl-attainment-core, cpl-attainment-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Decimal settings are written as strings so they parse exactly; every
//! string is checked during [`AttainmentConfig::validate`], and the typed
//! [`RecalcConfig`] is only produced from a validated file.
//!
//! ```toml
//! [calculation]
//! aggregation_method = "weighted_by_stage"
//! default_stage = "reinforce"
//! default_stage_weight = "1.0"
//!
//! [calculation.stage_weights]
//! introduce = "0.5"
//! reinforce = "1.0"
//! master = "1.5"
//! assessed = "2.0"
//!
//! [store]
//! path = "attainment.db"
//! journal_mode = "wal"
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use cpl_attainment_core::AggregationMethod;
use cpl_attainment_core::RecalcConfig;
use cpl_attainment_core::StageTag;
use cpl_attainment_core::StageWeights;
use cpl_attainment_store_sqlite::SqliteGateway;
use cpl_attainment_store_sqlite::SqliteGatewayConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "cpl-attainment.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CPL_ATTAINMENT_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for the `SQLite` busy timeout.
const MAX_BUSY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level attainment engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttainmentConfig {
    /// Calculation policy.
    #[serde(default)]
    pub calculation: CalculationConfig,
    /// Optional durable store; absent means the caller supplies a gateway.
    #[serde(default)]
    pub store: Option<SqliteGatewayConfig>,
}

impl AttainmentConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// Resolution order: `path`, then [`CONFIG_ENV_VAR`], then
    /// `cpl-attainment.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calculation.recalc_config()?;
        if let Some(store) = &self.store {
            validate_store(store)?;
        }
        Ok(())
    }

    /// Returns the typed calculation policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a calculation setting is invalid.
    pub fn recalc_config(&self) -> Result<RecalcConfig, ConfigError> {
        self.calculation.recalc_config()
    }

    /// Opens the configured `SQLite` gateway, if a store section is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the gateway cannot be opened.
    pub fn open_gateway(&self) -> Result<Option<SqliteGateway>, ConfigError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let gateway = SqliteGateway::open(store.clone())
            .map_err(|err| ConfigError::Store(err.to_string()))?;
        Ok(Some(gateway))
    }
}

/// `[calculation]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalculationConfig {
    /// Level-4 aggregation method name; aliases are accepted.
    #[serde(default = "default_aggregation_method")]
    pub aggregation_method: String,
    /// Stage assumed for courses without a stage mapping.
    #[serde(default = "default_stage")]
    pub default_stage: String,
    /// Stage weight assumed for courses without a stage mapping.
    #[serde(default = "default_stage_weight")]
    pub default_stage_weight: String,
    /// Stage weights applied when a mapping omits its own weight.
    #[serde(default)]
    pub stage_weights: StageWeightsConfig,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            aggregation_method: default_aggregation_method(),
            default_stage: default_stage(),
            default_stage_weight: default_stage_weight(),
            stage_weights: StageWeightsConfig::default(),
        }
    }
}

impl CalculationConfig {
    /// Converts the section into a typed [`RecalcConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a name, label, or decimal is
    /// rejected.
    pub fn recalc_config(&self) -> Result<RecalcConfig, ConfigError> {
        let aggregation_method = AggregationMethod::from_str(self.aggregation_method.trim())
            .map_err(|err| ConfigError::Invalid(format!("calculation.aggregation_method: {err}")))?;
        let default_stage = StageTag::from_str(self.default_stage.trim())
            .map_err(|err| ConfigError::Invalid(format!("calculation.default_stage: {err}")))?;
        let default_stage_weight =
            parse_positive("calculation.default_stage_weight", &self.default_stage_weight)?;
        let stage_weights = self.stage_weights.stage_weights()?;
        Ok(RecalcConfig {
            aggregation_method,
            default_stage,
            default_stage_weight,
            stage_weights,
        })
    }
}

/// `[calculation.stage_weights]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageWeightsConfig {
    /// Introduce weight.
    pub introduce: String,
    /// Reinforce weight.
    pub reinforce: String,
    /// Master weight.
    pub master: String,
    /// Assessed weight.
    pub assessed: String,
}

impl Default for StageWeightsConfig {
    fn default() -> Self {
        let weights = StageWeights::default();
        Self {
            introduce: weights.introduce.to_string(),
            reinforce: weights.reinforce.to_string(),
            master: weights.master.to_string(),
            assessed: weights.assessed.to_string(),
        }
    }
}

impl StageWeightsConfig {
    /// Parses the section into typed stage weights.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a weight does not parse, is not
    /// positive, or weights do not strictly increase from introduce to
    /// assessed.
    pub fn stage_weights(&self) -> Result<StageWeights, ConfigError> {
        let weights = StageWeights {
            introduce: parse_positive("calculation.stage_weights.introduce", &self.introduce)?,
            reinforce: parse_positive("calculation.stage_weights.reinforce", &self.reinforce)?,
            master: parse_positive("calculation.stage_weights.master", &self.master)?,
            assessed: parse_positive("calculation.stage_weights.assessed", &self.assessed)?,
        };
        if !weights.is_monotonic() {
            return Err(ConfigError::Invalid(
                "calculation.stage_weights must strictly increase from introduce to assessed"
                    .to_string(),
            ));
        }
        Ok(weights)
    }
}

/// Returns the default aggregation method name.
fn default_aggregation_method() -> String {
    AggregationMethod::default().as_str().to_string()
}

/// Returns the default stage label.
fn default_stage() -> String {
    StageTag::Reinforce.as_str().to_string()
}

/// Returns the default stage weight.
fn default_stage_weight() -> String {
    "1.0".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Configured store failed to open.
    #[error("config store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates the `[store]` section.
fn validate_store(store: &SqliteGatewayConfig) -> Result<(), ConfigError> {
    if store.path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("store.path must be non-empty".to_string()));
    }
    let text = store.path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("store.path exceeds max length".to_string()));
    }
    for component in store.path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("store.path component too long".to_string()));
        }
    }
    if store.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "store.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Parses a strictly positive decimal setting.
fn parse_positive(field: &str, value: &str) -> Result<BigDecimal, ConfigError> {
    let parsed = BigDecimal::from_str(value.trim())
        .map_err(|_| ConfigError::Invalid(format!("{field} must be a decimal number")))?;
    if parsed <= BigDecimal::from(0) {
        return Err(ConfigError::Invalid(format!("{field} must be positive")));
    }
    Ok(parsed)
}
