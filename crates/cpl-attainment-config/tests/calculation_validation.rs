//! Calculation and store section validation tests for cpl-attainment-config.
// crates/cpl-attainment-config/tests/calculation_validation.rs
// =============================================================================
// Module: Calculation Validation Tests
// Description: Validate `[calculation]` and `[store]` semantics.
// Purpose: Ensure policy settings are parsed exactly and rejected fail-closed.
// =============================================================================

#![allow(clippy::use_debug, reason = "Test-only diagnostics are permitted.")]

use std::str::FromStr;

use bigdecimal::BigDecimal;
use cpl_attainment_config::AttainmentConfig;
use cpl_attainment_config::ConfigError;
use cpl_attainment_core::AggregationMethod;
use cpl_attainment_core::RecalcConfig;
use cpl_attainment_core::StageTag;
use cpl_attainment_store_sqlite::SqliteJournalMode;
use cpl_attainment_store_sqlite::SqliteSyncMode;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<AttainmentConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

fn decimal(value: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(value).map_err(|err| err.to_string())
}

#[test]
fn defaults_match_engine_policy() -> TestResult {
    let config = AttainmentConfig::default();
    let recalc = config.recalc_config().map_err(|err| err.to_string())?;
    if recalc != RecalcConfig::default() {
        return Err(format!("default config produced {recalc:?}"));
    }
    Ok(())
}

#[test]
fn full_calculation_section_parses_exact_decimals() -> TestResult {
    let config = AttainmentConfig::from_toml(
        r#"
        [calculation]
        aggregation_method = "weighted_by_sks"
        default_stage = "I"
        default_stage_weight = "0.75"

        [calculation.stage_weights]
        introduce = "0.25"
        reinforce = "1.10"
        master = "1.60"
        assessed = "2.40"
        "#,
    )
    .map_err(|err| err.to_string())?;
    let recalc = config.recalc_config().map_err(|err| err.to_string())?;
    if recalc.aggregation_method != AggregationMethod::WeightedByCredit {
        return Err(format!("unexpected method {}", recalc.aggregation_method));
    }
    if recalc.default_stage != StageTag::Introduce {
        return Err(format!("unexpected default stage {}", recalc.default_stage));
    }
    if recalc.default_stage_weight != decimal("0.75")? {
        return Err("default stage weight not parsed exactly".to_string());
    }
    if recalc.stage_weights.weight_for(StageTag::Master) != &decimal("1.6")? {
        return Err("master weight not parsed exactly".to_string());
    }
    Ok(())
}

#[test]
fn unknown_method_is_rejected() -> TestResult {
    assert_invalid(
        AttainmentConfig::from_toml("[calculation]\naggregation_method = \"median\"\n"),
        "unknown aggregation method: median",
    )
}

#[test]
fn unknown_default_stage_is_rejected() -> TestResult {
    assert_invalid(
        AttainmentConfig::from_toml("[calculation]\ndefault_stage = \"X\"\n"),
        "calculation.default_stage",
    )
}

#[test]
fn non_decimal_weight_is_rejected() -> TestResult {
    assert_invalid(
        AttainmentConfig::from_toml("[calculation]\ndefault_stage_weight = \"one\"\n"),
        "calculation.default_stage_weight must be a decimal number",
    )
}

#[test]
fn non_positive_weight_is_rejected() -> TestResult {
    assert_invalid(
        AttainmentConfig::from_toml(
            "[calculation.stage_weights]\nintroduce = \"0\"\nreinforce = \"1\"\nmaster = \"2\"\nassessed = \"3\"\n",
        ),
        "calculation.stage_weights.introduce must be positive",
    )
}

#[test]
fn non_increasing_stage_weights_are_rejected() -> TestResult {
    assert_invalid(
        AttainmentConfig::from_toml(
            "[calculation.stage_weights]\nintroduce = \"0.5\"\nreinforce = \"1.5\"\nmaster = \"1.5\"\nassessed = \"2.0\"\n",
        ),
        "must strictly increase",
    )
}

#[test]
fn partial_stage_weights_are_rejected() -> TestResult {
    assert_invalid(
        AttainmentConfig::from_toml("[calculation.stage_weights]\nintroduce = \"0.5\"\n"),
        "config parse error",
    )
}

#[test]
fn store_section_parses_pragmas() -> TestResult {
    let config = AttainmentConfig::from_toml(
        "[store]\npath = \"attainment.db\"\njournal_mode = \"delete\"\nsync_mode = \"normal\"\nbusy_timeout_ms = 250\n",
    )
    .map_err(|err| err.to_string())?;
    let store = config.store.ok_or_else(|| "store section missing".to_string())?;
    if store.journal_mode != SqliteJournalMode::Delete || store.sync_mode != SqliteSyncMode::Normal {
        return Err("store pragmas not parsed".to_string());
    }
    if store.busy_timeout_ms != 250 {
        return Err("busy timeout not parsed".to_string());
    }
    Ok(())
}

#[test]
fn store_busy_timeout_is_bounded() -> TestResult {
    assert_invalid(
        AttainmentConfig::from_toml("[store]\npath = \"attainment.db\"\nbusy_timeout_ms = 600000\n"),
        "store.busy_timeout_ms must be at most",
    )
}

#[test]
fn store_path_must_be_non_empty() -> TestResult {
    assert_invalid(
        AttainmentConfig::from_toml("[store]\npath = \"\"\n"),
        "store.path must be non-empty",
    )
}

#[test]
fn open_gateway_creates_configured_database() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("data").join("attainment.db");
    let content = format!("[store]\npath = {:?}\n", path.display().to_string());
    let config = AttainmentConfig::from_toml(&content).map_err(|err| err.to_string())?;
    let gateway = config.open_gateway().map_err(|err| err.to_string())?;
    if gateway.is_none() {
        return Err("expected a gateway".to_string());
    }
    if !path.exists() {
        return Err("database file was not created".to_string());
    }
    Ok(())
}

#[test]
fn open_gateway_without_store_returns_none() -> TestResult {
    let config = AttainmentConfig::default();
    let gateway = config.open_gateway().map_err(|err| err.to_string())?;
    if gateway.is_some() {
        return Err("expected no gateway".to_string());
    }
    Ok(())
}
