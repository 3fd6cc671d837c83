//! Configuration validation.
//!
//! Range-checks every recognised key before a run. Missing keys are fine:
//! the builders fall back to the defaults.

use crate::domain::error::PricecastError;
use crate::domain::features::FEATURE_COUNT;
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 2] = ["csv", "yahoo"];

pub fn validate_forecast_config(config: &dyn ConfigPort) -> Result<(), PricecastError> {
    validate_data_source(config)?;
    validate_forecast_window(config)?;
    validate_threshold(config)?;
    validate_model(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PricecastError {
    PricecastError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), PricecastError> {
    let Some(source) = config.get_string("data", "source") else {
        return Ok(());
    };
    let source = source.trim().to_lowercase();
    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown source '{}', expected csv or yahoo", source),
        ));
    }
    if source == "csv"
        && config
            .get_string("data", "data_dir")
            .is_none_or(|d| d.trim().is_empty())
    {
        return Err(PricecastError::ConfigMissing {
            section: "data".to_string(),
            key: "data_dir".to_string(),
        });
    }
    Ok(())
}

fn require_at_least(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    minimum: i64,
) -> Result<(), PricecastError> {
    let value = config.get_int(section, key, default);
    if value < minimum {
        return Err(invalid(
            section,
            key,
            format!("{} must be at least {}", key, minimum),
        ));
    }
    Ok(())
}

fn validate_forecast_window(config: &dyn ConfigPort) -> Result<(), PricecastError> {
    require_at_least(config, "forecast", "lookback_days", 90, 1)?;
    require_at_least(config, "forecast", "history_days", 30, 1)?;
    require_at_least(config, "forecast", "min_training_rows", 20, 1)?;
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), PricecastError> {
    let value = config.get_double("forecast", "threshold_pct", 0.5);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "forecast",
            "threshold_pct",
            "threshold_pct must be a non-negative number",
        ));
    }
    Ok(())
}

fn validate_model(config: &dyn ConfigPort) -> Result<(), PricecastError> {
    require_at_least(config, "model", "n_estimators", 300, 1)?;
    require_at_least(config, "model", "seed", 42, 0)?;
    require_at_least(config, "model", "max_depth", 0, 0)?;
    require_at_least(config, "model", "min_samples_split", 2, 2)?;
    require_at_least(config, "model", "min_samples_leaf", 1, 1)?;

    let max_features = config.get_int("model", "max_features", 0);
    if max_features < 0 || max_features > FEATURE_COUNT as i64 {
        return Err(invalid(
            "model",
            "max_features",
            format!("max_features must be between 0 and {}", FEATURE_COUNT),
        ));
    }
    Ok(())
}
