//! Configuration validation.
//!
//! Validates all config fields before a review or watch run starts.

use crate::domain::error::EquitywatchError;
use crate::ports::config_port::ConfigPort;

const LEDGER_SOURCES: &[&str] = &["csv", "sqlite", "postgres"];

pub fn validate_ledger_config(config: &dyn ConfigPort) -> Result<(), EquitywatchError> {
    let source = validate_source(config)?;
    match source.as_str() {
        "csv" => validate_csv_path(config)?,
        "sqlite" => validate_pool_size(config)?,
        _ => {}
    }
    Ok(())
}

pub fn validate_watch_config(config: &dyn ConfigPort) -> Result<(), EquitywatchError> {
    validate_interval(config)?;
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<String, EquitywatchError> {
    let source = match config.get_str("ledger", "source") {
        Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
        _ => {
            return Err(EquitywatchError::ConfigMissing {
                section: "ledger".to_string(),
                key: "source".to_string(),
            })
        }
    };
    if !LEDGER_SOURCES.contains(&source.as_str()) {
        return Err(EquitywatchError::ConfigInvalid {
            section: "ledger".to_string(),
            key: "source".to_string(),
            reason: format!("unknown ledger source '{}', expected csv, sqlite or postgres", source),
        });
    }
    Ok(source)
}

fn validate_csv_path(config: &dyn ConfigPort) -> Result<(), EquitywatchError> {
    match config.get_str("ledger", "csv_path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(EquitywatchError::ConfigMissing {
            section: "ledger".to_string(),
            key: "csv_path".to_string(),
        }),
    }
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), EquitywatchError> {
    let value = config.get_i64("sqlite", "pool_size", 4);
    if value < 1 {
        return Err(EquitywatchError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), EquitywatchError> {
    let value = config.get_i64("watch", "interval_secs", 60);
    if value < 1 {
        return Err(EquitywatchError::ConfigInvalid {
            section: "watch".to_string(),
            key: "interval_secs".to_string(),
            reason: "interval_secs must be at least 1".to_string(),
        });
    }
    Ok(())
}
