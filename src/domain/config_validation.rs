//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::SmacrossError;
use crate::domain::portfolio::{CashAccounting, PositionMode};
use crate::domain::signal::WarmupPolicy;
use crate::domain::timeline::DateAlignment;
use crate::domain::universe::parse_instruments;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_SHORT_WINDOW: i64 = 40;
pub const DEFAULT_LONG_WINDOW: i64 = 100;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_instruments(config)?;
    read_policy::<DateAlignment>(config, "backtest", "date_alignment")?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_windows(config)?;
    read_policy::<WarmupPolicy>(config, "strategy", "warmup")?;
    read_policy::<PositionMode>(config, "strategy", "position_mode")?;
    read_policy::<CashAccounting>(config, "strategy", "cash_accounting")?;
    Ok(())
}

/// Reads an enumerated setting, falling back to its default when absent.
pub fn read_policy<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<T, SmacrossError>
where
    T: FromStr<Err = String> + Default,
{
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => {
            s.parse::<T>().map_err(|reason| SmacrossError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason,
            })
        }
        _ => Ok(T::default()),
    }
}

/// Parses a required `YYYY-MM-DD` date from `[backtest]`.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SmacrossError> {
    match value {
        None => Err(SmacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SmacrossError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if value <= 0.0 || !value.is_finite() {
        return Err(SmacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(SmacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(SmacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

fn validate_instruments(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    match config.get_string("backtest", "instruments") {
        Some(s) if !s.trim().is_empty() => {
            parse_instruments(&s).map_err(|e| SmacrossError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "instruments".to_string(),
                reason: e.to_string(),
            })?;
            Ok(())
        }
        _ => Err(SmacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: "instruments".to_string(),
        }),
    }
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let short = config.get_int("strategy", "short_window", DEFAULT_SHORT_WINDOW);
    let long = config.get_int("strategy", "long_window", DEFAULT_LONG_WINDOW);

    if short < 1 {
        return Err(SmacrossError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "short_window".to_string(),
            reason: "short_window must be at least 1".to_string(),
        });
    }
    if long <= short {
        return Err(SmacrossError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "long_window".to_string(),
            reason: "long_window must be greater than short_window".to_string(),
        });
    }
    Ok(())
}
