//! Configuration validation.
//!
//! Validates every `[backtest]` and `[report]` key before a run so that a bad
//! file fails with the offending key named, not with a mid-pipeline error.

use crate::domain::error::MacrossError;
use crate::domain::portfolio::CrossoverPolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

use super::backtest::{DEFAULT_INITIAL_INVESTMENT, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_WINDOW};

pub const REPORT_FORMATS: &[&str] = &["text", "json"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    validate_symbol(config)?;
    validate_initial_investment(config)?;
    validate_windows(config)?;
    validate_crossover(config)?;
    validate_dates(config)?;
    validate_report_format(config)?;
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(MacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_initial_investment(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    if config.has_key("backtest", "initial_investment")
        && config
            .get_string("backtest", "initial_investment")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .is_none()
    {
        return Err(MacrossError::config_invalid(
            "backtest",
            "initial_investment",
            "must be a number",
        ));
    }
    let value = config.get_double("backtest", "initial_investment", DEFAULT_INITIAL_INVESTMENT);
    if !value.is_finite() || value <= 0.0 {
        return Err(MacrossError::config_invalid(
            "backtest",
            "initial_investment",
            "initial_investment must be positive",
        ));
    }
    Ok(())
}

fn read_window(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MacrossError> {
    let Some(raw) = config
        .get_string("backtest", key)
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n as usize),
        Ok(_) => Err(MacrossError::config_invalid(
            "backtest",
            key,
            format!("{key} must be at least 1"),
        )),
        Err(_) => Err(MacrossError::config_invalid(
            "backtest",
            key,
            format!("{key} must be a whole number"),
        )),
    }
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    let short = read_window(config, "short_window", DEFAULT_SHORT_WINDOW)?;
    let long = read_window(config, "long_window", DEFAULT_LONG_WINDOW)?;
    if short >= long {
        return Err(MacrossError::config_invalid(
            "backtest",
            "short_window",
            format!("short_window ({short}) must be less than long_window ({long})"),
        ));
    }
    Ok(())
}

fn validate_crossover(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    if let Some(value) = config.get_string("backtest", "crossover") {
        value
            .parse::<CrossoverPolicy>()
            .map_err(|reason| MacrossError::config_invalid("backtest", "crossover", reason))?;
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(MacrossError::config_invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Optional `YYYY-MM-DD` date from `[backtest]`; absent or blank is `None`.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, MacrossError> {
    match config
        .get_string("backtest", field)
        .filter(|s| !s.trim().is_empty())
    {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                MacrossError::config_invalid(
                    "backtest",
                    field,
                    format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}

fn validate_report_format(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    if let Some(format) = config.get_string("report", "format") {
        let format = format.trim().to_lowercase();
        if !REPORT_FORMATS.contains(&format.as_str()) {
            return Err(MacrossError::config_invalid(
                "report",
                "format",
                format!("unknown format '{format}' (expected text or json)"),
            ));
        }
    }
    Ok(())
}
