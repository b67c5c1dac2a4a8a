//! Shared CLI utilities.

use super::GlobalArgs;
use crate::config::{load_config, Config};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

/// Load the layered configuration and apply command-line overrides.
pub fn load_settings(global: &GlobalArgs) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let mut config = load_config(&cwd, global.config.as_deref())?;

    if let Some(root) = &global.root {
        config.staging_root = root.clone();
    }
    config.validate().context("Invalid configuration")?;

    tracing::debug!("Staging root: {}", config.staging_root.display());
    Ok(config)
}

/// Parse `YYYY-MM-DD`; a missing or malformed value falls back to `today`.
pub fn parse_date_or(value: Option<&str>, today: NaiveDate) -> NaiveDate {
    match value {
        None => today,
        Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => {
                tracing::info!("Using custom date: {}", date);
                date
            }
            Err(_) => {
                tracing::warn!("Invalid date format: {}. Using current date.", raw);
                today
            }
        },
    }
}

pub fn parse_date(value: Option<&str>) -> NaiveDate {
    parse_date_or(value, Local::now().date_naive())
}
