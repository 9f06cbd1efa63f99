//! Command handler modules for the `fp` CLI.
//!
//! Shared helpers used by multiple command paths live here.

pub mod orders;
pub mod reports;
pub mod users;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fp_config::{report_unused_keys, AppConfig, UnusedKeyPolicy};
use tracing::warn;

/// Effective config from FP_CONFIG_PATHS (or defaults).
pub fn load_config() -> Result<AppConfig> {
    let (cfg, loaded) = AppConfig::load_from_env().context("load config failed")?;
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for leaf in &report.unused_leaf_pointers {
        warn!(key = %leaf, "config key is not used");
    }
    Ok(cfg)
}

/// `date` or today in the shop's timezone.
pub fn date_or_today(date: Option<NaiveDate>, cfg: &AppConfig) -> NaiveDate {
    date.unwrap_or_else(|| fp_report::local_today(cfg.timezone, Utc::now()))
}

pub fn opt_dt(dt: &Option<DateTime<Utc>>) -> String {
    dt.as_ref().map(|d| d.to_rfc3339()).unwrap_or_default()
}

pub fn opt_str(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("")
}
