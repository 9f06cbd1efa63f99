use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use fp_orders::{OrderLimits, Pricing};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};

/// Comma-separated list of YAML files, base first.
pub const ENV_CONFIG_PATHS: &str = "FP_CONFIG_PATHS";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
const DEFAULT_UPI_VPA: &str = "flashprint@upi";
const DEFAULT_MERCHANT_NAME: &str = "FlashPrint";
const DEFAULT_SETUP_KEY_ENV: &str = "FP_ADMIN_SETUP_KEY";

/// Typed view of the effective config. Every field has a default so an empty
/// document is a valid config.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub pricing: Pricing,
    pub limits: OrderLimits,
    pub uploads_dir: PathBuf,
    pub exports_dir: PathBuf,
    /// Calendar days for reports and "today" counters are cut in this zone.
    pub timezone: Tz,
    pub upi_vpa: String,
    pub merchant_name: String,
    /// NAME of the env var holding the admin setup key.
    pub setup_key_env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            pricing: Pricing::default(),
            limits: OrderLimits::default(),
            uploads_dir: PathBuf::from("uploads"),
            exports_dir: PathBuf::from("exports/daily-reports"),
            timezone: chrono_tz::Asia::Kolkata,
            upi_vpa: DEFAULT_UPI_VPA.to_string(),
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
            setup_key_env: DEFAULT_SETUP_KEY_ENV.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        let bind_raw = str_at(v, "/server/bind_addr")?.unwrap_or(DEFAULT_BIND_ADDR);
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .with_context(|| format!("invalid server.bind_addr: {bind_raw}"))?;

        let defaults = Pricing::default();
        let pricing = Pricing {
            bw_price_paise: rupees_at(v, "/pricing/bw_price_per_page")?
                .unwrap_or(defaults.bw_price_paise),
            color_price_paise: rupees_at(v, "/pricing/color_price_per_page")?
                .unwrap_or(defaults.color_price_paise),
            bw_cost_paise: rupees_at(v, "/pricing/bw_cost_per_page")?
                .unwrap_or(defaults.bw_cost_paise),
            color_cost_paise: rupees_at(v, "/pricing/color_cost_per_page")?
                .unwrap_or(defaults.color_cost_paise),
        };

        let d_limits = OrderLimits::default();
        let max_copies = limit_at(v, "/orders/max_copies")?.unwrap_or(d_limits.max_copies);
        let max_pages = limit_at(v, "/orders/max_pages")?.unwrap_or(d_limits.max_pages);

        let tz_raw = str_at(v, "/reporting/timezone")?.unwrap_or(DEFAULT_TIMEZONE);
        let timezone: Tz = tz_raw
            .parse()
            .map_err(|e| anyhow!("invalid reporting.timezone '{tz_raw}': {e}"))?;

        let d = AppConfig::default();
        Ok(Self {
            bind_addr,
            pricing,
            limits: OrderLimits {
                max_copies,
                max_pages,
            },
            uploads_dir: str_at(v, "/uploads/dir")?
                .map(PathBuf::from)
                .unwrap_or(d.uploads_dir),
            exports_dir: str_at(v, "/reporting/exports_dir")?
                .map(PathBuf::from)
                .unwrap_or(d.exports_dir),
            timezone,
            upi_vpa: str_at(v, "/payment/upi_vpa")?
                .map(str::to_string)
                .unwrap_or(d.upi_vpa),
            merchant_name: str_at(v, "/payment/merchant_name")?
                .map(str::to_string)
                .unwrap_or(d.merchant_name),
            setup_key_env: str_at(v, "/setup/setup_key_env")?
                .map(str::to_string)
                .unwrap_or(d.setup_key_env),
        })
    }

    /// Load from the files named in `FP_CONFIG_PATHS`, or an empty document
    /// (all defaults) when the variable is unset.
    pub fn load_from_env() -> Result<(Self, LoadedConfig)> {
        let loaded = match std::env::var(ENV_CONFIG_PATHS) {
            Ok(raw) if !raw.trim().is_empty() => {
                let paths: Vec<&str> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect();
                load_layered_yaml(&paths)?
            }
            _ => load_layered_yaml_from_strings(&["{}"])?,
        };
        let cfg = Self::from_json(&loaded.config_json)?;
        Ok((cfg, loaded))
    }
}

/// Non-empty trimmed string at `pointer`. A present non-string value is an
/// error; absent or blank is `None`.
fn str_at<'a>(v: &'a Value, pointer: &str) -> Result<Option<&'a str>> {
    match v.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let t = s.trim();
            Ok(if t.is_empty() { None } else { Some(t) })
        }
        Some(_) => Err(anyhow!("config {pointer} must be a string")),
    }
}

/// Rupee amount (int or float) at `pointer`, converted to paise.
fn rupees_at(v: &Value, pointer: &str) -> Result<Option<i64>> {
    let Some(raw) = v.pointer(pointer) else {
        return Ok(None);
    };
    let rupees = raw
        .as_f64()
        .ok_or_else(|| anyhow!("config {pointer} must be a number"))?;
    if !rupees.is_finite() || rupees < 0.0 {
        bail!("config {pointer} must be a non-negative amount, got {rupees}");
    }
    Ok(Some((rupees * 100.0).round() as i64))
}

/// Positive `u32` limit at `pointer`.
fn limit_at(v: &Value, pointer: &str) -> Result<Option<u32>> {
    let Some(raw) = v.pointer(pointer) else {
        return Ok(None);
    };
    let n = raw
        .as_u64()
        .ok_or_else(|| anyhow!("config {pointer} must be a positive integer"))?;
    match u32::try_from(n) {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => bail!("config {pointer} out of range: {n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rupees_convert_to_paise() {
        let v = json!({"pricing": {"bw_price_per_page": 2.5, "color_cost_per_page": 4}});
        assert_eq!(rupees_at(&v, "/pricing/bw_price_per_page").unwrap(), Some(250));
        assert_eq!(rupees_at(&v, "/pricing/color_cost_per_page").unwrap(), Some(400));
        assert_eq!(rupees_at(&v, "/pricing/missing").unwrap(), None);
    }

    #[test]
    fn negative_rates_are_rejected() {
        let v = json!({"pricing": {"bw_price_per_page": -1}});
        assert!(AppConfig::from_json(&v).is_err());
    }

    #[test]
    fn order_limits_read_from_orders_section() {
        let v = json!({"orders": {"max_copies": 7, "max_pages": 300}});
        let cfg = AppConfig::from_json(&v).unwrap();
        assert_eq!(cfg.limits.max_copies, 7);
        assert_eq!(cfg.limits.max_pages, 300);

        let d = AppConfig::from_json(&json!({})).unwrap();
        assert_eq!(d.limits, OrderLimits::default());

        assert!(AppConfig::from_json(&json!({"orders": {"max_pages": 0}})).is_err());
        assert!(AppConfig::from_json(&json!({"orders": {"max_pages": 5_000_000_000u64}})).is_err());
    }
}
