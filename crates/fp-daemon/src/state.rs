//! Shared runtime state for fp-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The database pool is
//! optional so the router can boot (and answer health checks) without one;
//! routes that need it answer 503 instead.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::NaiveDate;
use fp_config::secrets::ResolvedSecrets;
use fp_config::AppConfig;
use fp_report::RegeneratedWorkbook;
use fp_schemas::{Order, OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderChange {
    Created,
    Updated,
}

/// Order lifecycle event carried inside SSE `order` events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderEvent {
    pub change: OrderChange,
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

impl OrderEvent {
    pub fn from_order(change: OrderChange, o: &Order) -> Self {
        Self {
            change,
            order_id: o.id,
            order_number: o.order_number.clone(),
            status: o.status,
            payment_status: o.payment_status,
        }
    }
}

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Order(OrderEvent),
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub config: AppConfig,
    /// Hash of the layered config the daemon booted with, if loaded from disk.
    pub config_hash: Option<String>,
    pub secrets: ResolvedSecrets,
    pub db: Option<PgPool>,
    /// Held across query + write so workbook rebuilds land in order.
    workbook_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig, secrets: ResolvedSecrets, db: Option<PgPool>) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "fp-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            config,
            config_hash: None,
            secrets,
            db,
            workbook_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn db(&self) -> Result<&PgPool, ApiError> {
        self.db.as_ref().ok_or(ApiError::DbUnavailable)
    }

    /// Rebuild the workbook for `date` from current data.
    pub async fn regenerate_workbook(&self, date: NaiveDate) -> anyhow::Result<RegeneratedWorkbook> {
        let pool = self.db.as_ref().ok_or_else(|| anyhow!("database not configured"))?;
        let _guard = self.workbook_lock.lock().await;
        fp_report::regenerate_daily_workbook(pool, &self.config, date).await
    }

    pub fn publish_order(&self, change: OrderChange, order: &Order) {
        let _ = self
            .bus
            .send(BusMsg::Order(OrderEvent::from_order(change, order)));
    }

    pub fn log_line(&self, level: &str, msg: impl Into<String>) {
        let _ = self.bus.send(BusMsg::LogLine {
            level: level.to_string(),
            msg: msg.into(),
        });
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

/// Rebuild the workbook for `date` off the request path. Failures are
/// logged and published as a `log` event; the caller never waits on this.
pub fn spawn_workbook_refresh(state: Arc<AppState>, date: NaiveDate) {
    if state.db.is_none() {
        return;
    }
    tokio::spawn(async move {
        match state.regenerate_workbook(date).await {
            Ok(out) => {
                tracing::debug!(file = %out.file_name, "daily workbook refreshed");
            }
            Err(err) => {
                tracing::warn!(date = %date, error = %format!("{err:#}"), "daily workbook refresh failed");
                state.log_line("WARN", format!("daily workbook refresh failed for {date}: {err}"));
            }
        }
    });
}

pub fn spawn_today_workbook(state: Arc<AppState>) {
    let today = fp_report::local_today(state.config.timezone, chrono::Utc::now());
    spawn_workbook_refresh(state, today);
}
