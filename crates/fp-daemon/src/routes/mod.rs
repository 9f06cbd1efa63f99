//! Axum router and HTTP handlers for fp-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are grouped by audience: customer order flow,
//! profile and setup, admin panel, and daily reports.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{delete, get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{
    api_types::HealthResponse,
    state::{AppState, BusMsg},
};

mod admin;
mod orders;
mod profile;
mod reports;

/// Upload ceiling for a whole multipart order.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/stream", get(stream))
        // customer
        .route(
            "/v1/orders",
            post(orders::create_order).get(orders::list_my_orders),
        )
        .route(
            "/v1/orders/:id",
            get(orders::get_order).patch(orders::update_order),
        )
        .route("/v1/orders/:id/payment", get(orders::payment_link))
        .route("/v1/dashboard", get(orders::dashboard))
        .route(
            "/v1/profile/address",
            get(profile::get_address).put(profile::put_address),
        )
        .route("/v1/profile/setup", post(profile::setup_profile))
        .route("/v1/setup/admin", post(profile::setup_admin))
        .route("/v1/setup/upgrade-me", post(profile::upgrade_me))
        // admin
        .route("/v1/admin/orders", get(admin::list_orders))
        .route(
            "/v1/admin/orders/:id",
            get(admin::get_order).patch(admin::update_order),
        )
        .route(
            "/v1/admin/orders/:id/items/:item_id/file",
            get(admin::download_item_file),
        )
        .route("/v1/admin/analytics", get(admin::analytics))
        .route("/v1/admin/users", get(admin::list_users))
        .route("/v1/admin/reports", get(reports::daily_report))
        .route("/v1/admin/reports/expenses", post(reports::add_expense))
        .route(
            "/v1/admin/reports/expenses/:id",
            delete(reports::delete_expense),
        )
        .route(
            "/v1/admin/reports/excel",
            get(reports::excel_download).post(reports::excel_regenerate),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
            db_configured: st.db.is_some(),
            config_hash: st.config_hash.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::Order(_) => "order",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
