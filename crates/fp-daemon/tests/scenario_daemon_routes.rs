//! In-process scenario tests for fp-daemon HTTP endpoints that need no
//! database.
//!
//! Each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot`; no network I/O required.

use std::sync::Arc;

use axum::http::{header, Request, StatusCode};
use fp_config::{secrets::ResolvedSecrets, AppConfig};
use fp_daemon::{routes, state};
use http_body_util::BodyExt;
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn secrets(key: Option<&str>) -> ResolvedSecrets {
    ResolvedSecrets {
        admin_setup_key: key.map(str::to_string),
        admin_setup_key_env: "FP_ADMIN_SETUP_KEY".to_string(),
    }
}

/// Router with default config and no database.
fn make_router(setup_key: Option<&str>) -> axum::Router {
    let st = Arc::new(state::AppState::new(
        AppConfig::default(),
        secrets(setup_key),
        None,
    ));
    routes::build_router(st)
}

async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn get(uri: &str, token: Option<&str>) -> Request<axum::body::Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(axum::body::Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_service_and_missing_db() {
    let (status, body) = call(make_router(None), get("/v1/health", None)).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "fp-daemon");
    assert_eq!(json["db_configured"], false);
    assert!(json["config_hash"].is_null());
}

#[tokio::test]
async fn health_carries_config_hash_when_set() {
    let st = Arc::new(
        state::AppState::new(AppConfig::default(), secrets(None), None).with_config_hash("abc123"),
    );
    let (status, body) = call(routes::build_router(st), get("/v1/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["config_hash"], "abc123");
}

// ---------------------------------------------------------------------------
// Auth and database gating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn customer_routes_without_token_are_401() {
    for uri in ["/v1/orders", "/v1/dashboard", "/v1/profile/address"] {
        let (status, body) = call(make_router(None), get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(parse_json(body)["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn admin_routes_without_token_are_401() {
    for uri in [
        "/v1/admin/orders",
        "/v1/admin/analytics",
        "/v1/admin/users",
        "/v1/admin/reports",
        "/v1/admin/reports/excel?action=list",
    ] {
        let (status, _) = call(make_router(None), get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn non_bearer_authorization_is_401() {
    let req = Request::builder()
        .method("GET")
        .uri("/v1/orders")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = call(make_router(None), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_without_database_is_503() {
    let (status, body) = call(make_router(None), get("/v1/orders", Some("deadbeef"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(parse_json(body)["error"], "database not configured");
}

// ---------------------------------------------------------------------------
// POST /v1/setup/admin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn setup_admin_is_disabled_without_key() {
    let req = post_json(
        "/v1/setup/admin",
        serde_json::json!({ "setupKey": "", "email": "ops@campus.test" }),
    );
    let (status, body) = call(make_router(None), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let err = parse_json(body)["error"].as_str().unwrap().to_string();
    assert!(err.contains("FP_ADMIN_SETUP_KEY"), "{err}");
}

#[tokio::test]
async fn setup_admin_rejects_wrong_key() {
    let req = post_json(
        "/v1/setup/admin",
        serde_json::json!({ "setupKey": "nope", "email": "ops@campus.test" }),
    );
    let (status, body) = call(make_router(Some("s3cret-key")), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(parse_json(body)["error"], "Invalid setup key");
}

#[tokio::test]
async fn setup_admin_validates_email_before_touching_db() {
    let req = post_json(
        "/v1/setup/admin",
        serde_json::json!({ "setupKey": "s3cret-key", "email": "nobody" }),
    );
    let (status, _) = call(make_router(Some("s3cret-key")), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn setup_admin_with_key_but_no_db_is_503() {
    let req = post_json(
        "/v1/setup/admin",
        serde_json::json!({ "setupKey": "s3cret-key", "email": "ops@campus.test" }),
    );
    let (status, _) = call(make_router(Some("s3cret-key")), req).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------------------
// GET /v1/stream
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stream_is_event_stream() {
    let resp = make_router(None)
        .oneshot(get("/v1/stream", None))
        .await
        .expect("oneshot failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(ct.starts_with("text/event-stream"), "{ct}");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = call(make_router(None), get("/v1/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
