//! fp-daemon entry point.
//!
//! Sets up tracing, loads config and secrets, connects the database if one is
//! configured, wires middleware and starts the HTTP server. Route handlers
//! live in `routes/`; shared state lives in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use fp_config::{report_unused_keys, secrets::resolve_secrets, AppConfig, UnusedKeyPolicy};
use fp_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let (config, loaded) = AppConfig::load_from_env().context("load config failed")?;
    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for leaf in &unused.unused_leaf_pointers {
        warn!(key = %leaf, "config key is not used");
    }
    let secrets = resolve_secrets(&config);
    if secrets.admin_setup_key.is_none() {
        info!(env = %secrets.admin_setup_key_env, "admin setup endpoints disabled");
    }

    let db = match std::env::var(fp_db::ENV_DB_URL) {
        Ok(_) => {
            let pool = fp_db::connect_from_env().await?;
            fp_db::migrate(&pool).await?;
            Some(pool)
        }
        Err(_) => {
            warn!("{} not set; database routes will answer 503", fp_db::ENV_DB_URL);
            None
        }
    };

    let bind = bind_addr_from_env().unwrap_or(config.bind_addr);
    let shared = Arc::new(
        state::AppState::new(config, secrets, db).with_config_hash(loaded.config_hash),
    );

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(5));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    info!("fp-daemon listening on http://{}", bind);

    axum::serve(tokio::net::TcpListener::bind(bind).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("FP_DAEMON_ADDR").ok()?.parse().ok()
}

/// CORS: allow only localhost origins (storefront and admin dev servers).
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(tower_http::cors::Any)
}
