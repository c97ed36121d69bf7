//! sp-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, opens the database,
//! runs the optional startup ingest, wires middleware, and starts the HTTP
//! server. All route handlers live in `routes.rs`; all shared state types
//! live in `state.rs`.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use sp_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

pub const ENV_DAEMON_ADDR: &str = "SP_DAEMON_ADDR";
pub const ENV_DATA_DIR: &str = "SP_DATA_DIR";
pub const ENV_EXPORTS_ROOT: &str = "SP_EXPORTS_ROOT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let pool = sp_db::connect_from_env().await?;
    sp_db::migrate(&pool).await?;

    // Optional startup ingest: reload the three source CSVs when a data dir
    // is configured. An unreadable dataset is a warning, not a boot failure;
    // the daemon still serves reports over whatever is already stored.
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        match sp_ingest::load_csv_dir(&pool, std::path::Path::new(&dir)).await {
            Ok(report) => info!(
                observations = report.status.counts.rows_ok,
                rejected = report.status.counts.rows_rejected,
                "startup ingest loaded {dir}"
            ),
            Err(e) => warn!("startup ingest failed: {e:#}"),
        }
    }

    let exports_root =
        PathBuf::from(std::env::var(ENV_EXPORTS_ROOT).unwrap_or_else(|_| "./exports".to_string()));
    let shared = Arc::new(state::AppState::new(pool, exports_root));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8088)));
    info!("sp-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
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
    std::env::var(ENV_DAEMON_ADDR).ok()?.parse().ok()
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
