//! Shared runtime state for sp-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum; this module owns
//! nothing async itself. The SQLite pool is the single storage handle shared
//! by request handlers and spawned report jobs.

use std::path::PathBuf;

use sqlx::sqlite::SqlitePool;

/// Static build metadata included in the health response.
#[derive(Clone, Copy, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub build: BuildInfo,
    /// Directory report artifacts are written under.
    pub exports_root: PathBuf,
}

impl AppState {
    pub fn new(pool: SqlitePool, exports_root: PathBuf) -> Self {
        Self {
            pool,
            build: BuildInfo {
                service: "sp-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            exports_root,
        }
    }
}
