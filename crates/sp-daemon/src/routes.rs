//! Axum router and all HTTP handlers for sp-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use sp_schemas::JobStatus;

use crate::{
    api_types::{ErrorResponse, HealthResponse, ReportStatusResponse, TriggerReportResponse},
    state::AppState,
};

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
        .route("/v1/report/trigger", post(trigger_report))
        .route("/v1/report/:report_id", get(get_report))
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
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/report/trigger
// ---------------------------------------------------------------------------

/// Create a Running job row, spawn the estimation pass, and return the job
/// id immediately. The job records its own terminal state; this handler
/// never waits for it.
pub(crate) async fn trigger_report(State(st): State<Arc<AppState>>) -> Response {
    let report_id = Uuid::new_v4();

    if let Err(e) = sp_db::create_report_job(&st.pool, report_id, Utc::now()).await {
        error!(%report_id, "report trigger failed to create job row: {e:#}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "failed to create report job".to_string(),
            }),
        )
            .into_response();
    }

    tokio::spawn(sp_report::run_report_job(
        st.pool.clone(),
        st.exports_root.clone(),
        report_id,
    ));

    info!(%report_id, "report/trigger");
    (StatusCode::OK, Json(TriggerReportResponse { report_id })).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/report/{report_id}
// ---------------------------------------------------------------------------

/// Poll a report job: Running/Failed as JSON, Complete as the CSV artifact.
pub(crate) async fn get_report(
    State(st): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&report_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid report id".to_string(),
            }),
        )
            .into_response();
    };

    let job = match sp_db::fetch_report_job(&st.pool, id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "report not found".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            error!(report_id = %id, "report status lookup failed: {e:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "report status lookup failed".to_string(),
                }),
            )
                .into_response();
        }
    };

    match job.status {
        JobStatus::Running => status_json(JobStatus::Running),
        JobStatus::Failed => status_json(JobStatus::Failed),
        JobStatus::Complete => {
            let Some(path) = job.artifact_path else {
                return status_json(JobStatus::Failed);
            };
            match tokio::fs::read(&path).await {
                Ok(bytes) => (
                    StatusCode::OK,
                    [
                        (header::CONTENT_TYPE, "text/csv".to_string()),
                        (
                            header::CONTENT_DISPOSITION,
                            format!("attachment; filename=\"store_report_{id}.csv\""),
                        ),
                    ],
                    bytes,
                )
                    .into_response(),
                Err(e) => {
                    // Job record says Complete but the artifact is gone:
                    // surface a failure indicator, not a 500.
                    error!(report_id = %id, artifact = %path, "report artifact unreadable: {e}");
                    status_json(JobStatus::Failed)
                }
            }
        }
    }
}

fn status_json(status: JobStatus) -> Response {
    (StatusCode::OK, Json(ReportStatusResponse { status })).into_response()
}
