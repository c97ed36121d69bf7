//! Wire types for sp-daemon responses.

use serde::{Deserialize, Serialize};
use sp_schemas::JobStatus;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

/// Returned by POST /v1/report/trigger: the opaque id to poll with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerReportResponse {
    pub report_id: Uuid,
}

/// Returned by GET /v1/report/{id} while the job is pending or failed;
/// a Complete job streams the CSV artifact instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportStatusResponse {
    pub status: JobStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
