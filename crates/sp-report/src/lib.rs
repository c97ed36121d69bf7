//! Report orchestration for StorePulse.
//!
//! One report job = one pass over every observed store, anchored at the
//! dataset's maximum instant, executed on a bounded worker pool scoped to
//! the job. All-or-nothing: any per-store fault discards the partial report
//! and the job lands Failed; otherwise the CSV artifact is written and the
//! job lands Complete. Either way the terminal status is written exactly
//! once (`sp_db::finish_report_job` enforces the guard).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

use sp_schemas::{JobStatus, ReportRow};
use sp_uptime::{compute_report_row, resolve_timezone, Timeline, WeekSchedule};

mod artifact;

pub use artifact::{report_csv_path, write_report_csv, REPORT_COLUMNS};

pub const ENV_REPORT_WORKERS: &str = "SP_REPORT_WORKERS";
pub const DEFAULT_REPORT_WORKERS: usize = 8;

/// Worker-pool width from SP_REPORT_WORKERS, defaulted and floored at 1.
pub fn report_workers_from_env() -> usize {
    std::env::var(ENV_REPORT_WORKERS)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_REPORT_WORKERS)
        .max(1)
}

// ---------------------------------------------------------------------------
// Per-store computation
// ---------------------------------------------------------------------------

/// Resolve one store's inputs from storage and run the estimator.
async fn compute_store_row(
    pool: &SqlitePool,
    store_id: &str,
    anchor: DateTime<Utc>,
) -> Result<ReportRow> {
    let timeline = Timeline::from_rows(sp_db::fetch_timeline(pool, store_id).await?);
    let schedule = WeekSchedule::from_rows(sp_db::fetch_business_hours(pool, store_id).await?);
    let tz = resolve_timezone(sp_db::fetch_timezone(pool, store_id).await?.as_deref());
    Ok(compute_report_row(store_id, &timeline, &schedule, tz, anchor))
}

// ---------------------------------------------------------------------------
// Report computation
// ---------------------------------------------------------------------------

/// Compute one row per observed store, `workers` stores in flight at a time.
///
/// Per-store computations share no mutable state; the pool here only bounds
/// concurrent storage reads. Output is sorted by store id so the artifact is
/// deterministic for a given dataset.
pub async fn compute_report(
    pool: &SqlitePool,
    anchor: DateTime<Utc>,
    workers: usize,
) -> Result<Vec<ReportRow>> {
    let store_ids = sp_db::list_store_ids(pool).await?;

    let limit = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();
    for store_id in store_ids {
        let pool = pool.clone();
        let limit = Arc::clone(&limit);
        tasks.spawn(async move {
            let _permit = limit
                .acquire_owned()
                .await
                .context("report worker pool closed")?;
            compute_store_row(&pool, &store_id, anchor).await
        });
    }

    let mut rows = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let row = joined.context("report worker panicked")??;
        rows.push(row);
    }
    rows.sort_by(|a, b| a.store_id.cmp(&b.store_id));
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Job runner
// ---------------------------------------------------------------------------

async fn run_report_job_inner(
    pool: &SqlitePool,
    exports_root: &Path,
    report_id: Uuid,
) -> Result<PathBuf> {
    // Anchor once per job: the dataset's maximum instant, not the wall
    // clock. An empty dataset yields an empty (header-only) report.
    let rows = match sp_db::max_observed_instant(pool).await? {
        Some(anchor) => compute_report(pool, anchor, report_workers_from_env()).await?,
        None => Vec::new(),
    };

    write_report_csv(exports_root, report_id, &rows)
}

/// Execute one report job to its terminal state.
///
/// Intended to be `tokio::spawn`ed by the trigger endpoint; it never returns
/// an error to the spawner — every outcome is recorded on the job row.
pub async fn run_report_job(pool: SqlitePool, exports_root: PathBuf, report_id: Uuid) {
    match run_report_job_inner(&pool, &exports_root, report_id).await {
        Ok(path) => {
            let artifact = path.to_string_lossy().into_owned();
            match sp_db::finish_report_job(
                &pool,
                report_id,
                JobStatus::Complete,
                Some(&artifact),
                Utc::now(),
            )
            .await
            {
                Ok(()) => info!(%report_id, artifact = %artifact, "report job complete"),
                Err(e) => error!(%report_id, "report job terminal write failed: {e:#}"),
            }
        }
        Err(e) => {
            error!(%report_id, "report job failed: {e:#}");
            if let Err(e2) =
                sp_db::finish_report_job(&pool, report_id, JobStatus::Failed, None, Utc::now())
                    .await
            {
                error!(%report_id, "report job failure write failed: {e2:#}");
            }
        }
    }
}
