//! Report-job record lifecycle.
//!
//! A job is inserted as Running and transitions to a terminal status
//! (Complete/Failed) exactly once: the terminal UPDATE is guarded on
//! `status = 'Running'` and must change exactly one row. A crash before the
//! terminal write leaves the row Running — never silently missing.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use sp_schemas::{JobStatus, ReportJobRow};
use uuid::Uuid;

/// Insert a fresh Running job row.
pub async fn create_report_job(
    pool: &SqlitePool,
    report_id: Uuid,
    created_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        insert into report_jobs (report_id, status, artifact_path, created_at_micros)
        values (?, 'Running', null, ?)
        "#,
    )
    .bind(report_id.to_string())
    .bind(created_at.timestamp_micros())
    .execute(pool)
    .await
    .context("create_report_job insert failed")?;
    Ok(())
}

/// Write the terminal status for a job. Fails unless the job exists and is
/// still Running, so a terminal state can never be overwritten.
pub async fn finish_report_job(
    pool: &SqlitePool,
    report_id: Uuid,
    status: JobStatus,
    artifact_path: Option<&str>,
    finished_at: DateTime<Utc>,
) -> Result<()> {
    if !status.is_terminal() {
        return Err(anyhow!("finish_report_job requires a terminal status"));
    }

    let res = sqlx::query(
        r#"
        update report_jobs
        set status = ?,
            artifact_path = ?,
            finished_at_micros = ?
        where report_id = ?
          and status = 'Running'
        "#,
    )
    .bind(status.as_str())
    .bind(artifact_path)
    .bind(finished_at.timestamp_micros())
    .bind(report_id.to_string())
    .execute(pool)
    .await
    .context("finish_report_job update failed")?;

    if res.rows_affected() != 1 {
        return Err(anyhow!(
            "report job {report_id} is not Running; terminal status already written or job unknown"
        ));
    }
    Ok(())
}

/// Read back one job record; `None` for unknown ids.
pub async fn fetch_report_job(
    pool: &SqlitePool,
    report_id: Uuid,
) -> Result<Option<ReportJobRow>> {
    let row = sqlx::query(
        r#"
        select report_id, status, artifact_path, created_at_micros, finished_at_micros
        from report_jobs
        where report_id = ?
        "#,
    )
    .bind(report_id.to_string())
    .fetch_optional(pool)
    .await
    .context("fetch_report_job query failed")?;

    let Some(r) = row else {
        return Ok(None);
    };

    let id_raw = r.try_get::<String, _>("report_id")?;
    let status_raw = r.try_get::<String, _>("status")?;
    let created = r.try_get::<i64, _>("created_at_micros")?;
    let finished = r.try_get::<Option<i64>, _>("finished_at_micros")?;

    Ok(Some(ReportJobRow {
        report_id: Uuid::parse_str(&id_raw)
            .with_context(|| format!("invalid report_id in report_jobs: '{id_raw}'"))?,
        status: JobStatus::parse(&status_raw)
            .ok_or_else(|| anyhow!("invalid status in report_jobs: '{status_raw}'"))?,
        artifact_path: r.try_get::<Option<String>, _>("artifact_path")?,
        created_at_utc: DateTime::from_timestamp_micros(created)
            .ok_or_else(|| anyhow!("out-of-range created_at in report_jobs: {created}"))?,
        finished_at_utc: finished
            .map(|m| {
                DateTime::from_timestamp_micros(m)
                    .ok_or_else(|| anyhow!("out-of-range finished_at in report_jobs: {m}"))
            })
            .transpose()?,
    }))
}
