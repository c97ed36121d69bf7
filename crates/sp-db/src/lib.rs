//! SQLite storage collaborator for StorePulse.
//!
//! Write side: transactional batch inserts for the three ingest row kinds.
//! Read side: the query surface the report orchestrator consumes — distinct
//! store ids, the dataset's maximum observed instant, per-store ordered
//! timelines, business-hours rows, and timezone assignments.
//!
//! Report-job lifecycle lives in [`jobs`].

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use sp_schemas::{BusinessHoursRow, Observation, StoreStatus, TimezoneRow};

mod jobs;

pub use jobs::{create_report_job, fetch_report_job, finish_report_job};

pub const ENV_DB_URL: &str = "SP_DATABASE_URL";
pub const DEFAULT_DB_URL: &str = "sqlite://storepulse.db?mode=rwc";

// ---------------------------------------------------------------------------
// Connection & migration
// ---------------------------------------------------------------------------

/// Connect using SP_DATABASE_URL, falling back to the default on-disk file.
pub async fn connect_from_env() -> Result<SqlitePool> {
    let url = std::env::var(ENV_DB_URL).unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
    connect(&url).await
}

pub async fn connect(url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .with_context(|| format!("failed to open SQLite database at {url}"))?;
    Ok(pool)
}

/// In-memory database for tests: a single connection that is never reaped,
/// so the database outlives idle periods. Migrations are applied.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("failed to open in-memory SQLite database")?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Instant encoding
// ---------------------------------------------------------------------------

fn instant_to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn micros_to_instant(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| anyhow!("out-of-range instant: {micros} micros"))
}

fn parse_local_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .with_context(|| format!("malformed local time in business_hours: '{raw}'"))
}

// ---------------------------------------------------------------------------
// Write side
// ---------------------------------------------------------------------------

/// Delete all rows from the three ingest tables (full reload semantics).
pub async fn clear_ingest_tables(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await.context("clear_ingest_tables begin failed")?;
    for table in ["store_status", "business_hours", "store_timezone"] {
        sqlx::query(&format!("delete from {table}"))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("clear {table} failed"))?;
    }
    tx.commit().await.context("clear_ingest_tables commit failed")?;
    Ok(())
}

/// Append observations in one transaction. Returns the inserted row count.
pub async fn insert_observations(pool: &SqlitePool, rows: &[Observation]) -> Result<u64> {
    let mut tx = pool.begin().await.context("insert_observations begin failed")?;
    for o in rows {
        sqlx::query(
            r#"
            insert into store_status (store_id, ts_utc_micros, status)
            values (?, ?, ?)
            "#,
        )
        .bind(&o.store_id)
        .bind(instant_to_micros(o.ts_utc))
        .bind(o.status.as_str())
        .execute(&mut *tx)
        .await
        .context("insert store_status row failed")?;
    }
    tx.commit().await.context("insert_observations commit failed")?;
    Ok(rows.len() as u64)
}

/// Append business-hours rows in one transaction, preserving input order
/// (rowid order is the tie-break the schedule resolver relies on).
pub async fn insert_business_hours(pool: &SqlitePool, rows: &[BusinessHoursRow]) -> Result<u64> {
    let mut tx = pool.begin().await.context("insert_business_hours begin failed")?;
    for r in rows {
        sqlx::query(
            r#"
            insert into business_hours (store_id, day_of_week, start_local, end_local)
            values (?, ?, ?, ?)
            "#,
        )
        .bind(&r.store_id)
        .bind(r.day_of_week as i64)
        .bind(r.start_local.format("%H:%M:%S").to_string())
        .bind(r.end_local.format("%H:%M:%S").to_string())
        .execute(&mut *tx)
        .await
        .context("insert business_hours row failed")?;
    }
    tx.commit().await.context("insert_business_hours commit failed")?;
    Ok(rows.len() as u64)
}

/// Upsert timezone assignments (at most one per store).
pub async fn upsert_timezones(pool: &SqlitePool, rows: &[TimezoneRow]) -> Result<u64> {
    let mut tx = pool.begin().await.context("upsert_timezones begin failed")?;
    for r in rows {
        sqlx::query(
            r#"
            insert into store_timezone (store_id, timezone_str)
            values (?, ?)
            on conflict (store_id) do update set timezone_str = excluded.timezone_str
            "#,
        )
        .bind(&r.store_id)
        .bind(&r.timezone_str)
        .execute(&mut *tx)
        .await
        .context("upsert store_timezone row failed")?;
    }
    tx.commit().await.context("upsert_timezones commit failed")?;
    Ok(rows.len() as u64)
}

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

/// Distinct store ids with at least one observation, ascending. Stores that
/// appear only in the hours or timezone tables are deliberately absent: the
/// report contract excludes unmonitored stores.
pub async fn list_store_ids(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        select distinct store_id
        from store_status
        order by store_id asc
        "#,
    )
    .fetch_all(pool)
    .await
    .context("list_store_ids query failed")?;

    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        out.push(r.try_get::<String, _>("store_id")?);
    }
    Ok(out)
}

/// Maximum observed instant across the whole dataset; `None` when the
/// observation table is empty. This is the report anchor.
pub async fn max_observed_instant(pool: &SqlitePool) -> Result<Option<DateTime<Utc>>> {
    let (max,): (Option<i64>,) =
        sqlx::query_as("select max(ts_utc_micros) from store_status")
            .fetch_one(pool)
            .await
            .context("max_observed_instant query failed")?;

    max.map(micros_to_instant).transpose()
}

/// All observations for one store, ascending by instant.
pub async fn fetch_timeline(
    pool: &SqlitePool,
    store_id: &str,
) -> Result<Vec<(DateTime<Utc>, StoreStatus)>> {
    let rows = sqlx::query(
        r#"
        select ts_utc_micros, status
        from store_status
        where store_id = ?
        order by ts_utc_micros asc, rowid asc
        "#,
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
    .context("fetch_timeline query failed")?;

    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        let micros = r.try_get::<i64, _>("ts_utc_micros")?;
        let status_raw = r.try_get::<String, _>("status")?;
        let status = StoreStatus::parse(&status_raw)
            .ok_or_else(|| anyhow!("invalid status in store_status: '{status_raw}'"))?;
        out.push((micros_to_instant(micros)?, status));
    }
    Ok(out)
}

/// Business-hours rows for one store in insertion order (possibly empty,
/// possibly several rows per day — resolution policy is the caller's).
pub async fn fetch_business_hours(
    pool: &SqlitePool,
    store_id: &str,
) -> Result<Vec<(u8, NaiveTime, NaiveTime)>> {
    let rows = sqlx::query(
        r#"
        select day_of_week, start_local, end_local
        from business_hours
        where store_id = ?
        order by rowid asc
        "#,
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
    .context("fetch_business_hours query failed")?;

    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        let day = r.try_get::<i64, _>("day_of_week")? as u8;
        let start = parse_local_time(&r.try_get::<String, _>("start_local")?)?;
        let end = parse_local_time(&r.try_get::<String, _>("end_local")?)?;
        out.push((day, start, end));
    }
    Ok(out)
}

/// Timezone identifier for one store, if assigned.
pub async fn fetch_timezone(pool: &SqlitePool, store_id: &str) -> Result<Option<String>> {
    let row = sqlx::query(
        r#"
        select timezone_str
        from store_timezone
        where store_id = ?
        "#,
    )
    .bind(store_id)
    .fetch_optional(pool)
    .await
    .context("fetch_timezone query failed")?;

    row.map(|r| r.try_get::<String, _>("timezone_str").map_err(Into::into))
        .transpose()
}
