//! CSV ingestion for the three StorePulse sources.
//!
//! This is the **read** side of ingestion: it converts CSV text into typed
//! rows plus a deterministic quality report, and hands persistence to
//! `sp_db`. Data-quality faults (malformed timestamps, unknown status
//! strings, out-of-range days, malformed times) REJECT the row — counted in
//! the report and logged as warnings, never fatal. Only structural faults
//! (unreadable file, missing/mismatched header) are returned as `Err`.
//!
//! ## Source files
//!
//! | File                | Columns                                                        |
//! |---------------------|----------------------------------------------------------------|
//! | `store_status.csv`  | `store_id,timestamp_utc,status`                                |
//! | `menu_hours.csv`    | `store_id,dayOfWeek,start_time_local,end_time_local`           |
//! | `timezones.csv`     | `store_id,timezone_str`                                        |
//!
//! `menu_hours.csv` is accepted with either `dayOfWeek` (the upstream
//! export's spelling) or `day_of_week`.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use tracing::{info, warn};

use sp_schemas::{BusinessHoursRow, Observation, StoreStatus, TimezoneRow};

mod timestamp;

pub use timestamp::parse_utc_timestamp;

pub const STATUS_CSV: &str = "store_status.csv";
pub const HOURS_CSV: &str = "menu_hours.csv";
pub const TIMEZONES_CSV: &str = "timezones.csv";

// ---------------------------------------------------------------------------
// Quality report types
// ---------------------------------------------------------------------------

/// Row totals for one source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestCounts {
    pub rows_read: u64,
    pub rows_ok: u64,
    pub rows_rejected: u64,
}

impl IngestCounts {
    fn ok(&mut self) {
        self.rows_read += 1;
        self.rows_ok += 1;
    }

    fn rejected(&mut self) {
        self.rows_read += 1;
        self.rows_rejected += 1;
    }
}

/// Quality report for `store_status.csv`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusIngestReport {
    pub counts: IngestCounts,
    pub malformed_timestamp: u64,
    pub unknown_status: u64,
}

/// Quality report for `menu_hours.csv`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursIngestReport {
    pub counts: IngestCounts,
    pub day_out_of_range: u64,
    pub malformed_time: u64,
}

/// Combined report for one dataset load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetIngestReport {
    pub status: StatusIngestReport,
    pub hours: HoursIngestReport,
    pub timezones: IngestCounts,
}

// ---------------------------------------------------------------------------
// store_status.csv
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StatusRecord {
    store_id: String,
    timestamp_utc: String,
    status: String,
}

/// Parse observation rows from CSV text.
pub fn parse_status_csv(src: &str) -> Result<(Vec<Observation>, StatusIngestReport)> {
    let mut rdr = csv::Reader::from_reader(src.as_bytes());
    let mut out = Vec::new();
    let mut report = StatusIngestReport::default();

    for rec in rdr.deserialize() {
        let rec: StatusRecord = rec.context("deserialize store_status record failed")?;

        let Some(ts_utc) = parse_utc_timestamp(&rec.timestamp_utc) else {
            report.counts.rejected();
            report.malformed_timestamp += 1;
            warn!(
                store_id = %rec.store_id,
                raw = %rec.timestamp_utc,
                "dropping status row: malformed timestamp"
            );
            continue;
        };

        let Some(status) = StoreStatus::parse(&rec.status) else {
            report.counts.rejected();
            report.unknown_status += 1;
            warn!(
                store_id = %rec.store_id,
                raw = %rec.status,
                "dropping status row: unknown status"
            );
            continue;
        };

        report.counts.ok();
        out.push(Observation {
            store_id: rec.store_id,
            ts_utc,
            status,
        });
    }

    Ok((out, report))
}

// ---------------------------------------------------------------------------
// menu_hours.csv
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HoursRecord {
    store_id: String,
    #[serde(alias = "dayOfWeek")]
    day_of_week: String,
    start_time_local: String,
    end_time_local: String,
}

/// Local times are `HH:MM:SS`; a few upstream rows drop the seconds.
fn parse_local_time(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Parse business-hours rows from CSV text, preserving input order.
pub fn parse_hours_csv(src: &str) -> Result<(Vec<BusinessHoursRow>, HoursIngestReport)> {
    let mut rdr = csv::Reader::from_reader(src.as_bytes());
    let mut out = Vec::new();
    let mut report = HoursIngestReport::default();

    for rec in rdr.deserialize() {
        let rec: HoursRecord = rec.context("deserialize menu_hours record failed")?;

        let day_of_week = match rec.day_of_week.trim().parse::<u8>() {
            Ok(d) if d <= 6 => d,
            _ => {
                report.counts.rejected();
                report.day_out_of_range += 1;
                warn!(
                    store_id = %rec.store_id,
                    raw = %rec.day_of_week,
                    "dropping hours row: day_of_week outside 0..=6"
                );
                continue;
            }
        };

        let (Some(start_local), Some(end_local)) = (
            parse_local_time(&rec.start_time_local),
            parse_local_time(&rec.end_time_local),
        ) else {
            report.counts.rejected();
            report.malformed_time += 1;
            warn!(
                store_id = %rec.store_id,
                start = %rec.start_time_local,
                end = %rec.end_time_local,
                "dropping hours row: malformed local time"
            );
            continue;
        };

        report.counts.ok();
        out.push(BusinessHoursRow {
            store_id: rec.store_id,
            day_of_week,
            start_local,
            end_local,
        });
    }

    Ok((out, report))
}

// ---------------------------------------------------------------------------
// timezones.csv
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TimezoneRecord {
    store_id: String,
    timezone_str: String,
}

/// Parse timezone assignments from CSV text.
///
/// Unrecognized identifiers are NOT rejected here: the schedule resolver
/// falls back to the default zone at estimation time, so the row is kept
/// as-is.
pub fn parse_timezones_csv(src: &str) -> Result<(Vec<TimezoneRow>, IngestCounts)> {
    let mut rdr = csv::Reader::from_reader(src.as_bytes());
    let mut out = Vec::new();
    let mut counts = IngestCounts::default();

    for rec in rdr.deserialize() {
        let rec: TimezoneRecord = rec.context("deserialize timezones record failed")?;
        counts.ok();
        out.push(TimezoneRow {
            store_id: rec.store_id,
            timezone_str: rec.timezone_str,
        });
    }

    Ok((out, counts))
}

// ---------------------------------------------------------------------------
// Dataset load
// ---------------------------------------------------------------------------

/// Load the three source CSVs from `dir` into the database, replacing any
/// previously ingested rows (full-reload semantics).
pub async fn load_csv_dir(pool: &SqlitePool, dir: &Path) -> Result<DatasetIngestReport> {
    let read = |name: &str| -> Result<String> {
        let path = dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("read ingest csv failed: {}", path.display()))
    };

    let (observations, status_report) = parse_status_csv(&read(STATUS_CSV)?)?;
    let (hours, hours_report) = parse_hours_csv(&read(HOURS_CSV)?)?;
    let (timezones, tz_counts) = parse_timezones_csv(&read(TIMEZONES_CSV)?)?;

    sp_db::clear_ingest_tables(pool).await?;
    sp_db::insert_observations(pool, &observations).await?;
    sp_db::insert_business_hours(pool, &hours).await?;
    sp_db::upsert_timezones(pool, &timezones).await?;

    let report = DatasetIngestReport {
        status: status_report,
        hours: hours_report,
        timezones: tz_counts,
    };

    info!(
        observations = report.status.counts.rows_ok,
        hours_rows = report.hours.counts.rows_ok,
        timezones = report.timezones.rows_ok,
        rejected = report.status.counts.rows_rejected
            + report.hours.counts.rows_rejected
            + report.timezones.rows_rejected,
        "dataset ingest complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // --- store_status.csv ---

    #[test]
    fn status_rows_parse_across_timestamp_formats() {
        let csv = "store_id,timestamp_utc,status\n\
                   s1,2023-01-25 18:13:22 UTC,active\n\
                   s1,2023-01-25T19:13:22Z,inactive\n\
                   s2,2023-01-25 20:13:22,ACTIVE\n";
        let (rows, report) = parse_status_csv(csv).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(report.counts.rows_ok, 3);
        assert_eq!(report.counts.rows_rejected, 0);
        assert_eq!(
            rows[0].ts_utc,
            chrono::Utc.with_ymd_and_hms(2023, 1, 25, 18, 13, 22).unwrap()
        );
        assert_eq!(rows[2].status, StoreStatus::Active);
    }

    #[test]
    fn malformed_timestamp_rows_are_dropped_and_counted() {
        let csv = "store_id,timestamp_utc,status\n\
                   s1,NOT_A_TIME,active\n\
                   s1,2023-01-25 18:13:22 UTC,active\n";
        let (rows, report) = parse_status_csv(csv).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(report.counts.rows_read, 2);
        assert_eq!(report.counts.rows_rejected, 1);
        assert_eq!(report.malformed_timestamp, 1);
    }

    #[test]
    fn unknown_status_rows_are_dropped_and_counted() {
        let csv = "store_id,timestamp_utc,status\n\
                   s1,2023-01-25 18:13:22 UTC,offline\n";
        let (rows, report) = parse_status_csv(csv).unwrap();

        assert!(rows.is_empty());
        assert_eq!(report.unknown_status, 1);
    }

    #[test]
    fn header_only_status_csv_is_empty_not_an_error() {
        let (rows, report) = parse_status_csv("store_id,timestamp_utc,status\n").unwrap();
        assert!(rows.is_empty());
        assert_eq!(report.counts.rows_read, 0);
    }

    // --- menu_hours.csv ---

    #[test]
    fn hours_accept_the_upstream_day_of_week_spelling() {
        let csv = "store_id,dayOfWeek,start_time_local,end_time_local\n\
                   s1,0,09:00:00,17:00:00\n";
        let (rows, report) = parse_hours_csv(csv).unwrap();

        assert_eq!(report.counts.rows_ok, 1);
        assert_eq!(rows[0].day_of_week, 0);
        assert_eq!(rows[0].start_local, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn hours_accept_snake_case_day_of_week_too() {
        let csv = "store_id,day_of_week,start_time_local,end_time_local\n\
                   s1,6,00:00:00,23:59:59\n";
        let (rows, _) = parse_hours_csv(csv).unwrap();
        assert_eq!(rows[0].day_of_week, 6);
    }

    #[test]
    fn out_of_range_day_rows_are_rejected() {
        let csv = "store_id,dayOfWeek,start_time_local,end_time_local\n\
                   s1,7,09:00:00,17:00:00\n\
                   s1,monday,09:00:00,17:00:00\n\
                   s1,1,09:00:00,17:00:00\n";
        let (rows, report) = parse_hours_csv(csv).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(report.day_out_of_range, 2);
    }

    #[test]
    fn minute_precision_times_get_a_seconds_fallback() {
        let csv = "store_id,dayOfWeek,start_time_local,end_time_local\n\
                   s1,2,09:30,18:00\n";
        let (rows, report) = parse_hours_csv(csv).unwrap();

        assert_eq!(report.counts.rows_ok, 1);
        assert_eq!(rows[0].start_local, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn malformed_time_rows_are_rejected() {
        let csv = "store_id,dayOfWeek,start_time_local,end_time_local\n\
                   s1,2,soon,18:00:00\n";
        let (rows, report) = parse_hours_csv(csv).unwrap();

        assert!(rows.is_empty());
        assert_eq!(report.malformed_time, 1);
    }

    // --- timezones.csv ---

    #[test]
    fn timezone_rows_are_kept_verbatim() {
        let csv = "store_id,timezone_str\n\
                   s1,America/Denver\n\
                   s2,Mars/Olympus_Mons\n";
        let (rows, counts) = parse_timezones_csv(csv).unwrap();

        // The bogus identifier is kept: the resolver falls back at use time.
        assert_eq!(counts.rows_ok, 2);
        assert_eq!(rows[1].timezone_str, "Mars/Olympus_Mons");
    }
}
