//! Shared data types for the StorePulse workspace.
//!
//! Leaf crate: serde-derived rows and enums only, no IO and no logic beyond
//! string round-trips. Every other crate depends on this one.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// StoreStatus
// ---------------------------------------------------------------------------

/// Observed operational status of a store at one polling instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Active => "active",
            StoreStatus::Inactive => "inactive",
        }
    }

    /// Case-insensitive parse; `None` for anything but active/inactive.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("active") {
            Some(StoreStatus::Active)
        } else if s.eq_ignore_ascii_case("inactive") {
            Some(StoreStatus::Inactive)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Ingest rows
// ---------------------------------------------------------------------------

/// One polling observation: the store was seen `status` at `ts_utc`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub store_id: String,
    pub ts_utc: DateTime<Utc>,
    pub status: StoreStatus,
}

/// One weekly business-hours row, local civil times. `day_of_week` uses the
/// Monday=0 convention. A store may carry zero, one, or several rows per day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursRow {
    pub store_id: String,
    pub day_of_week: u8,
    pub start_local: NaiveTime,
    pub end_local: NaiveTime,
}

/// IANA timezone assignment. At most one per store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneRow {
    pub store_id: String,
    pub timezone_str: String,
}

// ---------------------------------------------------------------------------
// ReportRow
// ---------------------------------------------------------------------------

/// One output row per store. Hour-window figures are integer minutes; day and
/// week figures are fractional hours (minutes / 60, unrounded).
///
/// Field order matches the report CSV column order exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub store_id: String,
    pub uptime_last_hour: u64,
    pub uptime_last_day: f64,
    pub uptime_last_week: f64,
    pub downtime_last_hour: u64,
    pub downtime_last_day: f64,
    pub downtime_last_week: f64,
}

// ---------------------------------------------------------------------------
// Report jobs
// ---------------------------------------------------------------------------

/// Lifecycle state of one report job. Running is the only non-terminal state;
/// a job transitions to Complete or Failed exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "Running",
            JobStatus::Complete => "Complete",
            JobStatus::Failed => "Failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Running" => Some(JobStatus::Running),
            "Complete" => Some(JobStatus::Complete),
            "Failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Persisted job record as read back from storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportJobRow {
    pub report_id: Uuid,
    pub status: JobStatus,
    /// Set when status is Complete.
    pub artifact_path: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub finished_at_utc: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_status_parse_is_case_insensitive() {
        assert_eq!(StoreStatus::parse("active"), Some(StoreStatus::Active));
        assert_eq!(StoreStatus::parse("ACTIVE"), Some(StoreStatus::Active));
        assert_eq!(StoreStatus::parse("Inactive"), Some(StoreStatus::Inactive));
        assert_eq!(StoreStatus::parse("offline"), None);
        assert_eq!(StoreStatus::parse(""), None);
    }

    #[test]
    fn store_status_round_trips_through_as_str() {
        for s in [StoreStatus::Active, StoreStatus::Inactive] {
            assert_eq!(StoreStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn job_status_round_trips_through_as_str() {
        for s in [JobStatus::Running, JobStatus::Complete, JobStatus::Failed] {
            assert_eq!(JobStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(JobStatus::parse("running"), None, "parse is exact-case");
    }

    #[test]
    fn only_running_is_non_terminal() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
