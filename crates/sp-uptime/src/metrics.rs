//! Trailing-window metrics aggregation: three windows per store, anchored at
//! the dataset's maximum observed instant, converted to report units.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use sp_schemas::ReportRow;

use crate::coverage::{estimate_coverage, CoverageWindow};
use crate::schedule::WeekSchedule;
use crate::timeline::Timeline;

// ---------------------------------------------------------------------------
// TrailingWindow
// ---------------------------------------------------------------------------

/// The three report windows, each ending at the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrailingWindow {
    LastHour,
    LastDay,
    LastWeek,
}

impl TrailingWindow {
    pub fn duration(&self) -> Duration {
        match self {
            TrailingWindow::LastHour => Duration::hours(1),
            TrailingWindow::LastDay => Duration::days(1),
            TrailingWindow::LastWeek => Duration::weeks(1),
        }
    }

    pub fn ending_at(&self, anchor: DateTime<Utc>) -> CoverageWindow {
        CoverageWindow::ending_at(anchor, self.duration())
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Minute count → fractional hours, unrounded.
fn minutes_to_hours(minutes: u64) -> f64 {
    minutes as f64 / 60.0
}

/// Run the coverage estimator over all three windows and assemble the report
/// row for one store. Hour figures stay in minutes; day and week figures are
/// converted to hours.
pub fn compute_report_row(
    store_id: &str,
    timeline: &Timeline,
    schedule: &WeekSchedule,
    tz: Tz,
    anchor: DateTime<Utc>,
) -> ReportRow {
    let hour = estimate_coverage(
        timeline,
        schedule,
        tz,
        &TrailingWindow::LastHour.ending_at(anchor),
    );
    let day = estimate_coverage(
        timeline,
        schedule,
        tz,
        &TrailingWindow::LastDay.ending_at(anchor),
    );
    let week = estimate_coverage(
        timeline,
        schedule,
        tz,
        &TrailingWindow::LastWeek.ending_at(anchor),
    );

    ReportRow {
        store_id: store_id.to_string(),
        uptime_last_hour: hour.active_minutes,
        uptime_last_day: minutes_to_hours(day.active_minutes),
        uptime_last_week: minutes_to_hours(week.active_minutes),
        downtime_last_hour: hour.downtime_minutes(),
        downtime_last_day: minutes_to_hours(day.downtime_minutes()),
        downtime_last_week: minutes_to_hours(week.downtime_minutes()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
