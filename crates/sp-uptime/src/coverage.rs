//! Minute-tick coverage estimation over one trailing window.
//!
//! Walks every minute-aligned tick in `[window.start, window.end)`, converts
//! it to store-local civil time (per-instant UTC offset, DST correct),
//! applies the business-hours predicate, and resolves the LOCF status through
//! a monotonic cursor. A window with no observation inside `(start, end]`
//! reports zero counts regardless of business hours.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sp_schemas::StoreStatus;

use crate::schedule::WeekSchedule;
use crate::timeline::Timeline;

// ---------------------------------------------------------------------------
// CoverageWindow
// ---------------------------------------------------------------------------

/// One trailing window `(start, end]` anchored at `end`.
///
/// Observation membership is right-inclusive; tick sampling walks
/// `[start, end)` in one-minute steps. Both rules are load-bearing: an
/// observation exactly at the anchor keeps the window non-empty but precedes
/// no tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CoverageWindow {
    /// The window of `duration` ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, duration: Duration) -> Self {
        CoverageWindow {
            start: end - duration,
            end,
        }
    }
}

// ---------------------------------------------------------------------------
// CoverageCounts
// ---------------------------------------------------------------------------

/// Minute counts for one window: minutes inside business hours, and the
/// subset of those whose LOCF status was active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCounts {
    pub open_minutes: u64,
    pub active_minutes: u64,
}

impl CoverageCounts {
    /// `open - active`, saturating at zero so data anomalies can never
    /// surface as a negative downtime figure.
    pub fn downtime_minutes(&self) -> u64 {
        self.open_minutes.saturating_sub(self.active_minutes)
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Estimate coverage for one store over one window.
pub fn estimate_coverage(
    timeline: &Timeline,
    schedule: &WeekSchedule,
    tz: Tz,
    window: &CoverageWindow,
) -> CoverageCounts {
    // A completely unobserved window reports no data rather than
    // extrapolating from outside it.
    if !timeline.has_observation_in(window.start, window.end) {
        return CoverageCounts::default();
    }

    let mut counts = CoverageCounts::default();
    let mut cursor = timeline.cursor();

    let mut tick = window.start;
    while tick < window.end {
        let local = tick.with_timezone(&tz).naive_local();
        if schedule.is_open_at(local) {
            counts.open_minutes += 1;
            if cursor.status_at(tick) == Some(StoreStatus::Active) {
                counts.active_minutes += 1;
            }
        }
        tick += Duration::minutes(1);
    }

    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use sp_schemas::StoreStatus::{Active, Inactive};

    const CHICAGO: Tz = chrono_tz::America::Chicago;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, 18, 0, 0).unwrap()
    }

    fn hour_window() -> CoverageWindow {
        CoverageWindow::ending_at(anchor(), Duration::hours(1))
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // --- empty-window policy ---

    #[test]
    fn window_with_no_observation_reports_zero_counts() {
        // Sample exists, but a week before the window.
        let tl = Timeline::from_rows([(anchor() - Duration::weeks(1), Active)]);
        let counts = estimate_coverage(&tl, &WeekSchedule::always_open(), CHICAGO, &hour_window());
        assert_eq!(counts, CoverageCounts::default());
    }

    #[test]
    fn empty_timeline_reports_zero_counts() {
        let tl = Timeline::from_rows(std::iter::empty());
        let counts = estimate_coverage(&tl, &WeekSchedule::always_open(), CHICAGO, &hour_window());
        assert_eq!(counts, CoverageCounts::default());
    }

    // --- anchor-edge LOCF semantics (exact by contract) ---

    #[test]
    fn single_observation_at_anchor_opens_window_but_carries_nothing() {
        // The sample sits on the window's right edge: it is a window member
        // (so the window is not empty) yet `ts <= tick` holds for no tick.
        let tl = Timeline::from_rows([(anchor(), Active)]);
        let counts = estimate_coverage(&tl, &WeekSchedule::always_open(), CHICAGO, &hour_window());
        assert_eq!(counts.open_minutes, 60);
        assert_eq!(counts.active_minutes, 0);
    }

    #[test]
    fn single_observation_at_window_start_carries_across_all_ticks() {
        let w = hour_window();
        let tl = Timeline::from_rows([(w.start, Active)]);
        let counts = estimate_coverage(&tl, &WeekSchedule::always_open(), CHICAGO, &w);
        assert_eq!(counts.open_minutes, 60);
        assert_eq!(counts.active_minutes, 60);
    }

    // --- LOCF over a mid-window flip ---

    #[test]
    fn status_flip_mid_window_splits_active_minutes() {
        let w = hour_window();
        // Active from the start, flips inactive 20 minutes before the anchor.
        let tl = Timeline::from_rows([
            (w.start, Active),
            (w.end - Duration::minutes(20), Inactive),
        ]);
        let counts = estimate_coverage(&tl, &WeekSchedule::always_open(), CHICAGO, &w);
        assert_eq!(counts.open_minutes, 60);
        // Ticks 0..=39 are active; the flip lands exactly on tick 40.
        assert_eq!(counts.active_minutes, 40);
    }

    #[test]
    fn observation_before_window_is_a_valid_carry_forward() {
        let w = hour_window();
        let tl = Timeline::from_rows([
            (w.start - Duration::hours(5), Active),
            (w.end - Duration::minutes(10), Inactive),
        ]);
        let counts = estimate_coverage(&tl, &WeekSchedule::always_open(), CHICAGO, &w);
        // The pre-window sample carries across the first 50 ticks.
        assert_eq!(counts.active_minutes, 50);
    }

    // --- business-hours restriction ---

    #[test]
    fn closed_hours_count_neither_open_nor_active() {
        // 2024-01-08 18:00 UTC = Monday 12:00 in Chicago (CST). Open only
        // 11:30–11:44 local → 15 of the window's 60 ticks are open.
        let sched = WeekSchedule::from_rows([(0, t(11, 30), t(11, 44))]);
        let w = hour_window();
        let tl = Timeline::from_rows([(w.start, Active)]);
        let counts = estimate_coverage(&tl, &sched, CHICAGO, &w);
        assert_eq!(counts.open_minutes, 15);
        assert_eq!(counts.active_minutes, 15);
    }

    #[test]
    fn tick_conversion_tracks_seasonal_utc_offset() {
        // Same 18:00 UTC anchor, same local-noon schedule slice. In January
        // Chicago is UTC-6 (17:00–18:00 UTC = 11:00–12:00 local) so the
        // 11:30–11:44 slice is inside the window; in July Chicago is UTC-5
        // (= 12:00–13:00 local) and the slice falls entirely outside it.
        let sched = WeekSchedule::from_rows([(0, t(11, 30), t(11, 44))]);

        let summer_anchor = Utc.with_ymd_and_hms(2024, 7, 8, 18, 0, 0).unwrap();
        let w = CoverageWindow::ending_at(summer_anchor, Duration::hours(1));
        let tl = Timeline::from_rows([(w.start, Active)]);
        let counts = estimate_coverage(&tl, &sched, CHICAGO, &w);
        assert_eq!(counts.open_minutes, 0);
    }

    // --- downtime clamp ---

    #[test]
    fn downtime_saturates_at_zero() {
        let anomalous = CoverageCounts {
            open_minutes: 10,
            active_minutes: 25,
        };
        assert_eq!(anomalous.downtime_minutes(), 0);

        let normal = CoverageCounts {
            open_minutes: 60,
            active_minutes: 40,
        };
        assert_eq!(normal.downtime_minutes(), 20);
    }
}
