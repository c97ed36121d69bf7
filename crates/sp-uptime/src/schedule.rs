//! Weekly business-hours schedule and timezone resolution.
//!
//! A store's schedule is a mapping from day-of-week (Monday = 0) to at most
//! one open interval in store-local civil time. Resolution policy:
//!
//! - No rows at all → open every day, 00:00:00–23:59:59.
//! - Some rows but a day missing → that day is **closed** (not defaulted).
//! - Several rows for one day → the last row in input order wins.
//!
//! Timezone resolution never fails outward: absent or unrecognized
//! identifiers fall back to [`DEFAULT_TIMEZONE`].

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;

/// Fallback zone for stores with no (or an unparseable) timezone row.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Chicago;

/// Resolve a raw timezone identifier to a concrete [`Tz`].
pub fn resolve_timezone(raw: Option<&str>) -> Tz {
    match raw {
        Some(s) => s.parse().unwrap_or(DEFAULT_TIMEZONE),
        None => DEFAULT_TIMEZONE,
    }
}

// ---------------------------------------------------------------------------
// DaySpan
// ---------------------------------------------------------------------------

/// One open interval within a single day, inclusive at both ends.
///
/// `start > end` means the interval wraps past midnight (e.g. 22:00–02:00):
/// membership is then `t >= start OR t <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DaySpan {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DaySpan {
    fn full_day() -> Self {
        DaySpan {
            start: NaiveTime::MIN,
            // 23:59:59 — whole-second schedule granularity, see is_open_at.
            end: NaiveTime::MIN + Duration::seconds(86_399),
        }
    }

    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t <= self.end
        } else {
            t >= self.start || t <= self.end
        }
    }
}

// ---------------------------------------------------------------------------
// WeekSchedule
// ---------------------------------------------------------------------------

/// Resolved per-day schedule: an entry for each of the 7 days, `None` = closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekSchedule {
    days: [Option<DaySpan>; 7],
}

impl WeekSchedule {
    /// Open every day, all day. The policy for stores with no hours rows.
    pub fn always_open() -> Self {
        WeekSchedule {
            days: [Some(DaySpan::full_day()); 7],
        }
    }

    /// Build from `(day_of_week, start, end)` rows in input order.
    ///
    /// Empty input means "no hours on file" and resolves to [`always_open`].
    /// Rows with `day_of_week > 6` are ignored (the ingest boundary already
    /// rejects them). Later rows overwrite earlier rows for the same day.
    ///
    /// [`always_open`]: WeekSchedule::always_open
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (u8, NaiveTime, NaiveTime)>,
    {
        let mut days: [Option<DaySpan>; 7] = [None; 7];
        let mut any = false;
        for (day, start, end) in rows {
            if let Some(slot) = days.get_mut(day as usize) {
                *slot = Some(DaySpan { start, end });
                any = true;
            }
        }
        if !any {
            return Self::always_open();
        }
        WeekSchedule { days }
    }

    /// Span for one day-of-week (Monday = 0), `None` when closed.
    pub fn day(&self, day_of_week: u8) -> Option<DaySpan> {
        self.days.get(day_of_week as usize).copied().flatten()
    }

    /// Business-hours predicate: is the local civil instant inside the open
    /// interval of its day-of-week?
    ///
    /// Schedule granularity is whole seconds, so sub-second components of the
    /// query instant do not affect membership.
    pub fn is_open_at(&self, local: NaiveDateTime) -> bool {
        let dow = local.weekday().num_days_from_monday() as usize;
        let t = local
            .time()
            .with_nanosecond(0)
            .unwrap_or_else(|| local.time());
        match self.days[dow] {
            Some(span) => span.contains(t),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
