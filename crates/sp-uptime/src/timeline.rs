//! Per-store observation timeline and LOCF cursor.

use chrono::{DateTime, Utc};
use sp_schemas::StoreStatus;

/// One status sample on a store's timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub ts_utc: DateTime<Utc>,
    pub status: StoreStatus,
}

/// Ascending-sorted sequence of status samples for one store.
///
/// Duplicate instants are allowed; the stable sort preserves input order, and
/// the LOCF cursor reads through equal-instant samples so the last one in
/// sort order wins.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    samples: Vec<Sample>,
}

impl Timeline {
    /// Build from rows in any order.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, StoreStatus)>,
    {
        let mut samples: Vec<Sample> = rows
            .into_iter()
            .map(|(ts_utc, status)| Sample { ts_utc, status })
            .collect();
        samples.sort_by_key(|s| s.ts_utc);
        Timeline { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Does any sample fall inside `(start, end]`?
    ///
    /// This is the window-membership rule used by the empty-window policy:
    /// right-inclusive, so a sample exactly at the window end counts.
    pub fn has_observation_in(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let after_start = self.samples.partition_point(|s| s.ts_utc <= start);
        let after_end = self.samples.partition_point(|s| s.ts_utc <= end);
        after_end > after_start
    }

    /// A fresh LOCF cursor positioned before the first sample.
    pub fn cursor(&self) -> LocfCursor<'_> {
        LocfCursor {
            samples: &self.samples,
            next: 0,
            last: None,
        }
    }
}

// ---------------------------------------------------------------------------
// LocfCursor
// ---------------------------------------------------------------------------

/// Monotonic last-observation-carried-forward cursor.
///
/// `status_at` must be called with non-decreasing instants; both the tick
/// sequence and the timeline are sorted, so each sample is visited at most
/// once across the whole walk (O(ticks + samples), merge-style).
#[derive(Debug)]
pub struct LocfCursor<'a> {
    samples: &'a [Sample],
    next: usize,
    last: Option<StoreStatus>,
}

impl LocfCursor<'_> {
    /// Status of the latest sample with `ts_utc <= ts`, or `None` when no
    /// sample precedes `ts` (unknown = down, by policy).
    pub fn status_at(&mut self, ts: DateTime<Utc>) -> Option<StoreStatus> {
        while let Some(s) = self.samples.get(self.next) {
            if s.ts_utc > ts {
                break;
            }
            self.last = Some(s.status);
            self.next += 1;
        }
        self.last
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
