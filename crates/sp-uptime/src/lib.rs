//! sp-uptime
//!
//! Core uptime/downtime estimation for StorePulse.
//!
//! Architectural decisions:
//! - Pure deterministic logic. No IO, no wall-clock, no randomness.
//! - The "now" anchor is an explicit parameter threaded in by the caller,
//!   derived from the dataset's maximum observed instant.
//! - Minute ticks walk the half-open interval `[window.start, window.end)`.
//! - LOCF lookups advance a monotonic cursor alongside the tick loop;
//!   the timeline is never re-scanned per tick.

mod coverage;
mod metrics;
mod schedule;
mod timeline;

pub use coverage::{estimate_coverage, CoverageCounts, CoverageWindow};
pub use metrics::{compute_report_row, TrailingWindow};
pub use schedule::{resolve_timezone, DaySpan, WeekSchedule, DEFAULT_TIMEZONE};
pub use timeline::{LocfCursor, Sample, Timeline};
