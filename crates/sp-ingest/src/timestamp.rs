//! Timestamp normalization for the observation source.
//!
//! The polling feed is inconsistent about formatting: the same instant can
//! arrive as RFC 3339 with a trailing `Z` (or explicit offset), as a
//! `" UTC"`-suffixed string, or as a bare ISO-8601 local-format string that
//! is UTC by convention. All three must normalize to the identical absolute
//! instant; anything else is malformed and the row is dropped upstream.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse one source timestamp into a UTC instant. `None` = malformed.
pub fn parse_utc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    // RFC 3339: "2023-01-25T18:13:22Z", "2023-01-25T18:13:22.476+00:00", ...
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Suffixed forms: "... UTC" (the bulk of the feed) or a bare "Z" on a
    // space-separated datetime. After stripping, the remainder is naive and
    // assumed UTC.
    let s = s
        .strip_suffix(" UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s);

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
