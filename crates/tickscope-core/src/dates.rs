//! Lenient date parsing for tracker exports.
//!
//! Source data quality is uneven: the same column may hold tracker-style
//! `01/15/2024 10:30 AM` stamps, ISO 8601 values with or without offsets, or
//! bare dates. Everything is normalized to a timezone-naive
//! [`NaiveDateTime`] holding the wall-clock time as written.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Format the tracker flattening writes `Created Date` / `Changed Date` in.
pub const TRACKER_DATE_FORMAT: &str = "%m/%d/%Y %I:%M %p";

const DATETIME_FORMATS: &[&str] = &[
    TRACKER_DATE_FORMAT,
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a timestamp in any of the accepted layouts.
///
/// Offsets are discarded after parsing; the wall-clock time is kept.
/// Returns `None` for blank or unrecognized input.
#[must_use]
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    // Tracker APIs emit `+0000` offsets without the colon.
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse a calendar date, accepting anything [`parse_datetime`] accepts.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_datetime(raw).map(|dt| dt.date())
}
