//! Dual-format date parsing for feed entries.
//!
//! RSS uses RFC 822 (`Mon, 02 Jan 2006 15:04:05 -0700`), Atom uses ISO 8601
//! (`2006-01-02T15:04:05Z`). Both are tried in that order; the first success
//! is reformatted to the canonical `YYYY-MM-DD HH:MM` in the parsed offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::models::{CANONICAL_DATE_FORMAT, ItemDate};

/// ISO 8601 layouts with an explicit offset that RFC 3339 does not cover:
/// basic offsets (`+0800`) and missing seconds.
const OFFSET_ISO_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Zone names seen in feeds that mean UTC; chrono only knows `GMT` and `UT`.
const UTC_ZONE_NAMES: [&str; 4] = ["UTC", "GMT", "UT", "Z"];

/// Offset-less ISO 8601 layouts, tried after the offset-carrying ones.
const NAIVE_ISO_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Normalize a raw date field.
///
/// Unparseable values are returned as [`ItemDate::Raw`] so no information is
/// lost; callers comparing dates must only use [`ItemDate::normalized`].
pub fn normalize_date(raw: &str) -> ItemDate {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ItemDate::Missing;
    }
    match parse_rfc822(trimmed).or_else(|| parse_iso8601(trimmed)) {
        Some(formatted) => ItemDate::Normalized(formatted),
        None => ItemDate::Raw(trimmed.to_string()),
    }
}

/// Mailbox-style RFC 822 parsing.
///
/// The day name is optional and not checked against the date, and UTC may be
/// spelled `UTC`, `GMT`, `UT` or `Z`.
fn parse_rfc822(s: &str) -> Option<String> {
    let without_day = match s.split_once(',') {
        Some((day, rest)) if day.trim().chars().all(|c| c.is_ascii_alphabetic()) => rest.trim(),
        _ => s,
    };

    let mut parts: Vec<&str> = without_day.split_whitespace().collect();
    if let Some(zone) = parts.last_mut() {
        if UTC_ZONE_NAMES.iter().any(|name| zone.eq_ignore_ascii_case(name)) {
            *zone = "+0000";
        }
    }

    DateTime::parse_from_rfc2822(&parts.join(" "))
        .ok()
        .map(|dt| format_canonical(&dt))
}

fn parse_iso8601(s: &str) -> Option<String> {
    let with_offset = match s.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => s.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&with_offset) {
        return Some(format_canonical(&dt));
    }
    for fmt in OFFSET_ISO_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(format_canonical(&dt));
        }
    }
    for fmt in NAIVE_ISO_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.format(CANONICAL_DATE_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.format(CANONICAL_DATE_FORMAT).to_string())
}

fn format_canonical(dt: &DateTime<FixedOffset>) -> String {
    dt.format(CANONICAL_DATE_FORMAT).to_string()
}
