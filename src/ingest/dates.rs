//! Date parsing for feed timestamps.
//!
//! RSS 2.0 dates are RFC 822 (`Mon, 01 Jan 2024 00:00:00 GMT`), Atom
//! dates are RFC 3339 (`2024-01-01T00:00:00Z`). Real feeds deviate from
//! both, so each path has a lenient fallback list: missing weekday,
//! missing seconds, missing zone (assumed UTC).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Parses an RFC 822 or RFC 3339 date string into a UTC timestamp.
///
/// Returns `None` when nothing matches; callers fall back to the
/// fetch-time default rather than treating this as an error.
pub fn parse_feed_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    from_rfc822(s).or_else(|| from_rfc3339(s))
}

fn from_rfc822(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // zone-less variants, with and without the leading weekday/comma
    const FORMATS: &[&str] = &[
        "%a, %d %b %Y %H:%M:%S",
        "%a, %d %b %Y %H:%M",
        "%d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M",
    ];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn from_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // zone-less timestamps, assumed UTC
    const FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}
