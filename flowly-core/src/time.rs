//! Time utilities: the caller's "today" and lenient ISO datetime parsing.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Calendar date of `now` in an IANA timezone like "Europe/Kyiv".
///
/// Unknown zones resolve in UTC.
pub fn today_in(timezone: &str, now: DateTime<Utc>) -> NaiveDate {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => {
            warn!(timezone, "unknown timezone; using UTC date");
            now.date_naive()
        }
    }
}

/// Parse an ISO 8601 datetime.
///
/// Accepts RFC 3339 (a trailing `Z` is read as `+00:00`) and naive
/// `YYYY-MM-DDTHH:MM[:SS[.f]]`, which is taken as UTC.
pub fn parse_iso_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    let normalized = match value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        Some(rest) => format!("{rest}+00:00"),
        None => value.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .map(|ndt| ndt.and_utc().fixed_offset())
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
