//! Launch date normalization.
//!
//! Upstream `date_launched` values come in a handful of shapes depending on
//! which platform the program was scraped from. [`parse_date`] turns any of
//! them into a UTC timestamp and never fails: an empty or unrecognized value
//! falls back to the current time. The returned [`LaunchDate`] records which
//! of those paths was taken.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// ISO timestamp with a fraction of 1 to 6 digits and a literal `Z`.
/// chrono's `%.f` also accepts no fraction, so [`has_iso_fraction`] gates it.
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Space separated date and time, no zone.
const SPACE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Bare calendar date, read as midnight UTC.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Outcome of normalizing one raw launch date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchDate {
    /// The value matched one of the known formats.
    Parsed(DateTime<Utc>),
    /// No value was supplied; holds the time of the call.
    Missing(DateTime<Utc>),
    /// A value was supplied but matched nothing; holds the time of the call.
    Unparseable(DateTime<Utc>),
}

impl LaunchDate {
    /// The instant used for filtering and sorting.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match *self {
            LaunchDate::Parsed(ts) | LaunchDate::Missing(ts) | LaunchDate::Unparseable(ts) => ts,
        }
    }

    /// `true` when the timestamp is the "now" substitute rather than upstream data.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, LaunchDate::Parsed(_))
    }
}

/// Normalize a raw launch date, falling back to the current UTC time.
pub fn parse_date(raw: Option<&str>) -> LaunchDate {
    parse_date_at(raw, Utc::now())
}

/// Same as [`parse_date`] with an explicit fallback instant.
pub fn parse_date_at(raw: Option<&str>, now: DateTime<Utc>) -> LaunchDate {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return LaunchDate::Missing(now);
    };

    if has_iso_fraction(raw) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, ISO_FORMAT) {
            return LaunchDate::Parsed(naive.and_utc());
        }
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, SPACE_FORMAT) {
        return LaunchDate::Parsed(naive.and_utc());
    }

    if let Some(midnight) = NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return LaunchDate::Parsed(midnight.and_utc());
    }

    tracing::debug!(%raw, "Unrecognized launch date; using current time");
    LaunchDate::Unparseable(now)
}

/// `true` when `raw` ends in `.` + 1 to 6 digits + `Z`.
fn has_iso_fraction(raw: &str) -> bool {
    raw.strip_suffix('Z')
        .and_then(|rest| rest.rsplit_once('.'))
        .is_some_and(|(_, digits)| {
            (1..=6).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
        })
}
