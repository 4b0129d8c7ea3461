//! Expiry inputs and their normalization to absolute timestamps

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::{CacheError, Result};

/// Date/time layouts accepted without an explicit offset, read as local time
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Largest absolute expiry, in Unix seconds, a store accepts
///
/// Redis keeps expiries in milliseconds and refuses anything that overflows.
pub const MAX_TIMESTAMP: i64 = i64::MAX / 1000;

/// When a cache entry should expire
///
/// Every variant resolves to an absolute Unix timestamp, so single and bulk
/// writes both expire entries with the store's absolute-expiry command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Expire after a duration from the moment of the write
    Duration(Duration),
    /// Expire at an absolute Unix timestamp (seconds)
    At(i64),
    /// Expire after a number of seconds from the moment of the write
    SecondsFromNow(i64),
}

impl Expiry {
    /// Expire after `duration`
    pub fn after(duration: Duration) -> Self {
        Expiry::Duration(duration)
    }

    /// Expire at the Unix timestamp `timestamp`
    pub fn at(timestamp: i64) -> Self {
        Expiry::At(timestamp)
    }

    /// Expire at a point in time, truncated to whole seconds
    pub fn at_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        Expiry::At(datetime.timestamp())
    }

    /// Expire `seconds` from now; zero or negative expires at once
    pub fn in_seconds(seconds: i64) -> Self {
        Expiry::SecondsFromNow(seconds)
    }

    /// Parse a date/time string into an absolute expiry
    ///
    /// Accepts RFC 3339 (with offset) and `YYYY-MM-DD[ HH:MM[:SS[.fff]]]`,
    /// the latter interpreted in the local timezone. Fractional seconds are
    /// dropped.
    pub fn parse(input: &str) -> Result<Self> {
        parse_timestamp(input).map(Expiry::At)
    }

    /// Absolute Unix timestamp this expiry denotes, relative to `now`
    ///
    /// A duration with a fractional second rounds up, so a positive TTL
    /// never expires at the moment of the write. Timestamps beyond
    /// [`MAX_TIMESTAMP`] in either direction are rejected.
    pub fn resolve(&self, now: i64) -> Result<i64> {
        let timestamp = match self {
            Expiry::Duration(duration) => {
                let secs = duration
                    .as_secs()
                    .checked_add(u64::from(duration.subsec_nanos() > 0))
                    .and_then(|secs| i64::try_from(secs).ok());
                secs.and_then(|secs| now.checked_add(secs))
            }
            Expiry::At(timestamp) => Some(*timestamp),
            Expiry::SecondsFromNow(seconds) => now.checked_add(*seconds),
        };

        match timestamp {
            Some(ts) if (-MAX_TIMESTAMP..=MAX_TIMESTAMP).contains(&ts) => Ok(ts),
            _ => Err(CacheError::invalid(format!("expiry out of range: {:?}", self))),
        }
    }

    /// Absolute Unix timestamp relative to the current clock
    pub fn resolve_now(&self) -> Result<i64> {
        self.resolve(Utc::now().timestamp())
    }
}

impl FromStr for Expiry {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Expiry::parse(s)
    }
}

impl From<Duration> for Expiry {
    fn from(duration: Duration) -> Self {
        Expiry::Duration(duration)
    }
}

fn parse_timestamp(input: &str) -> Result<i64> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CacheError::invalid("empty expiry date"));
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Ok(datetime.timestamp());
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return local_timestamp(input, naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return local_timestamp(input, midnight);
        }
    }

    Err(CacheError::invalid(format!("unparsable expiry date: {}", input)))
}

fn local_timestamp(input: &str, naive: NaiveDateTime) -> Result<i64> {
    // A wall-clock time skipped by a DST shift has no local instant
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|datetime| datetime.timestamp())
        .ok_or_else(|| CacheError::invalid(format!("nonexistent local time: {}", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_duration_resolves_relative_to_now() {
        let expiry = Expiry::after(Duration::from_secs(90));
        assert_eq!(expiry.resolve(NOW).unwrap(), NOW + 90);
    }

    #[test]
    fn test_fractional_duration_rounds_up() {
        let expiry = Expiry::after(Duration::from_millis(900));
        assert_eq!(expiry.resolve(NOW).unwrap(), NOW + 1);

        let expiry = Expiry::after(Duration::from_millis(1500));
        assert_eq!(expiry.resolve(NOW).unwrap(), NOW + 2);

        assert_eq!(Expiry::after(Duration::ZERO).resolve(NOW).unwrap(), NOW);
    }

    #[test]
    fn test_seconds_from_now() {
        assert_eq!(Expiry::in_seconds(60).resolve(NOW).unwrap(), NOW + 60);
        assert_eq!(Expiry::in_seconds(-5).resolve(NOW).unwrap(), NOW - 5);
    }

    #[test]
    fn test_absolute_is_unchanged() {
        assert_eq!(Expiry::at(42).resolve(NOW).unwrap(), 42);
        assert_eq!(Expiry::at(MAX_TIMESTAMP).resolve(NOW).unwrap(), MAX_TIMESTAMP);
    }

    #[test]
    fn test_parse_rfc3339() {
        let expiry = Expiry::parse("2000-01-01T00:00:00Z").unwrap();
        assert_eq!(expiry, Expiry::At(946_684_800));

        let expiry: Expiry = "2000-01-01T02:00:00+02:00".parse().unwrap();
        assert_eq!(expiry, Expiry::At(946_684_800));
    }

    #[test]
    fn test_parse_local_datetime() {
        let expiry = Expiry::parse("2000-01-01 00:00:00").unwrap();
        let expected = Local
            .with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
            .earliest()
            .unwrap()
            .timestamp();
        assert_eq!(expiry, Expiry::At(expected));
    }

    #[test]
    fn test_parse_truncates_fraction() {
        let whole = Expiry::parse("2030-06-01 12:00:00").unwrap();
        let fraction = Expiry::parse("2030-06-01 12:00:00.987").unwrap();
        assert_eq!(whole, fraction);
    }

    #[test]
    fn test_parse_date_only() {
        let date = Expiry::parse("2030-06-01").unwrap();
        let midnight = Expiry::parse("2030-06-01 00:00:00").unwrap();
        assert_eq!(date, midnight);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "   ", "tomorrow", "2000-13-01", "12:00:00"] {
            let err = Expiry::parse(input).unwrap_err();
            assert!(matches!(err, CacheError::InvalidArgument(_)), "{input}");
        }
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let cases = [
            Expiry::after(Duration::from_secs(u64::MAX)),
            Expiry::after(Duration::from_secs(MAX_TIMESTAMP as u64)),
            Expiry::at(MAX_TIMESTAMP + 1),
            Expiry::at(i64::MIN),
            Expiry::in_seconds(i64::MAX),
        ];
        for expiry in cases {
            let err = expiry.resolve(NOW).unwrap_err();
            assert!(matches!(err, CacheError::InvalidArgument(_)), "{expiry:?}");
        }
    }
}
