//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an RFC 3339 string such as `2024-01-01T00:00:00Z`.
    pub fn parse_rfc3339(value: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc)))
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Same calendar day (UTC) at the given wall-clock time.
    pub fn at_time_of_day(&self, time: NaiveTime) -> Self {
        Self(self.0.date_naive().and_time(time).and_utc())
    }

    /// RFC 3339 rendering with a `Z` suffix, as the gateway expects.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse_rfc3339(s).unwrap()
    }

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn timestamp_ordering_helpers() {
        let earlier = ts("2024-01-01T00:00:00Z");
        let later = ts("2024-01-02T00:00:00Z");

        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(earlier < later);
    }

    #[test]
    fn add_and_minus_days() {
        let start = ts("2024-01-01T00:00:00Z");
        assert_eq!(start.add_days(30), ts("2024-01-31T00:00:00Z"));
        assert_eq!(start.minus_days(1), ts("2023-12-31T00:00:00Z"));
    }

    #[test]
    fn at_time_of_day_keeps_calendar_date() {
        let base = ts("2024-02-01T23:59:59Z");
        let shifted = base.at_time_of_day(NaiveTime::from_hms_opt(10, 7, 0).unwrap());

        assert_eq!(shifted.as_datetime().day(), 1);
        assert_eq!(shifted.as_datetime().hour(), 10);
        assert_eq!(shifted.as_datetime().minute(), 7);
        assert_eq!(shifted.as_datetime().second(), 0);
    }

    #[test]
    fn renders_rfc3339_with_z_suffix() {
        assert_eq!(ts("2024-02-01T10:15:00+00:00").to_rfc3339(), "2024-02-01T10:15:00Z");
    }

    #[test]
    fn timestamp_serializes_to_json() {
        let json = serde_json::to_string(&ts("2024-01-15T10:30:00Z")).unwrap();
        assert!(json.contains("2024-01-15"));
    }

    #[test]
    fn timestamp_deserializes_from_json() {
        let parsed: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();
        assert_eq!(parsed.as_datetime().year(), 2024);
    }
}
