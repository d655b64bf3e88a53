//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, NaiveDate, Utc};
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

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Shifted by `secs` seconds (negative moves back).
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// First instant of the given UTC day.
    pub fn start_of_day(day: NaiveDate) -> Self {
        Self(day.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Last representable instant of the given UTC day.
    pub fn end_of_day(day: NaiveDate) -> Self {
        Self(Self::start_of_day(day).0 + Duration::days(1) - Duration::nanoseconds(1))
    }

    /// The UTC calendar day this timestamp falls on.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// RFC 3339 rendering used on the wire.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn jan_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn plus_secs_moves_both_ways() {
        let base = Timestamp::start_of_day(jan_15());
        let later = base.plus_secs(90);
        let earlier = base.plus_secs(-1);

        assert!(base.is_before(&later));
        assert!(base.is_after(&earlier));
        assert_eq!(earlier.date(), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
    }

    #[test]
    fn start_of_day_is_midnight() {
        let ts = Timestamp::start_of_day(jan_15());
        assert_eq!(ts.as_datetime().day(), 15);
        assert_eq!(ts.as_datetime().hour(), 0);
        assert_eq!(ts.as_datetime().minute(), 0);
    }

    #[test]
    fn end_of_day_stays_on_same_date() {
        let ts = Timestamp::end_of_day(jan_15());
        assert_eq!(ts.date(), jan_15());
        assert_eq!(ts.as_datetime().hour(), 23);
        assert!(ts.plus_secs(1).date() > jan_15());
    }

    #[test]
    fn timestamp_deserializes_from_json() {
        let json = "\"2024-01-15T10:30:00Z\"";
        let ts: Timestamp = serde_json::from_str(json).unwrap();

        assert_eq!(ts.as_datetime().year(), 2024);
        assert_eq!(ts.date(), jan_15());
    }

    #[test]
    fn rfc3339_rendering_contains_date() {
        let ts = Timestamp::start_of_day(jan_15());
        assert!(ts.to_rfc3339().starts_with("2024-01-15T00:00:00"));
    }
}
