//! Civil-date keys ("YYYY-MM-DD").

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// A calendar date in some user's timezone, used as the unit of
/// "has the user acted today".
///
/// Serialized as `"YYYY-MM-DD"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Strict parse of a stored key. Anything other than a real
    /// `YYYY-MM-DD` date yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() != 10 {
            return None;
        }
        NaiveDate::parse_from_str(raw, DAY_KEY_FORMAT).ok().map(Self)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The key `days` civil days earlier (negative moves forward).
    pub fn days_before(self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    pub fn next(self) -> Self {
        self.days_before(-1)
    }

    /// Signed number of civil days from `self` to `other`.
    pub fn days_until(self, other: DayKey) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Days since 1970-01-01 for this civil date.
    pub fn epoch_day(self) -> i64 {
        i64::from(self.0.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

/// Error returned when a string is not a valid day key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid day key '{0}': expected YYYY-MM-DD")]
pub struct DayKeyParseError(pub String);

impl FromStr for DayKey {
    type Err = DayKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DayKeyParseError(s.to_string()))
    }
}

impl TryFrom<String> for DayKey {
    type Error = DayKeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_zero_padded() {
        let key = DayKey::from_ymd(2024, 3, 9).unwrap();
        assert_eq!(key.to_string(), "2024-03-09");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DayKey::parse("2024-02-30").is_none());
        assert!(DayKey::parse("yesterday").is_none());
        assert!(DayKey::parse("2024-1-5").is_none());
        assert!(DayKey::parse("").is_none());
        assert_eq!(
            DayKey::parse(" 2024-01-05 "),
            DayKey::from_ymd(2024, 1, 5)
        );
    }

    #[test]
    fn test_days_before_crosses_month_and_year() {
        let key = DayKey::from_ymd(2024, 1, 1).unwrap();
        assert_eq!(key.days_before(1).to_string(), "2023-12-31");
        assert_eq!(key.days_before(2).to_string(), "2023-12-30");
        assert_eq!(key.next().to_string(), "2024-01-02");
    }

    #[test]
    fn test_leap_day_arithmetic() {
        let march_first = DayKey::from_ymd(2024, 3, 1).unwrap();
        assert_eq!(march_first.days_before(1).to_string(), "2024-02-29");
    }

    #[test]
    fn test_epoch_day() {
        assert_eq!(DayKey::from_ymd(1970, 1, 1).unwrap().epoch_day(), 0);
        assert_eq!(DayKey::from_ymd(1970, 1, 21).unwrap().epoch_day(), 20);
        assert_eq!(DayKey::from_ymd(1969, 12, 31).unwrap().epoch_day(), -1);
    }

    #[test]
    fn test_serde_as_string() {
        let key = DayKey::from_ymd(2025, 7, 4).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2025-07-04\"");
        let back: DayKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<DayKey>("\"not-a-day\"").is_err());
    }
}
