//! Timezone-correct day bookkeeping.
//!
//! Every "already done today?" decision in the engine goes through
//! [`ZonedCalendar`]. Civil dates are extracted with `chrono-tz`, never by
//! adding a fixed UTC offset, so keys stay correct across DST transitions.

mod day_key;

pub use day_key::{DayKey, DayKeyParseError};

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::ValidationError;

/// Absolute point in time. All stored instants are UTC.
pub type Instant = DateTime<Utc>;

/// Parse an IANA timezone name.
///
/// # Errors
/// Returns [`ValidationError::UnknownTimezone`] for names chrono-tz does not know.
pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::UnknownTimezone(name.to_string()))
}

/// Calendar bound to one IANA timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedCalendar {
    tz: Tz,
}

impl Default for ZonedCalendar {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl ZonedCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Resolve a stored timezone name, falling back to `fallback` (then UTC)
    /// when the name is empty or unknown.
    pub fn from_name_or(name: &str, fallback: &str) -> Self {
        if name.trim().is_empty() {
            return Self::new(parse_timezone(fallback).unwrap_or(Tz::UTC));
        }
        match parse_timezone(name) {
            Ok(tz) => Self::new(tz),
            Err(_) => {
                warn!(timezone = name, fallback, "unknown timezone, using fallback");
                Self::new(parse_timezone(fallback).unwrap_or(Tz::UTC))
            }
        }
    }

    pub fn from_name(name: &str) -> Self {
        Self::from_name_or(name, "UTC")
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Civil date of `instant` in this timezone.
    pub fn day_key(&self, instant: Instant) -> DayKey {
        DayKey::from_date(instant.with_timezone(&self.tz).date_naive())
    }

    /// Civil days between the two instants' calendar dates (may be negative).
    pub fn day_diff(&self, from: Instant, to: Instant) -> i64 {
        self.day_key(from).days_until(self.day_key(to))
    }

    /// `[start, end]` of the civil day containing `now`, as absolute instants.
    ///
    /// `end` is the last millisecond before the next day starts, so short and
    /// long DST days are covered exactly.
    pub fn today_range(&self, now: Instant) -> (Instant, Instant) {
        self.day_range(self.day_key(now))
    }

    pub fn day_range(&self, day: DayKey) -> (Instant, Instant) {
        let start = self.start_of_day(day.date());
        let next_start = self.start_of_day(day.next().date());
        (start, next_start - Duration::milliseconds(1))
    }

    /// True when `instant` falls on the civil day `day`.
    pub fn is_on_day(&self, instant: Instant, day: DayKey) -> bool {
        self.day_key(instant) == day
    }

    /// First instant of the civil date. Zones that skip midnight (a DST gap
    /// at 00:00) start the day at the first local time that exists.
    fn start_of_day(&self, date: NaiveDate) -> Instant {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        if let Some(start) = self.resolve_local(midnight) {
            return start;
        }
        (1..=24 * 60)
            .map(|minutes| midnight + Duration::minutes(minutes))
            .find_map(|local| self.resolve_local(local))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
    }

    fn resolve_local(&self, local: NaiveDateTime) -> Option<Instant> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> Instant {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_day_key_uses_zone_not_utc() {
        let cal = ZonedCalendar::from_name("America/New_York");
        // 02:30 UTC is still the previous evening in New York.
        assert_eq!(cal.day_key(at("2024-06-10T02:30:00Z")).to_string(), "2024-06-09");
        assert_eq!(
            ZonedCalendar::default().day_key(at("2024-06-10T02:30:00Z")).to_string(),
            "2024-06-10"
        );
    }

    #[test]
    fn test_same_civil_date_same_key_near_midnight() {
        let cal = ZonedCalendar::from_name("Asia/Tokyo");
        let just_after = at("2024-01-14T15:00:00Z"); // 00:00 JST on the 15th
        let just_before_next = at("2024-01-15T14:59:59Z"); // 23:59:59 JST
        assert_eq!(cal.day_key(just_after), cal.day_key(just_before_next));
        assert_ne!(cal.day_key(just_after), cal.day_key(at("2024-01-14T14:59:59Z")));
    }

    #[test]
    fn test_day_diff_is_signed() {
        let cal = ZonedCalendar::from_name("Europe/Berlin");
        let a = at("2024-03-01T10:00:00Z");
        let b = at("2024-03-04T10:00:00Z");
        assert_eq!(cal.day_diff(a, b), 3);
        assert_eq!(cal.day_diff(b, a), -3);
        assert_eq!(cal.day_diff(a, a), 0);
    }

    #[test]
    fn test_day_diff_across_spring_forward() {
        let cal = ZonedCalendar::from_name("America/New_York");
        // DST began 2024-03-10 at 02:00 local.
        let before = at("2024-03-10T04:30:00Z"); // 23:30 EST on the 9th
        let after = at("2024-03-10T05:30:00Z"); // 00:30 EST on the 10th
        assert_eq!(cal.day_diff(before, after), 1);
    }

    #[test]
    fn test_today_range_covers_short_dst_day() {
        let cal = ZonedCalendar::from_name("America/New_York");
        let (start, end) = cal.today_range(at("2024-03-10T15:00:00Z"));
        assert_eq!(start, at("2024-03-10T05:00:00Z"));
        assert_eq!(end, at("2024-03-11T03:59:59.999Z"));
        assert_eq!((end - start).num_hours(), 22);
    }

    #[test]
    fn test_today_range_covers_long_dst_day() {
        let cal = ZonedCalendar::from_name("Europe/London");
        let (start, end) = cal.today_range(at("2024-10-27T12:00:00Z"));
        assert_eq!(start, at("2024-10-26T23:00:00Z"));
        assert_eq!(end, at("2024-10-27T23:59:59.999Z"));
    }

    #[test]
    fn test_today_range_when_midnight_is_skipped() {
        // Santiago springs forward at 00:00 -> 01:00 local (2024-09-08).
        let cal = ZonedCalendar::from_name("America/Santiago");
        let (start, _) = cal.day_range(DayKey::from_ymd(2024, 9, 8).unwrap());
        assert_eq!(cal.day_key(start).to_string(), "2024-09-08");
        assert_eq!(cal.day_key(start - Duration::milliseconds(1)).to_string(), "2024-09-07");
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        assert_eq!(ZonedCalendar::from_name("Mars/Olympus").timezone(), Tz::UTC);
        assert_eq!(ZonedCalendar::from_name("").timezone(), Tz::UTC);
        assert_eq!(
            ZonedCalendar::from_name_or("", "Asia/Kolkata").timezone(),
            Tz::Asia__Kolkata
        );
    }

    #[test]
    fn test_parse_timezone_error() {
        assert_eq!(
            parse_timezone("Nowhere/Town"),
            Err(ValidationError::UnknownTimezone("Nowhere/Town".into()))
        );
        assert!(parse_timezone("Australia/Sydney").is_ok());
    }
}
