//! Calendar-day keys, weekday indices and the clock seam.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format of a day key.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// A local calendar day, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// The underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day.
    pub fn pred(&self) -> Self {
        self.offset(-1)
    }

    /// The next calendar day.
    pub fn succ(&self) -> Self {
        self.offset(1)
    }

    /// Shift by a number of days, saturating at the calendar bounds.
    pub fn offset(&self, days: i64) -> Self {
        self.0
            .checked_add_signed(Duration::days(days))
            .map(Self)
            .unwrap_or(*self)
    }

    /// Weekday index, Sunday=0 through Saturday=6.
    pub fn weekday(&self) -> u8 {
        weekday_of(*self)
    }

    /// The `n` days ending at `today`, oldest first.
    pub fn last_n_days(today: DayKey, n: usize) -> Vec<DayKey> {
        (0..n as i64).rev().map(|back| today.offset(-back)).collect()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DAY_KEY_FORMAT).map(Self)
    }
}

/// Calendar day of an instant, in the instant's own time zone.
///
/// Callers pass `DateTime<Local>` to get the device's local day.
pub fn day_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> DayKey {
    DayKey(instant.date_naive())
}

/// Weekday index of a day key, Sunday=0 through Saturday=6.
pub fn weekday_of(day: DayKey) -> u8 {
    day.0.weekday().num_days_from_sunday() as u8
}

/// Short label for a weekday index.
pub fn weekday_label(index: u8) -> &'static str {
    match index {
        0 => "Sun",
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        _ => "?",
    }
}

/// Source of the current instant.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Today's local calendar day.
    fn today(&self) -> DayKey {
        day_key(&self.now().with_timezone(&Local))
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant and one local day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    today: DayKey,
}

impl FixedClock {
    /// Pin the clock to noon UTC of `today`.
    pub fn on(today: DayKey) -> Self {
        let now = today
            .date()
            .and_hms_opt(12, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .unwrap_or_else(Utc::now);
        Self { now, today }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> DayKey {
        self.today
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_same_day_same_key() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let morning = tz.with_ymd_and_hms(2024, 3, 10, 0, 5, 0).unwrap();
        let night = tz.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        assert_eq!(day_key(&morning), day_key(&night));
        assert_eq!(day_key(&morning).to_string(), "2024-03-10");
    }

    #[test]
    fn test_key_uses_instant_zone() {
        // 23:30 UTC is already the next day at UTC+2.
        let utc = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(day_key(&utc).to_string(), "2024-03-10");
        assert_eq!(day_key(&utc.with_timezone(&tz)).to_string(), "2024-03-11");
    }

    #[test]
    fn test_weekday_index() {
        // Jan 1, 2024 is Monday
        assert_eq!(weekday_of(key("2024-01-01")), 1);
        assert_eq!(weekday_of(key("2024-01-06")), 6);
        assert_eq!(weekday_of(key("2024-01-07")), 0);
        assert_eq!(weekday_label(key("2024-01-07").weekday()), "Sun");
    }

    #[test]
    fn test_calendar_arithmetic() {
        assert_eq!(key("2024-03-01").pred(), key("2024-02-29"));
        assert_eq!(key("2023-12-31").succ(), key("2024-01-01"));
        assert_eq!(key("2024-01-10").offset(-10), key("2023-12-31"));
    }

    #[test]
    fn test_last_n_days_oldest_first() {
        let days = DayKey::last_n_days(key("2024-01-02"), 3);
        assert_eq!(days, vec![key("2023-12-31"), key("2024-01-01"), key("2024-01-02")]);
        assert!(DayKey::last_n_days(key("2024-01-02"), 0).is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("2024-13-01".parse::<DayKey>().is_err());
        assert!("yesterday".parse::<DayKey>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&key("2024-01-05")).unwrap();
        assert_eq!(json, "\"2024-01-05\"");
        let back: DayKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key("2024-01-05"));
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::on(key("2024-01-02"));
        assert_eq!(clock.today(), key("2024-01-02"));
        assert_eq!(day_key(&clock.now()), key("2024-01-02"));
    }
}
