//! Default target derivation.
//!
//! A date without an explicit target gets, in order of precedence:
//! 1. zero hours and the holiday name if it is a public holiday,
//! 2. the configured duration for its weekday,
//! 3. the configured daily duration,
//! 4. eight hours.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::holiday::{HolidayError, HolidayProvider};

/// Hours assumed when neither a weekday nor a daily target is configured.
pub const FALLBACK_TARGET_HOURS: i64 = 8;

/// Configured target durations.
///
/// Weekday slots are indexed Monday = 0 .. Sunday = 6.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetTimes {
    daily: Option<Duration>,
    weekdays: [Option<Duration>; 7],
}

impl TargetTimes {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_daily(mut self, daily: Duration) -> Self {
        self.daily = Some(daily);
        self
    }

    #[must_use]
    pub fn with_weekday(mut self, weekday: Weekday, target: Duration) -> Self {
        self.weekdays[weekday.num_days_from_monday() as usize] = Some(target);
        self
    }

    /// Target for a weekday, falling back to daily and then to eight hours.
    pub fn for_weekday(&self, weekday: Weekday) -> Duration {
        self.weekdays[weekday.num_days_from_monday() as usize]
            .or(self.daily)
            .unwrap_or_else(|| Duration::hours(FALLBACK_TARGET_HOURS))
    }
}

/// Derives a `(duration, description)` pair for dates without explicit target.
pub trait DefaultTarget {
    fn default_target(&mut self, date: NaiveDate) -> Result<(Duration, String), HolidayError>;
}

/// Holiday-aware default targets based on [`TargetTimes`].
#[derive(Debug)]
pub struct TargetPolicy<'a> {
    times: &'a TargetTimes,
    holidays: &'a mut HolidayProvider,
}

impl<'a> TargetPolicy<'a> {
    pub const fn new(times: &'a TargetTimes, holidays: &'a mut HolidayProvider) -> Self {
        Self { times, holidays }
    }
}

impl DefaultTarget for TargetPolicy<'_> {
    fn default_target(&mut self, date: NaiveDate) -> Result<(Duration, String), HolidayError> {
        if let Some(name) = self.holidays.holiday_on(date)? {
            return Ok((Duration::zero(), name.to_string()));
        }
        Ok((self.times.for_weekday(date.weekday()), String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holiday::CalendarSource;

    struct NewYearOnly;

    impl CalendarSource for NewYearOnly {
        fn fetch(&self, url: &str) -> Result<String, HolidayError> {
            let year = url.rsplit('/').next().unwrap_or_default();
            Ok(format!(
                "BEGIN:VCALENDAR\r\n\
BEGIN:VEVENT\r\nDTSTART;VALUE=DATE:{year}0101\r\nSUMMARY:New Year\r\nEND:VEVENT\r\n\
END:VCALENDAR\r\n"
            ))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn falls_back_to_eight_hours() {
        let times = TargetTimes::new();
        let mut holidays = HolidayProvider::disabled();
        let mut policy = TargetPolicy::new(&times, &mut holidays);

        // 2024-03-04 is a Monday
        assert_eq!(
            policy.default_target(date(2024, 3, 4)).unwrap(),
            (Duration::hours(8), String::new())
        );
    }

    #[test]
    fn daily_default_applies_without_weekday_override() {
        let times = TargetTimes::new().with_daily(Duration::hours(7));
        let mut holidays = HolidayProvider::disabled();
        let mut policy = TargetPolicy::new(&times, &mut holidays);

        assert_eq!(policy.default_target(date(2024, 3, 6)).unwrap().0, Duration::hours(7));
    }

    #[test]
    fn weekday_override_wins_over_daily() {
        let times = TargetTimes::new()
            .with_daily(Duration::hours(7))
            .with_weekday(Weekday::Fri, Duration::hours(4))
            .with_weekday(Weekday::Sat, Duration::zero());
        let mut holidays = HolidayProvider::disabled();
        let mut policy = TargetPolicy::new(&times, &mut holidays);

        assert_eq!(policy.default_target(date(2024, 3, 8)).unwrap().0, Duration::hours(4));
        assert_eq!(policy.default_target(date(2024, 3, 9)).unwrap().0, Duration::zero());
        assert_eq!(policy.default_target(date(2024, 3, 10)).unwrap().0, Duration::hours(7));
    }

    #[test]
    fn holiday_is_zero_even_with_weekday_override() {
        // 2024-01-01 is a Monday
        let times = TargetTimes::new().with_weekday(Weekday::Mon, Duration::hours(9));
        let mut holidays =
            HolidayProvider::new("https://example.org/{year}", Box::new(NewYearOnly));
        let mut policy = TargetPolicy::new(&times, &mut holidays);

        assert_eq!(
            policy.default_target(date(2024, 1, 1)).unwrap(),
            (Duration::zero(), "New Year".to_string())
        );
        assert_eq!(
            policy.default_target(date(2024, 1, 8)).unwrap(),
            (Duration::hours(9), String::new())
        );
    }
}
