//! Shared utilities for CLI commands.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use wt_core::{Densified, Ledger, ParseDurationError, TargetPolicy, TargetSeries, densify};

use crate::{Config, holiday_provider};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Parses a calendar date argument such as `2024-03-04`.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

/// Parses a duration argument such as `-0.5h` or `7h30m`.
pub fn parse_duration_arg(s: &str) -> Result<Duration, ParseDurationError> {
    wt_core::parse_duration(s)
}

/// Parses a start or end argument.
///
/// Supports:
/// - Time of day on `date`: "09:00", "17:30:15"
/// - Full timestamp: "2024-03-04 09:00", "2024-03-04T09:00:00"
pub fn parse_timestamp(s: &str, date: NaiveDate) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Some(timestamp) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Ok(timestamp);
    }

    let Some(time) = TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
    else {
        anyhow::bail!("Invalid time: {s}. Use HH:MM[:SS] or YYYY-MM-DD HH:MM[:SS]");
    };
    Ok(date.and_time(time))
}

/// Completes `targets` for every date the ledger spans.
///
/// Derived dates come from the configured target times and holiday calendar.
pub fn dense_targets(
    ledger: &Ledger,
    targets: &TargetSeries,
    config: &Config,
) -> Result<Densified> {
    let times = config.target_times()?;
    let mut holidays = holiday_provider(config)?;
    let mut policy = TargetPolicy::new(&times, &mut holidays);
    densify(targets, ledger.date_range(), &mut policy).context("failed to derive default targets")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-04").unwrap(), march(4));
        assert!(parse_date("04.03.2024").is_err());
    }

    #[test]
    fn test_parse_timestamp_time_of_day_uses_date() {
        let ts = parse_timestamp("09:15", march(4)).unwrap();
        assert_eq!(ts, march(4).and_hms_opt(9, 15, 0).unwrap());

        let ts = parse_timestamp("17:30:15", march(4)).unwrap();
        assert_eq!(ts, march(4).and_hms_opt(17, 30, 15).unwrap());
    }

    #[test]
    fn test_parse_timestamp_full_timestamp_ignores_date() {
        let ts = parse_timestamp("2024-03-05 08:00", march(4)).unwrap();
        assert_eq!(ts, march(5).and_hms_opt(8, 0, 0).unwrap());

        let ts = parse_timestamp("2024-03-05T08:00:30", march(4)).unwrap();
        assert_eq!(ts, march(5).and_hms_opt(8, 0, 30).unwrap());
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        let err = parse_timestamp("nine", march(4)).unwrap_err();
        assert!(err.to_string().contains("Invalid time"));
        assert!(parse_timestamp("25:00", march(4)).is_err());
    }

    #[test]
    fn test_parse_duration_arg() {
        assert_eq!(parse_duration_arg("-0.5h").unwrap(), Duration::minutes(-30));
        assert!(parse_duration_arg("soon").is_err());
    }
}
