//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Weekday;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wt_core::{TargetTimes, parse_duration};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `ledger.csv` and `targets.csv`.
    pub data_dir: PathBuf,

    /// Public holiday source.
    #[serde(default)]
    pub holidays: HolidaysConfig,

    /// Default daily targets.
    #[serde(default)]
    pub target_times: TargetTimesConfig,
}

/// `[holidays]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HolidaysConfig {
    /// iCalendar URL with a `{year}` placeholder.
    pub calendar: Option<String>,
}

/// `[target_times]` section, durations as written by the user (`8h`, `7h30m`, `06:00`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetTimesConfig {
    pub daily: Option<String>,
    pub monday: Option<String>,
    pub tuesday: Option<String>,
    pub wednesday: Option<String>,
    pub thursday: Option<String>,
    pub friday: Option<String>,
    pub saturday: Option<String>,
    pub sunday: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("holidays", &self.holidays.calendar)
            .field("target_times", &self.target_times)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs_data_path().unwrap_or_else(|| PathBuf::from(".")),
            holidays: HolidaysConfig::default(),
            target_times: TargetTimesConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources override earlier ones: defaults, the platform config
    /// file, `config_path`, then `WTRACK_` environment variables (`__`
    /// separates section and key, e.g. `WTRACK_TARGET_TIMES__DAILY=7h`).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("WTRACK_").split("__"));

        figment.extract()
    }

    /// Parses the `[target_times]` section.
    pub fn target_times(&self) -> Result<TargetTimes> {
        self.target_times.resolve()
    }
}

impl TargetTimesConfig {
    fn resolve(&self) -> Result<TargetTimes> {
        let mut times = TargetTimes::new();
        if let Some(daily) = &self.daily {
            times = times.with_daily(parse_setting("daily", daily)?);
        }

        let weekdays = [
            (Weekday::Mon, "monday", &self.monday),
            (Weekday::Tue, "tuesday", &self.tuesday),
            (Weekday::Wed, "wednesday", &self.wednesday),
            (Weekday::Thu, "thursday", &self.thursday),
            (Weekday::Fri, "friday", &self.friday),
            (Weekday::Sat, "saturday", &self.saturday),
            (Weekday::Sun, "sunday", &self.sunday),
        ];
        for (weekday, key, value) in weekdays {
            if let Some(value) = value {
                times = times.with_weekday(weekday, parse_setting(key, value)?);
            }
        }
        Ok(times)
    }
}

fn parse_setting(key: &str, value: &str) -> Result<chrono::Duration> {
    let duration =
        parse_duration(value).with_context(|| format!("invalid target_times.{key} = {value:?}"))?;
    if duration < chrono::Duration::zero() {
        anyhow::bail!("target_times.{key} must not be negative, got {value:?}");
    }
    Ok(duration)
}

/// Returns the platform-specific config directory for wtrack.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wtrack"))
}

/// Returns the platform-specific data directory for wtrack.
///
/// On Linux: `~/.local/share/wtrack`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("wtrack"))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_wtrack() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "wtrack");
    }

    #[test]
    fn test_default_config_uses_data_dir() {
        let config = Config::default();
        assert_eq!(config.data_dir, dirs_data_path().unwrap());
        assert_eq!(config.holidays.calendar, None);
        assert_eq!(config.target_times().unwrap(), TargetTimes::new());
    }

    #[test]
    fn test_load_sections_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/tmp/wtrack-data"

[holidays]
calendar = "https://example.org/holidays/{year}.ics"

[target_times]
daily = "7h30m"
friday = "4h"
saturday = "0h"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/wtrack-data"));
        assert_eq!(
            config.holidays.calendar.as_deref(),
            Some("https://example.org/holidays/{year}.ics")
        );

        let times = config.target_times().unwrap();
        assert_eq!(times.for_weekday(Weekday::Mon), Duration::minutes(450));
        assert_eq!(times.for_weekday(Weekday::Fri), Duration::hours(4));
        assert_eq!(times.for_weekday(Weekday::Sat), Duration::zero());
    }

    #[test]
    fn test_invalid_target_time_is_rejected() {
        let config = Config {
            target_times: TargetTimesConfig {
                monday: Some("lots".to_string()),
                ..TargetTimesConfig::default()
            },
            ..Config::default()
        };
        let err = config.target_times().unwrap_err();
        assert!(err.to_string().contains("target_times.monday"));
    }

    #[test]
    fn test_negative_target_time_is_rejected() {
        let config = Config {
            target_times: TargetTimesConfig {
                daily: Some("-1h".to_string()),
                ..TargetTimesConfig::default()
            },
            ..Config::default()
        };
        assert!(config.target_times().is_err());
    }
}
