//! Target command for showing or setting the target time of a date.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};
use clap::Args;
use wt_core::{DefaultTarget, TargetEntry, TargetPolicy, format_signed_hm};
use wt_store::Store;

use super::util::{parse_date, parse_duration_arg};
use crate::{Config, holiday_provider};

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Date to show or set (YYYY-MM-DD).
    #[arg(value_parser = parse_date)]
    pub date: NaiveDate,
    /// New target duration, e.g. 8h, 6h30m or 0h. Shows the target if omitted.
    #[arg(value_name = "NEW_TARGET", value_parser = parse_duration_arg, allow_hyphen_values = true)]
    pub target: Option<Duration>,
    /// Reason for the target, e.g. the name of a holiday.
    pub description: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &TargetArgs, config: &Config) -> Result<()> {
    let store = Store::new(&config.data_dir);
    let mut targets = store.load_targets()?;

    let Some(target) = args.target else {
        return show(writer, args.date, targets.get(args.date), config);
    };

    if target < Duration::zero() {
        bail!("target must not be negative: {}", format_signed_hm(target));
    }

    let entry = TargetEntry::new(args.date, target, args.description.clone().unwrap_or_default());
    if let Some(previous) = targets.upsert(entry.clone()) {
        tracing::debug!(
            date = %previous.date,
            previous = %format_signed_hm(previous.target),
            "replacing target"
        );
    }
    store
        .save_targets(&targets)
        .with_context(|| format!("failed to save {}", store.targets_path().display()))?;

    writeln!(writer, "Set target for {}", format_line(&entry))?;
    Ok(())
}

fn show<W: Write>(
    writer: &mut W,
    date: NaiveDate,
    explicit: Option<&TargetEntry>,
    config: &Config,
) -> Result<()> {
    if let Some(entry) = explicit {
        writeln!(writer, "{} (explicit)", format_line(entry))?;
        return Ok(());
    }

    let times = config.target_times()?;
    let mut holidays = holiday_provider(config)?;
    let (target, description) = TargetPolicy::new(&times, &mut holidays)
        .default_target(date)
        .context("failed to derive default target")?;
    let predicted = TargetEntry::new(date, target, description);
    writeln!(writer, "{} (predicted)", format_line(&predicted))?;
    Ok(())
}

fn format_line(entry: &TargetEntry) -> String {
    let line = format!(
        "{} ({}): {}",
        entry.date,
        entry.date.format("%A"),
        format_signed_hm(entry.target)
    );
    if entry.description.is_empty() {
        line
    } else {
        format!("{line} {}", entry.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::config::TargetTimesConfig;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn run_to_string(args: &TargetArgs, config: &Config) -> String {
        let mut output = Vec::new();
        run(&mut output, args, config).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn sets_and_shows_explicit_target() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());

        let set = TargetArgs {
            date: date("2024-01-01"),
            target: Some(Duration::zero()),
            description: Some("New Year".to_string()),
        };
        let output = run_to_string(&set, &config);
        assert_snapshot!(output, @"Set target for 2024-01-01 (Monday): +00:00 New Year");

        let show = TargetArgs {
            date: date("2024-01-01"),
            target: None,
            description: None,
        };
        let output = run_to_string(&show, &config);
        assert_snapshot!(output, @"2024-01-01 (Monday): +00:00 New Year (explicit)");

        let stored = std::fs::read_to_string(temp.path().join("targets.csv")).unwrap();
        assert_eq!(stored, "date,target,description\n2024-01-01,+00:00,New Year\n");
    }

    #[test]
    fn shows_predicted_target_from_config() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            target_times: TargetTimesConfig {
                daily: Some("7h30m".to_string()),
                saturday: Some("0h".to_string()),
                ..TargetTimesConfig::default()
            },
            ..config_in(temp.path())
        };

        let friday = TargetArgs {
            date: date("2024-03-08"),
            target: None,
            description: None,
        };
        let output = run_to_string(&friday, &config);
        assert_snapshot!(output, @"2024-03-08 (Friday): +07:30 (predicted)");

        let saturday = TargetArgs {
            date: date("2024-03-09"),
            ..friday
        };
        let output = run_to_string(&saturday, &config);
        assert_snapshot!(output, @"2024-03-09 (Saturday): +00:00 (predicted)");

        assert!(!temp.path().join("targets.csv").exists());
    }

    #[test]
    fn replaces_existing_target() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        let first = TargetArgs {
            date: date("2024-03-04"),
            target: Some(Duration::hours(8)),
            description: None,
        };
        run_to_string(&first, &config);
        let second = TargetArgs {
            target: Some(Duration::hours(4)),
            description: Some("half day".to_string()),
            ..first
        };
        run_to_string(&second, &config);

        let targets = Store::new(temp.path()).load_targets().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets.target_on(date("2024-03-04")), Duration::hours(4));
    }

    #[test]
    fn rejects_negative_target() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        let args = TargetArgs {
            date: date("2024-03-04"),
            target: Some(Duration::hours(-1)),
            description: None,
        };
        assert!(run(&mut Vec::new(), &args, &config).is_err());
        assert!(!temp.path().join("targets.csv").exists());
    }
}
