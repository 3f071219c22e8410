//! Track command for logging a worked interval.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Args;
use wt_core::{TimeEntry, format_signed_hm};
use wt_store::Store;

use super::util::{dense_targets, parse_date, parse_duration_arg, parse_timestamp};
use crate::Config;

#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Start time (HH:MM[:SS] or YYYY-MM-DD HH:MM[:SS]).
    pub start: String,
    /// End time (HH:MM[:SS] or YYYY-MM-DD HH:MM[:SS]).
    pub end: String,
    /// What the time was spent on.
    pub description: Option<String>,
    /// Signed adjustment added to the interval, e.g. -0.5h for a lunch break.
    #[arg(short, long, value_parser = parse_duration_arg, allow_hyphen_values = true)]
    pub correction: Option<Duration>,
    /// Date for times given without one. Defaults to today.
    #[arg(short, long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
}

/// Validates and records the entry, then fills targets over the ledger span.
///
/// A refused entry surfaces as a [`wt_core::LedgerError`] and leaves both
/// files untouched.
pub fn run<W: Write>(
    writer: &mut W,
    args: &TrackArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let date = args.date.unwrap_or(today);
    let start = parse_timestamp(&args.start, date)?;
    let end = parse_timestamp(&args.end, date)?;
    let entry = TimeEntry::new(start, end)
        .with_correction(args.correction.unwrap_or_else(Duration::zero))
        .with_description(args.description.clone().unwrap_or_default());

    let store = Store::new(&config.data_dir);
    let mut ledger = store.load_ledger()?;
    let targets = store.load_targets()?;

    ledger.add_entry(entry.clone())?;
    tracing::debug!(entries = ledger.len(), "entry accepted");

    let dense = dense_targets(&ledger, &targets, config)?;
    store
        .save_all(&ledger, &dense.series)
        .with_context(|| format!("failed to save data in {}", config.data_dir.display()))?;

    writeln!(writer, "Tracked {entry}")?;
    writeln!(writer, "Worked: {}", format_signed_hm(entry.worktime()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use wt_core::LedgerError;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    fn args(start: &str, end: &str, date: &str) -> TrackArgs {
        TrackArgs {
            start: start.to_string(),
            end: end.to_string(),
            description: None,
            correction: None,
            date: Some(parse_date(date).unwrap()),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    #[test]
    fn track_writes_entry_and_default_target() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        let args = TrackArgs {
            description: Some("desk work".to_string()),
            correction: Some(Duration::minutes(-30)),
            ..args("09:00", "17:30", "2024-03-04")
        };

        let mut output = Vec::new();
        run(&mut output, &args, &config, today()).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Tracked 2024-03-04 09:00:00 - 2024-03-04 17:30:00 (-00:30) desk work
        Worked: +08:00
        ");

        let ledger = std::fs::read_to_string(temp.path().join("ledger.csv")).unwrap();
        assert_eq!(
            ledger,
            ",start,end,correction,description\n0,2024-03-04 09:00:00,2024-03-04 17:30:00,-00:30,desk work\n"
        );
        let targets = std::fs::read_to_string(temp.path().join("targets.csv")).unwrap();
        assert_eq!(targets, "date,target,description\n2024-03-04,+08:00,\n");
    }

    #[test]
    fn track_fills_gap_between_days() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());

        run(&mut Vec::new(), &args("09:00", "12:00", "2024-03-04"), &config, today()).unwrap();
        run(&mut Vec::new(), &args("09:00", "12:00", "2024-03-07"), &config, today()).unwrap();

        let store = Store::new(temp.path());
        let targets = store.load_targets().unwrap();
        let dates: Vec<_> = targets.dates().map(|d| d.to_string()).collect();
        assert_eq!(
            dates,
            ["2024-03-04", "2024-03-05", "2024-03-06", "2024-03-07"]
        );
    }

    #[test]
    fn track_uses_today_without_date() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        let args = TrackArgs {
            date: None,
            ..args("09:00", "10:00", "2024-03-04")
        };

        run(&mut Vec::new(), &args, &config, today()).unwrap();

        let ledger = Store::new(temp.path()).load_ledger().unwrap();
        assert_eq!(ledger.entries()[0].start_date(), today());
    }

    #[test]
    fn track_rejects_overlap_without_writing() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        run(&mut Vec::new(), &args("09:00", "12:00", "2024-03-04"), &config, today()).unwrap();
        let before = std::fs::read_to_string(temp.path().join("ledger.csv")).unwrap();

        let err = run(&mut Vec::new(), &args("11:00", "13:00", "2024-03-04"), &config, today())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::Overlap { .. })
        ));
        let after = std::fs::read_to_string(temp.path().join("ledger.csv")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn track_rejects_end_before_start() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());

        let err = run(&mut Vec::new(), &args("12:00", "09:00", "2024-03-04"), &config, today())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::EndBeforeStart { .. })
        ));
        assert!(!temp.path().join("ledger.csv").exists());
    }

    #[test]
    fn track_rejects_invalid_time() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        let err = run(&mut Vec::new(), &args("noon", "13:00", "2024-03-04"), &config, today())
            .unwrap_err();
        assert!(err.downcast_ref::<LedgerError>().is_none());
    }
}
