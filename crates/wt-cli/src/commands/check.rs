//! Check command for finding days without logged work.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use wt_core::{find_missing, format_signed_hm};
use wt_store::Store;

use super::util::dense_targets;
use crate::Config;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct JsonMissingDay {
    date: NaiveDate,
    weekday: String,
    target_minutes: i64,
}

/// Lists this year's days with a positive target but no entry.
pub fn run<W: Write>(
    writer: &mut W,
    args: &CheckArgs,
    config: &Config,
    today: NaiveDate,
) -> Result<()> {
    let store = Store::new(&config.data_dir);
    let ledger = store.load_ledger()?;
    let targets = store.load_targets()?;
    let dense = dense_targets(&ledger, &targets, config)?;

    let missing = find_missing(&ledger, &dense.series, today);
    tracing::debug!(count = missing.len(), year = %today.format("%Y"), "audited targets");

    if args.json {
        let days: Vec<_> = missing
            .iter()
            .map(|date| JsonMissingDay {
                date: *date,
                weekday: date.format("%A").to_string(),
                target_minutes: dense.series.target_on(*date).num_minutes(),
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&days)?)?;
        return Ok(());
    }

    if missing.is_empty() {
        writeln!(writer, "No missing entries.")?;
        return Ok(());
    }

    writeln!(writer, "Days without entries:")?;
    for date in missing {
        writeln!(
            writer,
            "- {date} ({}): expected {}",
            date.format("%A"),
            format_signed_hm(dense.series.target_on(date))
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use insta::assert_snapshot;
    use wt_core::{Ledger, TargetEntry, TargetSeries, TimeEntry};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn worked_on(day: NaiveDate) -> TimeEntry {
        TimeEntry::new(
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(17, 0, 0).unwrap(),
        )
    }

    /// Entries on Monday and Thursday; the days in between fall back to 8h.
    fn setup(dir: &std::path::Path) -> Config {
        let ledger = Ledger::from_entries(vec![
            worked_on(date(2024, 3, 4)),
            worked_on(date(2024, 3, 7)),
        ]);
        let targets: TargetSeries = [
            TargetEntry::new(date(2024, 3, 4), Duration::hours(8), ""),
            TargetEntry::new(date(2024, 3, 6), Duration::zero(), "day off"),
            TargetEntry::new(date(2024, 3, 7), Duration::hours(8), ""),
        ]
        .into_iter()
        .collect();
        Store::new(dir).save_all(&ledger, &targets).unwrap();
        Config {
            data_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    fn run_to_string(args: &CheckArgs, config: &Config, today: NaiveDate) -> String {
        let mut output = Vec::new();
        run(&mut output, args, config, today).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn check_lists_missing_days() {
        let temp = tempfile::tempdir().unwrap();
        let config = setup(temp.path());

        let output = run_to_string(&CheckArgs { json: false }, &config, date(2024, 3, 8));
        assert_snapshot!(output, @r"
        Days without entries:
        - 2024-03-05 (Tuesday): expected +08:00
        ");
    }

    #[test]
    fn check_ignores_other_years() {
        let temp = tempfile::tempdir().unwrap();
        let config = setup(temp.path());

        let output = run_to_string(&CheckArgs { json: false }, &config, date(2025, 1, 10));
        assert_snapshot!(output, @"No missing entries.");
    }

    #[test]
    fn check_json_output() {
        let temp = tempfile::tempdir().unwrap();
        let config = setup(temp.path());

        let output = run_to_string(&CheckArgs { json: true }, &config, date(2024, 3, 8));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["date"], "2024-03-05");
        assert_eq!(value[0]["weekday"], "Tuesday");
        assert_eq!(value[0]["target_minutes"], 480);
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn check_on_empty_data_dir() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let output = run_to_string(&CheckArgs { json: true }, &config, date(2024, 3, 8));
        assert_eq!(output.trim(), "[]");
    }
}
