//! Report command for worked time against targets.

use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Args;
use serde::Serialize;
use wt_core::report::{BucketRow, WEEKDAYS, WeekdayPivot, WeekdayStats};
use wt_core::{Frequency, Report, ReportKind, ReportQuery, build_report, format_signed_hm};
use wt_store::Store;

use super::util::{dense_targets, parse_date};
use crate::Config;

const LABEL_WIDTH: usize = 12;
const VALUE_WIDTH: usize = 8;
const BAR_WIDTH: usize = 20;
const WHISKER_WIDTH: usize = 30;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Only include days from this date on (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub since: Option<NaiveDate>,
    /// Draw text charts instead of a table.
    #[arg(short, long)]
    pub graphical: bool,
    /// Output as JSON.
    #[arg(long, conflicts_with = "graphical")]
    pub json: bool,
    /// Bucket size: d, w, m or y.
    pub frequency: Frequency,
    /// total, delta or average.
    pub kind: ReportKind,
}

// ========== Table ==========

/// Writes the report as a plain table.
pub fn write_table<W: Write>(
    writer: &mut W,
    report: &Report,
    query: &ReportQuery,
) -> io::Result<()> {
    match report {
        Report::Total(rows) | Report::Delta(rows) => write_bucket_table(writer, rows, query),
        Report::Average(pivot) => write_pivot_table(writer, pivot, query),
    }
}

fn bucket_value(row: &BucketRow, kind: ReportKind) -> Duration {
    match kind {
        ReportKind::Delta => row.diff,
        ReportKind::Total | ReportKind::Average => row.worktime,
    }
}

fn write_bucket_table<W: Write>(
    writer: &mut W,
    rows: &[BucketRow],
    query: &ReportQuery,
) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(writer, "No entries to report.");
    }

    writeln!(
        writer,
        "{:<LABEL_WIDTH$}{:>VALUE_WIDTH$}{:>width$}",
        query.frequency.as_str(),
        query.kind.as_str(),
        "target",
        width = VALUE_WIDTH + 1
    )?;

    let mut value_sum = Duration::zero();
    let mut target_sum = Duration::zero();
    for row in rows {
        let value = bucket_value(row, query.kind);
        value_sum += value;
        target_sum += row.target;
        let line = format!(
            "{:<LABEL_WIDTH$}{:>VALUE_WIDTH$}{:>width$}  {}",
            row.label,
            format_signed_hm(value),
            format_signed_hm(row.target),
            row.description,
            width = VALUE_WIDTH + 1
        );
        writeln!(writer, "{}", line.trim_end())?;
    }

    writeln!(writer, "{}", "─".repeat(LABEL_WIDTH + 2 * VALUE_WIDTH + 1))?;
    writeln!(
        writer,
        "{:<LABEL_WIDTH$}{:>VALUE_WIDTH$}{:>width$}",
        "sum",
        format_signed_hm(value_sum),
        format_signed_hm(target_sum),
        width = VALUE_WIDTH + 1
    )
}

fn write_pivot_table<W: Write>(
    writer: &mut W,
    pivot: &WeekdayPivot,
    query: &ReportQuery,
) -> io::Result<()> {
    if pivot.rows.is_empty() {
        return writeln!(writer, "No entries to report.");
    }

    let mut header = format!("{:<LABEL_WIDTH$}", query.frequency.as_str());
    for weekday in WEEKDAYS {
        header.push_str(&format!("{:>VALUE_WIDTH$}", weekday.to_string()));
    }
    writeln!(writer, "{header}")?;

    for row in &pivot.rows {
        let cells = row.cells.iter().map(|cell| cell.map(format_signed_hm));
        writeln!(writer, "{}", pivot_line(&row.label, cells))?;
    }

    writeln!(writer, "{}", "─".repeat(LABEL_WIDTH + 7 * VALUE_WIDTH))?;
    let stat_rows: [(&str, fn(&WeekdayStats) -> String); 5] = [
        ("days", |s| s.count.to_string()),
        ("mean", |s| format_signed_hm(s.mean)),
        ("min", |s| format_signed_hm(s.min)),
        ("median", |s| format_signed_hm(s.median)),
        ("max", |s| format_signed_hm(s.max)),
    ];
    for (label, value) in stat_rows {
        let cells = WEEKDAYS.iter().map(|weekday| {
            pivot
                .stats
                .iter()
                .find(|stats| stats.weekday == *weekday)
                .map(value)
        });
        writeln!(writer, "{}", pivot_line(label, cells))?;
    }
    Ok(())
}

fn pivot_line(label: &str, cells: impl Iterator<Item = Option<String>>) -> String {
    let mut line = format!("{label:<LABEL_WIDTH$}");
    for cell in cells {
        let cell = cell.unwrap_or_else(|| "-".to_string());
        line.push_str(&format!("{cell:>VALUE_WIDTH$}"));
    }
    line
}

// ========== Charts ==========

/// Generates a bar of `BAR_WIDTH` characters for `value` relative to `scale`.
///
/// Negative values use a lighter block. Non-zero values below one cell still
/// get a single block.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn bar(value: Duration, scale: Duration) -> String {
    let scale = scale.num_seconds().abs();
    let seconds = value.num_seconds();
    if scale == 0 {
        return "░".repeat(BAR_WIDTH);
    }

    let ratio = seconds.abs() as f64 / scale as f64;
    let filled = if seconds == 0 {
        0
    } else {
        ((ratio * BAR_WIDTH as f64).round() as usize).clamp(1, BAR_WIDTH)
    };
    let block = if seconds < 0 { "▒" } else { "█" };
    format!("{}{}", block.repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Draws min, median and max of one weekday on the shared axis `[low, high]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn whisker(stats: &WeekdayStats, low: Duration, high: Duration) -> String {
    let span = (high - low).num_seconds();
    let position = |value: Duration| {
        if span <= 0 {
            return 0;
        }
        let offset = (value - low).num_seconds() as f64 / span as f64;
        ((offset * (WHISKER_WIDTH - 1) as f64).round() as usize).min(WHISKER_WIDTH - 1)
    };

    let (min, median, max) = (position(stats.min), position(stats.median), position(stats.max));
    let mut cells = vec![' '; WHISKER_WIDTH];
    for cell in &mut cells[min..=max] {
        *cell = '─';
    }
    cells[min] = '├';
    cells[max] = '┤';
    cells[median] = '┃';
    cells.into_iter().collect::<String>().trim_end().to_string()
}

/// Writes the report as text charts.
pub fn write_chart<W: Write>(
    writer: &mut W,
    report: &Report,
    query: &ReportQuery,
) -> io::Result<()> {
    match report {
        Report::Total(rows) | Report::Delta(rows) => {
            if rows.is_empty() {
                return writeln!(writer, "No entries to report.");
            }
            let scale = rows
                .iter()
                .map(|row| bucket_value(row, query.kind).abs())
                .max()
                .unwrap_or_else(Duration::zero);
            writeln!(writer, "{} per {}", query.kind, query.frequency)?;
            for row in rows {
                let value = bucket_value(row, query.kind);
                writeln!(
                    writer,
                    "{:<LABEL_WIDTH$}{:>VALUE_WIDTH$}  {}",
                    row.label,
                    format_signed_hm(value),
                    bar(value, scale)
                )?;
            }
            Ok(())
        }
        Report::Average(pivot) => {
            let Some(low) = pivot.stats.iter().map(|s| s.min).min() else {
                return writeln!(writer, "No entries to report.");
            };
            let high = pivot
                .stats
                .iter()
                .map(|s| s.max)
                .max()
                .unwrap_or(low);
            writeln!(
                writer,
                "daily delta per weekday, {} to {}",
                format_signed_hm(low),
                format_signed_hm(high)
            )?;
            for stats in &pivot.stats {
                let line = format!(
                    "{:<5}{:<width$}  {} / {} / {}",
                    stats.weekday.to_string(),
                    whisker(stats, low, high),
                    format_signed_hm(stats.min),
                    format_signed_hm(stats.median),
                    format_signed_hm(stats.max),
                    width = WHISKER_WIDTH
                );
                writeln!(writer, "{line}")?;
            }
            Ok(())
        }
    }
}

// ========== JSON ==========

#[derive(Debug, Serialize)]
struct JsonReport {
    frequency: &'static str,
    kind: &'static str,
    since: Option<NaiveDate>,
    rows: JsonRows,
    #[serde(skip_serializing_if = "Option::is_none")]
    weekdays: Option<Vec<JsonWeekdayStats>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum JsonRows {
    Buckets(Vec<JsonBucket>),
    Pivot(Vec<JsonPivotRow>),
}

#[derive(Debug, Serialize)]
struct JsonBucket {
    start: NaiveDate,
    label: String,
    worked_minutes: i64,
    target_minutes: i64,
    delta_minutes: i64,
    description: String,
}

#[derive(Debug, Serialize)]
struct JsonPivotRow {
    start: NaiveDate,
    label: String,
    /// Mean delta in minutes, Monday first.
    delta_minutes: [Option<i64>; 7],
}

#[derive(Debug, Serialize)]
struct JsonWeekdayStats {
    weekday: String,
    days: usize,
    mean_minutes: i64,
    min_minutes: i64,
    median_minutes: i64,
    max_minutes: i64,
}

/// Formats the report as JSON.
pub fn format_report_json(report: &Report, query: &ReportQuery) -> Result<String> {
    let (rows, weekdays) = match report {
        Report::Total(rows) | Report::Delta(rows) => {
            let rows = rows
                .iter()
                .map(|row| JsonBucket {
                    start: row.start,
                    label: row.label.clone(),
                    worked_minutes: row.worktime.num_minutes(),
                    target_minutes: row.target.num_minutes(),
                    delta_minutes: row.diff.num_minutes(),
                    description: row.description.clone(),
                })
                .collect();
            (JsonRows::Buckets(rows), None)
        }
        Report::Average(pivot) => {
            let rows = pivot
                .rows
                .iter()
                .map(|row| JsonPivotRow {
                    start: row.start,
                    label: row.label.clone(),
                    delta_minutes: row.cells.map(|cell| cell.map(|d| d.num_minutes())),
                })
                .collect();
            let stats = pivot
                .stats
                .iter()
                .map(|stats| JsonWeekdayStats {
                    weekday: stats.weekday.to_string(),
                    days: stats.count,
                    mean_minutes: stats.mean.num_minutes(),
                    min_minutes: stats.min.num_minutes(),
                    median_minutes: stats.median.num_minutes(),
                    max_minutes: stats.max.num_minutes(),
                })
                .collect();
            (JsonRows::Pivot(rows), Some(stats))
        }
    };

    let json = JsonReport {
        frequency: query.frequency.as_str(),
        kind: query.kind.as_str(),
        since: query.since,
        rows,
        weekdays,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Public Interface ==========

/// Runs the report command.
///
/// Dates without a stored target get their default target for the report
/// only; nothing is written.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let store = Store::new(&config.data_dir);
    let ledger = store.load_ledger()?;
    let targets = store.load_targets()?;
    let dense = dense_targets(&ledger, &targets, config)?;
    if dense.changed() {
        tracing::debug!(derived = dense.derived.len(), "derived targets used for report only");
    }

    let query = ReportQuery {
        since: args.since,
        frequency: args.frequency,
        kind: args.kind,
    };
    let report = build_report(&ledger, &dense.series, &query);

    if args.json {
        let output = format_report_json(&report, &query)?;
        writeln!(writer, "{output}")?;
    } else if args.graphical {
        write_chart(writer, &report, &query).context("failed to write report")?;
    } else {
        write_table(writer, &report, &query).context("failed to write report")?;
    }
    Ok(())
}
