//! Aggregation of worked time against targets.
//!
//! # Algorithm Summary
//!
//! 1. Sum the worktime of all entries per start date.
//! 2. Join with the dense target series; `diff = worktime - target`.
//! 3. Drop days before `since`.
//! 4. Group the remaining days into buckets of the requested frequency.
//!
//! Every bucket between the first and the last reported day is emitted, also
//! when nothing was logged in it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use thiserror::Error;

use crate::entry::TargetSeries;
use crate::ledger::Ledger;

/// Weekdays in column order.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Errors for report parameters given as text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportParseError {
    #[error("unknown frequency '{value}', use d, w, m or y")]
    Frequency { value: String },

    #[error("unknown report kind '{value}', use total, delta or average")]
    Kind { value: String },
}

/// Bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Day,
    /// ISO weeks, Monday to Sunday.
    Week,
    Month,
    Year,
}

impl Frequency {
    /// First date of the bucket containing `date`.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }

    /// First date of the bucket following the one starting at `start`.
    pub fn next_start(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => start.succ_opt(),
            Self::Week => start.checked_add_signed(Duration::days(7)),
            Self::Month => start.checked_add_months(Months::new(1)),
            Self::Year => start.checked_add_months(Months::new(12)),
        }
    }

    /// Human-readable bucket label.
    pub fn label(self, start: NaiveDate) -> String {
        match self {
            Self::Day | Self::Week => start.format("%Y-%m-%d").to_string(),
            Self::Month => start.format("%Y-%m").to_string(),
            Self::Year => start.format("%Y").to_string(),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ReportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Self::Day),
            "w" | "week" | "weekly" => Ok(Self::Week),
            "m" | "month" | "monthly" => Ok(Self::Month),
            "y" | "year" | "yearly" => Ok(Self::Year),
            _ => Err(ReportParseError::Frequency {
                value: s.to_string(),
            }),
        }
    }
}

/// What a report shows per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Worked time.
    Total,
    /// Worked time minus target.
    Delta,
    /// Daily deltas pivoted by weekday.
    Average,
}

impl ReportKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Delta => "delta",
            Self::Average => "average",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = ReportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(Self::Total),
            "delta" => Ok(Self::Delta),
            "average" => Ok(Self::Average),
            _ => Err(ReportParseError::Kind {
                value: s.to_string(),
            }),
        }
    }
}

/// Worked time and target of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRow {
    pub date: NaiveDate,
    pub worktime: Duration,
    pub target: Duration,
    pub diff: Duration,
    /// Description of the day's target, e.g. a holiday name.
    pub description: String,
}

/// Sums of one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRow {
    pub start: NaiveDate,
    pub label: String,
    pub worktime: Duration,
    pub target: Duration,
    pub diff: Duration,
    /// Non-empty target descriptions of the bucket's days, comma separated.
    pub description: String,
}

/// Mean daily delta per weekday within one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AverageRow {
    pub start: NaiveDate,
    pub label: String,
    /// Indexed Monday = 0 .. Sunday = 6; `None` when the bucket has no such day.
    pub cells: [Option<Duration>; 7],
}

/// Distribution of daily deltas for one weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdayStats {
    pub weekday: Weekday,
    pub count: usize,
    pub mean: Duration,
    pub min: Duration,
    pub median: Duration,
    pub max: Duration,
}

/// Daily deltas pivoted by weekday.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeekdayPivot {
    pub rows: Vec<AverageRow>,
    /// Only weekdays with at least one day.
    pub stats: Vec<WeekdayStats>,
}

/// Report parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    pub since: Option<NaiveDate>,
    pub frequency: Frequency,
    pub kind: ReportKind,
}

/// A computed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Total(Vec<BucketRow>),
    Delta(Vec<BucketRow>),
    Average(WeekdayPivot),
}

/// Computes a report over `ledger` and the dense `targets`.
pub fn build_report(ledger: &Ledger, targets: &TargetSeries, query: &ReportQuery) -> Report {
    let days: Vec<DayRow> = day_rows(ledger, targets)
        .into_iter()
        .filter(|day| query.since.is_none_or(|since| day.date >= since))
        .collect();
    tracing::debug!(
        days = days.len(),
        frequency = %query.frequency,
        kind = %query.kind,
        "building report"
    );

    match query.kind {
        ReportKind::Total => Report::Total(bucket_rows(&days, query.frequency)),
        ReportKind::Delta => Report::Delta(bucket_rows(&days, query.frequency)),
        ReportKind::Average => Report::Average(weekday_pivot(&days, query.frequency)),
    }
}

/// Joins per-day worktime with per-day targets.
///
/// Covers every date that has either an entry or a target. Missing worktime
/// or target counts as zero.
pub fn day_rows(ledger: &Ledger, targets: &TargetSeries) -> Vec<DayRow> {
    let mut worktime = ledger.worktime_by_day();
    for date in targets.dates() {
        worktime.entry(date).or_insert_with(Duration::zero);
    }

    worktime
        .into_iter()
        .map(|(date, worktime)| {
            let target = targets.target_on(date);
            let description = targets
                .get(date)
                .map(|entry| entry.description.clone())
                .unwrap_or_default();
            DayRow {
                date,
                worktime,
                target,
                diff: worktime - target,
                description,
            }
        })
        .collect()
}

/// Sums days into consecutive buckets.
///
/// `days` must be sorted by date.
pub fn bucket_rows(days: &[DayRow], frequency: Frequency) -> Vec<BucketRow> {
    let mut buckets: BTreeMap<NaiveDate, BucketRow> = bucket_starts(days, frequency)
        .into_iter()
        .map(|start| {
            let row = BucketRow {
                start,
                label: frequency.label(start),
                worktime: Duration::zero(),
                target: Duration::zero(),
                diff: Duration::zero(),
                description: String::new(),
            };
            (start, row)
        })
        .collect();

    for day in days {
        if let Some(row) = buckets.get_mut(&frequency.bucket_start(day.date)) {
            row.worktime += day.worktime;
            row.target += day.target;
            row.diff += day.diff;
            if !day.description.is_empty() {
                if !row.description.is_empty() {
                    row.description.push_str(", ");
                }
                row.description.push_str(&day.description);
            }
        }
    }

    buckets.into_values().collect()
}

/// Pivots daily deltas by weekday, one row per bucket.
pub fn weekday_pivot(days: &[DayRow], frequency: Frequency) -> WeekdayPivot {
    let mut per_bucket: BTreeMap<NaiveDate, [Vec<Duration>; 7]> = bucket_starts(days, frequency)
        .into_iter()
        .map(|start| (start, Default::default()))
        .collect();
    let mut per_weekday: [Vec<Duration>; 7] = Default::default();

    for day in days {
        let slot = day.date.weekday().num_days_from_monday() as usize;
        if let Some(cells) = per_bucket.get_mut(&frequency.bucket_start(day.date)) {
            cells[slot].push(day.diff);
        }
        per_weekday[slot].push(day.diff);
    }

    let rows = per_bucket
        .into_iter()
        .map(|(start, cells)| AverageRow {
            start,
            label: frequency.label(start),
            cells: cells.map(|values| mean(&values)),
        })
        .collect();

    let stats = WEEKDAYS
        .iter()
        .zip(per_weekday)
        .filter_map(|(weekday, mut values)| {
            values.sort();
            Some(WeekdayStats {
                weekday: *weekday,
                count: values.len(),
                mean: mean(&values)?,
                min: *values.first()?,
                median: median(&values)?,
                max: *values.last()?,
            })
        })
        .collect();

    WeekdayPivot { rows, stats }
}

/// Starts of all buckets from the first to the last day, inclusive.
fn bucket_starts(days: &[DayRow], frequency: Frequency) -> Vec<NaiveDate> {
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Vec::new();
    };
    let last = frequency.bucket_start(last.date);

    let mut starts = Vec::new();
    let mut current = Some(frequency.bucket_start(first.date));
    while let Some(start) = current.filter(|start| *start <= last) {
        starts.push(start);
        current = frequency.next_start(start);
    }
    starts
}

fn mean(values: &[Duration]) -> Option<Duration> {
    let count = i32::try_from(values.len()).ok().filter(|count| *count > 0)?;
    let sum = values.iter().fold(Duration::zero(), |acc, value| acc + *value);
    Some(sum / count)
}

/// Median of sorted `values`.
fn median(values: &[Duration]) -> Option<Duration> {
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values.get(mid).copied()
    } else {
        let low = *values.get(mid.checked_sub(1)?)?;
        let high = *values.get(mid)?;
        Some((low + high) / 2)
    }
}
