//! Time entry and target records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::duration::format_signed_hm;

/// One logged interval of work.
///
/// Timestamps are local wall-clock times; the tracker never reasons about
/// time zones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Signed offset added to the worked span (breaks, rounding).
    pub correction: Duration,
    pub description: String,
}

impl TimeEntry {
    /// Creates an entry without correction or description.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            correction: Duration::zero(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn with_correction(mut self, correction: Duration) -> Self {
        self.correction = correction;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Wall-clock span between start and end.
    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Span plus correction.
    pub fn worktime(&self) -> Duration {
        self.span() + self.correction
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }
}

impl fmt::Display for TimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S")
        )?;
        if self.correction != Duration::zero() {
            write!(f, " ({})", format_signed_hm(self.correction))?;
        }
        if !self.description.is_empty() {
            write!(f, " {}", self.description)?;
        }
        Ok(())
    }
}

/// The expected work duration for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub date: NaiveDate,
    pub target: Duration,
    pub description: String,
}

impl TargetEntry {
    pub fn new(date: NaiveDate, target: Duration, description: impl Into<String>) -> Self {
        Self {
            date,
            target,
            description: description.into(),
        }
    }
}

/// Targets keyed uniquely by date, iterated in ascending date order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSeries {
    targets: BTreeMap<NaiveDate, TargetEntry>,
}

impl TargetSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the target for `entry.date`, returning the previous one.
    pub fn upsert(&mut self, entry: TargetEntry) -> Option<TargetEntry> {
        self.targets.insert(entry.date, entry)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&TargetEntry> {
        self.targets.get(&date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.targets.contains_key(&date)
    }

    /// Target duration for `date`, zero when none is known.
    pub fn target_on(&self, date: NaiveDate) -> Duration {
        self.get(date).map_or_else(Duration::zero, |t| t.target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetEntry> {
        self.targets.values()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.targets.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FromIterator<TargetEntry> for TargetSeries {
    /// Later entries for the same date replace earlier ones.
    fn from_iter<I: IntoIterator<Item = TargetEntry>>(iter: I) -> Self {
        let mut series = Self::new();
        for entry in iter {
            series.upsert(entry);
        }
        series
    }
}
