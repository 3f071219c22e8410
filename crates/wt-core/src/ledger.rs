//! The time ledger: validated, start-ordered work entries.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::entry::TimeEntry;

/// Reasons an entry is refused by the ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The entry ends before it starts.
    #[error("end before start: {end} is earlier than {start}")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The entry overlaps an entry already in the ledger.
    #[error("entry {entry} overlaps existing entry {existing}")]
    Overlap {
        entry: Box<TimeEntry>,
        existing: Box<TimeEntry>,
    },

    /// The entry ends on a later calendar day than it starts.
    #[error("entry crosses midnight: {start} to {end}, split it into one entry per day")]
    CrossesMidnight {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// Logged work entries, always sorted by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<TimeEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from stored entries without validating them.
    ///
    /// Entries are edited by hand outside the tool, so loading must not fail
    /// on data the validation would refuse today.
    pub fn from_entries(mut entries: Vec<TimeEntry>) -> Self {
        entries.sort_by_key(|entry| entry.start);
        Self { entries }
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks `entry` against the ledger without modifying it.
    pub fn validate(&self, entry: &TimeEntry) -> Result<(), LedgerError> {
        if entry.end < entry.start {
            return Err(LedgerError::EndBeforeStart {
                start: entry.start,
                end: entry.end,
            });
        }

        if let Some(existing) = self.entries.iter().find(|existing| overlaps(entry, existing)) {
            return Err(LedgerError::Overlap {
                entry: Box::new(entry.clone()),
                existing: Box::new(existing.clone()),
            });
        }

        if entry.end_date() > entry.start_date() {
            return Err(LedgerError::CrossesMidnight {
                start: entry.start,
                end: entry.end,
            });
        }

        Ok(())
    }

    /// Validates and inserts `entry`, keeping the ledger sorted by start.
    ///
    /// On error the ledger is unchanged.
    pub fn add_entry(&mut self, entry: TimeEntry) -> Result<(), LedgerError> {
        self.validate(&entry)?;
        let index = self.entries.partition_point(|existing| existing.start <= entry.start);
        self.entries.insert(index, entry);
        Ok(())
    }

    /// First start date and last end date, `None` for an empty ledger.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.entries.iter().map(TimeEntry::start_date).min()?;
        let last = self.entries.iter().map(TimeEntry::end_date).max()?;
        Some((first, last))
    }

    /// Worked time summed per start date.
    pub fn worktime_by_day(&self) -> BTreeMap<NaiveDate, Duration> {
        let mut days = BTreeMap::new();
        for entry in &self.entries {
            *days.entry(entry.start_date()).or_insert_with(Duration::zero) += entry.worktime();
        }
        days
    }

    /// Dates on which at least one entry starts.
    pub fn start_dates(&self) -> BTreeSet<NaiveDate> {
        self.entries.iter().map(TimeEntry::start_date).collect()
    }
}

/// Overlap rule for a new entry against an existing one.
///
/// Touching boundaries are fine, which allows zero-width entries at the start
/// or end of an existing one to carry extra corrections.
fn overlaps(new: &TimeEntry, existing: &TimeEntry) -> bool {
    let strictly_inside = |t: NaiveDateTime| existing.start < t && t < existing.end;
    strictly_inside(new.end)
        || strictly_inside(new.start)
        || (new.start <= existing.start && new.end >= existing.end)
}
