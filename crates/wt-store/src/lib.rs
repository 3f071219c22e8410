//! File storage for the time tracker.
//!
//! Persists the ledger and the target series as two small CSV files using
//! the `csv` crate. Both files are read completely and rewritten completely;
//! there is no locking against concurrent invocations.
//!
//! # Formats
//!
//! ## Ledger (`ledger.csv`)
//!
//! ```text
//! ,start,end,correction,description
//! 0,2024-03-04 09:00:00,2024-03-04 17:30:00,-00:30,desk work
//! ```
//!
//! The unnamed first column is a row index, rewritten on every save and
//! ignored when loading. Timestamps are local wall-clock times. An empty
//! correction means zero, an empty description means none.
//!
//! ## Targets (`targets.csv`)
//!
//! ```text
//! date,target,description
//! 2024-01-01,+00:00,New Year
//! ```
//!
//! # Missing files
//!
//! A missing file is an empty collection, not an error.
//!
//! # Pairs of writes
//!
//! [`Store::save_all`] writes the ledger first and the targets second. Each
//! file is replaced atomically via rename, but the pair is not: if the second
//! write fails the returned [`StoreError::Partial`] names the file that was
//! already written.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wt_core::duration::format_clock;
use wt_core::{Ledger, TargetEntry, TargetSeries, TimeEntry, parse_duration};

/// File name of the ledger inside the data directory.
pub const LEDGER_FILE: &str = "ledger.csv";

/// File name of the targets inside the data directory.
pub const TARGETS_FILE: &str = "targets.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening, creating or renaming a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The CSV layer failed while reading or writing.
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row was readable but its content is not valid.
    #[error("invalid row {row} in {}: {message}", path.display())]
    InvalidRow {
        path: PathBuf,
        row: usize,
        message: String,
    },

    /// The first file of a pair was written, the second was not.
    #[error(
        "{} was written but {} was not, the files are out of sync: {source}",
        written.display(),
        pending.display()
    )]
    Partial {
        written: PathBuf,
        pending: PathBuf,
        #[source]
        source: Box<StoreError>,
    },
}

/// Locations of the ledger and targets files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    ledger_path: PathBuf,
    targets_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LedgerRow {
    start: String,
    end: String,
    #[serde(default)]
    correction: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct LedgerRowOut<'a> {
    #[serde(rename = "")]
    index: usize,
    start: String,
    end: String,
    correction: String,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct TargetRow {
    date: String,
    target: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct TargetRowOut<'a> {
    date: String,
    target: String,
    description: &'a str,
}

impl Store {
    /// Store with the default file names inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_paths(data_dir.join(LEDGER_FILE), data_dir.join(TARGETS_FILE))
    }

    pub const fn with_paths(ledger_path: PathBuf, targets_path: PathBuf) -> Self {
        Self {
            ledger_path,
            targets_path,
        }
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn targets_path(&self) -> &Path {
        &self.targets_path
    }

    /// Loads the ledger; a missing file yields an empty ledger.
    pub fn load_ledger(&self) -> Result<Ledger, StoreError> {
        let path = &self.ledger_path;
        let Some(mut reader) = open_reader(path)? else {
            tracing::debug!(path = %path.display(), "no ledger file, starting empty");
            return Ok(Ledger::new());
        };

        let mut entries = Vec::new();
        for (idx, row) in reader.deserialize::<LedgerRow>().enumerate() {
            let row = row.map_err(|source| csv_error(path, source))?;
            let entry = row
                .into_entry()
                .map_err(|message| invalid_row(path, idx + 1, message))?;
            entries.push(entry);
        }
        tracing::debug!(path = %path.display(), entries = entries.len(), "loaded ledger");
        Ok(Ledger::from_entries(entries))
    }

    /// Loads the targets; a missing file yields an empty series.
    pub fn load_targets(&self) -> Result<TargetSeries, StoreError> {
        let path = &self.targets_path;
        let Some(mut reader) = open_reader(path)? else {
            tracing::debug!(path = %path.display(), "no targets file, starting empty");
            return Ok(TargetSeries::new());
        };

        let mut series = TargetSeries::new();
        for (idx, row) in reader.deserialize::<TargetRow>().enumerate() {
            let row = row.map_err(|source| csv_error(path, source))?;
            let entry = row
                .into_entry()
                .map_err(|message| invalid_row(path, idx + 1, message))?;
            if series.upsert(entry).is_some() {
                tracing::warn!(
                    path = %path.display(),
                    row = idx + 1,
                    "duplicate target date, keeping the later row"
                );
            }
        }
        tracing::debug!(path = %path.display(), targets = series.len(), "loaded targets");
        Ok(series)
    }

    /// Rewrites the ledger file.
    pub fn save_ledger(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let rows = ledger
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| LedgerRowOut {
                index,
                start: entry.start.format(TIMESTAMP_FORMAT).to_string(),
                end: entry.end.format(TIMESTAMP_FORMAT).to_string(),
                correction: format_clock(entry.correction),
                description: &entry.description,
            });
        write_rows(&self.ledger_path, rows)?;
        tracing::debug!(path = %self.ledger_path.display(), entries = ledger.len(), "saved ledger");
        Ok(())
    }

    /// Rewrites the targets file.
    pub fn save_targets(&self, targets: &TargetSeries) -> Result<(), StoreError> {
        let rows = targets.iter().map(|target| TargetRowOut {
            date: target.date.format(DATE_FORMAT).to_string(),
            target: format_clock(target.target),
            description: &target.description,
        });
        write_rows(&self.targets_path, rows)?;
        tracing::debug!(
            path = %self.targets_path.display(),
            targets = targets.len(),
            "saved targets"
        );
        Ok(())
    }

    /// Writes the ledger, then the targets.
    ///
    /// Nothing is written when the ledger write fails. When only the targets
    /// write fails the error is [`StoreError::Partial`].
    pub fn save_all(&self, ledger: &Ledger, targets: &TargetSeries) -> Result<(), StoreError> {
        self.save_ledger(ledger)?;
        self.save_targets(targets)
            .map_err(|source| StoreError::Partial {
                written: self.ledger_path.clone(),
                pending: self.targets_path.clone(),
                source: Box::new(source),
            })
    }
}

impl LedgerRow {
    fn into_entry(self) -> Result<TimeEntry, String> {
        let start = parse_timestamp(&self.start)?;
        let end = parse_timestamp(&self.end)?;
        let correction = match self.correction.as_deref().map(str::trim) {
            None | Some("") => chrono::Duration::zero(),
            Some(raw) => parse_duration(raw).map_err(|err| format!("correction: {err}"))?,
        };
        Ok(TimeEntry::new(start, end)
            .with_correction(correction)
            .with_description(self.description.unwrap_or_default()))
    }
}

impl TargetRow {
    fn into_entry(self) -> Result<TargetEntry, String> {
        let date = parse_date(&self.date)?;
        let target = parse_duration(&self.target).map_err(|err| format!("target: {err}"))?;
        if target < chrono::Duration::zero() {
            return Err(format!("negative target {} on {date}", self.target.trim()));
        }
        Ok(TargetEntry::new(
            date,
            target,
            self.description.unwrap_or_default(),
        ))
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .map_err(|err| format!("invalid timestamp '{raw}': {err}"))
}

/// Accepts plain dates and midnight timestamps (`2024-01-01 00:00:00`).
fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|err| format!("invalid date '{raw}': {err}"))
}

fn open_reader(path: &Path) -> Result<Option<csv::Reader<File>>, StoreError> {
    match File::open(path) {
        Ok(file) => Ok(Some(csv::Reader::from_reader(file))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(io_error(path, source)),
    }
}

/// Serializes `rows` to a sibling temp file and renames it over `path`.
fn write_rows<I, T>(path: &Path, rows: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }

    let tmp = temp_path(path);
    let file = File::create(&tmp).map_err(|source| io_error(&tmp, source))?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row).map_err(|source| csv_error(&tmp, source))?;
    }
    writer.flush().map_err(|source| io_error(&tmp, source))?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|source| io_error(path, source))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> StoreError {
    StoreError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn invalid_row(path: &Path, row: usize, message: String) -> StoreError {
    StoreError::InvalidRow {
        path: path.to_path_buf(),
        row,
        message,
    }
}
