//! Core domain logic for the work time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Ledger: validated work entries (no inversion, overlap or midnight crossing)
//! - Targets: the holiday-aware default policy and densification of sparse targets
//! - Reports: worked time and deltas per day, week, month or year
//! - Audit: days with a target but no logged work

pub mod audit;
pub mod densify;
pub mod duration;
mod entry;
pub mod holiday;
pub mod ledger;
pub mod policy;
pub mod report;

pub use audit::find_missing;
pub use densify::{Densified, densify};
pub use duration::{ParseDurationError, format_signed_hm, parse_duration};
pub use entry::{TargetEntry, TargetSeries, TimeEntry};
pub use holiday::{CalendarParseError, CalendarSource, HolidayError, HolidayProvider, Holidays};
pub use ledger::{Ledger, LedgerError};
pub use policy::{DefaultTarget, TargetPolicy, TargetTimes};
pub use report::{Frequency, Report, ReportKind, ReportQuery, build_report};
