//! Detection of days with an expected but absent work log.

use chrono::{Datelike, Duration, NaiveDate};

use crate::entry::TargetSeries;
use crate::ledger::Ledger;

/// Dates of `today`'s year with a positive target and no entry starting on them.
///
/// Older years are not audited.
pub fn find_missing(ledger: &Ledger, targets: &TargetSeries, today: NaiveDate) -> Vec<NaiveDate> {
    let worked = ledger.start_dates();
    targets
        .iter()
        .filter(|target| target.date.year() == today.year())
        .filter(|target| target.target > Duration::zero())
        .filter(|target| !worked.contains(&target.date))
        .map(|target| target.date)
        .collect()
}
