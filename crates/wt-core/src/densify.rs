//! Target densification.
//!
//! Turns a sparse set of explicit targets into a gap-free series over a date
//! range. Explicit targets are never touched; missing days are filled from a
//! [`DefaultTarget`] policy and reported through `tracing` so the user sees
//! which values were assumed.

use chrono::NaiveDate;

use crate::duration::format_signed_hm;
use crate::entry::{TargetEntry, TargetSeries};
use crate::holiday::HolidayError;
use crate::policy::DefaultTarget;

/// Result of a densification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Densified {
    /// Every explicit target plus one entry per date of the range.
    pub series: TargetSeries,
    /// Dates filled from the policy, ascending.
    pub derived: Vec<NaiveDate>,
}

impl Densified {
    /// Whether the pass added anything to the input series.
    pub fn changed(&self) -> bool {
        !self.derived.is_empty()
    }
}

/// Fills every date in `range` (inclusive) that has no explicit target.
///
/// Dates of `sparse` outside the range are kept. `None` or a reversed range
/// leaves the series as it is.
pub fn densify<P>(
    sparse: &TargetSeries,
    range: Option<(NaiveDate, NaiveDate)>,
    policy: &mut P,
) -> Result<Densified, HolidayError>
where
    P: DefaultTarget + ?Sized,
{
    let mut series = sparse.clone();
    let mut derived = Vec::new();

    let Some((first, last)) = range else {
        return Ok(Densified { series, derived });
    };

    for date in first.iter_days().take_while(|date| *date <= last) {
        if series.contains(date) {
            continue;
        }
        let (target, description) = policy.default_target(date)?;
        tracing::info!(
            %date,
            target = %format_signed_hm(target),
            %description,
            "no target set for {date}, assuming {}{}",
            format_signed_hm(target),
            if description.is_empty() {
                String::new()
            } else {
                format!(" ({description})")
            }
        );
        series.upsert(TargetEntry::new(date, target, description));
        derived.push(date);
    }

    Ok(Densified { series, derived })
}
