//! Public holidays from an external iCalendar feed.
//!
//! The [`HolidayProvider`] owns a per-year cache. A year is fetched at most
//! once for the lifetime of the provider; an unconfigured provider never
//! fetches and reports no holidays at all.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use icalendar::{CalendarComponent, Component};
use thiserror::Error;

/// Holiday names keyed by date.
pub type Holidays = BTreeMap<NaiveDate, String>;

/// Placeholder substituted with the year in calendar URL templates.
pub const YEAR_PLACEHOLDER: &str = "{year}";

/// Holiday retrieval errors. Both are fatal for the calling command.
#[derive(Debug, Error)]
pub enum HolidayError {
    /// The calendar could not be retrieved.
    #[error("failed to fetch holiday calendar {url}: {message}")]
    Fetch { url: String, message: String },

    /// The calendar was retrieved but is not valid iCalendar.
    #[error("invalid holiday calendar {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: CalendarParseError,
    },
}

/// Reasons a downloaded document is not a usable holiday calendar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalendarParseError {
    #[error("missing BEGIN:VCALENDAR")]
    MissingCalendar,

    #[error("malformed iCalendar: {0}")]
    Syntax(String),

    #[error("invalid DTSTART '{value}'")]
    InvalidStart { value: String },
}

/// Retrieves raw iCalendar documents.
pub trait CalendarSource {
    /// Returns the body of the document at `url`.
    fn fetch(&self, url: &str) -> Result<String, HolidayError>;
}

struct Calendar {
    url_template: String,
    source: Box<dyn CalendarSource>,
}

/// Per-year cached access to public holidays.
pub struct HolidayProvider {
    calendar: Option<Calendar>,
    cache: HashMap<i32, Holidays>,
}

impl fmt::Debug for HolidayProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HolidayProvider")
            .field(
                "url_template",
                &self.calendar.as_ref().map(|c| c.url_template.as_str()),
            )
            .field("cached_years", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl HolidayProvider {
    /// A provider without calendar source. Every year is holiday-free.
    pub fn disabled() -> Self {
        Self {
            calendar: None,
            cache: HashMap::new(),
        }
    }

    /// A provider fetching from `url_template` with `{year}` substituted.
    pub fn new(url_template: impl Into<String>, source: Box<dyn CalendarSource>) -> Self {
        Self {
            calendar: Some(Calendar {
                url_template: url_template.into(),
                source,
            }),
            cache: HashMap::new(),
        }
    }

    /// Whether a calendar source is configured.
    pub const fn is_enabled(&self) -> bool {
        self.calendar.is_some()
    }

    /// Returns the holidays of `year`, fetching them on first use.
    pub fn holidays_for_year(&mut self, year: i32) -> Result<&Holidays, HolidayError> {
        match self.cache.entry(year) {
            Entry::Occupied(cached) => Ok(cached.into_mut()),
            Entry::Vacant(slot) => {
                let holidays = match &self.calendar {
                    None => Holidays::new(),
                    Some(calendar) => load_year(calendar, year)?,
                };
                Ok(slot.insert(holidays))
            }
        }
    }

    /// Returns the holiday name for `date`, if any.
    pub fn holiday_on(&mut self, date: NaiveDate) -> Result<Option<&str>, HolidayError> {
        let holidays = self.holidays_for_year(date.year())?;
        Ok(holidays.get(&date).map(String::as_str))
    }
}

fn load_year(calendar: &Calendar, year: i32) -> Result<Holidays, HolidayError> {
    let url = calendar
        .url_template
        .replace(YEAR_PLACEHOLDER, &year.to_string());
    tracing::debug!(%url, year, "fetching holiday calendar");

    let body = calendar.source.fetch(&url)?;
    let holidays = parse_calendar(&body).map_err(|source| HolidayError::Parse {
        url: url.clone(),
        source,
    })?;
    tracing::debug!(%url, count = holidays.len(), "loaded holidays");
    Ok(holidays)
}

/// Extracts `(DTSTART date, SUMMARY)` pairs from the VEVENTs of an iCalendar document.
///
/// Events lacking a start date or summary are skipped. When two events share
/// a date the later one wins.
pub fn parse_calendar(text: &str) -> Result<Holidays, CalendarParseError> {
    if !text.to_ascii_uppercase().contains("BEGIN:VCALENDAR") {
        return Err(CalendarParseError::MissingCalendar);
    }
    let document: icalendar::Calendar = text.parse().map_err(CalendarParseError::Syntax)?;

    let mut holidays = Holidays::new();
    for component in &document.components {
        let CalendarComponent::Event(event) = component else {
            continue;
        };
        let start = event.property_value("DTSTART");
        let summary = event.property_value("SUMMARY");
        let (Some(start), Some(summary)) = (start, summary) else {
            tracing::debug!(?start, ?summary, "skipping incomplete calendar event");
            continue;
        };
        holidays.insert(parse_start_date(start)?, summary.trim().to_string());
    }
    Ok(holidays)
}

/// Parses the date part of `20240101` or `20240101T000000Z`.
fn parse_start_date(value: &str) -> Result<NaiveDate, CalendarParseError> {
    let invalid = || CalendarParseError::InvalidStart {
        value: value.to_string(),
    };
    let digits = value.trim().get(..8).ok_or_else(invalid)?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").map_err(|_| invalid())
}
