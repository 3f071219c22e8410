//! Bridges the async calendar client into the synchronous holiday provider.

use std::cell::OnceCell;
use std::fmt;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use wt_core::holiday::YEAR_PLACEHOLDER;
use wt_core::{CalendarSource, HolidayError, HolidayProvider};

use crate::Config;

/// Downloads calendars over HTTP on a private runtime.
/// The runtime is started by the first download.
struct HttpCalendar {
    client: wt_calendar::Client,
    runtime: OnceCell<Runtime>,
}

impl fmt::Debug for HttpCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCalendar")
            .field("client", &self.client)
            .field("runtime_started", &self.runtime.get().is_some())
            .finish()
    }
}

impl HttpCalendar {
    fn new() -> Result<Self> {
        let client = wt_calendar::Client::new().context("failed to create calendar client")?;
        Ok(Self {
            client,
            runtime: OnceCell::new(),
        })
    }

    fn runtime(&self) -> std::io::Result<&Runtime> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(runtime);
        }
        tracing::debug!("starting async runtime for calendar downloads");
        let runtime = Runtime::new()?;
        Ok(self.runtime.get_or_init(|| runtime))
    }
}

impl CalendarSource for HttpCalendar {
    fn fetch(&self, url: &str) -> Result<String, HolidayError> {
        let fetch_error = |message: String| HolidayError::Fetch {
            url: url.to_string(),
            message,
        };
        let runtime = self
            .runtime()
            .map_err(|err| fetch_error(format!("failed to create async runtime: {err}")))?;
        runtime
            .block_on(self.client.fetch(url))
            .map_err(|err| fetch_error(err.to_string()))
    }
}

/// Builds the holiday provider for `config`.
///
/// Without a configured calendar no date is a holiday and nothing is
/// downloaded.
pub fn holiday_provider(config: &Config) -> Result<HolidayProvider> {
    let Some(template) = &config.holidays.calendar else {
        return Ok(HolidayProvider::disabled());
    };
    if !template.contains(YEAR_PLACEHOLDER) {
        tracing::warn!(
            calendar = %template,
            "holiday calendar URL lacks {YEAR_PLACEHOLDER}, using one calendar for every year"
        );
    }
    Ok(HolidayProvider::new(
        template.clone(),
        Box::new(HttpCalendar::new()?),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn provider_is_disabled_without_calendar() {
        let mut provider = holiday_provider(&Config::default()).unwrap();
        assert!(!provider.is_enabled());
        let new_year = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(provider.holiday_on(new_year).unwrap(), None);
    }

    #[test]
    fn invalid_calendar_url_fails_on_fetch() {
        let mut config = Config::default();
        config.holidays.calendar = Some("file:///holidays/{year}.ics".to_string());
        let mut provider = holiday_provider(&config).unwrap();
        assert!(provider.is_enabled());

        let err = provider.holidays_for_year(2024).unwrap_err();
        assert!(matches!(err, HolidayError::Fetch { .. }));
    }

    #[test]
    fn runtime_starts_on_first_fetch() {
        let calendar = HttpCalendar::new().unwrap();
        assert!(calendar.runtime.get().is_none());

        let err = calendar.fetch("file:///holidays/2024.ics").unwrap_err();
        assert!(matches!(err, HolidayError::Fetch { .. }));
        assert!(calendar.runtime.get().is_some());
    }
}
