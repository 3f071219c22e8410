//! Holiday calendar retrieval for the time tracker.
//!
//! Downloads iCalendar feeds over HTTP(S). Parsing and caching live in
//! `wt-core`; this crate only moves bytes.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Default request timeout for calendar downloads.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("wtrack/", env!("CARGO_PKG_VERSION"));

/// Calendar client errors.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// The URL is not an http(s) URL.
    #[error("invalid calendar URL {url}: only http and https are supported")]
    InvalidUrl { url: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("calendar server returned status {status} for {url}")]
    Status { status: u16, url: String },
}

/// HTTP client for calendar feeds.
pub struct Client {
    http: reqwest::Client,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("timeout", &DEFAULT_TIMEOUT)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, CalendarError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(CalendarError::ClientBuild)?;
        Ok(Self { http })
    }

    /// Downloads the calendar document at `url` as text.
    pub async fn fetch(&self, url: &str) -> Result<String, CalendarError> {
        validate_url(url)?;
        tracing::debug!(%url, "requesting calendar");

        let response = self
            .http
            .get(url)
            .header("accept", "text/calendar, */*;q=0.5")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        tracing::debug!(%url, bytes = body.len(), "calendar downloaded");
        Ok(body)
    }
}

fn validate_url(url: &str) -> Result<(), CalendarError> {
    let lowered = url.trim().to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Ok(())
    } else {
        Err(CalendarError::InvalidUrl {
            url: url.to_string(),
        })
    }
}
