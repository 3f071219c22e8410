//! Parsing and rendering of work durations.
//!
//! Durations show up in three places: on the command line (`-c -0.5h`), in the
//! configuration (`daily = "7h30m"`) and in the data files (`-00:30`). All of
//! them go through [`parse_duration`]. Rendering always uses the signed clock
//! form produced by [`format_signed_hm`].

use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use thiserror::Error;

/// Clock form: `8:30`, `08:30`, `08:30:15`.
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([0-5]\d)(?::([0-5]\d))?$").unwrap());

/// Bare number of hours: `8`, `7.5`.
static BARE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").unwrap());

/// Whole-input check for unit form: `8h`, `7h30m`, `1h 15min`, `0.5h`.
static UNITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+(?:\.\d+)?\s*[a-z]+\s*)+$").unwrap());

/// A single `<number><unit>` component.
static COMPONENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*([a-z]+)").unwrap());

/// Upper bound on parsed durations, about 100 years.
const MAX_SECONDS: f64 = 100.0 * 366.0 * 24.0 * 3600.0;

/// Errors produced while parsing a duration string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseDurationError {
    /// The input was empty or only a sign.
    #[error("duration cannot be empty")]
    Empty,

    /// The input did not match any supported form.
    #[error("invalid duration '{input}', use e.g. 8h, -0.5h, 7h30m or 08:30")]
    Invalid { input: String },

    /// A component used a unit we do not know.
    #[error("unknown duration unit '{unit}' in '{input}'")]
    UnknownUnit { unit: String, input: String },

    /// The value is too large to be a plausible work duration.
    #[error("duration out of range: '{input}'")]
    OutOfRange { input: String },
}

/// Parses a signed duration.
///
/// Supported forms:
/// - units: `8h`, `-0.5h`, `30m`, `45min`, `90s`, `7h30m`, `1h 15m`
/// - clock: `08:30`, `-00:30`, `01:00:30`
/// - bare number, interpreted as hours: `7.5`
///
/// A leading sign applies to the whole value. Fractions of a second are rounded.
pub fn parse_duration(input: &str) -> Result<Duration, ParseDurationError> {
    let trimmed = input.trim();
    let (negative, body) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, trimmed[1..].trim_start()),
        Some(b'+') => (false, trimmed[1..].trim_start()),
        _ => (false, trimmed),
    };
    if body.is_empty() {
        return Err(ParseDurationError::Empty);
    }
    if body.starts_with(['+', '-']) {
        return Err(invalid(input));
    }

    let seconds = if let Some(caps) = CLOCK_RE.captures(body) {
        let hours: f64 = caps[1].parse().map_err(|_| invalid(input))?;
        let minutes: f64 = caps[2].parse().map_err(|_| invalid(input))?;
        let secs: f64 = caps
            .get(3)
            .map_or(Ok(0.0), |m| m.as_str().parse())
            .map_err(|_| invalid(input))?;
        hours * 3600.0 + minutes * 60.0 + secs
    } else if BARE_RE.is_match(body) {
        let hours: f64 = body.parse().map_err(|_| invalid(input))?;
        hours * 3600.0
    } else {
        let lowered = body.to_ascii_lowercase();
        if !UNITS_RE.is_match(&lowered) {
            return Err(invalid(input));
        }
        let mut total = 0.0;
        for caps in COMPONENT_RE.captures_iter(&lowered) {
            let value: f64 = caps[1].parse().map_err(|_| invalid(input))?;
            let unit_seconds = match &caps[2] {
                "h" | "hr" | "hrs" | "hour" | "hours" => 3600.0,
                "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
                "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
                unit => {
                    return Err(ParseDurationError::UnknownUnit {
                        unit: unit.to_string(),
                        input: input.to_string(),
                    });
                }
            };
            total += value * unit_seconds;
        }
        total
    };

    if seconds > MAX_SECONDS {
        return Err(ParseDurationError::OutOfRange {
            input: input.to_string(),
        });
    }

    #[allow(clippy::cast_possible_truncation)]
    let seconds = seconds.round() as i64;
    Ok(Duration::seconds(if negative { -seconds } else { seconds }))
}

fn invalid(input: &str) -> ParseDurationError {
    ParseDurationError::Invalid {
        input: input.to_string(),
    }
}

/// Formats a duration as signed hours and minutes, e.g. `+08:30` or `-00:30`.
///
/// Seconds are truncated toward zero, so `-00:00:30` renders as `+00:00`.
pub fn format_signed_hm(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    let sign = if minutes < 0 { '-' } else { '+' };
    let minutes = minutes.abs();
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Formats a duration losslessly in clock form for storage.
///
/// Seconds are only written when non-zero: `-00:30`, `+01:00:15`.
pub fn format_clock(duration: Duration) -> String {
    let seconds = duration.num_seconds();
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.abs();
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if secs == 0 {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{secs:02}")
    }
}
