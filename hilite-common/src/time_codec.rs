//! Timestamp codec
//!
//! Converts between the timestamp strings viewers write in comments
//! (`M:SS`, `H:MM:SS`) and floating-point second counts.
//!
//! Parsing never fails from the caller's point of view: malformed text
//! normalizes to `0.0` so that a bad comment can never inject `NaN` into
//! a marker timeline. [`parse_timestamp`] is available for callers that
//! want to know *why* a string was rejected.

use crate::{Error, Result};

/// Seconds per hour; at or above this the long `H:MM:SS` form is used
const SECONDS_PER_HOUR: u64 = 3600;

/// Format seconds as a viewer-style timestamp.
///
/// Floors to whole seconds. Below one hour the format is `M:SS`, at or
/// above one hour it is `H:MM:SS`. The leading unit is never padded.
/// Negative and non-finite inputs are treated as `0`.
///
/// # Examples
///
/// ```
/// use hilite_common::time_codec::seconds_to_timestamp;
///
/// assert_eq!(seconds_to_timestamp(0.0), "0:00");
/// assert_eq!(seconds_to_timestamp(90.7), "1:30");
/// assert_eq!(seconds_to_timestamp(3725.0), "1:02:05");
/// ```
pub fn seconds_to_timestamp(seconds: f64) -> String {
    let total = whole_seconds(seconds);

    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Parse a viewer-style timestamp into seconds, yielding `0.0` on any error.
///
/// Two parts are read as `m*60 + s`, three parts as `h*3600 + m*60 + s`.
///
/// # Examples
///
/// ```
/// use hilite_common::time_codec::timestamp_to_seconds;
///
/// assert_eq!(timestamp_to_seconds("1:30"), 90.0);
/// assert_eq!(timestamp_to_seconds("1:02:05"), 3725.0);
/// assert_eq!(timestamp_to_seconds("soon"), 0.0);
/// ```
pub fn timestamp_to_seconds(text: &str) -> f64 {
    parse_timestamp(text).unwrap_or(0.0)
}

/// Strict variant of [`timestamp_to_seconds`].
///
/// # Errors
///
/// Returns [`Error::Parse`] when the text is not two or three
/// colon-separated non-negative numbers.
pub fn parse_timestamp(text: &str) -> Result<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();

    let numbers = parts
        .iter()
        .map(|part| parse_component(part))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| Error::Parse(format!("non-numeric timestamp component in '{}'", text)))?;

    match numbers.as_slice() {
        [m, s] => Ok(m * 60.0 + s),
        [h, m, s] => Ok(h * 3600.0 + m * 60.0 + s),
        _ => Err(Error::Parse(format!(
            "unrecognized timestamp shape '{}' ({} parts)",
            text,
            parts.len()
        ))),
    }
}

/// Convert a digit-only millisecond string to seconds.
///
/// Returns `None` for empty or non-digit input.
pub fn millis_to_seconds(millis: &str) -> Option<f64> {
    parse_millis(millis).map(|ms| ms as f64 / 1000.0)
}

fn parse_millis(millis: &str) -> Option<u64> {
    let trimmed = millis.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

fn parse_component(part: &str) -> Option<f64> {
    let value = part.trim().parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}
