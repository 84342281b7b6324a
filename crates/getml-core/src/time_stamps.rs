//! Time stamp conversion.
//!
//! The engine stores time stamps as fractional days since the UNIX epoch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

/// Time formats sent to the engine when the caller does not supply any.
///
/// These are engine format strings, not `chrono` patterns.
pub const DEFAULT_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%s%z", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d"];

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Owned copy of [`DEFAULT_TIME_FORMATS`].
#[must_use]
pub fn default_time_formats() -> Vec<String> {
    DEFAULT_TIME_FORMATS.iter().map(ToString::to_string).collect()
}

/// Fractional days since 1970-01-01T00:00:00.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_days(time: NaiveDateTime) -> f64 {
    let since_epoch = time.signed_duration_since(NaiveDateTime::UNIX_EPOCH);
    let micros = since_epoch.num_microseconds().unwrap_or(i64::MAX);
    micros as f64 / 1e6 / SECONDS_PER_DAY
}

/// Inverse of [`to_days`]. Returns `None` for NaN and out-of-range values.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn from_days(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let micros = (days * SECONDS_PER_DAY * 1e6).round();
    if micros.abs() >= 9.2e18 {
        return None;
    }
    NaiveDateTime::UNIX_EPOCH.checked_add_signed(TimeDelta::microseconds(micros as i64))
}

/// Parse the textual time stamp layouts the client accepts locally.
#[must_use]
pub fn parse_time_stamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Prefix for generated names: `YYYY-MM-DDTHH-MM-SS`.
///
/// Colons are replaced so the prefix is safe in file names.
#[must_use]
pub fn timestamp_prefix(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H-%M-%S").to_string()
}
