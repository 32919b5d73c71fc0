/// Utility functions
use crate::errors::DecodeError;
use chrono::{DateTime, TimeZone, Utc};
use std::str::FromStr;
use std::time::Duration;

/// Strip the JSONP callback parentheses around a JSON document
pub fn strip_jsonp(body: &str) -> &str {
    body.trim_start_matches('(')
        .trim_end_matches(|c: char| matches!(c, ')' | ';' | '\r' | '\n'))
}

/// Timestamp from milliseconds since the epoch; absent values map to the epoch itself.
/// Sub-second precision is dropped.
pub fn epoch_millis(ms: Option<i64>) -> DateTime<Utc> {
    epoch_secs(ms.map(|ms| ms / 1000))
}

/// Timestamp from seconds since the epoch; absent values map to the epoch itself
pub fn epoch_secs(secs: Option<i64>) -> DateTime<Utc> {
    secs.and_then(|s| Utc.timestamp_opt(s, 0).single())
        .unwrap_or_default()
}

/// True for the zero timestamp produced by [`epoch_millis`] for missing values
pub fn is_epoch(t: &DateTime<Utc>) -> bool {
    t.timestamp() == 0
}

/// Parse a number the upstream sends as a string. Absent fields yield the default.
pub fn parse_quoted<T>(field: &'static str, value: Option<&str>) -> Result<T, DecodeError>
where
    T: FromStr + Default,
{
    match value {
        None => Ok(T::default()),
        Some(s) => s.trim().parse().map_err(|_| DecodeError::InvalidField {
            field,
            value: s.to_string(),
        }),
    }
}

/// The ombord API uses "-1" for "not available"
pub fn optional_field(value: Option<String>) -> Option<String> {
    value.filter(|s| s != "-1" && !s.is_empty())
}

/// Parse an interval such as "10s", "500ms", "2m", "1h" or a bare number of seconds
pub fn parse_interval(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid interval {:?}", text))?;

    let secs = match unit {
        "" | "s" => value,
        "ms" => value / 1000.0,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        _ => return Err(format!("unknown unit {:?} in interval {:?}", unit, text)),
    };

    if secs <= 0.0 {
        return Err(format!("interval {:?} must be positive", text));
    }

    Ok(Duration::from_secs_f64(secs))
}
