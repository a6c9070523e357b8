use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

/// Seconds since the Unix epoch, keeping sub-second precision.
pub fn epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64 / 1000.0
}

pub fn time_to_epoch(ts: Option<&Time>) -> Option<f64> {
    ts.map(|t| epoch_seconds(&t.0))
}

/// Extracts N from a schedule whose first field starts with `*/N`.
///
/// Only the leading minute field is inspected and anything after the digits
/// is ignored, so `*/5 * * * *` and `*/5,7 * * * *` both yield 5. Every other
/// form (lists, ranges, macros such as `@hourly`) yields `None`. The digit run
/// is read as `f64` so arbitrarily long steps still match.
pub fn parse_minute_step(schedule: &str) -> Option<f64> {
    let first = schedule.split_whitespace().next()?;
    let rest = first.strip_prefix("*/")?;
    let digits_len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_len == 0 {
        return None;
    }
    rest[..digits_len].parse::<f64>().ok()
}

/// Approximates the next run as `last + 60 * N` for `*/N` schedules.
pub fn approximate_next_schedule(schedule: &str, last_schedule_time: Option<f64>) -> Option<f64> {
    let last = last_schedule_time?;
    let step = parse_minute_step(schedule)?;
    Some(last + step * 60.0)
}
