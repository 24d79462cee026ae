//! Epoch-millisecond timestamp derivations used by the log pipeline.
//!
//! Event logs carry `ts` as milliseconds since the Unix epoch. Two projections
//! are derived from it: the epoch-second string and a calendar timestamp with
//! second resolution, expressed as wall-clock time in the configured zone.

use crate::error::DerivationError;
use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike, Utc};
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;

/// Zone used to turn an instant into wall-clock calendar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// The zone of the host running the job.
    #[default]
    Local,
    Utc,
}

/// Integer division of `ts` by 1000, rendered as a string.
///
/// Rounds toward negative infinity, so `floor(ts / 1000)` holds for instants
/// before the epoch too.
pub fn epoch_seconds(ts: i64) -> String {
    ts.div_euclid(1000).to_string()
}

/// Calendar timestamp of `ts`, truncated to whole seconds.
pub fn to_datetime(ts: i64, zone: TimeZoneMode) -> Result<NaiveDateTime, DerivationError> {
    let seconds = (ts as f64 / 1000.0).floor();
    if !seconds.is_finite() || seconds < i64::MIN as f64 || seconds > i64::MAX as f64 {
        return Err(DerivationError::OutOfRange(ts));
    }
    wall_clock(seconds as i64, zone).ok_or(DerivationError::OutOfRange(ts))
}

/// Second-precision start time of a play.
///
/// Integer-only counterpart of [`to_datetime`]; the two agree on every `ts`.
pub fn start_time(ts: i64, zone: TimeZoneMode) -> Result<NaiveDateTime, DerivationError> {
    wall_clock(ts.div_euclid(1000), zone).ok_or(DerivationError::OutOfRange(ts))
}

fn wall_clock(epoch_secs: i64, zone: TimeZoneMode) -> Option<NaiveDateTime> {
    let instant = DateTime::<Utc>::from_timestamp(epoch_secs, 0)?;
    Some(match zone {
        TimeZoneMode::Utc => instant.naive_utc(),
        TimeZoneMode::Local => instant.with_timezone(&Local).naive_local(),
    })
}

/// Reads a raw `ts` value.
///
/// Returns `Ok(None)` for a JSON null. Integers and strings holding an integer
/// are accepted, since the logs are not consistent about it.
pub fn parse_epoch_millis(value: &Value) -> Result<Option<i64>, DerivationError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| DerivationError::NonNumeric(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| DerivationError::NonNumeric(format!("{:?}", s))),
        other => Err(DerivationError::NonNumeric(other.to_string())),
    }
}

/// Calendar fields extracted from a start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub hour: i32,
    pub day: i32,
    /// ISO-8601 week of the year.
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// 1 = Sunday ... 7 = Saturday.
    pub weekday: i32,
}

impl From<NaiveDateTime> for TimeParts {
    fn from(start_time: NaiveDateTime) -> Self {
        TimeParts {
            hour: start_time.hour() as i32,
            day: start_time.day() as i32,
            week: start_time.iso_week().week() as i32,
            month: start_time.month() as i32,
            year: start_time.year(),
            weekday: start_time.weekday().number_from_sunday() as i32,
        }
    }
}

/// Seconds since the epoch of a wall-clock timestamp, as stored in columnar output.
pub fn wall_clock_seconds(start_time: &NaiveDateTime) -> i64 {
    start_time.and_utc().timestamp()
}
