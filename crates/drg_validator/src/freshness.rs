//! Freshness check.
//!
//! Measures how many hours separate the newest event of the batch from the
//! evaluation time.

use crate::{Batch, CheckExecutionError, DataValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use drg_core::{CheckName, FreshnessCheck, Metric, ValidationResult};

/// Epoch values above this magnitude are read as milliseconds, below as seconds.
const EPOCH_MILLIS_CUTOFF: u64 = 10_000_000_000;
/// Epoch values at or above this magnitude are read as microseconds.
const EPOCH_MICROS_CUTOFF: u64 = 10_000_000_000_000;
/// Epoch values at or above this magnitude are read as nanoseconds.
const EPOCH_NANOS_CUTOFF: u64 = 10_000_000_000_000_000;

/// Validates that the newest timestamp is recent enough.
pub struct FreshnessValidator;

impl FreshnessValidator {
    /// Creates a new freshness validator.
    pub fn new() -> Self {
        Self
    }

    /// Computes `delay = now - max(timestamp_column)` in hours.
    ///
    /// Passes iff `delay <= max_delay_hours`. Values that cannot be read as a
    /// timestamp are ignored.
    ///
    /// # Errors
    ///
    /// `MissingColumn` when the timestamp column is absent and `NoTimestamps`
    /// when no value of it could be read. Both report `N/A`.
    pub fn validate(
        &self,
        check: &FreshnessCheck,
        batch: &Batch,
        now: DateTime<Utc>,
    ) -> Result<ValidationResult, CheckExecutionError> {
        let column = batch
            .column(&check.timestamp_column)
            .ok_or_else(|| CheckExecutionError::MissingColumn(check.timestamp_column.clone()))?;

        let latest = column
            .non_null()
            .filter_map(timestamp_of)
            .max()
            .ok_or_else(|| CheckExecutionError::NoTimestamps(check.timestamp_column.clone()))?;

        let delay_ms = now.signed_duration_since(latest).num_milliseconds();
        let delay_hours = delay_ms as f64 / 3_600_000.0;
        let passed = delay_hours <= check.max_delay_hours;

        Ok(
            ValidationResult::new(CheckName::Freshness, passed, Metric::Hours(round2(delay_hours)))
                .with_detail("threshold", check.max_delay_hours)
                .with_detail("latest_ts", latest.to_rfc3339()),
        )
    }
}

impl Default for FreshnessValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reads a batch value as an instant.
///
/// Native timestamps are used as is, strings go through [`parse_timestamp`] and
/// integers are read as epoch seconds, milliseconds, microseconds or
/// nanoseconds depending on their magnitude.
pub fn timestamp_of(value: &DataValue) -> Option<DateTime<Utc>> {
    match value {
        DataValue::Timestamp(ts) => Some(*ts),
        DataValue::String(s) => parse_timestamp(s),
        DataValue::Int(epoch) => from_epoch(*epoch),
        _ => None,
    }
}

fn from_epoch(epoch: i64) -> Option<DateTime<Utc>> {
    let magnitude = epoch.unsigned_abs();
    if magnitude >= EPOCH_NANOS_CUTOFF {
        Some(DateTime::from_timestamp_nanos(epoch))
    } else if magnitude >= EPOCH_MICROS_CUTOFF {
        DateTime::from_timestamp_micros(epoch)
    } else if magnitude > EPOCH_MILLIS_CUTOFF {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

/// Parses a timestamp string in multiple formats.
///
/// Supports:
/// - RFC 3339 (e.g., "2024-01-15T10:30:00Z", "2024-01-15T10:30:00+01:00")
/// - Unix epoch seconds, milliseconds, microseconds or nanoseconds
///   (e.g., "1705318200")
/// - Naive date-time with space or `T` separator, optional fraction
///   (e.g., "2024-01-15 10:30:00.250"), read as UTC
/// - Date only (e.g., "2024-01-15"), read as midnight UTC
pub fn parse_timestamp(ts_str: &str) -> Option<DateTime<Utc>> {
    let ts_str = ts_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts_str) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(epoch) = ts_str.parse::<i64>() {
        return from_epoch(epoch);
    }

    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts_str, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(ts_str, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
