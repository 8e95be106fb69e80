//! Error types for batch handling and check execution.

use drg_core::{CheckName, MAX_PSI_BUCKETS, Metric, ValidationResult};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, reading or writing a batch.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parquet encoding or decoding failed
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow array construction or decoding failed
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Two columns share a name
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A referenced column does not exist
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// Columns of one batch disagree on row count
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A column mixes values that map to different storage types
    #[error("Column '{column}' mixes {first} and {second} values")]
    MixedTypes {
        column: String,
        first: &'static str,
        second: &'static str,
    },

    /// Array downcast failed
    #[error("Type conversion error: {0}")]
    TypeConversion(String),
}

/// Errors raised while a single check is evaluated.
///
/// These never escape the engine: each one becomes a failing result for the
/// check that raised it.
#[derive(Debug, Error)]
pub enum CheckExecutionError {
    /// The column a check depends on is absent from the batch
    #[error("{0} missing")]
    MissingColumn(String),

    /// The timestamp column has no value that could be read as a timestamp
    #[error("No parseable timestamps in column '{0}'")]
    NoTimestamps(String),

    /// The reference dataset could not be read
    #[error("Failed to read reference dataset '{}': {source}", .path.display())]
    Reference {
        path: PathBuf,
        #[source]
        source: DatasetError,
    },

    /// The reference dataset lacks the compared column
    #[error("Column '{0}' missing in reference")]
    ReferenceColumnMissing(String),

    /// A compared column has no numeric values
    #[error("Column '{column}' has no values in the {side} data")]
    EmptyColumn { column: String, side: &'static str },

    /// A histogram input has no values
    #[error("The {0} sample is empty")]
    EmptySample(&'static str),

    /// A compared column holds a non-numeric value
    #[error("Column '{column}' holds non-numeric {found} values")]
    NonNumeric { column: String, found: &'static str },

    /// Histogram bucket count is unusable
    #[error("Bucket count must be between 1 and {max}, got {0}", max = MAX_PSI_BUCKETS)]
    InvalidBuckets(usize),
}

impl CheckExecutionError {
    /// Converts the error into the failing result reported for `check`.
    ///
    /// Errors that mean "nothing to measure" report `N/A`; errors that mean the
    /// computation broke report `-1`.
    pub fn into_result(self, check: CheckName) -> ValidationResult {
        let metric = match self {
            CheckExecutionError::MissingColumn(_) | CheckExecutionError::NoTimestamps(_) => {
                Metric::NotAvailable
            }
            _ => Metric::Score(-1.0),
        };
        ValidationResult::fail(check, metric).with_detail("error", self.to_string())
    }
}
