//! Error types for data contracts.
//!
//! This module defines the errors raised when a contract definition is
//! structurally unusable, independent of how it was loaded.

use crate::MAX_PSI_BUCKETS;
use thiserror::Error;

/// Result type for data contract operations.
pub type Result<T> = std::result::Result<T, ContractError>;

/// Main error type for data contract operations.
#[derive(Error, Debug)]
pub enum ContractError {
    /// A required contract value is present but empty
    #[error("Contract value '{0}' must not be empty")]
    EmptyValue(String),

    /// Two schema fields share the same name
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    /// A check name outside the fixed set
    #[error("Unknown check name: {0}")]
    UnknownCheck(String),

    /// PSI bucket count outside `1..=MAX_PSI_BUCKETS`
    #[error("PSI bucket count must be between 1 and {max}, got {0}", max = MAX_PSI_BUCKETS)]
    InvalidBuckets(usize),
}
