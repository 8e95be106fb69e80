//! Persistence errors raised by policy stores.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Failures of the persistence capability behind the policy gate.
///
/// These always propagate to the caller of the gate: a policy decision that
/// could not be recorded must not be reported as applied.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The storage backend failed
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// The run was never registered
    #[error("Pipeline run '{0}' is not registered")]
    RunNotFound(String),

    /// A stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value is not one the model accepts
    #[error("Invalid stored value: {0}")]
    Invalid(String),

    /// A writer panicked while holding the store lock
    #[error("Store lock poisoned")]
    LockPoisoned,
}
