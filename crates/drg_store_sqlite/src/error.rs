//! Store errors.

use drg_policy::PersistenceError;
use thiserror::Error;

/// `SQLite` store errors.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Filesystem error around the database file.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// The database was created by an incompatible version of this store.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or stored data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

impl From<SqliteStoreError> for PersistenceError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            other => Self::Backend(other.to_string()),
        }
    }
}
