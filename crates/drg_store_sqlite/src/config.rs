//! Store configuration.

use crate::SqliteStoreError;
use serde::Deserialize;
use std::path::PathBuf;

/// Default busy timeout for connections, in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration for the `SQLite` policy store.
///
/// `path` must name a file, not a directory. Missing parent directories are
/// created on open.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// How long a writer waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl SqliteStoreConfig {
    /// Creates a configuration with the default busy timeout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Sets the busy timeout.
    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    /// Checks the configuration before any file is touched.
    ///
    /// # Errors
    ///
    /// `Invalid` for an empty path or a path naming an existing directory.
    pub fn validate(&self) -> Result<(), SqliteStoreError> {
        if self.path.as_os_str().is_empty() {
            return Err(SqliteStoreError::Invalid(
                "store path must not be empty".to_string(),
            ));
        }
        if self.path.is_dir() {
            return Err(SqliteStoreError::Invalid(
                "store path must be a file, not a directory".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_deserialize_with_default_timeout() {
        let config: SqliteStoreConfig = serde_json::from_str(r#"{"path": "drg.sqlite3"}"#).unwrap();

        assert_eq!(config, SqliteStoreConfig::new("drg.sqlite3"));
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn test_validate_rejects_empty_and_directory_paths() {
        let dir = TempDir::new().unwrap();

        assert!(SqliteStoreConfig::new("").validate().is_err());
        assert!(SqliteStoreConfig::new(dir.path()).validate().is_err());
        assert!(
            SqliteStoreConfig::new(dir.path().join("drg.sqlite3"))
                .with_busy_timeout_ms(10)
                .validate()
                .is_ok()
        );
    }
}
