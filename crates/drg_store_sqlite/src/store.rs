//! Durable [`PolicyStore`] backed by `SQLite`.
//!
//! Every call runs as its own statement on a single mutex-guarded connection,
//! so each mutation is committed before the call returns. Timestamps are stored
//! as RFC 3339 text.

use crate::{SqliteStoreConfig, SqliteStoreError};
use chrono::{DateTime, Utc};
use drg_core::ValidationResult;
use drg_policy::{
    CheckRecord, GateState, Incident, IncidentStatus, PersistenceError, PipelineRun, PolicyStore,
    RunStatus, Severity,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Schema version written to `store_meta`.
const SCHEMA_VERSION: i64 = 1;

/// Identifier of the single gate row.
const GATE_ID: i64 = 1;

type Result<T> = std::result::Result<T, PersistenceError>;

/// `SQLite` policy store.
#[derive(Debug)]
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `config.path`.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, when the file cannot be opened, or when
    /// it holds a schema of another version.
    pub fn open(config: &SqliteStoreConfig) -> std::result::Result<Self, SqliteStoreError> {
        config.validate()?;
        ensure_parent_dir(&config.path)?;

        let mut connection = Connection::open(&config.path)?;
        connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        initialize_schema(&mut connection)?;

        debug!(path = %config.path.display(), "Opened policy store");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Fails when `SQLite` cannot allocate the database.
    pub fn in_memory() -> std::result::Result<Self, SqliteStoreError> {
        let mut connection = Connection::open_in_memory()?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)
    }
}

impl PolicyStore for SqliteStore {
    fn register_run(&self, run_id: &str, dataset_id: &str, at: DateTime<Utc>) -> Result<()> {
        self.connection()?
            .execute(
                "INSERT OR IGNORE INTO pipeline_runs (run_id, dataset_id, status, started_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![run_id, dataset_id, RunStatus::Pending.as_str(), at.to_rfc3339()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn update_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let changed = self
            .connection()?
            .execute(
                "UPDATE pipeline_runs SET status = ?2, completed_at = ?3 WHERE run_id = ?1",
                params![run_id, status.as_str(), at.to_rfc3339()],
            )
            .map_err(SqliteStoreError::from)?;
        if changed == 0 {
            return Err(PersistenceError::RunNotFound(run_id.to_string()));
        }
        Ok(())
    }

    fn get_run(&self, run_id: &str) -> Result<Option<PipelineRun>> {
        let row = self
            .connection()?
            .query_row(
                "SELECT run_id, dataset_id, status, started_at, completed_at
                 FROM pipeline_runs WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(SqliteStoreError::from)?;

        row.map(|(run_id, dataset_id, status, started_at, completed_at)| -> Result<PipelineRun> {
            Ok(PipelineRun {
                run_id,
                dataset_id,
                status: status.parse()?,
                started_at: parse_time(&started_at)?,
                completed_at: completed_at.as_deref().map(parse_time).transpose()?,
            })
        })
        .transpose()
    }

    fn record_check_result(
        &self,
        run_id: &str,
        result: &ValidationResult,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let record = CheckRecord::from_result(run_id, result, at);
        let details = serde_json::to_string(&record.details)?;
        self.connection()?
            .execute(
                "INSERT INTO check_results
                     (run_id, check_name, passed, metric, details, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.run_id,
                    record.check_name,
                    record.passed,
                    record.metric,
                    details,
                    at.to_rfc3339()
                ],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn check_results(&self, run_id: &str) -> Result<Vec<CheckRecord>> {
        let connection = self.connection()?;
        let mut statement = connection
            .prepare(
                "SELECT run_id, check_name, passed, metric, details, recorded_at
                 FROM check_results WHERE run_id = ?1 ORDER BY id",
            )
            .map_err(SqliteStoreError::from)?;
        let rows = statement
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(SqliteStoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(SqliteStoreError::from)?;

        rows.into_iter()
            .map(|row| -> Result<CheckRecord> {
                let (run_id, check_name, passed, metric, details, recorded_at) = row;
                Ok(CheckRecord {
                    run_id,
                    check_name,
                    passed,
                    metric,
                    details: serde_json::from_str(&details)?,
                    recorded_at: parse_time(&recorded_at)?,
                })
            })
            .collect()
    }

    fn find_incident(&self, run_id: &str) -> Result<Option<Incident>> {
        let row = self
            .connection()?
            .query_row(
                "SELECT id, run_id, severity, status, summary, created_at, resolved_at
                 FROM incidents WHERE run_id = ?1 ORDER BY id DESC LIMIT 1",
                params![run_id],
                incident_row,
            )
            .optional()
            .map_err(SqliteStoreError::from)?;
        row.map(IncidentRow::into_incident).transpose()
    }

    fn create_incident(&self, run_id: &str, summary: &str, at: DateTime<Utc>) -> Result<Incident> {
        let connection = self.connection()?;
        connection
            .execute(
                "INSERT INTO incidents (run_id, severity, status, summary, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    run_id,
                    Severity::Block.as_str(),
                    IncidentStatus::Open.as_str(),
                    summary,
                    at.to_rfc3339()
                ],
            )
            .map_err(SqliteStoreError::from)?;

        Ok(Incident {
            id: connection.last_insert_rowid(),
            run_id: run_id.to_string(),
            severity: Severity::Block,
            status: IncidentStatus::Open,
            summary: summary.to_string(),
            created_at: at,
            resolved_at: None,
        })
    }

    fn resolve_incident(&self, run_id: &str, at: DateTime<Utc>) -> Result<bool> {
        let changed = self
            .connection()?
            .execute(
                "UPDATE incidents SET status = ?2, resolved_at = ?3
                 WHERE run_id = ?1 AND status = ?4",
                params![
                    run_id,
                    IncidentStatus::Resolved.as_str(),
                    at.to_rfc3339(),
                    IncidentStatus::Open.as_str()
                ],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(changed > 0)
    }

    fn open_incidents(&self) -> Result<Vec<Incident>> {
        let connection = self.connection()?;
        let mut statement = connection
            .prepare(
                "SELECT id, run_id, severity, status, summary, created_at, resolved_at
                 FROM incidents WHERE status = ?1 ORDER BY id",
            )
            .map_err(SqliteStoreError::from)?;
        let rows = statement
            .query_map(params![IncidentStatus::Open.as_str()], incident_row)
            .map_err(SqliteStoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(SqliteStoreError::from)?;
        rows.into_iter().map(IncidentRow::into_incident).collect()
    }

    fn set_gate(&self, blocked: bool, reason: &str, at: DateTime<Utc>) -> Result<()> {
        self.connection()?
            .execute(
                "INSERT INTO downstream_gate (gate_id, blocked, reason, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (gate_id) DO UPDATE SET
                    blocked = excluded.blocked,
                    reason = excluded.reason,
                    updated_at = excluded.updated_at",
                params![GATE_ID, blocked, reason, at.to_rfc3339()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn get_gate(&self) -> Result<Option<GateState>> {
        let row = self
            .connection()?
            .query_row(
                "SELECT blocked, reason, updated_at FROM downstream_gate WHERE gate_id = ?1",
                params![GATE_ID],
                |row| {
                    Ok((
                        row.get::<_, bool>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(SqliteStoreError::from)?;

        row.map(|(blocked, reason, updated_at)| -> Result<GateState> {
            Ok(GateState {
                blocked,
                reason,
                updated_at: parse_time(&updated_at)?,
            })
        })
        .transpose()
    }
}

/// Raw incident columns, decoded after the statement completes.
struct IncidentRow {
    id: i64,
    run_id: String,
    severity: String,
    status: String,
    summary: String,
    created_at: String,
    resolved_at: Option<String>,
}

impl IncidentRow {
    fn into_incident(self) -> Result<Incident> {
        Ok(Incident {
            id: self.id,
            run_id: self.run_id,
            severity: self.severity.parse()?,
            status: self.status.parse()?,
            summary: self.summary,
            created_at: parse_time(&self.created_at)?,
            resolved_at: self.resolved_at.as_deref().map(parse_time).transpose()?,
        })
    }
}

fn incident_row(row: &Row<'_>) -> rusqlite::Result<IncidentRow> {
    Ok(IncidentRow {
        id: row.get(0)?,
        run_id: row.get(1)?,
        severity: row.get(2)?,
        status: row.get(3)?,
        summary: row.get(4)?,
        created_at: row.get(5)?,
        resolved_at: row.get(6)?,
    })
}

fn parse_time(value: &str) -> std::result::Result<DateTime<Utc>, SqliteStoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| SqliteStoreError::Invalid(format!("timestamp '{value}': {err}")))
}

fn ensure_parent_dir(path: &Path) -> std::result::Result<(), SqliteStoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
        }
        _ => Ok(()),
    }
}

/// Creates the tables on first use and checks the version afterwards.
fn initialize_schema(connection: &mut Connection) -> std::result::Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| {
            row.get(0)
        })
        .optional()?;

    match version {
        None => {
            tx.execute(
                "INSERT INTO store_meta (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS pipeline_runs (
                    run_id TEXT PRIMARY KEY,
                    dataset_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    completed_at TEXT
                );
                CREATE TABLE IF NOT EXISTS check_results (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    run_id TEXT NOT NULL,
                    check_name TEXT NOT NULL,
                    passed INTEGER NOT NULL,
                    metric TEXT NOT NULL,
                    details TEXT NOT NULL,
                    recorded_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_check_results_run_id
                    ON check_results (run_id);
                CREATE TABLE IF NOT EXISTS incidents (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    run_id TEXT NOT NULL,
                    severity TEXT NOT NULL,
                    status TEXT NOT NULL,
                    summary TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    resolved_at TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_incidents_run_id
                    ON incidents (run_id);
                CREATE TABLE IF NOT EXISTS downstream_gate (
                    gate_id INTEGER PRIMARY KEY CHECK (gate_id = 1),
                    blocked INTEGER NOT NULL,
                    reason TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );",
            )?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected schema version {SCHEMA_VERSION}, found {other}"
            )));
        }
    }

    tx.commit()?;
    Ok(())
}
