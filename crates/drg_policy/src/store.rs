//! Persistence capability consumed by the policy gate.

use crate::{CheckRecord, GateState, Incident, PipelineRun, Result, RunStatus};
use chrono::{DateTime, Utc};
use drg_core::ValidationResult;

/// Storage for runs, check results, incidents and the shared gate.
///
/// Every mutation must be durable when the call returns. No operation spans
/// more than one record, and implementations provide no cross-run locking:
/// concurrent writers of the gate race and the last write wins.
pub trait PolicyStore {
    /// Registers a run as pending. Registering an existing run leaves it untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the write fails.
    fn register_run(&self, run_id: &str, dataset_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Sets the status of a run and stamps its completion time.
    ///
    /// # Errors
    ///
    /// `RunNotFound` when the run was never registered.
    fn update_run_status(&self, run_id: &str, status: RunStatus, at: DateTime<Utc>)
    -> Result<()>;

    /// Loads a run.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the read fails.
    fn get_run(&self, run_id: &str) -> Result<Option<PipelineRun>>;

    /// Appends one check outcome for a run.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the write fails.
    fn record_check_result(
        &self,
        run_id: &str,
        result: &ValidationResult,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Lists the check outcomes of a run in recording order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the read fails.
    fn check_results(&self, run_id: &str) -> Result<Vec<CheckRecord>>;

    /// Returns the most recent incident of a run, open or resolved.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the read fails.
    fn find_incident(&self, run_id: &str) -> Result<Option<Incident>>;

    /// Opens a blocking incident for a run.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the write fails.
    fn create_incident(&self, run_id: &str, summary: &str, at: DateTime<Utc>) -> Result<Incident>;

    /// Resolves the open incidents of a run. Returns whether any was open.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the write fails.
    fn resolve_incident(&self, run_id: &str, at: DateTime<Utc>) -> Result<bool>;

    /// Lists every open incident, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the read fails.
    fn open_incidents(&self) -> Result<Vec<Incident>>;

    /// Overwrites the shared gate.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the write fails.
    fn set_gate(&self, blocked: bool, reason: &str, at: DateTime<Utc>) -> Result<()>;

    /// Reads the shared gate, `None` before the first write.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`](crate::PersistenceError) when the read fails.
    fn get_gate(&self) -> Result<Option<GateState>>;
}

impl<T: PolicyStore + ?Sized> PolicyStore for &T {
    fn register_run(&self, run_id: &str, dataset_id: &str, at: DateTime<Utc>) -> Result<()> {
        (**self).register_run(run_id, dataset_id, at)
    }

    fn update_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        (**self).update_run_status(run_id, status, at)
    }

    fn get_run(&self, run_id: &str) -> Result<Option<PipelineRun>> {
        (**self).get_run(run_id)
    }

    fn record_check_result(
        &self,
        run_id: &str,
        result: &ValidationResult,
        at: DateTime<Utc>,
    ) -> Result<()> {
        (**self).record_check_result(run_id, result, at)
    }

    fn check_results(&self, run_id: &str) -> Result<Vec<CheckRecord>> {
        (**self).check_results(run_id)
    }

    fn find_incident(&self, run_id: &str) -> Result<Option<Incident>> {
        (**self).find_incident(run_id)
    }

    fn create_incident(&self, run_id: &str, summary: &str, at: DateTime<Utc>) -> Result<Incident> {
        (**self).create_incident(run_id, summary, at)
    }

    fn resolve_incident(&self, run_id: &str, at: DateTime<Utc>) -> Result<bool> {
        (**self).resolve_incident(run_id, at)
    }

    fn open_incidents(&self) -> Result<Vec<Incident>> {
        (**self).open_incidents()
    }

    fn set_gate(&self, blocked: bool, reason: &str, at: DateTime<Utc>) -> Result<()> {
        (**self).set_gate(blocked, reason, at)
    }

    fn get_gate(&self) -> Result<Option<GateState>> {
        (**self).get_gate()
    }
}
