//! In-memory policy store for tests and single-process use.

use crate::{
    CheckRecord, GateState, Incident, IncidentStatus, PersistenceError, PipelineRun, PolicyStore,
    Result, RunStatus, Severity,
};
use chrono::{DateTime, Utc};
use drg_core::ValidationResult;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory policy store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// All records behind one mutex.
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    runs: BTreeMap<String, PipelineRun>,
    checks: Vec<CheckRecord>,
    incidents: Vec<Incident>,
    gate: Option<GateState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| PersistenceError::LockPoisoned)
    }
}

impl PolicyStore for MemoryStore {
    fn register_run(&self, run_id: &str, dataset_id: &str, at: DateTime<Utc>) -> Result<()> {
        self.lock()?
            .runs
            .entry(run_id.to_string())
            .or_insert_with(|| PipelineRun {
                run_id: run_id.to_string(),
                dataset_id: dataset_id.to_string(),
                status: RunStatus::Pending,
                started_at: at,
                completed_at: None,
            });
        Ok(())
    }

    fn update_run_status(
        &self,
        run_id: &str,
        status: RunStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.lock()?;
        let run = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| PersistenceError::RunNotFound(run_id.to_string()))?;
        run.status = status;
        run.completed_at = Some(at);
        Ok(())
    }

    fn get_run(&self, run_id: &str) -> Result<Option<PipelineRun>> {
        Ok(self.lock()?.runs.get(run_id).cloned())
    }

    fn record_check_result(
        &self,
        run_id: &str,
        result: &ValidationResult,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.lock()?
            .checks
            .push(CheckRecord::from_result(run_id, result, at));
        Ok(())
    }

    fn check_results(&self, run_id: &str) -> Result<Vec<CheckRecord>> {
        Ok(self
            .lock()?
            .checks
            .iter()
            .filter(|record| record.run_id == run_id)
            .cloned()
            .collect())
    }

    fn find_incident(&self, run_id: &str) -> Result<Option<Incident>> {
        Ok(self
            .lock()?
            .incidents
            .iter()
            .rev()
            .find(|incident| incident.run_id == run_id)
            .cloned())
    }

    fn create_incident(&self, run_id: &str, summary: &str, at: DateTime<Utc>) -> Result<Incident> {
        let mut state = self.lock()?;
        let incident = Incident {
            id: state.incidents.len() as i64 + 1,
            run_id: run_id.to_string(),
            severity: Severity::Block,
            status: IncidentStatus::Open,
            summary: summary.to_string(),
            created_at: at,
            resolved_at: None,
        };
        state.incidents.push(incident.clone());
        Ok(incident)
    }

    fn resolve_incident(&self, run_id: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.lock()?;
        let mut resolved = false;
        for incident in state
            .incidents
            .iter_mut()
            .filter(|incident| incident.run_id == run_id && incident.is_open())
        {
            incident.status = IncidentStatus::Resolved;
            incident.resolved_at = Some(at);
            resolved = true;
        }
        Ok(resolved)
    }

    fn open_incidents(&self) -> Result<Vec<Incident>> {
        Ok(self
            .lock()?
            .incidents
            .iter()
            .filter(|incident| incident.is_open())
            .cloned()
            .collect())
    }

    fn set_gate(&self, blocked: bool, reason: &str, at: DateTime<Utc>) -> Result<()> {
        self.lock()?.gate = Some(GateState {
            blocked,
            reason: reason.to_string(),
            updated_at: at,
        });
        Ok(())
    }

    fn get_gate(&self) -> Result<Option<GateState>> {
        Ok(self.lock()?.gate.clone())
    }
}
