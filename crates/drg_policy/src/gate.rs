//! Policy gate state machine.
//!
//! Turns the results of one validation into durable side effects: the run
//! status, at most one incident per run, and the shared downstream gate.

use crate::{PolicyStore, Result, RunStatus};
use chrono::{DateTime, Utc};
use drg_core::{CheckName, ValidationResult};
use tracing::{error, info, warn};

/// Applies validation outcomes to a [`PolicyStore`].
///
/// The gate is global: whichever run is enforced last decides it for every
/// downstream consumer. Concurrent enforcements of different runs are not
/// serialized.
///
/// # Example
///
/// ```rust
/// use drg_core::{CheckName, Metric, ValidationResult};
/// use drg_policy::{MemoryStore, PolicyGate, PolicyStore};
///
/// let gate = PolicyGate::new(MemoryStore::new());
/// gate.store().register_run("run-1", "rides", chrono::Utc::now()).unwrap();
///
/// let results = vec![ValidationResult::fail(CheckName::Volume, Metric::Count(0))];
/// assert!(!gate.enforce("run-1", &results).unwrap());
/// assert!(!gate.is_gate_open().unwrap());
/// ```
#[derive(Debug)]
pub struct PolicyGate<S> {
    store: S,
}

impl<S: PolicyStore> PolicyGate<S> {
    /// Creates a gate over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enforces the policy for `run_id` at the current time.
    ///
    /// See [`enforce_at`](Self::enforce_at).
    pub fn enforce(&self, run_id: &str, results: &[ValidationResult]) -> Result<bool> {
        self.enforce_at(run_id, results, Utc::now())
    }

    /// Enforces the policy for `run_id` and returns whether every result passed.
    ///
    /// In order, each step durable before the next:
    /// 1. the run status becomes `passed` or `failed`;
    /// 2. on failure, an incident is opened unless the run already has one,
    ///    then the gate is blocked with the failure summary;
    /// 3. on success, the gate is opened, then any open incident of the run
    ///    is resolved.
    ///
    /// # Errors
    ///
    /// Any store failure is returned as is; steps after it are not attempted.
    /// The run must have been registered.
    pub fn enforce_at(
        &self,
        run_id: &str,
        results: &[ValidationResult],
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let failed: Vec<CheckName> = results
            .iter()
            .filter(|result| !result.passed())
            .map(ValidationResult::check_name)
            .collect();
        let passed = failed.is_empty();

        let status = if passed {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        };
        self.store.update_run_status(run_id, status, at)?;

        if passed {
            self.store
                .set_gate(false, &format!("Run {run_id} passed validation"), at)?;
            info!("Downstream gate OPEN.");

            let open = self
                .store
                .find_incident(run_id)?
                .is_some_and(|incident| incident.is_open());
            if open && self.store.resolve_incident(run_id, at)? {
                info!(run_id, "Incident resolved for run {}", run_id);
            }
        } else {
            let summary = failure_summary(run_id, &failed);
            if self.store.find_incident(run_id)?.is_none() {
                self.store.create_incident(run_id, &summary, at)?;
                error!("Incident created for run {}", run_id);
            }
            self.store.set_gate(true, &summary, at)?;
            warn!("Downstream gate BLOCKED.");
        }

        Ok(passed)
    }

    /// Returns whether downstream consumers may proceed.
    ///
    /// Open when the gate has never been written.
    ///
    /// # Errors
    ///
    /// Returns the store failure when the gate cannot be read.
    pub fn is_gate_open(&self) -> Result<bool> {
        Ok(self.store.get_gate()?.is_none_or(|gate| !gate.blocked))
    }
}

/// Formats the incident summary and gate reason for a failed run.
pub fn failure_summary(run_id: &str, failed: &[CheckName]) -> String {
    let names: Vec<&str> = failed.iter().map(CheckName::as_str).collect();
    format!(
        "Run {run_id} failed {} checks: {}",
        failed.len(),
        names.join(", ")
    )
}
