//! Records the policy gate reads and writes.

use crate::PersistenceError;
use chrono::{DateTime, Utc};
use drg_core::ValidationResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Registered, not yet validated
    Pending,
    /// Last validation passed
    Passed,
    /// Last validation failed
    Failed,
}

impl RunStatus {
    /// Returns the stored name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "passed" => Ok(RunStatus::Passed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(PersistenceError::Invalid(format!("run status '{other}'"))),
        }
    }
}

/// One execution of the pipeline for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub dataset_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    /// Time of the last status update, unset while pending
    pub completed_at: Option<DateTime<Utc>>,
}

/// How severe an incident is. Every incident blocks downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Block,
}

impl Severity {
    /// Returns the stored name of the severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Block => "block",
        }
    }
}

impl FromStr for Severity {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Severity::Block),
            other => Err(PersistenceError::Invalid(format!("severity '{other}'"))),
        }
    }
}

/// Whether an incident still needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Resolved,
}

impl IncidentStatus {
    /// Returns the stored name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "open",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(IncidentStatus::Open),
            "resolved" => Ok(IncidentStatus::Resolved),
            other => Err(PersistenceError::Invalid(format!("incident status '{other}'"))),
        }
    }
}

/// A tracked gate-blocking failure of one run.
///
/// Open from the first failing validation of the run until a later validation
/// of the same run passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub run_id: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    /// Human-readable list of the failing checks
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Incident {
    /// Returns true while the incident is unresolved.
    pub fn is_open(&self) -> bool {
        self.status == IncidentStatus::Open
    }
}

/// The single shared downstream gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateState {
    pub blocked: bool,
    pub reason: String,
    pub updated_at: DateTime<Utc>,
}

/// One persisted check outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub run_id: String,
    pub check_name: String,
    pub passed: bool,
    /// The metric as displayed, e.g. `"48.01"` or `"N/A"`
    pub metric: String,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl CheckRecord {
    /// Builds the record persisted for `result`.
    pub fn from_result(run_id: &str, result: &ValidationResult, at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.to_string(),
            check_name: result.check_name().to_string(),
            passed: result.passed(),
            metric: result.metric().to_string(),
            details: serde_json::Value::Object(result.details().clone()),
            recorded_at: at,
        }
    }
}
