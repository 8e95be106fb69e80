//! Validation context and report types.
//!
//! The context carries the per-invocation inputs that are not part of the
//! contract or the batch (chiefly the evaluation time). The report gathers the
//! ordered check outcomes of one invocation.

use crate::{CheckName, ValidationResult};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Context for validation operations.
#[derive(Debug, Default, Clone)]
pub struct ValidationContext {
    /// Evaluation wall-clock time; `Utc::now()` at check time when unset
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl ValidationContext {
    /// Creates a new validation context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the evaluation time.
    pub fn with_evaluation_time(mut self, at: DateTime<Utc>) -> Self {
        self.evaluated_at = Some(at);
        self
    }

    /// The evaluation time to use for time-dependent checks.
    pub fn now(&self) -> DateTime<Utc> {
        self.evaluated_at.unwrap_or_else(Utc::now)
    }
}

/// Report of one validation invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Conjunction of every result
    pub passed: bool,

    /// Check outcomes in engine order
    pub results: Vec<ValidationResult>,

    /// Validation statistics
    pub stats: ValidationStats,
}

/// Statistics about validation execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationStats {
    /// Number of rows in the validated batch
    pub rows_validated: usize,

    /// Number of checks evaluated
    pub checks_run: usize,

    /// Validation duration in milliseconds
    pub duration_ms: u64,
}

impl ValidationReport {
    /// Builds a report from ordered results.
    pub fn from_results(results: Vec<ValidationResult>, stats: ValidationStats) -> Self {
        Self {
            passed: results.iter().all(ValidationResult::passed),
            results,
            stats,
        }
    }

    /// Results that did not pass, in engine order.
    pub fn failed_checks(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.passed())
    }

    /// Looks up the result of a given check.
    pub fn result(&self, check: CheckName) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.check_name() == check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Metric;
    use chrono::TimeZone;

    #[test]
    fn test_context_pins_time() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let context = ValidationContext::new().with_evaluation_time(at);

        assert_eq!(context.now(), at);
    }

    #[test]
    fn test_report_passed_is_conjunction() {
        let report = ValidationReport::from_results(
            vec![
                ValidationResult::pass(CheckName::SchemaPresence, Metric::Count(0)),
                ValidationResult::fail(CheckName::Volume, Metric::Count(0)),
            ],
            ValidationStats::default(),
        );

        assert!(!report.passed);
        let failed: Vec<CheckName> = report.failed_checks().map(|r| r.check_name()).collect();
        assert_eq!(failed, vec![CheckName::Volume]);
        assert!(report.result(CheckName::Freshness).is_none());
    }

    #[test]
    fn test_empty_report_passes() {
        let report = ValidationReport::from_results(Vec::new(), ValidationStats::default());
        assert!(report.passed);
    }
}
