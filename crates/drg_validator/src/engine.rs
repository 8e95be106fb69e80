//! Main validation engine.
//!
//! Runs the checks of a contract against one batch in a fixed order:
//! `schema_presence`, `volume`, `freshness`, then `distribution` when the
//! contract configures it. A check that cannot be evaluated yields a failing
//! result; nothing raised inside a check escapes the engine.

use crate::{
    Batch, CheckExecutionError, DistributionValidator, FreshnessValidator, SchemaValidator,
    VolumeValidator,
};
use drg_core::{
    CheckName, Contract, ValidationContext, ValidationReport, ValidationResult, ValidationStats,
};
use std::time::Instant;
use tracing::{debug, error};

/// Main validation engine for data contracts.
///
/// # Example
///
/// ```rust
/// use drg_core::{ContractBuilder, SchemaFieldBuilder, ValidationContext};
/// use drg_validator::{Batch, Column, ValidationEngine};
///
/// let contract = ContractBuilder::new("rides")
///     .field(SchemaFieldBuilder::new("vendor_id", "integer").required(true).build())
///     .volume(1, None)
///     .build();
/// let batch = Batch::new(vec![Column::from_values("provider_id", [1i64, 2])]).unwrap();
///
/// let report = ValidationEngine::new().validate(&contract, &batch, &ValidationContext::new());
///
/// assert!(!report.passed);
/// for failed in report.failed_checks() {
///     println!("{} failed: {:?}", failed.check_name(), failed.details());
/// }
/// ```
pub struct ValidationEngine {
    schema_validator: SchemaValidator,
    volume_validator: VolumeValidator,
    freshness_validator: FreshnessValidator,
    distribution_validator: DistributionValidator,
}

impl ValidationEngine {
    /// Creates a new validation engine.
    pub fn new() -> Self {
        Self {
            schema_validator: SchemaValidator::new(),
            volume_validator: VolumeValidator::new(),
            freshness_validator: FreshnessValidator::new(),
            distribution_validator: DistributionValidator::new(),
        }
    }

    /// Validates a batch against a contract and wraps the results in a report.
    pub fn validate(
        &self,
        contract: &Contract,
        batch: &Batch,
        context: &ValidationContext,
    ) -> ValidationReport {
        let start = Instant::now();
        let results = self.run_checks(contract, batch, context);

        let stats = ValidationStats {
            rows_validated: batch.num_rows(),
            checks_run: results.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        ValidationReport::from_results(results, stats)
    }

    /// Runs every applicable check and returns the results in engine order.
    pub fn run_checks(
        &self,
        contract: &Contract,
        batch: &Batch,
        context: &ValidationContext,
    ) -> Vec<ValidationResult> {
        let mut results = Vec::with_capacity(4);

        results.push(settle(
            CheckName::SchemaPresence,
            Ok(self.schema_validator.validate(&contract.schema, batch)),
        ));

        results.push(settle(
            CheckName::Volume,
            Ok(self
                .volume_validator
                .validate(&contract.checks.volume_or_default(), batch)),
        ));

        results.push(settle(
            CheckName::Freshness,
            self.freshness_validator.validate(
                &contract.checks.freshness_or_default(),
                batch,
                context.now(),
            ),
        ));

        if let Some(distribution) = &contract.checks.distribution {
            results.push(settle(
                CheckName::Distribution,
                self.distribution_validator.validate(distribution, batch),
            ));
        }

        results
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns a check outcome into its reported result.
fn settle(
    check: CheckName,
    outcome: Result<ValidationResult, CheckExecutionError>,
) -> ValidationResult {
    let result = match outcome {
        Ok(result) => result,
        Err(err @ CheckExecutionError::MissingColumn(_)) => {
            debug!(check = %check, error = %err, "Check dependency missing");
            err.into_result(check)
        }
        Err(err) => {
            error!("{} check failed: {}", capitalize(check.as_str()), err);
            err.into_result(check)
        }
    };

    debug!(
        check = %result.check_name(),
        passed = result.passed(),
        metric = %result.metric(),
        "Check evaluated"
    );
    result
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Validates `batch` against `contract`, evaluating time-dependent checks at the
/// current wall-clock time.
pub fn run_validations(batch: &Batch, contract: &Contract) -> Vec<ValidationResult> {
    ValidationEngine::new().run_checks(contract, batch, &ValidationContext::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, DataValue, write_parquet};
    use chrono::{Duration, TimeZone, Utc};
    use drg_core::{ContractBuilder, DistributionCheck, Metric, SchemaFieldBuilder};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn rides_contract() -> Contract {
        ContractBuilder::new("nyc_taxi_rides")
            .field(SchemaFieldBuilder::new("vendor_id", "integer").required(true).build())
            .field(SchemaFieldBuilder::new("pickup_datetime", "timestamp").required(true).build())
            .field(SchemaFieldBuilder::new("fare_amount", "float").build())
            .volume(2, Some(10))
            .freshness(24.0)
            .build()
    }

    fn rides_batch(age: Duration) -> Batch {
        Batch::new(vec![
            Column::from_values("vendor_id", [1i64, 2, 1]),
            Column::from_values("pickup_datetime", [now() - age; 3]),
            Column::from_values("fare_amount", [12.5, 7.0, 30.25]),
        ])
        .unwrap()
    }

    fn names(results: &[ValidationResult]) -> Vec<CheckName> {
        results.iter().map(ValidationResult::check_name).collect()
    }

    #[test]
    fn test_valid_batch_passes_in_order() {
        let context = ValidationContext::new().with_evaluation_time(now());

        let batch = rides_batch(Duration::hours(1));
        let report = ValidationEngine::new().validate(&rides_contract(), &batch, &context);

        assert!(report.passed, "{:?}", report.results);
        assert_eq!(
            names(&report.results),
            vec![CheckName::SchemaPresence, CheckName::Volume, CheckName::Freshness]
        );
        assert_eq!(report.stats.rows_validated, 3);
        assert_eq!(report.stats.checks_run, 3);
    }

    #[test]
    fn test_distribution_runs_only_when_configured() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("reference.parquet");
        write_parquet(&rides_batch(Duration::zero()), &reference).unwrap();

        let mut contract = rides_contract();
        contract.checks.distribution = Some(DistributionCheck::psi("fare_amount", &reference));
        let context = ValidationContext::new().with_evaluation_time(now());

        let batch = rides_batch(Duration::zero());
        let results = ValidationEngine::new().run_checks(&contract, &batch, &context);

        assert_eq!(
            names(&results),
            vec![
                CheckName::SchemaPresence,
                CheckName::Volume,
                CheckName::Freshness,
                CheckName::Distribution
            ]
        );
        assert!(results.iter().all(ValidationResult::passed));
    }

    #[test]
    fn test_renamed_column_fails_schema_presence() {
        let mut batch = rides_batch(Duration::hours(1));
        batch.rename_column("vendor_id", "provider_id").unwrap();
        let context = ValidationContext::new().with_evaluation_time(now());

        let report = ValidationEngine::new().validate(&rides_contract(), &batch, &context);

        assert!(!report.passed);
        let schema = report.result(CheckName::SchemaPresence).unwrap();
        assert!(!schema.passed());
        assert_eq!(schema.detail("missing"), Some(&json!(["vendor_id"])));
        assert!(report.result(CheckName::Volume).unwrap().passed());
    }

    #[test]
    fn test_stale_batch_fails_freshness_only() {
        let context = ValidationContext::new().with_evaluation_time(now());

        let batch = rides_batch(Duration::hours(48));
        let report = ValidationEngine::new().validate(&rides_contract(), &batch, &context);

        let failed: Vec<CheckName> = report.failed_checks().map(|r| r.check_name()).collect();
        assert_eq!(failed, vec![CheckName::Freshness]);
        assert_eq!(
            report.result(CheckName::Freshness).unwrap().metric(),
            Metric::Hours(48.0)
        );
    }

    #[test]
    fn test_empty_partition() {
        let batch = Batch::with_columns(["vendor_id", "pickup_datetime"]).unwrap();

        let results = run_validations(&batch, &rides_contract());

        let volume = &results[1];
        assert!(!volume.passed());
        assert_eq!(volume.metric(), Metric::Count(0));
        let freshness = &results[2];
        assert!(!freshness.passed());
        assert_eq!(freshness.metric(), Metric::NotAvailable);
    }

    #[test]
    fn test_missing_timestamp_column() {
        let batch = Batch::new(vec![Column::from_values("vendor_id", [1i64, 2])]).unwrap();
        let contract = ContractBuilder::new("rides").build();

        let results = run_validations(&batch, &contract);

        assert!(results[0].passed());
        assert!(results[1].passed());
        assert_eq!(results[2].metric(), Metric::NotAvailable);
        assert_eq!(results[2].detail("error"), Some(&json!("pickup_datetime missing")));
    }

    #[test]
    fn test_broken_reference_does_not_stop_other_checks() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("reference.parquet");
        std::fs::write(&reference, b"corrupt").unwrap();

        let mut contract = rides_contract();
        contract.checks.distribution = Some(DistributionCheck::psi("fare_amount", &reference));
        let context = ValidationContext::new().with_evaluation_time(now());

        let batch = rides_batch(Duration::hours(1));
        let report = ValidationEngine::new().validate(&contract, &batch, &context);

        assert_eq!(report.results.len(), 4);
        let distribution = report.result(CheckName::Distribution).unwrap();
        assert!(!distribution.passed());
        assert_eq!(distribution.metric(), Metric::Score(-1.0));
        assert!(distribution.detail("error").is_some());
        assert_eq!(report.failed_checks().count(), 1);
    }

    #[test]
    fn test_unknown_check_kinds_are_ignored() {
        let contract = ContractBuilder::new("rides")
            .check("uniqueness", json!({"fields": ["ride_id"]}))
            .build();
        let batch = Batch::new(vec![Column::new(
            "pickup_datetime",
            vec![DataValue::from(Utc::now())],
        )])
        .unwrap();

        let results = run_validations(&batch, &contract);

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(ValidationResult::passed));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("distribution"), "Distribution");
        assert_eq!(capitalize(""), "");
    }
}
