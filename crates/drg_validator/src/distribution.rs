//! Distribution drift check using the Population Stability Index.
//!
//! Both samples are histogrammed over equal-width bins spanning the reference
//! range. Bins are half-open `[lo, hi)` except the last, which is closed.
//! Current values outside the reference range fall in no bin but still count
//! toward the total, so heavy drift out of range lowers every proportion.

use crate::{Batch, CheckExecutionError, Column, DataValue, read_parquet};
use drg_core::{CheckName, DistributionCheck, MAX_PSI_BUCKETS, Metric, ValidationResult};
use std::path::Path;
use tracing::debug;

/// Floor applied to empty bin proportions so the logarithm stays finite.
pub const PSI_EPSILON: f64 = 0.0001;

/// Validates a numeric column against the distribution of a reference dataset.
pub struct DistributionValidator;

impl DistributionValidator {
    /// Creates a new distribution validator.
    pub fn new() -> Self {
        Self
    }

    /// Runs the PSI comparison configured by `check`.
    ///
    /// An incomplete configuration, or a column absent from the batch, skips the
    /// check: it passes with a metric of `0` and a `skip` detail.
    ///
    /// # Errors
    ///
    /// Reading the reference, a column absent from the reference, an empty or
    /// non-numeric column all fail the computation.
    pub fn validate(
        &self,
        check: &DistributionCheck,
        batch: &Batch,
    ) -> Result<ValidationResult, CheckExecutionError> {
        let (column, reference_path) = match self.resolve(check, batch) {
            Ok(resolved) => resolved,
            Err(reason) => {
                debug!(reason = %reason, "Skipping distribution check");
                return Ok(
                    ValidationResult::pass(CheckName::Distribution, Metric::Score(0.0))
                        .with_detail("skip", reason),
                );
            }
        };

        let reference = read_parquet(reference_path).map_err(|source| {
            CheckExecutionError::Reference {
                path: reference_path.to_path_buf(),
                source,
            }
        })?;
        let reference_column = reference
            .column(column.name())
            .ok_or_else(|| CheckExecutionError::ReferenceColumnMissing(column.name().to_string()))?;

        let expected = numeric_values(reference_column, "reference")?;
        let actual = numeric_values(column, "current")?;
        let score = population_stability_index(&expected, &actual, check.buckets)?;

        Ok(ValidationResult::new(
            CheckName::Distribution,
            score <= check.threshold,
            Metric::Score(round4(score)),
        )
        .with_detail("threshold", check.threshold)
        .with_detail("column", column.name()))
    }

    fn resolve<'a>(
        &self,
        check: &'a DistributionCheck,
        batch: &'a Batch,
    ) -> Result<(&'a Column, &'a Path), String> {
        match check.method.as_deref() {
            Some("psi") => {}
            Some(other) => return Err(format!("unsupported method '{other}'")),
            None => return Err("no method configured".to_string()),
        }
        let name = check
            .column
            .as_deref()
            .ok_or_else(|| "no column configured".to_string())?;
        let reference_path = check
            .reference_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| "no reference_path configured".to_string())?;
        let column = batch
            .column(name)
            .ok_or_else(|| format!("column '{name}' missing in batch"))?;
        Ok((column, reference_path))
    }
}

impl Default for DistributionValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Extracts the numeric values of a column, dropping nulls and NaN.
fn numeric_values(column: &Column, side: &'static str) -> Result<Vec<f64>, CheckExecutionError> {
    let mut values = Vec::with_capacity(column.len());
    for value in column.non_null() {
        match value {
            DataValue::Int(i) => values.push(*i as f64),
            DataValue::Float(f) if f.is_nan() => {}
            DataValue::Float(f) => values.push(*f),
            other => {
                return Err(CheckExecutionError::NonNumeric {
                    column: column.name().to_string(),
                    found: other.type_name(),
                });
            }
        }
    }

    if values.is_empty() {
        return Err(CheckExecutionError::EmptyColumn {
            column: column.name().to_string(),
            side,
        });
    }
    Ok(values)
}

/// Computes `Σ (e - a) · ln(e / a)` over `buckets` equal-width bins.
///
/// `e` and `a` are the per-bin proportions of `expected` and `actual`, each
/// floored at [`PSI_EPSILON`]. Bin edges span the min and max of `expected`.
/// When that range has zero width, only values equal to it are counted, all in
/// the last bin.
///
/// # Errors
///
/// Fails on an empty sample, or a bucket count of zero or above
/// [`MAX_PSI_BUCKETS`].
pub fn population_stability_index(
    expected: &[f64],
    actual: &[f64],
    buckets: usize,
) -> Result<f64, CheckExecutionError> {
    if buckets == 0 || buckets > MAX_PSI_BUCKETS {
        return Err(CheckExecutionError::InvalidBuckets(buckets));
    }
    if expected.is_empty() || actual.is_empty() {
        let side = if expected.is_empty() { "reference" } else { "current" };
        return Err(CheckExecutionError::EmptySample(side));
    }

    let min = expected.iter().copied().fold(f64::INFINITY, f64::min);
    let max = expected.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let edges: Vec<f64> = (0..=buckets)
        .map(|i| min + (max - min) * i as f64 / buckets as f64)
        .collect();

    let expected_pct = proportions(expected, &edges);
    let actual_pct = proportions(actual, &edges);

    Ok(expected_pct
        .iter()
        .zip(&actual_pct)
        .map(|(e, a)| (e - a) * (e / a).ln())
        .sum())
}

fn proportions(values: &[f64], edges: &[f64]) -> Vec<f64> {
    let buckets = edges.len() - 1;
    let (first, last) = (edges[0], edges[buckets]);

    let mut counts = vec![0usize; buckets];
    for &value in values {
        if value < first || value > last {
            continue;
        }
        let bin = if value == last {
            buckets - 1
        } else {
            edges.partition_point(|edge| *edge <= value).saturating_sub(1)
        };
        counts[bin.min(buckets - 1)] += 1;
    }

    let total = values.len() as f64;
    counts
        .into_iter()
        .map(|count| {
            let pct = count as f64 / total;
            if pct == 0.0 { PSI_EPSILON } else { pct }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write_parquet;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn fares(n: usize) -> Vec<f64> {
        (0..n).map(|i| 5.0 + (i % 46) as f64).collect()
    }

    fn write_reference(dir: &TempDir, column: &str, values: Vec<f64>) -> std::path::PathBuf {
        let path = dir.path().join("reference.parquet");
        let batch = Batch::new(vec![Column::from_values(column, values)]).unwrap();
        write_parquet(&batch, &path).unwrap();
        path
    }

    #[test]
    fn test_identical_samples_score_zero() {
        let values = fares(500);
        let score = population_stability_index(&values, &values, 10).unwrap();
        assert!(score.abs() < 1e-12, "score = {score}");
    }

    #[test]
    fn test_out_of_range_spike_exceeds_threshold() {
        let reference = fares(1_000);
        let current: Vec<f64> = reference
            .iter()
            .enumerate()
            .map(|(i, v)| if i % 2 == 0 { v * 100.0 } else { *v })
            .collect();

        let score = population_stability_index(&reference, &current, 10).unwrap();

        assert!(score > 0.2, "score = {score}");
    }

    #[test]
    fn test_zero_width_reference() {
        let reference = vec![3.0; 10];

        let same = population_stability_index(&reference, &[3.0, 3.0], 10).unwrap();
        assert!(same.abs() < 1e-12);

        let shifted = population_stability_index(&reference, &[4.0, 4.0], 10).unwrap();
        assert!(shifted > 0.2);
    }

    #[test]
    fn test_last_edge_is_closed() {
        let edges = [0.0, 0.5, 1.0];
        assert_eq!(proportions(&[1.0, 0.5, 0.0, 2.0], &edges), vec![0.25, 0.5]);
    }

    #[test]
    fn test_bucket_count_out_of_range_rejected() {
        assert!(matches!(
            population_stability_index(&[1.0], &[1.0], 0),
            Err(CheckExecutionError::InvalidBuckets(0))
        ));
        assert!(matches!(
            population_stability_index(&[1.0], &[1.0], MAX_PSI_BUCKETS + 1),
            Err(CheckExecutionError::InvalidBuckets(n)) if n == MAX_PSI_BUCKETS + 1
        ));
        assert!(matches!(
            population_stability_index(&[1.0], &[1.0], usize::MAX),
            Err(CheckExecutionError::InvalidBuckets(usize::MAX))
        ));
        assert!(population_stability_index(&[1.0, 2.0], &[1.0], MAX_PSI_BUCKETS).is_ok());
    }

    #[test]
    fn test_incomplete_config_skips() {
        let batch = Batch::new(vec![Column::from_values("fare_amount", [1.0, 2.0])]).unwrap();
        let validator = DistributionValidator::new();

        let no_path = DistributionCheck {
            reference_path: None,
            ..DistributionCheck::psi("fare_amount", "")
        };
        let empty_path = DistributionCheck::psi("fare_amount", "");
        let other_method = DistributionCheck {
            method: Some("ks".to_string()),
            ..DistributionCheck::psi("fare_amount", "ref.parquet")
        };
        let absent_column = DistributionCheck::psi("tip_amount", "ref.parquet");

        for check in [no_path, empty_path, other_method, absent_column] {
            let result = validator.validate(&check, &batch).unwrap();
            assert!(result.passed());
            assert_eq!(result.metric(), Metric::Score(0.0));
            assert!(result.detail("skip").is_some());
        }
    }

    #[test]
    fn test_matching_reference_passes() {
        let dir = TempDir::new().unwrap();
        let path = write_reference(&dir, "fare_amount", fares(200));
        let batch = Batch::new(vec![Column::from_values("fare_amount", fares(200))]).unwrap();

        let result = DistributionValidator::new()
            .validate(&DistributionCheck::psi("fare_amount", &path), &batch)
            .unwrap();

        assert!(result.passed());
        assert_eq!(result.metric(), Metric::Score(0.0));
        assert_eq!(result.detail("threshold"), Some(&json!(0.2)));
    }

    #[test]
    fn test_drifted_batch_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_reference(&dir, "fare_amount", fares(200));
        let drifted: Vec<f64> = fares(200).into_iter().map(|v| v + 30.0).collect();
        let batch = Batch::new(vec![Column::from_values("fare_amount", drifted)]).unwrap();

        let result = DistributionValidator::new()
            .validate(&DistributionCheck::psi("fare_amount", &path), &batch)
            .unwrap();

        assert!(!result.passed());
        assert!(result.metric().as_f64().unwrap() > 0.2);
    }

    #[test]
    fn test_unsigned_batch_column_matches_float_reference() {
        use arrow_array::{ArrayRef, RecordBatch, UInt32Array};
        use arrow_schema::{DataType, Field, Schema};
        use parquet::arrow::ArrowWriter;
        use std::sync::Arc;

        let dir = TempDir::new().unwrap();
        let reference_fares = (1..=1000u32).map(f64::from).collect();
        let reference = write_reference(&dir, "fare_amount", reference_fares);

        let current_path = dir.path().join("current.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new(
            "fare_amount",
            DataType::UInt32,
            false,
        )]));
        let fares: ArrayRef = Arc::new(UInt32Array::from_iter_values(1..=1000));
        let record = RecordBatch::try_new(schema.clone(), vec![fares]).unwrap();
        let file = std::fs::File::create(&current_path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&record).unwrap();
        writer.close().unwrap();
        let batch = read_parquet(&current_path).unwrap();

        let result = DistributionValidator::new()
            .validate(&DistributionCheck::psi("fare_amount", &reference), &batch)
            .unwrap();

        assert!(result.passed());
        assert_eq!(result.metric(), Metric::Score(0.0));
    }

    #[test]
    fn test_reference_column_missing() {
        let dir = TempDir::new().unwrap();
        let path = write_reference(&dir, "total_amount", fares(20));
        let batch = Batch::new(vec![Column::from_values("fare_amount", fares(20))]).unwrap();

        let err = DistributionValidator::new()
            .validate(&DistributionCheck::psi("fare_amount", &path), &batch)
            .unwrap_err();

        assert!(matches!(err, CheckExecutionError::ReferenceColumnMissing(_)));
    }

    #[test]
    fn test_unreadable_reference() {
        let dir = TempDir::new().unwrap();
        let batch = Batch::new(vec![Column::from_values("fare_amount", fares(20))]).unwrap();
        let check = DistributionCheck::psi("fare_amount", dir.path().join("absent.parquet"));

        let err = DistributionValidator::new().validate(&check, &batch).unwrap_err();

        assert!(matches!(err, CheckExecutionError::Reference { .. }));
    }

    #[test]
    fn test_non_numeric_column() {
        let dir = TempDir::new().unwrap();
        let path = write_reference(&dir, "fare_amount", fares(20));
        let fares = Column::from_values("fare_amount", ["cheap", "dear"]);
        let batch = Batch::new(vec![fares]).unwrap();

        let err = DistributionValidator::new()
            .validate(&DistributionCheck::psi("fare_amount", &path), &batch)
            .unwrap_err();

        assert!(matches!(err, CheckExecutionError::NonNumeric { found: "string", .. }));
    }
}
