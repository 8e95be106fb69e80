//! Row count check.

use crate::Batch;
use drg_core::{CheckName, Metric, ValidationResult, VolumeCheck};
use serde_json::Value;

/// Validates that the batch row count lies within the configured bounds.
pub struct VolumeValidator;

impl VolumeValidator {
    /// Creates a new volume validator.
    pub fn new() -> Self {
        Self
    }

    /// Checks `min_rows <= rows <= max_rows` (inclusive, upper bound optional).
    pub fn validate(&self, check: &VolumeCheck, batch: &Batch) -> ValidationResult {
        let count = batch.num_rows() as u64;
        let max = check.max_rows.map_or(Value::Null, Value::from);

        ValidationResult::new(CheckName::Volume, check.admits(count), Metric::Count(count))
            .with_detail("min", check.min_rows)
            .with_detail("max", max)
    }
}

impl Default for VolumeValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Column;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn batch_of(rows: i64) -> Batch {
        Batch::new(vec![Column::from_values("id", 0..rows)]).unwrap()
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let check = VolumeCheck {
            min_rows: 3,
            max_rows: Some(5),
        };
        let validator = VolumeValidator::new();

        assert!(!validator.validate(&check, &batch_of(2)).passed());
        assert!(validator.validate(&check, &batch_of(3)).passed());
        assert!(validator.validate(&check, &batch_of(5)).passed());
        assert!(!validator.validate(&check, &batch_of(6)).passed());
    }

    #[test]
    fn test_metric_is_exact_row_count() {
        let check = VolumeCheck {
            min_rows: 0,
            max_rows: None,
        };

        let result = VolumeValidator::new().validate(&check, &batch_of(1_234));

        assert!(result.passed());
        assert_eq!(result.metric(), Metric::Count(1_234));
        assert_eq!(result.detail("min"), Some(&json!(0)));
        assert_eq!(result.detail("max"), Some(&Value::Null));
    }

    #[test]
    fn test_empty_batch_fails_positive_minimum() {
        let check = VolumeCheck {
            min_rows: 1,
            max_rows: None,
        };

        let result = VolumeValidator::new().validate(&check, &Batch::empty());

        assert!(!result.passed());
        assert_eq!(result.metric(), Metric::Count(0));
    }
}
