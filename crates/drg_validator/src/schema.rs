//! Schema presence check.
//!
//! Only presence of required columns is checked. Declared types and bounds are
//! descriptive and not enforced here.

use crate::Batch;
use drg_core::{CheckName, Metric, SchemaField, ValidationResult};
use serde_json::Value;

/// Validates that every required field exists as a column of the batch.
pub struct SchemaValidator;

impl SchemaValidator {
    /// Creates a new schema validator.
    pub fn new() -> Self {
        Self
    }

    /// Checks required fields against the batch columns.
    ///
    /// The metric is the number of missing required fields; on failure the
    /// details list them under `missing` in declaration order.
    pub fn validate(&self, schema: &[SchemaField], batch: &Batch) -> ValidationResult {
        let missing: Vec<&str> = schema
            .iter()
            .filter(|field| field.required && !batch.has_column(&field.name))
            .map(|field| field.name.as_str())
            .collect();

        let metric = Metric::Count(missing.len() as u64);
        if missing.is_empty() {
            return ValidationResult::pass(CheckName::SchemaPresence, metric);
        }

        let missing: Vec<Value> = missing.into_iter().map(Value::from).collect();
        ValidationResult::fail(CheckName::SchemaPresence, metric).with_detail("missing", missing)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Column;
    use drg_core::SchemaFieldBuilder;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rides_schema() -> Vec<SchemaField> {
        vec![
            SchemaFieldBuilder::new("vendor_id", "integer").required(true).build(),
            SchemaFieldBuilder::new("pickup_datetime", "timestamp").required(true).build(),
            SchemaFieldBuilder::new("store_and_fwd_flag", "string").build(),
        ]
    }

    #[test]
    fn test_all_required_present() {
        let batch = Batch::new(vec![
            Column::from_values("vendor_id", [1i64]),
            Column::from_values("pickup_datetime", ["2024-01-15 10:30:00"]),
        ])
        .unwrap();

        let result = SchemaValidator::new().validate(&rides_schema(), &batch);

        assert!(result.passed());
        assert_eq!(result.metric(), Metric::Count(0));
        assert!(result.details().is_empty());
    }

    #[test]
    fn test_missing_required_fields_in_declaration_order() {
        let batch = Batch::new(vec![Column::from_values("provider_id", [1i64])]).unwrap();

        let result = SchemaValidator::new().validate(&rides_schema(), &batch);

        assert!(!result.passed());
        assert_eq!(result.metric(), Metric::Count(2));
        assert_eq!(
            result.detail("missing"),
            Some(&json!(["vendor_id", "pickup_datetime"]))
        );
    }

    #[test]
    fn test_optional_field_absence_is_fine() {
        let batch = Batch::with_columns(["vendor_id", "pickup_datetime"]).unwrap();

        let result = SchemaValidator::new().validate(&rides_schema(), &batch);

        assert!(result.passed());
    }

    #[test]
    fn test_empty_schema_always_passes() {
        let result = SchemaValidator::new().validate(&[], &Batch::empty());

        assert!(result.passed());
        assert_eq!(result.metric(), Metric::Count(0));
    }
}
