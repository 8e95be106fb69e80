//! Builder pattern for creating data contracts.
//!
//! This module provides ergonomic builders for constructing contracts
//! and their schema fields with a fluent API.

use crate::{
    Checks, Contract, DEFAULT_OWNER, DistributionCheck, FreshnessCheck, SchemaField, VolumeCheck,
};

/// Builder for creating a `Contract`.
///
/// # Example
///
/// ```rust
/// use drg_core::{ContractBuilder, DistributionCheck};
///
/// let contract = ContractBuilder::new("nyc_taxi_rides")
///     .owner("data-platform")
///     .volume(100, None)
///     .distribution(DistributionCheck::psi("fare_amount", "data/reference/rides.parquet"))
///     .build();
///
/// assert_eq!(contract.checks.kinds(), vec!["distribution", "volume"]);
/// ```
#[derive(Debug)]
pub struct ContractBuilder {
    dataset_id: String,
    owner: String,
    schema: Vec<SchemaField>,
    checks: Checks,
}

impl ContractBuilder {
    /// Creates a new contract builder for a dataset.
    ///
    /// The owner defaults to `"unknown"`.
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            owner: DEFAULT_OWNER.to_string(),
            schema: Vec::new(),
            checks: Checks::default(),
        }
    }

    /// Sets the contract owner.
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Adds a field to the schema.
    pub fn field(mut self, field: SchemaField) -> Self {
        self.schema.push(field);
        self
    }

    /// Adds multiple fields to the schema.
    pub fn fields(mut self, fields: Vec<SchemaField>) -> Self {
        self.schema.extend(fields);
        self
    }

    /// Configures the volume check.
    pub fn volume(mut self, min_rows: u64, max_rows: Option<u64>) -> Self {
        self.checks.volume = Some(VolumeCheck { min_rows, max_rows });
        self
    }

    /// Configures the freshness check on the default timestamp column.
    pub fn freshness(mut self, max_delay_hours: f64) -> Self {
        self.checks.freshness = Some(FreshnessCheck {
            max_delay_hours,
            ..Default::default()
        });
        self
    }

    /// Configures the freshness check with an explicit record.
    pub fn freshness_check(mut self, check: FreshnessCheck) -> Self {
        self.checks.freshness = Some(check);
        self
    }

    /// Configures the distribution check.
    pub fn distribution(mut self, check: DistributionCheck) -> Self {
        self.checks.distribution = Some(check);
        self
    }

    /// Adds an opaque check kind this engine does not evaluate.
    pub fn check(mut self, kind: impl Into<String>, config: serde_json::Value) -> Self {
        self.checks.other.insert(kind.into(), config);
        self
    }

    /// Builds the contract.
    pub fn build(self) -> Contract {
        Contract {
            dataset_id: self.dataset_id,
            owner: self.owner,
            schema: self.schema,
            checks: self.checks,
        }
    }
}

/// Builder for creating a `SchemaField`.
///
/// # Example
///
/// ```rust
/// use drg_core::SchemaFieldBuilder;
///
/// let field = SchemaFieldBuilder::new("fare_amount", "float")
///     .required(true)
///     .bounds(0.0, 500.0)
///     .build();
///
/// assert_eq!(field.max, Some(500.0));
/// ```
#[derive(Debug)]
pub struct SchemaFieldBuilder {
    name: String,
    field_type: String,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
}

impl SchemaFieldBuilder {
    /// Creates a new optional field.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            required: false,
            min: None,
            max: None,
        }
    }

    /// Sets whether the field must be present.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the lower bound.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets the upper bound.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets both bounds.
    pub fn bounds(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    /// Builds the field.
    pub fn build(self) -> SchemaField {
        SchemaField {
            name: self.name,
            field_type: self.field_type,
            required: self.required,
            min: self.min,
            max: self.max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_contract_builder_minimal() {
        let contract = ContractBuilder::new("rides").build();

        assert_eq!(contract.dataset_id, "rides");
        assert_eq!(contract.owner, "unknown");
        assert!(contract.schema.is_empty());
        assert_eq!(contract.checks, Checks::default());
        assert!(contract.checks.kinds().is_empty());
    }

    #[test]
    fn test_contract_builder_full() {
        let contract = ContractBuilder::new("rides")
            .owner("data-platform")
            .field(SchemaFieldBuilder::new("vendor_id", "integer").required(true).build())
            .fields(vec![
                SchemaFieldBuilder::new("fare_amount", "float").bounds(0.0, 500.0).build(),
                SchemaFieldBuilder::new("notes", "string").build(),
            ])
            .volume(10, Some(1_000))
            .freshness(6.0)
            .distribution(DistributionCheck::psi("fare_amount", "ref.parquet").with_threshold(0.1))
            .check("uniqueness", serde_json::json!({"fields": ["ride_id"]}))
            .build();

        assert_eq!(contract.owner, "data-platform");
        assert_eq!(contract.schema.len(), 3);
        assert_eq!(contract.required_fields().count(), 1);
        assert_eq!(
            contract.checks.volume,
            Some(VolumeCheck {
                min_rows: 10,
                max_rows: Some(1_000)
            })
        );
        assert_eq!(contract.checks.freshness_or_default().max_delay_hours, 6.0);
        let distribution = contract.checks.distribution.as_ref().unwrap();
        assert_eq!(distribution.threshold, 0.1);
        assert_eq!(distribution.buckets, 10);
        assert_eq!(
            contract.checks.kinds(),
            vec!["distribution", "freshness", "uniqueness", "volume"]
        );
        assert!(contract.validate_definition().is_ok());
    }

    #[test]
    fn test_field_builder_defaults() {
        let field = SchemaFieldBuilder::new("id", "string").build();

        assert_eq!(field.name, "id");
        assert_eq!(field.field_type, "string");
        assert!(!field.required);
        assert_eq!(field.min, None);
        assert_eq!(field.max, None);
    }
}
