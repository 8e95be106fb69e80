//! Data contract types and structures.
//!
//! This module contains the core types for defining data contracts: the schema a
//! batch must expose and the typed configuration of each quality check.

use crate::{ContractError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Owner recorded when a contract does not name one.
pub const DEFAULT_OWNER: &str = "unknown";

/// Column the freshness check reads event times from unless configured otherwise.
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "pickup_datetime";

/// Default freshness bound in hours.
pub const DEFAULT_MAX_DELAY_HOURS: f64 = 24.0;

/// Default PSI threshold for the distribution check.
pub const DEFAULT_PSI_THRESHOLD: f64 = 0.2;

/// Default number of PSI buckets.
pub const DEFAULT_PSI_BUCKETS: usize = 10;

/// Largest accepted number of PSI buckets.
pub const MAX_PSI_BUCKETS: usize = 1_000;

/// A data contract defining the expected shape and thresholds of a dataset.
///
/// A `Contract` is immutable once loaded and is consumed once per validation
/// invocation.
///
/// # Example
///
/// ```rust
/// use drg_core::{Checks, Contract, SchemaField};
///
/// let contract = Contract {
///     dataset_id: "nyc_taxi_rides".to_string(),
///     owner: "data-platform".to_string(),
///     schema: vec![SchemaField {
///         name: "vendor_id".to_string(),
///         field_type: "integer".to_string(),
///         required: true,
///         min: None,
///         max: None,
///     }],
///     checks: Checks::default(),
/// };
///
/// assert!(contract.validate_definition().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Identifier of the dataset this contract governs
    pub dataset_id: String,

    /// Team or individual responsible for this contract
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Ordered field definitions, names unique
    #[serde(default)]
    pub schema: Vec<SchemaField>,

    /// Check configuration keyed by check kind
    #[serde(default)]
    pub checks: Checks,
}

impl Contract {
    /// Returns the fields marked as required, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.schema.iter().filter(|field| field.required)
    }

    /// Checks that the definition itself is usable.
    ///
    /// The dataset identifier and every field's name and type must be non-empty,
    /// and field names must be unique. A distribution check must use between 1
    /// and [`MAX_PSI_BUCKETS`] buckets.
    pub fn validate_definition(&self) -> Result<()> {
        if self.dataset_id.trim().is_empty() {
            return Err(ContractError::EmptyValue("dataset_id".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.schema {
            if field.name.trim().is_empty() {
                return Err(ContractError::EmptyValue("schema.name".to_string()));
            }
            if field.field_type.trim().is_empty() {
                return Err(ContractError::EmptyValue(format!(
                    "schema.{}.type",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ContractError::DuplicateField(field.name.clone()));
            }
        }

        let buckets = self.checks.distribution.as_ref().map(|check| check.buckets);
        if let Some(buckets) = buckets.filter(|n| !(1..=MAX_PSI_BUCKETS).contains(n)) {
            return Err(ContractError::InvalidBuckets(buckets));
        }

        Ok(())
    }
}

fn default_owner() -> String {
    DEFAULT_OWNER.to_string()
}

/// A single field definition in a contract schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name, unique within a contract
    pub name: String,

    /// Semantic type tag (e.g., "integer", "float", "string", "timestamp")
    #[serde(rename = "type")]
    pub field_type: String,

    /// Whether the field must be present in every batch
    #[serde(default)]
    pub required: bool,

    /// Optional lower bound for numeric fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Optional upper bound for numeric fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Check configuration keyed by check kind.
///
/// The recognized kinds carry strongly-typed records. Any other key is kept
/// verbatim in `other` so that contracts written for newer engines still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checks {
    /// Row-count bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeCheck>,

    /// Maximum age of the newest event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness: Option<FreshnessCheck>,

    /// Distribution drift against a reference dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<DistributionCheck>,

    /// Unrecognized check kinds, preserved opaquely
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl Checks {
    /// Returns true if `kind` is a key of the check configuration.
    pub fn contains(&self, kind: &str) -> bool {
        match kind {
            "volume" => self.volume.is_some(),
            "freshness" => self.freshness.is_some(),
            "distribution" => self.distribution.is_some(),
            other => self.other.contains_key(other),
        }
    }

    /// Lists every configured check kind, sorted by name.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = [
            ("volume", self.volume.is_some()),
            ("freshness", self.freshness.is_some()),
            ("distribution", self.distribution.is_some()),
        ]
        .into_iter()
        .filter_map(|(kind, present)| present.then_some(kind))
        .chain(self.other.keys().map(String::as_str))
        .collect();
        kinds.sort_unstable();
        kinds
    }

    /// Volume configuration, falling back to the unbounded default.
    pub fn volume_or_default(&self) -> VolumeCheck {
        self.volume.clone().unwrap_or_default()
    }

    /// Freshness configuration, falling back to the 24 hour default.
    pub fn freshness_or_default(&self) -> FreshnessCheck {
        self.freshness.clone().unwrap_or_default()
    }
}

/// Volume check bounding the number of rows in a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeCheck {
    /// Minimum row count (inclusive), 0 when absent
    #[serde(default)]
    pub min_rows: u64,

    /// Maximum row count (inclusive), unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
}

impl VolumeCheck {
    /// Returns true if `count` lies within the configured bounds.
    pub fn admits(&self, count: u64) -> bool {
        self.min_rows <= count && self.max_rows.is_none_or(|max| count <= max)
    }
}

/// Freshness check to ensure data is up-to-date.
///
/// Validates that the newest event in the batch is no older than
/// `max_delay_hours` at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessCheck {
    /// Maximum allowed delay in hours
    #[serde(default = "default_max_delay_hours")]
    pub max_delay_hours: f64,

    /// Column holding event timestamps
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
}

impl Default for FreshnessCheck {
    fn default() -> Self {
        Self {
            max_delay_hours: DEFAULT_MAX_DELAY_HOURS,
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
        }
    }
}

fn default_max_delay_hours() -> f64 {
    DEFAULT_MAX_DELAY_HOURS
}

fn default_timestamp_column() -> String {
    DEFAULT_TIMESTAMP_COLUMN.to_string()
}

/// Distribution drift check against a reference dataset.
///
/// Every field is optional at load time. An incomplete configuration makes the
/// check skip instead of failing the contract load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionCheck {
    /// Drift method, only "psi" is evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Numeric column compared between reference and batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// Maximum accepted PSI score (inclusive)
    #[serde(default = "default_psi_threshold")]
    pub threshold: f64,

    /// Path of the reference dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_path: Option<PathBuf>,

    /// Number of equal-width bins over the reference range
    #[serde(default = "default_psi_buckets")]
    pub buckets: usize,
}

impl DistributionCheck {
    /// Creates a PSI check on `column` against the dataset at `reference_path`.
    pub fn psi(column: impl Into<String>, reference_path: impl Into<PathBuf>) -> Self {
        Self {
            method: Some("psi".to_string()),
            column: Some(column.into()),
            reference_path: Some(reference_path.into()),
            ..Default::default()
        }
    }

    /// Sets the PSI threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the number of buckets.
    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }
}

impl Default for DistributionCheck {
    fn default() -> Self {
        Self {
            method: None,
            column: None,
            threshold: DEFAULT_PSI_THRESHOLD,
            reference_path: None,
            buckets: DEFAULT_PSI_BUCKETS,
        }
    }
}

fn default_psi_threshold() -> f64 {
    DEFAULT_PSI_THRESHOLD
}

fn default_psi_buckets() -> usize {
    DEFAULT_PSI_BUCKETS
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(name: &str, required: bool) -> SchemaField {
        SchemaField {
            name: name.to_string(),
            field_type: "string".to_string(),
            required,
            min: None,
            max: None,
        }
    }

    fn contract(schema: Vec<SchemaField>) -> Contract {
        Contract {
            dataset_id: "rides".to_string(),
            owner: DEFAULT_OWNER.to_string(),
            schema,
            checks: Checks::default(),
        }
    }

    #[test]
    fn test_required_fields_keep_declaration_order() {
        let contract = contract(vec![
            field("c", true),
            field("a", false),
            field("b", true),
        ]);

        let names: Vec<&str> = contract
            .required_fields()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let contract = contract(vec![field("id", true), field("id", false)]);

        let err = contract.validate_definition().unwrap_err();
        assert!(matches!(err, ContractError::DuplicateField(name) if name == "id"));
    }

    #[test]
    fn test_empty_dataset_id_rejected() {
        let mut contract = contract(vec![]);
        contract.dataset_id = "  ".to_string();

        assert!(matches!(
            contract.validate_definition(),
            Err(ContractError::EmptyValue(_))
        ));
    }

    #[test]
    fn test_psi_bucket_count_bounded() {
        let mut contract = contract(vec![]);
        for buckets in [1, DEFAULT_PSI_BUCKETS, MAX_PSI_BUCKETS] {
            contract.checks.distribution =
                Some(DistributionCheck::psi("fare_amount", "ref.parquet").with_buckets(buckets));
            assert!(contract.validate_definition().is_ok(), "buckets = {buckets}");
        }

        for buckets in [0, MAX_PSI_BUCKETS + 1, usize::MAX] {
            contract.checks.distribution =
                Some(DistributionCheck::psi("fare_amount", "ref.parquet").with_buckets(buckets));
            assert!(matches!(
                contract.validate_definition(),
                Err(ContractError::InvalidBuckets(n)) if n == buckets
            ));
        }
    }

    #[test]
    fn test_volume_bounds() {
        let unbounded = VolumeCheck::default();
        assert!(unbounded.admits(0));
        assert!(unbounded.admits(u64::MAX));

        let bounded = VolumeCheck {
            min_rows: 5,
            max_rows: Some(20),
        };
        assert!(!bounded.admits(4));
        assert!(bounded.admits(5));
        assert!(bounded.admits(20));
        assert!(!bounded.admits(21));
    }

    #[test]
    fn test_checks_kinds_include_unknown() {
        let mut checks = Checks {
            volume: Some(VolumeCheck::default()),
            ..Default::default()
        };
        checks
            .other
            .insert("uniqueness".to_string(), serde_json::json!({"fields": ["id"]}));

        assert!(checks.contains("volume"));
        assert!(checks.contains("uniqueness"));
        assert!(!checks.contains("distribution"));
        assert_eq!(checks.kinds(), vec!["uniqueness", "volume"]);
    }

    #[test]
    fn test_checks_from_json_preserves_unknown_kinds() {
        let checks: Checks = serde_json::from_value(serde_json::json!({
            "volume": {"min_rows": 10},
            "freshness": {},
            "row_hash": {"algorithm": "xxh3"}
        }))
        .unwrap();

        assert_eq!(checks.volume_or_default().min_rows, 10);
        assert_eq!(checks.volume_or_default().max_rows, None);
        assert_eq!(checks.freshness_or_default().max_delay_hours, 24.0);
        assert_eq!(
            checks.freshness_or_default().timestamp_column,
            "pickup_datetime"
        );
        assert!(checks.distribution.is_none());
        assert_eq!(
            checks.other.get("row_hash"),
            Some(&serde_json::json!({"algorithm": "xxh3"}))
        );
    }

    #[test]
    fn test_distribution_defaults() {
        let check: DistributionCheck =
            serde_json::from_value(serde_json::json!({"method": "psi"})).unwrap();

        assert_eq!(check.threshold, 0.2);
        assert_eq!(check.buckets, 10);
        assert!(check.column.is_none());
        assert!(check.reference_path.is_none());
    }
}
