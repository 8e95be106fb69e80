//! Per-check validation outcomes.

use crate::ContractError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Auxiliary diagnostic data attached to a check outcome.
pub type Details = serde_json::Map<String, serde_json::Value>;

/// The fixed set of checks the validation engine runs, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    /// Required schema fields are present as columns
    SchemaPresence,
    /// Row count within bounds
    Volume,
    /// Newest event recent enough
    Freshness,
    /// Column distribution close to a reference
    Distribution,
}

impl CheckName {
    /// Returns the wire name of the check.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::SchemaPresence => "schema_presence",
            CheckName::Volume => "volume",
            CheckName::Freshness => "freshness",
            CheckName::Distribution => "distribution",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckName {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schema_presence" => Ok(CheckName::SchemaPresence),
            "volume" => Ok(CheckName::Volume),
            "freshness" => Ok(CheckName::Freshness),
            "distribution" => Ok(CheckName::Distribution),
            other => Err(ContractError::UnknownCheck(other.to_string())),
        }
    }
}

/// The measured value of a check. Its meaning depends on the check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// A count (missing fields, rows)
    Count(u64),
    /// A delay in hours
    Hours(f64),
    /// A score (PSI); `-1` marks a check that could not be computed
    Score(f64),
    /// No measurement could be taken
    NotAvailable,
}

impl Metric {
    /// Returns the numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Metric::Count(n) => Some(*n as f64),
            Metric::Hours(v) | Metric::Score(v) => Some(*v),
            Metric::NotAvailable => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Count(n) => write!(f, "{n}"),
            Metric::Hours(v) | Metric::Score(v) => write!(f, "{v}"),
            Metric::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Count(n) => serializer.serialize_u64(*n),
            Metric::Hours(v) | Metric::Score(v) => serializer.serialize_f64(*v),
            Metric::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

/// Outcome of one check against one batch.
///
/// Produced once per check per invocation and never mutated afterwards; the
/// `with_detail` helper consumes the value while it is being built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    check_name: CheckName,
    passed: bool,
    metric: Metric,
    details: Details,
}

impl ValidationResult {
    /// Creates a result with no details.
    pub fn new(check_name: CheckName, passed: bool, metric: Metric) -> Self {
        Self {
            check_name,
            passed,
            metric,
            details: Details::new(),
        }
    }

    /// Creates a passing result.
    pub fn pass(check_name: CheckName, metric: Metric) -> Self {
        Self::new(check_name, true, metric)
    }

    /// Creates a failing result.
    pub fn fail(check_name: CheckName, metric: Metric) -> Self {
        Self::new(check_name, false, metric)
    }

    /// Attaches a diagnostic entry.
    pub fn with_detail(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Which check produced this result.
    pub fn check_name(&self) -> CheckName {
        self.check_name
    }

    /// Whether the check passed.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// The measured value.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// All diagnostic entries.
    pub fn details(&self) -> &Details {
        &self.details
    }

    /// A single diagnostic entry.
    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }
}
