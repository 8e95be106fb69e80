//! Batch representation for validation.
//!
//! A [`Batch`] is a table of named columns with a common row count. Column types
//! are whatever the producing system provided; checks interpret values on read.

use crate::DatasetError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// A value in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// Null/missing value
    Null,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Timestamp value, normalized to UTC
    Timestamp(DateTime<Utc>),
}

impl DataValue {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::Null => "null",
            DataValue::String(_) => "string",
            DataValue::Int(_) => "int64",
            DataValue::Float(_) => "float64",
            DataValue::Bool(_) => "boolean",
            DataValue::Timestamp(_) => "timestamp",
        }
    }

    /// Attempts to get this value as a string.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DataValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            DataValue::Float(f) => Some(*f),
            DataValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get this value as a timestamp.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            DataValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::String(s)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::String(s.to_string())
    }
}

impl From<i64> for DataValue {
    fn from(i: i64) -> Self {
        DataValue::Int(i)
    }
}

impl From<f64> for DataValue {
    fn from(f: f64) -> Self {
        DataValue::Float(f)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for DataValue {
    fn from(ts: DateTime<Utc>) -> Self {
        DataValue::Timestamp(ts)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DataValue::Null, Into::into)
    }
}

/// A single named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<DataValue>,
}

impl Column {
    /// Creates a column from its values.
    pub fn new(name: impl Into<String>, values: Vec<DataValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Creates a column from anything convertible into values.
    pub fn from_values<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DataValue>,
    {
        Self::new(name, values.into_iter().map(Into::into).collect())
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All values, nulls included.
    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    /// Values with nulls dropped.
    pub fn non_null(&self) -> impl Iterator<Item = &DataValue> {
        self.values.iter().filter(|v| !v.is_null())
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn push(&mut self, value: DataValue) {
        self.values.push(value);
    }
}

/// A batch: named columns sharing one row count.
///
/// Column order is preserved as given; names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Batch {
    /// Creates a batch with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a batch from columns.
    ///
    /// # Errors
    ///
    /// Fails when two columns share a name or when column lengths differ.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let num_rows = columns.first().map_or(0, Column::len);

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(DatasetError::DuplicateColumn(column.name().to_string()));
            }
            if column.len() != num_rows {
                return Err(DatasetError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: num_rows,
                    actual: column.len(),
                });
            }
        }

        Ok(Self { columns, num_rows })
    }

    /// Creates a zero-row batch that still exposes the given columns.
    pub fn with_columns<I, S>(names: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| Column::new(name, Vec::new()))
                .collect(),
        )
    }

    /// Returns the number of rows in the batch.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns true if the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    /// Renames a column, keeping its position and values.
    pub fn rename_column(&mut self, from: &str, to: impl Into<String>) -> Result<(), DatasetError> {
        let to = to.into();
        if from != to && self.has_column(&to) {
            return Err(DatasetError::DuplicateColumn(to));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == from)
            .ok_or_else(|| DatasetError::MissingColumn(from.to_string()))?;
        column.name = to;
        Ok(())
    }
}
