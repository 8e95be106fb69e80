//! Parquet reading and writing for batches.
//!
//! Reading converts each Arrow array cell into a [`DataValue`]. Writing infers
//! one Arrow type per column from its non-null values.

use crate::{Batch, Column, DataValue, DatasetError};
use arrow_array::array::*;
use arrow_array::cast::AsArray;
use arrow_array::{RecordBatch, RecordBatchOptions};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use chrono::DateTime;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads a Parquet file into a batch.
///
/// Supported column types are booleans, signed and unsigned integers, floats
/// of every width, decimals, strings (including views), timestamps of every
/// unit, dates, and dictionaries over any of these. A column of another type is
/// read as nulls, with one warning per column.
///
/// # Errors
///
/// Fails when the file cannot be opened or is not valid Parquet.
pub fn read_parquet(path: &Path) -> Result<Batch, DatasetError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let mut columns: Vec<Column> = Vec::with_capacity(builder.schema().fields().len());
    for field in builder.schema().fields() {
        if !is_supported(field.data_type()) {
            warn!(
                column = %field.name(),
                data_type = ?field.data_type(),
                "Unsupported Arrow type, reading column as nulls"
            );
        }
        columns.push(Column::new(field.name().clone(), Vec::new()));
    }

    for record in builder.build()? {
        let record = record?;
        for (column, array) in columns.iter_mut().zip(record.columns()) {
            for value in arrow_array_to_values(array)? {
                column.push(value);
            }
        }
    }

    let batch = Batch::new(columns)?;
    debug!(
        path = %path.display(),
        rows = batch.num_rows(),
        columns = batch.columns().len(),
        "Read parquet"
    );
    Ok(batch)
}

/// Writes a batch to a Parquet file, replacing any existing file.
///
/// # Errors
///
/// Fails when a column mixes incompatible value types or the file cannot be
/// written.
pub fn write_parquet(batch: &Batch, path: &Path) -> Result<(), DatasetError> {
    let arrays = batch
        .columns()
        .iter()
        .map(column_to_array)
        .collect::<Result<Vec<ArrayRef>, _>>()?;
    let fields: Vec<Field> = batch
        .columns()
        .iter()
        .zip(&arrays)
        .map(|(column, array)| Field::new(column.name(), array.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    let record = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&record)?;
    writer.close()?;
    Ok(())
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> Result<&'a T, DatasetError> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| DatasetError::TypeConversion(format!("Failed to downcast to {name}")))
}

/// Returns true if cells of `data_type` convert to non-null values.
pub fn is_supported(data_type: &DataType) -> bool {
    match data_type {
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Timestamp(_, _)
        | DataType::Date32
        | DataType::Date64 => true,
        DataType::Dictionary(_, value_type) => is_supported(value_type),
        _ => false,
    }
}

/// Converts a whole Arrow array into values.
///
/// Dictionary arrays are decoded through their values array once. Arrays of
/// unsupported types yield nulls.
pub fn arrow_array_to_values(array: &ArrayRef) -> Result<Vec<DataValue>, DatasetError> {
    if !is_supported(array.data_type()) {
        return Ok(vec![DataValue::Null; array.len()]);
    }

    if let Some(dictionary) = array.as_any_dictionary_opt() {
        if dictionary.values().is_empty() {
            return Ok(vec![DataValue::Null; array.len()]);
        }
        let values = arrow_array_to_values(dictionary.values())?;
        return Ok(dictionary
            .normalized_keys()
            .into_iter()
            .enumerate()
            .map(|(row_idx, key)| {
                if array.is_null(row_idx) {
                    DataValue::Null
                } else {
                    values.get(key).cloned().unwrap_or(DataValue::Null)
                }
            })
            .collect());
    }

    (0..array.len())
        .map(|row_idx| arrow_value_to_data_value(array, row_idx))
        .collect()
}

fn unsigned_value(value: u64) -> DataValue {
    i64::try_from(value).map_or(DataValue::Float(value as f64), DataValue::Int)
}

/// Converts one Arrow cell into a [`DataValue`].
///
/// Cells of unsupported types are nulls. Prefer [`arrow_array_to_values`] for
/// whole dictionary columns, which decodes the keys once.
pub fn arrow_value_to_data_value(
    array: &ArrayRef,
    row_idx: usize,
) -> Result<DataValue, DatasetError> {
    if array.is_null(row_idx) {
        return Ok(DataValue::Null);
    }

    let value = match array.data_type() {
        DataType::Boolean => {
            DataValue::Bool(downcast::<BooleanArray>(array, "BooleanArray")?.value(row_idx))
        }
        DataType::Int8 => {
            DataValue::Int(downcast::<Int8Array>(array, "Int8Array")?.value(row_idx).into())
        }
        DataType::Int16 => {
            DataValue::Int(downcast::<Int16Array>(array, "Int16Array")?.value(row_idx).into())
        }
        DataType::Int32 => {
            DataValue::Int(downcast::<Int32Array>(array, "Int32Array")?.value(row_idx).into())
        }
        DataType::Int64 => {
            DataValue::Int(downcast::<Int64Array>(array, "Int64Array")?.value(row_idx))
        }
        DataType::UInt8 => {
            DataValue::Int(downcast::<UInt8Array>(array, "UInt8Array")?.value(row_idx).into())
        }
        DataType::UInt16 => {
            DataValue::Int(downcast::<UInt16Array>(array, "UInt16Array")?.value(row_idx).into())
        }
        DataType::UInt32 => {
            DataValue::Int(downcast::<UInt32Array>(array, "UInt32Array")?.value(row_idx).into())
        }
        DataType::UInt64 => {
            unsigned_value(downcast::<UInt64Array>(array, "UInt64Array")?.value(row_idx))
        }
        DataType::Float16 => DataValue::Float(
            downcast::<Float16Array>(array, "Float16Array")?
                .value(row_idx)
                .to_f64(),
        ),
        DataType::Float32 => DataValue::Float(
            downcast::<Float32Array>(array, "Float32Array")?
                .value(row_idx)
                .into(),
        ),
        DataType::Float64 => {
            DataValue::Float(downcast::<Float64Array>(array, "Float64Array")?.value(row_idx))
        }
        DataType::Decimal128(_, scale) => {
            let unscaled = downcast::<Decimal128Array>(array, "Decimal128Array")?.value(row_idx);
            DataValue::Float(unscaled as f64 / 10f64.powi(i32::from(*scale)))
        }
        DataType::Utf8 => DataValue::String(
            downcast::<StringArray>(array, "StringArray")?
                .value(row_idx)
                .to_string(),
        ),
        DataType::LargeUtf8 => DataValue::String(
            downcast::<LargeStringArray>(array, "LargeStringArray")?
                .value(row_idx)
                .to_string(),
        ),
        DataType::Utf8View => DataValue::String(
            downcast::<StringViewArray>(array, "StringViewArray")?
                .value(row_idx)
                .to_string(),
        ),
        DataType::Timestamp(unit, _) => {
            let instant = match unit {
                TimeUnit::Second => DateTime::from_timestamp(
                    downcast::<TimestampSecondArray>(array, "TimestampSecondArray")?.value(row_idx),
                    0,
                ),
                TimeUnit::Millisecond => DateTime::from_timestamp_millis(
                    downcast::<TimestampMillisecondArray>(array, "TimestampMillisecondArray")?
                        .value(row_idx),
                ),
                TimeUnit::Microsecond => DateTime::from_timestamp_micros(
                    downcast::<TimestampMicrosecondArray>(array, "TimestampMicrosecondArray")?
                        .value(row_idx),
                ),
                TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(
                    downcast::<TimestampNanosecondArray>(array, "TimestampNanosecondArray")?
                        .value(row_idx),
                )),
            };
            instant.map_or(DataValue::Null, DataValue::Timestamp)
        }
        DataType::Date32 => {
            let days = downcast::<Date32Array>(array, "Date32Array")?.value(row_idx);
            DateTime::from_timestamp(i64::from(days) * 86_400, 0)
                .map_or(DataValue::Null, DataValue::Timestamp)
        }
        DataType::Date64 => {
            let millis = downcast::<Date64Array>(array, "Date64Array")?.value(row_idx);
            DateTime::from_timestamp_millis(millis).map_or(DataValue::Null, DataValue::Timestamp)
        }
        DataType::Dictionary(_, _) => {
            let Some(dictionary) = array.as_any_dictionary_opt() else {
                return Err(DatasetError::TypeConversion(
                    "Failed to downcast to DictionaryArray".to_string(),
                ));
            };
            if dictionary.values().is_empty() {
                return Ok(DataValue::Null);
            }
            let key = dictionary.normalized_keys()[row_idx];
            arrow_value_to_data_value(dictionary.values(), key)?
        }
        _ => DataValue::Null,
    };

    Ok(value)
}

/// Storage type inferred for a column on write.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StorageType {
    Bool,
    Int,
    Float,
    Utf8,
    Timestamp,
}

impl StorageType {
    fn of(value: &DataValue) -> Option<Self> {
        match value {
            DataValue::Null => None,
            DataValue::Bool(_) => Some(StorageType::Bool),
            DataValue::Int(_) => Some(StorageType::Int),
            DataValue::Float(_) => Some(StorageType::Float),
            DataValue::String(_) => Some(StorageType::Utf8),
            DataValue::Timestamp(_) => Some(StorageType::Timestamp),
        }
    }

    fn name(self) -> &'static str {
        match self {
            StorageType::Bool => "boolean",
            StorageType::Int => "int64",
            StorageType::Float => "float64",
            StorageType::Utf8 => "string",
            StorageType::Timestamp => "timestamp",
        }
    }
}

fn infer_storage_type(column: &Column) -> Result<StorageType, DatasetError> {
    let mut inferred: Option<StorageType> = None;
    for kind in column.values().iter().filter_map(StorageType::of) {
        inferred = match (inferred, kind) {
            (None, kind) => Some(kind),
            (Some(a), b) if a == b => Some(a),
            (Some(StorageType::Int), StorageType::Float)
            | (Some(StorageType::Float), StorageType::Int) => Some(StorageType::Float),
            (Some(a), b) => {
                return Err(DatasetError::MixedTypes {
                    column: column.name().to_string(),
                    first: a.name(),
                    second: b.name(),
                });
            }
        };
    }
    // All-null columns are written as strings.
    Ok(inferred.unwrap_or(StorageType::Utf8))
}

fn column_to_array(column: &Column) -> Result<ArrayRef, DatasetError> {
    let values = column.values();
    let array: ArrayRef = match infer_storage_type(column)? {
        StorageType::Bool => Arc::new(BooleanArray::from(
            values.iter().map(DataValue::as_bool).collect::<Vec<_>>(),
        )),
        StorageType::Int => Arc::new(Int64Array::from(
            values.iter().map(DataValue::as_int).collect::<Vec<_>>(),
        )),
        StorageType::Float => Arc::new(Float64Array::from(
            values.iter().map(DataValue::as_float).collect::<Vec<_>>(),
        )),
        StorageType::Utf8 => Arc::new(StringArray::from(
            values.iter().map(DataValue::as_string).collect::<Vec<_>>(),
        )),
        StorageType::Timestamp => Arc::new(
            TimestampMicrosecondArray::from(
                values
                    .iter()
                    .map(|v| v.as_timestamp().map(|ts| ts.timestamp_micros()))
                    .collect::<Vec<_>>(),
            )
            .with_timezone("UTC"),
        ),
    };
    Ok(array)
}
