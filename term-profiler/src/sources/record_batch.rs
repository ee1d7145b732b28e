//! Arrow `RecordBatch` to [`TabularBatch`] conversion.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{
    DataType, Float64Type, Int64Type, SchemaRef, TimeUnit, TimestampMillisecondType, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::BatchSource;
use crate::batch::{CellValue, Column, TabularBatch};
use crate::error::{ProfilerError, Result};

/// Record batches already held in memory.
#[derive(Debug, Clone)]
pub struct RecordBatchSource {
    name: String,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl RecordBatchSource {
    pub fn new(name: impl Into<String>, schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self {
            name: name.into(),
            schema,
            batches,
        }
    }

    /// Single-batch source; the schema is taken from the batch.
    pub fn from_batch(name: impl Into<String>, batch: RecordBatch) -> Self {
        let schema = batch.schema();
        Self::new(name, schema, vec![batch])
    }
}

#[async_trait]
impl BatchSource for RecordBatchSource {
    async fn load(&self) -> Result<TabularBatch> {
        tabular_from_record_batches(&self.name, &self.schema, &self.batches)
    }

    fn description(&self) -> String {
        format!(
            "record batches '{}' ({} batches, {} fields)",
            self.name,
            self.batches.len(),
            self.schema.fields().len()
        )
    }
}

pub fn tabular_from_record_batch(name: &str, batch: &RecordBatch) -> Result<TabularBatch> {
    tabular_from_record_batches(name, &batch.schema(), std::slice::from_ref(batch))
}

/// Concatenates the batches and converts every column to cells. The Arrow
/// memory size is recorded as the batch size.
pub fn tabular_from_record_batches(
    name: &str,
    schema: &SchemaRef,
    batches: &[RecordBatch],
) -> Result<TabularBatch> {
    let combined = concat_batches(schema, batches)?;
    let size_bytes: u64 = batches
        .iter()
        .map(|b| b.get_array_memory_size() as u64)
        .sum();

    let columns = schema
        .fields()
        .iter()
        .zip(combined.columns())
        .map(|(field, array)| {
            let values = cells_from_array(array).map_err(|e| {
                ProfilerError::data_source("arrow", format!("column '{}': {e}", field.name()))
            })?;
            Ok(Column::new(field.name().clone(), values))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        batch = name,
        rows = combined.num_rows(),
        columns = columns.len(),
        size_bytes,
        "Converted record batches"
    );

    Ok(TabularBatch::new(name, columns)?.with_size_bytes(size_bytes))
}

fn cells_from_array(array: &ArrayRef) -> Result<Vec<CellValue>> {
    let cells = match array.data_type() {
        DataType::Null => vec![CellValue::Null; array.len()],
        DataType::Boolean => array
            .as_boolean()
            .iter()
            .map(CellValue::from)
            .collect(),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => cast(array, &DataType::Int64)?
            .as_primitive::<Int64Type>()
            .iter()
            .map(CellValue::from)
            .collect(),
        // Values above i64::MAX keep their magnitude as floats.
        DataType::UInt64 => array
            .as_primitive::<UInt64Type>()
            .iter()
            .map(|v| match v {
                None => CellValue::Null,
                Some(v) => i64::try_from(v)
                    .map(CellValue::Int)
                    .unwrap_or(CellValue::Float(v as f64)),
            })
            .collect(),
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => cast(array, &DataType::Float64)?
            .as_primitive::<Float64Type>()
            .iter()
            .map(CellValue::from)
            .collect(),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            cast(array, &DataType::Timestamp(TimeUnit::Millisecond, None))?
                .as_primitive::<TimestampMillisecondType>()
                .iter()
                .map(|v| {
                    v.and_then(DateTime::<Utc>::from_timestamp_millis)
                        .map(|d| CellValue::Date(d.naive_utc()))
                        .unwrap_or(CellValue::Null)
                })
                .collect()
        }
        DataType::Utf8 => string_cells(array.as_ref()),
        other => {
            let utf8 = cast(array, &DataType::Utf8).map_err(|_| {
                ProfilerError::data_source("arrow", format!("unsupported data type {other}"))
            })?;
            string_cells(utf8.as_ref())
        }
    };
    Ok(cells)
}

fn string_cells(array: &dyn Array) -> Vec<CellValue> {
    array
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(|s| CellValue::Text(s.to_string())).unwrap_or(CellValue::Null))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{BooleanArray, Date32Array, Float32Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};

    fn record_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("score", DataType::Float32, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("active", DataType::Boolean, true),
            Field::new("joined", DataType::Date32, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(Float32Array::from(vec![Some(1.5), None, Some(2.0)])),
                Arc::new(StringArray::from(vec![Some("a"), Some("b"), None])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false), None])),
                Arc::new(Date32Array::from(vec![Some(0), Some(19_000), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_converts_supported_types() {
        let batch = tabular_from_record_batch("people", &record_batch()).unwrap();
        assert_eq!(batch.row_count(), 3);
        assert_eq!(batch.column_names(), vec!["id", "score", "name", "active", "joined"]);
        assert!(!batch.effective_size_bytes().1);

        assert_eq!(batch.column("id").unwrap().values[2], CellValue::Int(3));
        assert_eq!(batch.column("score").unwrap().values[0], CellValue::Float(1.5));
        assert_eq!(batch.column("score").unwrap().values[1], CellValue::Null);
        assert_eq!(batch.column("name").unwrap().values[1], CellValue::from("b"));
        assert_eq!(batch.column("active").unwrap().values[0], CellValue::Bool(true));

        let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(batch.column("joined").unwrap().values[0], CellValue::Date(epoch));
        assert_eq!(batch.column("joined").unwrap().values[2], CellValue::Null);
    }

    #[test]
    fn test_concatenates_batches() {
        let first = record_batch();
        let schema = first.schema();
        let batch =
            tabular_from_record_batches("people", &schema, &[first.clone(), first]).unwrap();
        assert_eq!(batch.row_count(), 6);
    }

    #[test]
    fn test_unsigned_overflow_becomes_float() {
        let array: ArrayRef = Arc::new(arrow::array::UInt64Array::from(vec![1, u64::MAX]));
        let values = cells_from_array(&array).unwrap();
        assert_eq!(values[0], CellValue::Int(1));
        assert_eq!(values[1], CellValue::Float(u64::MAX as f64));
    }

    #[test]
    fn test_timestamp_column() {
        let record_batch = crate::test_fixtures::people_record_batch().unwrap();
        let batch = tabular_from_record_batch("people", &record_batch).unwrap();
        let expected = crate::test_fixtures::reference_time().naive_utc();
        assert_eq!(
            batch.column("updated_at").unwrap().values[0],
            CellValue::Date(expected)
        );
        assert_eq!(batch.column("active").unwrap().values[4], CellValue::Null);
    }

    #[tokio::test]
    async fn test_record_batch_source() {
        let source = RecordBatchSource::from_batch("people", record_batch());
        assert_eq!(source.load().await.unwrap().column_count(), 5);
        assert!(source.description().contains("1 batches"));
    }
}
