//! In-memory tabular data handed to checks.
//!
//! A [`Dataset`] is a single Arrow [`RecordBatch`] holding every row of one
//! loaded file. Checks only ever read from it.

use crate::prelude::*;
use arrow::array::{Array, ArrayRef, AsArray, Float64Array};
use arrow::compute::{cast_with_options, concat_batches, CastOptions};
use arrow::datatypes::{DataType, Float32Type, Float64Type, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use datafusion::scalar::ScalarValue;
use serde_json::{Number, Value};

/// Rows and columns of one dataset, fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    /// Wraps an existing record batch.
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Concatenates the batches produced by a reader into one dataset.
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self { batch })
    }

    /// Returns the underlying record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Returns the Arrow schema.
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Returns column names in their stored order.
    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|field| field.name().as_str())
            .collect()
    }

    /// Returns true if the dataset has a column with this exact name.
    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema_ref().index_of(name).is_ok()
    }

    /// Returns the column array.
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| DqfError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Returns the Arrow type of a column.
    pub fn data_type(&self, name: &str) -> Result<&DataType> {
        let field = self
            .batch
            .schema_ref()
            .field_with_name(name)
            .map_err(|_| DqfError::ColumnNotFound {
                column: name.to_string(),
            })?;
        Ok(field.data_type())
    }

    /// Returns one flag per row, true where the value is missing.
    ///
    /// Nulls are missing, and so are floating-point NaNs.
    pub fn missing_mask(&self, name: &str) -> Result<Vec<bool>> {
        let array = self.column(name)?;
        let nulls = array.logical_nulls();
        let mut mask: Vec<bool> = (0..array.len())
            .map(|i| nulls.as_ref().is_some_and(|n| n.is_null(i)))
            .collect();

        match array.data_type() {
            DataType::Float64 => {
                for (i, value) in array.as_primitive::<Float64Type>().iter().enumerate() {
                    if value.is_some_and(f64::is_nan) {
                        mask[i] = true;
                    }
                }
            }
            DataType::Float32 => {
                for (i, value) in array.as_primitive::<Float32Type>().iter().enumerate() {
                    if value.is_some_and(f32::is_nan) {
                        mask[i] = true;
                    }
                }
            }
            _ => {}
        }

        Ok(mask)
    }

    /// Counts missing values in a column.
    pub fn missing_count(&self, name: &str) -> Result<usize> {
        Ok(self
            .missing_mask(name)?
            .into_iter()
            .filter(|missing| *missing)
            .count())
    }

    /// Coerces a column to `Float64`.
    ///
    /// Values that cannot be converted become null rather than failing the
    /// whole column. Types Arrow cannot cast to a number at all are an error.
    pub fn numeric_column(&self, name: &str) -> Result<Float64Array> {
        let array = self.column(name)?;
        let options = CastOptions {
            safe: true,
            ..Default::default()
        };
        let numeric = cast_with_options(array, &DataType::Float64, &options)?;
        Ok(numeric.as_primitive::<Float64Type>().clone())
    }

    /// Reads a single cell as a scalar.
    pub fn scalar(&self, name: &str, row: usize) -> Result<ScalarValue> {
        let array = self.column(name)?;
        Ok(ScalarValue::try_from_array(array.as_ref(), row)?)
    }

    /// Reads a single cell and renders it as JSON for result details.
    pub fn json_value(&self, name: &str, row: usize) -> Result<Value> {
        Ok(scalar_to_json(&self.scalar(name, row)?))
    }
}

impl From<RecordBatch> for Dataset {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}

/// Converts a scalar to the JSON value used in check details.
pub fn scalar_to_json(value: &ScalarValue) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    if let Some(timestamp) = scalar_to_datetime(value) {
        return Value::String(timestamp.to_rfc3339());
    }

    match value {
        ScalarValue::Boolean(Some(v)) => Value::Bool(*v),
        ScalarValue::Int8(Some(v)) => Value::from(*v),
        ScalarValue::Int16(Some(v)) => Value::from(*v),
        ScalarValue::Int32(Some(v)) => Value::from(*v),
        ScalarValue::Int64(Some(v)) => Value::from(*v),
        ScalarValue::UInt8(Some(v)) => Value::from(*v),
        ScalarValue::UInt16(Some(v)) => Value::from(*v),
        ScalarValue::UInt32(Some(v)) => Value::from(*v),
        ScalarValue::UInt64(Some(v)) => Value::from(*v),
        ScalarValue::Float32(Some(v)) => float_to_json(f64::from(*v)),
        ScalarValue::Float64(Some(v)) => float_to_json(*v),
        ScalarValue::Utf8(Some(v))
        | ScalarValue::LargeUtf8(Some(v))
        | ScalarValue::Utf8View(Some(v)) => Value::String(v.clone()),
        other => Value::String(other.to_string()),
    }
}

/// Converts a float to JSON; NaN and infinities have no JSON form and become null.
pub fn float_to_json(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Reads an Arrow temporal scalar as a UTC instant.
///
/// Timestamps without a timezone are taken to be UTC, the same rule string
/// parsing applies. Dates map to midnight UTC.
pub fn scalar_to_datetime(value: &ScalarValue) -> Option<DateTime<Utc>> {
    match value {
        ScalarValue::TimestampSecond(Some(v), _) => DateTime::from_timestamp(*v, 0),
        ScalarValue::TimestampMillisecond(Some(v), _) => DateTime::from_timestamp_millis(*v),
        ScalarValue::TimestampMicrosecond(Some(v), _) => DateTime::from_timestamp_micros(*v),
        ScalarValue::TimestampNanosecond(Some(v), _) => Some(DateTime::from_timestamp_nanos(*v)),
        ScalarValue::Date32(Some(days)) => DateTime::from_timestamp(i64::from(*days) * 86_400, 0),
        ScalarValue::Date64(Some(millis)) => DateTime::from_timestamp_millis(*millis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{customers_dataset, orders_dataset};
    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_column_presence() {
        let customers = customers_dataset();
        assert!(customers.has_column("id"));
        assert!(!customers.has_column("ID"));
        assert_eq!(customers.column_names(), vec!["id", "name", "email", "signup_date"]);
        assert!(matches!(
            customers.column("missing"),
            Err(DqfError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_mask_counts_nulls_and_nan() {
        let schema = Arc::new(Schema::new(vec![Field::new("score", DataType::Float64, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![
                Some(1.0),
                None,
                Some(f64::NAN),
                Some(4.0),
            ]))],
        )
        .unwrap();
        let dataset = Dataset::new(batch);

        assert_eq!(
            dataset.missing_mask("score").unwrap(),
            vec![false, true, true, false]
        );
        assert_eq!(dataset.missing_count("score").unwrap(), 2);
    }

    #[test]
    fn test_numeric_coercion_turns_garbage_into_null() {
        let schema = Arc::new(Schema::new(vec![Field::new("qty", DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec![
                Some("10"),
                Some("abc"),
                None,
                Some("2.5"),
            ]))],
        )
        .unwrap();
        let dataset = Dataset::new(batch);

        let numeric = dataset.numeric_column("qty").unwrap();
        assert_eq!(numeric.value(0), 10.0);
        assert!(numeric.is_null(1));
        assert!(numeric.is_null(2));
        assert_eq!(numeric.value(3), 2.5);
    }

    #[test]
    fn test_json_values() {
        let orders = orders_dataset();
        assert_eq!(orders.json_value("order_id", 0).unwrap(), Value::from(100));
        assert_eq!(orders.json_value("amount", 0).unwrap(), Value::from(25.5));
        assert_eq!(orders.json_value("status", 0).unwrap(), Value::from("shipped"));
        assert_eq!(float_to_json(f64::NAN), Value::Null);
    }

    #[test]
    fn test_temporal_scalars_render_as_utc() {
        let ts = ScalarValue::TimestampMicrosecond(Some(1_704_067_200_000_000), None);
        assert_eq!(
            scalar_to_json(&ts),
            Value::from("2024-01-01T00:00:00+00:00")
        );
        let date = ScalarValue::Date32(Some(19_723));
        assert_eq!(
            scalar_to_datetime(&date).unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }
}
