//! Schema conformance: expected columns are present with compatible types.

use super::{ordered_entries, parse_params, Check};
use crate::core::{CheckResult, RunContext};
use crate::prelude::*;
use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

/// Column type tags a suite can expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    Str,
    Datetime,
    Bool,
}

impl ColumnType {
    /// Returns the tag as written in suite files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Datetime => "datetime",
            Self::Bool => "bool",
        }
    }

    /// Returns true if a column whose normalized type is `actual` satisfies
    /// this expectation.
    ///
    /// Integer columns may be stored as floats once missing values force an
    /// upcast, and any timestamp or date representation satisfies `datetime`.
    pub fn accepts(&self, actual: &str) -> bool {
        match self {
            Self::Int => actual == "int" || actual == "float",
            Self::Datetime => actual == "datetime" || actual == "date",
            other => other.as_str() == actual,
        }
    }
}

/// Maps an Arrow type onto the suite's type tag space.
///
/// Types with no tag of their own are reported by their lowercase Arrow name.
pub fn normalize_type(data_type: &DataType) -> String {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "int".to_string(),
        // an all-missing column has no type of its own and reads as float
        DataType::Null
        | DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => "float".to_string(),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "str".to_string(),
        DataType::Boolean => "bool".to_string(),
        DataType::Timestamp(_, _) => "datetime".to_string(),
        DataType::Date32 | DataType::Date64 => "date".to_string(),
        other => other.to_string().to_lowercase(),
    }
}

#[derive(Debug, Deserialize)]
struct SchemaParams {
    columns: Map<String, Value>,
}

/// Checks that expected columns exist and carry the expected types.
///
/// Columns present in the data but not listed are reported as extra without
/// failing the check.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCheck {
    columns: Vec<(String, ColumnType)>,
}

impl SchemaCheck {
    /// Creates a schema check from `(column, type)` expectations.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, column_type)| (name.into(), column_type))
                .collect(),
        }
    }

    /// Builds the check from a suite payload with a `columns` mapping.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let params: SchemaParams = parse_params("schema", payload)?;
        let columns = ordered_entries("schema", "columns", params.columns)?;
        Ok(Self { columns })
    }

    /// Returns the expected columns in declaration order.
    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    fn expects(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == column)
    }
}

impl Check for SchemaCheck {
    fn check_type(&self) -> &'static str {
        "schema"
    }

    #[instrument(skip(self, ctx), fields(check.type = "schema"))]
    fn evaluate(&self, dataset: &str, ctx: &RunContext) -> Result<CheckResult> {
        let data = ctx.dataset(dataset)?;

        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|(name, _)| !data.has_column(name))
            .map(|(name, _)| name.as_str())
            .collect();

        let extra: Vec<&str> = data
            .column_names()
            .into_iter()
            .filter(|name| !self.expects(name))
            .collect();

        let mut type_mismatches = Map::new();
        for (name, expected) in &self.columns {
            if !data.has_column(name) {
                continue;
            }
            let got = normalize_type(data.data_type(name)?);
            if !expected.accepts(&got) {
                debug!(column = %name, expected = expected.as_str(), got = %got, "Column type mismatch");
                type_mismatches.insert(
                    name.clone(),
                    json!({"expected": expected.as_str(), "got": got}),
                );
            }
        }

        let passed = missing.is_empty() && type_mismatches.is_empty();
        let message = if passed {
            "Schema matches expected columns/types."
        } else {
            "Schema check failed."
        };

        Ok(CheckResult::new(
            self.check_type(),
            dataset,
            passed,
            message,
            json!({
                "missing_columns": missing,
                "extra_columns": extra,
                "type_mismatches": type_mismatches,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::sample_context;
    use arrow::datatypes::TimeUnit;

    #[test]
    fn test_schema_matches() {
        let ctx = sample_context();
        let check = SchemaCheck::new([
            ("id", ColumnType::Int),
            ("name", ColumnType::Str),
            ("signup_date", ColumnType::Datetime),
        ]);

        let result = check.evaluate("customers", &ctx).unwrap();
        assert!(result.passed, "{:?}", result.details);
        assert_eq!(result.message, "Schema matches expected columns/types.");
        assert_eq!(result.details["missing_columns"], json!([]));
        assert_eq!(result.details["extra_columns"], json!(["email"]));
        assert_eq!(result.details["type_mismatches"], json!({}));
    }

    #[test]
    fn test_missing_column_and_type_mismatch() {
        let ctx = sample_context();
        let check = SchemaCheck::new([
            ("id", ColumnType::Str),
            ("name", ColumnType::Str),
            ("country", ColumnType::Str),
        ]);

        let result = check.evaluate("customers", &ctx).unwrap();
        assert!(!result.passed);
        assert_eq!(result.message, "Schema check failed.");
        assert_eq!(result.details["missing_columns"], json!(["country"]));
        assert_eq!(
            result.details["type_mismatches"],
            json!({"id": {"expected": "str", "got": "int"}})
        );
    }

    #[test]
    fn test_int_accepts_float_columns() {
        let ctx = sample_context();
        let check = SchemaCheck::new([("amount", ColumnType::Int)]);
        let result = check.evaluate("orders", &ctx).unwrap();
        assert!(result.passed);

        let reverse = SchemaCheck::new([("order_id", ColumnType::Float)]);
        let result = reverse.evaluate("orders", &ctx).unwrap();
        assert!(!result.passed);
    }

    #[test]
    fn test_all_missing_column_counts_as_float() {
        use crate::core::Dataset;
        use arrow::array::{Int64Array, NullArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use std::collections::HashMap;
        use std::sync::Arc;

        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("score", DataType::Null, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(NullArray::new(3)),
            ],
        )
        .unwrap();
        let mut datasets = HashMap::new();
        datasets.insert("scores".to_string(), Dataset::new(batch));
        let ctx = RunContext::new("schema_tests", datasets);

        let result = SchemaCheck::new([("score", ColumnType::Int)])
            .evaluate("scores", &ctx)
            .unwrap();
        assert!(result.passed, "{:?}", result.details);

        let result = SchemaCheck::new([("score", ColumnType::Str)])
            .evaluate("scores", &ctx)
            .unwrap();
        assert_eq!(
            result.details["type_mismatches"],
            json!({"score": {"expected": "str", "got": "float"}})
        );
    }

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type(&DataType::UInt16), "int");
        assert_eq!(normalize_type(&DataType::Float32), "float");
        assert_eq!(normalize_type(&DataType::Null), "float");
        assert_eq!(normalize_type(&DataType::LargeUtf8), "str");
        assert_eq!(normalize_type(&DataType::Boolean), "bool");
        assert_eq!(
            normalize_type(&DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into()))),
            "datetime"
        );
        assert_eq!(normalize_type(&DataType::Date32), "date");
        assert!(ColumnType::Datetime.accepts("date"));
        assert!(!ColumnType::Str.accepts("datetime"));
    }

    #[test]
    fn test_from_payload_preserves_order() {
        let payload = json!({"columns": {"b": "str", "a": "int"}});
        let check = SchemaCheck::from_payload(payload.as_object().unwrap()).unwrap();
        assert_eq!(
            check.columns(),
            &[
                ("b".to_string(), ColumnType::Str),
                ("a".to_string(), ColumnType::Int)
            ]
        );
    }
}
