//! Composite-key uniqueness.

use super::{parse_params, Check, SAMPLE_LIMIT};
use crate::core::dataset::scalar_to_json;
use crate::core::{CheckResult, RunContext};
use crate::prelude::*;
use datafusion::scalar::ScalarValue;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct UniqueParams {
    columns: Vec<String>,
}

/// Fails when any combination of key values occurs on more than one row.
///
/// Every row of a duplicated group is counted, including the first
/// occurrence: a key appearing three times contributes three duplicates.
/// Missing values compare equal to each other.
#[derive(Debug, Clone, PartialEq)]
pub struct UniquenessCheck {
    columns: Vec<String>,
}

impl UniquenessCheck {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the check from a suite payload with a `columns` list.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let params: UniqueParams = parse_params("unique", payload)?;
        Ok(Self::new(params.columns))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// NaN and null both mean "missing" and must share one key.
fn missing_as_null(value: ScalarValue) -> ScalarValue {
    match value {
        ScalarValue::Float64(Some(v)) if v.is_nan() => ScalarValue::Float64(None),
        ScalarValue::Float32(Some(v)) if v.is_nan() => ScalarValue::Float32(None),
        other => other,
    }
}

impl Check for UniquenessCheck {
    fn check_type(&self) -> &'static str {
        "unique"
    }

    #[instrument(skip(self, ctx), fields(check.type = "unique", columns = ?self.columns))]
    fn evaluate(&self, dataset: &str, ctx: &RunContext) -> Result<CheckResult> {
        let data = ctx.dataset(dataset)?;

        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|column| !data.has_column(column))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Ok(CheckResult::new(
                self.check_type(),
                dataset,
                false,
                "Unique check failed: missing columns.",
                json!({"missing_columns": missing}),
            ));
        }

        let mut keys: Vec<Vec<ScalarValue>> = Vec::with_capacity(data.num_rows());
        for row in 0..data.num_rows() {
            let key = self
                .columns
                .iter()
                .map(|column| data.scalar(column, row).map(missing_as_null))
                .collect::<Result<Vec<_>>>()?;
            keys.push(key);
        }

        let mut occurrences: HashMap<&[ScalarValue], usize> = HashMap::new();
        for key in &keys {
            *occurrences.entry(key.as_slice()).or_insert(0) += 1;
        }

        let duplicate_rows: Vec<usize> = keys
            .iter()
            .enumerate()
            .filter(|(_, key)| occurrences.get(key.as_slice()).copied().unwrap_or(0) > 1)
            .map(|(row, _)| row)
            .collect();

        debug!(
            rows = data.num_rows(),
            duplicates = duplicate_rows.len(),
            "Uniqueness evaluation finished"
        );

        let duplicates_sample: Vec<Value> = duplicate_rows
            .iter()
            .take(SAMPLE_LIMIT)
            .map(|&row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(&keys[row])
                    .map(|(column, value)| (column.clone(), scalar_to_json(value)))
                    .collect();
                Value::Object(record)
            })
            .collect();

        let passed = duplicate_rows.is_empty();
        let message = if passed {
            "Uniqueness satisfied."
        } else {
            "Uniqueness check failed."
        };

        Ok(CheckResult::new(
            self.check_type(),
            dataset,
            passed,
            message,
            json!({
                "columns": self.columns,
                "num_duplicates": duplicate_rows.len(),
                "duplicates_sample": duplicates_sample,
            }),
        ))
    }
}
