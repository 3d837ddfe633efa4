//! Referential integrity between two datasets of the same run.
//!
//! Every non-missing value of `column` must appear among the non-missing
//! values of `ref_dataset.ref_column`. Missing values in the subject column
//! are never violations. An unloaded `ref_dataset` is reported before any
//! missing column.

use super::{parse_params, Check, SAMPLE_LIMIT};
use crate::core::dataset::scalar_to_json;
use crate::core::{CheckResult, Dataset, RunContext};
use crate::prelude::*;
use arrow::array::{Array, ArrayRef};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::DataType;
use datafusion::scalar::ScalarValue;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct ForeignKeyParams {
    column: String,
    ref_dataset: String,
    ref_column: String,
}

/// Fails when a value of `column` has no match in the referenced column.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyCheck {
    column: String,
    ref_dataset: String,
    ref_column: String,
}

impl ForeignKeyCheck {
    pub fn new(
        column: impl Into<String>,
        ref_dataset: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            ref_dataset: ref_dataset.into(),
            ref_column: ref_column.into(),
        }
    }

    /// Builds the check from a suite payload with `column`, `ref_dataset`
    /// and `ref_column`.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let params: ForeignKeyParams = parse_params("fk", payload)?;
        Ok(Self::new(params.column, params.ref_dataset, params.ref_column))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn ref_dataset(&self) -> &str {
        &self.ref_dataset
    }

    pub fn ref_column(&self) -> &str {
        &self.ref_column
    }

    fn failure(&self, dataset: &str, message: &str, details: Value) -> CheckResult {
        CheckResult::new(self.check_type(), dataset, false, message, details)
    }
}

/// Brings both key columns to one comparable type.
///
/// Equal types are compared as-is and numeric types meet at `Float64`.
/// Otherwise the referenced column is cast to the subject column's type;
/// referenced values that do not convert cannot be matched.
fn comparable_columns(left: &ArrayRef, right: &ArrayRef) -> Result<(ArrayRef, ArrayRef)> {
    let options = CastOptions {
        safe: true,
        ..Default::default()
    };
    let left_type = left.data_type();
    let right_type = right.data_type();

    if left_type == right_type {
        return Ok((left.clone(), right.clone()));
    }
    if left_type.is_numeric() && right_type.is_numeric() {
        let left = cast_with_options(left, &DataType::Float64, &options)?;
        let right = cast_with_options(right, &DataType::Float64, &options)?;
        return Ok((left, right));
    }
    let right = cast_with_options(right, left_type, &options)?;
    Ok((left.clone(), right))
}

fn present_rows(dataset: &Dataset, column: &str) -> Result<Vec<usize>> {
    Ok(dataset
        .missing_mask(column)?
        .into_iter()
        .enumerate()
        .filter(|(_, missing)| !missing)
        .map(|(row, _)| row)
        .collect())
}

impl Check for ForeignKeyCheck {
    fn check_type(&self) -> &'static str {
        "fk"
    }

    #[instrument(skip(self, ctx), fields(
        check.type = "fk",
        column = %self.column,
        ref_dataset = %self.ref_dataset,
        ref_column = %self.ref_column
    ))]
    fn evaluate(&self, dataset: &str, ctx: &RunContext) -> Result<CheckResult> {
        let data = ctx.dataset(dataset)?;

        if !ctx.contains_dataset(&self.ref_dataset) {
            return Ok(self.failure(
                dataset,
                "FK check failed: ref dataset not loaded.",
                json!({"ref_dataset": self.ref_dataset}),
            ));
        }
        if !data.has_column(&self.column) {
            return Ok(self.failure(
                dataset,
                "FK check failed: column not found.",
                json!({"column": self.column}),
            ));
        }
        let reference = ctx.dataset(&self.ref_dataset)?;
        if !reference.has_column(&self.ref_column) {
            return Ok(self.failure(
                dataset,
                "FK check failed: ref column not found.",
                json!({"ref_column": self.ref_column}),
            ));
        }

        let (left, right) =
            comparable_columns(data.column(&self.column)?, reference.column(&self.ref_column)?)?;

        let mut known: HashSet<ScalarValue> = HashSet::new();
        for row in present_rows(reference, &self.ref_column)? {
            if right.is_valid(row) {
                known.insert(ScalarValue::try_from_array(right.as_ref(), row)?);
            }
        }

        let mut num_invalid = 0usize;
        let mut invalid_sample = Vec::new();
        for row in present_rows(data, &self.column)? {
            let key = ScalarValue::try_from_array(left.as_ref(), row)?;
            if !known.contains(&key) {
                num_invalid += 1;
                if invalid_sample.len() < SAMPLE_LIMIT {
                    invalid_sample.push(scalar_to_json(&data.scalar(&self.column, row)?));
                }
            }
        }

        debug!(
            distinct_references = known.len(),
            num_invalid, "Referential integrity evaluation finished"
        );

        let passed = num_invalid == 0;
        let message = if passed {
            "Referential integrity satisfied."
        } else {
            "Referential integrity failed."
        };

        Ok(CheckResult::new(
            self.check_type(),
            dataset,
            passed,
            message,
            json!({
                "column": self.column,
                "ref_dataset": self.ref_dataset,
                "ref_column": self.ref_column,
                "num_invalid": num_invalid,
                "invalid_sample": invalid_sample,
            }),
        ))
    }
}
