//! Inclusive numeric bounds on a column.

use super::{parse_params, Check, SAMPLE_LIMIT};
use crate::core::dataset::float_to_json;
use crate::core::{CheckResult, RunContext};
use crate::prelude::*;
use arrow::array::Array;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct RangeParams {
    column: String,
    min: f64,
    max: f64,
}

/// Fails when any numeric value lies outside `[min, max]`.
///
/// Values are coerced to numbers first; anything that cannot be coerced is
/// treated as missing and never counts as a violation.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCheck {
    column: String,
    min: f64,
    max: f64,
    // bounds as declared, echoed in details
    declared: (Value, Value),
}

impl RangeCheck {
    pub fn new(column: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            column: column.into(),
            min,
            max,
            declared: (float_to_json(min), float_to_json(max)),
        }
    }

    /// Builds the check from a suite payload with `column`, `min` and `max`.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let params: RangeParams = parse_params("range", payload)?;
        let mut check = Self::new(params.column, params.min, params.max);
        if let (Some(min), Some(max)) = (payload.get("min"), payload.get("max")) {
            check.declared = (min.clone(), max.clone());
        }
        Ok(check)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl Check for RangeCheck {
    fn check_type(&self) -> &'static str {
        "range"
    }

    #[instrument(skip(self, ctx), fields(check.type = "range", column = %self.column))]
    fn evaluate(&self, dataset: &str, ctx: &RunContext) -> Result<CheckResult> {
        let data = ctx.dataset(dataset)?;

        if !data.has_column(&self.column) {
            return Ok(CheckResult::new(
                self.check_type(),
                dataset,
                false,
                "Range check failed: column not found.",
                json!({"column": self.column}),
            ));
        }

        let values = data.numeric_column(&self.column)?;
        let mut num_violations = 0usize;
        let mut violations_sample = Vec::new();

        for row in 0..values.len() {
            if values.is_null(row) {
                continue;
            }
            let value = values.value(row);
            // NaN compares false against both bounds
            if value < self.min || value > self.max {
                num_violations += 1;
                if violations_sample.len() < SAMPLE_LIMIT {
                    let mut record = Map::new();
                    record.insert(self.column.clone(), data.json_value(&self.column, row)?);
                    violations_sample.push(Value::Object(record));
                }
            }
        }

        debug!(num_violations, "Range evaluation finished");

        let passed = num_violations == 0;
        let message = if passed {
            "Range check passed."
        } else {
            "Range check failed."
        };

        Ok(CheckResult::new(
            self.check_type(),
            dataset,
            passed,
            message,
            json!({
                "column": self.column,
                "min": self.declared.0,
                "max": self.declared.1,
                "num_violations": num_violations,
                "violations_sample": violations_sample,
            }),
        ))
    }
}
