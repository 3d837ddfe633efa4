//! Per-column ceilings on the fraction of missing values.

use super::{ordered_entries, parse_params, Check};
use crate::core::dataset::float_to_json;
use crate::core::{CheckResult, RunContext};
use crate::prelude::*;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct NullRateParams {
    thresholds: Map<String, Value>,
}

/// Fails when a column's missing-value rate exceeds its threshold.
///
/// The boundary is inclusive: a rate equal to the threshold passes. A listed
/// column that does not exist fails the check with a `column_not_found`
/// entry and has no rate recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NullRateCheck {
    thresholds: Vec<(String, f64)>,
}

impl NullRateCheck {
    /// Creates a null-rate check from `(column, max_rate)` pairs.
    pub fn new<I, S>(thresholds: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            thresholds: thresholds
                .into_iter()
                .map(|(column, threshold)| (column.into(), threshold))
                .collect(),
        }
    }

    /// Builds the check from a suite payload with a `thresholds` mapping.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let params: NullRateParams = parse_params("null_rate", payload)?;
        let thresholds = ordered_entries("null_rate", "thresholds", params.thresholds)?;
        Ok(Self { thresholds })
    }

    /// Returns the configured thresholds in declaration order.
    pub fn thresholds(&self) -> &[(String, f64)] {
        &self.thresholds
    }
}

impl Check for NullRateCheck {
    fn check_type(&self) -> &'static str {
        "null_rate"
    }

    #[instrument(skip(self, ctx), fields(check.type = "null_rate"))]
    fn evaluate(&self, dataset: &str, ctx: &RunContext) -> Result<CheckResult> {
        let data = ctx.dataset(dataset)?;
        let rows = data.num_rows();

        let mut actual = Map::new();
        let mut failed = Map::new();

        for (column, threshold) in &self.thresholds {
            if !data.has_column(column) {
                failed.insert(column.clone(), json!({"error": "column_not_found"}));
                continue;
            }

            let missing = data.missing_count(column)?;
            let rate = if rows == 0 {
                0.0
            } else {
                missing as f64 / rows as f64
            };
            debug!(column = %column, rate, threshold, "Computed null rate");

            actual.insert(column.clone(), float_to_json(rate));
            if rate > *threshold {
                failed.insert(
                    column.clone(),
                    json!({"threshold": float_to_json(*threshold), "actual": float_to_json(rate)}),
                );
            }
        }

        let passed = failed.is_empty();
        let message = if passed {
            "Null-rate thresholds satisfied."
        } else {
            "Null-rate check failed."
        };

        Ok(CheckResult::new(
            self.check_type(),
            dataset,
            passed,
            message,
            json!({"actual": actual, "failed": failed}),
        ))
    }
}
