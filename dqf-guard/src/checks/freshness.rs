//! Recency of the newest timestamp in a column.

use super::{parse_params, Check};
use crate::core::dataset::{float_to_json, scalar_to_datetime};
use crate::core::temporal::{parse_timestamp, utc_to_fixed};
use crate::core::{CheckResult, RunContext};
use crate::prelude::*;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use datafusion::scalar::ScalarValue;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

fn default_max_age_days() -> i64 {
    1
}

/// `max_age_days` as it may be written in a suite file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DayCount {
    Whole(i64),
    Fractional(f64),
    Text(String),
}

/// Accepts integers, floats (truncated toward zero) and integer strings.
fn deserialize_days<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match DayCount::deserialize(deserializer)? {
        DayCount::Whole(days) => Ok(days),
        DayCount::Fractional(days) if days.is_finite() => Ok(days.trunc() as i64),
        DayCount::Fractional(days) => Err(D::Error::custom(format!("invalid max_age_days {days}"))),
        DayCount::Text(text) => text.trim().parse().map_err(|_| {
            D::Error::custom(format!("max_age_days must be an integer, got {text:?}"))
        }),
    }
}

#[derive(Debug, Deserialize)]
struct FreshnessParams {
    column: String,
    #[serde(default = "default_max_age_days", deserialize_with = "deserialize_days")]
    max_age_days: i64,
}

/// Fails when the latest timestamp in `column` is older than `max_age_days`.
///
/// Values that do not parse as timestamps are ignored. A column with no
/// parseable value at all fails the check.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshnessCheck {
    column: String,
    max_age_days: i64,
}

impl FreshnessCheck {
    pub fn new(column: impl Into<String>, max_age_days: i64) -> Self {
        Self {
            column: column.into(),
            max_age_days,
        }
    }

    /// Builds the check from a suite payload with `column` and an optional
    /// `max_age_days` (default 1). The age may be written as an integer, a
    /// float (truncated) or an integer string.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let params: FreshnessParams = parse_params("freshness", payload)?;
        Ok(Self::new(params.column, params.max_age_days))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn max_age_days(&self) -> i64 {
        self.max_age_days
    }

    /// Evaluates the check against a fixed reference time.
    pub fn evaluate_at(
        &self,
        dataset: &str,
        ctx: &RunContext,
        now: DateTime<Utc>,
    ) -> Result<CheckResult> {
        let data = ctx.dataset(dataset)?;

        if !data.has_column(&self.column) {
            return Ok(CheckResult::new(
                self.check_type(),
                dataset,
                false,
                "Freshness check failed: column not found.",
                json!({"column": self.column}),
            ));
        }

        let mut latest: Option<DateTime<FixedOffset>> = None;
        let mut parsed = 0usize;
        for row in 0..data.num_rows() {
            let Some(timestamp) = to_timestamp(&data.scalar(&self.column, row)?) else {
                continue;
            };
            parsed += 1;
            if latest.map_or(true, |current| timestamp > current) {
                latest = Some(timestamp);
            }
        }

        let Some(latest) = latest else {
            return Ok(CheckResult::new(
                self.check_type(),
                dataset,
                false,
                "Freshness check failed: no parseable timestamps.",
                json!({"column": self.column}),
            ));
        };

        let age = now.signed_duration_since(latest.with_timezone(&Utc));
        let age_days = age.num_milliseconds() as f64 / 86_400_000.0;
        let limit = Duration::try_days(self.max_age_days).unwrap_or(Duration::MAX);
        let passed = age <= limit;
        debug!(parsed, latest = %latest, age_days, "Freshness evaluation finished");

        let message = if passed {
            "Freshness check passed."
        } else {
            "Freshness check failed."
        };

        Ok(CheckResult::new(
            self.check_type(),
            dataset,
            passed,
            message,
            json!({
                "column": self.column,
                "latest_timestamp": latest.to_rfc3339(),
                "age_days": float_to_json(age_days),
                "max_age_days": self.max_age_days,
            }),
        ))
    }
}

/// Interprets one cell as a timestamp.
///
/// Temporal columns are read directly, strings are parsed, and anything else
/// is parsed from its display form.
fn to_timestamp(value: &ScalarValue) -> Option<DateTime<FixedOffset>> {
    if value.is_null() {
        return None;
    }
    if let Some(instant) = scalar_to_datetime(value) {
        return Some(utc_to_fixed(instant));
    }
    match value {
        ScalarValue::Utf8(Some(raw))
        | ScalarValue::LargeUtf8(Some(raw))
        | ScalarValue::Utf8View(Some(raw)) => parse_timestamp(raw),
        other => parse_timestamp(&other.to_string()),
    }
}

impl Check for FreshnessCheck {
    fn check_type(&self) -> &'static str {
        "freshness"
    }

    #[instrument(skip(self, ctx), fields(check.type = "freshness", column = %self.column))]
    fn evaluate(&self, dataset: &str, ctx: &RunContext) -> Result<CheckResult> {
        self.evaluate_at(dataset, ctx, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Dataset;
    use crate::test_fixtures::sample_context;
    use arrow::array::StringArray;
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn strings_context(values: Vec<Option<&str>>) -> RunContext {
        let schema = Arc::new(Schema::new(vec![Field::new("ts", DataType::Utf8, true)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(values))]).unwrap();
        let mut datasets = HashMap::new();
        datasets.insert("events".to_string(), Dataset::new(batch));
        RunContext::new("freshness_tests", datasets)
    }

    #[test]
    fn test_latest_string_timestamp_is_used() {
        // orders.updated_at peaks at 2024-06-01T12:00:00Z
        let ctx = sample_context();
        let check = FreshnessCheck::new("updated_at", 1);

        let result = check
            .evaluate_at("orders", &ctx, at(2024, 6, 2, 0))
            .unwrap();
        assert!(result.passed, "{:?}", result.details);
        assert_eq!(result.message, "Freshness check passed.");
        assert_eq!(
            result.details["latest_timestamp"],
            json!("2024-06-01T12:00:00+00:00")
        );
        assert_eq!(result.details["age_days"], json!(0.5));
        assert_eq!(result.details["max_age_days"], json!(1));

        let result = check
            .evaluate_at("orders", &ctx, at(2024, 6, 3, 0))
            .unwrap();
        assert!(!result.passed);
        assert_eq!(result.message, "Freshness check failed.");
        assert_eq!(result.details["age_days"], json!(1.5));
    }

    #[test]
    fn test_age_equal_to_limit_passes() {
        let ctx = strings_context(vec![Some("2024-01-01T00:00:00Z")]);
        let result = FreshnessCheck::new("ts", 2)
            .evaluate_at("events", &ctx, at(2024, 1, 3, 0))
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.details["age_days"], json!(2.0));
    }

    #[test]
    fn test_wall_clock_evaluation() {
        let ctx = strings_context(vec![Some("2024-01-01T00:00:00Z")]);
        assert!(FreshnessCheck::new("ts", 36_500).evaluate("events", &ctx).unwrap().passed);
        assert!(!FreshnessCheck::new("ts", 0).evaluate("events", &ctx).unwrap().passed);
    }

    #[test]
    fn test_unparseable_values_are_ignored() {
        let ctx = strings_context(vec![
            Some("not a date"),
            None,
            Some("2024-01-02 00:00:00"),
            Some("2024-01-01T23:00:00-03:00"),
        ]);
        let result = FreshnessCheck::new("ts", 1)
            .evaluate_at("events", &ctx, at(2024, 1, 2, 12))
            .unwrap();
        assert!(result.passed);
        // 23:00-03:00 is 02:00Z on the 2nd, later than midnight UTC
        assert_eq!(
            result.details["latest_timestamp"],
            json!("2024-01-01T23:00:00-03:00")
        );
    }

    #[test]
    fn test_no_parseable_timestamps() {
        let ctx = strings_context(vec![Some("soon"), None]);
        let result = FreshnessCheck::new("ts", 1)
            .evaluate_at("events", &ctx, at(2024, 1, 1, 0))
            .unwrap();
        assert!(!result.passed);
        assert_eq!(result.message, "Freshness check failed: no parseable timestamps.");
        assert_eq!(result.details, json!({"column": "ts"}));
    }

    #[test]
    fn test_native_timestamp_column() {
        // customers.signup_date is a UTC timestamp column
        let ctx = sample_context();
        let result = FreshnessCheck::new("signup_date", 10_000)
            .evaluate_at("customers", &ctx, at(2024, 6, 1, 0))
            .unwrap();
        assert!(result.passed);
        assert_eq!(
            result.details["latest_timestamp"],
            json!("2024-05-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_max_age_days_accepts_loose_numbers() {
        let cases = [
            (json!(3), 3),
            (json!("3"), 3),
            (json!(" 7 "), 7),
            (json!(1.0), 1),
            (json!(2.9), 2),
        ];
        for (raw, expected) in cases {
            let payload = json!({"column": "updated_at", "max_age_days": raw});
            let check = FreshnessCheck::from_payload(payload.as_object().unwrap()).unwrap();
            assert_eq!(check.max_age_days(), expected);
        }

        let payload = json!({"column": "updated_at", "max_age_days": "three"});
        let err = FreshnessCheck::from_payload(payload.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, DqfError::InvalidCheckParameters { .. }));
    }

    #[test]
    fn test_missing_column_and_default_age() {
        let ctx = sample_context();
        let result = FreshnessCheck::new("shipped_at", 1)
            .evaluate("orders", &ctx)
            .unwrap();
        assert_eq!(result.message, "Freshness check failed: column not found.");

        let payload = json!({"column": "updated_at"});
        let check = FreshnessCheck::from_payload(payload.as_object().unwrap()).unwrap();
        assert_eq!(check.max_age_days(), 1);
    }
}
