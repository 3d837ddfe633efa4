//! Built-in checks and the registry that maps type tags to them.
//!
//! Every check implements [`Check`]: it reads one dataset (and, for `fk`, a
//! second referenced dataset) out of the shared [`RunContext`] and returns a
//! [`CheckResult`]. Checks never mutate the context.
//!
//! | tag         | check                  | parameters                           |
//! |-------------|------------------------|--------------------------------------|
//! | `schema`    | [`SchemaCheck`]        | `columns`                            |
//! | `null_rate` | [`NullRateCheck`]      | `thresholds`                         |
//! | `range`     | [`RangeCheck`]         | `column`, `min`, `max`               |
//! | `unique`    | [`UniquenessCheck`]    | `columns`                            |
//! | `fk`        | [`ForeignKeyCheck`]    | `column`, `ref_dataset`, `ref_column`|
//! | `freshness` | [`FreshnessCheck`]     | `column`, `max_age_days` (default 1) |
//!
//! Parameters are validated when the suite is parsed, so a check that reaches
//! evaluation always has a well-formed configuration.

use crate::core::{CheckResult, RunContext};
use crate::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt::Debug;

mod foreign_key;
mod freshness;
mod null_rate;
mod range;
mod schema;
mod uniqueness;

pub use foreign_key::ForeignKeyCheck;
pub use freshness::FreshnessCheck;
pub use null_rate::NullRateCheck;
pub use range::RangeCheck;
pub use schema::{ColumnType, SchemaCheck};
pub use uniqueness::UniquenessCheck;

/// Maximum number of offending values or rows copied into a result's details.
pub const SAMPLE_LIMIT: usize = 50;

/// A validation rule evaluated against one dataset of a run.
pub trait Check: Debug + Send + Sync {
    /// The registry tag of this check, used as `check_type` in results.
    fn check_type(&self) -> &'static str;

    /// Evaluates the check against `dataset` in the run context.
    ///
    /// Semantic failures (missing columns, threshold breaches, ...) are
    /// returned as `Ok` with `passed == false`. An `Err` means the check
    /// could not be evaluated at all; the engine records it as a failed
    /// result and moves on.
    fn evaluate(&self, dataset: &str, ctx: &RunContext) -> Result<CheckResult>;
}

/// The closed set of built-in checks with their typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckKind {
    Schema(SchemaCheck),
    NullRate(NullRateCheck),
    Range(RangeCheck),
    Unique(UniquenessCheck),
    ForeignKey(ForeignKeyCheck),
    Freshness(FreshnessCheck),
}

impl CheckKind {
    /// Returns the check as a trait object.
    pub fn as_check(&self) -> &dyn Check {
        match self {
            Self::Schema(check) => check,
            Self::NullRate(check) => check,
            Self::Range(check) => check,
            Self::Unique(check) => check,
            Self::ForeignKey(check) => check,
            Self::Freshness(check) => check,
        }
    }
}

/// Static mapping from check type tag to check constructor.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckRegistry;

impl CheckRegistry {
    /// Tags of every registered check, in registration order.
    pub const KNOWN_TYPES: [&'static str; 6] =
        ["schema", "null_rate", "range", "unique", "fk", "freshness"];

    /// Returns the registered type tags.
    pub fn known_types() -> &'static [&'static str] {
        &Self::KNOWN_TYPES
    }

    /// Returns true if `check_type` names a registered check.
    pub fn is_known(check_type: &str) -> bool {
        Self::KNOWN_TYPES.contains(&check_type)
    }

    /// Builds the typed check for a tag from its untyped payload.
    ///
    /// Returns `Ok(None)` for an unknown tag, which is not an error at this
    /// stage: the engine reports it as a failed result. Malformed parameters
    /// for a known tag are an error.
    pub fn resolve(check_type: &str, payload: &Map<String, Value>) -> Result<Option<CheckKind>> {
        let kind = match check_type {
            "schema" => CheckKind::Schema(SchemaCheck::from_payload(payload)?),
            "null_rate" => CheckKind::NullRate(NullRateCheck::from_payload(payload)?),
            "range" => CheckKind::Range(RangeCheck::from_payload(payload)?),
            "unique" => CheckKind::Unique(UniquenessCheck::from_payload(payload)?),
            "fk" => CheckKind::ForeignKey(ForeignKeyCheck::from_payload(payload)?),
            "freshness" => CheckKind::Freshness(FreshnessCheck::from_payload(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }
}

/// Deserializes a check's parameter struct from its payload.
pub(crate) fn parse_params<T: DeserializeOwned>(
    check_type: &str,
    payload: &Map<String, Value>,
) -> Result<T> {
    serde_json::from_value(Value::Object(payload.clone()))
        .map_err(|e| DqfError::invalid_parameters(check_type, e.to_string()))
}

/// Converts an ordered JSON object into `(key, value)` pairs of a typed value.
pub(crate) fn ordered_entries<T: DeserializeOwned>(
    check_type: &str,
    field: &str,
    map: Map<String, Value>,
) -> Result<Vec<(String, T)>> {
    map.into_iter()
        .map(|(key, value)| {
            let typed = serde_json::from_value(value).map_err(|e| {
                DqfError::invalid_parameters(check_type, format!("`{field}.{key}`: {e}"))
            })?;
            Ok((key, typed))
        })
        .collect()
}
