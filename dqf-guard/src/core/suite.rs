//! Suite model: the datasets of a run and the checks declared on each.
//!
//! A suite document looks like this:
//!
//! ```yaml
//! suite_name: nightly_orders
//! datasets:
//!   - name: orders
//!     path: orders.csv
//!     checks:
//!       - type: unique
//!         columns: [order_id]
//!       - type: range
//!         column: amount
//!         min: 0
//!         max: 10000
//! ```
//!
//! Every key of a check entry other than `type` becomes a parameter of the
//! check. Parameters of known check types are validated while the suite is
//! parsed; unknown types are kept and reported as failed results at run time.

use crate::checks::{CheckKind, CheckRegistry};
use crate::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct RawSuite {
    suite_name: String,
    #[serde(default)]
    datasets: Option<Vec<RawDataset>>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    name: String,
    path: String,
    #[serde(default)]
    checks: Option<Vec<Map<String, Value>>>,
}

/// One check entry: a type tag plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSpec {
    check_type: String,
    payload: Map<String, Value>,
    kind: Option<CheckKind>,
}

impl CheckSpec {
    /// Creates a check entry, resolving the typed check for known tags.
    ///
    /// Fails only when a known tag carries parameters its check cannot accept.
    pub fn new(check_type: impl Into<String>, payload: Map<String, Value>) -> Result<Self> {
        let check_type = check_type.into();
        let kind = CheckRegistry::resolve(&check_type, &payload)?;
        Ok(Self {
            check_type,
            payload,
            kind,
        })
    }

    /// Creates a check entry from a JSON object of parameters.
    pub fn from_json(check_type: impl Into<String>, params: Value) -> Result<Self> {
        let check_type = check_type.into();
        match params {
            Value::Object(payload) => Self::new(check_type, payload),
            Value::Null => Self::new(check_type, Map::new()),
            other => Err(DqfError::invalid_parameters(
                check_type,
                format!("parameters must be a mapping, got {other}"),
            )),
        }
    }

    /// The declared type tag.
    pub fn check_type(&self) -> &str {
        &self.check_type
    }

    /// The declared parameters, in document order.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// The resolved check, or `None` if the tag is not registered.
    pub fn kind(&self) -> Option<&CheckKind> {
        self.kind.as_ref()
    }
}

/// One dataset of the suite and its checks.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    name: String,
    path: String,
    checks: Vec<CheckSpec>,
}

impl DatasetSpec {
    /// Creates a dataset entry. `path` is relative to the data directory.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            checks: Vec::new(),
        }
    }

    /// Appends a check.
    pub fn with_check(mut self, check: CheckSpec) -> Self {
        self.checks.push(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The checks in declaration order.
    pub fn checks(&self) -> &[CheckSpec] {
        &self.checks
    }
}

/// A named, ordered collection of datasets and their checks.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteSpec {
    suite_name: String,
    datasets: Vec<DatasetSpec>,
}

impl SuiteSpec {
    /// Starts building a suite programmatically.
    pub fn builder(suite_name: impl Into<String>) -> SuiteSpecBuilder {
        SuiteSpecBuilder::new(suite_name)
    }

    /// Reads and parses a YAML suite file.
    #[instrument(skip(path), fields(suite.path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DqfError::Configuration(format!("cannot read suite file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parses a YAML suite document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(text)?;
        Self::from_value(document)
    }

    /// Builds the suite from an already-parsed document.
    pub fn from_value(document: Value) -> Result<Self> {
        let raw: RawSuite = serde_json::from_value(document)
            .map_err(|e| DqfError::Configuration(format!("invalid suite document: {e}")))?;

        let mut datasets = Vec::new();
        for raw_dataset in raw.datasets.unwrap_or_default() {
            let mut dataset = DatasetSpec::new(raw_dataset.name, raw_dataset.path);
            for (index, mut entry) in raw_dataset.checks.unwrap_or_default().into_iter().enumerate() {
                let check_type = match entry.remove("type") {
                    Some(Value::String(tag)) => tag,
                    Some(other) => {
                        return Err(DqfError::Configuration(format!(
                            "dataset '{}', check #{index}: `type` must be a string, got {other}",
                            dataset.name
                        )))
                    }
                    None => {
                        return Err(DqfError::Configuration(format!(
                            "dataset '{}', check #{index}: missing `type`",
                            dataset.name
                        )))
                    }
                };

                let check = CheckSpec::new(check_type, entry).map_err(|e| match e {
                    DqfError::InvalidCheckParameters {
                        check_type,
                        message,
                    } => DqfError::InvalidCheckParameters {
                        message: format!("dataset '{}', check #{index}: {message}", dataset.name),
                        check_type,
                    },
                    other => other,
                })?;
                dataset.checks.push(check);
            }
            debug!(
                dataset.name = %dataset.name,
                dataset.checks = dataset.checks.len(),
                "Parsed dataset entry"
            );
            datasets.push(dataset);
        }

        Ok(Self {
            suite_name: raw.suite_name,
            datasets,
        })
    }

    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// The datasets in declaration order.
    pub fn datasets(&self) -> &[DatasetSpec] {
        &self.datasets
    }

    /// Total number of declared checks across all datasets.
    pub fn total_checks(&self) -> usize {
        self.datasets.iter().map(|d| d.checks.len()).sum()
    }
}

/// Builder for [`SuiteSpec`].
#[derive(Debug)]
pub struct SuiteSpecBuilder {
    suite_name: String,
    datasets: Vec<DatasetSpec>,
}

impl SuiteSpecBuilder {
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            datasets: Vec::new(),
        }
    }

    /// Appends a dataset entry.
    pub fn dataset(mut self, dataset: DatasetSpec) -> Self {
        self.datasets.push(dataset);
        self
    }

    pub fn build(self) -> SuiteSpec {
        SuiteSpec {
            suite_name: self.suite_name,
            datasets: self.datasets,
        }
    }
}
