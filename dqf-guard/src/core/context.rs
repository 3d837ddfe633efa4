//! The read-only environment shared by every check in a run.

use super::Dataset;
use crate::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Every loaded dataset of one suite run.
///
/// Built once, after all datasets are loaded, and never mutated afterwards.
/// Cross-dataset checks rely on the map being complete.
#[derive(Debug, Clone)]
pub struct RunContext {
    suite_name: String,
    datasets: HashMap<String, Dataset>,
    metadata: Map<String, Value>,
}

impl RunContext {
    /// Creates a context over fully loaded datasets.
    pub fn new(suite_name: impl Into<String>, datasets: HashMap<String, Dataset>) -> Self {
        Self {
            suite_name: suite_name.into(),
            datasets,
            metadata: Map::new(),
        }
    }

    /// Attaches free-form run metadata. No built-in check reads it.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// Looks up a loaded dataset by name.
    pub fn dataset(&self, name: &str) -> Result<&Dataset> {
        self.datasets
            .get(name)
            .ok_or_else(|| DqfError::DatasetNotLoaded {
                name: name.to_string(),
            })
    }

    pub fn contains_dataset(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// Returns the loaded dataset names, sorted.
    pub fn dataset_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
