//! Newline-delimited JSON file source.

use super::{collect_dataset, DataSource};
use crate::core::Dataset;
use crate::prelude::*;
use async_trait::async_trait;
use datafusion::prelude::*;
use std::path::Path;
use tracing::instrument;

/// A file with one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: String,
}

impl JsonSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for JsonSource {
    #[instrument(skip(self), fields(source_type = "json", path = %self.path))]
    async fn load(&self) -> Result<Dataset> {
        let ctx = SessionContext::new();
        let extension = Path::new(&self.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let options = NdJsonReadOptions::default().file_extension(&extension);

        let df = ctx
            .read_json(self.path.as_str(), options)
            .await
            .map_err(|e| {
                DqfError::data_source_with_source(
                    "JSON",
                    format!("Could not read {}", self.path),
                    Box::new(e),
                )
            })?;
        collect_dataset(df).await
    }

    fn description(&self) -> String {
        format!("JSON file: {}", self.path)
    }
}
