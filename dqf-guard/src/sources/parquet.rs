//! Parquet file source.

use super::{collect_dataset, DataSource};
use crate::core::Dataset;
use crate::prelude::*;
use async_trait::async_trait;
use datafusion::prelude::*;
use tracing::instrument;

/// A Parquet file; the schema comes from the file metadata.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: String,
}

impl ParquetSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for ParquetSource {
    #[instrument(skip(self), fields(source_type = "parquet", path = %self.path))]
    async fn load(&self) -> Result<Dataset> {
        let ctx = SessionContext::new();
        let df = ctx
            .read_parquet(self.path.as_str(), ParquetReadOptions::default())
            .await
            .map_err(|e| {
                DqfError::data_source_with_source(
                    "Parquet",
                    format!("Could not read {}", self.path),
                    Box::new(e),
                )
            })?;
        collect_dataset(df).await
    }

    fn description(&self) -> String {
        format!("Parquet file: {}", self.path)
    }
}
