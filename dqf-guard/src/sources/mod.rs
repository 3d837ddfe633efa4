//! Dataset loading for suite runs.
//!
//! Every dataset of a suite is read into memory before any check executes,
//! because referential-integrity checks need the full set. Files are read
//! through DataFusion; the reader is chosen from the file extension:
//!
//! | extension              | source            |
//! |------------------------|-------------------|
//! | `.csv`, `.tsv`, `.txt` | [`CsvSource`]     |
//! | `.parquet`             | [`ParquetSource`] |
//! | `.json`, `.ndjson`     | [`JsonSource`]    |
//!
//! String columns whose names look temporal (`date`, `time`, `ts`,
//! `timestamp`) are converted to UTC timestamps when every value parses.

use crate::core::temporal::parse_timestamp;
use crate::core::{Dataset, RunContext, SuiteSpec};
use crate::prelude::*;
use arrow::array::{Array, ArrayRef, AsArray, TimestampMicrosecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::prelude::DataFrame;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

mod csv;
mod json;
mod parquet;

pub use csv::{null_regex_for, CsvOptions, CsvSource, DEFAULT_NA_VALUES};
pub use json::JsonSource;
pub use parquet::ParquetSource;

static DATETIME_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)date|time|ts|timestamp").expect("Hard-coded regex pattern should be valid")
});

/// A file that can be read into a [`Dataset`].
#[async_trait]
pub trait DataSource: Debug + Send + Sync {
    /// Reads every row of the source.
    async fn load(&self) -> Result<Dataset>;

    /// Returns a human-readable description of this data source.
    fn description(&self) -> String;
}

/// Options controlling how suite datasets are located and read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory that dataset paths are relative to
    pub data_dir: PathBuf,
    /// Options for delimited text files
    pub csv: CsvOptions,
    /// Whether to convert temporal-looking string columns to timestamps
    pub parse_datetimes: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            csv: CsvOptions::default(),
            parse_datetimes: true,
        }
    }
}

impl LoadOptions {
    /// Creates options reading datasets relative to `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_csv_options(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    pub fn with_datetime_parsing(mut self, enabled: bool) -> Self {
        self.parse_datetimes = enabled;
        self
    }
}

/// Picks the reader for a file from its extension.
pub fn source_for_path(path: &Path, options: &LoadOptions) -> Result<Box<dyn DataSource>> {
    let display = path.to_string_lossy().to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "tsv" | "txt" => {
            let mut csv = options.csv.clone();
            if extension == "tsv" {
                csv.delimiter = b'\t';
            }
            Ok(Box::new(CsvSource::with_options(display, csv)))
        }
        "parquet" => Ok(Box::new(ParquetSource::new(display))),
        "json" | "ndjson" | "jsonl" => Ok(Box::new(JsonSource::new(display))),
        other => Err(DqfError::data_source(
            "file",
            format!("Unsupported file extension '{other}' for {display}"),
        )),
    }
}

/// Loads every dataset of the suite.
///
/// A missing file aborts loading with [`DqfError::DatasetNotFound`]. When two
/// datasets share a name the later one wins.
#[instrument(skip_all, fields(suite.name = %suite.suite_name(), data_dir = %options.data_dir.display()))]
pub async fn load_datasets(
    suite: &SuiteSpec,
    options: &LoadOptions,
) -> Result<HashMap<String, Dataset>> {
    let mut datasets = HashMap::new();
    for spec in suite.datasets() {
        let path = options.data_dir.join(spec.path());
        if !path.is_file() {
            return Err(DqfError::DatasetNotFound {
                path: path.display().to_string(),
            });
        }

        let source = source_for_path(&path, options)?;
        let mut dataset = source.load().await?;
        if options.parse_datetimes {
            dataset = parse_datetime_columns(dataset)?;
        }
        info!(
            dataset.name = %spec.name(),
            dataset.rows = dataset.num_rows(),
            dataset.columns = dataset.column_names().len(),
            source = %source.description(),
            "Loaded dataset"
        );
        datasets.insert(spec.name().to_string(), dataset);
    }
    Ok(datasets)
}

/// Loads every dataset of the suite and wraps them in a run context.
pub async fn load_context(suite: &SuiteSpec, options: &LoadOptions) -> Result<RunContext> {
    let datasets = load_datasets(suite, options).await?;
    Ok(RunContext::new(suite.suite_name(), datasets))
}

/// Converts temporal-looking string columns to UTC microsecond timestamps.
///
/// A column is converted only if its name matches the heuristic and every
/// non-missing value parses; otherwise it is left as it was.
pub fn parse_datetime_columns(dataset: Dataset) -> Result<Dataset> {
    let schema = dataset.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    let mut changed = false;

    for (field, column) in schema.fields().iter().zip(dataset.batch().columns()) {
        let converted = if DATETIME_NAME.is_match(field.name()) {
            parse_timestamp_column(column)?
        } else {
            None
        };

        match converted {
            Some(timestamps) => {
                debug!(column = %field.name(), "Parsed column as timestamps");
                fields.push(Field::new(
                    field.name(),
                    timestamps.data_type().clone(),
                    true,
                ));
                columns.push(Arc::new(timestamps));
                changed = true;
            }
            None => {
                fields.push(field.as_ref().clone());
                columns.push(column.clone());
            }
        }
    }

    if !changed {
        return Ok(dataset);
    }
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("Rebuilding dataset with parsed timestamp columns")?;
    Ok(Dataset::new(batch))
}

fn parse_timestamp_column(column: &ArrayRef) -> Result<Option<TimestampMicrosecondArray>> {
    if !matches!(
        column.data_type(),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    ) {
        return Ok(None);
    }

    let strings = cast(column, &DataType::Utf8)?;
    let mut micros = Vec::with_capacity(strings.len());
    for value in strings.as_string::<i32>().iter() {
        match value {
            None => micros.push(None),
            Some(raw) if raw.trim().is_empty() => micros.push(None),
            Some(raw) => match parse_timestamp(raw) {
                Some(parsed) => micros.push(Some(parsed.timestamp_micros())),
                None => return Ok(None),
            },
        }
    }

    Ok(Some(
        TimestampMicrosecondArray::from(micros).with_timezone("UTC"),
    ))
}

/// Collects a DataFrame into a single-batch dataset.
pub(crate) async fn collect_dataset(df: DataFrame) -> Result<Dataset> {
    let schema = df.schema().inner().clone();
    let batches = df.collect().await?;
    Dataset::from_batches(schema, &batches)
}
