//! Delimited text file source.

use super::{collect_dataset, DataSource};
use crate::core::Dataset;
use crate::prelude::*;
use async_trait::async_trait;
use datafusion::prelude::*;
use std::path::Path;
use tracing::instrument;

/// Cell values read as missing by default, besides the empty field.
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Builds an anchored regex matching the empty field and each of `markers`.
pub fn null_regex_for(markers: &[&str]) -> String {
    let alternatives: Vec<String> = markers.iter().map(|m| regex::escape(m)).collect();
    format!("^(?:|{})$", alternatives.join("|"))
}

/// Options for configuring CSV file reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Maximum records to read for schema inference
    pub schema_infer_max_records: usize,
    /// Cells matching this regex are missing (`None`: only empty fields)
    pub null_regex: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            schema_infer_max_records: 1000,
            null_regex: Some(null_regex_for(DEFAULT_NA_VALUES)),
        }
    }
}

/// A CSV (or TSV) file with an inferred schema.
///
/// Empty fields and the usual missing-value markers (`NA`, `N/A`, `null`,
/// `NaN`, ...) are read as missing values.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: String,
    options: CsvOptions,
}

impl CsvSource {
    /// Creates a new CSV source with default options.
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_options(path, CsvOptions::default())
    }

    /// Creates a new CSV source with custom options.
    pub fn with_options(path: impl Into<String>, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    fn file_extension(&self) -> String {
        Path::new(&self.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataSource for CsvSource {
    #[instrument(skip(self), fields(source_type = "csv", path = %self.path))]
    async fn load(&self) -> Result<Dataset> {
        let ctx = SessionContext::new();
        let extension = self.file_extension();
        let read_options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .schema_infer_max_records(self.options.schema_infer_max_records)
            .null_regex(self.options.null_regex.clone())
            .file_extension(&extension);

        let df = ctx
            .read_csv(self.path.as_str(), read_options)
            .await
            .map_err(|e| {
                DqfError::data_source_with_source(
                    "CSV",
                    format!("Could not read {}", self.path),
                    Box::new(e),
                )
            })?;
        collect_dataset(df).await
    }

    fn description(&self) -> String {
        format!("CSV file: {}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::DataType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_csv_load_infers_types_and_nulls() {
        let file = temp_file(".csv", "id,name,amount\n1,alice,10.5\n2,,20\n3,carol,\n");
        let source = CsvSource::new(file.path().to_str().unwrap());

        let dataset = source.load().await.unwrap();
        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.column_names(), vec!["id", "name", "amount"]);
        assert_eq!(dataset.data_type("id").unwrap(), &DataType::Int64);
        assert_eq!(dataset.data_type("amount").unwrap(), &DataType::Float64);
        assert_eq!(dataset.missing_count("name").unwrap(), 1);
        assert_eq!(dataset.missing_count("amount").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_na_markers_are_missing() {
        let file = temp_file(
            ".csv",
            "id,email,score\n1,NA,NA\n2,a@x.com,3\n3,N/A,\n4,null,NaN\n",
        );
        let dataset = CsvSource::new(file.path().to_str().unwrap())
            .load()
            .await
            .unwrap();
        assert_eq!(dataset.missing_count("email").unwrap(), 3);
        assert_eq!(dataset.missing_count("score").unwrap(), 3);
        assert_eq!(dataset.data_type("score").unwrap(), &DataType::Int64);

        let literal = CsvOptions {
            null_regex: None,
            ..Default::default()
        };
        let dataset = CsvSource::with_options(file.path().to_str().unwrap(), literal)
            .load()
            .await
            .unwrap();
        assert_eq!(dataset.missing_count("email").unwrap(), 0);
    }

    #[test]
    fn test_null_regex_is_anchored() {
        let re = regex::Regex::new(&null_regex_for(DEFAULT_NA_VALUES)).unwrap();
        assert!(re.is_match(""));
        assert!(re.is_match("#N/A"));
        assert!(re.is_match("None"));
        assert!(!re.is_match("NAME"));
        assert!(!re.is_match("1.5"));
    }

    #[tokio::test]
    async fn test_tsv_load() {
        let file = temp_file(".tsv", "id\tcode\n1\ta\n2\tb\n");
        let options = CsvOptions {
            delimiter: b'\t',
            ..Default::default()
        };
        let source = CsvSource::with_options(file.path().to_str().unwrap(), options);

        let dataset = source.load().await.unwrap();
        assert_eq!(dataset.num_rows(), 2);
        assert!(dataset.has_column("code"));
        assert!(source.description().starts_with("CSV file:"));
    }
}
