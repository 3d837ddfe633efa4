//! Error types for the dqf-guard data quality engine.
//!
//! Errors fall into two classes. Run-fatal errors (a malformed suite document,
//! a missing dataset file, an unreadable data source) are returned from the
//! loaders and abort the run before any check executes. Check-local errors are
//! returned from [`Check::evaluate`](crate::checks::Check::evaluate) and are
//! turned into a failed [`CheckResult`](crate::core::CheckResult) by the
//! engine, so a single faulty check never stops the rest of the suite.

use thiserror::Error;

/// The main error type for dqf-guard.
#[derive(Error, Debug)]
pub enum DqfError {
    /// The suite document is malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A known check type was declared with parameters it cannot accept.
    #[error("Invalid parameters for check '{check_type}': {message}")]
    InvalidCheckParameters {
        /// Type tag of the offending check
        check_type: String,
        /// Where and why the parameters were rejected
        message: String,
    },

    /// A dataset file referenced by the suite does not exist.
    #[error("Dataset file not found: {path}")]
    DatasetNotFound {
        /// Full path that was looked up
        path: String,
    },

    /// A check asked the run context for a dataset that was never loaded.
    #[error("Dataset '{name}' is not loaded in the run context")]
    DatasetNotLoaded { name: String },

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV", "Parquet", "JSON")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error when a required column is not found in the dataset.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while reading the YAML suite document.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error from JSON serialization or conversion.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, DqfError>`.
pub type Result<T> = std::result::Result<T, DqfError>;

impl DqfError {
    /// Creates a new invalid-parameters error for a check type.
    pub fn invalid_parameters(check_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCheckParameters {
            check_type: check_type.into(),
            message: message.into(),
        }
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns true for errors that must abort a run rather than fail one check.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::InvalidCheckParameters { .. }
                | Self::DatasetNotFound { .. }
                | Self::DataSource { .. }
                | Self::Yaml(_)
                | Self::Io(_)
        )
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<DqfError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| wrap(msg, e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(&f(), e.into()))
    }
}

fn wrap(msg: &str, err: DqfError) -> DqfError {
    match err {
        DqfError::Configuration(inner) => DqfError::Configuration(format!("{msg}: {inner}")),
        DqfError::Internal(inner) => DqfError::Internal(format!("{msg}: {inner}")),
        other => DqfError::Internal(format!("{msg}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_parameters_error() {
        let err = DqfError::invalid_parameters("range", "missing field `column`");
        assert_eq!(
            err.to_string(),
            "Invalid parameters for check 'range': missing field `column`"
        );
        assert!(err.is_run_fatal());
    }

    #[test]
    fn test_dataset_not_found() {
        let err = DqfError::DatasetNotFound {
            path: "data/orders.csv".to_string(),
        };
        assert_eq!(err.to_string(), "Dataset file not found: data/orders.csv");
        assert!(err.is_run_fatal());
    }

    #[test]
    fn test_check_local_errors_are_not_fatal() {
        let err = DqfError::ColumnNotFound {
            column: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "Column 'amount' not found in dataset");
        assert!(!err.is_run_fatal());
        assert!(!DqfError::DatasetNotLoaded {
            name: "orders".to_string()
        }
        .is_run_fatal());
    }

    #[test]
    fn test_data_source_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad header");
        let err = DqfError::data_source_with_source("CSV", "Could not read file", Box::new(source));
        assert_eq!(err.to_string(), "Data source error: Could not read file");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_context() {
        fn failing_operation() -> Result<()> {
            Err(DqfError::Configuration("missing `suite_name`".to_string()))
        }

        let err = failing_operation()
            .context("Reading rules.yaml")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Reading rules.yaml: missing `suite_name`"
        );
    }
}
