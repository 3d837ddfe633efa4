//! Prelude for commonly used types and traits in dqf-guard.

pub use crate::checks::{Check, CheckRegistry};
pub use crate::core::{CheckResult, Report, RunContext, SuiteSpec};
pub use crate::error::{DqfError, ErrorContext, Result};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::setup::LoggingConfig;
