//! # dqf-guard - Declarative data-quality suites
//!
//! dqf-guard runs a suite of data-quality checks, declared in YAML, against
//! tabular files loaded through DataFusion. Every declared check produces
//! exactly one pass/fail result; the results are aggregated into a report that
//! can be written as JSON and HTML.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dqf_guard::prelude::*;
//! use dqf_guard::core::run_suite;
//! use dqf_guard::formatters::write_report;
//! use dqf_guard::sources::{load_context, LoadOptions};
//!
//! # async fn example() -> dqf_guard::error::Result<()> {
//! let suite = SuiteSpec::from_yaml_str(
//!     r#"
//! suite_name: nightly
//! datasets:
//!   - name: orders
//!     path: orders.csv
//!     checks:
//!       - type: unique
//!         columns: [order_id]
//!       - type: null_rate
//!         thresholds: {customer_id: 0.0}
//! "#,
//! )?;
//!
//! let ctx = load_context(&suite, &LoadOptions::new("data")).await?;
//! let report = Report::from_results(suite.suite_name(), run_suite(&suite, &ctx));
//! write_report("reports", &report)?;
//!
//! if !report.all_passed() {
//!     for failure in report.failures() {
//!         println!("{} [{}]: {}", failure.dataset, failure.check_type, failure.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Checks
//!
//! | tag         | passes when                                                   |
//! |-------------|---------------------------------------------------------------|
//! | `schema`    | every expected column exists with a compatible type           |
//! | `null_rate` | each column's missing fraction is at most its threshold       |
//! | `range`     | every present numeric value lies within the inclusive bounds  |
//! | `unique`    | no two rows share the same values in the key columns          |
//! | `fk`        | every present value occurs in a column of another dataset     |
//! | `freshness` | the newest timestamp is at most `max_age_days` old            |
//!
//! ## Architecture
//!
//! - **`core`**: suite model, run context, execution engine and report types
//! - **`checks`**: the built-in checks and the tag registry
//! - **`sources`**: CSV, Parquet and JSON loading through DataFusion
//! - **`formatters`**: JSON, HTML and console rendering of reports
//! - **`logging`**: `tracing` subscriber setup

pub mod checks;
pub mod core;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod sources;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
