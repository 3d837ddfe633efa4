//! Core types for suite definition, execution and reporting.
//!
//! ## Overview
//!
//! - **[`SuiteSpec`]**: the datasets of a run and the checks declared on each
//! - **[`Dataset`]**: one loaded table, handed read-only to checks
//! - **[`RunContext`]**: every loaded dataset of the run, keyed by name
//! - **[`run_suite`]**: evaluates each declared check exactly once, in order
//! - **[`Report`]**: summary counts and the ordered results of a run
//!
//! ## Data flow
//!
//! ```text
//! SuiteSpec ──load──> RunContext ──run_suite──> Vec<CheckResult> ──> Report
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use dqf_guard::core::{run_suite, Report, SuiteSpec};
//! use dqf_guard::sources::{load_context, LoadOptions};
//!
//! # async fn example() -> dqf_guard::error::Result<()> {
//! let suite = SuiteSpec::from_path("rules.yaml")?;
//! let ctx = load_context(&suite, &LoadOptions::new("data")).await?;
//!
//! let report = Report::from_results(suite.suite_name(), run_suite(&suite, &ctx));
//! println!("{} of {} checks failed", report.summary.failed, report.summary.total_checks);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod dataset;
pub mod engine;
pub mod result;
pub mod suite;
pub mod temporal;

pub use context::RunContext;
pub use dataset::Dataset;
pub use engine::{evaluate_check, run_suite, run_suite_concurrent};
pub use result::{CheckResult, DatasetBreakdown, DatasetCounts, Report, Summary};
pub use suite::{CheckSpec, DatasetSpec, SuiteSpec, SuiteSpecBuilder};
