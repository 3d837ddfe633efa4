//! Suite execution with per-check failure isolation.
//!
//! Checks run dataset-major, check-minor, in declaration order, and exactly
//! one [`CheckResult`] is produced per declared check. Unknown check types and
//! checks that fail to evaluate become failed results; nothing a single check
//! does can abort the rest of the run.

use super::{CheckResult, CheckSpec, RunContext, SuiteSpec};
use crate::checks::CheckRegistry;
use crate::logging::{truncate_field, MAX_FIELD_LENGTH};
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Evaluates one declared check against `dataset`.
///
/// Never fails: an unknown tag or an evaluation error is turned into a failed
/// result carrying the reason.
pub fn evaluate_check(dataset: &str, spec: &CheckSpec, ctx: &RunContext) -> CheckResult {
    let Some(kind) = spec.kind() else {
        warn!(
            dataset.name = %dataset,
            check.type = %spec.check_type(),
            "Unknown check type"
        );
        return CheckResult::new(
            spec.check_type(),
            dataset,
            false,
            "Unknown check type.",
            json!({"known": CheckRegistry::known_types()}),
        );
    };

    let check = kind.as_check();
    match check.evaluate(dataset, ctx) {
        Ok(result) => {
            if result.passed {
                debug!(
                    dataset.name = %dataset,
                    check.type = %check.check_type(),
                    "Check passed"
                );
            } else {
                warn!(
                    dataset.name = %dataset,
                    check.type = %check.check_type(),
                    failure.message = %truncate_field(&result.message, MAX_FIELD_LENGTH),
                    "Check failed"
                );
            }
            result
        }
        Err(e) => {
            error!(
                dataset.name = %dataset,
                check.type = %check.check_type(),
                error = %truncate_field(&e.to_string(), MAX_FIELD_LENGTH),
                "Check could not be evaluated"
            );
            fault_result(check.check_type(), dataset, &e.to_string(), &format!("{e:?}"))
        }
    }
}

fn fault_result(check_type: &str, dataset: &str, description: &str, repr: &str) -> CheckResult {
    CheckResult::new(
        check_type,
        dataset,
        false,
        format!("Check error: {description}"),
        json!({"exception": repr}),
    )
}

/// Runs every check of the suite against a fully loaded context.
#[instrument(skip_all, fields(suite.name = %suite.suite_name(), suite.checks = suite.total_checks()))]
pub fn run_suite(suite: &SuiteSpec, ctx: &RunContext) -> Vec<CheckResult> {
    let start = Instant::now();
    info!("Starting suite run");

    let mut results = Vec::with_capacity(suite.total_checks());
    for dataset in suite.datasets() {
        debug!(
            dataset.name = %dataset.name(),
            dataset.checks = dataset.checks().len(),
            "Evaluating dataset"
        );
        for spec in dataset.checks() {
            results.push(evaluate_check(dataset.name(), spec, ctx));
        }
    }

    log_completion(&results, start);
    results
}

/// Runs every check on the blocking thread pool and returns results in
/// declaration order.
///
/// A check that panics is reported as a failed result like any other fault.
#[instrument(skip_all, fields(suite.name = %suite.suite_name(), suite.checks = suite.total_checks()))]
pub async fn run_suite_concurrent(suite: Arc<SuiteSpec>, ctx: Arc<RunContext>) -> Vec<CheckResult> {
    let start = Instant::now();
    info!("Starting concurrent suite run");

    let mut labels = Vec::with_capacity(suite.total_checks());
    let mut handles = Vec::with_capacity(suite.total_checks());
    for (dataset_index, dataset) in suite.datasets().iter().enumerate() {
        for (check_index, spec) in dataset.checks().iter().enumerate() {
            labels.push((spec.check_type().to_string(), dataset.name().to_string()));
            let suite = Arc::clone(&suite);
            let ctx = Arc::clone(&ctx);
            handles.push(tokio::task::spawn_blocking(move || {
                let dataset = &suite.datasets()[dataset_index];
                evaluate_check(dataset.name(), &dataset.checks()[check_index], &ctx)
            }));
        }
    }

    let results: Vec<CheckResult> = join_all(handles)
        .await
        .into_iter()
        .zip(labels)
        .map(|(joined, (check_type, dataset))| {
            joined.unwrap_or_else(|e| {
                error!(
                    dataset.name = %dataset,
                    check.type = %check_type,
                    error = %e,
                    "Check task did not complete"
                );
                fault_result(&check_type, &dataset, &e.to_string(), &format!("{e:?}"))
            })
        })
        .collect();

    log_completion(&results, start);
    results
}

fn log_completion(results: &[CheckResult], start: Instant) {
    let failed = results.iter().filter(|r| !r.passed).count();
    info!(
        checks.total = results.len(),
        checks.passed = results.len() - failed,
        checks.failed = failed,
        duration_ms = start.elapsed().as_millis() as u64,
        "Suite run completed"
    );
}
