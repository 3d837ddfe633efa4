//! Exit-code tests for the `dqf` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const PASSING: &str = r#"
suite_name: cli_pass
datasets:
  - name: orders
    path: orders.csv
    checks:
      - type: unique
        columns: [order_id]
      - type: range
        column: amount
        min: 0
        max: 100
"#;

const FAILING: &str = r#"
suite_name: cli_fail
datasets:
  - name: orders
    path: orders.csv
    checks:
      - type: range
        column: amount
        min: 0
        max: 1
"#;

const MISSING_FILE: &str = r#"
suite_name: cli_error
datasets:
  - name: payments
    path: payments.csv
"#;

fn workspace(rules: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("orders.csv"),
        "order_id,amount\n1,10.0\n2,20.5\n3,7.25\n",
    )
    .unwrap();
    fs::write(dir.path().join("rules.yaml"), rules).unwrap();
    dir
}

fn run_dqf(dir: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dqf"))
        .arg("run")
        .arg("--rules")
        .arg(dir.join("rules.yaml"))
        .arg("--data-dir")
        .arg(dir)
        .arg("--out")
        .arg(dir.join("reports"))
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_passing_suite_exits_zero() {
    let dir = workspace(PASSING);
    let output = run_dqf(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Validation PASSED"));
    assert!(dir.path().join("reports/latest_report.json").is_file());
    assert!(dir.path().join("reports/latest_report.html").is_file());
}

#[test]
fn test_failing_suite_exits_two() {
    let dir = workspace(FAILING);
    let output = run_dqf(dir.path(), &["--parallel", "--quiet"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(dir.path().join("reports/latest_report.json").is_file());
}

#[test]
fn test_aborted_run_exits_one_without_report() {
    let dir = workspace(MISSING_FILE);
    let output = run_dqf(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[dqf] ERROR:"));
    assert!(!dir.path().join("reports").exists());
}
