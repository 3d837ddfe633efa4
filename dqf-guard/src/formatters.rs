//! Rendering and writing of run reports.
//!
//! A [`Report`] can be rendered as JSON for machines, as a self-contained HTML
//! page for people, or as a short console summary. [`write_report`] writes the
//! JSON and HTML artifacts of a run into an output directory.
//!
//! # Examples
//!
//! ```rust
//! use dqf_guard::core::Report;
//! use dqf_guard::formatters::{HumanFormatter, FormatterConfig, ReportFormatter};
//!
//! let report = Report::from_results("nightly", Vec::new());
//! let text = HumanFormatter::with_config(FormatterConfig::minimal())
//!     .format(&report)
//!     .unwrap();
//! assert!(text.contains("PASSED"));
//! ```

use crate::core::{CheckResult, Report};
use crate::prelude::*;
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// File name of the JSON artifact.
pub const JSON_REPORT_FILE: &str = "latest_report.json";
/// File name of the HTML artifact.
pub const HTML_REPORT_FILE: &str = "latest_report.html";

/// Configuration options for console output.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// List failed checks below the summary
    pub include_failures: bool,
    /// Include the per-dataset breakdown
    pub include_datasets: bool,
    /// Maximum number of failures to list (`None` for all)
    pub max_failures: Option<usize>,
    /// Whether to use ANSI colors
    pub use_colors: bool,
    /// Whether to print the report timestamp
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_failures: true,
            include_datasets: true,
            max_failures: None,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only the summary.
    pub fn minimal() -> Self {
        Self {
            include_failures: false,
            include_datasets: false,
            max_failures: Some(0),
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Creates a configuration suitable for CI logs.
    pub fn ci() -> Self {
        Self {
            include_failures: true,
            include_datasets: true,
            max_failures: Some(20),
            use_colors: false,
            include_timestamps: true,
        }
    }

    pub fn with_failures(mut self, include: bool) -> Self {
        self.include_failures = include;
        self
    }

    pub fn with_max_failures(mut self, max: Option<usize>) -> Self {
        self.max_failures = max;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

/// Renders a report into a string representation.
pub trait ReportFormatter {
    fn format(&self, report: &Report) -> Result<String>;
}

fn render_error(format: &str) -> impl FnOnce(fmt::Error) -> DqfError + '_ {
    move |e| DqfError::Internal(format!("Failed to render {format} report: {e}"))
}

/// Formats reports as JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a pretty-printing JSON formatter.
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        rendered.map_err(|e| DqfError::Internal(format!("Failed to serialize report to JSON: {e}")))
    }
}

const HTML_STYLE: &str = "\
    body { font-family: Arial, sans-serif; margin: 24px; }
    .summary { margin-bottom: 16px; padding: 12px; border: 1px solid #ddd; border-radius: 8px; }
    table { border-collapse: collapse; width: 100%; margin-top: 12px; }
    th, td { border: 1px solid #ddd; padding: 8px; vertical-align: top; }
    th { background: #f6f6f6; }
    .pass { color: #0a7a0a; font-weight: bold; }
    .fail { color: #b00020; font-weight: bold; }
    .small { color: #555; font-size: 12px; }
    code { background: #f3f3f3; padding: 2px 4px; border-radius: 4px; }
    pre { white-space: pre-wrap; word-break: break-word; }";

/// Escapes text for use in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Formats reports as a self-contained HTML page.
///
/// The page holds the summary, per-dataset counts and one table row per
/// result with its details as collapsible pretty-printed JSON.
#[derive(Debug, Clone, Default)]
pub struct HtmlFormatter;

impl HtmlFormatter {
    pub fn new() -> Self {
        Self
    }

    fn render(&self, report: &Report, out: &mut String) -> fmt::Result {
        let suite = escape_html(&report.suite_name);
        let summary = &report.summary;

        writeln!(out, "<!doctype html>")?;
        writeln!(out, "<html>\n<head>\n  <meta charset=\"utf-8\"/>")?;
        writeln!(out, "  <title>Data Quality Report - {suite}</title>")?;
        writeln!(out, "  <style>\n{HTML_STYLE}\n  </style>\n</head>\n<body>")?;
        writeln!(out, "  <h1>Data Quality Report</h1>")?;
        writeln!(
            out,
            "  <div class=\"small\">Suite: <code>{suite}</code> | Generated: <code>{}</code></div>",
            escape_html(&report.generated_at)
        )?;

        writeln!(out, "  <div class=\"summary\">")?;
        writeln!(
            out,
            "    <div><strong>Total checks:</strong> {} | <span class=\"pass\">Passed:</span> {} | <span class=\"fail\">Failed:</span> {}</div>",
            summary.total_checks, summary.passed, summary.failed
        )?;
        writeln!(out, "    <div class=\"small\">By dataset:</div>")?;
        writeln!(out, "    <ul class=\"small\">")?;
        for (dataset, counts) in summary.by_dataset.iter() {
            writeln!(
                out,
                "      <li><code>{}</code>: Passed: {}, Failed: {}</li>",
                escape_html(dataset),
                counts.passed,
                counts.failed
            )?;
        }
        writeln!(out, "    </ul>\n  </div>")?;

        writeln!(out, "  <table>\n    <thead>\n      <tr>")?;
        for heading in ["Dataset", "Check", "Status", "Message", "Details"] {
            writeln!(out, "        <th>{heading}</th>")?;
        }
        writeln!(out, "      </tr>\n    </thead>\n    <tbody>")?;
        for result in &report.results {
            self.render_row(result, out)?;
        }
        writeln!(out, "    </tbody>\n  </table>\n</body>\n</html>")
    }

    fn render_row(&self, result: &CheckResult, out: &mut String) -> fmt::Result {
        let status = if result.passed {
            "<span class=\"pass\">PASS</span>"
        } else {
            "<span class=\"fail\">FAIL</span>"
        };
        let details =
            serde_json::to_string_pretty(&result.details).unwrap_or_else(|_| "null".to_string());

        writeln!(out, "      <tr>")?;
        writeln!(out, "        <td><code>{}</code></td>", escape_html(&result.dataset))?;
        writeln!(out, "        <td><code>{}</code></td>", escape_html(&result.check_type))?;
        writeln!(out, "        <td>{status}</td>")?;
        writeln!(out, "        <td>{}</td>", escape_html(&result.message))?;
        writeln!(
            out,
            "        <td><details><summary class=\"small\">view</summary><pre class=\"small\">{}</pre></details></td>",
            escape_html(&details)
        )?;
        writeln!(out, "      </tr>")
    }
}

impl ReportFormatter for HtmlFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        let mut out = String::new();
        self.render(report, &mut out).map_err(render_error("HTML"))?;
        Ok(out)
    }
}

/// Formats reports as a console summary.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.config.use_colors {
            format!("\x1b[{color}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn render(&self, report: &Report, out: &mut String) -> fmt::Result {
        let config = &self.config;
        let summary = &report.summary;

        if report.all_passed() {
            writeln!(out, "{}", self.paint("Validation PASSED", "32"))?;
        } else {
            writeln!(out, "{}", self.paint("Validation FAILED", "31"))?;
        }
        writeln!(out, "Suite: {}", report.suite_name)?;
        if config.include_timestamps {
            writeln!(out, "Generated: {}", report.generated_at)?;
        }
        writeln!(
            out,
            "Checks: {} total, {} passed, {} failed",
            summary.total_checks, summary.passed, summary.failed
        )?;

        if config.include_datasets && !summary.by_dataset.is_empty() {
            writeln!(out)?;
            for (dataset, counts) in summary.by_dataset.iter() {
                writeln!(
                    out,
                    "  {dataset}: {} passed, {} failed",
                    counts.passed, counts.failed
                )?;
            }
        }

        if config.include_failures && summary.failed > 0 {
            let limit = config.max_failures.unwrap_or(usize::MAX);
            writeln!(out)?;
            writeln!(out, "Failures:")?;
            for result in report.failures().take(limit) {
                writeln!(
                    out,
                    "  {} [{}] {}",
                    self.paint("FAIL", "31"),
                    result.dataset,
                    result.check_type
                )?;
                writeln!(out, "      {}", result.message)?;
            }
            if summary.failed > limit {
                writeln!(out, "  ... and {} more failures", summary.failed - limit)?;
            }
        }
        Ok(())
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &Report) -> Result<String> {
        let mut out = String::new();
        self.render(report, &mut out).map_err(render_error("console"))?;
        Ok(out)
    }
}

/// Locations of the artifacts written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// Writes the JSON and HTML artifacts of a report into `out_dir`.
///
/// The directory is created if needed and earlier artifacts are replaced.
#[instrument(skip_all, fields(suite.name = %report.suite_name, out_dir = %out_dir.as_ref().display()))]
pub fn write_report(out_dir: impl AsRef<Path>, report: &Report) -> Result<ReportPaths> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)?;

    let paths = ReportPaths {
        json: out_dir.join(JSON_REPORT_FILE),
        html: out_dir.join(HTML_REPORT_FILE),
    };
    std::fs::write(&paths.json, JsonFormatter::new().format(report)?)?;
    std::fs::write(&paths.html, HtmlFormatter::new().format(report)?)?;

    info!(
        json = %paths.json.display(),
        html = %paths.html.display(),
        "Wrote report"
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_report() -> Report {
        Report::from_results(
            "nightly <prod>",
            vec![
                CheckResult::new("schema", "orders", true, "Schema matches expected columns/types.", json!({})),
                CheckResult::new(
                    "range",
                    "orders",
                    false,
                    "Range check failed.",
                    json!({"violations_sample": [{"note": "<b>&"}]}),
                ),
                CheckResult::new("bogus", "customers", false, "Unknown check type.", json!({})),
            ],
        )
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_html_is_escaped_and_complete() {
        let html = HtmlFormatter::new().format(&sample_report()).unwrap();
        assert!(html.contains("<title>Data Quality Report - nightly &lt;prod&gt;</title>"));
        assert!(html.contains("&lt;b&gt;&amp;"));
        assert!(!html.contains("<b>&"));
        assert_eq!(html.matches("<tr>").count(), 4);
        assert_eq!(html.matches("class=\"fail\">FAIL").count(), 2);
        assert!(html.contains("<li><code>orders</code>: Passed: 1, Failed: 1</li>"));
    }

    #[test]
    fn test_json_round_trips() {
        let report = sample_report();
        let text = JsonFormatter::new().format(&report).unwrap();
        let back: Report = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);

        let compact = JsonFormatter::new().with_pretty(false).format(&report).unwrap();
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_human_output() {
        let text = HumanFormatter::with_config(FormatterConfig::ci().with_max_failures(Some(1)))
            .format(&sample_report())
            .unwrap();
        assert!(text.starts_with("Validation FAILED"));
        assert!(text.contains("Checks: 3 total, 1 passed, 2 failed"));
        assert!(text.contains("FAIL [orders] range"));
        assert!(!text.contains("[customers] bogus"));
        assert!(text.contains("... and 1 more failures"));

        let minimal = HumanFormatter::with_config(FormatterConfig::minimal())
            .format(&sample_report())
            .unwrap();
        assert!(!minimal.contains("Failures:"));
        assert!(!minimal.contains("Generated:"));
    }

    #[test]
    fn test_write_report_creates_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports/nested");
        let paths = write_report(&out, &sample_report()).unwrap();

        assert_eq!(paths.json, out.join("latest_report.json"));
        assert!(paths.html.ends_with("latest_report.html"));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(json["summary"]["failed"], json!(2));
        assert!(std::fs::read_to_string(&paths.html)
            .unwrap()
            .starts_with("<!doctype html>"));
    }
}
