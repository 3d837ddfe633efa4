//! Check results and the aggregated run report.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The outcome of evaluating one check against one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Registry tag of the check, or the declared tag if it is unknown
    pub check_type: String,
    /// Name of the dataset the check was declared on
    pub dataset: String,
    /// Whether the check passed
    pub passed: bool,
    /// Human-readable summary
    pub message: String,
    /// Check-specific diagnostics
    pub details: Value,
}

impl CheckResult {
    /// Creates a new check result.
    pub fn new(
        check_type: impl Into<String>,
        dataset: impl Into<String>,
        passed: bool,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            check_type: check_type.into(),
            dataset: dataset.into(),
            passed,
            message: message.into(),
            details,
        }
    }
}

/// Pass/fail counts for one dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCounts {
    pub passed: usize,
    pub failed: usize,
}

/// Per-dataset counts, kept in the order datasets first appear in the results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetBreakdown(Vec<(String, DatasetCounts)>);

impl DatasetBreakdown {
    fn record(&mut self, dataset: &str, passed: bool) {
        let index = match self.0.iter().position(|(name, _)| name == dataset) {
            Some(index) => index,
            None => {
                self.0.push((dataset.to_string(), DatasetCounts::default()));
                self.0.len() - 1
            }
        };
        let counts = &mut self.0[index].1;
        if passed {
            counts.passed += 1;
        } else {
            counts.failed += 1;
        }
    }

    /// Returns the counts for a dataset, if it produced any result.
    pub fn get(&self, dataset: &str) -> Option<&DatasetCounts> {
        self.0
            .iter()
            .find(|(name, _)| name == dataset)
            .map(|(_, counts)| counts)
    }

    /// Iterates datasets in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatasetCounts)> {
        self.0.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for DatasetBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, counts) in &self.0 {
            map.serialize_entry(name, counts)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DatasetBreakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BreakdownVisitor;

        impl<'de> Visitor<'de> for BreakdownVisitor {
            type Value = DatasetBreakdown;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of dataset name to pass/fail counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((name, counts)) = access.next_entry::<String, DatasetCounts>()? {
                    entries.push((name, counts));
                }
                Ok(DatasetBreakdown(entries))
            }
        }

        deserializer.deserialize_map(BreakdownVisitor)
    }
}

/// Aggregate counts over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub by_dataset: DatasetBreakdown,
}

impl Summary {
    /// Tallies results into total, passed, failed and per-dataset counts.
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut summary = Self {
            total_checks: results.len(),
            ..Default::default()
        };
        for result in results {
            if result.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            summary.by_dataset.record(&result.dataset, result.passed);
        }
        summary
    }
}

/// The terminal artifact of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// The name of the suite that was run
    pub suite_name: String,
    /// When the report was assembled (RFC 3339, UTC)
    pub generated_at: String,
    pub summary: Summary,
    /// Results in declaration order
    pub results: Vec<CheckResult>,
}

impl Report {
    /// Builds the report for a finished run, stamped with the current time.
    pub fn from_results(suite_name: impl Into<String>, results: Vec<CheckResult>) -> Self {
        Self {
            suite_name: suite_name.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary: Summary::from_results(&results),
            results,
        }
    }

    /// Returns true if every result passed. A report without results passes.
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }

    /// Returns the results that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|result| !result.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results() -> Vec<CheckResult> {
        vec![
            CheckResult::new("schema", "orders", true, "ok", json!({})),
            CheckResult::new("range", "orders", false, "bad", json!({})),
            CheckResult::new("schema", "customers", true, "ok", json!({})),
            CheckResult::new("bogus", "orders", false, "Unknown check type.", json!({})),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let summary = Summary::from_results(&results());
        assert_eq!(summary.total_checks, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(
            summary.by_dataset.get("orders"),
            Some(&DatasetCounts { passed: 1, failed: 2 })
        );
        assert_eq!(
            summary.by_dataset.get("customers"),
            Some(&DatasetCounts { passed: 1, failed: 0 })
        );
    }

    #[test]
    fn test_report_serializes_in_declaration_order() {
        let report = Report::from_results("nightly", results());
        assert!(!report.all_passed());
        assert_eq!(report.failures().count(), 2);

        let value = serde_json::to_value(&report).unwrap();
        let keys: Vec<&String> = value["summary"]["by_dataset"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["orders", "customers"]);
        assert_eq!(value["results"][1]["check_type"], json!("range"));
        assert!(chrono::DateTime::parse_from_rfc3339(&report.generated_at).is_ok());

        let back: Report = serde_json::from_value(value).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_empty_report_passes() {
        let report = Report::from_results("empty", Vec::new());
        assert!(report.all_passed());
        assert_eq!(report.summary.total_checks, 0);
        assert!(report.summary.by_dataset.is_empty());
    }
}
