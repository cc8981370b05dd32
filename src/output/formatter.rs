//! Output formatters for suite results
//!
//! Provides JSON, Table, and summary output formats.

use crate::executor::{EntityReport, SuiteOutcome};
use crate::models::Severity;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn format_report_table(&self, report: &EntityReport) -> String {
        format!(
            "│ {:30} │ {:6} │ {:6} │ {:>8} │ {:>9} │",
            truncate(&report.title, 30),
            report.passed,
            report.total,
            self.paint(report.severity, format!("{:5.1}%", report.coverage)),
            self.paint(report.severity, report.severity.to_string()),
        )
    }

    /// Format the outcome of a whole run
    pub fn format_outcome(&self, outcome: &SuiteOutcome) -> String {
        match self.format {
            OutputFormat::Table => self.format_outcome_table(outcome),
            OutputFormat::Json => serde_json::to_string(outcome).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Summary => self.format_outcome_brief(outcome),
        }
    }

    fn format_outcome_table(&self, outcome: &SuiteOutcome) -> String {
        let mut output = String::new();

        output.push_str(
            "\n┌────────────────────────────────┬────────┬────────┬──────────┬───────────┐\n",
        );
        output.push_str(
            "│ Entity                         │ Passed │ Total  │ Coverage │ Result    │\n",
        );
        output.push_str(
            "├────────────────────────────────┼────────┼────────┼──────────┼───────────┤\n",
        );

        for report in &outcome.entities {
            output.push_str(&self.format_report_table(report));
            output.push('\n');
        }

        output.push_str(
            "└────────────────────────────────┴────────┴────────┴──────────┴───────────┘\n",
        );
        output.push_str(&format!(" {}\n", self.format_outcome_brief(outcome)));

        output
    }

    fn format_outcome_brief(&self, outcome: &SuiteOutcome) -> String {
        let passed: usize = outcome.entities.iter().map(|e| e.passed).sum();
        let total: usize = outcome.entities.iter().map(|e| e.total).sum();
        let rate = if total == 0 {
            100.0
        } else {
            passed as f64 / total as f64 * 100.0
        };

        format!(
            "{} {} - {} entities, {}/{} routines passed ({:.1}%) in {}ms",
            outcome.severity.symbol(),
            self.paint(outcome.severity, outcome.severity.to_string()),
            outcome.entities.len(),
            passed,
            total,
            rate,
            outcome.duration_ms
        )
    }

    fn paint(&self, severity: Severity, text: String) -> String {
        if !self.colorize {
            return text;
        }
        let color = match severity {
            Severity::Success => "32",
            Severity::Warning => "33",
            Severity::Fail => "31",
        };
        format!("\x1b[{color}m{text}\x1b[0m")
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> SuiteOutcome {
        SuiteOutcome {
            severity: Severity::Warning,
            entities: vec![
                EntityReport {
                    title: "auth".into(),
                    passed: 2,
                    total: 2,
                    coverage: 100.0,
                    severity: Severity::Success,
                },
                EntityReport {
                    title: "orders".into(),
                    passed: 1,
                    total: 2,
                    coverage: 50.0,
                    severity: Severity::Warning,
                },
            ],
            duration_ms: 42,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(
            OutputFormat::from_str("json-pretty"),
            Some(OutputFormat::JsonPretty)
        );
        assert_eq!(OutputFormat::from_str("csv"), None);
    }

    #[test]
    fn test_summary_format() {
        let formatter = ResultFormatter::new(OutputFormat::Summary).no_color();
        assert_eq!(
            formatter.format_outcome(&outcome()),
            "⚠ WARNING - 2 entities, 3/4 routines passed (75.0%) in 42ms"
        );
    }

    #[test]
    fn test_table_format_lists_entities() {
        let output = ResultFormatter::default().no_color().format_outcome(&outcome());
        assert!(output.contains("auth"));
        assert!(output.contains(" 50.0%"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_json_format() {
        let output = ResultFormatter::new(OutputFormat::Json).format_outcome(&outcome());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["severity"], "WARNING");
        assert_eq!(value["entities"][1]["passed"], 1);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long entity title", 6), "a ver…");
    }
}
