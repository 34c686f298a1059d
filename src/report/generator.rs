//! Report rendering.
//!
//! The JSON document is the program's only machine-readable output and goes
//! to stdout. The text summary is for humans and goes to stderr.

use crate::models::{AggregateReport, Category};
use anyhow::Result;

/// Generate the pretty-printed JSON report.
pub fn generate_json_report(report: &AggregateReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a short human-readable summary.
pub fn generate_summary(report: &AggregateReport) -> String {
    let mut output = String::new();

    output.push_str(&generate_header(report));
    output.push_str(&generate_category_table(report));
    output.push_str(&generate_flags_section(&report.flags));

    output
}

fn generate_header(report: &AggregateReport) -> String {
    let mut section = String::new();

    section.push_str(&format!("📊 {}\n", report.coin));
    section.push_str(&format!(
        "   Master score: {:.2} / 100 (confidence {:.2}, coverage {:.2})\n",
        report.master_score, report.confidence, report.coverage
    ));

    section
}

fn generate_category_table(report: &AggregateReport) -> String {
    let mut section = String::new();

    for category in &report.included_categories {
        let score = report.subscores.get(category).copied().unwrap_or_default();
        section.push_str(&format!("   - {:<18} {:>6.2}\n", category.title(), score));
    }

    if !report.excluded_categories.is_empty() {
        let excluded: Vec<&str> = report
            .excluded_categories
            .iter()
            .map(Category::title)
            .collect();
        section.push_str(&format!("   Excluded: {}\n", excluded.join(", ")));
    }

    section
}

fn generate_flags_section(flags: &[String]) -> String {
    if flags.is_empty() {
        return "   Flags: none\n".to_string();
    }
    format!("   Flags: {}\n", flags.join(", "))
}
