//! Output formatting for analysis results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analyze::{AnalysisReport, Issue, Severity};

/// JSON report envelope.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub files_scanned: usize,
    pub issues: Vec<JsonIssue>,
}

/// JSON issue record.
#[derive(Serialize, Deserialize)]
pub struct JsonIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

fn issue_to_json(issue: &Issue) -> JsonIssue {
    JsonIssue {
        kind: issue.kind.as_str().to_string(),
        severity: issue.severity.to_string(),
        file: issue.file.clone(),
        line: issue.line,
        message: issue.message.clone(),
    }
}

/// Write results as JSON to stdout.
pub fn write_json(path: &str, report: &AnalysisReport) -> anyhow::Result<()> {
    let json = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        files_scanned: report.scanned,
        issues: report.issues.iter().map(issue_to_json).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Write results as colored terminal output.
pub fn write_pretty(path: &str, report: &AnalysisReport) {
    println!();
    print!("  ");
    print!("{}", "codescope".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    print!("  {}", "Files:    ".dimmed());
    println!("{}", report.scanned);
    println!();

    if !report.issues.is_empty() {
        for issue in &report.issues {
            write_issue(issue);
        }
        println!();
    }

    write_summary(report);
    println!();
}

fn write_issue(issue: &Issue) {
    let location = match issue.line {
        Some(line) => format!("{}:{}", issue.file, line),
        None => issue.file.clone(),
    };

    let severity = match issue.severity {
        Severity::Critical => "critical".red().bold(),
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".cyan(),
    };

    println!(
        "  {}  {}  [{}] {}",
        location.dimmed(),
        severity,
        issue.kind.as_str(),
        issue.message
    );
}

fn write_summary(report: &AnalysisReport) {
    let critical = report.count_by_severity(Severity::Critical);
    let errors = report.count_by_severity(Severity::Error);
    let warnings = report.count_by_severity(Severity::Warning);
    let info = report.count_by_severity(Severity::Info);

    if report.has_errors() {
        print!("  {}", "✗ ISSUES".red());
    } else {
        print!("  {}", "✓ CLEAN".green());
    }
    println!(
        "  {} critical, {} errors, {} warnings, {} info",
        critical, errors, warnings, info
    );
}
