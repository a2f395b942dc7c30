//! Core types for analyzer findings.

use serde::{Deserialize, Serialize};

/// Severity levels for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Kinds of issues the analyzer can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "resource_leak")]
    ResourceLeak,
    #[serde(rename = "infinite_loop")]
    InfiniteLoop,
    #[serde(rename = "type_confusion")]
    TypeConfusion,
    #[serde(rename = "performance_issue")]
    PerformanceIssue,
    #[serde(rename = "syntax_error")]
    SyntaxError,
    #[serde(rename = "ml_anomaly")]
    MlAnomaly,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ResourceLeak => "resource_leak",
            IssueKind::InfiniteLoop => "infinite_loop",
            IssueKind::TypeConfusion => "type_confusion",
            IssueKind::PerformanceIssue => "performance_issue",
            IssueKind::SyntaxError => "syntax_error",
            IssueKind::MlAnomaly => "ml_anomaly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "resource_leak" => Some(IssueKind::ResourceLeak),
            "infinite_loop" => Some(IssueKind::InfiniteLoop),
            "type_confusion" => Some(IssueKind::TypeConfusion),
            "performance_issue" => Some(IssueKind::PerformanceIssue),
            "syntax_error" => Some(IssueKind::SyntaxError),
            "ml_anomaly" => Some(IssueKind::MlAnomaly),
            _ => None,
        }
    }

    /// Human-readable form for messages ("resource leak").
    pub fn human(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single located, typed, severity-tagged finding.
///
/// Issues are produced fresh per analysis run and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub file: String,
    /// 1-indexed line, absent for whole-file findings (anomalies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
}

/// Ordered results of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub issues: Vec<Issue>,
    /// Number of files analyzed (including ones that failed to parse).
    pub scanned: usize,
}

impl AnalysisReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Check if any issue is at error severity or above.
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i.severity, Severity::Error | Severity::Critical))
    }

    /// Issues for one file, in report order.
    pub fn issues_for(&self, file: &str) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.file == file).collect()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}
