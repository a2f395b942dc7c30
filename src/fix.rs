//! Fix generation: issue kind -> proposed patched source.
//!
//! A closed registry maps issue kinds to pure fix functions of uniform
//! signature `(issue, source) -> Result<patched text, FixError>`. Every
//! strategy returns the whole patched file; nothing here writes back to the
//! source tree — applying a suggestion is the caller's decision.

use std::collections::HashMap;

use thiserror::Error;

use crate::analyze::{Issue, IssueKind};

/// Why a fix could not be produced. These are explicit negative outcomes,
/// not failures of the generator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    #[error("no fix strategy registered for {0}")]
    NoStrategy(IssueKind),
    #[error("fix generation for {0} is not yet supported")]
    NotSupported(IssueKind),
    #[error("issue carries no line number")]
    MissingLine,
    #[error("issue line {0} is past the end of the file")]
    LineOutOfRange(usize),
    #[error("no enclosing block boundary found before end of file")]
    NoBoundary,
    #[error("loop condition is not the literal `while True:` idiom")]
    UnrecognizedLoop,
}

/// A proposed patch: the originating issue plus the full patched file text.
#[derive(Debug, Clone, PartialEq)]
pub struct FixSuggestion {
    pub issue: Issue,
    pub patched: String,
}

/// Fix strategy signature.
pub type FixFn = fn(&Issue, &str) -> Result<String, FixError>;

/// Advisory marker inserted by the resource-leak strategy. It is a comment,
/// not a real close call.
pub const CLEANUP_MARKER: &str = "# cleanup: release the resource acquired above";

/// Name of the loop flag introduced by the infinite-loop strategy.
const LOOP_FLAG: &str = "should_continue";

lazy_static::lazy_static! {
    /// Closed strategy registry. Kinds not present here have no fix.
    static ref STRATEGIES: HashMap<IssueKind, FixFn> = {
        let mut registry: HashMap<IssueKind, FixFn> = HashMap::new();
        registry.insert(IssueKind::ResourceLeak, fix_resource_leak as FixFn);
        registry.insert(IssueKind::InfiniteLoop, fix_infinite_loop as FixFn);
        registry.insert(IssueKind::PerformanceIssue, fix_performance_issue as FixFn);
        registry
    };
}

/// Generate a proposed fix for one issue against its file's source text.
pub fn generate_fix(issue: &Issue, source: &str) -> Result<FixSuggestion, FixError> {
    let strategy = STRATEGIES
        .get(&issue.kind)
        .ok_or(FixError::NoStrategy(issue.kind))?;
    let patched = strategy(issue, source)?;
    Ok(FixSuggestion {
        issue: issue.clone(),
        patched,
    })
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn offending_line_index(issue: &Issue, lines: &[&str]) -> Result<usize, FixError> {
    let line = issue.line.ok_or(FixError::MissingLine)?;
    if line == 0 || line > lines.len() {
        return Err(FixError::LineOutOfRange(line));
    }
    Ok(line - 1)
}

/// Insert an advisory cleanup marker at the end of the offending line's
/// lexical block. The boundary is the first subsequent non-blank line whose
/// indentation is less than or equal to the offending line's.
fn fix_resource_leak(issue: &Issue, source: &str) -> Result<String, FixError> {
    let lines: Vec<&str> = source.split('\n').collect();
    let idx = offending_line_index(issue, &lines)?;
    let indent = indent_width(lines[idx]);

    for boundary in idx + 1..lines.len() {
        if lines[boundary].trim().is_empty() {
            continue;
        }
        if indent_width(lines[boundary]) <= indent {
            let mut patched: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
            patched.insert(boundary, format!("{}{}", " ".repeat(indent), CLEANUP_MARKER));
            return Ok(patched.join("\n"));
        }
    }

    Err(FixError::NoBoundary)
}

/// Rewrite `while True:` to a named flag and initialize the flag (defaulted
/// true) immediately before the loop. Behavior-preserving scaffolding, not a
/// real termination fix.
fn fix_infinite_loop(issue: &Issue, source: &str) -> Result<String, FixError> {
    let mut lines: Vec<String> = source.split('\n').map(str::to_string).collect();
    let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
    let idx = offending_line_index(issue, &borrowed)?;

    if !lines[idx].contains("while True:") {
        return Err(FixError::UnrecognizedLoop);
    }

    let indent = indent_width(&lines[idx]);
    lines[idx] = lines[idx].replace("while True:", &format!("while {}:", LOOP_FLAG));
    lines.insert(idx, format!("{}{} = True", " ".repeat(indent), LOOP_FLAG));
    Ok(lines.join("\n"))
}

fn fix_performance_issue(issue: &Issue, _source: &str) -> Result<String, FixError> {
    Err(FixError::NotSupported(issue.kind))
}
