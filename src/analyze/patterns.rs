//! Pattern pass: line-oriented regex detection over raw source text.
//!
//! The pattern table is fixed and grouped by issue kind. Every line is
//! checked against every pattern, so one line can raise several issues.
//! Performance findings are warnings; everything else from this pass is an
//! error.

use regex::{Regex, RegexBuilder};

use super::types::{Issue, IssueKind, Severity};

struct PatternGroup {
    kind: IssueKind,
    patterns: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .unwrap()
        })
        .collect()
}

lazy_static::lazy_static! {
    /// Fixed expert-knowledge table of defect patterns.
    static ref PATTERN_TABLE: Vec<PatternGroup> = vec![
        PatternGroup {
            kind: IssueKind::ResourceLeak,
            patterns: compile(&[
                r"open\([^)]+\)",
                r"connect\([^)]+\)",
            ]),
        },
        PatternGroup {
            kind: IssueKind::InfiniteLoop,
            patterns: compile(&[
                r"while\s*\(?\s*True\s*\)?\s*:",
                r"while\s*\(?\s*1\s*\)?\s*:",
                // empty range
                r"for\s+\w+\s+in\s+range\(\s*\)",
            ]),
        },
        PatternGroup {
            kind: IssueKind::TypeConfusion,
            patterns: compile(&[
                r"str\(\s*\)\s*\+\s*int\(\s*\)",
                r"dict\.keys\(\)\[0\]",
            ]),
        },
        PatternGroup {
            kind: IssueKind::PerformanceIssue,
            patterns: compile(&[
                r"\.append\(\s*\)\s+in\s+loop",
                r"deepcopy\(\s*\)\s+in\s+loop",
                r"SELECT\s+\*\s+FROM",
            ]),
        },
    ];
}

/// Run the pattern pass over one file's raw source.
pub(crate) fn pattern_pass(source: &str, file: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let lineno = idx + 1;
        for group in PATTERN_TABLE.iter() {
            for pattern in &group.patterns {
                if pattern.is_match(line) {
                    let severity = if group.kind == IssueKind::PerformanceIssue {
                        Severity::Warning
                    } else {
                        Severity::Error
                    };
                    issues.push(Issue {
                        kind: group.kind,
                        file: file.to_string(),
                        line: Some(lineno),
                        message: format!("potential {}", group.kind.human()),
                        severity,
                    });
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_at(source: &str, line: usize) -> Vec<IssueKind> {
        pattern_pass(source, "test.py")
            .into_iter()
            .filter(|i| i.line == Some(line))
            .map(|i| i.kind)
            .collect()
    }

    #[test]
    fn test_while_true_without_parens() {
        let issues = pattern_pass("while True:\n    pass\n", "test.py");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InfiniteLoop);
        assert_eq!(issues[0].line, Some(1));
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_while_true_with_parens_and_case() {
        assert_eq!(kinds_at("while (true):\n", 1), [IssueKind::InfiniteLoop]);
        assert_eq!(kinds_at("while ( 1 ) :\n", 1), [IssueKind::InfiniteLoop]);
    }

    #[test]
    fn test_open_call_is_a_resource_leak() {
        let issues = pattern_pass("handle = open(path)\n", "test.py");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ResourceLeak);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].message, "potential resource leak");
    }

    #[test]
    fn test_performance_patterns_are_warnings() {
        let issues = pattern_pass("cursor.execute('SELECT * FROM users')\n", "test.py");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::PerformanceIssue);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_one_line_can_raise_multiple_issues() {
        // Matches both the open() leak pattern and the while-true pattern.
        let kinds = kinds_at("while True: conn = open(sock)\n", 1);
        assert!(kinds.contains(&IssueKind::InfiniteLoop));
        assert!(kinds.contains(&IssueKind::ResourceLeak));
    }

    #[test]
    fn test_clean_line_raises_nothing() {
        assert!(pattern_pass("total = 1 + 2\n", "test.py").is_empty());
    }

    #[test]
    fn test_type_confusion_pattern() {
        assert_eq!(
            kinds_at("first = dict.keys()[0]\n", 1),
            [IssueKind::TypeConfusion]
        );
    }
}
