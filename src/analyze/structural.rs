//! Structural pass: tree-walking defect detection for Script files.
//!
//! Walks the syntax tree with an explicit stack of enclosing function names
//! passed by reference, and flags calls to an `append` attribute whenever the
//! stack is non-empty. The enclosing-function check is a deliberate
//! over-approximation of "append inside a loop" carried over from the
//! reference detector: it fires inside any function body, loop or not.

use tree_sitter::{Node, Tree};

use super::types::{Issue, IssueKind, Severity};

/// Run the structural pass over one parsed Script file.
pub(crate) fn structural_pass(tree: &Tree, source: &str, file: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    walk(tree.root_node(), source, file, &mut stack, &mut issues);
    issues
}

fn walk(node: Node, source: &str, file: &str, stack: &mut Vec<String>, issues: &mut Vec<Issue>) {
    let entered_function = node.kind() == "function_definition";
    if entered_function {
        let name = node
            .child_by_field_name("name")
            .map(|n| n.utf8_text(source.as_bytes()).unwrap_or("").to_string())
            .unwrap_or_default();
        stack.push(name);
    }

    if node.kind() == "call" && !stack.is_empty() && is_append_call(node, source) {
        issues.push(Issue {
            kind: IssueKind::PerformanceIssue,
            file: file.to_string(),
            line: Some(node.start_position().row + 1),
            message: "append call inside a function body - consider preallocating".to_string(),
            severity: Severity::Warning,
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, file, stack, issues);
    }

    if entered_function {
        stack.pop();
    }
}

fn is_append_call(node: Node, source: &str) -> bool {
    let Some(function) = node.child_by_field_name("function") else {
        return false;
    };
    if function.kind() != "attribute" {
        return false;
    }
    function
        .child_by_field_name("attribute")
        .map(|attr| attr.utf8_text(source.as_bytes()).unwrap_or("") == "append")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::script::parse_tree;

    fn run(source: &str) -> Vec<Issue> {
        let tree = parse_tree(source).unwrap();
        structural_pass(&tree, source, "test.py")
    }

    #[test]
    fn test_append_inside_function_is_flagged() {
        let issues = run(
            r#"def collect(items):
    out = []
    for item in items:
        out.append(item)
    return out
"#,
        );

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::PerformanceIssue);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].line, Some(4));
    }

    #[test]
    fn test_append_outside_any_function_is_not_flagged() {
        let issues = run("out = []\nout.append(1)\n");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_append_without_loop_still_flagged() {
        // Over-approximation: any enclosing function is enough.
        let issues = run("def once(out):\n    out.append(1)\n");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_plain_call_named_append_is_not_flagged() {
        // Only attribute calls (`x.append(...)`) match.
        let issues = run("def f(x):\n    append(x)\n");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_method_body_counts_as_enclosing_function() {
        let issues = run(
            r#"
class Collector:
    def add(self, item):
        self.items.append(item)
"#,
        );
        assert_eq!(issues.len(), 1);
    }
}
