//! Script dialect parser backed by tree-sitter-python.
//!
//! Walks every node of the parse tree, threading the `FileStructure` under
//! construction through an explicit recursive walk:
//! - module-level classes are recorded with their directly declared method
//!   names (nested classes' methods are not folded in);
//! - every function definition is recorded with its source line;
//! - plain and from-style imports are recorded as dotted qualified names in
//!   source order.
//!
//! A tree containing error nodes fails the whole file with a `ParseError`
//! pointing at the first offending node; the file is then omitted from the
//! index and the rest of the project is still processed.

use tree_sitter::{Node, Parser as TsParser, Tree};

use super::{Dialect, FileStructure, FunctionInfo, ParseError, StructuralParser};

/// Script dialect parser.
pub struct ScriptParser;

impl StructuralParser for ScriptParser {
    fn dialect(&self) -> Dialect {
        Dialect::Script
    }

    fn parse(&self, rel_path: &str, source: &str) -> Result<FileStructure, ParseError> {
        let tree = parse_tree(source)?;
        if let Some(err) = syntax_error_of(&tree) {
            return Err(err);
        }

        let mut structure = FileStructure::new(rel_path, Dialect::Script);
        collect(tree.root_node(), source, &mut structure);
        Ok(structure)
    }
}

/// Create a new Script parser.
pub fn new_parser() -> Box<dyn StructuralParser> {
    Box::new(ScriptParser)
}

/// Register the Script parser for the .py extension.
pub fn register() {
    super::register("py", new_parser);
}

/// Parse source into a raw tree. Shared with the analyzer's structural pass,
/// which needs the tree itself rather than the extracted structure.
pub(crate) fn parse_tree(source: &str) -> Result<Tree, ParseError> {
    let mut parser = TsParser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ParseError {
            line: 1,
            message: format!("grammar unavailable: {}", e),
        })?;
    parser.parse(source, None).ok_or_else(|| ParseError {
        line: 1,
        message: "parser produced no tree".to_string(),
    })
}

/// Locate the first error in a tree, if any.
pub(crate) fn syntax_error_of(tree: &Tree) -> Option<ParseError> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }
    Some(match find_error_node(root) {
        Some(node) => ParseError {
            line: node.start_position().row + 1,
            message: if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "invalid syntax".to_string()
            },
        },
        // has_error() without a locatable error node; blame the first line.
        None => ParseError {
            line: 1,
            message: "invalid syntax".to_string(),
        },
    })
}

fn find_error_node(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_error_node(child) {
            return Some(found);
        }
    }
    None
}

fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Recursive walk over all nodes, accumulating into `structure`.
fn collect(node: Node, source: &str, structure: &mut FileStructure) {
    match node.kind() {
        "class_definition" if is_module_level(node) => {
            record_class(node, source, structure);
        }
        "function_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                structure.functions.insert(
                    node_text(name, source).to_string(),
                    FunctionInfo {
                        line: node.start_position().row + 1,
                    },
                );
            }
        }
        "import_statement" => {
            record_plain_import(node, source, structure);
        }
        "import_from_statement" => {
            record_from_import(node, source, structure);
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, source, structure);
    }
}

/// A definition is module-level when its parent is the module itself, or a
/// module-level decorated_definition wrapper.
fn is_module_level(node: Node) -> bool {
    match node.parent() {
        Some(parent) if parent.kind() == "module" => true,
        Some(parent) if parent.kind() == "decorated_definition" => parent
            .parent()
            .is_some_and(|grand| grand.kind() == "module"),
        _ => false,
    }
}

fn record_class(node: Node, source: &str, structure: &mut FileStructure) {
    let Some(name) = node.child_by_field_name("name") else {
        return;
    };
    let mut methods = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if let Some(method) = as_function_definition(child) {
                if let Some(method_name) = method.child_by_field_name("name") {
                    methods.push(node_text(method_name, source).to_string());
                }
            }
        }
    }
    structure
        .classes
        .insert(node_text(name, source).to_string(), methods);
}

/// Unwrap decorated definitions so decorated methods still count as
/// directly declared.
fn as_function_definition(node: Node) -> Option<Node> {
    match node.kind() {
        "function_definition" => Some(node),
        "decorated_definition" => node
            .child_by_field_name("definition")
            .filter(|def| def.kind() == "function_definition"),
        _ => None,
    }
}

/// `import a.b, c as d` records `a.b` and `c` (the qualified names, not the
/// aliases).
fn record_plain_import(node: Node, source: &str, structure: &mut FileStructure) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                structure.imports.push(node_text(child, source).to_string());
            }
            "aliased_import" => {
                if let Some(name) = child.child_by_field_name("name") {
                    structure.imports.push(node_text(name, source).to_string());
                }
            }
            _ => {}
        }
    }
}

/// `from a.b import c, d as e` records `a.b.c` and `a.b.d`;
/// `from a import *` records `a.*`.
fn record_from_import(node: Node, source: &str, structure: &mut FileStructure) {
    let module = node
        .child_by_field_name("module_name")
        .map(|m| node_text(m, source).to_string())
        .unwrap_or_default();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "wildcard_import" {
            structure.imports.push(format!("{}.*", module));
        }
    }

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let imported = match name.kind() {
            "aliased_import" => name.child_by_field_name("name"),
            _ => Some(name),
        };
        if let Some(imported) = imported {
            structure
                .imports
                .push(format!("{}.{}", module, node_text(imported, source)));
        }
    }
}
