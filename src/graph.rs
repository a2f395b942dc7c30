//! Dependency graph derivation from a `ProjectIndex`.
//!
//! Two layers are always produced:
//! - a containment layer (File -> Class -> Method), a direct unfold of each
//!   `FileStructure`, acyclic and self-loop-free by construction;
//! - a best-effort dependency layer (File -> File) derived from import
//!   resolution. Unresolved imports produce no edge and no warning.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::index::ProjectIndex;

/// Node weights, a visualization hint for downstream renderers.
const FILE_WEIGHT: u32 = 50;
const CLASS_WEIGHT: u32 = 30;
const METHOD_WEIGHT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Class,
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Contains,
    DependsOn,
}

/// A node in the code graph. Ids are hierarchical: `file`, `file::Class`,
/// `file::Class.method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// Node and edge lists, consumable by any visualization collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl CodeGraph {
    fn add_node(&mut self, id: String, kind: NodeKind, weight: u32) {
        self.nodes.push(GraphNode { id, kind, weight });
    }
}

/// Derive the containment and dependency layers from one index.
pub fn build_graph(index: &ProjectIndex) -> CodeGraph {
    let mut graph = CodeGraph::default();
    let mut seen_edges: HashSet<GraphEdge> = HashSet::new();

    let mut add_edge = |edges: &mut Vec<GraphEdge>, edge: GraphEdge| {
        // set semantics: duplicate (source, target, kind) triples collapse
        if edge.source != edge.target && seen_edges.insert(edge.clone()) {
            edges.push(edge);
        }
    };

    // Containment layer: a direct unfold of each FileStructure.
    for (path, structure) in index.iter() {
        graph.add_node(path.to_string(), NodeKind::File, FILE_WEIGHT);

        for (class_name, methods) in &structure.classes {
            let class_id = format!("{}::{}", path, class_name);
            graph.add_node(class_id.clone(), NodeKind::Class, CLASS_WEIGHT);
            add_edge(
                &mut graph.edges,
                GraphEdge {
                    source: path.to_string(),
                    target: class_id.clone(),
                    kind: EdgeKind::Contains,
                },
            );

            for method in methods {
                let method_id = format!("{}.{}", class_id, method);
                graph.add_node(method_id.clone(), NodeKind::Method, METHOD_WEIGHT);
                add_edge(
                    &mut graph.edges,
                    GraphEdge {
                        source: class_id.clone(),
                        target: method_id,
                        kind: EdgeKind::Contains,
                    },
                );
            }
        }
    }

    // Dependency layer: best-effort import resolution, file to file.
    for (path, structure) in index.iter() {
        for import in &structure.imports {
            if let Some(target) = resolve_import(import, index) {
                add_edge(
                    &mut graph.edges,
                    GraphEdge {
                        source: path.to_string(),
                        target: target.to_string(),
                        kind: EdgeKind::DependsOn,
                    },
                );
            }
        }
    }

    graph
}

/// Match an import's dotted name against the index.
///
/// Priority: (1) exact match against a file's extension-stripped, dot-joined
/// relative path; (2) fallback where the import's final segment equals the
/// file's extension-stripped final path segment. First match in index
/// insertion order wins, which makes ambiguous imports resolve by discovery
/// order; the ambiguity is deliberate reference behavior, kept and
/// documented rather than silently changed.
fn resolve_import<'a>(import: &str, index: &'a ProjectIndex) -> Option<&'a str> {
    for path in index.paths() {
        if dotted_module_path(path) == import {
            return Some(path);
        }
    }

    let last_segment = import.rsplit('.').next()?;
    for path in index.paths() {
        if file_stem(path) == last_segment {
            return Some(path);
        }
    }

    None
}

/// `pkg/helpers.py` -> `pkg.helpers`
fn dotted_module_path(rel_path: &str) -> String {
    strip_extension(rel_path).replace('/', ".")
}

/// `pkg/helpers.py` -> `helpers`
fn file_stem(rel_path: &str) -> &str {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    strip_extension(name)
}

fn strip_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(idx) if idx > 0 => &path[..idx],
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Dialect, FileStructure, FunctionInfo};

    fn structure(path: &str, imports: &[&str]) -> FileStructure {
        let mut fs = FileStructure::new(path, Dialect::Script);
        fs.imports = imports.iter().map(|s| s.to_string()).collect();
        fs
    }

    fn sample_index() -> ProjectIndex {
        let mut index = ProjectIndex::new();

        let mut app = structure("app.py", &["util", "pkg.helpers", "os"]);
        app.classes
            .insert("App".to_string(), vec!["run".to_string()]);
        app.functions
            .insert("main".to_string(), FunctionInfo { line: 10 });
        index.insert(app);

        index.insert(structure("util.py", &[]));
        index.insert(structure("pkg/helpers.py", &[]));
        index.insert(structure("pkg/util.py", &[]));
        index
    }

    #[test]
    fn test_containment_unfold() {
        let graph = build_graph(&sample_index());

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(ids.contains(&"app.py"));
        assert!(ids.contains(&"app.py::App"));
        assert!(ids.contains(&"app.py::App.run"));

        assert!(graph.edges.contains(&GraphEdge {
            source: "app.py".to_string(),
            target: "app.py::App".to_string(),
            kind: EdgeKind::Contains,
        }));
        assert!(graph.edges.contains(&GraphEdge {
            source: "app.py::App".to_string(),
            target: "app.py::App.run".to_string(),
            kind: EdgeKind::Contains,
        }));
    }

    #[test]
    fn test_containment_has_no_self_loops_and_is_acyclic() {
        let graph = build_graph(&sample_index());
        for edge in graph.edges.iter().filter(|e| e.kind == EdgeKind::Contains) {
            assert_ne!(edge.source, edge.target);
            // hierarchical ids: a container id is a strict prefix of the
            // contained id, which rules out cycles
            assert!(edge.target.starts_with(edge.source.as_str()));
        }
    }

    #[test]
    fn test_exact_dotted_path_resolution() {
        let graph = build_graph(&sample_index());
        assert!(graph.edges.contains(&GraphEdge {
            source: "app.py".to_string(),
            target: "pkg/helpers.py".to_string(),
            kind: EdgeKind::DependsOn,
        }));
        assert!(graph.edges.contains(&GraphEdge {
            source: "app.py".to_string(),
            target: "util.py".to_string(),
            kind: EdgeKind::DependsOn,
        }));
    }

    #[test]
    fn test_unresolved_import_produces_no_edge() {
        let graph = build_graph(&sample_index());
        let os_edges: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::DependsOn && e.target.contains("os"))
            .collect();
        assert!(os_edges.is_empty());
    }

    #[test]
    fn test_final_segment_fallback_prefers_index_order() {
        let mut index = sample_index();
        // `shared.util` has no exact match; both util.py and pkg/util.py
        // match by final segment. Index order decides.
        index.insert(structure("consumer.py", &["shared.util"]));

        let graph = build_graph(&index);
        let edges: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.source == "consumer.py" && e.kind == EdgeKind::DependsOn)
            .collect();

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "util.py");
    }

    #[test]
    fn test_duplicate_imports_collapse_to_one_edge() {
        let mut index = ProjectIndex::new();
        index.insert(structure("a.py", &["b", "b"]));
        index.insert(structure("b.py", &[]));

        let graph = build_graph(&index);
        let depends: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::DependsOn)
            .collect();
        assert_eq!(depends.len(), 1);
    }

    #[test]
    fn test_self_import_produces_no_edge() {
        let mut index = ProjectIndex::new();
        index.insert(structure("solo.py", &["solo"]));

        let graph = build_graph(&index);
        assert!(graph
            .edges
            .iter()
            .all(|e| e.kind != EdgeKind::DependsOn));
    }
}
