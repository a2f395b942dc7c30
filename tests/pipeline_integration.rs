//! Integration tests for the discovery -> parsing -> index -> graph
//! pipeline, run against the testdata fixtures.

use std::path::PathBuf;

use codescope::graph::{build_graph, EdgeKind, NodeKind};
use codescope::index::{IndexBuilder, SCHEMA_VERSION};
use codescope::parser::Dialect;
use codescope::{discover, IndexOutcome};
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn build_testdata_index() -> IndexOutcome {
    codescope::init();
    IndexBuilder::new(testdata_path()).build()
}

#[test]
fn test_discovery_classifies_dialects() {
    codescope::init();
    let files = discover(testdata_path());

    assert_eq!(files.len(), 7);

    let app = files.iter().find(|f| f.rel_path == "app.py").unwrap();
    assert_eq!(app.dialect, Dialect::Script);

    let blink = files.iter().find(|f| f.rel_path == "blink.ino").unwrap();
    assert_eq!(blink.dialect, Dialect::Firmware);

    // nested files keep /-normalized relative paths
    assert!(files.iter().any(|f| f.rel_path == "pkg/helpers.py"));
}

#[test]
fn test_index_is_best_effort_over_parse_failures() {
    let outcome = build_testdata_index();

    assert_eq!(outcome.structured(), 6);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].file, "broken.py");
    assert!(!outcome.index.contains("broken.py"));
}

#[test]
fn test_classes_recorded_in_declaration_order() {
    let outcome = build_testdata_index();
    let app = outcome.index.get("app.py").unwrap();

    let classes: Vec<&String> = app.classes.keys().collect();
    assert_eq!(classes, ["Dashboard", "Exporter"]);
    assert_eq!(app.classes["Dashboard"], ["__init__", "render"]);
    assert_eq!(app.classes["Exporter"], ["export"]);
}

#[test]
fn test_script_imports_in_source_order() {
    let outcome = build_testdata_index();
    let app = outcome.index.get("app.py").unwrap();

    assert_eq!(
        app.imports,
        ["os", "util", "pkg.helpers", "util.format_row"]
    );
}

#[test]
fn test_firmware_functions_with_lines() {
    let outcome = build_testdata_index();
    let blink = outcome.index.get("blink.ino").unwrap();

    assert_eq!(blink.dialect, Dialect::Firmware);
    assert_eq!(blink.functions["setup"].line, 1);
    assert_eq!(blink.functions["loop"].line, 5);
    assert_eq!(blink.functions["blinkOnce"].line, 9);
}

#[test]
fn test_snapshot_persists_with_schema_version() {
    codescope::init();
    let snapshots = TempDir::new().unwrap();
    let builder = IndexBuilder::new(testdata_path()).snapshot_dir(snapshots.path());

    let outcome = builder.run("sample").unwrap();
    assert_eq!(outcome.structured(), 6);

    let loaded = builder.load("sample").unwrap();
    assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    assert_eq!(loaded.project, "sample");
    assert!(loaded.files.contains("pkg/helpers.py"));
    assert_eq!(loaded.files, outcome.index);
}

#[test]
fn test_parallel_build_matches_sequential() {
    codescope::init();
    let sequential = IndexBuilder::new(testdata_path()).build();
    let parallel = IndexBuilder::new(testdata_path()).parallel(true).build();

    assert_eq!(sequential.index, parallel.index);
    assert_eq!(sequential.failures, parallel.failures);
}

#[test]
fn test_containment_layer_mirrors_structures() {
    let outcome = build_testdata_index();
    let graph = build_graph(&outcome.index);

    let render = graph
        .nodes
        .iter()
        .find(|n| n.id == "app.py::Dashboard.render")
        .unwrap();
    assert_eq!(render.kind, NodeKind::Method);

    assert!(graph.edges.iter().any(|e| {
        e.kind == EdgeKind::Contains
            && e.source == "app.py"
            && e.target == "app.py::Dashboard"
    }));
    assert!(graph.edges.iter().any(|e| {
        e.kind == EdgeKind::Contains
            && e.source == "app.py::Dashboard"
            && e.target == "app.py::Dashboard.render"
    }));
}

#[test]
fn test_containment_layer_is_acyclic_and_self_loop_free() {
    let outcome = build_testdata_index();
    let graph = build_graph(&outcome.index);

    for edge in graph.edges.iter().filter(|e| e.kind == EdgeKind::Contains) {
        assert_ne!(edge.source, edge.target);
        // container ids are strict prefixes of contained ids
        assert!(edge.target.starts_with(edge.source.as_str()));
    }
}

#[test]
fn test_exact_dotted_import_produces_depends_on_edge() {
    let outcome = build_testdata_index();
    let graph = build_graph(&outcome.index);

    assert!(graph.edges.iter().any(|e| {
        e.kind == EdgeKind::DependsOn && e.source == "app.py" && e.target == "pkg/helpers.py"
    }));
    assert!(graph.edges.iter().any(|e| {
        e.kind == EdgeKind::DependsOn && e.source == "app.py" && e.target == "util.py"
    }));
}

#[test]
fn test_ambiguous_import_resolves_to_exactly_one_edge() {
    // leaky.py imports shared.util: no exact match, and both util.py and
    // pkg/util.py share the final segment. Exactly one edge must be picked,
    // and the pick must be stable for a fixed discovery order.
    let outcome = build_testdata_index();
    let graph = build_graph(&outcome.index);

    let ambiguous: Vec<_> = graph
        .edges
        .iter()
        .filter(|e| {
            e.kind == EdgeKind::DependsOn
                && e.source == "leaky.py"
                && (e.target == "util.py" || e.target == "pkg/util.py")
        })
        .collect();
    // leaky.py also imports util directly (exact match to util.py), so the
    // deduplicated edge set holds either one or two edges depending on where
    // shared.util landed; the ambiguous import itself adds at most one.
    assert!(!ambiguous.is_empty() && ambiguous.len() <= 2);

    let rebuilt = build_graph(&build_testdata_index().index);
    assert_eq!(graph.edges, rebuilt.edges);
}

#[test]
fn test_unresolved_imports_are_silent() {
    let outcome = build_testdata_index();
    let graph = build_graph(&outcome.index);

    // `import os` matches nothing in the index
    assert!(graph
        .edges
        .iter()
        .all(|e| !(e.kind == EdgeKind::DependsOn && e.target.ends_with("os"))));
}

#[test]
fn test_empty_project_yields_empty_index() {
    codescope::init();
    let temp = TempDir::new().unwrap();
    let snapshots = TempDir::new().unwrap();
    let builder = IndexBuilder::new(temp.path()).snapshot_dir(snapshots.path());

    let outcome = builder.run("empty").unwrap();
    assert_eq!(outcome.structured(), 0);
    assert!(outcome.index.is_empty());
    assert!(outcome.failures.is_empty());

    let graph = build_graph(&outcome.index);
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
}
