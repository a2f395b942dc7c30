//! codescope - structural code mapping and static defect analysis.
//!
//! codescope inspects a source tree, builds a dialect-aware structural model
//! of it (files, classes, functions, imports), derives a dependency graph
//! from that model, and runs a multi-strategy analyzer that locates
//! candidate defects and proposes scope-aware textual fixes.
//!
//! # Architecture
//!
//! Data flows strictly forward through the pipeline:
//!
//! - `discover`: enumerate and dialect-classify source files
//! - `parser`: dialect parsers producing one `FileStructure` per file
//! - `index`: aggregation and snapshot persistence of `FileStructure`s
//! - `graph`: containment + dependency graph derivation
//! - `analyze`: structural, pattern, and anomaly passes
//! - `fix`: issue kind -> proposed patched source
//! - `report`: output formatting (pretty, JSON)
//!
//! The index is the shared artifact consumed by every downstream stage; it
//! is rebuilt wholesale on each analysis request and never mutated after
//! construction.
//!
//! # Adding a New Dialect
//!
//! Implement `StructuralParser` and register a factory for the dialect's
//! file extension in `parser`; discovery and the rest of the pipeline pick
//! it up without changes.

pub mod analyze;
pub mod cli;
pub mod discover;
pub mod fix;
pub mod graph;
pub mod index;
pub mod parser;
pub mod report;

pub use analyze::{
    AnalysisReport, Analyzer, AnomalyScorer, FeatureVector, Issue, IssueKind, MeanDistanceScorer,
    ScoreLabel, Severity,
};
pub use discover::{discover, DiscoveredFile};
pub use fix::{generate_fix, FixError, FixSuggestion};
pub use graph::{build_graph, CodeGraph, EdgeKind, GraphEdge, GraphNode, NodeKind};
pub use index::{IndexBuilder, IndexOutcome, IndexSnapshot, ProjectIndex, SCHEMA_VERSION};
pub use parser::{for_extension, Dialect, FileStructure, ParseError, StructuralParser};

/// Initialize all subsystems.
///
/// Call this once at startup.
pub fn init() {
    parser::init();
}
