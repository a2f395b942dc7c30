//! Dialect-aware structural parsing.
//!
//! This module provides:
//! - `FileStructure`: the structural summary extracted from one source file
//! - `StructuralParser` trait: abstract interface for dialect parsers
//! - A factory-based parser registry keyed by file extension
//!
//! Two dialects ship built in: `Script` (Python, tree-sitter backed) and
//! `Firmware` (Arduino sketches, line-scanner backed). New dialects plug in
//! by registering a factory for their extension; the pipeline itself never
//! branches on extensions directly.

use std::collections::HashMap;
use std::sync::RwLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod firmware;
pub mod script;

/// A source-file family with its own parsing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Script,
    Firmware,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Script => "script",
            Dialect::Firmware => "firmware",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-function metadata recorded in a `FileStructure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Line number of the definition (1-indexed).
    pub line: usize,
}

/// The structural summary of one source file.
///
/// Built once per file by a dialect parser and never mutated afterwards.
/// Maps keep insertion order (declaration/walk order in the source).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStructure {
    /// Relative path, `/`-normalized.
    pub file_path: String,
    /// The dialect that produced this structure.
    pub dialect: Dialect,
    /// Top-level class name -> directly declared method names.
    pub classes: IndexMap<String, Vec<String>>,
    /// Function name -> definition info, for every function definition.
    pub functions: IndexMap<String, FunctionInfo>,
    /// Dotted qualified import names, in source order.
    pub imports: Vec<String>,
}

impl FileStructure {
    /// Create an empty structure for a file.
    pub fn new(file_path: &str, dialect: Dialect) -> Self {
        Self {
            file_path: file_path.to_string(),
            dialect,
            classes: IndexMap::new(),
            functions: IndexMap::new(),
            imports: Vec::new(),
        }
    }
}

/// A file that could not be structured.
///
/// Parse failures are reported out-of-band; the failing file is simply
/// omitted from the index and the rest of the project is still processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at line {line}: {message}")]
pub struct ParseError {
    /// Line of the first offending construct (1-indexed).
    pub line: usize,
    pub message: String,
}

/// Parser trait implemented once per dialect.
pub trait StructuralParser: Send + Sync {
    /// The dialect this parser handles.
    fn dialect(&self) -> Dialect;

    /// Extract the structural summary from source code.
    ///
    /// `rel_path` is recorded verbatim as `FileStructure.file_path`.
    fn parse(&self, rel_path: &str, source: &str) -> Result<FileStructure, ParseError>;
}

/// Factory function type for creating parser instances.
pub type ParserFactory = fn() -> Box<dyn StructuralParser>;

lazy_static::lazy_static! {
    /// Global parser registry mapping file extensions to parser factories.
    static ref REGISTRY: RwLock<HashMap<String, ParserFactory>> = RwLock::new(HashMap::new());
}

/// Register a parser factory for a file extension (without the dot).
pub fn register(ext: &str, factory: ParserFactory) {
    let mut registry = REGISTRY.write().unwrap();
    registry.insert(ext.to_string(), factory);
}

/// Get a parser for the given file extension.
/// Returns None if no parser is registered for the extension.
pub fn for_extension(ext: &str) -> Option<Box<dyn StructuralParser>> {
    let registry = REGISTRY.read().unwrap();
    registry.get(ext).map(|factory| factory())
}

/// Return all registered file extensions.
pub fn supported_extensions() -> Vec<String> {
    let registry = REGISTRY.read().unwrap();
    registry.keys().cloned().collect()
}

/// Initialize the parser registry with the built-in dialect parsers.
/// Call this once at startup before using parsers.
pub fn init() {
    script::register();
    firmware::register();
}
