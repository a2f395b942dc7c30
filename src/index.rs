//! The structural index: aggregation and persistence of `FileStructure`s.
//!
//! `IndexBuilder` drives discovery and parsing, assembles a `ProjectIndex`
//! keyed by relative path in discovery order, and persists one JSON snapshot
//! per project identifier. The index is rebuilt wholesale on every request;
//! a rebuild replaces the prior snapshot for the same identifier.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::discover::{self, DiscoveredFile};
use crate::parser::{self, FileStructure, ParseError};

/// Version of the persisted snapshot document.
pub const SCHEMA_VERSION: u32 = 1;

/// Default snapshot directory name, created under the scanned root.
pub const DEFAULT_SNAPSHOT_DIR: &str = ".codescope";

/// Aggregate, file-keyed structural snapshot of a project.
///
/// Insertion order is discovery order; keys are unique relative paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectIndex {
    files: IndexMap<String, FileStructure>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a structure under its file path. A duplicate path replaces the
    /// prior structure but keeps its original position.
    pub fn insert(&mut self, structure: FileStructure) {
        self.files.insert(structure.file_path.clone(), structure);
    }

    pub fn get(&self, path: &str) -> Option<&FileStructure> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File paths in insertion (discovery) order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// (path, structure) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileStructure)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The persisted form of a `ProjectIndex`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub schema_version: u32,
    pub project: String,
    pub files: ProjectIndex,
}

/// A file dropped from the index because it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub file: String,
    pub line: usize,
    pub message: String,
}

/// Result of one index build.
#[derive(Debug, Clone, Default)]
pub struct IndexOutcome {
    pub index: ProjectIndex,
    /// Parse failures, reported out-of-band; the index stays best-effort.
    pub failures: Vec<ParseFailure>,
}

impl IndexOutcome {
    /// Count of files successfully structured.
    pub fn structured(&self) -> usize {
        self.index.len()
    }
}

/// Builds and persists the structural index for one project root.
pub struct IndexBuilder {
    root: PathBuf,
    snapshot_dir: PathBuf,
    parallel: bool,
}

impl IndexBuilder {
    /// Create a builder for `root`. Snapshots default to
    /// `<root>/.codescope`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let snapshot_dir = root.join(DEFAULT_SNAPSHOT_DIR);
        Self {
            root,
            snapshot_dir,
            parallel: false,
        }
    }

    /// Override the snapshot directory.
    pub fn snapshot_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.snapshot_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Parse files in parallel. Output is identical to the sequential build:
    /// results are collected keyed by discovery order before merging.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Discover, parse, and assemble the index.
    pub fn build(&self) -> IndexOutcome {
        let files = discover::discover(&self.root);
        self.build_from(&files)
    }

    /// Assemble the index from an already-discovered file list.
    pub fn build_from(&self, files: &[DiscoveredFile]) -> IndexOutcome {
        let results: Vec<Option<Result<FileStructure, ParseError>>> = if self.parallel {
            use rayon::prelude::*;
            // rayon's indexed collect preserves input order, so the merge
            // below still sees discovery order.
            files.par_iter().map(|f| self.parse_one(f)).collect()
        } else {
            files.iter().map(|f| self.parse_one(f)).collect()
        };

        let mut outcome = IndexOutcome::default();
        for (file, result) in files.iter().zip(results) {
            match result {
                Some(Ok(structure)) => outcome.index.insert(structure),
                Some(Err(err)) => outcome.failures.push(ParseFailure {
                    file: file.rel_path.clone(),
                    line: err.line,
                    message: err.message,
                }),
                // unreadable; already warned, skip
                None => {}
            }
        }
        outcome
    }

    /// Build the index and persist it under `project`.
    pub fn run(&self, project: &str) -> anyhow::Result<IndexOutcome> {
        let outcome = self.build();
        self.persist(project, &outcome.index)?;
        Ok(outcome)
    }

    /// Write the snapshot document for `project`, replacing any prior one.
    pub fn persist(&self, project: &str, index: &ProjectIndex) -> anyhow::Result<PathBuf> {
        let snapshot = IndexSnapshot {
            schema_version: SCHEMA_VERSION,
            project: project.to_string(),
            files: index.clone(),
        };

        fs::create_dir_all(&self.snapshot_dir)?;
        let path = self.snapshot_path(project);
        let doc = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, doc)?;
        Ok(path)
    }

    /// Read a previously persisted snapshot back.
    pub fn load(&self, project: &str) -> anyhow::Result<IndexSnapshot> {
        let doc = fs::read_to_string(self.snapshot_path(project))?;
        Ok(serde_json::from_str(&doc)?)
    }

    /// Where the snapshot for `project` lives.
    pub fn snapshot_path(&self, project: &str) -> PathBuf {
        self.snapshot_dir.join(format!("{}.json", project))
    }

    fn parse_one(&self, file: &DiscoveredFile) -> Option<Result<FileStructure, ParseError>> {
        let source = match fs::read_to_string(self.root.join(&file.rel_path)) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("Warning: skipping unreadable file {}: {}", file.rel_path, err);
                return None;
            }
        };
        let dialect_parser = parser::for_extension(extension_of(&file.rel_path))?;
        Some(dialect_parser.parse(&file.rel_path, &source))
    }
}

fn extension_of(rel_path: &str) -> &str {
    rel_path.rsplit('.').next().unwrap_or("")
}
