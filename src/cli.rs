//! Command-line interface for codescope.

use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::Analyzer;
use crate::discover;
use crate::fix::{self, FixError};
use crate::graph;
use crate::index::{IndexBuilder, DEFAULT_SNAPSHOT_DIR};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ISSUES: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Structural code mapper and static defect analyzer.
///
/// codescope builds a language-aware structural model of a source tree
/// (files, classes, functions, imports), derives a dependency graph from it,
/// and runs a multi-strategy analyzer that locates candidate defects and
/// proposes textual fixes.
#[derive(Parser)]
#[command(name = "codescope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and persist the structural index for a project
    Index(IndexArgs),
    /// Analyze a project and report candidate defects
    #[command(visible_alias = "scan")]
    Analyze(AnalyzeArgs),
    /// Emit the containment + dependency graph as JSON
    Graph(GraphArgs),
    /// Write proposed fixes for analyzer findings to a separate directory
    Fix(FixArgs),
}

/// Arguments for the index command.
#[derive(Parser)]
pub struct IndexArgs {
    /// Project root to index
    pub path: PathBuf,

    /// Project identifier for the snapshot (default: root directory name)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Snapshot directory (default: <root>/.codescope)
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    /// Parse files in parallel
    #[arg(long)]
    pub parallel: bool,
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Project root to analyze
    pub path: PathBuf,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Project identifier for the rebuilt snapshot (default: root directory
    /// name)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Snapshot directory (default: <root>/.codescope)
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,
}

/// Arguments for the graph command.
#[derive(Parser)]
pub struct GraphArgs {
    /// Project root to map
    pub path: PathBuf,
}

/// Arguments for the fix command.
#[derive(Parser)]
pub struct FixArgs {
    /// Project root to analyze
    pub path: PathBuf,

    /// Directory for proposed patched copies (default:
    /// <root>/.codescope/fixes). Source files are never modified.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

fn resolve_root(path: &Path) -> anyhow::Result<PathBuf> {
    let root = path.canonicalize()?;
    anyhow::ensure!(root.is_dir(), "not a directory: {}", path.display());
    Ok(root)
}

fn default_project_id(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// Run the index command.
pub fn run_index(args: &IndexArgs) -> anyhow::Result<i32> {
    crate::init();

    let root = match resolve_root(&args.path) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    let project = args
        .project
        .clone()
        .unwrap_or_else(|| default_project_id(&root));

    let mut builder = IndexBuilder::new(&root).parallel(args.parallel);
    if let Some(dir) = &args.snapshot_dir {
        builder = builder.snapshot_dir(dir);
    }

    let outcome = builder.run(&project)?;
    for failure in &outcome.failures {
        eprintln!(
            "Warning: {}: line {}: {}",
            failure.file, failure.line, failure.message
        );
    }

    println!(
        "Indexed {} files for project {:?} -> {}",
        outcome.structured(),
        project,
        builder.snapshot_path(&project).display()
    );
    Ok(EXIT_SUCCESS)
}

/// Run the analyze command. The index is rebuilt wholesale and re-persisted
/// on every analysis request.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    crate::init();

    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let root = match resolve_root(&args.path) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    let project = args
        .project
        .clone()
        .unwrap_or_else(|| default_project_id(&root));

    let files = discover::discover(&root);

    let mut builder = IndexBuilder::new(&root);
    if let Some(dir) = &args.snapshot_dir {
        builder = builder.snapshot_dir(dir);
    }
    let outcome = builder.build_from(&files);
    builder.persist(&project, &outcome.index)?;

    let mut analyzer = Analyzer::new(&root);
    let result = analyzer.run(&files)?;

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &result)?,
        _ => report::write_pretty(&path_str, &result),
    }

    if result.has_errors() {
        Ok(EXIT_ISSUES)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the graph command.
pub fn run_graph(args: &GraphArgs) -> anyhow::Result<i32> {
    crate::init();

    let root = match resolve_root(&args.path) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let outcome = IndexBuilder::new(&root).build();
    let code_graph = graph::build_graph(&outcome.index);
    println!("{}", serde_json::to_string_pretty(&code_graph)?);
    Ok(EXIT_SUCCESS)
}

/// Run the fix command: analyze, then write a proposed patched copy for the
/// first fixable issue of each file under the output directory.
pub fn run_fix(args: &FixArgs) -> anyhow::Result<i32> {
    crate::init();

    let root = match resolve_root(&args.path) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| root.join(DEFAULT_SNAPSHOT_DIR).join("fixes"));

    let files = discover::discover(&root);
    let mut analyzer = Analyzer::new(&root);
    let result = analyzer.run(&files)?;

    let mut patched_files: HashSet<String> = HashSet::new();
    let mut written = 0usize;
    let mut unavailable = 0usize;

    for issue in &result.issues {
        if patched_files.contains(&issue.file) {
            continue;
        }
        let source = match fs::read_to_string(root.join(&issue.file)) {
            Ok(source) => source,
            Err(_) => continue,
        };

        match fix::generate_fix(issue, &source) {
            Ok(suggestion) => {
                let target = out_dir.join(&issue.file);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, suggestion.patched)?;
                patched_files.insert(issue.file.clone());
                written += 1;
                println!(
                    "proposed fix for {} ({}) -> {}",
                    issue.file,
                    issue.kind,
                    target.display()
                );
            }
            Err(FixError::NoStrategy(_)) | Err(FixError::NotSupported(_)) => {
                unavailable += 1;
            }
            Err(e) => {
                eprintln!("Warning: {}: {}", issue.file, e);
            }
        }
    }

    println!(
        "{} fixes proposed, {} issues without an available fix",
        written, unavailable
    );
    Ok(EXIT_SUCCESS)
}
