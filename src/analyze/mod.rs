//! Multi-strategy static analysis over discovered source files.
//!
//! Three independent passes run per file, in a fixed order, and their issues
//! are concatenated: structural (tree-walking, Script files only), then
//! pattern (regex table over raw text), then anomaly (outlier scoring of
//! per-file feature vectors). Each pass's issues are ordered by ascending
//! line, ties in first-produced order.
//!
//! A Script file that fails to parse contributes exactly one critical
//! `SyntaxError` issue and is otherwise skipped. Analysis is always
//! best-effort over whatever could be read.

mod anomaly;
mod patterns;
mod structural;
mod types;

pub use anomaly::{
    extract_features, AnomalyScorer, FeatureVector, MeanDistanceScorer, ScoreLabel, FEATURE_DIMS,
};
pub use types::{AnalysisReport, Issue, IssueKind, Severity};

use std::fs;
use std::path::{Path, PathBuf};

use crate::discover::DiscoveredFile;
use crate::parser::{script, Dialect, ParseError};

/// One file loaded for analysis.
struct LoadedFile {
    rel_path: String,
    source: String,
    features: FeatureVector,
    state: ParseState,
}

enum ParseState {
    /// Script file with a usable syntax tree.
    Tree(tree_sitter::Tree),
    /// Script file that failed to parse.
    Broken(ParseError),
    /// Firmware file; no tree is available for this dialect.
    Untyped,
}

/// Runs the analysis passes over a project's files.
pub struct Analyzer {
    root: PathBuf,
    scorer: Box<dyn AnomalyScorer>,
}

impl Analyzer {
    /// Create an analyzer for `root` with the default anomaly scorer.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            scorer: Box::new(MeanDistanceScorer::default()),
        }
    }

    /// Swap in a different anomaly scorer.
    pub fn with_scorer(mut self, scorer: Box<dyn AnomalyScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Analyze the given files, in the given (discovery) order.
    pub fn run(&mut self, files: &[DiscoveredFile]) -> anyhow::Result<AnalysisReport> {
        let loaded = self.load(files);

        // Fit the scorer across every parseable file's vector before scoring
        // any single file.
        let vectors: Vec<FeatureVector> = loaded
            .iter()
            .filter(|f| !matches!(f.state, ParseState::Broken(_)))
            .map(|f| f.features)
            .collect();
        self.scorer.fit(&vectors);

        let mut report = AnalysisReport::new();
        for file in &loaded {
            report.scanned += 1;
            self.analyze_file(file, &mut report);
        }
        Ok(report)
    }

    fn analyze_file(&self, file: &LoadedFile, report: &mut AnalysisReport) {
        let broken = match &file.state {
            ParseState::Broken(err) => Some(err),
            _ => None,
        };

        if let Some(err) = broken {
            // All passes are skipped; the file gets exactly one issue.
            report.add_issue(Issue {
                kind: IssueKind::SyntaxError,
                file: file.rel_path.clone(),
                line: Some(err.line),
                message: format!("syntax error: {}", err.message),
                severity: Severity::Critical,
            });
            return;
        }

        if let ParseState::Tree(tree) = &file.state {
            let mut issues = structural::structural_pass(tree, &file.source, &file.rel_path);
            sort_by_line(&mut issues);
            report.issues.extend(issues);
        }

        let mut issues = patterns::pattern_pass(&file.source, &file.rel_path);
        sort_by_line(&mut issues);
        report.issues.extend(issues);

        if let Some(issue) =
            anomaly::anomaly_pass(&file.rel_path, &file.features, self.scorer.as_ref())
        {
            report.add_issue(issue);
        }
    }

    fn load(&self, files: &[DiscoveredFile]) -> Vec<LoadedFile> {
        let mut loaded = Vec::with_capacity(files.len());

        for file in files {
            let source = match fs::read_to_string(self.root.join(&file.rel_path)) {
                Ok(source) => source,
                Err(err) => {
                    eprintln!(
                        "Warning: skipping unreadable file {}: {}",
                        file.rel_path, err
                    );
                    continue;
                }
            };

            let state = match file.dialect {
                Dialect::Script => match script::parse_tree(&source) {
                    Ok(tree) => match script::syntax_error_of(&tree) {
                        Some(err) => ParseState::Broken(err),
                        None => ParseState::Tree(tree),
                    },
                    Err(err) => ParseState::Broken(err),
                },
                Dialect::Firmware => ParseState::Untyped,
            };

            loaded.push(LoadedFile {
                rel_path: file.rel_path.clone(),
                features: extract_features(&source),
                source,
                state,
            });
        }

        loaded
    }
}

/// Stable sort by ascending line; issues without a line sort last.
fn sort_by_line(issues: &mut [Issue]) {
    issues.sort_by_key(|i| i.line.unwrap_or(usize::MAX));
}
