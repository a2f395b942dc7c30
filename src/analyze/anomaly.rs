//! Anomaly pass: per-file feature vectors scored by a pluggable outlier
//! detector.
//!
//! Each file is reduced to a fixed 5-dimensional count vector (conditionals,
//! for-loops, while-keywords, TODO markers, debug prints). The scorer is a
//! capability with a two-phase contract: `fit` once over every file's vector,
//! then `score` each vector individually. Fitting must cover the whole
//! project before any scoring; a scorer fitted on a single sample trivially
//! fits itself and detects nothing.

use regex::Regex;

use super::types::{Issue, IssueKind, Severity};

/// Number of feature dimensions.
pub const FEATURE_DIMS: usize = 5;

/// A per-file feature vector: conditionals, for-loops, while-keywords,
/// TODO markers, debug prints.
pub type FeatureVector = [f64; FEATURE_DIMS];

lazy_static::lazy_static! {
    static ref CONDITIONALS: Regex = Regex::new(r"\bif\b").unwrap();
    static ref FOR_LOOPS: Regex = Regex::new(r"\bfor\s+\w+\s+in\b").unwrap();
    static ref WHILE_KEYWORDS: Regex = Regex::new(r"\bwhile\b").unwrap();
    static ref TODO_MARKERS: Regex = Regex::new(r"#\s*TODO").unwrap();
    static ref DEBUG_PRINTS: Regex = Regex::new(r"\bprint\(").unwrap();
}

/// Extract the fixed feature vector from raw source text.
pub fn extract_features(source: &str) -> FeatureVector {
    [
        CONDITIONALS.find_iter(source).count() as f64,
        FOR_LOOPS.find_iter(source).count() as f64,
        WHILE_KEYWORDS.find_iter(source).count() as f64,
        TODO_MARKERS.find_iter(source).count() as f64,
        DEBUG_PRINTS.find_iter(source).count() as f64,
    ]
}

/// Scoring outcome for one vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLabel {
    Inlier,
    Outlier,
}

/// Pluggable outlier scorer.
///
/// Implementations must be deterministic for a given fit set; the analyzer
/// fits once per project and then scores every file.
pub trait AnomalyScorer: Send + Sync {
    /// Fit on every file's vector. Called exactly once per analysis run,
    /// before any `score` call.
    fn fit(&mut self, vectors: &[FeatureVector]);

    /// Label one vector against the fitted model.
    fn score(&self, vector: &FeatureVector) -> ScoreLabel;
}

/// Default scorer: distance from the fitted centroid, with a cutoff at a
/// multiple of the mean distance. Deterministic and training-free.
pub struct MeanDistanceScorer {
    spread_factor: f64,
    centroid: FeatureVector,
    cutoff: f64,
    fitted: bool,
}

impl MeanDistanceScorer {
    pub fn new(spread_factor: f64) -> Self {
        Self {
            spread_factor,
            centroid: [0.0; FEATURE_DIMS],
            cutoff: 0.0,
            fitted: false,
        }
    }
}

impl Default for MeanDistanceScorer {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl AnomalyScorer for MeanDistanceScorer {
    fn fit(&mut self, vectors: &[FeatureVector]) {
        self.fitted = false;
        if vectors.is_empty() {
            return;
        }

        let mut centroid = [0.0; FEATURE_DIMS];
        for vector in vectors {
            for (dim, value) in vector.iter().enumerate() {
                centroid[dim] += value;
            }
        }
        for value in centroid.iter_mut() {
            *value /= vectors.len() as f64;
        }

        let mean_distance = vectors
            .iter()
            .map(|v| distance(v, &centroid))
            .sum::<f64>()
            / vectors.len() as f64;

        self.centroid = centroid;
        self.cutoff = self.spread_factor * mean_distance;
        self.fitted = true;
    }

    fn score(&self, vector: &FeatureVector) -> ScoreLabel {
        if !self.fitted || self.cutoff <= 0.0 {
            return ScoreLabel::Inlier;
        }
        if distance(vector, &self.centroid) > self.cutoff {
            ScoreLabel::Outlier
        } else {
            ScoreLabel::Inlier
        }
    }
}

fn distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Emit at most one anomaly issue for a file whose vector scores as an
/// outlier.
pub(crate) fn anomaly_pass(
    file: &str,
    vector: &FeatureVector,
    scorer: &dyn AnomalyScorer,
) -> Option<Issue> {
    match scorer.score(vector) {
        ScoreLabel::Outlier => Some(Issue {
            kind: IssueKind::MlAnomaly,
            file: file.to_string(),
            line: None,
            message: "unusual code profile relative to the rest of the project".to_string(),
            severity: Severity::Info,
        }),
        ScoreLabel::Inlier => None,
    }
}
