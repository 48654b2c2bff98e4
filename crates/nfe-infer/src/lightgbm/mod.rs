//! LightGBM text model loading and evaluation.

mod parse;
mod tree;

use std::path::Path;

pub use tree::Tree;

use crate::decision::Probabilities;
use crate::error::{InferenceError, ModelError};

/// Output transform selected by the model's objective line.
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// Softmax across the class scores.
    Multiclass,
    /// Independent sigmoid per class.
    MulticlassOva { sigmoid: f64 },
    /// Sigmoid of the single raw score.
    Binary { sigmoid: f64 },
    /// Raw scores pass through unchanged.
    Identity(String),
}

impl Objective {
    /// Parses an objective line such as `multiclass num_class:5` or
    /// `binary sigmoid:1`.
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().unwrap_or_default();
        let sigmoid = tokens
            .filter_map(|t| t.strip_prefix("sigmoid:"))
            .find_map(|v| v.parse::<f64>().ok())
            .unwrap_or(1.0);
        match name {
            "multiclass" | "softmax" => Self::Multiclass,
            "multiclassova" | "multiclass_ova" | "ova" | "ovr" => Self::MulticlassOva { sigmoid },
            "binary" => Self::Binary { sigmoid },
            other => Self::Identity(other.to_string()),
        }
    }

    fn transform(&self, scores: &mut [f64]) {
        match self {
            Self::Multiclass => softmax(scores),
            Self::MulticlassOva { sigmoid } | Self::Binary { sigmoid } => {
                for score in scores.iter_mut() {
                    *score = logistic(*sigmoid * *score);
                }
            }
            Self::Identity(_) => {}
        }
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(scores: &mut [f64]) {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        total += *score;
    }
    if total > 0.0 {
        for score in scores.iter_mut() {
            *score /= total;
        }
    }
}

/// A parsed gradient-boosted tree ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct Booster {
    num_class: usize,
    num_tree_per_iteration: usize,
    max_feature_idx: usize,
    objective: Objective,
    feature_names: Vec<String>,
    average_output: bool,
    trees: Vec<Tree>,
    pandas_categorical: Option<Vec<Vec<String>>>,
}

impl Booster {
    /// Parses a LightGBM text model.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        parse::parse_model(text)
    }

    /// Parses the raw bytes of an artifact read from `path`.
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self, ModelError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ModelError::NotText {
            path: path.to_path_buf(),
        })?;
        Self::parse(text)
    }

    pub fn num_class(&self) -> usize {
        self.num_class
    }

    /// Scores produced per row; 1 means single-output.
    pub fn num_outputs(&self) -> usize {
        self.num_tree_per_iteration
    }

    /// Number of input features the trees were trained on.
    pub fn num_features(&self) -> usize {
        self.max_feature_idx + 1
    }

    pub fn num_iterations(&self) -> usize {
        self.trees.len() / self.num_tree_per_iteration
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Training-time category lists, one per categorical column in order.
    pub fn pandas_categorical(&self) -> Option<&[Vec<String>]> {
        self.pandas_categorical.as_deref()
    }

    /// Untransformed per-output scores for one row.
    pub fn predict_raw(&self, features: &[f64]) -> Vec<f64> {
        let outputs = self.num_tree_per_iteration;
        let mut scores = vec![0.0; outputs];
        for (idx, tree) in self.trees.iter().enumerate() {
            scores[idx % outputs] += tree.predict(features);
        }
        if self.average_output {
            let iterations = self.num_iterations();
            if iterations > 0 {
                for score in &mut scores {
                    *score /= iterations as f64;
                }
            }
        }
        scores
    }

    /// Transformed probabilities for a batch of encoded rows.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Probabilities, InferenceError> {
        let expected = self.num_features();
        let mut scores = Vec::with_capacity(rows.len());
        for (row, features) in rows.iter().enumerate() {
            if features.len() < expected {
                return Err(InferenceError::FeatureCount {
                    row,
                    expected,
                    found: features.len(),
                });
            }
            let mut raw = self.predict_raw(features);
            self.objective.transform(&mut raw);
            scores.push(raw);
        }

        if self.num_tree_per_iteration == 1 {
            Ok(Probabilities::Binary(
                scores.into_iter().map(|s| s[0]).collect(),
            ))
        } else {
            Ok(Probabilities::Multiclass(scores))
        }
    }
}
