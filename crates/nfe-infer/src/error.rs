//! Error types for model loading and evaluation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, parsing or checking a model artifact.
///
/// Any of these degrades a whole batch to the model error label.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The artifact file could not be read.
    #[error("failed to read model file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not valid UTF-8 text.
    #[error("model file {path} is not a text model")]
    NotText { path: PathBuf },

    /// A line of the artifact is malformed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A header entry is absent or unreadable.
    #[error("model header '{key}': {message}")]
    Header { key: &'static str, message: String },

    /// A tree block is absent, unreadable or structurally inconsistent.
    #[error("tree {tree}: {message}")]
    InvalidTree { tree: usize, message: String },

    /// The model was trained on a different feature list than the contract.
    #[error("model features do not match the contract (expected [{expected}], found [{found}])")]
    FeatureMismatch { expected: String, found: String },
}

/// Errors raised while evaluating a loaded model on a batch.
///
/// Any of these degrades a whole batch to the prediction error label.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// A numerically encoded feature carried text.
    #[error("feature '{feature}' expects a number, got '{value}'")]
    NonNumeric { feature: String, value: String },

    /// The model's category lists do not line up with the categorical features.
    #[error("model has {found} category lists but {expected} categorical features")]
    CategoryListMismatch { expected: usize, found: usize },

    /// A row is narrower than the model's feature count.
    #[error("row {row} has {found} features, model expects {expected}")]
    FeatureCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Argmax was requested over a one-dimensional probability output.
    #[error("cannot take argmax over one-dimensional probabilities")]
    OneDimensionalArgmax,

    /// A row produced no class scores.
    #[error("row {row} has no class scores")]
    EmptyScores { row: usize },
}
