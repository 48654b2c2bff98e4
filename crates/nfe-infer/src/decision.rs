//! Turning class probabilities into class indices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Probability output of a model over a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Probabilities {
    /// One probability per row, from a single-output model.
    Binary(Vec<f64>),
    /// One score vector per row, one entry per class.
    Multiclass(Vec<Vec<f64>>),
}

impl Probabilities {
    /// Number of rows covered.
    pub fn len(&self) -> usize {
        match self {
            Self::Binary(p) => p.len(),
            Self::Multiclass(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Array rank of the output: 1 for binary, 2 for multiclass.
    pub fn ndim(&self) -> usize {
        match self {
            Self::Binary(_) => 1,
            Self::Multiclass(_) => 2,
        }
    }
}

/// How probabilities become class indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionRule {
    /// Always take argmax over the class axis.
    ///
    /// A single-output model cannot be classified this way and the whole
    /// batch fails.
    #[default]
    ArgmaxOnly,
    /// Threshold single-output models at 0.5; argmax otherwise.
    BinaryThreshold,
}

impl DecisionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArgmaxOnly => "argmax-only",
            Self::BinaryThreshold => "binary-threshold",
        }
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argmax-only" | "argmax" => Ok(Self::ArgmaxOnly),
            "binary-threshold" | "threshold" => Ok(Self::BinaryThreshold),
            other => Err(format!(
                "unknown decision rule '{other}' (expected argmax-only or binary-threshold)"
            )),
        }
    }
}

/// Binary cut-off: probabilities at or above it select class 1.
pub const BINARY_THRESHOLD: f64 = 0.5;

/// Class indices for every row of `probabilities`.
pub fn classify(
    probabilities: &Probabilities,
    rule: DecisionRule,
) -> Result<Vec<usize>, InferenceError> {
    match probabilities {
        Probabilities::Binary(p) => {
            let thresholded: Vec<usize> = p
                .iter()
                .map(|&v| usize::from(v >= BINARY_THRESHOLD))
                .collect();
            match rule {
                DecisionRule::BinaryThreshold => Ok(thresholded),
                DecisionRule::ArgmaxOnly => Err(InferenceError::OneDimensionalArgmax),
            }
        }
        Probabilities::Multiclass(rows) => rows
            .iter()
            .enumerate()
            .map(|(row, scores)| argmax(scores).ok_or(InferenceError::EmptyScores { row }))
            .collect(),
    }
}

/// Index of the largest score; ties go to the lowest index.
///
/// A NaN score wins immediately, matching array-library argmax.
pub fn argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            return Some(idx);
        }
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_ties_pick_lowest() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[0.9, 0.05, 0.05]), Some(0));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[0.1, f64::NAN, 0.9]), Some(1));
    }

    #[test]
    fn test_multiclass_classification() {
        let probs = Probabilities::Multiclass(vec![
            vec![0.1, 0.1, 0.1, 0.6, 0.1],
            vec![0.7, 0.1, 0.1, 0.05, 0.05],
        ]);
        assert_eq!(probs.ndim(), 2);
        for rule in [DecisionRule::ArgmaxOnly, DecisionRule::BinaryThreshold] {
            assert_eq!(classify(&probs, rule).unwrap(), vec![3, 0]);
        }
    }

    #[test]
    fn test_binary_output_under_argmax_only_fails() {
        let probs = Probabilities::Binary(vec![0.2, 0.8]);
        assert_eq!(
            classify(&probs, DecisionRule::ArgmaxOnly),
            Err(InferenceError::OneDimensionalArgmax)
        );
    }

    #[test]
    fn test_binary_threshold() {
        let probs = Probabilities::Binary(vec![0.2, 0.5, 0.8]);
        assert_eq!(
            classify(&probs, DecisionRule::BinaryThreshold).unwrap(),
            vec![0, 1, 1]
        );
    }

    #[test]
    fn test_empty_score_row() {
        let probs = Probabilities::Multiclass(vec![vec![1.0], vec![]]);
        assert_eq!(
            classify(&probs, DecisionRule::ArgmaxOnly),
            Err(InferenceError::EmptyScores { row: 1 })
        );
    }

    #[test]
    fn test_rule_parsing() {
        assert_eq!(
            "argmax-only".parse::<DecisionRule>().unwrap(),
            DecisionRule::ArgmaxOnly
        );
        assert_eq!(
            "Binary-Threshold".parse::<DecisionRule>().unwrap(),
            DecisionRule::BinaryThreshold
        );
        assert!("softmax".parse::<DecisionRule>().is_err());
        assert_eq!(DecisionRule::default().to_string(), "argmax-only");
    }
}
