//! A single regression tree and its decision rules.
//!
//! Node layout follows the LightGBM text format: internal nodes are indexed
//! from 0, and a negative child reference `c` points at leaf `!c`.
//!
//! # Decision type bits
//!
//! ```text
//! bit 0      categorical split
//! bit 1      default left (missing values go left)
//! bits 2..3  missing type: 0 none, 1 zero, 2 NaN
//! ```

const CATEGORICAL_MASK: u8 = 1;
const DEFAULT_LEFT_MASK: u8 = 2;
const ZERO_THRESHOLD: f64 = 1e-35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingType {
    None,
    Zero,
    NaN,
}

impl MissingType {
    fn from_decision_type(decision_type: u8) -> Self {
        match (decision_type >> 2) & 3 {
            1 => MissingType::Zero,
            2 => MissingType::NaN,
            _ => MissingType::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub(crate) split_feature: Vec<usize>,
    pub(crate) threshold: Vec<f64>,
    pub(crate) decision_type: Vec<u8>,
    pub(crate) left_child: Vec<i32>,
    pub(crate) right_child: Vec<i32>,
    pub(crate) leaf_value: Vec<f64>,
    pub(crate) cat_boundaries: Vec<usize>,
    pub(crate) cat_threshold: Vec<u32>,
}

impl Tree {
    /// A tree with no splits that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self {
            split_feature: Vec::new(),
            threshold: Vec::new(),
            decision_type: Vec::new(),
            left_child: Vec::new(),
            right_child: Vec::new(),
            leaf_value: vec![value],
            cat_boundaries: Vec::new(),
            cat_threshold: Vec::new(),
        }
    }

    pub fn num_leaves(&self) -> usize {
        self.leaf_value.len()
    }

    /// Highest feature index referenced by a split, if any.
    pub fn max_feature(&self) -> Option<usize> {
        self.split_feature.iter().copied().max()
    }

    /// Raw leaf output for one row of features.
    ///
    /// `features` must be at least as long as [`Tree::max_feature`] + 1.
    pub fn predict(&self, features: &[f64]) -> f64 {
        if self.split_feature.is_empty() {
            return self.leaf_value.first().copied().unwrap_or(0.0);
        }
        let mut node: i32 = 0;
        while node >= 0 {
            node = self.decide(node as usize, features);
        }
        self.leaf_value[(!node) as usize]
    }

    fn decide(&self, node: usize, features: &[f64]) -> i32 {
        let value = features[self.split_feature[node]];
        if self.decision_type[node] & CATEGORICAL_MASK != 0 {
            self.categorical_decision(node, value)
        } else {
            self.numerical_decision(node, value)
        }
    }

    fn numerical_decision(&self, node: usize, value: f64) -> i32 {
        let decision_type = self.decision_type[node];
        let missing = MissingType::from_decision_type(decision_type);
        let mut value = value;
        if value.is_nan() && missing != MissingType::NaN {
            value = 0.0;
        }
        let is_missing = match missing {
            MissingType::Zero => is_zero(value),
            MissingType::NaN => value.is_nan(),
            MissingType::None => false,
        };
        if is_missing {
            return if decision_type & DEFAULT_LEFT_MASK != 0 {
                self.left_child[node]
            } else {
                self.right_child[node]
            };
        }
        if value <= self.threshold[node] {
            self.left_child[node]
        } else {
            self.right_child[node]
        }
    }

    fn categorical_decision(&self, node: usize, value: f64) -> i32 {
        // Unknown categories are encoded as NaN and always go right.
        if value.is_nan() || value < 0.0 {
            return self.right_child[node];
        }
        let category = value as usize;
        let cat_idx = self.threshold[node] as usize;
        let (Some(&start), Some(&end)) = (
            self.cat_boundaries.get(cat_idx),
            self.cat_boundaries.get(cat_idx + 1),
        ) else {
            return self.right_child[node];
        };
        let bitset = self.cat_threshold.get(start..end).unwrap_or(&[]);
        if in_bitset(bitset, category) {
            self.left_child[node]
        } else {
            self.right_child[node]
        }
    }
}

fn is_zero(value: f64) -> bool {
    (-ZERO_THRESHOLD..=ZERO_THRESHOLD).contains(&value)
}

fn in_bitset(bitset: &[u32], position: usize) -> bool {
    let word = position / 32;
    match bitset.get(word) {
        Some(bits) => (bits >> (position % 32)) & 1 == 1,
        None => false,
    }
}
