//! Parser for the LightGBM text model format.
//!
//! The file is a `tree` magic line, `key=value` header entries, one
//! `Tree=<n>` block per tree, an `end of trees` marker, then trailing
//! sections of which only `pandas_categorical:` is read.

use std::collections::HashMap;
use std::str::FromStr;

use nfe_model::FeatureValue;
use serde_json::Value;

use super::{Booster, Objective, Tree};
use crate::error::ModelError;

const MAGIC: &str = "tree";
const END_OF_TREES: &str = "end of trees";
const PANDAS_CATEGORICAL: &str = "pandas_categorical:";

struct Block<'a> {
    entries: HashMap<&'a str, &'a str>,
}

impl<'a> Block<'a> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.entries.get(key).copied()
    }
}

pub(super) fn parse_model(text: &str) -> Result<Booster, ModelError> {
    let mut header = Block::new();
    let mut trees: Vec<Block<'_>> = Vec::new();
    let mut average_output = false;
    let mut seen_magic = false;
    let mut trees_done = false;
    let mut pandas_categorical = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let line_no = idx + 1;
        if line.is_empty() {
            continue;
        }
        if !seen_magic {
            if line != MAGIC {
                return Err(ModelError::Parse {
                    line: line_no,
                    message: format!("expected '{MAGIC}' header, found '{line}'"),
                });
            }
            seen_magic = true;
            continue;
        }
        if let Some(rest) = line.strip_prefix(PANDAS_CATEGORICAL) {
            pandas_categorical = parse_pandas_categorical(rest, line_no)?;
            continue;
        }
        if trees_done {
            continue;
        }
        if line == END_OF_TREES {
            trees_done = true;
            continue;
        }
        if line.starts_with("Tree=") {
            trees.push(Block::new());
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                let block = trees.last_mut().unwrap_or(&mut header);
                block.entries.insert(key.trim(), value.trim());
            }
            None if line == "average_output" && trees.is_empty() => average_output = true,
            None => {}
        }
    }

    if !seen_magic {
        return Err(ModelError::Parse {
            line: 0,
            message: "empty model file".to_string(),
        });
    }
    if !trees_done {
        return Err(ModelError::Parse {
            line: text.lines().count(),
            message: format!("missing '{END_OF_TREES}' marker"),
        });
    }

    let num_class: usize = header_value(&header, "num_class")?;
    let num_tree_per_iteration = match header.get("num_tree_per_iteration") {
        Some(_) => header_value(&header, "num_tree_per_iteration")?,
        None => num_class,
    };
    if num_tree_per_iteration == 0 {
        return Err(ModelError::Header {
            key: "num_tree_per_iteration",
            message: "must be positive".to_string(),
        });
    }
    let max_feature_idx: usize = header_value(&header, "max_feature_idx")?;
    let feature_names: Vec<String> = header
        .get("feature_names")
        .ok_or(ModelError::Header {
            key: "feature_names",
            message: "missing".to_string(),
        })?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if feature_names.len() != max_feature_idx + 1 {
        return Err(ModelError::Header {
            key: "feature_names",
            message: format!(
                "{} names for {} features",
                feature_names.len(),
                max_feature_idx + 1
            ),
        });
    }
    let objective = header
        .get("objective")
        .map(Objective::parse)
        .unwrap_or_else(|| Objective::Identity(String::new()));

    if trees.is_empty() {
        return Err(ModelError::InvalidTree {
            tree: 0,
            message: "model has no trees".to_string(),
        });
    }
    if trees.len() % num_tree_per_iteration != 0 {
        return Err(ModelError::InvalidTree {
            tree: trees.len(),
            message: format!(
                "{} trees is not a multiple of {num_tree_per_iteration} per iteration",
                trees.len()
            ),
        });
    }
    let trees = trees
        .iter()
        .enumerate()
        .map(|(idx, block)| {
            parse_tree(block, max_feature_idx).map_err(|message| ModelError::InvalidTree {
                tree: idx,
                message,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Booster {
        num_class,
        num_tree_per_iteration,
        max_feature_idx,
        objective,
        feature_names,
        average_output,
        trees,
        pandas_categorical,
    })
}

fn header_value<T: FromStr>(header: &Block<'_>, key: &'static str) -> Result<T, ModelError> {
    let raw = header.get(key).ok_or(ModelError::Header {
        key,
        message: "missing".to_string(),
    })?;
    raw.parse().map_err(|_| ModelError::Header {
        key,
        message: format!("invalid value '{raw}'"),
    })
}

fn list<T: FromStr>(block: &Block<'_>, key: &str) -> Result<Vec<T>, String> {
    let Some(raw) = block.get(key) else {
        return Ok(Vec::new());
    };
    raw.split_whitespace()
        .map(|token| {
            token
                .parse()
                .map_err(|_| format!("invalid {key} entry '{token}'"))
        })
        .collect()
}

fn sized_list<T: FromStr>(block: &Block<'_>, key: &str, len: usize) -> Result<Vec<T>, String> {
    let values = list(block, key)?;
    if values.len() != len {
        return Err(format!("{key} has {} entries, expected {len}", values.len()));
    }
    Ok(values)
}

fn parse_tree(block: &Block<'_>, max_feature_idx: usize) -> Result<Tree, String> {
    let num_leaves: usize = block
        .get("num_leaves")
        .ok_or_else(|| "missing num_leaves".to_string())?
        .parse()
        .map_err(|_| "invalid num_leaves".to_string())?;
    if num_leaves == 0 {
        return Err("num_leaves must be positive".to_string());
    }
    let leaf_value: Vec<f64> = sized_list(block, "leaf_value", num_leaves)?;
    if num_leaves == 1 {
        return Ok(Tree::constant(leaf_value[0]));
    }

    let internal = num_leaves - 1;
    let split_feature: Vec<usize> = sized_list(block, "split_feature", internal)?;
    let threshold: Vec<f64> = sized_list(block, "threshold", internal)?;
    let decision_type: Vec<u8> = sized_list(block, "decision_type", internal)?;
    let left_child: Vec<i32> = sized_list(block, "left_child", internal)?;
    let right_child: Vec<i32> = sized_list(block, "right_child", internal)?;

    let num_cat: usize = match block.get("num_cat") {
        Some(raw) => raw.parse().map_err(|_| "invalid num_cat".to_string())?,
        None => 0,
    };
    let (cat_boundaries, cat_threshold) = if num_cat > 0 {
        let boundaries: Vec<usize> = sized_list(block, "cat_boundaries", num_cat + 1)?;
        let bits: Vec<u32> = list(block, "cat_threshold")?;
        if boundaries.windows(2).any(|w| w[0] > w[1])
            || boundaries.last().is_some_and(|&end| end > bits.len())
        {
            return Err("cat_boundaries out of range".to_string());
        }
        (boundaries, bits)
    } else {
        (Vec::new(), Vec::new())
    };

    for node in 0..internal {
        if split_feature[node] > max_feature_idx {
            return Err(format!(
                "node {node} splits on feature {} beyond max_feature_idx {max_feature_idx}",
                split_feature[node]
            ));
        }
        if decision_type[node] & 1 != 0 {
            let cat_idx = threshold[node];
            if cat_idx < 0.0 || cat_idx as usize >= num_cat {
                return Err(format!("node {node} references unknown category set {cat_idx}"));
            }
        }
        for child in [left_child[node], right_child[node]] {
            check_child(node, child, internal, num_leaves)?;
        }
    }

    Ok(Tree {
        split_feature,
        threshold,
        decision_type,
        left_child,
        right_child,
        leaf_value,
        cat_boundaries,
        cat_threshold,
    })
}

/// Internal children must point forward so evaluation always terminates.
fn check_child(node: usize, child: i32, internal: usize, num_leaves: usize) -> Result<(), String> {
    let valid = if child >= 0 {
        let child = child as usize;
        child > node && child < internal
    } else {
        ((!child) as usize) < num_leaves
    };
    if valid {
        Ok(())
    } else {
        Err(format!("node {node} has invalid child {child}"))
    }
}

fn parse_pandas_categorical(
    raw: &str,
    line: usize,
) -> Result<Option<Vec<Vec<String>>>, ModelError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return Ok(None);
    }
    let lists: Vec<Vec<Value>> = serde_json::from_str(raw).map_err(|e| ModelError::Parse {
        line,
        message: format!("invalid pandas_categorical: {e}"),
    })?;
    Ok(Some(
        lists
            .iter()
            .map(|list| list.iter().map(category_label).collect())
            .collect(),
    ))
}

/// String form of a stored category, comparable with
/// [`FeatureValue::category_string`].
fn category_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FeatureValue::Integer(i).category_string(),
            None => FeatureValue::Float(n.as_f64().unwrap_or(f64::NAN)).category_string(),
        },
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => FeatureValue::Missing.category_string(),
        other => other.to_string(),
    }
}
