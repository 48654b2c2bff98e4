//! Mapping positional predictions back onto client keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CorrelationError;
use crate::row::EditableRow;

/// Client key to label, produced per request and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionResult {
    labels: BTreeMap<String, String>,
}

impl PredictionResult {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Zips submitted rows with the adapter's labels by position.
///
/// Positional correspondence is a hard contract with the adapter: a length
/// mismatch is an error instead of a silent mis-attribution. Repeated keys
/// keep the label of their last occurrence.
pub fn correlate(
    rows: &[EditableRow],
    labels: Vec<String>,
) -> Result<PredictionResult, CorrelationError> {
    if rows.len() != labels.len() {
        return Err(CorrelationError::LengthMismatch {
            rows: rows.len(),
            labels: labels.len(),
        });
    }
    let labels = rows
        .iter()
        .map(|row| row.key.clone())
        .zip(labels)
        .collect();
    Ok(PredictionResult { labels })
}
