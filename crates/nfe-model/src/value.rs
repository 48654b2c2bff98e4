//! Typed feature cell values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single feature value, as stored in the dataset or submitted by a client.
///
/// Serialized untagged so that JSON numbers, strings and `null` map directly
/// onto the variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    /// Parses a raw dataset cell into a numeric value.
    ///
    /// Tries an integer first, then a float. Cells that are neither keep their
    /// text so the record still renders what the file contained.
    pub fn parse_numeric(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::Integer(value);
        }
        match trimmed.parse::<f64>() {
            Ok(value) => Self::Float(value),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    /// Wraps a raw dataset cell as categorical text.
    pub fn parse_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Missing
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    /// Returns true for the missing variant.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric view of the value; text and missing values have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) | Self::Missing => None,
        }
    }

    /// Normalized textual form used for categorical encoding.
    ///
    /// Integers print plainly (`0` becomes `"0"`), integral floats keep one
    /// decimal (`1.0` becomes `"1.0"`) and missing values become `"nan"`, so
    /// mixed-type columns collapse onto one consistent string domain.
    ///
    /// ```
    /// use nfe_model::FeatureValue;
    ///
    /// assert_eq!(FeatureValue::Integer(0).category_string(), "0");
    /// assert_eq!(FeatureValue::Float(2.0).category_string(), "2.0");
    /// assert_eq!(FeatureValue::Missing.category_string(), "nan");
    /// ```
    pub fn category_string(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => format_float(*v),
            Self::Text(s) => s.clone(),
            Self::Missing => "nan".to_string(),
        }
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

impl fmt::Display for FeatureValue {
    /// Display form used when rendering values into the editing form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => Ok(()),
        }
    }
}
