//! The Feature Contract: the fixed, ordered schema shared by the dataset,
//! the editing form and the classifier.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::ContractError;
use crate::row::{EditableRow, FeatureRow};
use crate::value::FeatureValue;

/// Column holding the invoice identifier used for lookups.
pub const IDENTIFIER_COLUMN: &str = "SEQ_NFE";

/// Client-only correlation field on submitted rows.
pub const CLIENT_KEY_FIELD: &str = "key";

/// Declared value domain of a feature at the transport and storage layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Arrives as an integral JSON number.
    Numeric,
    /// Arrives as a JSON string.
    Categorical,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Numeric => "numeric",
            FeatureKind::Categorical => "categorical",
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            FeatureKind::Numeric => "an integer",
            FeatureKind::Categorical => "a string",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a feature is presented to the tree model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Passed through as a number.
    Numeric,
    /// Normalized to a string and mapped onto the model's category codes.
    Categorical,
}

/// One named feature with its declared kind and model encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
    pub encoding: Encoding,
}

impl FeatureSpec {
    const fn numeric(name: &'static str) -> Self {
        Self {
            name,
            kind: FeatureKind::Numeric,
            encoding: Encoding::Categorical,
        }
    }

    const fn categorical(name: &'static str) -> Self {
        Self {
            name,
            kind: FeatureKind::Categorical,
            encoding: Encoding::Categorical,
        }
    }

    /// Parses a raw dataset cell according to the declared kind.
    pub fn parse_cell(&self, raw: &str) -> FeatureValue {
        match self.kind {
            FeatureKind::Numeric => FeatureValue::parse_numeric(raw),
            FeatureKind::Categorical => FeatureValue::parse_text(raw),
        }
    }

    /// Checks a submitted JSON value against the declared kind.
    ///
    /// No coercion across JSON types: numbers must arrive as numbers and
    /// categorical values as strings. Numeric features hold integers, so an
    /// integral float such as `1.0` becomes `Integer(1)` and a fractional one
    /// is rejected.
    pub fn validate_json(&self, value: &Value) -> Result<FeatureValue, ContractError> {
        let wrong_type = |found| ContractError::WrongType {
            field: self.name.to_string(),
            expected: self.kind.expected(),
            found,
        };
        match (self.kind, value) {
            (FeatureKind::Numeric, Value::Number(number)) => {
                if let Some(v) = number.as_i64() {
                    return Ok(FeatureValue::Integer(v));
                }
                match number.as_f64() {
                    Some(v) if is_integral(v) => Ok(FeatureValue::Integer(v as i64)),
                    _ => Err(wrong_type("a fractional or out-of-range number")),
                }
            }
            (FeatureKind::Categorical, Value::String(text)) => Ok(FeatureValue::Text(text.clone())),
            _ => Err(wrong_type(json_type_name(value))),
        }
    }
}

fn is_integral(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64
}

/// Every feature the classifier was trained on, in training order.
///
/// All of them are categorically encoded: the model was trained with every
/// column cast to a category, including the integer-coded ones.
const STANDARD_FEATURES: [FeatureSpec; 27] = [
    FeatureSpec::categorical("COD_UF_EMIT"),
    FeatureSpec::numeric("TIP_FIN_NFE"),
    FeatureSpec::numeric("CEST_COMPLETO"),
    FeatureSpec::numeric("COD_CST"),
    FeatureSpec::numeric("NCM_COMPLETO"),
    FeatureSpec::numeric("CFOP_COMPLETO"),
    FeatureSpec::categorical("EMIT_CNAE_COMPLETO"),
    FeatureSpec::numeric("EMIT_CRT"),
    FeatureSpec::categorical("EMIT_IND_SN"),
    FeatureSpec::categorical("DEST_CNAE_COMPLETO"),
    FeatureSpec::numeric("DEST_SITUACAO"),
    FeatureSpec::numeric("DEST_IND_SN"),
    FeatureSpec::numeric("DEST_POSSUI_IE"),
    FeatureSpec::categorical("EMIT_CNAE_DIVISAO"),
    FeatureSpec::categorical("EMIT_CNAE_GRUPO"),
    FeatureSpec::categorical("EMIT_CNAE_CLASSE"),
    FeatureSpec::categorical("DEST_CNAE_DIVISAO"),
    FeatureSpec::categorical("DEST_CNAE_GRUPO"),
    FeatureSpec::categorical("DEST_CNAE_CLASSE"),
    FeatureSpec::numeric("NCM_CAPITULO"),
    FeatureSpec::numeric("NCM_POSICAO"),
    FeatureSpec::numeric("NCM_SUBPOSICAO"),
    FeatureSpec::numeric("CFOP_NATUREZA"),
    FeatureSpec::numeric("CFOP_OPERACAO"),
    FeatureSpec::numeric("POSSUI_CEST"),
    FeatureSpec::categorical("CEST_SEGMENTO"),
    FeatureSpec::categorical("CEST_ITEM"),
];

/// Ordered feature schema.
///
/// The order is significant: it is the column order the model was trained
/// with, the column order rendered for editing and the column order selected
/// from the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureContract {
    features: &'static [FeatureSpec],
}

impl FeatureContract {
    /// The invoice tax-classification contract.
    pub const fn standard() -> Self {
        Self {
            features: &STANDARD_FEATURES,
        }
    }

    /// A contract over a caller-supplied static schema.
    pub const fn new(features: &'static [FeatureSpec]) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &'static [FeatureSpec] {
        self.features
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + use<> {
        self.features.iter().map(|spec| spec.name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&'static FeatureSpec> {
        self.features.iter().find(|spec| spec.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|spec| spec.name == name)
    }

    /// Positions of the categorically encoded features, in contract order.
    pub fn categorical_positions(&self) -> Vec<usize> {
        self.features
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.encoding == Encoding::Categorical)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Validates a submitted row and keeps only the contract features.
    ///
    /// The client key and the identifier column are never part of the
    /// result; unknown fields are ignored.
    pub fn validate_row(&self, raw: &Map<String, Value>) -> Result<FeatureRow, ContractError> {
        let mut values = Vec::with_capacity(self.features.len());
        for spec in self.features {
            let value = raw.get(spec.name).ok_or_else(|| ContractError::MissingField {
                field: spec.name.to_string(),
            })?;
            values.push(spec.validate_json(value)?);
        }
        Ok(FeatureRow::new(*self, values))
    }

    /// Validates a submitted row including its client correlation key.
    pub fn validate_editable_row(
        &self,
        raw: &Map<String, Value>,
    ) -> Result<EditableRow, ContractError> {
        let key = match raw.get(CLIENT_KEY_FIELD) {
            None => return Err(ContractError::MissingKey),
            Some(Value::String(key)) => key.clone(),
            Some(other) => {
                return Err(ContractError::WrongType {
                    field: CLIENT_KEY_FIELD.to_string(),
                    expected: "a string",
                    found: json_type_name(other),
                });
            }
        };
        let features = self.validate_row(raw)?;
        Ok(EditableRow { key, features })
    }

    /// Validates a whole batch; the first invalid row fails the request.
    pub fn validate_batch(
        &self,
        rows: &[Map<String, Value>],
    ) -> Result<Vec<EditableRow>, ContractError> {
        rows.iter()
            .enumerate()
            .map(|(index, raw)| {
                self.validate_editable_row(raw)
                    .map_err(|source| ContractError::InvalidRow {
                        index,
                        source: Box::new(source),
                    })
            })
            .collect()
    }
}

impl Default for FeatureContract {
    fn default() -> Self {
        Self::standard()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
