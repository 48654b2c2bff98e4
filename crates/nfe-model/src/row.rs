//! Validated feature rows.

use crate::contract::FeatureContract;
use crate::value::FeatureValue;

/// Feature values aligned to a [`FeatureContract`], without identifier or key.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    contract: FeatureContract,
    values: Vec<FeatureValue>,
}

impl FeatureRow {
    /// Builds a row; `values` must follow the contract order.
    ///
    /// Short input is padded with missing values so the row always has one
    /// value per contract feature.
    pub fn new(contract: FeatureContract, mut values: Vec<FeatureValue>) -> Self {
        values.resize(contract.len(), FeatureValue::Missing);
        Self { contract, values }
    }

    pub fn contract(&self) -> FeatureContract {
        self.contract
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.contract
            .position(name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Replaces one feature value by name; returns false for unknown names.
    pub fn set(&mut self, name: &str, value: FeatureValue) -> bool {
        match self.contract.position(name) {
            Some(idx) => {
                self.values[idx] = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> {
        self.contract.names().zip(self.values.iter())
    }
}

/// A client-submitted row: features plus an opaque correlation key.
///
/// The key only ties an asynchronous result back to a UI element; it never
/// reaches the model.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableRow {
    pub key: String,
    pub features: FeatureRow,
}
