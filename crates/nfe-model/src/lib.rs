//! Shared types for invoice tax classification.
//!
//! This crate owns the contract that ties the dataset, the editing form and
//! the trained classifier together:
//!
//! - **Feature Contract**: the fixed, ordered list of invoice features and
//!   their declared value domains
//! - **Feature values and rows**: typed cell values, validated feature rows
//!   and client-submitted editable rows
//! - **Labels**: the class-index to tax-category table and error sentinels
//! - **Correlation**: mapping positional predictions back to client keys
//!
//! # Example
//!
//! ```
//! use nfe_model::{FeatureContract, LabelTable};
//!
//! let contract = FeatureContract::standard();
//! assert_eq!(contract.len(), 27);
//! assert_eq!(contract.names().next(), Some("COD_UF_EMIT"));
//!
//! let labels = LabelTable::tax_categories();
//! assert_eq!(labels.label_for(3), "3 -> ICMS ST");
//! assert_eq!(labels.label_for(9), "Classe_9");
//! ```

mod contract;
mod error;
mod labels;
mod prediction;
mod row;
mod value;

// === Feature Contract ===
pub use contract::{
    CLIENT_KEY_FIELD, Encoding, FeatureContract, FeatureKind, FeatureSpec, IDENTIFIER_COLUMN,
};

// === Error Types ===
pub use error::{ContractError, CorrelationError};

// === Labels ===
pub use labels::{LabelTable, MODEL_ERROR_LABEL, PREDICTION_ERROR_LABEL};

// === Correlation ===
pub use prediction::{PredictionResult, correlate};

// === Rows and Values ===
pub use row::{EditableRow, FeatureRow};
pub use value::FeatureValue;
