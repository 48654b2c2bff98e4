//! Tax-category inference for invoice feature rows.
//!
//! Evaluates a gradient-boosted tree ensemble saved in the LightGBM text
//! format against rows shaped by the Feature Contract.
//!
//! # Pipeline
//!
//! 1. **Load**: read the artifact, fingerprint it and parse it (cached per fingerprint)
//! 2. **Encode**: map every categorical feature onto the model's category codes
//! 3. **Score**: sum tree outputs per class and apply the objective transform
//! 4. **Decide**: turn probabilities into class indices under a [`DecisionRule`]
//! 5. **Label**: map indices onto the tax-category table
//!
//! # Example
//!
//! ```ignore
//! use nfe_infer::{DecisionRule, InferenceAdapter};
//! use nfe_model::{FeatureContract, LabelTable};
//!
//! let adapter = InferenceAdapter::new(
//!     "modelo_lgbm.txt",
//!     FeatureContract::standard(),
//!     LabelTable::tax_categories(),
//!     DecisionRule::default(),
//! );
//! let labels = adapter.predict(&rows);
//! assert_eq!(labels.len(), rows.len());
//! ```

mod adapter;
mod decision;
mod encode;
mod error;
pub mod lightgbm;

// === Adapter ===
pub use adapter::InferenceAdapter;

// === Decision ===
pub use decision::{BINARY_THRESHOLD, DecisionRule, Probabilities, argmax, classify};

// === Encoding ===
pub use encode::encode_rows;

// === Error Types ===
pub use error::{InferenceError, ModelError};

// === Model ===
pub use lightgbm::{Booster, Objective};
