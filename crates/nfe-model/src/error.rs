//! Error types for contract validation and result correlation.

use thiserror::Error;

/// Errors raised while validating submitted rows against the Feature Contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// A declared feature is absent from the submitted row.
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    /// A field arrived with a JSON type that does not match its declared kind.
    #[error("field '{field}' must be {expected}, got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The client correlation key is absent.
    #[error("missing client key field 'key'")]
    MissingKey,

    /// A row inside a batch failed validation.
    #[error("row {index}: {source}")]
    InvalidRow {
        index: usize,
        #[source]
        source: Box<ContractError>,
    },
}

/// Errors raised while zipping predictions back onto submitted rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// The adapter returned a different number of labels than rows submitted.
    #[error("prediction count {labels} does not match row count {rows}")]
    LengthMismatch { rows: usize, labels: usize },
}
