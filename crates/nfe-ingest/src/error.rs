//! Error types for invoice data ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or querying the invoice dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Dataset file not found.
    #[error("data file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// File has no header line.
    #[error("data file is empty: {path}")]
    EmptyFile { path: PathBuf },

    /// Required column not present in the header.
    #[error("required column '{column}' not found in header of {path} (found: {found})")]
    MissingColumn {
        column: String,
        path: PathBuf,
        found: String,
    },

    /// Failed to parse the delimited file with Polars.
    #[error("failed to parse {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
