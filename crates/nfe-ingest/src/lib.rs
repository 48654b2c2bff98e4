//! Invoice dataset ingestion.
//!
//! This crate loads the invoice export (a `;`-delimited file) into a Polars
//! DataFrame once at startup and serves identifier lookups from it.
//!
//! # Features
//!
//! - **Delimited Loading**: Read the export with a mandatory header row
//! - **Identifier Coercion**: `SEQ_NFE` becomes a strict integer; unusable rows are dropped
//! - **Column Restriction**: Keep only the identifier and the Feature Contract columns
//! - **Lookup**: Return every row sharing an identifier
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use nfe_ingest::DataStore;
//! use nfe_model::FeatureContract;
//!
//! let store = DataStore::load_or_empty(Path::new("base_para_teste.csv"), FeatureContract::standard());
//! for record in store.lookup(1001)? {
//!     println!("{} -> {:?}", record.identifier, record.value("COD_UF_EMIT"));
//! }
//! ```

mod csv;
mod error;
mod store;

// === Error Types ===
pub use error::{IngestError, Result};

// === Delimited Reading ===
pub use csv::{DEFAULT_SEPARATOR, normalize_header, read_delimited_table};

// === Data Store ===
pub use store::{DataStore, MISSING_IDENTIFIER, Record, parse_identifier};
