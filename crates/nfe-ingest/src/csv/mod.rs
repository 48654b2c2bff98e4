//! Delimited file reading utilities.

mod header;
mod reader;

pub use header::normalize_header;
pub use reader::{DEFAULT_SEPARATOR, read_delimited_table};
