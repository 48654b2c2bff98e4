//! In-memory invoice dataset with identifier lookup.

use std::path::{Path, PathBuf};

use nfe_model::{FeatureContract, FeatureRow, FeatureValue, IDENTIFIER_COLUMN};
use polars::prelude::*;

use crate::csv::{DEFAULT_SEPARATOR, read_delimited_table};
use crate::error::{IngestError, Result};

/// Identifier assigned to rows whose `SEQ_NFE` cannot be read as an integer.
pub const MISSING_IDENTIFIER: i64 = -1;

/// One dataset row: its identifier and the contract features.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub identifier: i64,
    pub features: FeatureRow,
}

impl Record {
    pub fn value(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }
}

/// The invoice dataset, loaded once and read-only afterwards.
///
/// Holds the identifier column plus the contract columns present in the
/// source file, in contract order. Contract columns absent from the file
/// are omitted from the frame and surface as missing values on records.
#[derive(Debug, Clone)]
pub struct DataStore {
    contract: FeatureContract,
    frame: DataFrame,
    missing_features: Vec<&'static str>,
    source: Option<PathBuf>,
}

impl DataStore {
    /// An empty store, used when the dataset could not be loaded.
    pub fn empty(contract: FeatureContract) -> Self {
        Self {
            contract,
            frame: DataFrame::empty(),
            missing_features: Vec::new(),
            source: None,
        }
    }

    /// Loads a `;`-delimited dataset restricted to the contract columns.
    pub fn load(path: &Path, contract: FeatureContract) -> Result<Self> {
        Self::load_with_separator(path, contract, DEFAULT_SEPARATOR)
    }

    pub fn load_with_separator(
        path: &Path,
        contract: FeatureContract,
        separator: u8,
    ) -> Result<Self> {
        let (mut frame, headers) = read_delimited_table(path, separator)?;

        if !headers.iter().any(|h| h == IDENTIFIER_COLUMN) {
            return Err(IngestError::MissingColumn {
                column: IDENTIFIER_COLUMN.to_string(),
                path: path.to_path_buf(),
                found: headers.join(", "),
            });
        }

        let identifiers: Int64Chunked = frame
            .column(IDENTIFIER_COLUMN)?
            .str()?
            .into_iter()
            .map(|cell| Some(cell.and_then(parse_identifier).unwrap_or(MISSING_IDENTIFIER)))
            .collect();
        frame.with_column(identifiers.with_name(IDENTIFIER_COLUMN.into()).into_series())?;

        let mut selected = vec![col(IDENTIFIER_COLUMN)];
        let mut missing_features = Vec::new();
        for name in contract.names() {
            if headers.iter().any(|h| h == name) {
                selected.push(col(name));
            } else {
                missing_features.push(name);
            }
        }

        let total = frame.height();
        let frame = frame
            .lazy()
            .select(selected)
            .filter(col(IDENTIFIER_COLUMN).neq(lit(MISSING_IDENTIFIER)))
            .collect()?;

        let dropped = total - frame.height();
        if dropped > 0 {
            tracing::debug!(
                path = %path.display(),
                dropped,
                "Dropped rows without a usable identifier"
            );
        }
        if !missing_features.is_empty() {
            tracing::warn!(
                path = %path.display(),
                missing = ?missing_features,
                "Dataset lacks contract columns; they will be empty in the editing form"
            );
        }
        tracing::info!(path = %path.display(), rows = frame.height(), "Loaded invoice dataset");

        Ok(Self {
            contract,
            frame,
            missing_features,
            source: Some(path.to_path_buf()),
        })
    }

    /// Loads the dataset, degrading to an empty store on any failure.
    ///
    /// The process keeps serving; callers treat an empty store as a
    /// degraded state.
    pub fn load_or_empty(path: &Path, contract: FeatureContract) -> Self {
        match Self::load(path, contract) {
            Ok(store) => store,
            Err(error) => {
                tracing::error!(path = %path.display(), %error, "Failed to load invoice dataset");
                Self::empty(contract)
            }
        }
    }

    pub fn contract(&self) -> FeatureContract {
        self.contract
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Column names held by the store, identifier first.
    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Contract columns the source file did not provide.
    pub fn missing_features(&self) -> &[&'static str] {
        &self.missing_features
    }

    /// All rows carrying `identifier`, in file order.
    ///
    /// Identifiers are not unique; every match is returned.
    pub fn lookup(&self, identifier: i64) -> Result<Vec<Record>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let matches = self
            .frame
            .clone()
            .lazy()
            .filter(col(IDENTIFIER_COLUMN).eq(lit(identifier)))
            .collect()?;
        self.records(&matches)
    }

    fn records(&self, frame: &DataFrame) -> Result<Vec<Record>> {
        let identifiers = frame.column(IDENTIFIER_COLUMN)?.i64()?;
        let mut columns = Vec::with_capacity(self.contract.len());
        for spec in self.contract.features() {
            let cells = match frame.column(spec.name) {
                Ok(column) => Some(column.str()?),
                Err(_) => None,
            };
            columns.push((spec, cells));
        }

        let mut records = Vec::with_capacity(frame.height());
        for idx in 0..frame.height() {
            let values = columns
                .iter()
                .map(|&(spec, cells)| {
                    cells
                        .and_then(|cells| cells.get(idx))
                        .map_or(FeatureValue::Missing, |raw| spec.parse_cell(raw))
                })
                .collect();
            records.push(Record {
                identifier: identifiers.get(idx).unwrap_or(MISSING_IDENTIFIER),
                features: FeatureRow::new(self.contract, values),
            });
        }
        Ok(records)
    }
}

/// Reads an identifier cell: integer, else float truncated toward zero.
pub fn parse_identifier(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= i64::MIN as f64 && *v <= i64::MAX as f64)
        .map(|v| v.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier("1001"), Some(1001));
        assert_eq!(parse_identifier(" 1001 "), Some(1001));
        assert_eq!(parse_identifier("1001.0"), Some(1001));
        assert_eq!(parse_identifier("abc"), None);
        assert_eq!(parse_identifier(""), None);
        assert_eq!(parse_identifier("nan"), None);
    }

    #[test]
    fn test_empty_store() {
        let store = DataStore::empty(FeatureContract::standard());
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.lookup(1001).unwrap().is_empty());
        assert!(store.source().is_none());
    }
}
