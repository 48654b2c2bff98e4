//! Delimited file reading into an all-text Polars DataFrame.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

use super::header::normalize_header;

/// Field separator of the invoice export.
pub const DEFAULT_SEPARATOR: u8 = b';';

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Fails with [`IngestError::EmptyFile`] when the first line is blank.
///
/// The first line must be the header; there is no detection of misplaced or
/// misnamed header rows.
fn ensure_header_line(path: &Path) -> Result<()> {
    let mut reader = BufReader::new(open(path)?);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    if line.trim_matches(['\u{feff}', '\r', '\n']).trim().is_empty() {
        return Err(IngestError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Reads a delimited file with a mandatory header into a DataFrame.
///
/// Every column is read as text so that typing stays under the caller's
/// control. Column names are the normalized header values; two headers that
/// normalize to the same name fail the read.
pub fn read_delimited_table(path: &Path, separator: u8) -> Result<(DataFrame, Vec<String>)> {
    ensure_header_line(path)?;
    let csv_error = |message: String| IngestError::CsvParse {
        path: path.to_path_buf(),
        message,
    };

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| csv_error(e.to_string()))?
        .finish()
        .map_err(|e| csv_error(e.to_string()))?;

    let headers: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| normalize_header(name.as_str()))
        .collect();
    if let Some(duplicate) = headers
        .iter()
        .enumerate()
        .find_map(|(idx, name)| headers[..idx].contains(name).then_some(name))
    {
        return Err(csv_error(format!("duplicate column '{duplicate}' in header")));
    }
    df.set_column_names(headers.iter().map(String::as_str))
        .map_err(|e| csv_error(e.to_string()))?;

    Ok((df, headers))
}
