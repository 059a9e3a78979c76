//! CSV transaction reader.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::domain::{TransactionRecord, TransactionTable};
use crate::error::IoError;

/// Reads transaction data from a CSV file into a [`TransactionTable`].
///
/// Expected CSV format:
/// - Header row required; one column must carry the transaction amounts
///   (conventionally `Amount`), any other columns pass through untouched
/// - One row per transaction, all rows with the same number of columns
///
/// Cells are kept as raw strings — column interpretation and shape checks
/// beyond row length are the validators' job, so an empty table or a
/// missing amount column surfaces as a validation error, not a read error.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
pub struct TransactionReader {
    path: PathBuf,
}

impl TransactionReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read the CSV file, returning a [`TransactionTable`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<TransactionTable, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) allows rows with varying column counts so that our
        // own InconsistentRowLength check fires instead of a low-level
        // CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let headers: Vec<String> = header.iter().map(String::from).collect();
        let expected_cols = headers.len();
        debug!(expected_cols, "read CSV header");

        let mut records = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            records.push(TransactionRecord::new(
                record.iter().map(String::from).collect(),
            ));
        }

        info!(
            n_records = records.len(),
            n_columns = expected_cols,
            "transaction table loaded"
        );

        Ok(TransactionTable::new(headers, records))
    }
}
