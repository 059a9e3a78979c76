//! CSV writer for labeled anomaly output.

use std::path::{Path, PathBuf};

use billwatch_forest::AnomalyLabel;
use tracing::{info, instrument};

use crate::domain::TransactionRecord;
use crate::error::IoError;

/// Name of the label column appended to output tables.
pub(crate) const LABEL_COLUMN: &str = "Anomaly";

/// Writes labeled transactions to a CSV file.
///
/// Output keeps the original columns byte-for-byte and appends an `Anomaly`
/// column holding `Normal` or `Bill Shock`. Parent directories are created
/// as needed.
pub struct AnomalyWriter {
    path: PathBuf,
}

impl AnomalyWriter {
    /// Create a new writer targeting the given output path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Write `rows` with their labels under the given `headers`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the parent directory cannot
    /// be created, [`IoError::WriteFile`] if the CSV cannot be written.
    #[instrument(skip_all, fields(path = %self.path.display(), n_rows = rows.len()))]
    pub fn write(
        &self,
        headers: &[String],
        rows: &[(&TransactionRecord, AnomalyLabel)],
    ) -> Result<(), IoError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| IoError::OutputDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut wtr = csv::WriterBuilder::new()
            .from_path(&self.path)
            .map_err(|e| IoError::WriteFile {
                path: self.path.clone(),
                source: e,
            })?;

        let write_err = |e: csv::Error| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        };

        let mut header_row: Vec<&str> = headers.iter().map(String::as_str).collect();
        header_row.push(LABEL_COLUMN);
        wtr.write_record(&header_row).map_err(write_err)?;

        for (record, label) in rows {
            let mut row: Vec<&str> = record.fields().iter().map(String::as_str).collect();
            row.push(label.as_str());
            wtr.write_record(&row).map_err(write_err)?;
        }

        wtr.flush().map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: csv::Error::from(e),
        })?;

        info!(n_rows = rows.len(), "anomaly table written");
        Ok(())
    }
}
