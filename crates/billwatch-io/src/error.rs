//! I/O and validation error types for billwatch-io.

use std::path::PathBuf;

/// Errors from the validation predicates gating training and detection.
///
/// Every variant is a recoverable value; the validators never panic.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Returned when the input file does not exist.
    #[error("file '{path}' does not exist")]
    FileNotFound {
        /// Path that was checked.
        path: PathBuf,
    },

    /// Returned when the path exists but is not a regular file.
    #[error("'{path}' is not a file")]
    NotAFile {
        /// Path that was checked.
        path: PathBuf,
    },

    /// Returned when the file extension does not match the expected format.
    #[error("file '{path}' must be {expected} format, got \"{extension}\"")]
    WrongFormat {
        /// Path that was checked.
        path: PathBuf,
        /// Human-readable name of the expected format.
        expected: &'static str,
        /// The extension actually found (may be empty).
        extension: String,
    },

    /// Returned when the transaction table has zero records.
    #[error("transaction table is empty")]
    EmptyData,

    /// Returned when the required column is absent from the header.
    #[error("required column '{column}' not found. Available: {available}")]
    MissingColumn {
        /// The column that was requested.
        column: String,
        /// Comma-separated list of columns present in the header.
        available: String,
    },

    /// Returned when a non-empty cell in the required column fails to parse.
    #[error("column '{column}' must contain numeric values (row {row_index}: \"{value}\")")]
    NonNumericColumn {
        /// The column that was checked.
        column: String,
        /// Zero-based row index of the first offending cell (excluding header).
        row_index: usize,
        /// The raw cell value that failed to parse.
        value: String,
    },

    /// Returned when every cell in the required column is missing.
    #[error("column '{column}' contains only missing values")]
    AllMissingValues {
        /// The column that was checked.
        column: String,
    },

    /// Returned when a parameter value is not a number or out of range.
    ///
    /// Callers may treat this as a soft failure and substitute a default.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Returned when the model file is absent.
    #[error("model file '{path}' not found. Train the model first")]
    ModelNotFound {
        /// Path that was checked.
        path: PathBuf,
    },
}

/// Errors from CSV reading and anomaly output writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file cannot be opened.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the output file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV/I/O error.
        source: csv::Error,
    },
}
