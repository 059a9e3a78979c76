//! Validation predicates gating training and detection.
//!
//! Pure checks returning typed errors; they never panic and touch nothing
//! beyond file metadata. Dataset checks run in a fixed order (empty, column
//! presence, numeric, all-missing) so error messages are deterministic.

use std::path::Path;

use crate::domain::{TransactionTable, is_missing};
use crate::error::ValidationError;

/// Default name of the amount column in transaction CSVs.
pub const DEFAULT_AMOUNT_COLUMN: &str = "Amount";

/// Inclusive lower bound of the valid contamination range.
pub const CONTAMINATION_MIN: f64 = 0.01;

/// Inclusive upper bound of the valid contamination range.
pub const CONTAMINATION_MAX: f64 = 0.5;

/// Recognized extensions for serialized model files.
const MODEL_EXTENSIONS: [&str; 2] = ["bin", "model"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Check that `path` is an existing regular file with a `.csv` extension.
pub fn validate_source_file(path: &Path) -> Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(ValidationError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    if extension_of(path) != "csv" {
        return Err(ValidationError::WrongFormat {
            path: path.to_path_buf(),
            expected: "CSV",
            extension: extension_of(path),
        });
    }
    Ok(())
}

/// Check that `table` is non-empty and that `required_column` exists, parses
/// as numbers, and holds at least one non-missing value.
pub fn validate_table(
    table: &TransactionTable,
    required_column: &str,
) -> Result<(), ValidationError> {
    if table.is_empty() {
        return Err(ValidationError::EmptyData);
    }

    let Some(column) = table.column_index(required_column) else {
        return Err(ValidationError::MissingColumn {
            column: required_column.to_string(),
            available: table.headers().join(", "),
        });
    };

    let mut missing = 0usize;
    for (row_index, record) in table.records().iter().enumerate() {
        let raw = record.get(column).unwrap_or("");
        if is_missing(raw) {
            missing += 1;
        } else if raw.trim().parse::<f64>().is_err() {
            return Err(ValidationError::NonNumericColumn {
                column: required_column.to_string(),
                row_index,
                value: raw.to_string(),
            });
        }
    }

    if missing == table.n_records() {
        return Err(ValidationError::AllMissingValues {
            column: required_column.to_string(),
        });
    }

    Ok(())
}

/// Check that `value` is a number inside `[0.01, 0.5]`.
///
/// Callers treat a failure here as soft: the trainer logs the message and
/// substitutes the default contamination instead of aborting.
pub fn validate_contamination(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidParameter {
            name: "contamination",
            reason: format!("must be a number, got {value}"),
        });
    }
    if !(CONTAMINATION_MIN..=CONTAMINATION_MAX).contains(&value) {
        return Err(ValidationError::InvalidParameter {
            name: "contamination",
            reason: format!(
                "must be between {CONTAMINATION_MIN} and {CONTAMINATION_MAX}, got {value}"
            ),
        });
    }
    Ok(())
}

/// Check that `path` is an existing regular file with a recognized
/// serialized-model extension.
pub fn validate_model_file(path: &Path) -> Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::ModelNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(ValidationError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    let extension = extension_of(path);
    if !MODEL_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::WrongFormat {
            path: path.to_path_buf(),
            expected: "a serialized model (.bin/.model)",
            extension,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;
    use crate::domain::{TransactionRecord, TransactionTable};

    fn table(headers: &[&str], rows: &[&[&str]]) -> TransactionTable {
        TransactionTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| TransactionRecord::new(r.iter().map(|c| c.to_string()).collect()))
                .collect(),
        )
    }

    // --- validate_source_file ---

    #[test]
    fn source_file_missing() {
        let err = validate_source_file(Path::new("/nonexistent/transactions.csv")).unwrap_err();
        assert!(matches!(err, ValidationError::FileNotFound { .. }));
    }

    #[test]
    fn source_file_is_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::create_dir(&path).unwrap();
        let err = validate_source_file(&path).unwrap_err();
        assert!(matches!(err, ValidationError::NotAFile { .. }));
    }

    #[test]
    fn source_file_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, "x").unwrap();
        let err = validate_source_file(&path).unwrap_err();
        assert!(matches!(err, ValidationError::WrongFormat { .. }));
    }

    #[test]
    fn source_file_valid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "Amount\n1.0\n").unwrap();
        assert!(validate_source_file(&path).is_ok());
    }

    #[test]
    fn source_file_extension_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.CSV");
        std::fs::write(&path, "Amount\n1.0\n").unwrap();
        assert!(validate_source_file(&path).is_ok());
    }

    // --- validate_table ---

    #[test]
    fn empty_table_message_mentions_empty() {
        let t = table(&["Amount"], &[]);
        let err = validate_table(&t, "Amount").unwrap_err();
        assert!(matches!(err, ValidationError::EmptyData));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn missing_column_lists_available() {
        let t = table(&["Date", "Price"], &[&["2024-01-01", "100"]]);
        let err = validate_table(&t, "Amount").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'Amount'"));
        assert!(msg.contains("Date"));
        assert!(msg.contains("Price"));
    }

    #[test]
    fn non_numeric_column_message_mentions_numeric() {
        let t = table(&["Amount"], &[&["100"], &["lots"]]);
        let err = validate_table(&t, "Amount").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NonNumericColumn { row_index: 1, .. }
        ));
        assert!(err.to_string().contains("numeric"));
    }

    #[test]
    fn all_missing_values_message() {
        let t = table(&["Amount"], &[&[""], &["NaN"], &["  "]]);
        let err = validate_table(&t, "Amount").unwrap_err();
        assert!(matches!(err, ValidationError::AllMissingValues { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn partially_missing_column_is_valid() {
        let t = table(&["Amount"], &[&["100"], &[""], &["200"]]);
        assert!(validate_table(&t, "Amount").is_ok());
    }

    #[test]
    fn lowercase_column_name_resolves() {
        let t = table(&["Amount"], &[&["100"]]);
        assert!(validate_table(&t, "amount").is_ok());
    }

    #[test]
    fn check_order_empty_before_missing_column() {
        // Both defects present; the empty check fires first.
        let t = table(&["Price"], &[]);
        let err = validate_table(&t, "Amount").unwrap_err();
        assert!(matches!(err, ValidationError::EmptyData));
    }

    // --- validate_contamination ---

    #[test]
    fn contamination_in_range() {
        assert!(validate_contamination(0.05).is_ok());
        assert!(validate_contamination(0.01).is_ok());
        assert!(validate_contamination(0.5).is_ok());
    }

    #[test]
    fn contamination_out_of_range() {
        assert!(validate_contamination(0.001).is_err());
        assert!(validate_contamination(0.6).is_err());
        assert!(validate_contamination(-0.1).is_err());
    }

    #[test]
    fn contamination_not_a_number() {
        let err = validate_contamination(f64::NAN).unwrap_err();
        assert!(err.to_string().contains("must be a number"));
        assert!(validate_contamination(f64::INFINITY).is_err());
    }

    // --- validate_model_file ---

    #[test]
    fn model_file_missing() {
        let err = validate_model_file(Path::new("/nonexistent/model.bin")).unwrap_err();
        assert!(matches!(err, ValidationError::ModelNotFound { .. }));
        assert!(err.to_string().contains("Train the model first"));
    }

    #[test]
    fn model_file_wrong_extension() {
        let mut f = NamedTempFile::with_suffix(".pkl").unwrap();
        f.write_all(b"x").unwrap();
        let err = validate_model_file(f.path()).unwrap_err();
        assert!(matches!(err, ValidationError::WrongFormat { .. }));
    }

    #[test]
    fn model_file_valid() {
        let mut f = NamedTempFile::with_suffix(".bin").unwrap();
        f.write_all(b"x").unwrap();
        assert!(validate_model_file(f.path()).is_ok());
    }
}
