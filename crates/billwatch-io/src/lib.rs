//! File I/O, validation, and tabular domain types for the billwatch pipeline.

mod domain;
mod error;
mod reader;
mod validate;
mod writer;

pub use domain::{TransactionRecord, TransactionTable};
pub use error::{IoError, ValidationError};
pub use reader::TransactionReader;
pub use validate::{
    CONTAMINATION_MAX, CONTAMINATION_MIN, DEFAULT_AMOUNT_COLUMN, validate_contamination,
    validate_model_file, validate_source_file, validate_table,
};
pub use writer::AnomalyWriter;
