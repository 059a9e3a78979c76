use std::path::PathBuf;

/// Errors from isolation-forest training, scoring, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when subsample_size is zero.
    #[error("subsample_size must be at least 1, got {subsample_size}")]
    InvalidSubsampleSize {
        /// The invalid subsample_size value provided.
        subsample_size: usize,
    },

    /// Returned when contamination is not in [0.01, 0.5].
    #[error("contamination must be between 0.01 and 0.5, got {contamination}")]
    InvalidContamination {
        /// The invalid contamination value provided.
        contamination: f64,
    },

    /// Returned when the training set has zero amounts.
    #[error("training set has zero amounts")]
    EmptyTrainingSet,

    /// Returned when a training amount is NaN or infinite.
    #[error("non-finite amount at index {index}")]
    NonFiniteAmount {
        /// The zero-based index of the offending amount.
        index: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the model file is not a structurally valid serialized model.
    #[error("corrupt model file {path}")]
    CorruptModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
