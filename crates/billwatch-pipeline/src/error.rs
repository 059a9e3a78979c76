use billwatch_forest::ForestError;
use billwatch_io::{IoError, ValidationError};

/// Errors from pipeline orchestration.
///
/// Wraps the validation, I/O, and model error taxonomies; the pipeline
/// never aborts the process on bad input.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A validation predicate rejected the input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Reading or writing tabular data failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Model training, scoring, or persistence failed.
    #[error(transparent)]
    Forest(#[from] ForestError),

    /// Returned when no records with a usable amount remain after cleaning.
    #[error("no valid data after removing missing amounts")]
    NoValidData,
}

impl PipelineError {
    /// Return `true` when the failure means the model file is absent.
    #[must_use]
    pub fn is_model_not_found(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(ValidationError::ModelNotFound { .. })
                | PipelineError::Forest(ForestError::ReadModel { .. })
        )
    }
}
