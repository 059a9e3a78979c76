//! Model training orchestration: validate, fit, persist.

use std::path::{Path, PathBuf};

use billwatch_forest::{IsolationForest, IsolationForestConfig};
use billwatch_io::{
    TransactionReader, TransactionTable, validate_contamination, validate_source_file,
    validate_table,
};
use tracing::{info, instrument, warn};

use crate::error::PipelineError;

/// Contamination substituted when the requested value fails validation.
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Trains and persists bill-shock models.
///
/// Construct via [`Trainer::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter        | Default |
/// |------------------|---------|
/// | `n_trees`        | 100     |
/// | `subsample_size` | 256     |
/// | `seed`           | 42      |
#[derive(Debug, Clone)]
pub struct Trainer {
    n_trees: usize,
    subsample_size: usize,
    seed: u64,
}

/// Summary of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Number of records in the source table.
    pub n_records: usize,
    /// Number of amounts actually trained on, after dropping missing values.
    pub n_trained: usize,
    /// Effective contamination used (after the soft fallback, if any).
    pub contamination: f64,
    /// Score threshold fixed at fit time.
    pub threshold: f64,
    /// Path the model was persisted to.
    pub model_path: PathBuf,
}

impl Trainer {
    /// Create a trainer with default hyperparameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_trees: 100,
            subsample_size: 256,
            seed: 42,
        }
    }

    /// Set the number of trees in the ensemble.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Set the per-tree subsample size.
    #[must_use]
    pub fn with_subsample_size(mut self, subsample_size: usize) -> Self {
        self.subsample_size = subsample_size;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Resolve the requested contamination with the documented soft fallback.
    ///
    /// An out-of-range or non-numeric value logs a warning and yields
    /// [`DEFAULT_CONTAMINATION`]; this is the only validation failure that
    /// does not stop the operation.
    fn effective_contamination(requested: f64) -> f64 {
        match validate_contamination(requested) {
            Ok(()) => requested,
            Err(err) => {
                warn!(%err, "using default contamination {DEFAULT_CONTAMINATION}");
                DEFAULT_CONTAMINATION
            }
        }
    }

    /// Fit a model on an in-memory table without persisting it.
    ///
    /// # Errors
    ///
    /// Returns the first failing table validation, [`PipelineError::NoValidData`]
    /// if no record has a usable amount, or a fit error.
    #[instrument(skip(self, table), fields(n_records = table.n_records()))]
    pub fn train_table(
        &self,
        table: &TransactionTable,
        contamination: f64,
        amount_column: &str,
    ) -> Result<IsolationForest, PipelineError> {
        let contamination = Self::effective_contamination(contamination);

        validate_table(table, amount_column)?;
        let column = table
            .column_index(amount_column)
            .expect("column presence checked by validate_table");

        let amounts: Vec<f64> = table.amounts(column).into_iter().flatten().collect();
        if amounts.is_empty() {
            return Err(PipelineError::NoValidData);
        }

        info!(
            n_trained = amounts.len(),
            contamination, "training on cleaned amounts"
        );

        let model = IsolationForestConfig::new()
            .with_n_trees(self.n_trees)
            .with_subsample_size(self.subsample_size)
            .with_contamination(contamination)
            .with_seed(self.seed)
            .fit(&amounts)?;

        Ok(model)
    }

    /// Train from a CSV file and persist the model.
    ///
    /// Success is reported only after the model file is fully written.
    ///
    /// # Errors
    ///
    /// Returns the first failing validation, a read error, a fit error, or
    /// a persistence error; no partial model file is left behind.
    #[instrument(skip(self), fields(data = %data_path.display(), model = %model_path.display()))]
    pub fn train_file(
        &self,
        data_path: &Path,
        model_path: &Path,
        contamination: f64,
        amount_column: &str,
    ) -> Result<TrainingSummary, PipelineError> {
        validate_source_file(data_path)?;

        info!("loading transaction data");
        let table = TransactionReader::new(data_path).read()?;

        let model = self.train_table(&table, contamination, amount_column)?;
        model.save(model_path)?;

        info!(path = %model_path.display(), "model trained and saved");

        let column = table
            .column_index(amount_column)
            .expect("column presence checked by validate_table");
        let n_trained = table.amounts(column).iter().filter(|a| a.is_some()).count();

        Ok(TrainingSummary {
            n_records: table.n_records(),
            n_trained,
            contamination: model.contamination(),
            threshold: model.threshold(),
            model_path: model_path.to_path_buf(),
        })
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new()
    }
}
