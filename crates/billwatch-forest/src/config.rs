//! Configuration builder for isolation-forest training.

use crate::error::ForestError;
use crate::forest::{self, IsolationForest};

/// Configuration for isolation-forest training.
///
/// Construct via [`IsolationForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter        | Default |
/// |------------------|---------|
/// | `n_trees`        | 100     |
/// | `subsample_size` | 256 (clamped to the training-set size) |
/// | `contamination`  | 0.05    |
/// | `seed`           | 42      |
#[derive(Debug, Clone)]
pub struct IsolationForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) subsample_size: usize,
    pub(crate) contamination: f64,
    pub(crate) seed: u64,
}

impl IsolationForestConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_trees: 100,
            subsample_size: 256,
            contamination: 0.05,
            seed: 42,
        }
    }

    /// Set the number of trees in the ensemble.
    #[must_use]
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Set the per-tree subsample size. Clamped to the training-set size at fit time.
    #[must_use]
    pub fn with_subsample_size(mut self, subsample_size: usize) -> Self {
        self.subsample_size = subsample_size;
        self
    }

    /// Set the target fraction of training amounts to flag as anomalous.
    #[must_use]
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train an isolation forest on the provided amounts.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`ForestError::InvalidTreeCount`]     | `n_trees` is zero |
    /// | [`ForestError::InvalidSubsampleSize`] | `subsample_size` is zero |
    /// | [`ForestError::InvalidContamination`] | `contamination` outside `[0.01, 0.5]` |
    /// | [`ForestError::EmptyTrainingSet`]     | `amounts` is empty |
    /// | [`ForestError::NonFiniteAmount`]      | any amount is NaN or infinite |
    pub fn fit(&self, amounts: &[f64]) -> Result<IsolationForest, ForestError> {
        forest::train(self, amounts)
    }
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self::new()
    }
}
