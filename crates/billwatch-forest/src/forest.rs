//! Isolation-forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::IsolationForestConfig;
use crate::error::ForestError;
use crate::label::AnomalyLabel;
use crate::tree::{IsolationTree, average_path_length};

/// A fitted isolation-forest model.
///
/// Owns a fixed-size ensemble of partitioning trees built once at fit time,
/// plus the contamination used and the score threshold derived from it.
/// Immutable once trained; retraining produces a new model.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IsolationForest {
    pub(crate) trees: Vec<IsolationTree>,
    pub(crate) subsample_size: usize,
    pub(crate) contamination: f64,
    pub(crate) threshold: f64,
    pub(crate) seed: u64,
}

/// Draw `k` distinct indices from `0..n` via a partial Fisher–Yates shuffle.
fn sample_without_replacement(n: usize, k: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

/// Train the isolation-forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = amounts.len()))]
pub(crate) fn train(
    config: &IsolationForestConfig,
    amounts: &[f64],
) -> Result<IsolationForest, ForestError> {
    // --- Validate config ---
    if config.n_trees == 0 {
        return Err(ForestError::InvalidTreeCount { n_trees: 0 });
    }
    if config.subsample_size == 0 {
        return Err(ForestError::InvalidSubsampleSize { subsample_size: 0 });
    }
    if !(0.01..=0.5).contains(&config.contamination) {
        return Err(ForestError::InvalidContamination {
            contamination: config.contamination,
        });
    }

    // --- Validate inputs ---
    if amounts.is_empty() {
        return Err(ForestError::EmptyTrainingSet);
    }
    for (index, &value) in amounts.iter().enumerate() {
        if !value.is_finite() {
            return Err(ForestError::NonFiniteAmount { index });
        }
    }

    let n_samples = amounts.len();
    let subsample_size = config.subsample_size.min(n_samples);
    let max_depth = (subsample_size as f64).log2().ceil() as usize;

    info!(
        n_trees = config.n_trees,
        n_samples,
        subsample_size,
        max_depth,
        contamination = config.contamination,
        "training isolation forest"
    );

    // Generate per-tree seeds from a master RNG so parallel builds stay
    // deterministic regardless of thread scheduling.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    // Parallel tree training.
    let trees: Vec<IsolationTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let indices = sample_without_replacement(n_samples, subsample_size, &mut rng);
            let subsample: Vec<f64> = indices.iter().map(|&i| amounts[i]).collect();
            IsolationTree::build(&subsample, max_depth, &mut rng)
        })
        .collect();

    debug!(n_trees_built = trees.len(), "tree training complete");

    let mut forest = IsolationForest {
        trees,
        subsample_size,
        contamination: config.contamination,
        threshold: 0.0,
        seed: config.seed,
    };

    // Threshold selection: the training score at the rank implied by the
    // contamination, so that exactly the requested top fraction of the
    // training data scores at or above it.
    let mut training_scores = forest.score_batch(amounts);
    training_scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((config.contamination * n_samples as f64).floor() as usize).min(n_samples - 1);
    forest.threshold = training_scores[rank];

    info!(threshold = forest.threshold, "isolation forest trained");

    Ok(forest)
}

impl IsolationForest {
    /// Anomaly score of a single amount, in (0, 1].
    ///
    /// Average corrected path length across the ensemble, normalized as
    /// `2^(-avg / c(subsample_size))`. Higher (toward 1) means more
    /// anomalous; around 0.5 means typical.
    #[must_use]
    pub fn score(&self, amount: f64) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(amount)).sum();
        let avg = total / self.trees.len() as f64;
        // A single-point subsample degenerates to c = 0; every traversal
        // then terminates at depth 0 as well.
        let normalizer = average_path_length(self.subsample_size);
        if normalizer > 0.0 {
            2.0_f64.powf(-avg / normalizer)
        } else {
            1.0
        }
    }

    /// Score a batch of amounts in parallel, preserving input order.
    #[must_use]
    pub fn score_batch(&self, amounts: &[f64]) -> Vec<f64> {
        amounts.par_iter().map(|&a| self.score(a)).collect()
    }

    /// Classify a single amount against the trained threshold.
    #[must_use]
    pub fn classify(&self, amount: f64) -> AnomalyLabel {
        self.classify_score(self.score(amount))
    }

    /// Classify an already-computed anomaly score.
    #[must_use]
    pub fn classify_score(&self, score: f64) -> AnomalyLabel {
        if score >= self.threshold {
            AnomalyLabel::BillShock
        } else {
            AnomalyLabel::Normal
        }
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the per-tree subsample size used at fit time.
    #[must_use]
    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    /// Return the contamination the model was trained with.
    #[must_use]
    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    /// Return the score threshold fixed at fit time.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Return the seed the model was trained with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use crate::config::IsolationForestConfig;
    use crate::error::ForestError;
    use crate::label::AnomalyLabel;

    /// A tight cluster of everyday amounts plus one obvious shock.
    fn spiked_amounts() -> Vec<f64> {
        vec![100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 9000.0]
    }

    #[test]
    fn outlier_scores_highest() {
        let amounts = spiked_amounts();
        let model = IsolationForestConfig::new()
            .with_contamination(0.1)
            .with_seed(42)
            .fit(&amounts)
            .unwrap();
        let scores = model.score_batch(&amounts);
        let outlier = scores[7];
        for (i, &s) in scores.iter().take(7).enumerate() {
            assert!(outlier > s, "score of 9000 ({outlier}) should exceed score[{i}] ({s})");
        }
    }

    #[test]
    fn scores_in_unit_interval() {
        let amounts = spiked_amounts();
        let model = IsolationForestConfig::new().with_seed(42).fit(&amounts).unwrap();
        for s in model.score_batch(&amounts) {
            assert!(s > 0.0 && s <= 1.0, "score {s} outside (0, 1]");
        }
    }

    #[test]
    fn exactly_the_spike_is_flagged() {
        let amounts = spiked_amounts();
        let model = IsolationForestConfig::new()
            .with_contamination(0.1)
            .with_seed(42)
            .fit(&amounts)
            .unwrap();
        let labels: Vec<AnomalyLabel> = amounts.iter().map(|&a| model.classify(a)).collect();
        let n_shocks = labels.iter().filter(|l| l.is_shock()).count();
        assert_eq!(n_shocks, 1);
        assert_eq!(labels[7], AnomalyLabel::BillShock);
    }

    #[test]
    fn flagged_fraction_tracks_contamination() {
        let amounts: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        let model = IsolationForestConfig::new()
            .with_contamination(0.1)
            .with_seed(42)
            .fit(&amounts)
            .unwrap();
        let flagged = amounts.iter().filter(|&&a| model.classify(a).is_shock()).count();
        let fraction = flagged as f64 / amounts.len() as f64;
        assert!(
            (fraction - 0.1).abs() <= 0.02,
            "flagged fraction {fraction} should approximate the contamination 0.1"
        );
    }

    #[test]
    fn deterministic_with_same_seed() {
        let amounts = spiked_amounts();
        let model1 = IsolationForestConfig::new().with_seed(99).fit(&amounts).unwrap();
        let model2 = IsolationForestConfig::new().with_seed(99).fit(&amounts).unwrap();
        assert_eq!(model1.threshold(), model2.threshold());
        for a in [0.0, 120.0, 450.0, 9000.0] {
            assert_eq!(model1.score(a), model2.score(a));
        }
    }

    #[test]
    fn batch_matches_individual() {
        let amounts = spiked_amounts();
        let model = IsolationForestConfig::new().with_seed(42).fit(&amounts).unwrap();
        let batch = model.score_batch(&amounts);
        for (i, &a) in amounts.iter().enumerate() {
            assert_eq!(batch[i], model.score(a));
        }
    }

    #[test]
    fn subsample_clamped_to_dataset_size() {
        let amounts = vec![10.0, 20.0, 30.0];
        let model = IsolationForestConfig::new().with_seed(42).fit(&amounts).unwrap();
        assert_eq!(model.subsample_size(), 3);
    }

    #[test]
    fn empty_training_set_error() {
        let err = IsolationForestConfig::new().fit(&[]).unwrap_err();
        assert!(matches!(err, ForestError::EmptyTrainingSet));
    }

    #[test]
    fn non_finite_amount_error() {
        let err = IsolationForestConfig::new()
            .fit(&[1.0, f64::NAN, 3.0])
            .unwrap_err();
        assert!(matches!(err, ForestError::NonFiniteAmount { index: 1 }));
    }

    #[test]
    fn classification_is_total_and_stable() {
        let amounts = spiked_amounts();
        let model = IsolationForestConfig::new()
            .with_contamination(0.1)
            .with_seed(42)
            .fit(&amounts)
            .unwrap();
        for a in [-1e9, 0.0, 250.0, 1e12] {
            assert_eq!(model.classify(a), model.classify(a));
        }
    }
}
