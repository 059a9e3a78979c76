//! Model serialization and deserialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::ForestError;
use crate::forest::IsolationForest;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Number of trees in the ensemble.
    n_trees: usize,
    /// Per-tree subsample size used at fit time.
    subsample_size: usize,
    /// Contamination the model was trained with.
    contamination: f64,
    /// Score threshold fixed at fit time.
    threshold: f64,
    /// Seed the model was trained with.
    seed: u64,
    /// The serialized forest.
    forest: IsolationForest,
}

impl IsolationForest {
    /// Save the model to a binary file.
    ///
    /// Uses bincode encoding wrapped in a versioned envelope. Parent
    /// directories are created as needed, and the bytes land in a temporary
    /// sibling file that is renamed into place, so a concurrent reader sees
    /// either the full model or none.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::SerializeModel`] | bincode encoding failed |
    /// | [`ForestError::WriteModel`] | directory creation, file write, or rename failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError> {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            subsample_size: self.subsample_size,
            contamination: self.contamination,
            threshold: self.threshold,
            seed: self.seed,
            forest: self.clone(),
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| ForestError::SerializeModel { source: e })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ForestError::WriteModel {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, &bytes).map_err(|e| ForestError::WriteModel {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, path).map_err(|e| ForestError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_trees = self.trees.len(),
            "model saved"
        );

        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// Checks the format version and returns an error on mismatch.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::ReadModel`] | file absent or unreadable |
    /// | [`ForestError::CorruptModel`] | bincode decoding failed |
    /// | [`ForestError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForestError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| ForestError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| ForestError::CorruptModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ForestError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(
            n_trees = envelope.n_trees,
            subsample_size = envelope.subsample_size,
            threshold = envelope.threshold,
            "model loaded"
        );

        Ok(envelope.forest)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{FORMAT_VERSION, ModelEnvelope};
    use crate::config::IsolationForestConfig;
    use crate::forest::IsolationForest;

    fn train_simple_model() -> IsolationForest {
        let amounts = vec![100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 9000.0];
        IsolationForestConfig::new()
            .with_n_trees(20)
            .with_contamination(0.1)
            .with_seed(42)
            .fit(&amounts)
            .unwrap()
    }

    #[test]
    fn round_trip_identical_scores() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("test_model.bin");

        let model = train_simple_model();
        model.save(&model_path).unwrap();
        let loaded = IsolationForest::load(&model_path).unwrap();

        assert_eq!(loaded.n_trees(), model.n_trees());
        assert_eq!(loaded.subsample_size(), model.subsample_size());
        assert_eq!(loaded.threshold(), model.threshold());
        for a in [50.0, 120.0, 400.0, 9000.0] {
            assert_eq!(loaded.score(a), model.score(a));
            assert_eq!(loaded.classify(a), model.classify(a));
        }
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("models").join("nested").join("model.bin");

        let model = train_simple_model();
        model.save(&model_path).unwrap();
        assert!(model_path.exists());
    }

    #[test]
    fn no_partial_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("model.bin");

        let model = train_simple_model();
        model.save(&model_path).unwrap();
        assert!(!model_path.with_extension("tmp").exists());
    }

    #[test]
    fn load_nonexistent_file_error() {
        let err = IsolationForest::load("/tmp/nonexistent_model_abc123.bin").unwrap_err();
        assert!(matches!(err, crate::ForestError::ReadModel { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"not a valid bincode file").unwrap();
        let err = IsolationForest::load(&path).unwrap_err();
        assert!(matches!(err, crate::ForestError::CorruptModel { .. }));
    }

    #[test]
    fn incompatible_version_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");

        let model = train_simple_model();
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION + 1,
            n_trees: model.n_trees(),
            subsample_size: model.subsample_size(),
            contamination: model.contamination(),
            threshold: model.threshold(),
            seed: model.seed(),
            forest: model,
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

        let err = IsolationForest::load(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::ForestError::IncompatibleModelVersion { .. }
        ));
    }
}
