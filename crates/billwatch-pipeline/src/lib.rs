//! Orchestration of the billwatch anomaly-detection pipeline.
//!
//! The trainer wires validation, isolation-forest fitting, and model
//! persistence; the detector loads a stored model and extracts the
//! bill-shock subset of a transaction batch. Both gate on the validators
//! before any expensive work and report failures as typed errors.

mod detector;
mod error;
mod trainer;

pub use detector::{AnomalyReport, LabeledTransaction, detect_anomalies, detect_with_model};
pub use error::PipelineError;
pub use trainer::{DEFAULT_CONTAMINATION, Trainer, TrainingSummary};
