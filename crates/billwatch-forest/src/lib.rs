//! Isolation-forest anomaly detection over transaction amounts: fit,
//! score, classify, persist.
//!
//! Provides a hand-rolled isolation forest built from randomized
//! partitioning trees, path-length based anomaly scoring, contamination
//! driven threshold selection, parallel training via rayon, and model
//! serialization.

mod config;
mod error;
mod forest;
mod label;
mod node;
mod store;
mod tree;

pub use config::IsolationForestConfig;
pub use error::ForestError;
pub use forest::IsolationForest;
pub use label::AnomalyLabel;
pub use node::{Node, NodeIndex};
pub use tree::IsolationTree;
