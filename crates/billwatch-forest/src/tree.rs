//! Isolation tree construction and path-length evaluation.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::node::{Node, NodeIndex};

/// Euler–Mascheroni constant, used in the average path length correction.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points:
/// `c(n) = 2*(ln(n-1) + γ) - 2*(n-1)/n`, with `c(n) = 0` for `n <= 1`
/// and `c(2) = 1`.
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// A fitted isolation tree over one random subsample of training amounts.
///
/// Stored as an arena-based `Vec<Node>` with index references for
/// cache-friendly traversal and trivial serialization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IsolationTree {
    pub(crate) nodes: Vec<Node>,
}

impl IsolationTree {
    /// Build a tree over `values` by recursive random partitioning.
    ///
    /// Recursion stops when a node isolates a single point, all remaining
    /// values are identical, or `max_depth` is reached.
    pub(crate) fn build(values: &[f64], max_depth: usize, rng: &mut ChaCha8Rng) -> Self {
        let mut arena = Vec::new();
        build_node(values, 0, max_depth, rng, &mut arena);
        Self { nodes: arena }
    }

    /// Corrected path length of `value`: traversal depth to the terminating
    /// leaf, plus the average-path-length correction for leaves that still
    /// hold more than one point.
    pub(crate) fn path_length(&self, value: f64) -> f64 {
        let mut idx = 0usize;
        let mut depth = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { size } => {
                    return depth as f64 + average_path_length(*size);
                }
                Node::Split {
                    threshold,
                    left,
                    right,
                } => {
                    depth += 1;
                    idx = if value < *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
}

/// Recursively build the arena-based isolation tree.
///
/// Returns the [`NodeIndex`] of the node just created in `arena`.
fn build_node(
    values: &[f64],
    depth: usize,
    max_depth: usize,
    rng: &mut ChaCha8Rng,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n = values.len();

    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let idx = arena.len();
        arena.push(Node::Leaf { size: n });
        NodeIndex::new(idx)
    };

    if n <= 1 || depth >= max_depth {
        return make_leaf(arena);
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return make_leaf(arena);
    }

    // Threshold strictly inside (min, max); gen_range can land exactly on
    // min, which makes one side empty — terminate there instead.
    let threshold = rng.gen_range(min..max);
    let (left_values, right_values): (Vec<f64>, Vec<f64>) =
        values.iter().partition(|&&v| v < threshold);
    if left_values.is_empty() || right_values.is_empty() {
        return make_leaf(arena);
    }

    // Arena pattern: reserve the index, recurse, then overwrite with the split.
    let node_idx = arena.len();
    arena.push(Node::Leaf { size: n });

    let left = build_node(&left_values, depth + 1, max_depth, rng, arena);
    let right = build_node(&right_values, depth + 1, max_depth, rng, arena);

    arena[node_idx] = Node::Split {
        threshold,
        left,
        right,
    };

    NodeIndex::new(node_idx)
}
