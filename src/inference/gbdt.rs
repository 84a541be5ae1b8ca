//! Tree ensemble evaluation.
//!
//! Every tree routes the sample from its root to one leaf. Scalar leaves add
//! to the accumulator of the tree's group; vector leaves add component `k` to
//! group `k`. DART tree weights scale each contribution.

use crate::data::FeatureVector;
use crate::repr::gbdt::{Forest, Leaf};

/// Number of trees evaluated under `limit`.
///
/// `None` and `Some(0)` both select every tree; larger limits are clamped.
#[inline]
pub fn effective_tree_count(n_trees: usize, limit: Option<usize>) -> usize {
    match limit {
        None | Some(0) => n_trees,
        Some(k) => k.min(n_trees),
    }
}

/// Sum tree contributions into one accumulator per group.
///
/// Accumulators start at zero; the caller adds the base margin.
pub fn accumulate<F: FeatureVector + ?Sized>(
    forest: &Forest,
    features: &F,
    limit: Option<usize>,
) -> Vec<f64> {
    let mut sums = vec![0.0f64; forest.n_groups() as usize];
    let n_trees = effective_tree_count(forest.n_trees(), limit);

    for tree_idx in 0..n_trees {
        let tree = forest.tree(tree_idx);
        let leaf = tree.leaf_index(features);
        let weight = f64::from(forest.tree_weight(tree_idx));

        match tree.leaf(leaf) {
            Leaf::Scalar(value) => {
                sums[forest.tree_group(tree_idx) as usize] += f64::from(value) * weight;
            }
            Leaf::Vector(values) => {
                for (sum, &value) in sums.iter_mut().zip(values) {
                    *sum += f64::from(value) * weight;
                }
            }
        }
    }

    sums
}

/// Leaf reached in each evaluated tree, in tree order.
pub fn leaf_indices<F: FeatureVector + ?Sized>(
    forest: &Forest,
    features: &F,
    limit: Option<usize>,
) -> Vec<u32> {
    let n_trees = effective_tree_count(forest.n_trees(), limit);
    forest
        .trees()
        .take(n_trees)
        .map(|tree| tree.leaf_index(features))
        .collect()
}
