//! Canonical forest representation (collection of trees).

use super::Tree;

/// Structural errors raised while assembling a [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestValidationError {
    /// A tree was assigned to a group the forest does not have.
    GroupOutOfRange { tree: usize, group: u32, n_groups: u32 },
    /// Per-tree weights do not cover exactly the trees in the forest.
    WeightsLenMismatch { n_trees: usize, n_weights: usize },
}

impl std::fmt::Display for ForestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GroupOutOfRange {
                tree,
                group,
                n_groups,
            } => write!(
                f,
                "tree {tree} assigned to group {group}, forest has {n_groups} groups"
            ),
            Self::WeightsLenMismatch { n_trees, n_weights } => {
                write!(f, "{n_weights} tree weights for {n_trees} trees")
            }
        }
    }
}

impl std::error::Error for ForestValidationError {}

/// Forest of decision trees.
///
/// Stores multiple trees with their group assignments for multi-class support.
/// Trees for one group need not be contiguous; the toolkit interleaves them
/// round-robin across boosting rounds, and the assignment recorded per tree is
/// authoritative.
///
/// DART models additionally carry one weight per tree that scales the tree's
/// leaf values.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    tree_groups: Vec<u32>,
    tree_weights: Option<Vec<f32>>,
    n_groups: u32,
}

impl Forest {
    /// Create a new forest with the given number of groups.
    pub fn new(n_groups: u32) -> Self {
        Self {
            trees: Vec::new(),
            tree_groups: Vec::new(),
            tree_weights: None,
            n_groups,
        }
    }

    /// Create a forest for regression (single output group).
    pub fn for_regression() -> Self {
        Self::new(1)
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree, group: u32) -> Result<(), ForestValidationError> {
        if group >= self.n_groups {
            return Err(ForestValidationError::GroupOutOfRange {
                tree: self.trees.len(),
                group,
                n_groups: self.n_groups,
            });
        }
        self.trees.push(tree);
        self.tree_groups.push(group);
        Ok(())
    }

    /// Attach per-tree weights (DART). Must be called after all trees are pushed.
    pub fn set_tree_weights(&mut self, weights: Vec<f32>) -> Result<(), ForestValidationError> {
        if weights.len() != self.trees.len() {
            return Err(ForestValidationError::WeightsLenMismatch {
                n_trees: self.trees.len(),
                n_weights: weights.len(),
            });
        }
        self.tree_weights = Some(weights);
        Ok(())
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of output groups.
    #[inline]
    pub fn n_groups(&self) -> u32 {
        self.n_groups
    }

    /// Get a reference to a specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// Get the group assignment for a tree.
    #[inline]
    pub fn tree_group(&self, idx: usize) -> u32 {
        self.tree_groups[idx]
    }

    /// Group assignment for every tree, in tree order.
    #[inline]
    pub fn tree_groups(&self) -> &[u32] {
        &self.tree_groups
    }

    /// Weight applied to a tree's leaf values (1.0 unless DART).
    #[inline]
    pub fn tree_weight(&self, idx: usize) -> f32 {
        self.tree_weights.as_ref().map_or(1.0, |w| w[idx])
    }

    /// Per-tree weights, if the forest has them.
    #[inline]
    pub fn tree_weights(&self) -> Option<&[f32]> {
        self.tree_weights.as_deref()
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Iterate over trees with their group assignments.
    pub fn trees_with_groups(&self) -> impl Iterator<Item = (&Tree, u32)> {
        self.trees
            .iter()
            .zip(self.tree_groups.iter())
            .map(|(t, &g)| (t, g))
    }

    /// Number of trees assigned to each group.
    pub fn trees_per_group(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_groups as usize];
        for &g in &self.tree_groups {
            counts[g as usize] += 1;
        }
        counts
    }
}
