//! Canonical tree representation (SoA).
//!
//! This module provides:
//! - [`Tree`]: Immutable SoA tree storage for efficient traversal
//! - [`TreeBuilder`]: Node-by-node construction, validated on `build`
//! - [`TreeValidationError`]: Structural validation errors

use crate::data::FeatureVector;

use super::node::{Leaf, Node, SplitCondition};
use super::NodeId;

// ============================================================================
// TreeValidationError
// ============================================================================

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    EmptyTree,
    /// A child pointer references an out-of-bounds node.
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path (DAG) or due to a cycle.
    DuplicateVisit { node: NodeId },
    /// A cycle was detected during traversal.
    CycleDetected { node: NodeId },
    /// Leaf vector storage is not `n_nodes * size` long.
    LeafVectorLenMismatch { expected: usize, actual: usize },
}

impl TreeValidationError {
    /// Node the error refers to, for error reporting.
    pub fn node(&self) -> usize {
        match self {
            Self::EmptyTree | Self::LeafVectorLenMismatch { .. } => 0,
            Self::ChildOutOfBounds { node, .. }
            | Self::SelfLoop { node }
            | Self::DuplicateVisit { node }
            | Self::CycleDetected { node } => *node as usize,
        }
    }
}

impl std::fmt::Display for TreeValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTree => write!(f, "tree has no nodes"),
            Self::ChildOutOfBounds {
                node,
                side,
                child,
                n_nodes,
            } => write!(
                f,
                "node {node} has {side} child {child}, but tree has {n_nodes} nodes"
            ),
            Self::SelfLoop { node } => write!(f, "node {node} is its own child"),
            Self::DuplicateVisit { node } => write!(f, "node {node} has more than one parent"),
            Self::CycleDetected { node } => write!(f, "cycle through node {node}"),
            Self::LeafVectorLenMismatch { expected, actual } => write!(
                f,
                "leaf vector storage has {actual} values, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for TreeValidationError {}

// ============================================================================
// Tree
// ============================================================================

/// Structure-of-Arrays tree storage for efficient traversal.
///
/// Stores tree nodes in flat arrays for cache-friendly traversal.
/// Child indices are local to this tree (0 = root). A `Tree` can only be
/// obtained through [`TreeBuilder::build`], so every child index of every
/// node reachable from the root is in range and the node graph is a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f32]>,
    left_children: Box<[NodeId]>,
    right_children: Box<[NodeId]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f32]>,
    /// Optional `n_nodes * leaf_vector_size` leaf vectors, node-major.
    leaf_vectors: Option<Box<[f32]>>,
    leaf_vector_size: usize,
}

impl Tree {
    /// Number of nodes in this tree.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    /// Check if a node is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    /// Get split feature index for a node.
    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    /// Get split threshold for a node.
    #[inline]
    pub fn split_threshold(&self, node: NodeId) -> f32 {
        self.split_thresholds[node as usize]
    }

    /// Get left child index.
    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    /// Get right child index.
    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    /// Get default direction for missing values.
    #[inline]
    pub fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    /// Scalar leaf value for a node.
    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f32 {
        self.leaf_values[node as usize]
    }

    /// Whether leaves carry one value per output group.
    #[inline]
    pub fn has_leaf_vectors(&self) -> bool {
        self.leaf_vectors.is_some()
    }

    /// Leaf vector of a node, when the tree stores leaf vectors.
    #[inline]
    pub fn leaf_vector(&self, node: NodeId) -> Option<&[f32]> {
        let size = self.leaf_vector_size;
        let start = node as usize * size;
        self.leaf_vectors.as_deref().map(|v| &v[start..start + size])
    }

    /// Leaf payload of a node: the vector if present, else the scalar.
    #[inline]
    pub fn leaf(&self, node: NodeId) -> Leaf<'_> {
        match self.leaf_vector(node) {
            Some(v) => Leaf::Vector(v),
            None => Leaf::Scalar(self.leaf_value(node)),
        }
    }

    /// Borrowed view of a single node.
    pub fn node(&self, node: NodeId) -> Node<'_> {
        if self.is_leaf(node) {
            Node::Leaf(self.leaf(node))
        } else {
            Node::Split {
                condition: SplitCondition::new(
                    self.split_index(node),
                    self.split_threshold(node),
                    self.default_left(node),
                ),
                left: self.left_child(node),
                right: self.right_child(node),
            }
        }
    }

    /// Child to follow from split `node` for the given features.
    #[inline]
    fn next_node<F: FeatureVector + ?Sized>(&self, node: NodeId, features: &F) -> NodeId {
        let idx = node as usize;
        let go_left = match features.get(self.split_indices[idx] as usize) {
            Some(fvalue) => fvalue < self.split_thresholds[idx],
            None => self.default_left[idx],
        };
        if go_left {
            self.left_children[idx]
        } else {
            self.right_children[idx]
        }
    }

    /// Traverse from the root and return the index of the leaf reached.
    ///
    /// Missing features follow the node's default direction; present values
    /// go left iff `value < threshold`.
    #[inline]
    pub fn leaf_index<F: FeatureVector + ?Sized>(&self, features: &F) -> NodeId {
        let mut node: NodeId = 0;
        while !self.is_leaf[node as usize] {
            node = self.next_node(node, features);
        }
        node
    }

    /// Maximum root-to-leaf depth (a single leaf has depth 0).
    pub fn max_depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(0 as NodeId, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if self.is_leaf(node) {
                max = max.max(depth);
            } else {
                stack.push((self.left_child(node), depth + 1));
                stack.push((self.right_child(node), depth + 1));
            }
        }
        max
    }

    /// Validate tree structure.
    ///
    /// Nodes not reachable from the root are allowed (deleted nodes are kept
    /// in place by the toolkit that wrote the model), but their child
    /// pointers are still bounds-checked.
    fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        if let Some(vectors) = &self.leaf_vectors {
            let expected = n_nodes * self.leaf_vector_size;
            if vectors.len() != expected {
                return Err(TreeValidationError::LeafVectorLenMismatch {
                    expected,
                    actual: vectors.len(),
                });
            }
        }

        for node in 0..n_nodes as NodeId {
            if self.is_leaf(node) {
                continue;
            }
            for (side, child) in [("left", self.left_child(node)), ("right", self.right_child(node))] {
                if child == node {
                    return Err(TreeValidationError::SelfLoop { node });
                }
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node,
                        side,
                        child,
                        n_nodes,
                    });
                }
            }
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, u8)> = vec![(0, 0)];

        while let Some((node, phase)) = stack.pop() {
            let node_usize = node as usize;
            if phase == 1 {
                color[node_usize] = 2;
                continue;
            }

            match color[node_usize] {
                0 => {}
                1 => return Err(TreeValidationError::CycleDetected { node }),
                _ => return Err(TreeValidationError::DuplicateVisit { node }),
            }

            color[node_usize] = 1;
            stack.push((node, 1));

            if !self.is_leaf(node) {
                stack.push((self.right_child(node), 0));
                stack.push((self.left_child(node), 0));
            }
        }

        Ok(())
    }
}

// ============================================================================
// TreeBuilder
// ============================================================================

/// Builder for constructing a [`Tree`] from individual nodes.
///
/// Nodes are numbered in insertion order; children may reference nodes that
/// are added later.
///
/// # Example
///
/// ```
/// use xgb_predictor::repr::gbdt::TreeBuilder;
///
/// let mut builder = TreeBuilder::new();
/// builder.add_split(0, 0.5, true, 1, 2);
/// builder.add_leaf(-1.0);
/// builder.add_leaf(1.0);
/// let tree = builder.build().unwrap();
///
/// assert_eq!(tree.leaf_index(&vec![0.1f32]), 1);
/// assert_eq!(tree.leaf_index(&vec![0.9f32]), 2);
/// assert_eq!(tree.leaf_index(&vec![f32::NAN]), 1);
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    split_indices: Vec<u32>,
    split_thresholds: Vec<f32>,
    left_children: Vec<NodeId>,
    right_children: Vec<NodeId>,
    default_left: Vec<bool>,
    is_leaf: Vec<bool>,
    leaf_values: Vec<f32>,
    leaf_vectors: Option<(usize, Vec<f32>)>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate room for `n_nodes` nodes.
    pub fn with_capacity(n_nodes: usize) -> Self {
        Self {
            split_indices: Vec::with_capacity(n_nodes),
            split_thresholds: Vec::with_capacity(n_nodes),
            left_children: Vec::with_capacity(n_nodes),
            right_children: Vec::with_capacity(n_nodes),
            default_left: Vec::with_capacity(n_nodes),
            is_leaf: Vec::with_capacity(n_nodes),
            leaf_values: Vec::with_capacity(n_nodes),
            leaf_vectors: None,
        }
    }

    /// Add a split node. Returns the node index.
    pub fn add_split(
        &mut self,
        feature_index: u32,
        threshold: f32,
        default_left: bool,
        left_child: NodeId,
        right_child: NodeId,
    ) -> NodeId {
        let idx = self.is_leaf.len() as NodeId;
        self.split_indices.push(feature_index);
        self.split_thresholds.push(threshold);
        self.left_children.push(left_child);
        self.right_children.push(right_child);
        self.default_left.push(default_left);
        self.is_leaf.push(false);
        self.leaf_values.push(0.0);
        idx
    }

    /// Add a leaf node. Returns the node index.
    pub fn add_leaf(&mut self, value: f32) -> NodeId {
        let idx = self.is_leaf.len() as NodeId;
        self.split_indices.push(0);
        self.split_thresholds.push(0.0);
        self.left_children.push(0);
        self.right_children.push(0);
        self.default_left.push(false);
        self.is_leaf.push(true);
        self.leaf_values.push(value);
        idx
    }

    /// Attach node-major leaf vectors of `size` components per node.
    pub fn leaf_vectors(&mut self, size: usize, values: Vec<f32>) -> &mut Self {
        self.leaf_vectors = Some((size, values));
        self
    }

    /// Build and validate the tree.
    pub fn build(self) -> Result<Tree, TreeValidationError> {
        let (leaf_vector_size, leaf_vectors) = match self.leaf_vectors {
            Some((size, values)) => (size, Some(values.into_boxed_slice())),
            None => (0, None),
        };
        let tree = Tree {
            split_indices: self.split_indices.into_boxed_slice(),
            split_thresholds: self.split_thresholds.into_boxed_slice(),
            left_children: self.left_children.into_boxed_slice(),
            right_children: self.right_children.into_boxed_slice(),
            default_left: self.default_left.into_boxed_slice(),
            is_leaf: self.is_leaf.into_boxed_slice(),
            leaf_values: self.leaf_values.into_boxed_slice(),
            leaf_vectors,
            leaf_vector_size,
        };
        tree.validate()?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SparseFeatures;

    /// Build a simple tree:
    /// ```text
    ///        [0] feat0 < 0.5
    ///        /            \
    ///   [1] leaf=1.0   [2] feat1 < 0.3
    ///                   /        \
    ///              [3] leaf=2.0  [4] leaf=3.0
    /// ```
    fn build_simple_tree() -> Tree {
        let mut builder = TreeBuilder::new();
        builder.add_split(0, 0.5, true, 1, 2);
        builder.add_leaf(1.0);
        builder.add_split(1, 0.3, false, 3, 4);
        builder.add_leaf(2.0);
        builder.add_leaf(3.0);
        builder.build().unwrap()
    }

    #[test]
    fn tree_structure() {
        let tree = build_simple_tree();
        assert_eq!(tree.n_nodes(), 5);
        assert!(!tree.is_leaf(0));
        assert!(tree.is_leaf(1));
        assert_eq!(tree.split_index(2), 1);
        assert_eq!(tree.left_child(2), 3);
        assert_eq!(tree.right_child(2), 4);
        assert!(!tree.default_left(2));
        assert_eq!(tree.max_depth(), 2);
    }

    #[test]
    fn traverse_paths() {
        let tree = build_simple_tree();
        assert_eq!(tree.leaf_index(&vec![0.3f32, 0.0]), 1);
        assert_eq!(tree.leaf_index(&vec![0.7f32, 0.1]), 3);
        assert_eq!(tree.leaf_index(&vec![0.7f32, 0.5]), 4);
        assert_eq!(tree.leaf_value(4), 3.0);
    }

    #[test]
    fn threshold_equality_goes_right() {
        let tree = build_simple_tree();
        assert_eq!(tree.leaf_index(&vec![0.5f32, 0.3]), 4);
    }

    #[test]
    fn missing_follows_default() {
        let tree = build_simple_tree();
        // feat0 missing -> default left
        assert_eq!(tree.leaf_index(&vec![f32::NAN, 0.0]), 1);
        // feat1 missing -> default right
        assert_eq!(tree.leaf_index(&vec![0.7f32, f32::NAN]), 4);
        // out of range is missing too
        assert_eq!(tree.leaf_index(&vec![0.7f32]), 4);
        // sparse absent key is missing
        let fv = SparseFeatures::from_pairs([(0, 0.7)]);
        assert_eq!(tree.leaf_index(&fv), 4);
    }

    #[test]
    fn node_view() {
        let tree = build_simple_tree();
        assert_eq!(tree.node(1), Node::Leaf(Leaf::Scalar(1.0)));
        assert_eq!(
            tree.node(0),
            Node::Split {
                condition: SplitCondition::new(0, 0.5, true),
                left: 1,
                right: 2,
            }
        );
    }

    #[test]
    fn leaf_vectors() {
        let mut builder = TreeBuilder::new();
        builder.add_split(0, 0.0, true, 1, 2);
        builder.add_leaf(0.0);
        builder.add_leaf(0.0);
        builder.leaf_vectors(2, vec![0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
        let tree = builder.build().unwrap();

        assert!(tree.has_leaf_vectors());
        assert_eq!(tree.leaf(2), Leaf::Vector(&[3.0, 4.0]));
    }

    #[test]
    fn validate_rejects_bad_leaf_vector_len() {
        let mut builder = TreeBuilder::new();
        builder.add_leaf(0.0);
        builder.leaf_vectors(2, vec![1.0]);
        assert_eq!(
            builder.build().unwrap_err(),
            TreeValidationError::LeafVectorLenMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn validate_rejects_empty() {
        assert_eq!(
            TreeBuilder::new().build().unwrap_err(),
            TreeValidationError::EmptyTree
        );
    }

    #[test]
    fn validate_rejects_out_of_bounds_child() {
        let mut builder = TreeBuilder::new();
        builder.add_split(0, 0.5, true, 1, 7);
        builder.add_leaf(1.0);
        assert!(matches!(
            builder.build(),
            Err(TreeValidationError::ChildOutOfBounds {
                side: "right",
                child: 7,
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_self_loop() {
        let mut builder = TreeBuilder::new();
        builder.add_split(0, 0.5, true, 0, 1);
        builder.add_leaf(1.0);
        assert_eq!(
            builder.build().unwrap_err(),
            TreeValidationError::SelfLoop { node: 0 }
        );
    }

    #[test]
    fn validate_rejects_cycle() {
        let mut builder = TreeBuilder::new();
        builder.add_split(0, 0.5, true, 1, 2);
        builder.add_split(0, 0.5, true, 0, 2);
        builder.add_leaf(1.0);
        assert!(matches!(
            builder.build(),
            Err(TreeValidationError::CycleDetected { node: 0 })
        ));
    }

    #[test]
    fn validate_rejects_shared_child() {
        let mut builder = TreeBuilder::new();
        builder.add_split(0, 0.5, true, 1, 1);
        builder.add_leaf(1.0);
        assert_eq!(
            builder.build().unwrap_err(),
            TreeValidationError::DuplicateVisit { node: 1 }
        );
    }

    #[test]
    fn unreachable_nodes_allowed() {
        let mut builder = TreeBuilder::new();
        builder.add_leaf(1.0);
        builder.add_leaf(2.0);
        let tree = builder.build().unwrap();
        assert_eq!(tree.leaf_index(&Vec::<f32>::new()), 0);
    }
}
