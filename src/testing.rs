//! Testing utilities for xgb-predictor.
//!
//! This module provides assertion helpers, a compact tree-building macro and
//! [`ModelBuilder`], a writer for the legacy binary model layout. Unit tests,
//! integration tests and benchmarks use it to build models in memory.
//!
//! # Usage
//!
//! ```
//! use xgb_predictor::testing::{ModelBuilder, RawTree};
//! use xgb_predictor::Predictor;
//!
//! let bytes = ModelBuilder::gbtree("reg:squarederror")
//!     .base_score(0.0)
//!     .num_feature(1)
//!     .tree(RawTree::new().split(0, 0.5, true, 1, 2).leaf(-1.0).leaf(1.0))
//!     .build();
//!
//! let predictor = Predictor::from_bytes(&bytes).unwrap();
//! assert_eq!(predictor.predict(&[0.0f32][..]), vec![-1.0]);
//! ```

use byteorder::{LittleEndian, WriteBytesExt};

// =============================================================================
// Constants
// =============================================================================

/// Default tolerance for floating point comparisons.
/// This is appropriate for most predictions where values are O(1).
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

// =============================================================================
// Floating Point Assertions
// =============================================================================

/// Assert that two float values are approximately equal.
///
/// Uses absolute difference comparison with the given tolerance.
///
/// # Examples
///
/// ```
/// # use xgb_predictor::assert_approx_eq;
/// assert_approx_eq!(1.0f64, 1.0001f64, 0.001);
/// ```
///
/// # Panics
///
/// Panics if the absolute difference exceeds tolerance.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                left_val, right_val, diff, tol
            );
        }
    }};
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)` - {}\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                format_args!($($arg)+), left_val, right_val, diff, tol
            );
        }
    }};
}

/// Assert that two slices of f64 values are approximately equal element-wise.
///
/// # Panics
///
/// Panics if lengths differ or any element differs by more than tolerance.
pub fn assert_slice_approx_eq(actual: &[f64], expected: &[f64], tolerance: f64, context: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{context}: length mismatch - got {}, expected {}",
        actual.len(),
        expected.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= tolerance,
            "{context}[{i}]: {a} ≠ {e} (diff={diff}, tolerance={tolerance})"
        );
    }
}

// =============================================================================
// Tree Macro
// =============================================================================

/// Build a scalar-leaf [`Tree`](crate::repr::gbdt::Tree) from a node listing.
///
/// Nodes must be listed in index order. `L`/`R` is the default direction for
/// missing values.
///
/// ```
/// let tree = xgb_predictor::scalar_tree! {
///     0 => num(0, 0.5, L) -> 1, 2,
///     1 => leaf(1.0),
///     2 => leaf(2.0),
/// };
/// assert_eq!(tree.n_nodes(), 3);
/// ```
#[macro_export]
macro_rules! scalar_tree {
    (@node $b:ident, num($feat:expr, $thr:expr, L) -> $l:literal, $r:literal) => {
        $b.add_split($feat, $thr, true, $l, $r)
    };
    (@node $b:ident, num($feat:expr, $thr:expr, R) -> $l:literal, $r:literal) => {
        $b.add_split($feat, $thr, false, $l, $r)
    };
    (@node $b:ident, leaf($val:expr)) => {
        $b.add_leaf($val)
    };
    ($($idx:literal => $kind:ident ( $($args:tt)* ) $(-> $l:literal, $r:literal)?),+ $(,)?) => {{
        let mut builder = $crate::repr::gbdt::TreeBuilder::new();
        $(
            let id = $crate::scalar_tree!(@node builder, $kind ( $($args)* ) $(-> $l, $r)?);
            assert_eq!(id, $idx, "scalar_tree! nodes must be listed in index order");
        )+
        builder.build().expect("scalar_tree! produced an invalid tree")
    }};
}

// =============================================================================
// Binary Model Writer
// =============================================================================

/// One raw node record as stored in the legacy layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNode {
    pub parent: i32,
    pub left: i32,
    pub right: i32,
    pub sindex: u32,
    pub value: f32,
}

impl RawNode {
    /// Split node; `default_left` is packed into bit 31 of `sindex`.
    pub fn split(feature: u32, threshold: f32, default_left: bool, left: i32, right: i32) -> Self {
        let sindex = if default_left {
            feature | (1 << 31)
        } else {
            feature
        };
        Self {
            parent: -1,
            left,
            right,
            sindex,
            value: threshold,
        }
    }

    /// Leaf node.
    pub fn leaf(value: f32) -> Self {
        Self {
            parent: -1,
            left: -1,
            right: -1,
            sindex: 0,
            value,
        }
    }
}

/// A tree in raw form, nodes in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTree {
    nodes: Vec<RawNode>,
    leaf_vector: Option<(i32, Vec<f32>)>,
}

impl RawTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-leaf tree.
    pub fn stump(value: f32) -> Self {
        Self::new().leaf(value)
    }

    /// Append a split node.
    pub fn split(self, feature: u32, threshold: f32, default_left: bool, left: i32, right: i32) -> Self {
        self.node(RawNode::split(feature, threshold, default_left, left, right))
    }

    /// Append a leaf node.
    pub fn leaf(self, value: f32) -> Self {
        self.node(RawNode::leaf(value))
    }

    /// Append an arbitrary node record, valid or not.
    pub fn node(mut self, node: RawNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Attach a leaf vector payload of `size` components per node.
    pub fn leaf_vector(mut self, size: i32, values: Vec<f32>) -> Self {
        self.leaf_vector = Some((size, values));
        self
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes with parent links filled in from the child references.
    fn linked_nodes(&self) -> Vec<RawNode> {
        let mut nodes = self.nodes.clone();
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.left == -1 {
                continue;
            }
            for child in [node.left, node.right] {
                if let Some(c) = usize::try_from(child).ok().and_then(|c| nodes.get_mut(c)) {
                    c.parent = idx as i32;
                }
            }
        }
        nodes
    }
}

#[derive(Debug, Clone)]
enum RawBooster {
    Tree {
        dart: bool,
        num_output_group: i32,
        size_leaf_vector: i32,
        num_pbuffer: i64,
        trees: Vec<(RawTree, i32)>,
        weight_drop: Option<Vec<f32>>,
    },
    Linear {
        num_feature: u32,
        num_output_group: i32,
        weights: Vec<f32>,
    },
}

/// Writer for the legacy binary model layout.
///
/// Defaults: no magic, base score 0.5, major version 1, no attributes, no
/// eval metrics. Trees are assigned to group 0 unless [`tree_in_group`] is
/// used.
///
/// [`tree_in_group`]: ModelBuilder::tree_in_group
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    binf: bool,
    base_score: f32,
    num_feature: u32,
    num_class: i32,
    major_version: u32,
    minor_version: u32,
    objective: String,
    booster: RawBooster,
    attributes: Option<Vec<(String, String)>>,
    max_delta_step: String,
    eval_metrics: Option<Vec<String>>,
}

impl ModelBuilder {
    fn with_booster(objective: &str, booster: RawBooster) -> Self {
        Self {
            binf: false,
            base_score: 0.5,
            num_feature: 0,
            num_class: 0,
            major_version: 1,
            minor_version: 0,
            objective: objective.to_string(),
            booster,
            attributes: None,
            max_delta_step: "0.7".to_string(),
            eval_metrics: None,
        }
    }

    fn tree_booster(objective: &str, dart: bool) -> Self {
        Self::with_booster(
            objective,
            RawBooster::Tree {
                dart,
                num_output_group: 1,
                size_leaf_vector: 0,
                num_pbuffer: 0,
                trees: Vec::new(),
                weight_drop: None,
            },
        )
    }

    /// Tree ensemble model (`gbtree`).
    pub fn gbtree(objective: &str) -> Self {
        Self::tree_booster(objective, false)
    }

    /// DART model; tree weights default to 1.0.
    pub fn dart(objective: &str) -> Self {
        Self::tree_booster(objective, true)
    }

    /// Linear model with `(num_feature + 1) * num_output_group` weights,
    /// feature-major, bias row last.
    pub fn gblinear(objective: &str, num_feature: u32, num_output_group: i32, weights: Vec<f32>) -> Self {
        let mut builder = Self::with_booster(
            objective,
            RawBooster::Linear {
                num_feature,
                num_output_group,
                weights,
            },
        );
        builder.num_feature = num_feature;
        builder
    }

    /// Prefix the stream with the `binf` magic.
    pub fn binf(mut self, binf: bool) -> Self {
        self.binf = binf;
        self
    }

    pub fn base_score(mut self, base_score: f32) -> Self {
        self.base_score = base_score;
        self
    }

    pub fn num_feature(mut self, num_feature: u32) -> Self {
        self.num_feature = num_feature;
        self
    }

    /// Set `num_class`, and the tree output group count to match.
    pub fn num_class(mut self, num_class: i32) -> Self {
        self.num_class = num_class;
        if let RawBooster::Tree { num_output_group, .. } = &mut self.booster {
            *num_output_group = num_class.max(1);
        }
        self
    }

    /// Toolkit version recorded in the learner header.
    pub fn version(mut self, major: u32, minor: u32) -> Self {
        self.major_version = major;
        self.minor_version = minor;
        self
    }

    /// Override the tree booster's output group count.
    pub fn num_output_group(mut self, groups: i32) -> Self {
        if let RawBooster::Tree { num_output_group, .. } = &mut self.booster {
            *num_output_group = groups;
        }
        self
    }

    /// Booster-level `size_leaf_vector`.
    pub fn size_leaf_vector(mut self, size: i32) -> Self {
        if let RawBooster::Tree { size_leaf_vector, .. } = &mut self.booster {
            *size_leaf_vector = size;
        }
        self
    }

    /// Number of prediction buffer rows; buffers are written only alongside
    /// extra attributes.
    pub fn num_pbuffer(mut self, n: i64) -> Self {
        if let RawBooster::Tree { num_pbuffer, .. } = &mut self.booster {
            *num_pbuffer = n;
        }
        self
    }

    /// Append a tree assigned to group 0.
    pub fn tree(self, tree: RawTree) -> Self {
        self.tree_in_group(tree, 0)
    }

    /// Append a tree assigned to `group`.
    pub fn tree_in_group(mut self, tree: RawTree, group: i32) -> Self {
        if let RawBooster::Tree { trees, .. } = &mut self.booster {
            trees.push((tree, group));
        }
        self
    }

    /// DART per-tree weights.
    pub fn weight_drop(mut self, weights: Vec<f32>) -> Self {
        if let RawBooster::Tree { weight_drop, .. } = &mut self.booster {
            *weight_drop = Some(weights);
        }
        self
    }

    /// Set `contain_extra_attrs` and write an (initially empty) attribute list.
    pub fn extra_attrs(mut self) -> Self {
        self.attributes.get_or_insert_with(Vec::new);
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes
            .get_or_insert_with(Vec::new)
            .push((key.to_string(), value.to_string()));
        self
    }

    /// Value of the `count:poisson` trailer string.
    pub fn max_delta_step(mut self, value: &str) -> Self {
        self.max_delta_step = value.to_string();
        self
    }

    pub fn eval_metric(mut self, name: &str) -> Self {
        self.eval_metrics
            .get_or_insert_with(Vec::new)
            .push(name.to_string());
        self
    }

    /// Serialize to bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.binf {
            out.extend_from_slice(b"binf");
        }

        // learner header
        put_f32(&mut out, self.base_score);
        put_u32(&mut out, self.num_feature);
        put_i32(&mut out, self.num_class);
        put_i32(&mut out, i32::from(self.attributes.is_some()));
        put_i32(&mut out, i32::from(self.eval_metrics.is_some()));
        put_u32(&mut out, self.major_version);
        put_u32(&mut out, self.minor_version);
        put_zeros(&mut out, 27 * 4);

        put_string(&mut out, &self.objective);

        match &self.booster {
            RawBooster::Tree {
                dart,
                num_output_group,
                size_leaf_vector,
                num_pbuffer,
                trees,
                weight_drop,
            } => {
                put_string(&mut out, if *dart { "dart" } else { "gbtree" });
                put_i32(&mut out, trees.len() as i32);
                put_i32(&mut out, 1);
                put_i32(&mut out, self.num_feature as i32);
                put_i32(&mut out, 0);
                put_i64(&mut out, *num_pbuffer);
                put_i32(&mut out, *num_output_group);
                put_i32(&mut out, *size_leaf_vector);
                put_zeros(&mut out, 32 * 4);

                for (tree, _) in trees {
                    self.write_tree(&mut out, tree);
                }
                for (_, group) in trees {
                    put_i32(&mut out, *group);
                }
                if *num_pbuffer != 0 && self.attributes.is_some() {
                    let n = *num_output_group as usize
                        * *num_pbuffer as usize
                        * (*size_leaf_vector as usize + 1);
                    put_zeros(&mut out, 2 * 4 * n);
                }
                if *dart && !trees.is_empty() {
                    let weights = weight_drop
                        .clone()
                        .unwrap_or_else(|| vec![1.0; trees.len()]);
                    put_f32_vec(&mut out, &weights);
                }
            }
            RawBooster::Linear {
                num_feature,
                num_output_group,
                weights,
            } => {
                put_string(&mut out, "gblinear");
                put_u32(&mut out, *num_feature);
                put_i32(&mut out, *num_output_group);
                put_zeros(&mut out, 32 * 4);
                put_f32_vec(&mut out, weights);
            }
        }

        if let Some(attributes) = &self.attributes {
            put_u64(&mut out, attributes.len() as u64);
            for (key, value) in attributes {
                put_string(&mut out, key);
                put_string(&mut out, value);
            }
        }
        if self.objective == "count:poisson" {
            put_string(&mut out, &self.max_delta_step);
        }
        if let Some(metrics) = &self.eval_metrics {
            put_u64(&mut out, metrics.len() as u64);
            for metric in metrics {
                put_string(&mut out, metric);
            }
        }
        out
    }

    fn write_tree(&self, out: &mut Vec<u8>, tree: &RawTree) {
        let nodes = tree.linked_nodes();
        let size_leaf_vector = tree.leaf_vector.as_ref().map_or(0, |(size, _)| *size);

        put_i32(out, 1);
        put_i32(out, nodes.len() as i32);
        put_i32(out, 0);
        put_i32(out, 0);
        put_i32(out, self.num_feature as i32);
        put_i32(out, size_leaf_vector);
        put_zeros(out, 31 * 4);

        for node in &nodes {
            put_i32(out, node.parent);
            put_i32(out, node.left);
            put_i32(out, node.right);
            put_u32(out, node.sindex);
            put_f32(out, node.value);
        }
        // node stats are never read back
        put_zeros(out, nodes.len() * 16);

        if let Some((_, values)) = &tree.leaf_vector {
            put_f32_vec(out, values);
        }
    }
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.write_u32::<LittleEndian>(v).expect("write to Vec<u8>");
}

fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.write_i32::<LittleEndian>(v).expect("write to Vec<u8>");
}

fn put_i64(out: &mut Vec<u8>, v: i64) {
    out.write_i64::<LittleEndian>(v).expect("write to Vec<u8>");
}

fn put_u64(out: &mut Vec<u8>, v: u64) {
    out.write_u64::<LittleEndian>(v).expect("write to Vec<u8>");
}

fn put_f32(out: &mut Vec<u8>, v: f32) {
    out.write_f32::<LittleEndian>(v).expect("write to Vec<u8>");
}

fn put_zeros(out: &mut Vec<u8>, n: usize) {
    out.resize(out.len() + n, 0);
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    put_u64(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

fn put_f32_vec(out: &mut Vec<u8>, values: &[f32]) {
    put_u64(out, values.len() as u64);
    for &v in values {
        put_f32(out, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_approx_eq_macro() {
        assert_approx_eq!(1.0f64, 1.0001f64, 0.001);
        assert_approx_eq!(0.0f32, 0.0f32, 1e-10);
        assert_approx_eq!(-1.5f64, -1.5001f64, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.0f64, 2.0f64, 0.1);
    }

    #[test]
    fn test_slice_approx_eq() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.000_001, 2.000_001, 3.000_001];
        assert_slice_approx_eq(&a, &b, DEFAULT_TOLERANCE, "test");
    }

    #[test]
    fn scalar_tree_macro() {
        let tree = crate::scalar_tree! {
            0 => num(2, 1.5, R) -> 1, 2,
            1 => leaf(-0.25),
            2 => leaf(0.75),
        };
        assert_eq!(tree.split_index(0), 2);
        assert!(!tree.default_left(0));
        assert_eq!(tree.leaf_value(2), 0.75);
    }

    #[test]
    fn raw_split_packs_default_left() {
        assert_eq!(RawNode::split(5, 0.0, true, 1, 2).sindex, 5 | 0x8000_0000);
        assert_eq!(RawNode::split(5, 0.0, false, 1, 2).sindex, 5);
    }

    #[test]
    fn linked_nodes_fill_parents() {
        let tree = RawTree::new().split(0, 0.5, true, 1, 2).leaf(1.0).leaf(2.0);
        let nodes = tree.linked_nodes();
        assert_eq!(
            nodes.iter().map(|n| n.parent).collect::<Vec<_>>(),
            vec![-1, 0, 0]
        );
    }

    #[test]
    fn header_sizes() {
        let empty = ModelBuilder::gbtree("reg:squarederror").build();
        // learner param + two strings + gbtree param
        let expected = 136 + (8 + "reg:squarederror".len()) + (8 + "gbtree".len()) + 160;
        assert_eq!(empty.len(), expected);

        let with_magic = ModelBuilder::gbtree("reg:squarederror").binf(true).build();
        assert_eq!(&with_magic[..4], b"binf");
        assert_eq!(with_magic.len(), expected + 4);
    }

    #[test]
    fn tree_record_size() {
        let base = ModelBuilder::gbtree("reg:squarederror").build().len();
        let one = ModelBuilder::gbtree("reg:squarederror")
            .tree(RawTree::stump(1.0))
            .build()
            .len();
        // tree param + one node + one stat + tree_info entry
        assert_eq!(one - base, 148 + 20 + 16 + 4);
    }
}
