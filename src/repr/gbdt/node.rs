//! Tree node types.

use super::NodeId;

/// Split condition for a decision node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCondition {
    /// Feature index to split on
    pub feature_index: u32,
    /// Threshold value (go left if feature < threshold)
    pub threshold: f32,
    /// Direction for missing values (true = left, false = right)
    pub default_left: bool,
}

impl SplitCondition {
    pub fn new(feature_index: u32, threshold: f32, default_left: bool) -> Self {
        Self {
            feature_index,
            threshold,
            default_left,
        }
    }

    /// Evaluate which direction to go for a feature value.
    /// Returns true for left, false for right.
    ///
    /// `None` is a missing feature and follows the default direction.
    #[inline]
    pub fn go_left(&self, feature_value: Option<f32>) -> bool {
        match feature_value {
            Some(v) if !v.is_nan() => v < self.threshold,
            _ => self.default_left,
        }
    }
}

/// Leaf payload as seen through [`Node::Leaf`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leaf<'a> {
    /// One value, added to the tree's own output group.
    Scalar(f32),
    /// One value per output group, component `k` goes to group `k`.
    Vector(&'a [f32]),
}

/// Borrowed view of one node of a [`Tree`](super::Tree).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    /// Internal split node
    Split {
        condition: SplitCondition,
        left: NodeId,
        right: NodeId,
    },
    /// Leaf node with a value
    Leaf(Leaf<'a>),
}

impl<'a> Node<'a> {
    /// Returns true if this is a leaf node.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Get the leaf payload, if this is a leaf.
    #[inline]
    pub fn leaf(&self) -> Option<Leaf<'a>> {
        match self {
            Self::Leaf(v) => Some(*v),
            Self::Split { .. } => None,
        }
    }

    /// Get the split condition, if this is a split node.
    #[inline]
    pub fn split_condition(&self) -> Option<&SplitCondition> {
        match self {
            Self::Split { condition, .. } => Some(condition),
            Self::Leaf(_) => None,
        }
    }

    /// Get child indices, if this is a split node.
    #[inline]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self {
            Self::Split { left, right, .. } => Some((*left, *right)),
            Self::Leaf(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_condition_numeric() {
        let cond = SplitCondition::new(0, 0.5, true);

        assert!(cond.go_left(Some(0.3))); // < threshold
        assert!(!cond.go_left(Some(0.7))); // >= threshold
        assert!(!cond.go_left(Some(0.5))); // == threshold goes right
    }

    #[test]
    fn split_condition_missing_default_left() {
        let cond = SplitCondition::new(0, 0.5, true);
        assert!(cond.go_left(None));
        assert!(cond.go_left(Some(f32::NAN)));
    }

    #[test]
    fn split_condition_missing_default_right() {
        let cond = SplitCondition::new(0, -0.5, false);
        assert!(!cond.go_left(None));
    }

    #[test]
    fn node_leaf() {
        let node = Node::Leaf(Leaf::Scalar(1.5));

        assert!(node.is_leaf());
        assert_eq!(node.leaf(), Some(Leaf::Scalar(1.5)));
        assert_eq!(node.split_condition(), None);
        assert_eq!(node.children(), None);
    }

    #[test]
    fn node_split() {
        let cond = SplitCondition::new(2, 0.5, false);
        let node = Node::Split {
            condition: cond,
            left: 1,
            right: 2,
        };

        assert!(!node.is_leaf());
        assert_eq!(node.leaf(), None);
        assert_eq!(node.split_condition(), Some(&cond));
        assert_eq!(node.children(), Some((1, 2)));
    }
}
