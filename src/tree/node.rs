//! Tree node implementation for the Pure Rust XGBoost framework.
//!
//! A node is either an internal node carrying a [`SplitCondition`] and the
//! indices of its two children, or a leaf carrying one weight per output.
//! Children are referenced by index into the owning tree's arena.

use crate::core::types::{FeatureIndex, NodeIndex};
use serde::{Deserialize, Serialize};

/// Test applied at an internal node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitCondition {
    /// Rows with `value < threshold` go left.
    Numerical {
        feature: FeatureIndex,
        threshold: f32,
    },
    /// Rows whose category is in the sorted set go left, all others right.
    Categorical {
        feature: FeatureIndex,
        categories: Vec<u32>,
    },
}

impl SplitCondition {
    pub fn feature(&self) -> FeatureIndex {
        match self {
            SplitCondition::Numerical { feature, .. } => *feature,
            SplitCondition::Categorical { feature, .. } => *feature,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, SplitCondition::Categorical { .. })
    }

    /// Direction for a present value; `None` when the value is missing.
    #[inline]
    pub fn goes_left(&self, value: f32) -> Option<bool> {
        if value.is_nan() {
            return None;
        }
        match self {
            SplitCondition::Numerical { threshold, .. } => Some(value < *threshold),
            SplitCondition::Categorical { categories, .. } => {
                if value < 0.0 || value.fract() != 0.0 {
                    return Some(false);
                }
                Some(categories.binary_search(&(value as u32)).is_ok())
            }
        }
    }
}

/// Tree node representation supporting both internal and leaf nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    parent: Option<NodeIndex>,
    left_child: Option<NodeIndex>,
    right_child: Option<NodeIndex>,
    split: Option<SplitCondition>,
    /// Direction taken by missing values
    default_left: bool,
    /// Leaf output(s) for leaves, base weight(s) for internal nodes
    weight: Vec<f32>,
    /// Loss reduction of the split (0 for leaves)
    loss_change: f32,
    /// Sum of Hessians of the rows reaching this node
    sum_hessian: f32,
    depth: usize,
}

impl TreeNode {
    /// Creates a new leaf node.
    pub fn new_leaf(parent: Option<NodeIndex>, depth: usize, weight: Vec<f32>, sum_hessian: f32) -> Self {
        TreeNode {
            parent,
            left_child: None,
            right_child: None,
            split: None,
            default_left: false,
            weight,
            loss_change: 0.0,
            sum_hessian,
            depth,
        }
    }

    /// Reassembles a node from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        parent: Option<NodeIndex>,
        children: Option<(NodeIndex, NodeIndex)>,
        split: Option<SplitCondition>,
        default_left: bool,
        weight: Vec<f32>,
        loss_change: f32,
        sum_hessian: f32,
        depth: usize,
    ) -> Self {
        TreeNode {
            parent,
            left_child: children.map(|c| c.0),
            right_child: children.map(|c| c.1),
            split,
            default_left,
            weight,
            loss_change,
            sum_hessian,
            depth,
        }
    }

    /// Turns this leaf into an internal node.
    pub(crate) fn make_internal(
        &mut self,
        split: SplitCondition,
        default_left: bool,
        loss_change: f32,
        left: NodeIndex,
        right: NodeIndex,
    ) {
        self.split = Some(split);
        self.default_left = default_left;
        self.loss_change = loss_change;
        self.left_child = Some(left);
        self.right_child = Some(right);
    }

    pub(crate) fn set_weight(&mut self, weight: Vec<f32>) {
        self.weight = weight;
    }

    /// Returns true if this node is a leaf node.
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn left_child(&self) -> Option<NodeIndex> {
        self.left_child
    }

    pub fn right_child(&self) -> Option<NodeIndex> {
        self.right_child
    }

    pub fn split(&self) -> Option<&SplitCondition> {
        self.split.as_ref()
    }

    pub fn split_feature(&self) -> Option<FeatureIndex> {
        self.split.as_ref().map(SplitCondition::feature)
    }

    pub fn default_left(&self) -> bool {
        self.default_left
    }

    pub fn weight(&self) -> &[f32] {
        &self.weight
    }

    pub fn loss_change(&self) -> f32 {
        self.loss_change
    }

    pub fn sum_hessian(&self) -> f32 {
        self.sum_hessian
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Child reached by `value`, or `None` at a leaf.
    #[inline]
    pub fn next(&self, value: f32) -> Option<NodeIndex> {
        let split = self.split.as_ref()?;
        let left = split.goes_left(value).unwrap_or(self.default_left);
        if left {
            self.left_child
        } else {
            self.right_child
        }
    }
}
