//! Regression tree implementation for the Pure Rust XGBoost framework.
//!
//! Nodes live in a flat arena with index 0 as the root. A tree is grown by
//! repeatedly expanding leaves and is never modified once it has been
//! committed to an ensemble.

use crate::core::types::{FeatureIndex, NodeIndex};
use crate::dataset::FeatureSchema;
use crate::tree::node::{SplitCondition, TreeNode};
use anyhow::{anyhow, bail, ensure};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Decision tree with scalar or vector leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegTree {
    nodes: Vec<TreeNode>,
    /// Number of weights per leaf (1 for scalar-leaf trees)
    num_outputs: usize,
    num_leaves: usize,
}

impl RegTree {
    /// Creates a tree holding a single root leaf.
    pub fn new(num_outputs: usize, root_weight: Vec<f32>, root_hessian: f32) -> Self {
        RegTree {
            nodes: vec![TreeNode::new_leaf(None, 0, root_weight, root_hessian)],
            num_outputs: num_outputs.max(1),
            num_leaves: 1,
        }
    }

    /// Rebuilds a tree from stored nodes, checking the arena invariants.
    pub fn from_nodes(nodes: Vec<TreeNode>, num_outputs: usize) -> anyhow::Result<Self> {
        ensure!(!nodes.is_empty(), "tree has no nodes");
        ensure!(num_outputs > 0, "tree must have at least one output");
        let mut num_leaves = 0;
        for (nid, node) in nodes.iter().enumerate() {
            ensure!(
                node.weight().len() == num_outputs,
                "node {} has {} weights, expected {}",
                nid,
                node.weight().len(),
                num_outputs
            );
            if node.is_leaf() {
                num_leaves += 1;
                continue;
            }
            let (left, right) = match (node.left_child(), node.right_child()) {
                (Some(l), Some(r)) => (l, r),
                _ => bail!("internal node {} is missing a child", nid),
            };
            for child in [left, right] {
                ensure!(
                    child > nid && child < nodes.len(),
                    "node {} has invalid child index {}",
                    nid,
                    child
                );
                ensure!(
                    nodes[child].parent() == Some(nid),
                    "child {} does not point back to parent {}",
                    child,
                    nid
                );
            }
        }
        Ok(RegTree {
            nodes,
            num_outputs,
            num_leaves,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// True when leaves hold one weight per output.
    pub fn is_vector_leaf(&self) -> bool {
        self.num_outputs > 1
    }

    /// Depth of the deepest node.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Splits the leaf `nid` into two new leaves and returns their indices.
    #[allow(clippy::too_many_arguments)]
    pub fn expand_node(
        &mut self,
        nid: NodeIndex,
        split: SplitCondition,
        default_left: bool,
        loss_change: f32,
        left_weight: Vec<f32>,
        right_weight: Vec<f32>,
        left_hessian: f32,
        right_hessian: f32,
    ) -> anyhow::Result<(NodeIndex, NodeIndex)> {
        let depth = {
            let node = self
                .nodes
                .get(nid)
                .ok_or_else(|| anyhow!("node index {} out of bounds", nid))?;
            ensure!(node.is_leaf(), "cannot split non-leaf node {}", nid);
            node.depth()
        };
        ensure!(
            left_weight.len() == self.num_outputs && right_weight.len() == self.num_outputs,
            "leaf weights must have {} entries",
            self.num_outputs
        );

        let left = self.nodes.len();
        let right = left + 1;
        self.nodes
            .push(TreeNode::new_leaf(Some(nid), depth + 1, left_weight, left_hessian));
        self.nodes
            .push(TreeNode::new_leaf(Some(nid), depth + 1, right_weight, right_hessian));
        self.nodes[nid].make_internal(split, default_left, loss_change, left, right);
        self.num_leaves += 1;
        Ok((left, right))
    }

    /// Overwrites the weights of a leaf.
    pub fn set_leaf_weight(&mut self, nid: NodeIndex, weight: Vec<f32>) -> anyhow::Result<()> {
        ensure!(weight.len() == self.num_outputs, "leaf weight has wrong length");
        let node = self
            .nodes
            .get_mut(nid)
            .ok_or_else(|| anyhow!("node index {} out of bounds", nid))?;
        ensure!(node.is_leaf(), "node {} is not a leaf", nid);
        node.set_weight(weight);
        Ok(())
    }

    /// Index of the leaf reached by a row whose values are read through `fvalue`.
    #[inline]
    pub fn get_leaf_index<F>(&self, fvalue: F) -> NodeIndex
    where
        F: Fn(FeatureIndex) -> f32,
    {
        let mut nid = 0;
        loop {
            let node = &self.nodes[nid];
            let Some(split) = node.split() else {
                return nid;
            };
            match node.next(fvalue(split.feature())) {
                Some(child) => nid = child,
                None => return nid,
            }
        }
    }

    /// Leaf weights reached by a row.
    #[inline]
    pub fn predict_row<F>(&self, fvalue: F) -> &[f32]
    where
        F: Fn(FeatureIndex) -> f32,
    {
        self.nodes[self.get_leaf_index(fvalue)].weight()
    }

    /// Iterator over the internal nodes.
    pub fn split_nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().filter(|node| !node.is_leaf())
    }

    /// Text dump, one line per node, indented by depth.
    pub fn dump_text(&self, schema: &FeatureSchema, with_stats: bool) -> String {
        let mut out = String::new();
        self.dump_text_node(0, schema, with_stats, &mut out);
        out
    }

    fn format_weight(weight: &[f32]) -> String {
        if weight.len() == 1 {
            weight[0].to_string()
        } else {
            let items: Vec<String> = weight.iter().map(|w| w.to_string()).collect();
            format!("[{}]", items.join(","))
        }
    }

    fn dump_text_node(&self, nid: NodeIndex, schema: &FeatureSchema, with_stats: bool, out: &mut String) {
        let node = &self.nodes[nid];
        let indent = "\t".repeat(node.depth());
        match (node.split(), node.left_child(), node.right_child()) {
            (Some(split), Some(left), Some(right)) => {
                let name = schema.feature_name(split.feature());
                let test = match split {
                    SplitCondition::Numerical { threshold, .. } => format!("{}<{}", name, threshold),
                    SplitCondition::Categorical { categories, .. } => {
                        let items: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
                        format!("{}:{{{}}}", name, items.join(","))
                    }
                };
                let missing = if node.default_left() { left } else { right };
                let _ = write!(out, "{}{}:[{}] yes={},no={},missing={}", indent, nid, test, left, right, missing);
                if with_stats {
                    let _ = write!(out, ",gain={},cover={}", node.loss_change(), node.sum_hessian());
                }
                out.push('\n');
                self.dump_text_node(left, schema, with_stats, out);
                self.dump_text_node(right, schema, with_stats, out);
            }
            _ => {
                let _ = write!(out, "{}{}:leaf={}", indent, nid, Self::format_weight(node.weight()));
                if with_stats {
                    let _ = write!(out, ",cover={}", node.sum_hessian());
                }
                out.push('\n');
            }
        }
    }

    /// Nested JSON dump of the tree.
    pub fn dump_json(&self, schema: &FeatureSchema, with_stats: bool) -> serde_json::Value {
        self.dump_json_node(0, schema, with_stats)
    }

    fn dump_json_node(&self, nid: NodeIndex, schema: &FeatureSchema, with_stats: bool) -> serde_json::Value {
        let node = &self.nodes[nid];
        let mut object = serde_json::Map::new();
        object.insert("nodeid".into(), nid.into());
        object.insert("depth".into(), node.depth().into());
        if let (Some(split), Some(left), Some(right)) = (node.split(), node.left_child(), node.right_child()) {
            object.insert("split".into(), schema.feature_name(split.feature()).into());
            match split {
                SplitCondition::Numerical { threshold, .. } => {
                    object.insert("split_condition".into(), (*threshold as f64).into());
                }
                SplitCondition::Categorical { categories, .. } => {
                    object.insert("split_condition".into(), categories.clone().into());
                }
            }
            object.insert("yes".into(), left.into());
            object.insert("no".into(), right.into());
            object.insert("missing".into(), (if node.default_left() { left } else { right }).into());
            if with_stats {
                object.insert("gain".into(), (node.loss_change() as f64).into());
                object.insert("cover".into(), (node.sum_hessian() as f64).into());
            }
            let children = vec![
                self.dump_json_node(left, schema, with_stats),
                self.dump_json_node(right, schema, with_stats),
            ];
            object.insert("children".into(), children.into());
        } else {
            let weight: Vec<f64> = node.weight().iter().map(|&w| w as f64).collect();
            if weight.len() == 1 {
                object.insert("leaf".into(), weight[0].into());
            } else {
                object.insert("leaf".into(), weight.into());
            }
            if with_stats {
                object.insert("cover".into(), (node.sum_hessian() as f64).into());
            }
        }
        serde_json::Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> RegTree {
        let mut tree = RegTree::new(1, vec![0.0], 10.0);
        tree.expand_node(
            0,
            SplitCondition::Numerical {
                feature: 1,
                threshold: 0.5,
            },
            true,
            4.0,
            vec![-1.0],
            vec![2.0],
            4.0,
            6.0,
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_expand_and_predict() {
        let tree = stump();
        assert_eq!(tree.num_nodes(), 3);
        assert_eq!(tree.num_leaves(), 2);
        assert_eq!(tree.depth(), 1);

        let row = [0.0, 0.2];
        assert_eq!(tree.predict_row(|f| row[f]), &[-1.0f32]);
        let row = [0.0, 0.9];
        assert_eq!(tree.predict_row(|f| row[f]), &[2.0f32]);
        let row = [0.0, f32::NAN];
        assert_eq!(tree.get_leaf_index(|f| row[f]), 1);
    }

    #[test]
    fn test_cannot_split_internal_node() {
        let mut tree = stump();
        let result = tree.expand_node(
            0,
            SplitCondition::Numerical {
                feature: 0,
                threshold: 0.0,
            },
            false,
            1.0,
            vec![0.0],
            vec![0.0],
            1.0,
            1.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_nodes_round_trip() {
        let tree = stump();
        let rebuilt = RegTree::from_nodes(tree.nodes().to_vec(), 1).unwrap();
        assert_eq!(rebuilt, tree);
        assert!(RegTree::from_nodes(tree.nodes().to_vec(), 2).is_err());
    }

    #[test]
    fn test_text_dump() {
        let tree = stump();
        let dump = tree.dump_text(&FeatureSchema::unnamed(2), true);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("0:[f1<0.5] yes=1,no=2,missing=1"));
        assert!(lines[0].contains("gain=4"));
        assert!(lines[1].starts_with("\t1:leaf=-1"));
    }

    #[test]
    fn test_json_dump_vector_leaf() {
        let tree = RegTree::new(2, vec![0.5, -0.5], 3.0);
        let json = tree.dump_json(&FeatureSchema::unnamed(1), false);
        assert_eq!(json["leaf"], serde_json::json!([0.5, -0.5]));
        assert!(tree.is_vector_leaf());
    }
}
