//! Tree grower for the Pure Rust XGBoost framework.
//!
//! Grows one regression tree from per-row gradient pairs. Nodes are expanded
//! either level by level (`depthwise`) or best loss change first
//! (`lossguide`). Split search over the open nodes of one step runs in
//! parallel; applying splits and partitioning rows is sequential so that the
//! resulting tree does not depend on thread scheduling.

use crate::config::Config;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::{FeatureIndex, GradStats, GradientPair, GrowPolicy, NodeIndex};
use crate::dataset::FeatureMatrix;
use crate::tree::histogram::{sum_gradients, BinnedMatrix, HistogramBuilder, HistogramCuts, NodeHistogram, SortedColumns};
use crate::tree::learner::partition::RowPartitioner;
use crate::tree::sampling::{sample_rows, ColumnSampler};
use crate::tree::split::{ConstraintManager, NodeBounds, NodeContext, SplitEvaluator, SplitFinder, SplitInfo};
use crate::tree::tree::RegTree;
use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

/// Where split candidates come from.
#[derive(Debug, Clone, Copy)]
pub enum SplitSource<'a> {
    /// Quantile bins, used by `hist` and `approx`
    Histogram {
        cuts: &'a HistogramCuts,
        binned: &'a BinnedMatrix,
    },
    /// Every distinct value, used by `exact`
    Exact { sorted: &'a SortedColumns },
}

/// Configuration for the tree grower.
#[derive(Debug, Clone)]
pub struct TreeGrowerConfig {
    pub grow_policy: GrowPolicy,
    /// Maximum depth, 0 for unlimited
    pub max_depth: usize,
    /// Maximum number of leaves, 0 for unlimited
    pub max_leaves: usize,
    /// Shrinkage applied to every leaf weight
    pub learning_rate: f64,
    pub max_cat_to_onehot: usize,
    pub max_cat_threshold: usize,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub colsample_bylevel: f64,
    pub colsample_bynode: f64,
}

impl Default for TreeGrowerConfig {
    fn default() -> Self {
        TreeGrowerConfig::from_config(&Config::default())
    }
}

impl TreeGrowerConfig {
    pub fn from_config(config: &Config) -> Self {
        TreeGrowerConfig {
            grow_policy: config.grow_policy,
            max_depth: config.max_depth,
            max_leaves: config.max_leaves,
            learning_rate: config.tree_learning_rate(),
            max_cat_to_onehot: config.max_cat_to_onehot,
            max_cat_threshold: config.max_cat_threshold,
            subsample: config.subsample,
            colsample_bytree: config.colsample_bytree,
            colsample_bylevel: config.colsample_bylevel,
            colsample_bynode: config.colsample_bynode,
        }
    }
}

/// Leaf that may still be split.
#[derive(Debug)]
struct OpenNode {
    nid: NodeIndex,
    depth: usize,
    sum: Vec<GradStats>,
    count: usize,
    bounds: NodeBounds,
    path: BTreeSet<FeatureIndex>,
    features: Vec<FeatureIndex>,
    hist: Option<NodeHistogram>,
    split: Option<SplitInfo>,
}

/// Lossguide queue entry; larger loss change first, then smaller node index.
struct QueuedNode {
    loss_change: f64,
    node: OpenNode,
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.loss_change
            .total_cmp(&other.loss_change)
            .then_with(|| other.node.nid.cmp(&self.node.nid))
    }
}

fn hessian_sum(stats: &[GradStats]) -> f32 {
    stats.iter().map(|s| s.sum_hess).sum::<f64>() as f32
}

/// Builds regression trees over one training matrix.
#[derive(Debug)]
pub struct TreeGrower<'a> {
    config: TreeGrowerConfig,
    evaluator: SplitEvaluator,
    constraints: ConstraintManager,
    matrix: &'a FeatureMatrix,
    source: SplitSource<'a>,
}

impl<'a> TreeGrower<'a> {
    pub fn new(
        config: TreeGrowerConfig,
        evaluator: SplitEvaluator,
        constraints: ConstraintManager,
        matrix: &'a FeatureMatrix,
        source: SplitSource<'a>,
    ) -> Self {
        TreeGrower {
            config,
            evaluator,
            constraints,
            matrix,
            source,
        }
    }

    /// Creates a grower from training parameters.
    pub fn from_config(
        config: &Config,
        matrix: &'a FeatureMatrix,
        source: SplitSource<'a>,
        max_delta_step: f64,
    ) -> Result<Self> {
        let constraints = ConstraintManager::from_config(config, matrix.num_cols())?;
        let evaluator = SplitEvaluator::from_config(config, max_delta_step, constraints.has_monotonic());
        Ok(TreeGrower::new(
            TreeGrowerConfig::from_config(config),
            evaluator,
            constraints,
            matrix,
            source,
        ))
    }

    pub fn config(&self) -> &TreeGrowerConfig {
        &self.config
    }

    /// Grows one tree from `gpairs` (`n_rows x n_outputs`).
    pub fn grow(&self, gpairs: ArrayView2<'_, GradientPair>, rng: &mut StdRng) -> Result<RegTree> {
        let n_rows = self.matrix.num_rows();
        if gpairs.nrows() != n_rows || gpairs.ncols() == 0 {
            return Err(XGBoostError::shape(
                format!("({}, >0)", n_rows),
                format!("({}, {})", gpairs.nrows(), gpairs.ncols()),
            ));
        }
        let num_outputs = gpairs.ncols();

        let rows = sample_rows(n_rows, self.config.subsample, rng);
        let mut sampler = ColumnSampler::new(
            self.matrix.num_cols(),
            self.matrix.info().feature_weights(),
            self.config.colsample_bytree,
            self.config.colsample_bylevel,
            self.config.colsample_bynode,
            rng,
        );

        let root_sum = sum_gradients(gpairs, &rows);
        let root_bounds = NodeBounds::unbounded();
        let root_weight = self.evaluator.node_weights(&root_sum, root_bounds);
        let mut tree = RegTree::new(num_outputs, self.leaf_value(&root_weight), hessian_sum(&root_sum));
        let mut partitioner = RowPartitioner::new(n_rows, rows);

        let root = OpenNode {
            nid: 0,
            depth: 0,
            count: partitioner.rows(0).len(),
            sum: root_sum,
            bounds: root_bounds,
            path: BTreeSet::new(),
            features: Vec::new(),
            hist: None,
            split: None,
        };

        match self.config.grow_policy {
            GrowPolicy::Depthwise => {
                self.grow_depthwise(&mut tree, &mut partitioner, root, gpairs, &mut sampler, rng)?
            }
            GrowPolicy::Lossguide => {
                self.grow_lossguide(&mut tree, &mut partitioner, root, gpairs, &mut sampler, rng)?
            }
        }

        log::debug!(
            "Grew tree: {} nodes, {} leaves, depth {}",
            tree.num_nodes(),
            tree.num_leaves(),
            tree.depth()
        );
        Ok(tree)
    }

    fn grow_depthwise(
        &self,
        tree: &mut RegTree,
        partitioner: &mut RowPartitioner,
        root: OpenNode,
        gpairs: ArrayView2<'_, GradientPair>,
        sampler: &mut ColumnSampler,
        rng: &mut StdRng,
    ) -> Result<()> {
        let mut frontier = vec![root];
        while !frontier.is_empty() {
            for node in frontier.iter_mut() {
                node.features = self.candidate_features(node, sampler, rng);
            }
            self.evaluate_nodes(&mut frontier, gpairs, partitioner);

            let mut next = Vec::new();
            for mut node in frontier {
                let Some(split) = node.split.take() else {
                    continue;
                };
                if !self.leaf_budget_left(tree) {
                    break;
                }
                let children = self.apply_split(tree, partitioner, node, split, gpairs)?;
                next.extend(children);
            }
            frontier = next;
        }
        Ok(())
    }

    fn grow_lossguide(
        &self,
        tree: &mut RegTree,
        partitioner: &mut RowPartitioner,
        mut root: OpenNode,
        gpairs: ArrayView2<'_, GradientPair>,
        sampler: &mut ColumnSampler,
        rng: &mut StdRng,
    ) -> Result<()> {
        root.features = self.candidate_features(&root, sampler, rng);
        let mut pending = vec![root];
        self.evaluate_nodes(&mut pending, gpairs, partitioner);

        let mut queue = BinaryHeap::new();
        let enqueue = |queue: &mut BinaryHeap<QueuedNode>, nodes: Vec<OpenNode>| {
            for node in nodes {
                if let Some(split) = &node.split {
                    queue.push(QueuedNode {
                        loss_change: split.loss_change,
                        node,
                    });
                }
            }
        };
        enqueue(&mut queue, pending);

        while let Some(QueuedNode { mut node, .. }) = queue.pop() {
            if !self.leaf_budget_left(tree) {
                break;
            }
            let Some(split) = node.split.take() else {
                continue;
            };
            let mut children = self.apply_split(tree, partitioner, node, split, gpairs)?;
            for child in children.iter_mut() {
                child.features = self.candidate_features(child, sampler, rng);
            }
            self.evaluate_nodes(&mut children, gpairs, partitioner);
            enqueue(&mut queue, children);
        }
        Ok(())
    }

    fn depth_allows_split(&self, depth: usize) -> bool {
        self.config.max_depth == 0 || depth < self.config.max_depth
    }

    fn leaf_budget_left(&self, tree: &RegTree) -> bool {
        self.config.max_leaves == 0 || tree.num_leaves() < self.config.max_leaves
    }

    fn leaf_value(&self, weights: &[f64]) -> Vec<f32> {
        weights
            .iter()
            .map(|w| (w * self.config.learning_rate) as f32)
            .collect()
    }

    fn candidate_features(
        &self,
        node: &OpenNode,
        sampler: &mut ColumnSampler,
        rng: &mut StdRng,
    ) -> Vec<FeatureIndex> {
        if !self.depth_allows_split(node.depth) || node.count < 2 {
            return Vec::new();
        }
        let sampled = sampler.node_features(node.depth, rng);
        self.constraints.filter_candidate_features(&sampled, &node.path)
    }

    fn evaluate_nodes(
        &self,
        nodes: &mut [OpenNode],
        gpairs: ArrayView2<'_, GradientPair>,
        partitioner: &RowPartitioner,
    ) {
        let finder = SplitFinder::new(
            &self.evaluator,
            &self.constraints,
            self.config.max_cat_to_onehot,
            self.config.max_cat_threshold,
        );
        nodes.par_iter_mut().for_each(|node| {
            if node.features.is_empty() {
                node.split = None;
                return;
            }
            let rows = partitioner.rows(node.nid);
            if let SplitSource::Histogram { cuts, binned } = self.source {
                if node.hist.is_none() {
                    node.hist = Some(HistogramBuilder::new(binned, cuts).build(gpairs, rows));
                }
            }
            let split = {
                let context = NodeContext {
                    sum: &node.sum,
                    count: node.count,
                    bounds: node.bounds,
                    features: &node.features,
                };
                match self.source {
                    SplitSource::Histogram { cuts, .. } => node
                        .hist
                        .as_ref()
                        .and_then(|hist| finder.find_best_split(&context, hist, cuts)),
                    SplitSource::Exact { sorted } => finder.find_exact_split(
                        &context,
                        self.matrix,
                        sorted,
                        gpairs,
                        partitioner.positions(),
                        node.nid,
                    ),
                }
            };
            node.split = split;
        });
    }

    fn apply_split(
        &self,
        tree: &mut RegTree,
        partitioner: &mut RowPartitioner,
        node: OpenNode,
        split: SplitInfo,
        gpairs: ArrayView2<'_, GradientPair>,
    ) -> Result<Vec<OpenNode>> {
        let feature = split.feature();
        let raw_left = self.evaluator.node_weights(&split.left_sum, node.bounds);
        let raw_right = self.evaluator.node_weights(&split.right_sum, node.bounds);
        let (left_bounds, right_bounds) =
            self.constraints
                .child_bounds(feature, node.bounds, raw_left[0], raw_right[0]);
        let left_weight = self.evaluator.node_weights(&split.left_sum, left_bounds);
        let right_weight = self.evaluator.node_weights(&split.right_sum, right_bounds);

        let (left, right) = tree.expand_node(
            node.nid,
            split.condition.clone(),
            split.default_left,
            split.loss_change as f32,
            self.leaf_value(&left_weight),
            self.leaf_value(&right_weight),
            hessian_sum(&split.left_sum),
            hessian_sum(&split.right_sum),
        )?;
        partitioner.split_node(node.nid, left, right, self.matrix, &split.condition, split.default_left)?;

        let left_count = partitioner.rows(left).len();
        let right_count = partitioner.rows(right).len();
        let (left_hist, right_hist) = match (self.source, node.hist) {
            (SplitSource::Histogram { cuts, binned }, Some(parent)) => {
                let builder = HistogramBuilder::new(binned, cuts);
                if left_count <= right_count {
                    let small = builder.build(gpairs, partitioner.rows(left));
                    let large = parent.subtract(&small);
                    (Some(small), Some(large))
                } else {
                    let small = builder.build(gpairs, partitioner.rows(right));
                    let large = parent.subtract(&small);
                    (Some(large), Some(small))
                }
            }
            _ => (None, None),
        };

        let mut path = node.path;
        path.insert(feature);
        let depth = node.depth + 1;
        Ok(vec![
            OpenNode {
                nid: left,
                depth,
                sum: split.left_sum,
                count: left_count,
                bounds: left_bounds,
                path: path.clone(),
                features: Vec::new(),
                hist: left_hist,
                split: None,
            },
            OpenNode {
                nid: right,
                depth,
                sum: split.right_sum,
                count: right_count,
                bounds: right_bounds,
                path,
                features: Vec::new(),
                hist: right_hist,
                split: None,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::tree::node::SplitCondition;
    use ndarray::{Array2, Axis};
    use rand::SeedableRng;

    fn step_data(n: usize) -> (FeatureMatrix, Array2<GradientPair>) {
        let data = Array2::from_shape_fn((n, 2), |(row, col)| {
            if col == 0 {
                row as f32
            } else {
                ((row * 7) % 5) as f32
            }
        });
        let matrix = FeatureMatrix::from_dense(data).unwrap();
        // target is 1 above n/2 and 0 below, prediction 0.5
        let gpairs = Array2::from_shape_fn((n, 1), |(row, _)| {
            let label = if row >= n / 2 { 1.0 } else { 0.0 };
            GradientPair::new(0.5 - label, 1.0)
        });
        (matrix, gpairs)
    }

    fn grow_with(config: &Config, matrix: &FeatureMatrix, gpairs: &Array2<GradientPair>) -> RegTree {
        let cuts = HistogramCuts::build(matrix, None, config.max_bin);
        let binned = BinnedMatrix::from_matrix(matrix, &cuts);
        let source = SplitSource::Histogram {
            cuts: &cuts,
            binned: &binned,
        };
        let grower = TreeGrower::from_config(config, matrix, source, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(config.seed);
        grower.grow(gpairs.view(), &mut rng).unwrap()
    }

    #[test]
    fn test_root_split_on_signal_feature() {
        let (matrix, gpairs) = step_data(40);
        let config = ConfigBuilder::new().max_depth(1).learning_rate(1.0).build().unwrap();
        let tree = grow_with(&config, &matrix, &gpairs);

        assert_eq!(tree.num_leaves(), 2);
        let root = tree.node(0).unwrap();
        assert_eq!(
            root.split(),
            Some(&SplitCondition::Numerical {
                feature: 0,
                threshold: 20.0
            })
        );
        let left = tree.node(root.left_child().unwrap()).unwrap();
        assert!(left.weight()[0] < 0.0);
    }

    #[test]
    fn test_depth_and_leaf_limits() {
        let (matrix, gpairs) = step_data(64);
        let config = ConfigBuilder::new()
            .max_depth(3)
            .min_child_weight(0.0)
            .build()
            .unwrap();
        let tree = grow_with(&config, &matrix, &gpairs);
        assert!(tree.depth() <= 3);

        let config = ConfigBuilder::new()
            .grow_policy(GrowPolicy::Lossguide)
            .max_depth(0)
            .max_leaves(3)
            .min_child_weight(0.0)
            .build()
            .unwrap();
        let tree = grow_with(&config, &matrix, &gpairs);
        assert!(tree.num_leaves() <= 3);
    }

    #[test]
    fn test_min_child_weight_blocks_all_splits() {
        let (matrix, gpairs) = step_data(20);
        let config = ConfigBuilder::new().min_child_weight(1000.0).build().unwrap();
        let tree = grow_with(&config, &matrix, &gpairs);
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.split_nodes().count(), 0);
    }

    #[test]
    fn test_exact_and_hist_agree_on_small_data() {
        let (matrix, gpairs) = step_data(30);
        let config = ConfigBuilder::new().max_depth(2).build().unwrap();
        let hist_tree = grow_with(&config, &matrix, &gpairs);

        let sorted = SortedColumns::from_matrix(&matrix);
        let grower =
            TreeGrower::from_config(&config, &matrix, SplitSource::Exact { sorted: &sorted }, 0.0).unwrap();
        let exact_tree = grower.grow(gpairs.view(), &mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(hist_tree.num_leaves(), exact_tree.num_leaves());
        for row in 0..30 {
            let hist_value = hist_tree.predict_row(|f| matrix.value(row, f));
            let exact_value = exact_tree.predict_row(|f| matrix.value(row, f));
            assert!((hist_value[0] - exact_value[0]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_monotone_increasing_constraint() {
        let n = 50;
        let data = Array2::from_shape_fn((n, 1), |(row, _)| row as f32);
        let matrix = FeatureMatrix::from_dense(data).unwrap();
        // increasing trend with a zigzag the constraint must smooth out
        let gpairs = Array2::from_shape_fn((n, 1), |(row, _)| {
            let zigzag = if (row / 5) % 2 == 0 { 0.3 } else { -0.3 };
            GradientPair::new(-(row as f32 / n as f32) - zigzag, 1.0)
        });
        let config = ConfigBuilder::new()
            .monotone_constraints(vec![1])
            .max_depth(4)
            .min_child_weight(0.0)
            .build()
            .unwrap();
        let tree = grow_with(&config, &matrix, &gpairs);
        let predictions: Vec<f32> = (0..n).map(|row| tree.predict_row(|f| matrix.value(row, f))[0]).collect();
        assert!(predictions.windows(2).all(|w| w[0] <= w[1] + 1e-7));
    }

    #[test]
    fn test_interaction_constraints_limit_paths() {
        let n = 64;
        let data = Array2::from_shape_fn((n, 3), |(row, col)| ((row >> col) & 1) as f32 + (row % 3) as f32 * 0.1);
        let matrix = FeatureMatrix::from_dense(data).unwrap();
        let gpairs = Array2::from_shape_fn((n, 1), |(row, _)| {
            let x = (row & 1) as f32 + ((row >> 1) & 1) as f32 * 2.0 + ((row >> 2) & 1) as f32 * 3.0;
            GradientPair::new(3.0 - x, 1.0)
        });
        let config = ConfigBuilder::new()
            .interaction_constraints(vec![vec![0, 1], vec![2]])
            .max_depth(4)
            .min_child_weight(0.0)
            .build()
            .unwrap();
        let tree = grow_with(&config, &matrix, &gpairs);

        for (nid, node) in tree.nodes().iter().enumerate() {
            let Some(feature) = node.split_feature() else { continue };
            let mut ancestor = tree.node(nid).and_then(|n| n.parent());
            while let Some(parent) = ancestor {
                let parent_node = tree.node(parent).unwrap();
                let parent_feature = parent_node.split_feature().unwrap();
                let together = [feature, parent_feature];
                assert!(
                    together.iter().all(|f| *f < 2) || together.iter().all(|f| *f == 2),
                    "features {:?} share a path",
                    together
                );
                ancestor = parent_node.parent();
            }
        }
    }

    #[test]
    fn test_vector_leaf_tree() {
        let (matrix, gpairs) = step_data(40);
        let wide = ndarray::concatenate(Axis(1), &[gpairs.view(), gpairs.view()]).unwrap();
        let config = ConfigBuilder::new().max_depth(2).build().unwrap();
        let tree = grow_with(&config, &matrix, &wide);
        assert_eq!(tree.num_outputs(), 2);
        assert!(tree.num_leaves() > 1);
    }

    #[test]
    fn test_growth_is_deterministic_with_sampling() {
        let (matrix, gpairs) = step_data(80);
        let config = ConfigBuilder::new()
            .subsample(0.7)
            .colsample_bynode(0.5)
            .seed(11)
            .build()
            .unwrap();
        let first = grow_with(&config, &matrix, &gpairs);
        let second = grow_with(&config, &matrix, &gpairs);
        assert_eq!(first, second);
    }
}
