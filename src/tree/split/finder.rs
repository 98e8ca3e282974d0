//! Best split search for tree nodes.
//!
//! Numerical features are scanned bin by bin (or value by value for the
//! exact method), trying each threshold with missing values sent right and
//! then left. Categorical features use one-vs-rest splits below
//! `max_cat_to_onehot` categories and sorted partition splits otherwise.
//! Features are evaluated in parallel and reduced in ascending feature
//! order, so the first strictly better candidate always wins.

use crate::core::types::{FeatureIndex, GradStats, GradientPair};
use crate::dataset::FeatureMatrix;
use crate::tree::histogram::{FeatureHistogram, HistogramCuts, NodeHistogram, SortedColumns};
use crate::tree::node::SplitCondition;
use crate::tree::split::constraints::{ConstraintManager, MonotonicConstraint, NodeBounds};
use crate::tree::split::evaluator::SplitEvaluator;
use ndarray::ArrayView2;
use rayon::prelude::*;

/// Information about a potential split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    pub condition: SplitCondition,
    /// Direction taken by missing values
    pub default_left: bool,
    pub loss_change: f64,
    pub left_sum: Vec<GradStats>,
    pub right_sum: Vec<GradStats>,
    pub left_count: usize,
    pub right_count: usize,
}

impl SplitInfo {
    pub fn feature(&self) -> FeatureIndex {
        self.condition.feature()
    }

    fn from_partition(condition: SplitCondition, default_left: bool, partition: Partition) -> Self {
        SplitInfo {
            condition,
            default_left,
            loss_change: partition.loss_change,
            left_sum: partition.left_sum,
            right_sum: partition.right_sum,
            left_count: partition.left_count,
            right_count: partition.right_count,
        }
    }
}

/// Node being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    /// Per-target gradient sums of all rows in the node
    pub sum: &'a [GradStats],
    pub count: usize,
    pub bounds: NodeBounds,
    /// Candidate features, ascending
    pub features: &'a [FeatureIndex],
}

#[derive(Debug, Clone, PartialEq)]
struct Partition {
    loss_change: f64,
    left_sum: Vec<GradStats>,
    right_sum: Vec<GradStats>,
    left_count: usize,
    right_count: usize,
}

type Best<K> = Option<(K, bool, Partition)>;

fn consider<K>(best: &mut Best<K>, key: K, default_left: bool, candidate: Option<Partition>) {
    if let Some(candidate) = candidate {
        let improves = best
            .as_ref()
            .map_or(true, |(_, _, current)| candidate.loss_change > current.loss_change);
        if improves {
            *best = Some((key, default_left, candidate));
        }
    }
}

fn add_stats(a: &[GradStats], b: &[GradStats]) -> Vec<GradStats> {
    a.iter().zip(b).map(|(x, y)| *x + *y).collect()
}

/// Picks the first candidate with the strictly largest loss change.
fn select_best(candidates: Vec<Option<SplitInfo>>) -> Option<SplitInfo> {
    candidates.into_iter().flatten().fold(None, |best, candidate| match best {
        Some(current) if candidate.loss_change <= current.loss_change => Some(current),
        _ => Some(candidate),
    })
}

/// Split finder holding the per-tree evaluation settings.
#[derive(Debug, Clone, Copy)]
pub struct SplitFinder<'a> {
    evaluator: &'a SplitEvaluator,
    constraints: &'a ConstraintManager,
    max_cat_to_onehot: usize,
    max_cat_threshold: usize,
}

impl<'a> SplitFinder<'a> {
    pub fn new(
        evaluator: &'a SplitEvaluator,
        constraints: &'a ConstraintManager,
        max_cat_to_onehot: usize,
        max_cat_threshold: usize,
    ) -> Self {
        SplitFinder {
            evaluator,
            constraints,
            max_cat_to_onehot,
            max_cat_threshold: max_cat_threshold.max(1),
        }
    }

    /// Best histogram split of a node, `None` when no split gains enough.
    pub fn find_best_split(
        &self,
        node: &NodeContext<'_>,
        hist: &NodeHistogram,
        cuts: &HistogramCuts,
    ) -> Option<SplitInfo> {
        let parent_gain = self.evaluator.node_gain(node.sum, node.bounds);
        let candidates: Vec<Option<SplitInfo>> = node
            .features
            .par_iter()
            .map(|&feature| {
                let fhist = hist.feature(feature);
                if cuts.is_categorical(feature) {
                    self.scan_categorical(node, fhist, feature, parent_gain)
                } else {
                    self.scan_numerical(node, fhist, cuts, feature, parent_gain)
                }
            })
            .collect();
        select_best(candidates).filter(|split| self.evaluator.accepts(split.loss_change))
    }

    /// Best split of a node over raw sorted values.
    ///
    /// `positions[row]` is the node each row currently belongs to.
    pub fn find_exact_split(
        &self,
        node: &NodeContext<'_>,
        matrix: &FeatureMatrix,
        sorted: &SortedColumns,
        gpairs: ArrayView2<'_, GradientPair>,
        positions: &[usize],
        nid: usize,
    ) -> Option<SplitInfo> {
        let parent_gain = self.evaluator.node_gain(node.sum, node.bounds);
        let candidates: Vec<Option<SplitInfo>> = node
            .features
            .par_iter()
            .map(|&feature| {
                let rows: Vec<usize> = sorted
                    .sorted_rows(feature)
                    .iter()
                    .map(|&row| row as usize)
                    .filter(|&row| positions[row] == nid)
                    .collect();
                self.scan_exact(node, matrix.column(feature), &rows, gpairs, feature, parent_gain)
            })
            .collect();
        select_best(candidates).filter(|split| self.evaluator.accepts(split.loss_change))
    }

    fn evaluate_partition(
        &self,
        node: &NodeContext<'_>,
        constraint: MonotonicConstraint,
        parent_gain: f64,
        left: &[GradStats],
        left_count: usize,
    ) -> Option<Partition> {
        let right_count = node.count.checked_sub(left_count)?;
        if left_count == 0 || right_count == 0 {
            return None;
        }
        let right: Vec<GradStats> = node.sum.iter().zip(left).map(|(p, l)| *p - *l).collect();
        if !self.evaluator.child_is_heavy_enough(left) || !self.evaluator.child_is_heavy_enough(&right) {
            return None;
        }
        let gain = self.evaluator.split_gain(left, &right, node.bounds, constraint)?;
        let loss_change = gain - parent_gain;
        if !loss_change.is_finite() {
            return None;
        }
        Some(Partition {
            loss_change,
            left_sum: left.to_vec(),
            right_sum: right,
            left_count,
            right_count,
        })
    }

    fn missing_stats(&self, node: &NodeContext<'_>, fhist: &FeatureHistogram) -> (Vec<GradStats>, usize) {
        let missing = (0..node.sum.len())
            .map(|target| node.sum[target] - fhist.total(target))
            .collect();
        let missing_count = node.count.saturating_sub(fhist.total_count() as usize);
        (missing, missing_count)
    }

    fn scan_numerical(
        &self,
        node: &NodeContext<'_>,
        fhist: &FeatureHistogram,
        cuts: &HistogramCuts,
        feature: FeatureIndex,
        parent_gain: f64,
    ) -> Option<SplitInfo> {
        let constraint = self.constraints.monotonic(feature);
        let num_targets = node.sum.len();
        let (missing, missing_count) = self.missing_stats(node, fhist);

        let mut acc = vec![GradStats::default(); num_targets];
        let mut acc_count = 0usize;
        let mut best: Best<f32> = None;
        for bin in 0..fhist.num_bins().saturating_sub(1) {
            let count = fhist.count(bin) as usize;
            if count == 0 {
                continue;
            }
            for (target, stats) in acc.iter_mut().enumerate() {
                *stats += fhist.stats(bin, target);
            }
            acc_count += count;

            let threshold = cuts.split_threshold(feature, bin);
            let candidate = self.evaluate_partition(node, constraint, parent_gain, &acc, acc_count);
            consider(&mut best, threshold, false, candidate);
            if missing_count > 0 {
                let left = add_stats(&acc, &missing);
                let candidate =
                    self.evaluate_partition(node, constraint, parent_gain, &left, acc_count + missing_count);
                consider(&mut best, threshold, true, candidate);
            }
        }
        self.consider_missing_alone(&mut best, node, constraint, parent_gain, &missing, missing_count, || {
            cuts.min_value(feature)
        });

        best.map(|(threshold, default_left, partition)| {
            let condition = SplitCondition::Numerical { feature, threshold };
            SplitInfo::from_partition(condition, default_left, partition)
        })
    }

    /// Missing rows alone on the left, every present row on the right.
    ///
    /// Evaluated after the threshold scan so it only wins when strictly
    /// better. `min_value` yields a threshold no present row falls below.
    #[allow(clippy::too_many_arguments)]
    fn consider_missing_alone(
        &self,
        best: &mut Best<f32>,
        node: &NodeContext<'_>,
        constraint: MonotonicConstraint,
        parent_gain: f64,
        missing: &[GradStats],
        missing_count: usize,
        min_value: impl FnOnce() -> f32,
    ) {
        if missing_count == 0 {
            return;
        }
        let candidate = self.evaluate_partition(node, constraint, parent_gain, missing, missing_count);
        if candidate.is_some() {
            consider(best, min_value(), true, candidate);
        }
    }

    fn scan_categorical(
        &self,
        node: &NodeContext<'_>,
        fhist: &FeatureHistogram,
        feature: FeatureIndex,
        parent_gain: f64,
    ) -> Option<SplitInfo> {
        let constraint = MonotonicConstraint::None;
        let num_targets = node.sum.len();
        let (missing, missing_count) = self.missing_stats(node, fhist);
        let mut present: Vec<usize> = (0..fhist.num_bins()).filter(|&c| fhist.count(c) > 0).collect();

        let category_stats = |category: usize| -> Vec<GradStats> {
            (0..num_targets).map(|t| fhist.stats(category, t)).collect()
        };

        if fhist.num_bins() < self.max_cat_to_onehot {
            let mut best: Best<usize> = None;
            for &category in &present {
                let left = category_stats(category);
                let count = fhist.count(category) as usize;
                let candidate = self.evaluate_partition(node, constraint, parent_gain, &left, count);
                consider(&mut best, category, false, candidate);
                if missing_count > 0 {
                    let left = add_stats(&left, &missing);
                    let candidate =
                        self.evaluate_partition(node, constraint, parent_gain, &left, count + missing_count);
                    consider(&mut best, category, true, candidate);
                }
            }
            return best.map(|(category, default_left, partition)| {
                let condition = SplitCondition::Categorical {
                    feature,
                    categories: vec![category as u32],
                };
                SplitInfo::from_partition(condition, default_left, partition)
            });
        }

        let lambda = self.evaluator.reg_lambda;
        let score = |category: usize| -> f64 {
            let (g, h) = (0..num_targets).fold((0.0, 0.0), |(g, h), t| {
                let s = fhist.stats(category, t);
                (g + s.sum_grad, h + s.sum_hess)
            });
            g / (h + lambda)
        };
        present.sort_by(|&a, &b| score(a).total_cmp(&score(b)));

        let mut acc = vec![GradStats::default(); num_targets];
        let mut acc_count = 0usize;
        let mut best: Best<usize> = None;
        for (position, &category) in present.iter().take(self.max_cat_threshold).enumerate() {
            for (target, stats) in acc.iter_mut().enumerate() {
                *stats += fhist.stats(category, target);
            }
            acc_count += fhist.count(category) as usize;

            let candidate = self.evaluate_partition(node, constraint, parent_gain, &acc, acc_count);
            consider(&mut best, position + 1, false, candidate);
            if missing_count > 0 {
                let left = add_stats(&acc, &missing);
                let candidate =
                    self.evaluate_partition(node, constraint, parent_gain, &left, acc_count + missing_count);
                consider(&mut best, position + 1, true, candidate);
            }
        }

        best.map(|(prefix, default_left, partition)| {
            let mut categories: Vec<u32> = present[..prefix].iter().map(|&c| c as u32).collect();
            categories.sort_unstable();
            let condition = SplitCondition::Categorical { feature, categories };
            SplitInfo::from_partition(condition, default_left, partition)
        })
    }

    fn scan_exact(
        &self,
        node: &NodeContext<'_>,
        values: &[f32],
        rows: &[usize],
        gpairs: ArrayView2<'_, GradientPair>,
        feature: FeatureIndex,
        parent_gain: f64,
    ) -> Option<SplitInfo> {
        let constraint = self.constraints.monotonic(feature);
        let num_targets = node.sum.len();

        let mut present = vec![GradStats::default(); num_targets];
        for &row in rows {
            for (target, stats) in present.iter_mut().enumerate() {
                stats.add_pair(gpairs[[row, target]]);
            }
        }
        let missing: Vec<GradStats> = node.sum.iter().zip(&present).map(|(a, b)| *a - *b).collect();
        let missing_count = node.count.saturating_sub(rows.len());

        let mut acc = vec![GradStats::default(); num_targets];
        let mut acc_count = 0usize;
        let mut previous: Option<f32> = None;
        let mut best: Best<f32> = None;
        for &row in rows {
            let value = values[row];
            if let Some(prev) = previous {
                if value > prev && acc_count > 0 {
                    let mid = prev + (value - prev) / 2.0;
                    let threshold = if mid > prev { mid } else { value };
                    let candidate = self.evaluate_partition(node, constraint, parent_gain, &acc, acc_count);
                    consider(&mut best, threshold, false, candidate);
                    if missing_count > 0 {
                        let left = add_stats(&acc, &missing);
                        let candidate = self.evaluate_partition(
                            node,
                            constraint,
                            parent_gain,
                            &left,
                            acc_count + missing_count,
                        );
                        consider(&mut best, threshold, true, candidate);
                    }
                }
            }
            for (target, stats) in acc.iter_mut().enumerate() {
                stats.add_pair(gpairs[[row, target]]);
            }
            acc_count += 1;
            previous = Some(value);
        }
        self.consider_missing_alone(&mut best, node, constraint, parent_gain, &missing, missing_count, || {
            rows.first().map_or(0.0, |&row| values[row])
        });

        best.map(|(threshold, default_left, partition)| {
            let condition = SplitCondition::Numerical { feature, threshold };
            SplitInfo::from_partition(condition, default_left, partition)
        })
    }
}
