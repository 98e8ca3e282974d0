//! Learning-to-rank objectives.
//!
//! Gradients are accumulated over every pair of rows of one query group
//! whose labels differ. `rank:ndcg` weighs each pair by the change in NDCG
//! obtained by swapping the two rows in the current ranking.

use crate::core::constants::MIN_HESSIAN;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::GradientPair;
use crate::dataset::MetaInfo;
use crate::objective::{check_label_columns, check_margins, sigmoid, ObjectiveFunction};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKind {
    Pairwise,
    Ndcg,
}

/// LambdaMART style ranking objective.
#[derive(Debug, Clone)]
pub struct LambdaRankObjective {
    kind: RankKind,
}

#[inline]
fn gain(label: f32) -> f64 {
    2f64.powf(label as f64) - 1.0
}

#[inline]
fn discount(rank: usize) -> f64 {
    1.0 / ((rank + 2) as f64).log2()
}

impl LambdaRankObjective {
    pub fn new(kind: RankKind) -> Self {
        LambdaRankObjective { kind }
    }

    fn group_gradients(&self, scores: &[f32], labels: &[f32], weights: &[f32]) -> Vec<GradientPair> {
        let n = scores.len();
        let mut out = vec![GradientPair::default(); n];

        let (ranks, idcg) = if self.kind == RankKind::Ndcg {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
            let mut ranks = vec![0; n];
            for (rank, &row) in order.iter().enumerate() {
                ranks[row] = rank;
            }
            let mut ideal: Vec<f32> = labels.to_vec();
            ideal.sort_by(|a, b| b.total_cmp(a));
            let idcg: f64 = ideal.iter().enumerate().map(|(r, &y)| gain(y) * discount(r)).sum();
            (ranks, idcg)
        } else {
            (Vec::new(), 1.0)
        };
        if idcg <= 0.0 {
            return out;
        }

        for i in 0..n {
            for j in 0..n {
                if labels[i] <= labels[j] {
                    continue;
                }
                let delta: f64 = match self.kind {
                    RankKind::Pairwise => 1.0,
                    RankKind::Ndcg => {
                        ((gain(labels[i]) - gain(labels[j])) * (discount(ranks[i]) - discount(ranks[j]))).abs()
                            / idcg
                    }
                };
                let delta = delta as f32;
                let w = 0.5 * (weights[i] + weights[j]) * delta;
                let p = sigmoid(scores[i] - scores[j]);
                let h = (p * (1.0 - p)).max(MIN_HESSIAN) * w;
                out[i].grad += (p - 1.0) * w;
                out[j].grad += (1.0 - p) * w;
                out[i].hess += h;
                out[j].hess += h;
            }
        }
        out
    }
}

impl ObjectiveFunction for LambdaRankObjective {
    fn name(&self) -> &str {
        match self.kind {
            RankKind::Pairwise => "rank:pairwise",
            RankKind::Ndcg => "rank:ndcg",
        }
    }

    fn num_model_outputs(&self) -> usize {
        1
    }

    fn calculate_gradients_hessians(
        &self,
        margins: ArrayView2<'_, f32>,
        info: &MetaInfo,
        _iteration: usize,
    ) -> Result<Array2<GradientPair>> {
        check_margins(&margins, info, 1)?;
        check_label_columns(info, 1)?;
        let labels = info.labels()?;
        let group_ptr = info.group_ptr_or_whole();

        let per_group: Vec<(usize, Vec<GradientPair>)> = group_ptr
            .par_windows(2)
            .map(|bounds| {
                let (start, end) = (bounds[0], bounds[1]);
                let scores: Vec<f32> = (start..end).map(|row| margins[[row, 0]]).collect();
                let group_labels: Vec<f32> = (start..end)
                    .map(|row| labels[[row, 0]])
                    .map(|y| if y.is_nan() { 0.0 } else { y })
                    .collect();
                let weights: Vec<f32> = (start..end).map(|row| info.weight(row)).collect();
                (start, self.group_gradients(&scores, &group_labels, &weights))
            })
            .collect();

        let mut out = Array2::from_elem((info.num_rows(), 1), GradientPair::default());
        for (start, pairs) in per_group {
            for (offset, pair) in pairs.into_iter().enumerate() {
                out[[start + offset, 0]] = pair;
            }
        }
        Ok(out)
    }

    fn default_metric(&self) -> &str {
        match self.kind {
            RankKind::Pairwise => "map",
            RankKind::Ndcg => "ndcg",
        }
    }

    fn validate_labels(&self, info: &MetaInfo) -> Result<()> {
        let labels = info.labels()?;
        if let Some(bad) = labels.iter().find(|y| **y < 0.0) {
            return Err(XGBoostError::invalid_input(format!(
                "ranking labels must be non-negative, found {}",
                bad
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    fn ranking_info() -> MetaInfo {
        MetaInfo {
            n_rows: 5,
            labels: Some(array![2.0, 0.0, 1.0, 1.0, 0.0].insert_axis(Axis(1))),
            group_ptr: Some(vec![0, 3, 5]),
            ..MetaInfo::default()
        }
    }

    #[test]
    fn test_pairwise_pushes_relevant_rows_up() {
        let objective = LambdaRankObjective::new(RankKind::Pairwise);
        let margins = Array2::<f32>::zeros((5, 1));
        let gpairs = objective
            .calculate_gradients_hessians(margins.view(), &ranking_info(), 0)
            .unwrap();
        assert!(gpairs[[0, 0]].grad < 0.0);
        assert!(gpairs[[1, 0]].grad > 0.0);
        assert!(gpairs[[3, 0]].grad < 0.0);
        assert!(gpairs[[4, 0]].grad > 0.0);
        let group_total: f32 = (0..3).map(|row| gpairs[[row, 0]].grad).sum();
        assert!(group_total.abs() < 1e-6);
    }

    #[test]
    fn test_ndcg_skips_groups_without_relevance() {
        let info = MetaInfo {
            n_rows: 3,
            labels: Some(array![0.0, 0.0, 0.0].insert_axis(Axis(1))),
            ..MetaInfo::default()
        };
        let objective = LambdaRankObjective::new(RankKind::Ndcg);
        let gpairs = objective
            .calculate_gradients_hessians(Array2::<f32>::zeros((3, 1)).view(), &info, 0)
            .unwrap();
        assert!(gpairs.iter().all(|p| p.grad == 0.0 && p.hess == 0.0));
    }

    #[test]
    fn test_ndcg_weights_pairs_by_rank_change() {
        let objective = LambdaRankObjective::new(RankKind::Ndcg);
        let margins = array![[0.0], [1.0], [0.5], [0.0], [0.0]];
        let gpairs = objective
            .calculate_gradients_hessians(margins.view(), &ranking_info(), 0)
            .unwrap();
        assert!(gpairs[[0, 0]].grad < 0.0);
        assert!(gpairs[[1, 0]].grad > 0.0);
    }
}
