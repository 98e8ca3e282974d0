//! Ranking metrics, averaged over query groups.

use crate::core::error::{Result, XGBoostError};
use crate::dataset::MetaInfo;
use crate::metrics::{Metric, MetricDirection};
use ndarray::ArrayView2;
use rayon::prelude::*;

/// Rows of one group ordered by descending score, ties by row order.
fn ranked(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

fn dcg<I: Iterator<Item = f32>>(labels: I, k: usize) -> f64 {
    labels
        .take(k)
        .enumerate()
        .map(|(i, y)| (2f64.powf(y as f64) - 1.0) / ((i + 2) as f64).log2())
        .sum()
}

/// Unweighted mean over groups of `score(preds, labels)`.
fn mean_over_groups<F>(predictions: ArrayView2<'_, f32>, info: &MetaInfo, score: F) -> Result<f64>
where
    F: Fn(&[f32], &[f32]) -> f64 + Sync,
{
    let labels = info.labels()?;
    if predictions.ncols() != 1 || labels.ncols() != 1 || labels.nrows() != predictions.nrows() {
        return Err(XGBoostError::shape(
            format!("({}, 1) predictions and labels", labels.nrows()),
            format!("{:?} predictions, {:?} labels", predictions.dim(), labels.dim()),
        ));
    }
    let group_ptr = info.group_ptr_or_whole();
    let scores: Vec<f64> = group_ptr
        .par_windows(2)
        .map(|bounds| {
            let preds: Vec<f32> = (bounds[0]..bounds[1]).map(|r| predictions[[r, 0]]).collect();
            let rels: Vec<f32> = (bounds[0]..bounds[1])
                .map(|r| labels[[r, 0]])
                .map(|y| if y.is_nan() { 0.0 } else { y })
                .collect();
            score(&preds, &rels)
        })
        .collect();
    if scores.is_empty() {
        return Ok(0.0);
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

fn metric_name(base: &str, k: Option<usize>) -> String {
    match k {
        Some(k) => format!("{}@{}", base, k),
        None => base.to_string(),
    }
}

/// Normalized discounted cumulative gain, `ndcg` / `ndcg@k`.
///
/// Groups without any relevant row score 1.
#[derive(Debug, Clone)]
pub struct NdcgMetric {
    k: Option<usize>,
    name: String,
}

impl NdcgMetric {
    pub fn new(k: Option<usize>) -> Self {
        NdcgMetric {
            k,
            name: metric_name("ndcg", k),
        }
    }
}

impl Metric for NdcgMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> MetricDirection {
        MetricDirection::Maximize
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let k = self.k.unwrap_or(usize::MAX);
        mean_over_groups(predictions, info, |preds, rels| {
            let mut ideal = rels.to_vec();
            ideal.sort_by(|a, b| b.total_cmp(a));
            let idcg = dcg(ideal.into_iter(), k);
            if idcg <= 0.0 {
                return 1.0;
            }
            dcg(ranked(preds).into_iter().map(|r| rels[r]), k) / idcg
        })
    }
}

/// Mean average precision, `map` / `map@k`. Rows with a positive label are
/// relevant; groups without a relevant row score 1.
#[derive(Debug, Clone)]
pub struct MapMetric {
    k: Option<usize>,
    name: String,
}

impl MapMetric {
    pub fn new(k: Option<usize>) -> Self {
        MapMetric {
            k,
            name: metric_name("map", k),
        }
    }
}

impl Metric for MapMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> MetricDirection {
        MetricDirection::Maximize
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let k = self.k.unwrap_or(usize::MAX);
        mean_over_groups(predictions, info, |preds, rels| {
            let mut hits = 0usize;
            let mut sum_precision = 0.0;
            for (position, row) in ranked(preds).into_iter().enumerate() {
                if rels[row] > 0.0 {
                    hits += 1;
                    if position < k {
                        sum_precision += hits as f64 / (position + 1) as f64;
                    }
                }
            }
            if hits == 0 {
                1.0
            } else {
                sum_precision / hits as f64
            }
        })
    }
}
