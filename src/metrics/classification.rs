//! Classification metrics.

use crate::core::error::{Result, XGBoostError};
use crate::dataset::MetaInfo;
use crate::metrics::{weighted_elementwise, Metric, MetricDirection};
use ndarray::{ArrayView1, ArrayView2, Axis};

const PROB_EPS: f64 = 1e-16;

/// Binary cross entropy on probabilities, `logloss`.
#[derive(Debug, Clone, Copy)]
pub struct LogLossMetric;

impl Metric for LogLossMetric {
    fn name(&self) -> &str {
        "logloss"
    }

    fn direction(&self) -> MetricDirection {
        MetricDirection::Minimize
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let (sum, weight_sum) = weighted_elementwise(predictions, info, |p, y| {
            let p = p.clamp(PROB_EPS, 1.0 - PROB_EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })?;
        Ok(if weight_sum > 0.0 { sum / weight_sum } else { 0.0 })
    }
}

/// Binary error rate at a probability threshold, `error` / `error@t`.
#[derive(Debug, Clone)]
pub struct BinaryErrorMetric {
    threshold: f64,
    name: String,
}

impl BinaryErrorMetric {
    pub fn new(threshold: f64, name: Option<&str>) -> Self {
        BinaryErrorMetric {
            threshold,
            name: name.unwrap_or("error").to_string(),
        }
    }
}

impl Metric for BinaryErrorMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> MetricDirection {
        MetricDirection::Minimize
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let threshold = self.threshold;
        let (sum, weight_sum) = weighted_elementwise(predictions, info, |p, y| {
            let predicted = if p > threshold { 1.0 } else { 0.0 };
            if predicted != y {
                1.0
            } else {
                0.0
            }
        })?;
        Ok(if weight_sum > 0.0 { sum / weight_sum } else { 0.0 })
    }
}

fn class_label(label: f32, num_class: usize) -> Result<usize> {
    if label < 0.0 || label.fract() != 0.0 || label as usize >= num_class {
        return Err(XGBoostError::invalid_input(format!(
            "label must be an integer in [0, {}), found {}",
            num_class, label
        )));
    }
    Ok(label as usize)
}

fn argmax(row: ArrayView1<'_, f32>) -> usize {
    let mut best = 0;
    for (k, &value) in row.iter().enumerate() {
        if value > row[best] {
            best = k;
        }
    }
    best
}

/// Checks single-column labels against `n_rows` prediction rows.
fn single_labels<'a>(predictions: &ArrayView2<'_, f32>, info: &'a MetaInfo) -> Result<ArrayView1<'a, f32>> {
    let labels = info.labels()?;
    if labels.ncols() != 1 || labels.nrows() != predictions.nrows() {
        return Err(XGBoostError::shape(
            format!("({}, 1) labels", predictions.nrows()),
            format!("{:?} labels", labels.dim()),
        ));
    }
    Ok(labels.index_axis_move(Axis(1), 0))
}

/// Multiclass error rate, `merror`.
///
/// Predictions are either class probabilities (`n_rows x n_class`) or a
/// single column of predicted class indices.
#[derive(Debug, Clone, Copy)]
pub struct MultiErrorMetric;

impl Metric for MultiErrorMetric {
    fn name(&self) -> &str {
        "merror"
    }

    fn direction(&self) -> MetricDirection {
        MetricDirection::Minimize
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let labels = single_labels(&predictions, info)?;
        let mut sum = 0.0;
        let mut weight_sum = 0.0;
        for (row, pred) in predictions.outer_iter().enumerate() {
            let w = info.weight(row) as f64;
            let predicted = if pred.len() == 1 { pred[0] as usize } else { argmax(pred) };
            if predicted as f32 != labels[row] {
                sum += w;
            }
            weight_sum += w;
        }
        Ok(if weight_sum > 0.0 { sum / weight_sum } else { 0.0 })
    }
}

/// Multiclass cross entropy, `mlogloss`.
#[derive(Debug, Clone, Copy)]
pub struct MultiLogLossMetric;

impl Metric for MultiLogLossMetric {
    fn name(&self) -> &str {
        "mlogloss"
    }

    fn direction(&self) -> MetricDirection {
        MetricDirection::Minimize
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let labels = single_labels(&predictions, info)?;
        let num_class = predictions.ncols();
        let mut sum = 0.0;
        let mut weight_sum = 0.0;
        for (row, pred) in predictions.outer_iter().enumerate() {
            let class = class_label(labels[row], num_class)?;
            let w = info.weight(row) as f64;
            sum -= w * (pred[class] as f64).max(PROB_EPS).ln();
            weight_sum += w;
        }
        Ok(if weight_sum > 0.0 { sum / weight_sum } else { 0.0 })
    }
}

/// Area under the ROC curve, `auc`.
///
/// Binary for single-column predictions; one-vs-rest weighted by class
/// prevalence for class probabilities.
#[derive(Debug, Clone, Copy)]
pub struct AucMetric;

/// Weighted binary AUC; tied scores contribute half.
///
/// Returns `None` when one of the classes is absent.
pub(crate) fn binary_auc(scores: &[f32], positive: &[bool], weights: &[f32]) -> Option<f64> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut area = 0.0;
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut block_tp = 0.0;
        let mut block_fp = 0.0;
        let score = scores[order[i]];
        while i < order.len() && scores[order[i]] == score {
            let row = order[i];
            if positive[row] {
                block_tp += weights[row] as f64;
            } else {
                block_fp += weights[row] as f64;
            }
            i += 1;
        }
        area += block_fp * (tp + 0.5 * block_tp);
        tp += block_tp;
        fp += block_fp;
    }
    if tp <= 0.0 || fp <= 0.0 {
        return None;
    }
    Some(area / (tp * fp))
}

impl Metric for AucMetric {
    fn name(&self) -> &str {
        "auc"
    }

    fn direction(&self) -> MetricDirection {
        MetricDirection::Maximize
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let labels = single_labels(&predictions, info)?;
        let rows: Vec<usize> = (0..labels.len()).filter(|&r| !labels[r].is_nan()).collect();
        let weights: Vec<f32> = rows.iter().map(|&r| info.weight(r)).collect();

        if predictions.ncols() == 1 {
            let scores: Vec<f32> = rows.iter().map(|&r| predictions[[r, 0]]).collect();
            let positive: Vec<bool> = rows.iter().map(|&r| labels[r] > 0.5).collect();
            return Ok(binary_auc(&scores, &positive, &weights).unwrap_or_else(|| {
                log::warn!("auc is undefined when only one class is present; reporting 0.5");
                0.5
            }));
        }

        let mut total = 0.0;
        let mut total_weight = 0.0;
        for class in 0..predictions.ncols() {
            let scores: Vec<f32> = rows.iter().map(|&r| predictions[[r, class]]).collect();
            let positive: Vec<bool> = rows.iter().map(|&r| labels[r] as usize == class).collect();
            let class_weight: f64 = positive
                .iter()
                .zip(&weights)
                .filter(|(p, _)| **p)
                .map(|(_, w)| *w as f64)
                .sum();
            if let Some(auc) = binary_auc(&scores, &positive, &weights) {
                total += auc * class_weight;
                total_weight += class_weight;
            }
        }
        Ok(if total_weight > 0.0 { total / total_weight } else { 0.5 })
    }
}
