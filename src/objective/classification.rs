//! Binary and multiclass classification objectives.

use crate::core::constants::MIN_HESSIAN;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::GradientPair;
use crate::dataset::MetaInfo;
use crate::objective::{
    check_label_columns, check_margins, elementwise_gradients, sigmoid, weighted_label_means, ObjectiveFunction,
};
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};

/// Flavours of the logistic loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogisticKind {
    /// `reg:logistic`, probabilities evaluated with rmse
    Regression,
    /// `binary:logistic`, probabilities evaluated with logloss
    Binary,
    /// `binary:logitraw`, margins are returned untransformed
    Raw,
}

/// Logistic loss over one or more independent binary targets.
#[derive(Debug, Clone)]
pub struct LogisticObjective {
    kind: LogisticKind,
    num_targets: usize,
    scale_pos_weight: f32,
}

impl LogisticObjective {
    pub fn new(kind: LogisticKind, num_targets: usize, scale_pos_weight: f64) -> Self {
        LogisticObjective {
            kind,
            num_targets,
            scale_pos_weight: scale_pos_weight as f32,
        }
    }
}

fn validate_unit_labels(info: &MetaInfo, objective: &str) -> Result<()> {
    let labels = info.labels()?;
    if let Some(bad) = labels.iter().find(|y| !y.is_nan() && (**y < 0.0 || **y > 1.0)) {
        return Err(XGBoostError::invalid_input(format!(
            "label must be in [0,1] for {}, found {}",
            objective, bad
        )));
    }
    Ok(())
}

impl ObjectiveFunction for LogisticObjective {
    fn name(&self) -> &str {
        match self.kind {
            LogisticKind::Regression => "reg:logistic",
            LogisticKind::Binary => "binary:logistic",
            LogisticKind::Raw => "binary:logitraw",
        }
    }

    fn num_model_outputs(&self) -> usize {
        self.num_targets
    }

    fn calculate_gradients_hessians(
        &self,
        margins: ArrayView2<'_, f32>,
        info: &MetaInfo,
        _iteration: usize,
    ) -> Result<Array2<GradientPair>> {
        check_margins(&margins, info, self.num_targets)?;
        check_label_columns(info, self.num_targets)?;
        let scale_pos_weight = self.scale_pos_weight;
        elementwise_gradients(margins, info, |m, y, w| {
            let w = if y == 1.0 { w * scale_pos_weight } else { w };
            let p = sigmoid(m);
            GradientPair::new((p - y) * w, (p * (1.0 - p)).max(MIN_HESSIAN) * w)
        })
    }

    fn transform_predictions(&self, mut margins: Array2<f32>) -> Array2<f32> {
        if self.kind != LogisticKind::Raw {
            margins.mapv_inplace(sigmoid);
        }
        margins
    }

    fn prob_to_margin(&self, base_score: f32) -> f32 {
        let p = base_score.clamp(1e-7, 1.0 - 1e-7);
        -(1.0 / p - 1.0).ln()
    }

    fn default_metric(&self) -> &str {
        match self.kind {
            LogisticKind::Regression => "rmse",
            LogisticKind::Binary => "logloss",
            LogisticKind::Raw => "auc",
        }
    }

    fn init_estimation(&self, info: &MetaInfo) -> Option<Vec<f32>> {
        weighted_label_means(info).map(|means| {
            means
                .into_iter()
                .map(|m| m.clamp(1e-6, 1.0 - 1e-6) as f32)
                .collect()
        })
    }

    fn validate_labels(&self, info: &MetaInfo) -> Result<()> {
        validate_unit_labels(info, self.name())
    }

}

/// Hinge loss, `binary:hinge`; predictions are hard 0/1 labels.
#[derive(Debug, Clone)]
pub struct HingeObjective {
    num_targets: usize,
}

impl HingeObjective {
    pub fn new(num_targets: usize) -> Self {
        HingeObjective { num_targets }
    }
}

impl ObjectiveFunction for HingeObjective {
    fn name(&self) -> &str {
        "binary:hinge"
    }

    fn num_model_outputs(&self) -> usize {
        self.num_targets
    }

    fn calculate_gradients_hessians(
        &self,
        margins: ArrayView2<'_, f32>,
        info: &MetaInfo,
        _iteration: usize,
    ) -> Result<Array2<GradientPair>> {
        check_margins(&margins, info, self.num_targets)?;
        check_label_columns(info, self.num_targets)?;
        elementwise_gradients(margins, info, |m, y, w| {
            let sign = 2.0 * y - 1.0;
            if m * sign < 1.0 {
                GradientPair::new(-sign * w, w)
            } else {
                GradientPair::new(0.0, MIN_HESSIAN)
            }
        })
    }

    fn transform_predictions(&self, mut margins: Array2<f32>) -> Array2<f32> {
        margins.mapv_inplace(|m| if m > 0.0 { 1.0 } else { 0.0 });
        margins
    }

    fn default_metric(&self) -> &str {
        "error"
    }

    fn validate_labels(&self, info: &MetaInfo) -> Result<()> {
        validate_unit_labels(info, self.name())
    }
}

/// Softmax over `num_class` margins, `multi:softmax` and `multi:softprob`.
#[derive(Debug, Clone)]
pub struct SoftmaxObjective {
    num_class: usize,
    output_prob: bool,
}

fn softmax_inplace(mut row: ArrayViewMut1<'_, f32>) {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    row.mapv_inplace(|m| (m - max).exp());
    let sum: f32 = row.sum();
    row.mapv_inplace(|e| e / sum);
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

impl SoftmaxObjective {
    pub fn new(num_class: usize, output_prob: bool) -> Result<Self> {
        if num_class < 2 {
            return Err(XGBoostError::invalid_parameter(
                "num_class",
                num_class.to_string(),
                "multiclass objectives need at least 2 classes",
            ));
        }
        Ok(SoftmaxObjective {
            num_class,
            output_prob,
        })
    }

    fn class_of(&self, label: f32) -> Result<usize> {
        if label < 0.0 || label.fract() != 0.0 || label as usize >= self.num_class {
            return Err(XGBoostError::invalid_input(format!(
                "label must be an integer in [0, {}), found {}",
                self.num_class, label
            )));
        }
        Ok(label as usize)
    }
}

impl ObjectiveFunction for SoftmaxObjective {
    fn name(&self) -> &str {
        if self.output_prob {
            "multi:softprob"
        } else {
            "multi:softmax"
        }
    }

    fn num_model_outputs(&self) -> usize {
        self.num_class
    }

    fn calculate_gradients_hessians(
        &self,
        margins: ArrayView2<'_, f32>,
        info: &MetaInfo,
        _iteration: usize,
    ) -> Result<Array2<GradientPair>> {
        check_margins(&margins, info, self.num_class)?;
        check_label_columns(info, 1)?;
        let labels = info.labels()?;
        let mut out = Array2::from_elem(margins.dim(), GradientPair::default());
        let mut prob = margins.to_owned();
        for (row, (mut probs, mut pairs)) in prob
            .axis_iter_mut(Axis(0))
            .zip(out.axis_iter_mut(Axis(0)))
            .enumerate()
        {
            let label = labels[[row, 0]];
            if label.is_nan() {
                continue;
            }
            let class = self.class_of(label)?;
            let w = info.weight(row);
            softmax_inplace(probs.view_mut());
            for (k, pair) in pairs.iter_mut().enumerate() {
                let p = probs[k];
                let target = if k == class { 1.0 } else { 0.0 };
                *pair = GradientPair::new((p - target) * w, (2.0 * p * (1.0 - p)).max(MIN_HESSIAN) * w);
            }
        }
        Ok(out)
    }

    fn transform_predictions(&self, margins: Array2<f32>) -> Array2<f32> {
        if self.output_prob {
            return self.eval_transform(margins);
        }
        Array2::from_shape_fn((margins.nrows(), 1), |(row, _)| argmax(margins.row(row)) as f32)
    }

    fn eval_transform(&self, mut margins: Array2<f32>) -> Array2<f32> {
        for row in margins.axis_iter_mut(Axis(0)) {
            softmax_inplace(row);
        }
        margins
    }

    fn default_metric(&self) -> &str {
        "mlogloss"
    }

    fn validate_labels(&self, info: &MetaInfo) -> Result<()> {
        check_label_columns(info, 1)?;
        for &label in info.labels()?.iter().filter(|y| !y.is_nan()) {
            self.class_of(label)?;
        }
        Ok(())
    }

}
