//! Objective functions for the Pure Rust XGBoost framework.
//!
//! An objective turns the current margins and the labels into per-row
//! gradient pairs, and maps margins to the output space (the link
//! function). Built-in objectives are selected by name through
//! [`create_objective_function`]; a user supplied gradient function is
//! wrapped by [`CustomObjective`].

pub mod classification;
pub mod custom;
pub mod ranking;
pub mod regression;

pub use classification::{HingeObjective, LogisticKind, LogisticObjective, SoftmaxObjective};
pub use custom::{CustomObjective, CustomObjectiveFn};
pub use ranking::{LambdaRankObjective, RankKind};
pub use regression::{PoissonObjective, PseudoHuberObjective, SquaredErrorObjective};

use crate::config::Config;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::GradientPair;
use crate::dataset::MetaInfo;
use ndarray::{Array2, ArrayView2};
use std::fmt::Debug;

/// Objective function trait for pluggable objective functions
pub trait ObjectiveFunction: Send + Sync + Debug {
    /// Name as written in the model file, e.g. `binary:logistic`
    fn name(&self) -> &str;

    /// Number of margin columns the model produces
    fn num_model_outputs(&self) -> usize;

    /// Gradient pairs (`n_rows x num_model_outputs`) at the current margins.
    fn calculate_gradients_hessians(
        &self,
        margins: ArrayView2<'_, f32>,
        info: &MetaInfo,
        iteration: usize,
    ) -> Result<Array2<GradientPair>>;

    /// Maps margins to the prediction output space.
    fn transform_predictions(&self, margins: Array2<f32>) -> Array2<f32> {
        margins
    }

    /// Maps margins to the space metrics are computed in.
    fn eval_transform(&self, margins: Array2<f32>) -> Array2<f32> {
        self.transform_predictions(margins)
    }

    /// Converts a base score from output space to margin space.
    fn prob_to_margin(&self, base_score: f32) -> f32 {
        base_score
    }

    /// Margin of every output's base score.
    fn base_margins(&self, base_score: &[f32]) -> Vec<f32> {
        base_score.iter().map(|&score| self.prob_to_margin(score)).collect()
    }

    /// Metric evaluated when no metric is configured
    fn default_metric(&self) -> &str;

    /// Intercept of every output estimated from the labels, in output space.
    fn init_estimation(&self, _info: &MetaInfo) -> Option<Vec<f32>> {
        None
    }

    /// Step clipping the objective requires when none is configured.
    fn default_max_delta_step(&self) -> f64 {
        0.0
    }

    /// Checks the labels before any tree is grown.
    fn validate_labels(&self, _info: &MetaInfo) -> Result<()> {
        Ok(())
    }
}

/// Creates the built-in objective named by `config.objective`.
///
/// `num_targets` is the number of label columns of the training data.
pub fn create_objective_function(config: &Config, num_targets: usize) -> Result<Box<dyn ObjectiveFunction>> {
    let num_targets = num_targets.max(1);
    let objective: Box<dyn ObjectiveFunction> = match config.objective.as_str() {
        "reg:squarederror" => Box::new(SquaredErrorObjective::new(num_targets)),
        "reg:pseudohubererror" => Box::new(PseudoHuberObjective::new(num_targets, config.huber_slope)),
        "count:poisson" => Box::new(PoissonObjective::new(num_targets)),
        "reg:logistic" => Box::new(LogisticObjective::new(
            LogisticKind::Regression,
            num_targets,
            config.scale_pos_weight,
        )),
        "binary:logistic" => Box::new(LogisticObjective::new(
            LogisticKind::Binary,
            num_targets,
            config.scale_pos_weight,
        )),
        "binary:logitraw" => Box::new(LogisticObjective::new(
            LogisticKind::Raw,
            num_targets,
            config.scale_pos_weight,
        )),
        "binary:hinge" => Box::new(HingeObjective::new(num_targets)),
        "multi:softmax" => Box::new(SoftmaxObjective::new(config.num_class, false)?),
        "multi:softprob" => Box::new(SoftmaxObjective::new(config.num_class, true)?),
        "rank:pairwise" => Box::new(LambdaRankObjective::new(RankKind::Pairwise)),
        "rank:ndcg" => Box::new(LambdaRankObjective::new(RankKind::Ndcg)),
        other => {
            return Err(XGBoostError::invalid_parameter(
                "objective",
                other,
                "unknown objective function",
            ))
        }
    };
    log::debug!(
        "Created objective {} with {} outputs",
        objective.name(),
        objective.num_model_outputs()
    );
    Ok(objective)
}

/// Names accepted by [`create_objective_function`].
pub fn builtin_objective_names() -> &'static [&'static str] {
    &[
        "reg:squarederror",
        "reg:logistic",
        "reg:pseudohubererror",
        "count:poisson",
        "binary:logistic",
        "binary:logitraw",
        "binary:hinge",
        "multi:softmax",
        "multi:softprob",
        "rank:pairwise",
        "rank:ndcg",
    ]
}

#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Checks that margins are `n_rows x outputs`.
pub(crate) fn check_margins(margins: &ArrayView2<'_, f32>, info: &MetaInfo, outputs: usize) -> Result<()> {
    if margins.nrows() != info.num_rows() || margins.ncols() != outputs {
        return Err(XGBoostError::shape(
            format!("({}, {})", info.num_rows(), outputs),
            format!("({}, {})", margins.nrows(), margins.ncols()),
        ));
    }
    Ok(())
}

/// Checks that the labels have `expected` columns.
pub(crate) fn check_label_columns(info: &MetaInfo, expected: usize) -> Result<()> {
    let labels = info.labels()?;
    if labels.ncols() != expected {
        return Err(XGBoostError::shape(
            format!("labels with {} columns", expected),
            format!("labels with {} columns", labels.ncols()),
        ));
    }
    Ok(())
}

/// Weighted mean of the present labels of every label column.
///
/// `None` when some column carries no weight.
pub(crate) fn weighted_label_means(info: &MetaInfo) -> Option<Vec<f64>> {
    let labels = info.labels().ok()?;
    let mut sums = vec![0.0f64; labels.ncols()];
    let mut weight_sums = vec![0.0f64; labels.ncols()];
    for (row, values) in labels.outer_iter().enumerate() {
        let w = info.weight(row) as f64;
        for (col, &y) in values.iter().enumerate().filter(|(_, y)| !y.is_nan()) {
            sums[col] += w * y as f64;
            weight_sums[col] += w;
        }
    }
    sums.iter()
        .zip(&weight_sums)
        .map(|(&sum, &weight)| (weight > 0.0).then(|| sum / weight))
        .collect()
}

/// Applies `f(margin, label, weight)` elementwise; unset labels get a zero pair.
pub(crate) fn elementwise_gradients<F>(
    margins: ArrayView2<'_, f32>,
    info: &MetaInfo,
    f: F,
) -> Result<Array2<GradientPair>>
where
    F: Fn(f32, f32, f32) -> GradientPair,
{
    let labels = info.labels()?;
    let mut out = Array2::from_elem(margins.dim(), GradientPair::default());
    for ((row, col), pair) in out.indexed_iter_mut() {
        let label = labels[[row, col]];
        if label.is_nan() {
            continue;
        }
        *pair = f(margins[[row, col]], label, info.weight(row));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_objective_factory() {
        for name in builtin_objective_names() {
            let mut builder = ConfigBuilder::new().objective(*name);
            if name.starts_with("multi:") {
                builder = builder.num_class(3);
            }
            let config = builder.build().unwrap();
            let objective = create_objective_function(&config, 1).unwrap();
            assert_eq!(objective.name(), *name);
        }

        let mut config = Config::default();
        config.objective = "reg:nope".to_string();
        let err = create_objective_function(&config, 1).unwrap_err();
        assert!(matches!(err, XGBoostError::InvalidParameter { .. }));
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.9999);
        assert!(sigmoid(-10.0) < 1e-4);
    }

    #[test]
    fn test_multi_target_outputs() {
        let config = ConfigBuilder::new().objective("binary:logistic").build().unwrap();
        let objective = create_objective_function(&config, 3).unwrap();
        assert_eq!(objective.num_model_outputs(), 3);
    }
}
