//! Regression objectives.

use crate::core::constants::{MIN_HESSIAN, POISSON_MAX_DELTA_STEP};
use crate::core::error::{Result, XGBoostError};
use crate::core::types::GradientPair;
use crate::dataset::MetaInfo;
use crate::objective::{check_label_columns, check_margins, elementwise_gradients, weighted_label_means, ObjectiveFunction};
use ndarray::{Array2, ArrayView2};

/// Squared error, `reg:squarederror`.
#[derive(Debug, Clone)]
pub struct SquaredErrorObjective {
    num_targets: usize,
}

impl SquaredErrorObjective {
    pub fn new(num_targets: usize) -> Self {
        SquaredErrorObjective { num_targets }
    }
}

impl ObjectiveFunction for SquaredErrorObjective {
    fn name(&self) -> &str {
        "reg:squarederror"
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
        elementwise_gradients(margins, info, |p, y, w| GradientPair::new((p - y) * w, w))
    }

    fn default_metric(&self) -> &str {
        "rmse"
    }

    fn init_estimation(&self, info: &MetaInfo) -> Option<Vec<f32>> {
        weighted_label_means(info).map(|means| means.into_iter().map(|m| m as f32).collect())
    }
}

/// Pseudo-Huber loss, `reg:pseudohubererror`.
#[derive(Debug, Clone)]
pub struct PseudoHuberObjective {
    num_targets: usize,
    slope: f32,
}

impl PseudoHuberObjective {
    pub fn new(num_targets: usize, slope: f64) -> Self {
        PseudoHuberObjective {
            num_targets,
            slope: slope as f32,
        }
    }
}

impl ObjectiveFunction for PseudoHuberObjective {
    fn name(&self) -> &str {
        "reg:pseudohubererror"
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
        let slope = self.slope;
        elementwise_gradients(margins, info, |p, y, w| {
            let z = p - y;
            let scale = 1.0 + (z / slope) * (z / slope);
            let scale_sqrt = scale.sqrt();
            GradientPair::new(z / scale_sqrt * w, w / (scale * scale_sqrt))
        })
    }

    fn default_metric(&self) -> &str {
        "mphe"
    }

    fn init_estimation(&self, info: &MetaInfo) -> Option<Vec<f32>> {
        weighted_label_means(info).map(|means| means.into_iter().map(|m| m as f32).collect())
    }

}

/// Poisson regression for counts, `count:poisson`.
#[derive(Debug, Clone)]
pub struct PoissonObjective {
    num_targets: usize,
    max_delta_step: f32,
}

impl PoissonObjective {
    pub fn new(num_targets: usize) -> Self {
        PoissonObjective {
            num_targets,
            max_delta_step: POISSON_MAX_DELTA_STEP as f32,
        }
    }
}

impl ObjectiveFunction for PoissonObjective {
    fn name(&self) -> &str {
        "count:poisson"
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
        let delta = self.max_delta_step;
        elementwise_gradients(margins, info, |p, y, w| {
            GradientPair::new((p.exp() - y) * w, ((p + delta).exp() * w).max(MIN_HESSIAN))
        })
    }

    fn transform_predictions(&self, mut margins: Array2<f32>) -> Array2<f32> {
        margins.mapv_inplace(f32::exp);
        margins
    }

    fn prob_to_margin(&self, base_score: f32) -> f32 {
        base_score.max(f32::MIN_POSITIVE).ln()
    }

    fn default_metric(&self) -> &str {
        "poisson-nloglik"
    }

    fn init_estimation(&self, info: &MetaInfo) -> Option<Vec<f32>> {
        weighted_label_means(info)
            .filter(|means| means.iter().all(|m| *m > 0.0))
            .map(|means| means.into_iter().map(|m| m as f32).collect())
    }

    fn default_max_delta_step(&self) -> f64 {
        POISSON_MAX_DELTA_STEP
    }

    fn validate_labels(&self, info: &MetaInfo) -> Result<()> {
        let labels = info.labels()?;
        if let Some(bad) = labels.iter().find(|y| **y < 0.0) {
            return Err(XGBoostError::invalid_input(format!(
                "count:poisson requires non-negative labels, found {}",
                bad
            )));
        }
        Ok(())
    }

}
