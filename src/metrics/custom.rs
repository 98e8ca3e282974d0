//! User supplied evaluation metric.

use crate::core::error::{Result, XGBoostError};
use crate::dataset::MetaInfo;
use crate::metrics::{Metric, MetricDirection};
use ndarray::{ArrayView1, ArrayView2};
use std::fmt;
use std::sync::Arc;

/// Score function: `(labels, predictions, weights) -> score`.
///
/// Labels and predictions are `n_rows x n_columns`; predictions are in the
/// objective's evaluation space.
pub type CustomMetricFn = Arc<
    dyn Fn(ArrayView2<'_, f32>, ArrayView2<'_, f32>, Option<ArrayView1<'_, f32>>) -> Result<f64> + Send + Sync,
>;

#[derive(Clone)]
pub struct CustomMetric {
    name: String,
    direction: MetricDirection,
    func: CustomMetricFn,
}

impl fmt::Debug for CustomMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomMetric")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .finish()
    }
}

impl CustomMetric {
    pub fn new<S, F>(name: S, direction: MetricDirection, func: F) -> Self
    where
        S: Into<String>,
        F: Fn(ArrayView2<'_, f32>, ArrayView2<'_, f32>, Option<ArrayView1<'_, f32>>) -> Result<f64>
            + Send
            + Sync
            + 'static,
    {
        CustomMetric {
            name: name.into(),
            direction,
            func: Arc::new(func),
        }
    }
}

impl Metric for CustomMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> MetricDirection {
        self.direction
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let labels = info.labels()?;
        let score = (self.func)(labels, predictions, info.weights().map(|w| w.view()))?;
        if score.is_nan() {
            return Err(XGBoostError::custom(format!("metric {} returned NaN", self.name)));
        }
        Ok(score)
    }
}
