//! User supplied objective functions.

use crate::core::error::{Result, XGBoostError};
use crate::core::types::GradientPair;
use crate::dataset::MetaInfo;
use crate::objective::{check_margins, ObjectiveFunction};
use ndarray::{Array2, ArrayView2, Zip};
use std::fmt;
use std::sync::Arc;

/// Gradient function: margins and row metadata in, `(grad, hess)` out.
///
/// Both arrays must be `n_rows x n_outputs`.
pub type CustomObjectiveFn =
    Arc<dyn Fn(ArrayView2<'_, f32>, &MetaInfo) -> Result<(Array2<f32>, Array2<f32>)> + Send + Sync>;

/// Objective backed by a user supplied gradient function.
#[derive(Clone)]
pub struct CustomObjective {
    func: CustomObjectiveFn,
    num_outputs: usize,
}

impl fmt::Debug for CustomObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomObjective")
            .field("num_outputs", &self.num_outputs)
            .finish()
    }
}

impl CustomObjective {
    pub fn new<F>(num_outputs: usize, func: F) -> Self
    where
        F: Fn(ArrayView2<'_, f32>, &MetaInfo) -> Result<(Array2<f32>, Array2<f32>)> + Send + Sync + 'static,
    {
        CustomObjective {
            func: Arc::new(func),
            num_outputs: num_outputs.max(1),
        }
    }

    pub fn from_arc(num_outputs: usize, func: CustomObjectiveFn) -> Self {
        CustomObjective {
            func,
            num_outputs: num_outputs.max(1),
        }
    }

    /// Placeholder for a loaded model trained with a custom objective: the
    /// gradient function itself is never stored, so computing gradients fails.
    pub fn detached(num_outputs: usize) -> Self {
        CustomObjective::new(num_outputs, |_, _| {
            Err(XGBoostError::custom(
                "the custom objective is not stored in the model; supply it again to continue training",
            ))
        })
    }
}

impl ObjectiveFunction for CustomObjective {
    fn name(&self) -> &str {
        "custom"
    }

    fn num_model_outputs(&self) -> usize {
        self.num_outputs
    }

    fn calculate_gradients_hessians(
        &self,
        margins: ArrayView2<'_, f32>,
        info: &MetaInfo,
        _iteration: usize,
    ) -> Result<Array2<GradientPair>> {
        check_margins(&margins, info, self.num_outputs)?;
        let (grad, hess) = (self.func)(margins, info)?;
        let expected = (info.num_rows(), self.num_outputs);
        for (what, array) in [("gradient", &grad), ("hessian", &hess)] {
            if array.dim() != expected {
                return Err(XGBoostError::shape(
                    format!("{} of shape {:?}", what, expected),
                    format!("{} of shape {:?}", what, array.dim()),
                ));
            }
        }
        let mut out = Array2::from_elem(expected, GradientPair::default());
        Zip::from(&mut out)
            .and(&grad)
            .and(&hess)
            .for_each(|pair, &g, &h| *pair = GradientPair::new(g, h));
        Ok(out)
    }

    fn default_metric(&self) -> &str {
        "rmse"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    fn info() -> MetaInfo {
        MetaInfo {
            n_rows: 2,
            labels: Some(array![1.0, 2.0].insert_axis(Axis(1))),
            ..MetaInfo::default()
        }
    }

    #[test]
    fn test_custom_objective_gradients() {
        let objective = CustomObjective::new(1, |margins, info| {
            let labels = info.labels()?;
            let grad = &margins - &labels;
            let hess = Array2::ones(margins.dim());
            Ok((grad, hess))
        });
        let gpairs = objective
            .calculate_gradients_hessians(array![[0.0], [0.0]].view(), &info(), 0)
            .unwrap();
        assert_eq!(gpairs[[1, 0]], GradientPair::new(-2.0, 1.0));
    }

    #[test]
    fn test_custom_objective_shape_mismatch() {
        let objective = CustomObjective::new(1, |margins, _| {
            Ok((Array2::zeros((margins.nrows(), 2)), Array2::zeros((margins.nrows(), 2))))
        });
        let err = objective
            .calculate_gradients_hessians(array![[0.0], [0.0]].view(), &info(), 0)
            .unwrap_err();
        assert!(matches!(err, XGBoostError::Shape { .. }));
    }

    #[test]
    fn test_custom_objective_error_propagates() {
        let objective = CustomObjective::new(1, |_, _| Err(XGBoostError::custom("objective failed")));
        let err = objective
            .calculate_gradients_hessians(array![[0.0], [0.0]].view(), &info(), 0)
            .unwrap_err();
        assert!(matches!(err, XGBoostError::CustomFunction { .. }));
    }
}
