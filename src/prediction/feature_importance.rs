//! Feature importance from split statistics.

use crate::boosting::ensemble::TreeEnsemble;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::ImportanceType;

/// Raw importance per feature index.
///
/// `weight` counts splits, `total_gain`/`total_cover` sum the loss change or
/// Hessian of the split nodes and `gain`/`cover` average them over the
/// splits using the feature. Features never used score 0.
pub fn compute_importance(ensemble: &TreeEnsemble, num_features: usize, kind: ImportanceType) -> Result<Vec<f64>> {
    if kind.needs_split_stats() && ensemble.trees().iter().any(|t| t.is_vector_leaf()) {
        let family = match kind {
            ImportanceType::Gain | ImportanceType::TotalGain => "gain/total_gain",
            _ => "cover/total_cover",
        };
        return Err(XGBoostError::unsupported(format!(
            "feature importance {} is not supported for trees with vector leaves",
            family
        )));
    }

    let mut counts = vec![0usize; num_features];
    let mut totals = vec![0.0f64; num_features];
    for tree in ensemble.trees() {
        for node in tree.split_nodes() {
            let Some(feature) = node.split_feature() else {
                continue;
            };
            if feature >= num_features {
                return Err(XGBoostError::index_out_of_bounds(feature, num_features));
            }
            counts[feature] += 1;
            totals[feature] += match kind {
                ImportanceType::Weight => 1.0,
                ImportanceType::Gain | ImportanceType::TotalGain => node.loss_change() as f64,
                ImportanceType::Cover | ImportanceType::TotalCover => node.sum_hessian() as f64,
            };
        }
    }

    Ok(match kind {
        ImportanceType::Gain | ImportanceType::Cover => totals
            .iter()
            .zip(&counts)
            .map(|(&t, &c)| if c > 0 { t / c as f64 } else { 0.0 })
            .collect(),
        _ => totals,
    })
}

/// Scales scores to sum to one; all-zero scores stay zero.
pub fn normalize(scores: &[f64]) -> Vec<f32> {
    let total: f64 = scores.iter().sum();
    if total <= 0.0 {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|&s| (s / total) as f32).collect()
}
