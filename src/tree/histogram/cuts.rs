//! Quantile cuts mapping feature values to histogram bins.
//!
//! For a numeric feature with cuts `c_0 < c_1 < ... < c_{m-1}`, bin `b` holds
//! the values `v` with `c_{b-1} <= v < c_b`; a split after bin `b` is the
//! predicate `v < c_b`. Categorical features get one bin per category code.

use crate::core::types::{BinIndex, FeatureIndex};
use crate::dataset::FeatureMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramCuts {
    /// `cut_ptrs[f]..cut_ptrs[f + 1]` indexes the cuts of feature `f`
    cut_ptrs: Vec<usize>,
    cut_values: Vec<f32>,
    /// Smallest present value of every feature
    min_values: Vec<f32>,
    categorical: Vec<bool>,
}

/// Weighted quantile sketch of one numeric column.
///
/// Returns at most `max_bin` ascending cuts; the last cut lies above the
/// largest observed value.
fn sketch_numeric(column: &[f32], weights: Option<&[f32]>, max_bin: usize) -> Vec<f32> {
    let mut entries: Vec<(f32, f64)> = column
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(row, &v)| (v, weights.map_or(1.0, |w| w[row] as f64)))
        .collect();
    if entries.is_empty() {
        return vec![0.0];
    }
    entries.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut unique: Vec<(f32, f64)> = Vec::with_capacity(entries.len());
    for (value, weight) in entries {
        match unique.last_mut() {
            Some(last) if last.0 == value => last.1 += weight,
            _ => unique.push((value, weight)),
        }
    }

    let max_value = unique[unique.len() - 1].0;
    let upper = max_value + max_value.abs().max(1.0) * 1e-5;

    if unique.len() <= max_bin {
        let mut cuts: Vec<f32> = unique[1..].iter().map(|&(v, _)| v).collect();
        cuts.push(upper);
        return cuts;
    }

    let mut total: f64 = unique.iter().map(|&(_, w)| w).sum();
    let uniform = total <= 0.0;
    if uniform {
        total = unique.len() as f64;
    }
    let step = total / max_bin as f64;
    let mut cuts = Vec::with_capacity(max_bin);
    let mut cumulative = 0.0;
    let mut target = step;
    for i in 1..unique.len() {
        cumulative += if uniform { 1.0 } else { unique[i - 1].1 };
        if cumulative >= target {
            cuts.push(unique[i].0);
            while target <= cumulative {
                target += step;
            }
            if cuts.len() == max_bin - 1 {
                break;
            }
        }
    }
    cuts.push(upper);
    cuts
}

impl HistogramCuts {
    /// Builds cuts for every feature of `matrix`.
    ///
    /// `sketch_weights` weighs each row in the quantile sketch: row weights
    /// for `hist`, Hessians for `approx`. `None` weighs rows equally.
    pub fn build(matrix: &FeatureMatrix, sketch_weights: Option<&[f32]>, max_bin: usize) -> Self {
        let max_bin = max_bin.max(2);
        let per_feature: Vec<(Vec<f32>, f32, bool)> = (0..matrix.num_cols())
            .into_par_iter()
            .map(|feature| {
                if matrix.feature_type(feature).is_categorical() {
                    let n = matrix.num_categories(feature).max(1);
                    ((0..n).map(|c| c as f32).collect(), 0.0, true)
                } else {
                    let column = matrix.column(feature);
                    let min_value = column
                        .iter()
                        .copied()
                        .filter(|v| !v.is_nan())
                        .reduce(f32::min)
                        .unwrap_or(0.0);
                    (sketch_numeric(column, sketch_weights, max_bin), min_value, false)
                }
            })
            .collect();

        let mut cut_ptrs = Vec::with_capacity(per_feature.len() + 1);
        let mut cut_values = Vec::new();
        let mut min_values = Vec::with_capacity(per_feature.len());
        let mut categorical = Vec::with_capacity(per_feature.len());
        cut_ptrs.push(0);
        for (cuts, min_value, is_cat) in per_feature {
            cut_values.extend_from_slice(&cuts);
            cut_ptrs.push(cut_values.len());
            min_values.push(min_value);
            categorical.push(is_cat);
        }

        log::debug!(
            "Built histogram cuts: {} features, {} bins in total",
            categorical.len(),
            cut_values.len()
        );

        HistogramCuts {
            cut_ptrs,
            cut_values,
            min_values,
            categorical,
        }
    }

    pub fn num_features(&self) -> usize {
        self.categorical.len()
    }

    pub fn num_bins(&self, feature: FeatureIndex) -> usize {
        self.cut_ptrs[feature + 1] - self.cut_ptrs[feature]
    }

    pub fn total_bins(&self) -> usize {
        self.cut_values.len()
    }

    pub fn feature_cuts(&self, feature: FeatureIndex) -> &[f32] {
        &self.cut_values[self.cut_ptrs[feature]..self.cut_ptrs[feature + 1]]
    }

    /// Smallest present value of a feature; `v < min_value` holds for no
    /// training row.
    pub fn min_value(&self, feature: FeatureIndex) -> f32 {
        self.min_values[feature]
    }

    pub fn is_categorical(&self, feature: FeatureIndex) -> bool {
        self.categorical[feature]
    }

    /// Bin of a present (non-missing) value.
    #[inline]
    pub fn search_bin(&self, feature: FeatureIndex, value: f32) -> BinIndex {
        let cuts = self.feature_cuts(feature);
        let last = cuts.len().saturating_sub(1);
        if self.categorical[feature] {
            return (value.max(0.0) as usize).min(last) as BinIndex;
        }
        cuts.partition_point(|&c| c <= value).min(last) as BinIndex
    }

    /// Threshold of the split placing bins `0..=bin` on the left.
    pub fn split_threshold(&self, feature: FeatureIndex, bin: usize) -> f32 {
        self.feature_cuts(feature)[bin]
    }
}
