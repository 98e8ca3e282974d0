//! Tree traversal for the Pure Rust XGBoost framework.
//!
//! The predictor walks every selected tree for every row and adds the
//! reached leaf weights to the row's margins. Rows are processed in
//! parallel; within a row trees are summed in ensemble order so results do
//! not depend on the number of threads.

use crate::boosting::ensemble::TreeEnsemble;
use crate::core::error::{Result, XGBoostError};
use crate::dataset::FeatureMatrix;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use std::ops::Range;

/// Half-open range of boosting rounds `[begin, end)`; `(0, 0)` selects all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationRange {
    pub begin: usize,
    pub end: usize,
}

impl IterationRange {
    pub fn new(begin: usize, end: usize) -> Self {
        IterationRange { begin, end }
    }

    pub fn all() -> Self {
        IterationRange::default()
    }

    pub fn is_all(&self) -> bool {
        self.begin == 0 && self.end == 0
    }
}

impl From<(usize, usize)> for IterationRange {
    fn from((begin, end): (usize, usize)) -> Self {
        IterationRange { begin, end }
    }
}

impl From<Range<usize>> for IterationRange {
    fn from(range: Range<usize>) -> Self {
        IterationRange {
            begin: range.start,
            end: range.end,
        }
    }
}

/// Margins every row starts from: the matrix's base margin when present,
/// otherwise `base_margin[output]` in every row.
pub fn initial_margins(matrix: &FeatureMatrix, num_outputs: usize, base_margin: &[f32]) -> Result<Array2<f32>> {
    match matrix.info().base_margin() {
        Some(margin) => {
            if margin.dim() != (matrix.num_rows(), num_outputs) {
                return Err(XGBoostError::shape(
                    format!("base_margin of shape ({}, {})", matrix.num_rows(), num_outputs),
                    format!("{:?}", margin.dim()),
                ));
            }
            Ok(margin.clone())
        }
        None => {
            if base_margin.len() != num_outputs {
                return Err(XGBoostError::shape(
                    format!("{} base scores", num_outputs),
                    format!("{} base scores", base_margin.len()),
                ));
            }
            Ok(Array2::from_shape_fn((matrix.num_rows(), num_outputs), |(_, output)| {
                base_margin[output]
            }))
        }
    }
}

/// Read-only view over an ensemble for traversal.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    ensemble: &'a TreeEnsemble,
}

impl<'a> Predictor<'a> {
    pub fn new(ensemble: &'a TreeEnsemble) -> Self {
        Predictor { ensemble }
    }

    /// Adds the outputs of `trees` to `margins` (`n_rows x num_outputs`).
    ///
    /// `columns[f]` is the input column holding training feature `f`.
    pub fn accumulate(&self, matrix: &FeatureMatrix, columns: &[usize], trees: Range<usize>, margins: &mut Array2<f32>) {
        let ensemble = self.ensemble;
        let selected = &ensemble.trees()[trees.clone()];
        let outputs = &ensemble.tree_info()[trees];
        margins
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut out)| {
                let fvalue = |f: usize| matrix.value(row, columns[f]);
                for (tree, &output) in selected.iter().zip(outputs) {
                    let leaf = tree.predict_row(fvalue);
                    if tree.is_vector_leaf() {
                        for (o, w) in out.iter_mut().zip(leaf) {
                            *o += *w;
                        }
                    } else {
                        out[output] += leaf[0];
                    }
                }
            });
    }

    /// Raw margins over the rounds in `range`, starting from `base_margin`.
    pub fn predict_margin(
        &self,
        matrix: &FeatureMatrix,
        columns: &[usize],
        base_margin: &[f32],
        range: IterationRange,
    ) -> Result<Array2<f32>> {
        let trees = self.ensemble.tree_range(range.begin, range.end)?;
        let mut margins = initial_margins(matrix, self.ensemble.num_outputs(), base_margin)?;
        self.accumulate(matrix, columns, trees, &mut margins);
        Ok(margins)
    }

    /// Leaf index reached in every selected tree, `n_rows x n_trees`.
    pub fn predict_leaf(&self, matrix: &FeatureMatrix, columns: &[usize], range: IterationRange) -> Result<Array2<u32>> {
        let trees = &self.ensemble.trees()[self.ensemble.tree_range(range.begin, range.end)?];
        let mut leaves = Array2::<u32>::zeros((matrix.num_rows(), trees.len()));
        leaves
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut out)| {
                for (slot, tree) in out.iter_mut().zip(trees) {
                    *slot = tree.get_leaf_index(|f| matrix.value(row, columns[f])) as u32;
                }
            });
        Ok(leaves)
    }
}
