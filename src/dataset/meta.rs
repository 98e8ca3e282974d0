//! Per-row metadata attached to a feature matrix.

use crate::core::error::{Result, XGBoostError};
use crate::core::types::Label;
use ndarray::{Array1, Array2, ArrayView2};

/// Labels, weights, query groups and other per-row information.
#[derive(Debug, Clone, Default)]
pub struct MetaInfo {
    pub(crate) n_rows: usize,
    pub(crate) labels: Option<Array2<Label>>,
    pub(crate) weights: Option<Array1<f32>>,
    pub(crate) group_ptr: Option<Vec<usize>>,
    pub(crate) base_margin: Option<Array2<f32>>,
    pub(crate) feature_weights: Option<Vec<f32>>,
}

impl MetaInfo {
    pub fn num_rows(&self) -> usize {
        self.n_rows
    }

    /// Labels as an `n_rows x n_targets` matrix.
    pub fn labels(&self) -> Result<ArrayView2<'_, Label>> {
        self.labels
            .as_ref()
            .map(|labels| labels.view())
            .ok_or_else(|| XGBoostError::invalid_input("label is not set for this matrix"))
    }

    pub fn has_labels(&self) -> bool {
        self.labels.is_some()
    }

    /// Number of label columns (1 when labels are absent).
    pub fn num_targets(&self) -> usize {
        self.labels.as_ref().map(|l| l.ncols()).unwrap_or(1)
    }

    /// Weight of a row, 1.0 when no weights were given.
    #[inline]
    pub fn weight(&self, row: usize) -> f32 {
        match &self.weights {
            Some(weights) => weights[row],
            None => 1.0,
        }
    }

    pub fn weights(&self) -> Option<&Array1<f32>> {
        self.weights.as_ref()
    }

    /// Sum of row weights.
    pub fn sum_weights(&self) -> f64 {
        match &self.weights {
            Some(weights) => weights.iter().map(|&w| w as f64).sum(),
            None => self.n_rows as f64,
        }
    }

    /// Query group boundaries; `[start_0, start_1, ..., n_rows]`.
    pub fn group_ptr(&self) -> Option<&[usize]> {
        self.group_ptr.as_deref()
    }

    /// Group boundaries, treating the whole matrix as one group when unset.
    pub fn group_ptr_or_whole(&self) -> Vec<usize> {
        match &self.group_ptr {
            Some(ptr) => ptr.clone(),
            None => vec![0, self.n_rows],
        }
    }

    /// Per-row starting margin, `n_rows x n_outputs`.
    pub fn base_margin(&self) -> Option<&Array2<f32>> {
        self.base_margin.as_ref()
    }

    /// Per-feature sampling weights used by column subsampling.
    pub fn feature_weights(&self) -> Option<&[f32]> {
        self.feature_weights.as_deref()
    }
}

/// Converts contiguous query ids into group boundaries.
///
/// Fails when a query id reappears after a different id was seen.
pub fn qid_to_group_ptr(qid: &[u64]) -> Result<Vec<usize>> {
    let mut ptr = vec![0];
    let mut seen = std::collections::HashMap::new();
    for (row, &id) in qid.iter().enumerate() {
        if row > 0 && id == qid[row - 1] {
            continue;
        }
        if row > 0 {
            ptr.push(row);
        }
        if let Some(&first) = seen.get(&id) {
            return Err(crate::core::error::DatasetError::NonContiguousGroup {
                qid: id,
                first,
                row,
            }
            .into());
        }
        seen.insert(id, ptr.len() - 1);
    }
    ptr.push(qid.len());
    Ok(ptr)
}

/// Converts group sizes into group boundaries.
pub fn group_sizes_to_ptr(sizes: &[usize]) -> Vec<usize> {
    let mut ptr = Vec::with_capacity(sizes.len() + 1);
    ptr.push(0);
    for size in sizes {
        let last = *ptr.last().unwrap_or(&0);
        ptr.push(last + size);
    }
    ptr
}
