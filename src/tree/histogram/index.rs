//! Row-to-bin index and presorted columns.

use crate::core::constants::MISSING_BIN;
use crate::core::types::{BinIndex, FeatureIndex};
use crate::dataset::FeatureMatrix;
use crate::tree::histogram::cuts::HistogramCuts;
use rayon::prelude::*;

/// Bin index of every `(row, feature)` pair, stored column by column.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    n_rows: usize,
    columns: Vec<Vec<BinIndex>>,
}

impl BinnedMatrix {
    pub fn from_matrix(matrix: &FeatureMatrix, cuts: &HistogramCuts) -> Self {
        let columns = (0..matrix.num_cols())
            .into_par_iter()
            .map(|feature| {
                matrix
                    .column(feature)
                    .iter()
                    .map(|&value| {
                        if value.is_nan() {
                            MISSING_BIN
                        } else {
                            cuts.search_bin(feature, value)
                        }
                    })
                    .collect()
            })
            .collect();
        BinnedMatrix {
            n_rows: matrix.num_rows(),
            columns,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn bin(&self, row: usize, feature: FeatureIndex) -> BinIndex {
        self.columns[feature][row]
    }

    pub fn column(&self, feature: FeatureIndex) -> &[BinIndex] {
        &self.columns[feature]
    }
}

/// Present rows of every feature sorted by value, used by the exact method.
#[derive(Debug, Clone)]
pub struct SortedColumns {
    columns: Vec<Vec<u32>>,
}

impl SortedColumns {
    pub fn from_matrix(matrix: &FeatureMatrix) -> Self {
        let columns = (0..matrix.num_cols())
            .into_par_iter()
            .map(|feature| {
                let values = matrix.column(feature);
                let mut rows: Vec<u32> = (0..values.len() as u32)
                    .filter(|&row| !values[row as usize].is_nan())
                    .collect();
                rows.sort_by(|&a, &b| values[a as usize].total_cmp(&values[b as usize]));
                rows
            })
            .collect();
        SortedColumns { columns }
    }

    /// Rows holding a value for `feature`, ascending by value.
    pub fn sorted_rows(&self, feature: FeatureIndex) -> &[u32] {
        &self.columns[feature]
    }
}
