//! Histogram construction for split finding.
//!
//! A node histogram aggregates, for every feature and bin, the gradient and
//! Hessian sums (one pair per target) and the row count of the node's rows.
//! Features are processed in parallel, each writing only its own buffer.
//! The larger child of a split is derived by subtracting the smaller child
//! from the parent.

use crate::core::constants::MISSING_BIN;
use crate::core::types::{FeatureIndex, GradStats, GradientPair};
use crate::tree::histogram::cuts::HistogramCuts;
use crate::tree::histogram::index::BinnedMatrix;
use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;

/// Histogram of one feature: `stats[[bin, target]]` and `counts[bin]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureHistogram {
    stats: Array2<GradStats>,
    counts: Array1<u32>,
}

impl FeatureHistogram {
    pub fn zeros(num_bins: usize, num_targets: usize) -> Self {
        FeatureHistogram {
            stats: Array2::from_elem((num_bins, num_targets), GradStats::default()),
            counts: Array1::zeros(num_bins),
        }
    }

    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Statistics of `bin` for `target`.
    #[inline]
    pub fn stats(&self, bin: usize, target: usize) -> GradStats {
        self.stats[[bin, target]]
    }

    #[inline]
    pub fn count(&self, bin: usize) -> u32 {
        self.counts[bin]
    }

    /// Sum over all bins of one target (missing rows excluded).
    pub fn total(&self, target: usize) -> GradStats {
        self.stats
            .column(target)
            .iter()
            .fold(GradStats::default(), |acc, s| acc + *s)
    }

    pub fn total_count(&self) -> u32 {
        self.counts.sum()
    }

    fn subtract(&self, other: &FeatureHistogram) -> FeatureHistogram {
        let mut stats = self.stats.clone();
        stats.zip_mut_with(&other.stats, |a, b| *a -= *b);
        let mut counts = self.counts.clone();
        counts.zip_mut_with(&other.counts, |a, b| *a = a.saturating_sub(*b));
        FeatureHistogram { stats, counts }
    }
}

/// Histograms of every feature for one tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHistogram {
    features: Vec<FeatureHistogram>,
}

impl NodeHistogram {
    pub fn feature(&self, feature: FeatureIndex) -> &FeatureHistogram {
        &self.features[feature]
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// `self - child`, the histogram of `child`'s sibling.
    pub fn subtract(&self, child: &NodeHistogram) -> NodeHistogram {
        let features = self
            .features
            .par_iter()
            .zip(child.features.par_iter())
            .map(|(parent, child)| parent.subtract(child))
            .collect();
        NodeHistogram { features }
    }
}

/// Builds node histograms from a binned matrix and per-row gradients.
#[derive(Debug, Clone, Copy)]
pub struct HistogramBuilder<'a> {
    binned: &'a BinnedMatrix,
    cuts: &'a HistogramCuts,
}

impl<'a> HistogramBuilder<'a> {
    pub fn new(binned: &'a BinnedMatrix, cuts: &'a HistogramCuts) -> Self {
        HistogramBuilder { binned, cuts }
    }

    /// Aggregates `gpairs` (`n_rows x n_targets`) over `rows`.
    pub fn build(&self, gpairs: ArrayView2<'_, GradientPair>, rows: &[usize]) -> NodeHistogram {
        let num_targets = gpairs.ncols();
        let features = (0..self.cuts.num_features())
            .into_par_iter()
            .map(|feature| {
                let mut hist = FeatureHistogram::zeros(self.cuts.num_bins(feature), num_targets);
                let bins = self.binned.column(feature);
                for &row in rows {
                    let bin = bins[row];
                    if bin == MISSING_BIN {
                        continue;
                    }
                    let bin = bin as usize;
                    for target in 0..num_targets {
                        hist.stats[[bin, target]].add_pair(gpairs[[row, target]]);
                    }
                    hist.counts[bin] += 1;
                }
                hist
            })
            .collect();
        NodeHistogram { features }
    }
}

/// Per-target gradient sums over `rows`, missing values included.
pub fn sum_gradients(gpairs: ArrayView2<'_, GradientPair>, rows: &[usize]) -> Vec<GradStats> {
    let mut sums = vec![GradStats::default(); gpairs.ncols()];
    for &row in rows {
        for (target, sum) in sums.iter_mut().enumerate() {
            sum.add_pair(gpairs[[row, target]]);
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureMatrix;
    use ndarray::{array, Array2};

    fn setup() -> (FeatureMatrix, Array2<GradientPair>) {
        let data = array![[1.0, 0.0], [2.0, f32::NAN], [3.0, 1.0], [1.0, 1.0]];
        let matrix = FeatureMatrix::from_dense(data).unwrap();
        let gpairs = Array2::from_shape_fn((4, 1), |(row, _)| {
            GradientPair::new(row as f32 - 1.5, 1.0)
        });
        (matrix, gpairs)
    }

    #[test]
    fn test_feature_histogram_construction() {
        let (matrix, gpairs) = setup();
        let cuts = HistogramCuts::build(&matrix, None, 256);
        let binned = BinnedMatrix::from_matrix(&matrix, &cuts);
        let hist = HistogramBuilder::new(&binned, &cuts).build(gpairs.view(), &[0, 1, 2, 3]);

        let f0 = hist.feature(0);
        assert_eq!(f0.num_bins(), 3);
        assert_eq!(f0.count(0), 2);
        assert_eq!(f0.stats(0, 0), GradStats::new(-1.5 + 1.5, 2.0));

        let f1 = hist.feature(1);
        assert_eq!(f1.total_count(), 3);
        assert_eq!(f1.total(0).sum_hess, 3.0);
    }

    #[test]
    fn test_histogram_subtraction() {
        let (matrix, gpairs) = setup();
        let cuts = HistogramCuts::build(&matrix, None, 256);
        let binned = BinnedMatrix::from_matrix(&matrix, &cuts);
        let builder = HistogramBuilder::new(&binned, &cuts);

        let parent = builder.build(gpairs.view(), &[0, 1, 2, 3]);
        let left = builder.build(gpairs.view(), &[0, 3]);
        let right = builder.build(gpairs.view(), &[1, 2]);
        assert_eq!(parent.subtract(&left), right);
    }

    #[test]
    fn test_sum_gradients_includes_missing_rows() {
        let (_, gpairs) = setup();
        let sums = sum_gradients(gpairs.view(), &[0, 1, 2, 3]);
        assert_eq!(sums, vec![GradStats::new(0.0, 4.0)]);
    }
}
