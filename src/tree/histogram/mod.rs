//! Histogram construction module.
//!
//! Quantile cuts bucket every feature into at most `max_bin` bins, the binned
//! matrix stores each row's bin, and per-node histograms of gradient
//! statistics are aggregated from it for split finding.

pub mod builder;
pub mod cuts;
pub mod index;

pub use builder::{sum_gradients, FeatureHistogram, HistogramBuilder, NodeHistogram};
pub use cuts::HistogramCuts;
pub use index::{BinnedMatrix, SortedColumns};
