//! Prediction pipeline for Pure Rust XGBoost.
//!
//! Tree traversal over iteration ranges, leaf index prediction and feature
//! importance computed from the split statistics of a trained ensemble.

pub mod feature_importance;
pub mod predictor;

pub use feature_importance::{compute_importance, normalize};
pub use predictor::{initial_margins, IterationRange, Predictor};
