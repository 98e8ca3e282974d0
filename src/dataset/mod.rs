//! Feature matrix adapter for Pure Rust XGBoost.
//!
//! Normalizes dense tabular input, labels, weights and query groups into the
//! column-major [`FeatureMatrix`] used by the histogram builder, the exact
//! split finder and the predictor.

pub mod matrix;
pub mod meta;
pub mod schema;

pub use matrix::{FeatureMatrix, FeatureMatrixBuilder, MissingBitmap};
pub use meta::MetaInfo;
pub use schema::FeatureSchema;
