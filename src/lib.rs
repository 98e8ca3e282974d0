//! # Pure Rust XGBoost
//!
//! A pure Rust implementation of the XGBoost gradient boosting engine:
//! histogram based tree construction, boosting rounds with forests of
//! parallel trees, pluggable objectives and metrics, and a versioned model
//! format.
//!
//! ## Features
//!
//! - **Tree methods**: `hist` (fixed quantile cuts), `approx` (cuts
//!   re-sketched every round from the Hessians) and `exact` (every distinct
//!   value is a split candidate).
//! - **Constraints**: monotone and interaction constraints, native
//!   categorical splits, per-feature sampling weights.
//! - **Objectives**: regression, logistic, hinge, softmax and ranking
//!   objectives, or a user supplied gradient function.
//! - **Persistence**: JSON and binary model files with forward compatible
//!   minor versions, plus a separate runtime configuration export.
//! - **Parallelism**: split search and prediction run on a Rayon pool sized
//!   by `nthread`; results do not depend on the number of threads.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xgboost_rust::{ConfigBuilder, FeatureMatrix, TrainOptions};
//! use ndarray::{Array1, Array2};
//!
//! # fn main() -> xgboost_rust::Result<()> {
//! let x = Array2::from_shape_vec((4, 2), vec![1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0])
//!     .map_err(|e| xgboost_rust::XGBoostError::invalid_input(e.to_string()))?;
//! let y = Array1::from_vec(vec![3.0, 5.0, 7.0, 9.0]);
//! let train = FeatureMatrix::builder(x).labels(y).build()?;
//!
//! let config = ConfigBuilder::new()
//!     .objective("reg:squarederror")
//!     .num_boost_round(20)
//!     .max_depth(3)
//!     .build()?;
//! let booster = xgboost_rust::train(config, &train, TrainOptions::new().eval(&train, "train"))?;
//!
//! let predictions = booster.predict(&train, false, (0, 0))?;
//! booster.save_model("model.json")?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Feature matrix adapter
pub mod dataset;

// Histograms, split finding and tree growth
pub mod tree;

// Objective functions
pub mod objective;

// Evaluation metrics
pub mod metrics;

// Boosting module
pub mod boosting;

// Prediction module
pub mod prediction;

// Model and configuration persistence
pub mod io;

// Re-export core functionality for convenience
pub use crate::core::{
    constants::*,
    error::{Result, XGBoostError},
    types::*,
};

pub use config::{Config, ConfigBuilder, ParamSection};

pub use dataset::{FeatureMatrix, FeatureMatrixBuilder, FeatureSchema, MetaInfo};

pub use tree::{RegTree, SplitCondition, TreeNode};

pub use objective::{create_objective_function, CustomObjective, ObjectiveFunction};

pub use metrics::{create_metric, CustomMetric, Metric, MetricDirection};

pub use boosting::{
    train, Booster, BoosterState, EarlyStoppingState, EvalHistory, GradientBooster, RoundOutcome,
    TrainOptions, TreeEnsemble,
};

pub use prediction::IterationRange;

pub use io::SerializationFormat;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library with the default verbosity.
///
/// Installs the `env_logger` backend; `RUST_LOG` overrides the level.
/// Calling it again is a no-op.
///
/// # Examples
///
/// ```rust
/// fn main() -> xgboost_rust::Result<()> {
///     xgboost_rust::init()?;
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    crate::core::init_logging(DEFAULT_VERBOSITY);
    Ok(())
}

/// Initialize logging at the level given by a `verbosity` parameter.
pub fn init_with_verbosity(verbosity: usize) {
    crate::core::init_logging(verbosity);
}

/// Check if the library has been initialized.
pub fn is_initialized() -> bool {
    crate::core::is_logging_initialized()
}
