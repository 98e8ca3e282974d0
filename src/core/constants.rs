//! System constants and configuration defaults for Pure Rust XGBoost.

use crate::core::types::BinIndex;

/// Default learning rate (`eta`).
pub const DEFAULT_LEARNING_RATE: f64 = 0.3;

/// Default maximum tree depth. 0 means no depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Default maximum number of leaves. 0 means no leaf limit.
pub const DEFAULT_MAX_LEAVES: usize = 0;

/// Default maximum number of histogram bins per feature.
pub const DEFAULT_MAX_BIN: usize = 256;

/// Default minimum Hessian sum required in a child.
pub const DEFAULT_MIN_CHILD_WEIGHT: f64 = 1.0;

/// Default minimum loss reduction required to split (`gamma`).
pub const DEFAULT_MIN_SPLIT_LOSS: f64 = 0.0;

/// Default L2 regularization on leaf weights.
pub const DEFAULT_REG_LAMBDA: f64 = 1.0;

/// Default L1 regularization on leaf weights.
pub const DEFAULT_REG_ALPHA: f64 = 0.0;

/// Default number of boosting rounds.
pub const DEFAULT_NUM_BOOST_ROUND: usize = 100;

/// Default intercept when it is neither given nor estimated.
pub const DEFAULT_BASE_SCORE: f32 = 0.5;

/// Categorical features with fewer categories than this use one-vs-rest splits.
pub const DEFAULT_MAX_CAT_TO_ONEHOT: usize = 4;

/// Maximum number of categories placed on the left of a partition split.
pub const DEFAULT_MAX_CAT_THRESHOLD: usize = 64;

/// Maximum cardinality accepted for a native categorical column.
pub const DEFAULT_MAX_CATEGORIES: usize = 1024;

/// Slope of the pseudo-Huber loss.
pub const DEFAULT_HUBER_SLOPE: f64 = 1.0;

/// Hessian shift used by Poisson regression when `max_delta_step` is unset.
pub const POISSON_MAX_DELTA_STEP: f64 = 0.7;

/// Smallest loss change accepted as a real split.
pub const K_RT_EPS: f64 = 1e-6;

/// Lower bound for Hessians produced by built-in objectives.
pub const MIN_HESSIAN: f32 = 1e-16;

/// Bin index stored for missing values.
pub const MISSING_BIN: BinIndex = BinIndex::MAX;

/// Schema version written into model documents, as `[major, minor, patch]`.
pub const MODEL_FORMAT_VERSION: [u32; 3] = [2, 2, 0];

/// Magic header of binary model files.
pub const BINARY_MODEL_MAGIC: &[u8; 4] = b"XGBR";

/// Default verbosity (warnings only).
pub const DEFAULT_VERBOSITY: usize = 1;
