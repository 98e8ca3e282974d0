//! Split finding and evaluation module for the Pure Rust XGBoost framework.
//!
//! This module provides the regularized gain computation, constraint
//! enforcement and the best-split search used by the tree grower.

pub mod constraints;
pub mod evaluator;
pub mod finder;

pub use constraints::{ConstraintManager, InteractionConstraint, MonotonicConstraint, NodeBounds};
pub use evaluator::SplitEvaluator;
pub use finder::{NodeContext, SplitFinder, SplitInfo};
