//! Tree learning module for the Pure Rust XGBoost framework.
//!
//! This module provides the arena-based regression tree, histogram
//! construction, split finding, feature sampling and the tree grower that
//! ties them together.

pub mod histogram;
pub mod learner;
pub mod node;
pub mod sampling;
pub mod split;
pub mod tree;

pub use histogram::{BinnedMatrix, HistogramBuilder, HistogramCuts, NodeHistogram, SortedColumns};
pub use learner::{SplitSource, TreeGrower, TreeGrowerConfig};
pub use node::{SplitCondition, TreeNode};
pub use sampling::ColumnSampler;
pub use split::{ConstraintManager, MonotonicConstraint, SplitEvaluator, SplitFinder, SplitInfo};
pub use tree::RegTree;
