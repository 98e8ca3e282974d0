//! Tree learning algorithms for the Pure Rust XGBoost framework.
//!
//! The grower drives node expansion; the partitioner tracks which rows live
//! in which node.

pub mod grower;
pub mod partition;

pub use grower::{SplitSource, TreeGrower, TreeGrowerConfig};
pub use partition::{RowPartitioner, NOT_SAMPLED};
