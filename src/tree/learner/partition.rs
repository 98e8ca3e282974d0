//! Row partitioning for tree learning.
//!
//! Tracks which rows of the (subsampled) training matrix sit in every open
//! node, and the node of every row for the exact split scan.

use crate::core::error::{Result, XGBoostError};
use crate::core::types::NodeIndex;
use crate::dataset::FeatureMatrix;
use crate::tree::node::SplitCondition;
use std::collections::HashMap;

/// Position of rows excluded by row subsampling.
pub const NOT_SAMPLED: usize = usize::MAX;

#[derive(Debug, Clone)]
pub struct RowPartitioner {
    node_rows: HashMap<NodeIndex, Vec<usize>>,
    positions: Vec<usize>,
}

impl RowPartitioner {
    /// All `rows` start in the root node.
    pub fn new(n_rows: usize, rows: Vec<usize>) -> Self {
        let mut positions = vec![NOT_SAMPLED; n_rows];
        for &row in &rows {
            positions[row] = 0;
        }
        let mut node_rows = HashMap::new();
        node_rows.insert(0, rows);
        RowPartitioner {
            node_rows,
            positions,
        }
    }

    pub fn rows(&self, nid: NodeIndex) -> &[usize] {
        self.node_rows.get(&nid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Node of every row, [`NOT_SAMPLED`] for rows outside the sample.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Moves the rows of `nid` into its two children.
    pub fn split_node(
        &mut self,
        nid: NodeIndex,
        left: NodeIndex,
        right: NodeIndex,
        matrix: &FeatureMatrix,
        condition: &SplitCondition,
        default_left: bool,
    ) -> Result<()> {
        let rows = self.node_rows.remove(&nid).ok_or_else(|| {
            XGBoostError::internal(format!("node {} has no rows to partition", nid))
        })?;
        let column = matrix.column(condition.feature());
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| condition.goes_left(column[row]).unwrap_or(default_left));

        for &row in &left_rows {
            self.positions[row] = left;
        }
        for &row in &right_rows {
            self.positions[row] = right;
        }
        self.node_rows.insert(left, left_rows);
        self.node_rows.insert(right, right_rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_split_node_follows_condition() {
        let matrix = FeatureMatrix::from_dense(array![[1.0], [5.0], [f32::NAN], [2.0]]).unwrap();
        let mut partitioner = RowPartitioner::new(4, vec![0, 1, 2, 3]);
        let condition = SplitCondition::Numerical {
            feature: 0,
            threshold: 3.0,
        };
        partitioner.split_node(0, 1, 2, &matrix, &condition, false).unwrap();

        assert_eq!(partitioner.rows(1), &[0, 3]);
        assert_eq!(partitioner.rows(2), &[1, 2]);
        assert_eq!(partitioner.positions(), &[1, 2, 2, 1]);
        assert!(partitioner.rows(0).is_empty());
    }

    #[test]
    fn test_unsampled_rows_keep_sentinel() {
        let matrix = FeatureMatrix::from_dense(array![[1.0], [5.0], [2.0]]).unwrap();
        let mut partitioner = RowPartitioner::new(3, vec![0, 1]);
        let condition = SplitCondition::Numerical {
            feature: 0,
            threshold: 3.0,
        };
        partitioner.split_node(0, 1, 2, &matrix, &condition, true).unwrap();
        assert_eq!(partitioner.positions()[2], NOT_SAMPLED);
        assert!(partitioner.split_node(0, 3, 4, &matrix, &condition, true).is_err());
    }
}
