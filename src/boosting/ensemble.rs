//! Tree ensemble management for the Pure Rust XGBoost framework.
//!
//! Trees are stored in the order they were grown and grouped into boosting
//! rounds through `iteration_indptr`: the trees of round `r` are
//! `trees[iteration_indptr[r]..iteration_indptr[r + 1]]`. Every tree also
//! records the output (class or target) it contributes to in `tree_info`.

use crate::core::error::{Result, XGBoostError};
use crate::core::types::MultiStrategy;
use crate::tree::RegTree;
use std::ops::Range;

/// Ordered collection of trees grouped into boosting rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    trees: Vec<RegTree>,
    tree_info: Vec<usize>,
    iteration_indptr: Vec<usize>,
    num_parallel_tree: usize,
    num_outputs: usize,
    multi_strategy: MultiStrategy,
}

impl TreeEnsemble {
    pub fn new(num_outputs: usize, num_parallel_tree: usize, multi_strategy: MultiStrategy) -> Self {
        TreeEnsemble {
            trees: Vec::new(),
            tree_info: Vec::new(),
            iteration_indptr: vec![0],
            num_parallel_tree: num_parallel_tree.max(1),
            num_outputs: num_outputs.max(1),
            multi_strategy,
        }
    }

    /// Reassembles an ensemble from stored parts, checking that the round
    /// boundaries and output assignments are consistent.
    pub fn from_parts(
        trees: Vec<RegTree>,
        tree_info: Vec<usize>,
        iteration_indptr: Vec<usize>,
        num_outputs: usize,
        num_parallel_tree: usize,
        multi_strategy: MultiStrategy,
    ) -> Result<Self> {
        if tree_info.len() != trees.len() {
            return Err(XGBoostError::serialization(format!(
                "tree_info has {} entries for {} trees",
                tree_info.len(),
                trees.len()
            )));
        }
        if iteration_indptr.first() != Some(&0)
            || iteration_indptr.last() != Some(&trees.len())
            || iteration_indptr.windows(2).any(|w| w[0] > w[1])
        {
            return Err(XGBoostError::serialization(
                "iteration_indptr must be non-decreasing from 0 to the number of trees",
            ));
        }
        let ensemble = TreeEnsemble {
            trees,
            tree_info,
            iteration_indptr,
            num_parallel_tree: num_parallel_tree.max(1),
            num_outputs: num_outputs.max(1),
            multi_strategy,
        };
        let per_round = ensemble.trees_per_round();
        if let Some(round) = ensemble
            .iteration_indptr
            .windows(2)
            .position(|w| w[1] - w[0] != per_round)
        {
            return Err(XGBoostError::serialization(format!(
                "round {} does not hold {} trees",
                round, per_round
            )));
        }
        let expect_vector_leaf =
            ensemble.multi_strategy == MultiStrategy::MultiOutputTree && ensemble.num_outputs > 1;
        for (i, (tree, &output)) in ensemble.trees.iter().zip(&ensemble.tree_info).enumerate() {
            let vector_leaf = tree.is_vector_leaf();
            let matches = if vector_leaf {
                tree.num_outputs() == ensemble.num_outputs
            } else {
                output < ensemble.num_outputs
            };
            if !matches || vector_leaf != expect_vector_leaf {
                return Err(XGBoostError::serialization(format!(
                    "tree {} does not match a model with {} outputs",
                    i, ensemble.num_outputs
                )));
            }
        }
        Ok(ensemble)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_boosted_rounds(&self) -> usize {
        self.iteration_indptr.len() - 1
    }

    /// Trees added per round: one per output and parallel tree, or one per
    /// parallel tree when leaves are vectors.
    pub fn trees_per_round(&self) -> usize {
        match self.multi_strategy {
            MultiStrategy::MultiOutputTree if self.num_outputs > 1 => self.num_parallel_tree,
            _ => self.num_outputs * self.num_parallel_tree,
        }
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn num_parallel_tree(&self) -> usize {
        self.num_parallel_tree
    }

    pub fn multi_strategy(&self) -> MultiStrategy {
        self.multi_strategy
    }

    pub fn trees(&self) -> &[RegTree] {
        &self.trees
    }

    pub fn tree_info(&self) -> &[usize] {
        &self.tree_info
    }

    pub fn iteration_indptr(&self) -> &[usize] {
        &self.iteration_indptr
    }

    /// Appends the trees of one finished round, each with its output index.
    pub fn commit_round(&mut self, round: Vec<(RegTree, usize)>) {
        for (tree, output) in round {
            self.trees.push(tree);
            self.tree_info.push(output);
        }
        self.iteration_indptr.push(self.trees.len());
    }

    /// Tree indices covering rounds `[begin, end)`; `(0, 0)` selects every round.
    pub fn tree_range(&self, begin: usize, end: usize) -> Result<Range<usize>> {
        let rounds = self.num_boosted_rounds();
        if begin == 0 && end == 0 {
            return Ok(0..self.trees.len());
        }
        if begin > end || end > rounds {
            return Err(XGBoostError::invalid_input(format!(
                "iteration range [{}, {}) is outside the {} boosted rounds",
                begin, end, rounds
            )));
        }
        Ok(self.iteration_indptr[begin]..self.iteration_indptr[end])
    }

    /// Round index of every tree.
    pub fn tree_rounds(&self) -> Vec<usize> {
        let mut rounds = Vec::with_capacity(self.trees.len());
        for (round, bounds) in self.iteration_indptr.windows(2).enumerate() {
            rounds.extend(std::iter::repeat(round).take(bounds[1] - bounds[0]));
        }
        rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(value: f32) -> RegTree {
        RegTree::new(1, vec![value], 1.0)
    }

    #[test]
    fn test_rounds_and_ranges() {
        let mut ensemble = TreeEnsemble::new(2, 1, MultiStrategy::OneOutputPerTree);
        assert_eq!(ensemble.trees_per_round(), 2);
        ensemble.commit_round(vec![(stump(0.1), 0), (stump(0.2), 1)]);
        ensemble.commit_round(vec![(stump(0.3), 0), (stump(0.4), 1)]);
        assert_eq!(ensemble.num_boosted_rounds(), 2);
        assert_eq!(ensemble.num_trees(), 4);
        assert_eq!(ensemble.tree_range(0, 0).unwrap(), 0..4);
        assert_eq!(ensemble.tree_range(1, 2).unwrap(), 2..4);
        assert_eq!(ensemble.tree_rounds(), vec![0, 0, 1, 1]);
        assert!(ensemble.tree_range(0, 3).is_err());
        assert!(ensemble.tree_range(2, 1).is_err());
    }

    #[test]
    fn test_vector_leaf_trees_per_round() {
        let ensemble = TreeEnsemble::new(3, 2, MultiStrategy::MultiOutputTree);
        assert_eq!(ensemble.trees_per_round(), 2);
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_layout() {
        let trees = vec![stump(1.0), stump(2.0)];
        assert!(TreeEnsemble::from_parts(
            trees.clone(),
            vec![0],
            vec![0, 2],
            1,
            2,
            MultiStrategy::OneOutputPerTree
        )
        .is_err());
        assert!(TreeEnsemble::from_parts(
            trees.clone(),
            vec![0, 1],
            vec![0, 2],
            1,
            2,
            MultiStrategy::OneOutputPerTree
        )
        .is_err());
        let ensemble =
            TreeEnsemble::from_parts(trees, vec![0, 0], vec![0, 2], 1, 2, MultiStrategy::OneOutputPerTree).unwrap();
        assert_eq!(ensemble.num_boosted_rounds(), 1);
    }

    #[test]
    fn test_from_parts_rejects_partial_rounds() {
        let trees = vec![stump(1.0), stump(2.0), stump(3.0)];
        let uneven = TreeEnsemble::from_parts(
            trees.clone(),
            vec![0, 0, 0],
            vec![0, 1, 3],
            1,
            1,
            MultiStrategy::OneOutputPerTree,
        );
        assert!(matches!(uneven, Err(XGBoostError::Serialization { .. })));

        let empty_round = TreeEnsemble::from_parts(
            trees.clone(),
            vec![0, 0, 0],
            vec![0, 1, 1, 2, 3],
            1,
            1,
            MultiStrategy::OneOutputPerTree,
        );
        assert!(empty_round.is_err());

        let scalar_in_vector_model =
            TreeEnsemble::from_parts(trees, vec![0, 0, 0], vec![0, 1, 2, 3], 2, 1, MultiStrategy::MultiOutputTree);
        assert!(scalar_in_vector_model.is_err());
    }
}
