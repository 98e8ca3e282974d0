//! Row and feature sampling utilities for the Pure Rust XGBoost framework.
//!
//! Column sampling is nested: a per-tree subset is drawn first, every depth
//! level draws from the tree subset and every node draws from its level
//! subset. All draws come from one seeded generator per tree so that a run
//! with the same seed reproduces the same trees.

use crate::core::types::FeatureIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

/// Derives the generator seed of one tree.
pub fn tree_seed(seed: u64, round: usize, output: usize, tree_index: usize) -> u64 {
    let mut h = seed ^ 0x9E37_79B9_7F4A_7C15;
    for part in [round as u64, output as u64, tree_index as u64] {
        h = (h ^ part).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h ^= h >> 31;
    }
    h
}

/// Bernoulli row subsample; keeps at least one row.
pub fn sample_rows(n_rows: usize, subsample: f64, rng: &mut StdRng) -> Vec<usize> {
    if subsample >= 1.0 {
        return (0..n_rows).collect();
    }
    let mut rows: Vec<usize> = (0..n_rows).filter(|_| rng.gen::<f64>() < subsample).collect();
    if rows.is_empty() && n_rows > 0 {
        rows.push(rng.gen_range(0..n_rows));
    }
    rows
}

/// Feature sampler for tree construction.
#[derive(Debug, Clone)]
pub struct ColumnSampler {
    feature_weights: Option<Vec<f32>>,
    colsample_bylevel: f64,
    colsample_bynode: f64,
    tree_features: Vec<FeatureIndex>,
    level_features: BTreeMap<usize, Vec<FeatureIndex>>,
}

impl ColumnSampler {
    /// Creates a sampler and draws the per-tree feature subset.
    pub fn new(
        num_features: usize,
        feature_weights: Option<&[f32]>,
        colsample_bytree: f64,
        colsample_bylevel: f64,
        colsample_bynode: f64,
        rng: &mut StdRng,
    ) -> Self {
        let feature_weights = feature_weights
            .filter(|w| w.iter().any(|&x| x > 0.0))
            .map(|w| w.to_vec());
        let mut sampler = ColumnSampler {
            feature_weights,
            colsample_bylevel,
            colsample_bynode,
            tree_features: Vec::new(),
            level_features: BTreeMap::new(),
        };
        let all: Vec<FeatureIndex> = (0..num_features).collect();
        sampler.tree_features = sampler.sample(&all, colsample_bytree, rng);
        sampler
    }

    pub fn tree_features(&self) -> &[FeatureIndex] {
        &self.tree_features
    }

    /// Candidate features of a node at `depth`, ascending.
    pub fn node_features(&mut self, depth: usize, rng: &mut StdRng) -> Vec<FeatureIndex> {
        if !self.level_features.contains_key(&depth) {
            let tree_features = self.tree_features.clone();
            let level = self.sample(&tree_features, self.colsample_bylevel, rng);
            self.level_features.insert(depth, level);
        }
        let level = self.level_features.get(&depth).cloned().unwrap_or_default();
        self.sample(&level, self.colsample_bynode, rng)
    }

    fn sample(&self, from: &[FeatureIndex], fraction: f64, rng: &mut StdRng) -> Vec<FeatureIndex> {
        let candidates: Vec<FeatureIndex> = match &self.feature_weights {
            Some(weights) => from
                .iter()
                .copied()
                .filter(|&f| weights.get(f).copied().unwrap_or(0.0) > 0.0)
                .collect(),
            None => from.to_vec(),
        };
        if fraction >= 1.0 || candidates.len() <= 1 {
            return candidates;
        }

        let n = ((from.len() as f64 * fraction).round() as usize)
            .max(1)
            .min(candidates.len());
        let mut picked: Vec<FeatureIndex> = match &self.feature_weights {
            Some(weights) => {
                match candidates.choose_multiple_weighted(rng, n, |&f| weights[f] as f64) {
                    Ok(iter) => iter.copied().collect(),
                    Err(e) => {
                        log::warn!("Weighted feature sampling failed ({}), sampling uniformly", e);
                        candidates.choose_multiple(rng, n).copied().collect()
                    }
                }
            }
            None => candidates.choose_multiple(rng, n).copied().collect(),
        };
        picked.sort_unstable();
        picked
    }
}
