//! Common test utilities for Pure Rust XGBoost integration tests.

#![allow(dead_code)]

use ndarray::{Array1, Array2};
use rand::prelude::*;
use xgboost_rust::*;

/// Uniform features in `[-5, 5)`
pub fn create_test_features(num_samples: usize, num_features: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((num_samples, num_features), |_| rng.gen_range(-5.0..5.0))
}

/// Linear regression target with a little noise
pub fn create_test_labels_regression(features: &Array2<f32>) -> Array1<f32> {
    let mut rng = StdRng::seed_from_u64(7);
    Array1::from_shape_fn(features.nrows(), |i| {
        let mut label = 0.0;
        for j in 0..features.ncols() {
            label += features[[i, j]] * ((j + 1) as f32 * 0.5);
        }
        label + rng.gen_range(-0.1..0.1)
    })
}

/// Labels of a linearly separable problem: `x0 - x1 > 0`
pub fn create_test_labels_binary(features: &Array2<f32>) -> Array1<f32> {
    Array1::from_shape_fn(features.nrows(), |i| {
        if features[[i, 0]] - features[[i, 1]] > 0.0 {
            1.0
        } else {
            0.0
        }
    })
}

/// Class by which third of `[-5, 5)` the first feature falls in
pub fn create_test_labels_multiclass(features: &Array2<f32>) -> Array1<f32> {
    features.column(0).mapv(|v| {
        if v < -5.0 / 3.0 {
            0.0
        } else if v < 5.0 / 3.0 {
            1.0
        } else {
            2.0
        }
    })
}

pub fn regression_matrix(num_samples: usize, num_features: usize) -> FeatureMatrix {
    let x = create_test_features(num_samples, num_features, 42);
    let y = create_test_labels_regression(&x);
    FeatureMatrix::builder(x).labels(y).build().unwrap()
}

pub fn binary_matrix(num_samples: usize, num_features: usize) -> FeatureMatrix {
    let x = create_test_features(num_samples, num_features, 123);
    let y = create_test_labels_binary(&x);
    FeatureMatrix::builder(x).labels(y).build().unwrap()
}

pub fn multiclass_matrix(num_samples: usize, num_features: usize) -> FeatureMatrix {
    let x = create_test_features(num_samples, num_features, 456);
    let y = create_test_labels_multiclass(&x);
    FeatureMatrix::builder(x).labels(y).build().unwrap()
}

/// `num_groups` queries of `group_size` documents; relevance grows with
/// the first feature.
pub fn ranking_matrix(num_groups: usize, group_size: usize, num_features: usize) -> FeatureMatrix {
    let x = create_test_features(num_groups * group_size, num_features, 789);
    let y = x.column(0).mapv(|v| ((v + 5.0) / 2.5).floor().clamp(0.0, 3.0));
    FeatureMatrix::builder(x)
        .labels(y)
        .group(vec![group_size; num_groups])
        .build()
        .unwrap()
}

/// Categorical column 0 with codes `0..6`; categories 1 and 4 carry a
/// large positive effect. Column 1 is numeric noise.
pub fn categorical_matrix(num_samples: usize) -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(99);
    let mut x = Array2::zeros((num_samples, 2));
    let mut y = Array1::zeros(num_samples);
    for i in 0..num_samples {
        let category = rng.gen_range(0..6u32);
        x[[i, 0]] = category as f32;
        x[[i, 1]] = rng.gen_range(-1.0..1.0);
        y[i] = if category == 1 || category == 4 { 10.0 } else { 0.0 } + x[[i, 1]] * 0.1;
    }
    FeatureMatrix::builder(x)
        .labels(y)
        .feature_types(vec![FeatureType::Categorical, FeatureType::Quantitative])
        .build()
        .unwrap()
}

/// Small, quiet, single threaded configuration.
pub fn quiet_config(objective: &str) -> ConfigBuilder {
    ConfigBuilder::new()
        .objective(objective)
        .num_boost_round(10)
        .max_depth(3)
        .nthread(1)
        .verbosity(0)
}

pub fn rmse(predictions: &Array2<f32>, labels: &Array1<f32>) -> f64 {
    let sum: f64 = predictions
        .column(0)
        .iter()
        .zip(labels.iter())
        .map(|(p, y)| ((p - y) as f64).powi(2))
        .sum();
    (sum / labels.len() as f64).sqrt()
}

pub fn labels_of(matrix: &FeatureMatrix) -> Array1<f32> {
    matrix.info().labels().unwrap().column(0).to_owned()
}

/// Features used on the path from the root to every leaf of `tree`.
pub fn leaf_paths(tree: &RegTree) -> Vec<Vec<usize>> {
    let mut paths = Vec::new();
    let mut stack = vec![(0usize, Vec::new())];
    while let Some((nid, path)) = stack.pop() {
        let node = tree.node(nid).unwrap();
        match (node.left_child(), node.right_child(), node.split_feature()) {
            (Some(left), Some(right), Some(feature)) => {
                let mut next = path.clone();
                next.push(feature);
                stack.push((left, next.clone()));
                stack.push((right, next));
            }
            _ => paths.push(path),
        }
    }
    paths
}
