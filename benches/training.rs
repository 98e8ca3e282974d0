//! Benchmarks for training and prediction.
//!
//! Compares the tree methods on a dense regression problem and measures
//! batch prediction throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use xgboost_rust::{ConfigBuilder, FeatureMatrix, TrainOptions, TreeMethod};

/// Dense regression data with a fixed seed.
fn regression_data(rows: usize, cols: usize) -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(42);
    let x = Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0f32..1.0));
    let y = Array1::from_shape_fn(rows, |i| {
        x.row(i).iter().enumerate().map(|(j, v)| v * (j + 1) as f32).sum::<f32>()
    });
    FeatureMatrix::builder(x).labels(y).build().expect("valid benchmark data")
}

fn bench_tree_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_10_rounds");
    group.sample_size(10);
    let train = regression_data(5_000, 20);

    for method in [TreeMethod::Hist, TreeMethod::Approx, TreeMethod::Exact] {
        let config = ConfigBuilder::new()
            .tree_method(method)
            .num_boost_round(10)
            .max_depth(6)
            .verbosity(0)
            .build()
            .expect("valid config");
        group.bench_with_input(BenchmarkId::from_parameter(method), &config, |bencher, config| {
            bencher.iter(|| xgboost_rust::train(config.clone(), black_box(&train), TrainOptions::new()))
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    let train = regression_data(5_000, 20);
    let config = ConfigBuilder::new()
        .num_boost_round(50)
        .verbosity(0)
        .build()
        .expect("valid config");
    let booster = xgboost_rust::train(config, &train, TrainOptions::new()).expect("training succeeds");

    for rows in [100, 1_000, 5_000] {
        let batch = regression_data(rows, 20);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("margin", rows), &batch, |bencher, batch| {
            bencher.iter(|| booster.predict(black_box(batch), true, (0, 0)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree_methods, bench_prediction);
criterion_main!(benches);
