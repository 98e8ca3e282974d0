//! Integration tests for prediction: iteration ranges, output margins, leaf
//! indices and feature alignment.

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use xgboost_rust::*;

mod common;
use common::*;

fn binary_model(rounds: usize) -> (Booster, FeatureMatrix) {
    let train = binary_matrix(120, 4);
    let config = quiet_config("binary:logistic")
        .num_boost_round(rounds)
        .subsample(0.8)
        .seed(11)
        .build()
        .unwrap();
    let booster = xgboost_rust::train(config, &train, TrainOptions::new()).unwrap();
    (booster, train)
}

#[test]
fn test_iteration_range_matches_shorter_training() {
    let (full, train) = binary_model(10);
    let (short, _) = binary_model(4);

    let sliced = full.predict(&train, true, (0, 4)).unwrap();
    let expected = short.predict(&train, true, (0, 0)).unwrap();
    assert_eq!(sliced, expected);
}

#[test]
fn test_full_range_equivalents() {
    let (booster, train) = binary_model(6);
    let all = booster.predict(&train, false, (0, 0)).unwrap();
    let explicit = booster.predict(&train, false, (0, 6)).unwrap();
    let default = booster.predict(&train, false, IterationRange::all()).unwrap();
    assert_eq!(all, explicit);
    assert_eq!(all, default);
}

#[test]
fn test_invalid_iteration_ranges() {
    let (booster, train) = binary_model(5);
    for range in [(3, 2), (0, 6), (6, 7)] {
        let err = booster.predict(&train, false, range).unwrap_err();
        assert!(matches!(err, XGBoostError::InvalidInput { .. }), "{:?}", range);
    }
}

#[test]
fn test_output_margin_is_logit_of_probability() {
    let (booster, train) = binary_model(5);
    let probs = booster.predict(&train, false, (0, 0)).unwrap();
    let margins = booster.predict(&train, true, (0, 0)).unwrap();
    for (p, m) in probs.iter().zip(margins.iter()) {
        assert_abs_diff_eq!(*p, 1.0 / (1.0 + (-*m).exp()), epsilon = 1e-6);
        assert!(*p > 0.0 && *p < 1.0);
    }
}

#[test]
fn test_separable_data_classified() {
    let (booster, train) = binary_model(10);
    let labels = labels_of(&train);
    let probs = booster.predict(&train, false, (0, 0)).unwrap();
    let correct = probs
        .column(0)
        .iter()
        .zip(labels.iter())
        .filter(|(p, y)| (**p > 0.5) == (**y > 0.5))
        .count();
    assert!(correct as f64 / labels.len() as f64 > 0.9);
}

#[test]
fn test_empty_range_returns_base_margin() {
    let (booster, train) = binary_model(3);
    let margins = booster.predict(&train, true, (2, 2)).unwrap();
    assert!(margins.iter().all(|&m| m == booster.base_margin()[0]));
}

#[test]
fn test_base_margin_replaces_global_intercept() {
    let (booster, train) = binary_model(3);
    let plain = booster.predict(&train, true, (0, 0)).unwrap();

    let mut shifted = train.clone();
    shifted
        .set_base_margin(Array2::from_elem((train.num_rows(), 1), 2.0))
        .unwrap();
    let with_offset = booster.predict(&shifted, true, (0, 0)).unwrap();

    let delta = 2.0 - booster.base_margin()[0];
    for (a, b) in with_offset.iter().zip(plain.iter()) {
        assert_abs_diff_eq!(*a, *b + delta, epsilon = 1e-5);
    }
}

#[test]
fn test_predict_leaf_indices() {
    let (booster, train) = binary_model(4);
    let leaves = booster.predict_leaf(&train, (0, 0)).unwrap();
    assert_eq!(leaves.dim(), (train.num_rows(), booster.num_trees()));
    for (t, tree) in booster.ensemble().trees().iter().enumerate() {
        for &leaf in leaves.column(t) {
            assert!(tree.node(leaf as usize).unwrap().is_leaf());
        }
    }

    let first_two = booster.predict_leaf(&train, (0, 2)).unwrap();
    assert_eq!(first_two.ncols(), 2);
    assert_eq!(first_two.column(1), leaves.column(1));
}

#[test]
fn test_missing_values_follow_default_direction() {
    let train = regression_matrix(100, 3);
    let config = quiet_config("reg:squarederror").build().unwrap();
    let booster = xgboost_rust::train(config, &train, TrainOptions::new()).unwrap();

    let test = FeatureMatrix::from_dense(Array2::from_elem((5, 3), f32::NAN)).unwrap();
    let predictions = booster.predict(&test, false, (0, 0)).unwrap();
    assert!(predictions.iter().all(|p| p.is_finite()));
    assert!(predictions.iter().all(|&p| p == predictions[[0, 0]]));
}

#[test]
fn test_feature_names_align_columns() {
    let x = create_test_features(80, 3, 21);
    let y = create_test_labels_regression(&x);
    let train = FeatureMatrix::builder(x.clone())
        .labels(y)
        .feature_names(vec!["a", "b", "c"])
        .build()
        .unwrap();
    let config = quiet_config("reg:squarederror").build().unwrap();
    let booster = xgboost_rust::train(config, &train, TrainOptions::new()).unwrap();
    let expected = booster.predict(&train, false, (0, 0)).unwrap();

    let permuted = x.select(ndarray::Axis(1), &[2, 0, 1]);
    let reordered = FeatureMatrix::builder(permuted)
        .feature_names(vec!["c", "a", "b"])
        .build()
        .unwrap();
    assert_eq!(booster.predict(&reordered, false, (0, 0)).unwrap(), expected);

    let renamed = FeatureMatrix::builder(x)
        .feature_names(vec!["a", "b", "d"])
        .build()
        .unwrap();
    let err = booster.predict(&renamed, false, (0, 0)).unwrap_err();
    assert!(matches!(err, XGBoostError::FeatureMismatch { .. }));
}

#[test]
fn test_feature_count_mismatch() {
    let (booster, _) = binary_model(2);
    let narrow = FeatureMatrix::from_dense(Array2::zeros((3, 2))).unwrap();
    let err = booster.predict(&narrow, false, (0, 0)).unwrap_err();
    assert!(matches!(err, XGBoostError::FeatureMismatch { .. }));
}

#[test]
fn test_concurrent_prediction_matches_sequential() {
    let (booster, train) = binary_model(6);
    let expected = booster.predict(&train, false, (0, 0)).unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| booster.predict(&train, false, (0, 0)).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_multiclass_softmax_predicts_class_index() {
    let train = multiclass_matrix(120, 3);
    let config = quiet_config("multi:softmax").num_class(3).build().unwrap();
    let booster = xgboost_rust::train(config, &train, TrainOptions::new()).unwrap();
    let classes = booster.predict(&train, false, (0, 0)).unwrap();
    assert_eq!(classes.ncols(), 1);
    assert!(classes.iter().all(|&c| c == 0.0 || c == 1.0 || c == 2.0));
    let margins = booster.predict(&train, true, (0, 0)).unwrap();
    assert_eq!(margins.ncols(), 3);
}

#[test]
fn test_nthread_does_not_change_predictions() {
    let train = regression_matrix(150, 4);
    let single = quiet_config("reg:squarederror").nthread(1).build().unwrap();
    let multi = quiet_config("reg:squarederror").nthread(4).build().unwrap();
    let a = xgboost_rust::train(single, &train, TrainOptions::new()).unwrap();
    let b = xgboost_rust::train(multi, &train, TrainOptions::new()).unwrap();
    assert_eq!(a.get_dump(true, false), b.get_dump(true, false));
    assert_eq!(
        a.predict(&train, false, (0, 0)).unwrap(),
        b.predict(&train, false, (0, 0)).unwrap()
    );
}
