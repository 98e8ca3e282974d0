//! Integration tests for feature matrix construction.

use ndarray::{array, Array1, Array2};
use xgboost_rust::*;

mod common;
use common::*;

#[test]
fn test_missing_sentinel_becomes_nan() {
    let x = array![[1.0, -999.0], [f32::NAN, 2.0], [3.0, 4.0]];
    let matrix = FeatureMatrix::builder(x).missing(-999.0).build().unwrap();
    assert!(matrix.is_missing(0, 1));
    assert!(matrix.is_missing(1, 0));
    assert!(!matrix.is_missing(2, 0));
    assert!(matrix.value(0, 1).is_nan());
    assert_eq!(matrix.missing_bitmap(1).count(), 1);
}

#[test]
fn test_row_count_mismatch() {
    let x = create_test_features(5, 2, 1);
    let labels = FeatureMatrix::builder(x.clone()).labels(Array1::zeros(4)).build();
    assert!(matches!(labels, Err(XGBoostError::InvalidInput { .. })));

    let weights = FeatureMatrix::builder(x).weights(Array1::ones(6)).build();
    assert!(matches!(weights, Err(XGBoostError::InvalidInput { .. })));
}

#[test]
fn test_entirely_unset_label_rejected() {
    let x = create_test_features(3, 2, 1);
    let err = FeatureMatrix::builder(x)
        .labels(Array1::from_elem(3, f32::NAN))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("entirely unset"));
}

#[test]
fn test_negative_weight_rejected() {
    let x = create_test_features(3, 2, 1);
    let err = FeatureMatrix::builder(x)
        .labels(Array1::zeros(3))
        .weights(array![1.0, -1.0, 1.0])
        .build()
        .unwrap_err();
    assert!(matches!(err, XGBoostError::InvalidInput { .. }));
}

#[test]
fn test_query_ids_and_groups() {
    let x = create_test_features(6, 2, 1);
    let by_qid = FeatureMatrix::builder(x.clone())
        .qid(vec![7, 7, 7, 3, 3, 9])
        .build()
        .unwrap();
    assert_eq!(by_qid.info().group_ptr(), Some(&[0, 3, 5, 6][..]));

    let by_group = FeatureMatrix::builder(x.clone()).group(vec![3, 2, 1]).build().unwrap();
    assert_eq!(by_group.info().group_ptr(), by_qid.info().group_ptr());

    let split = FeatureMatrix::builder(x.clone()).qid(vec![1, 1, 2, 1, 2, 2]).build();
    assert!(split.is_err());

    let short = FeatureMatrix::builder(x).group(vec![3, 2]).build();
    assert!(short.is_err());
}

#[test]
fn test_categorical_validation() {
    let x = array![[0.0], [1.5]];
    let fractional = FeatureMatrix::builder(x)
        .feature_types(vec![FeatureType::Categorical])
        .build();
    assert!(fractional.is_err());

    let x = array![[0.0], [10.0]];
    let too_many = FeatureMatrix::builder(x.clone())
        .feature_types(vec![FeatureType::Categorical])
        .max_categories(5)
        .build();
    assert!(too_many.is_err());

    let ok = FeatureMatrix::builder(x)
        .feature_types(vec![FeatureType::Categorical])
        .build()
        .unwrap();
    assert_eq!(ok.num_categories(0), 11);
}

#[test]
fn test_duplicate_feature_names_rejected() {
    let x = create_test_features(3, 2, 1);
    let result = FeatureMatrix::builder(x).feature_names(vec!["a", "a"]).build();
    assert!(result.is_err());
}

#[test]
fn test_feature_type_parsing() {
    assert_eq!("c".parse::<FeatureType>().unwrap(), FeatureType::Categorical);
    assert_eq!("q".parse::<FeatureType>().unwrap(), FeatureType::Quantitative);
    assert_eq!("i".parse::<FeatureType>().unwrap(), FeatureType::Indicator);
    assert!("x".parse::<FeatureType>().is_err());
}

#[test]
fn test_empty_matrix_rejected() {
    assert!(FeatureMatrix::from_dense(Array2::zeros((0, 3))).is_err());
}

#[test]
fn test_base_margin_shape_checked_at_prediction() {
    let train = regression_matrix(30, 2);
    let config = quiet_config("reg:squarederror").num_boost_round(2).build().unwrap();
    let booster = xgboost_rust::train(config, &train, TrainOptions::new()).unwrap();

    let mut test = train.clone();
    test.set_base_margin(Array2::zeros((30, 3))).unwrap();
    let err = booster.predict(&test, true, (0, 0)).unwrap_err();
    assert!(matches!(err, XGBoostError::Shape { .. }));

    assert!(test.set_base_margin(Array2::zeros((29, 1))).is_err());
}
