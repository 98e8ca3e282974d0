//! Integration tests for model persistence and configuration export.

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use serde_json::Value;
use xgboost_rust::*;

mod common;
use common::*;

fn trained(config: ConfigBuilder, train: &FeatureMatrix) -> Booster {
    xgboost_rust::train(config.build().unwrap(), train, TrainOptions::new()).unwrap()
}

fn config_json(booster: &Booster) -> Value {
    serde_json::from_str(&booster.save_config().unwrap()).unwrap()
}

#[test]
fn test_json_round_trip_is_bit_identical() {
    let x = create_test_features(120, 4, 8);
    let y = create_test_labels_binary(&x);
    let train = FeatureMatrix::builder(x)
        .labels(y)
        .feature_names(vec!["f0", "f1", "f2", "f3"])
        .build()
        .unwrap();
    let booster = trained(quiet_config("binary:logistic").num_parallel_tree(2), &train);

    let loaded = Booster::from_json(&booster.to_json().unwrap()).unwrap();
    assert_eq!(loaded.num_boosted_rounds(), booster.num_boosted_rounds());
    assert_eq!(loaded.num_trees(), 20);
    assert_eq!(loaded.ensemble().num_parallel_tree(), 2);
    assert_eq!(loaded.feature_names(), booster.feature_names());
    assert_eq!(loaded.base_score(), booster.base_score());
    assert_eq!(
        loaded.predict(&train, true, (0, 0)).unwrap(),
        booster.predict(&train, true, (0, 0)).unwrap()
    );
    assert_eq!(loaded.get_dump(true, true), booster.get_dump(true, true));
}

#[test]
fn test_binary_file_round_trip() {
    let train = multiclass_matrix(90, 3);
    let booster = trained(quiet_config("multi:softprob").num_class(3), &train);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.ubj");
    booster.save_model(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], BINARY_MODEL_MAGIC);

    let loaded = Booster::load_model(&path).unwrap();
    assert_eq!(loaded.num_outputs(), 3);
    assert_eq!(loaded.objective().name(), "multi:softprob");
    assert_eq!(
        loaded.predict(&train, false, (0, 0)).unwrap(),
        booster.predict(&train, false, (0, 0)).unwrap()
    );
}

#[test]
fn test_rounds_survive_save_and_load() {
    let train = regression_matrix(60, 3);
    let booster = trained(quiet_config("reg:squarederror").num_boost_round(7), &train);
    let dir = tempfile::tempdir().unwrap();
    for name in ["model.json", "model.bin"] {
        let path = dir.path().join(name);
        booster.save_model(&path).unwrap();
        assert_eq!(Booster::load_model(&path).unwrap().num_boosted_rounds(), 7);
    }
}

#[test]
fn test_attributes_persist() {
    let train = regression_matrix(40, 3);
    let mut booster = trained(quiet_config("reg:squarederror").num_boost_round(2), &train);
    booster.set_attr("owner", Some("forecasting"));
    booster.set_attr("scratch", Some("x"));
    booster.set_attr("scratch", None);

    let loaded = Booster::from_json(&booster.to_json().unwrap()).unwrap();
    assert_eq!(loaded.attr("owner"), Some("forecasting"));
    assert_eq!(loaded.attr("scratch"), None);
}

#[test]
fn test_model_document_layout() {
    let train = regression_matrix(50, 3);
    let booster = trained(
        quiet_config("reg:squarederror")
            .num_parallel_tree(3)
            .num_boost_round(2),
        &train,
    );
    let doc: Value = serde_json::from_str(&booster.to_json().unwrap()).unwrap();

    assert_eq!(doc["version"], serde_json::json!(MODEL_FORMAT_VERSION));
    let gbtree = &doc["learner"]["gradient_booster"];
    assert_eq!(gbtree["name"], "gbtree");
    assert_eq!(gbtree["gbtree_model_param"]["num_parallel_tree"], "3");
    assert_eq!(gbtree["gbtree_model_param"]["num_trees"], "6");
    assert_eq!(gbtree["gbtree_train_param"]["tree_method"], "hist");
    assert_eq!(gbtree["model"]["iteration_indptr"], serde_json::json!([0, 3, 6]));
    assert_eq!(doc["learner"]["objective"]["name"], "reg:squarederror");
    assert_eq!(doc["learner"]["learner_model_param"]["num_feature"], "3");
}

#[test]
fn test_version_compatibility() {
    let train = regression_matrix(40, 3);
    let booster = trained(quiet_config("reg:squarederror").num_boost_round(2), &train);
    let doc: Value = serde_json::from_str(&booster.to_json().unwrap()).unwrap();

    let with_version = |major: u32, minor: u32| {
        let mut doc = doc.clone();
        doc["version"] = serde_json::json!([major, minor, 0]);
        doc["learner"]["added_in_a_later_minor"] = serde_json::json!("ignored");
        serde_json::to_string(&doc).unwrap()
    };

    let newer_major = with_version(MODEL_FORMAT_VERSION[0] + 1, 0);
    let err = Booster::from_json(&newer_major).unwrap_err();
    assert!(matches!(err, XGBoostError::IncompatibleVersion { .. }));

    let older_minor = Booster::from_json(&with_version(MODEL_FORMAT_VERSION[0], 0)).unwrap();
    assert_eq!(older_minor.num_boosted_rounds(), 2);

    let newer_minor =
        Booster::from_json(&with_version(MODEL_FORMAT_VERSION[0], MODEL_FORMAT_VERSION[1] + 1)).unwrap();
    assert_eq!(
        newer_minor.predict(&train, false, (0, 0)).unwrap(),
        booster.predict(&train, false, (0, 0)).unwrap()
    );
}

#[test]
fn test_corrupt_model_rejected() {
    assert!(Booster::from_bytes(b"").is_err());
    assert!(Booster::from_bytes(b"{\"version\": [2, 1, 0]}").is_err());
    let mut truncated = BINARY_MODEL_MAGIC.to_vec();
    truncated.extend_from_slice(&[2, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 9]);
    assert!(Booster::from_bytes(&truncated).is_err());
}

fn model_doc(booster: &Booster) -> Value {
    serde_json::from_str(&booster.to_json().unwrap()).unwrap()
}

#[test]
fn test_split_feature_outside_model_rejected() {
    let train = regression_matrix(60, 2);
    let booster = trained(quiet_config("reg:squarederror").num_boost_round(2), &train);
    let mut doc = model_doc(&booster);
    let tree = &mut doc["learner"]["gradient_booster"]["model"]["trees"][0];
    assert_ne!(tree["left_children"][0], serde_json::json!(-1));
    tree["split_indices"][0] = serde_json::json!(7);

    let err = Booster::from_json(&doc.to_string()).unwrap_err();
    assert!(matches!(err, XGBoostError::Serialization { .. }), "{}", err);
}

#[test]
fn test_partial_rounds_rejected() {
    let train = regression_matrix(60, 2);
    let booster = trained(
        quiet_config("reg:squarederror").num_boost_round(2).num_parallel_tree(2),
        &train,
    );
    for indptr in [serde_json::json!([0, 1, 4]), serde_json::json!([0, 4])] {
        let mut doc = model_doc(&booster);
        doc["learner"]["gradient_booster"]["model"]["iteration_indptr"] = indptr;
        let err = Booster::from_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, XGBoostError::Serialization { .. }), "{}", err);
    }
}

#[test]
fn test_base_score_per_target_round_trip() {
    let x = create_test_features(80, 3, 21);
    let y = Array2::from_shape_fn((80, 2), |(i, t)| if t == 0 { x[[i, 0]] } else { 100.0 + x[[i, 1]] });
    let train = FeatureMatrix::builder(x).labels_2d(y).build().unwrap();
    let booster = trained(quiet_config("reg:squarederror").num_boost_round(3), &train);

    let doc = model_doc(&booster);
    let stored = doc["learner"]["learner_model_param"]["base_score"].as_str().unwrap().to_string();
    assert!(stored.starts_with('['), "{}", stored);
    let parsed: Vec<f32> = serde_json::from_str(&stored).unwrap();
    assert_eq!(parsed, booster.base_score());

    let loaded = Booster::from_json(&booster.to_json().unwrap()).unwrap();
    assert_eq!(loaded.base_score(), booster.base_score());
    assert_eq!(
        loaded.predict(&train, true, (0, 0)).unwrap(),
        booster.predict(&train, true, (0, 0)).unwrap()
    );
}

#[test]
fn test_scalar_base_score_applies_to_every_output() {
    let x = create_test_features(40, 2, 22);
    let y = Array2::from_shape_fn((40, 2), |(i, t)| x[[i, t]]);
    let train = FeatureMatrix::builder(x).labels_2d(y).build().unwrap();
    let booster = trained(quiet_config("reg:squarederror").num_boost_round(2), &train);

    let mut doc = model_doc(&booster);
    doc["version"] = serde_json::json!([MODEL_FORMAT_VERSION[0], 0, 0]);
    doc["learner"]["learner_model_param"]["base_score"] = serde_json::json!("0.25");
    let loaded = Booster::from_json(&doc.to_string()).unwrap();
    assert_eq!(loaded.base_score(), &[0.25, 0.25]);

    doc["learner"]["learner_model_param"]["base_score"] = serde_json::json!("[0.25,0.5,0.75]");
    assert!(Booster::from_json(&doc.to_string()).is_err());
}

#[test]
fn test_tree_method_resolved_on_save() {
    let train = regression_matrix(40, 3);
    let booster = trained(quiet_config("reg:squarederror").num_boost_round(2), &train);
    let before = config_json(&booster);
    assert_eq!(
        before["learner"]["gradient_booster"]["gbtree_train_param"]["tree_method"],
        "auto"
    );

    let loaded = Booster::from_json(&booster.to_json().unwrap()).unwrap();
    let after = config_json(&loaded);
    assert_eq!(
        after["learner"]["gradient_booster"]["gbtree_train_param"]["tree_method"],
        "hist"
    );
}

#[test]
fn test_save_config_reports_parameters() {
    let train = regression_matrix(50, 4);
    let mut booster = trained(
        quiet_config("reg:squarederror")
            .num_parallel_tree(2)
            .param("interaction_constraints", "[[0, 1], [2, 3]]")
            .num_boost_round(2),
        &train,
    );
    booster.set_param("nthread", "3").unwrap();

    let config = config_json(&booster);
    let learner = &config["learner"];
    assert_eq!(learner["generic_param"]["nthread"], "3");
    assert_eq!(
        learner["gradient_booster"]["gbtree_model_param"]["num_parallel_tree"],
        "2"
    );
    assert_eq!(
        learner["gradient_booster"]["tree_train_param"]["interaction_constraints"],
        "[[0, 1], [2, 3]]"
    );
    assert_eq!(learner["learner_model_param"]["num_feature"], "4");
}

#[test]
fn test_save_config_num_target() {
    let x = create_test_features(60, 3, 2);
    let y = Array2::from_shape_fn((60, 2), |(i, t)| x[[i, t]]);
    let train = FeatureMatrix::builder(x).labels_2d(y).build().unwrap();
    let booster = trained(quiet_config("reg:squarederror").num_boost_round(2), &train);

    let config = config_json(&booster);
    assert_eq!(config["learner"]["learner_model_param"]["num_target"], "2");
    assert_eq!(config["learner"]["learner_model_param"]["num_class"], "0");

    let loaded = Booster::from_json(&booster.to_json().unwrap()).unwrap();
    assert_eq!(loaded.num_outputs(), 2);
}

#[test]
fn test_load_config_round_trip() {
    let train = regression_matrix(40, 3);
    let source = trained(
        quiet_config("reg:squarederror")
            .learning_rate(0.05)
            .max_depth(4)
            .seed(17)
            .num_boost_round(2),
        &train,
    );
    let mut target = trained(quiet_config("reg:squarederror").num_boost_round(2), &train);
    target.load_config(&source.save_config().unwrap()).unwrap();

    assert_abs_diff_eq!(target.config().learning_rate, 0.05);
    assert_eq!(target.config().max_depth, 4);
    assert_eq!(target.config().seed, 17);
    assert_eq!(target.save_config().unwrap(), source.save_config().unwrap());
}

#[test]
fn test_custom_objective_model_loads_detached() {
    let train = regression_matrix(60, 3);
    let objective = CustomObjective::new(1, |margins, info| {
        let labels = info.labels()?;
        Ok((&margins - &labels, Array2::ones(margins.dim())))
    });
    let config = quiet_config("reg:squarederror").num_boost_round(3).build().unwrap();
    let booster = xgboost_rust::train(config.clone(), &train, TrainOptions::new().objective(objective)).unwrap();

    let loaded = Booster::from_json(&booster.to_json().unwrap()).unwrap();
    assert_eq!(loaded.objective().name(), "custom");
    assert_eq!(
        loaded.predict(&train, false, (0, 0)).unwrap(),
        booster.predict(&train, false, (0, 0)).unwrap()
    );

    let err = GradientBooster::resume(loaded, config, &train, TrainOptions::new()).unwrap_err();
    assert!(matches!(err, XGBoostError::Config { .. }));
}

#[test]
fn test_categorical_model_round_trip() {
    let train = categorical_matrix(200);
    let booster = trained(quiet_config("reg:squarederror").max_cat_to_onehot(1), &train);
    let loaded = Booster::from_bytes(&booster.to_bytes(SerializationFormat::Binary).unwrap()).unwrap();

    assert_eq!(loaded.feature_types(), booster.feature_types());
    assert_eq!(
        loaded.predict(&train, false, (0, 0)).unwrap(),
        booster.predict(&train, false, (0, 0)).unwrap()
    );
}
