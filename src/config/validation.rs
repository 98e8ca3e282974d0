//! Configuration validation for Pure Rust XGBoost.
//!
//! Range checks run before training begins so that a bad parameter fails
//! fast, before any data is binned or any tree is grown.

use crate::config::core::Config;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::{MultiStrategy, TreeMethod};

fn check_ratio(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(XGBoostError::invalid_parameter(
            name,
            value.to_string(),
            "must be in range (0.0, 1.0]",
        ));
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(XGBoostError::invalid_parameter(
            name,
            value.to_string(),
            "must be a finite non-negative number",
        ));
    }
    Ok(())
}

/// Validates every parameter of `config`.
pub fn validate_config(config: &Config) -> Result<()> {
    if !(config.learning_rate > 0.0) || !config.learning_rate.is_finite() {
        return Err(XGBoostError::invalid_parameter(
            "learning_rate",
            config.learning_rate.to_string(),
            "must be positive",
        ));
    }

    if config.num_parallel_tree == 0 {
        return Err(XGBoostError::invalid_parameter(
            "num_parallel_tree",
            "0",
            "must be at least 1",
        ));
    }

    if config.max_bin < 2 {
        return Err(XGBoostError::invalid_parameter(
            "max_bin",
            config.max_bin.to_string(),
            "must be at least 2",
        ));
    }

    if config.max_leaves == 1 {
        return Err(XGBoostError::invalid_parameter(
            "max_leaves",
            "1",
            "must be 0 (unlimited) or at least 2",
        ));
    }

    check_ratio("subsample", config.subsample)?;
    check_ratio("colsample_bytree", config.colsample_bytree)?;
    check_ratio("colsample_bylevel", config.colsample_bylevel)?;
    check_ratio("colsample_bynode", config.colsample_bynode)?;

    check_non_negative("min_child_weight", config.min_child_weight)?;
    check_non_negative("gamma", config.min_split_loss)?;
    check_non_negative("lambda", config.reg_lambda)?;
    check_non_negative("alpha", config.reg_alpha)?;
    check_non_negative("max_delta_step", config.max_delta_step)?;
    check_non_negative("scale_pos_weight", config.scale_pos_weight)?;

    if !(config.huber_slope > 0.0) {
        return Err(XGBoostError::invalid_parameter(
            "huber_slope",
            config.huber_slope.to_string(),
            "must be positive",
        ));
    }

    if let Some(&bad) = config
        .monotone_constraints
        .iter()
        .find(|c| !(-1..=1).contains(*c))
    {
        return Err(XGBoostError::invalid_parameter(
            "monotone_constraints",
            bad.to_string(),
            "each constraint must be -1, 0 or 1",
        ));
    }

    config.interaction_sets()?;

    if config.objective.starts_with("multi:") && config.num_class < 2 {
        return Err(XGBoostError::invalid_parameter(
            "num_class",
            config.num_class.to_string(),
            "multiclass objectives require num_class >= 2",
        ));
    }

    if let Some(base_score) = config.base_score {
        if !base_score.is_finite() {
            return Err(XGBoostError::invalid_parameter(
                "base_score",
                base_score.to_string(),
                "must be finite",
            ));
        }
    }

    if config.multi_strategy == MultiStrategy::MultiOutputTree {
        if config.monotone_constraints.iter().any(|&c| c != 0) {
            return Err(XGBoostError::unsupported(
                "monotone constraints are not supported with multi_output_tree",
            ));
        }
        if config.tree_method.resolve() == TreeMethod::Exact {
            return Err(XGBoostError::unsupported(
                "multi_output_tree requires tree_method hist or approx",
            ));
        }
    }

    if config.early_stopping_rounds == Some(0) {
        return Err(XGBoostError::invalid_parameter(
            "early_stopping_rounds",
            "0",
            "must be at least 1",
        ));
    }

    Ok(())
}
