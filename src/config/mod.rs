//! Configuration management for Pure Rust XGBoost.
//!
//! Training parameters live in a single [`Config`] struct which can be
//! assembled with [`ConfigBuilder`], or from a flat mapping of string
//! parameters through [`Config::set_param`] / [`Config::from_params`].

pub mod core;
pub mod validation;

pub use self::core::{Config, ConfigBuilder, ParamSection};
pub use self::validation::validate_config;
