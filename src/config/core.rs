//! Core configuration structures and implementation for Pure Rust XGBoost.
//!
//! This module provides the main configuration structure, the builder used to
//! assemble it programmatically, and the flat string parameter interface
//! (`set_param`) used by model documents and configuration export.

use crate::core::constants::*;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Main configuration structure for training and prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Learner parameters
    /// Objective name, e.g. `reg:squarederror` or `binary:logistic`
    pub objective: String,
    /// Number of classes for `multi:*` objectives (0 when unused)
    pub num_class: usize,
    /// Intercept in output space; estimated from labels when `None`
    pub base_score: Option<f32>,
    /// Estimate the intercept from weighted labels when `base_score` is unset
    pub boost_from_average: bool,
    /// Built-in metric names evaluated every round
    pub eval_metric: Vec<String>,
    /// Skip the objective's default metric when `eval_metric` is empty
    pub disable_default_eval_metric: bool,
    /// Number of boosting rounds
    pub num_boost_round: usize,
    /// Stop after this many rounds without improvement on the watched metric
    pub early_stopping_rounds: Option<usize>,
    /// Log one evaluation line per round at info level
    pub verbose_eval: bool,

    // Generic parameters
    /// Random seed for row and column sampling
    pub seed: u64,
    /// Worker threads, 0 for all available cores
    pub nthread: usize,
    /// 0 silent, 1 warning, 2 info, 3 debug
    pub verbosity: usize,

    // Booster parameters
    /// Step size shrinkage applied to every new tree (`eta`)
    pub learning_rate: f64,
    /// Trees grown independently within one round
    pub num_parallel_tree: usize,
    /// How the parallel trees of one round are combined
    pub parallel_tree_combine: ParallelTreeCombine,
    /// Tree construction algorithm
    pub tree_method: TreeMethod,

    // Tree parameters
    /// Node expansion order
    pub grow_policy: GrowPolicy,
    /// Maximum tree depth, 0 for unlimited
    pub max_depth: usize,
    /// Maximum number of leaves, 0 for unlimited
    pub max_leaves: usize,
    /// Maximum number of histogram bins per feature
    pub max_bin: usize,
    /// Minimum Hessian sum in each child
    pub min_child_weight: f64,
    /// Minimum loss reduction required to split (`gamma`)
    pub min_split_loss: f64,
    /// L2 regularization on leaf weights (`lambda`)
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights (`alpha`)
    pub reg_alpha: f64,
    /// Maximum absolute leaf weight before shrinkage, 0 for none
    pub max_delta_step: f64,
    /// Row subsampling ratio per tree
    pub subsample: f64,
    /// Column subsampling ratio per tree
    pub colsample_bytree: f64,
    /// Column subsampling ratio per depth level
    pub colsample_bylevel: f64,
    /// Column subsampling ratio per node
    pub colsample_bynode: f64,
    /// Per-feature monotone constraint: -1, 0 or 1
    pub monotone_constraints: Vec<i8>,
    /// Allowed interaction sets as written by the user, e.g. `[[0, 1], [2, 3, 4]]`
    pub interaction_constraints: Option<String>,
    /// Below this cardinality categorical splits are one-vs-rest
    pub max_cat_to_onehot: usize,
    /// Maximum categories on the left side of a partition split
    pub max_cat_threshold: usize,
    /// Strategy for models with several outputs
    pub multi_strategy: MultiStrategy,

    // Objective parameters
    /// Slope of `reg:pseudohubererror`
    pub huber_slope: f64,
    /// Weight multiplier for positive rows in binary objectives
    pub scale_pos_weight: f64,

    /// Parameters that were not recognized, kept for forward compatibility
    pub unknown_params: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            objective: "reg:squarederror".to_string(),
            num_class: 0,
            base_score: None,
            boost_from_average: true,
            eval_metric: Vec::new(),
            disable_default_eval_metric: false,
            num_boost_round: DEFAULT_NUM_BOOST_ROUND,
            early_stopping_rounds: None,
            verbose_eval: false,
            seed: 0,
            nthread: 0,
            verbosity: DEFAULT_VERBOSITY,
            learning_rate: DEFAULT_LEARNING_RATE,
            num_parallel_tree: 1,
            parallel_tree_combine: ParallelTreeCombine::default(),
            tree_method: TreeMethod::default(),
            grow_policy: GrowPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_leaves: DEFAULT_MAX_LEAVES,
            max_bin: DEFAULT_MAX_BIN,
            min_child_weight: DEFAULT_MIN_CHILD_WEIGHT,
            min_split_loss: DEFAULT_MIN_SPLIT_LOSS,
            reg_lambda: DEFAULT_REG_LAMBDA,
            reg_alpha: DEFAULT_REG_ALPHA,
            max_delta_step: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            colsample_bylevel: 1.0,
            colsample_bynode: 1.0,
            monotone_constraints: Vec::new(),
            interaction_constraints: None,
            max_cat_to_onehot: DEFAULT_MAX_CAT_TO_ONEHOT,
            max_cat_threshold: DEFAULT_MAX_CAT_THRESHOLD,
            multi_strategy: MultiStrategy::default(),
            huber_slope: DEFAULT_HUBER_SLOPE,
            scale_pos_weight: 1.0,
            unknown_params: BTreeMap::new(),
        }
    }
}

/// Named groups of parameters, mirroring the sections of the exported
/// configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSection {
    Generic,
    LearnerTrain,
    GbtreeModel,
    GbtreeTrain,
    TreeTrain,
    Objective,
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse::<T>().map_err(|e| {
        XGBoostError::invalid_parameter(key, value, format!("cannot parse value: {}", e))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" | "True" => Ok(true),
        "0" | "false" | "False" => Ok(false),
        other => Err(XGBoostError::invalid_parameter(
            key,
            other,
            "expected a boolean (true/false/1/0)",
        )),
    }
}

/// Parses `(1,0,-1)`, `[1, 0, -1]` or `1,0,-1`.
fn parse_monotone(value: &str) -> Result<Vec<i8>> {
    let inner = value
        .trim()
        .trim_start_matches(|c| c == '(' || c == '[')
        .trim_end_matches(|c| c == ')' || c == ']');
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|item| parse_value::<i8>("monotone_constraints", item))
        .collect()
}

fn format_monotone(constraints: &[i8]) -> String {
    let items: Vec<String> = constraints.iter().map(|c| c.to_string()).collect();
    format!("({})", items.join(","))
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Random-forest preset: a single round of `num_trees` parallel trees,
    /// each fitted on a subsample of rows and columns.
    pub fn random_forest(num_trees: usize) -> Self {
        Config {
            learning_rate: 1.0,
            subsample: 0.8,
            colsample_bynode: 0.8,
            reg_lambda: 1e-5,
            num_boost_round: 1,
            num_parallel_tree: num_trees,
            ..Config::default()
        }
    }

    /// Builds a configuration from `(key, value)` string pairs and validates it.
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Config::default();
        for (key, value) in params {
            config.set_param(key.as_ref(), value.as_ref())?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Sets a single parameter by name.
    ///
    /// Aliases (`learning_rate`/`eta`, `reg_lambda`/`lambda`, ...) are
    /// accepted. Unknown names produce a warning and are retained in
    /// [`Config::unknown_params`] instead of failing.
    pub fn set_param(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "objective" => self.objective = value.trim().to_string(),
            "num_class" => self.num_class = parse_value(key, value)?,
            "base_score" => self.base_score = Some(parse_value(key, value)?),
            "boost_from_average" => self.boost_from_average = parse_bool(key, value)?,
            "eval_metric" => {
                self.eval_metric = value
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
            }
            "disable_default_eval_metric" => {
                self.disable_default_eval_metric = parse_bool(key, value)?
            }
            "num_boost_round" | "n_estimators" => self.num_boost_round = parse_value(key, value)?,
            "early_stopping_rounds" => {
                self.early_stopping_rounds = match value.trim() {
                    "" | "none" | "None" => None,
                    v => Some(parse_value(key, v)?),
                }
            }
            "verbose_eval" => self.verbose_eval = parse_bool(key, value)?,
            "seed" | "random_state" => self.seed = parse_value(key, value)?,
            "nthread" | "n_jobs" => self.nthread = parse_value(key, value)?,
            "verbosity" => self.verbosity = parse_value(key, value)?,
            "eta" | "learning_rate" => self.learning_rate = parse_value(key, value)?,
            "num_parallel_tree" => self.num_parallel_tree = parse_value(key, value)?,
            "parallel_tree_combine" => self.parallel_tree_combine = value.trim().parse()?,
            "tree_method" => self.tree_method = value.trim().parse()?,
            "grow_policy" => self.grow_policy = value.trim().parse()?,
            "max_depth" => self.max_depth = parse_value(key, value)?,
            "max_leaves" => self.max_leaves = parse_value(key, value)?,
            "max_bin" => self.max_bin = parse_value(key, value)?,
            "min_child_weight" => self.min_child_weight = parse_value(key, value)?,
            "gamma" | "min_split_loss" => self.min_split_loss = parse_value(key, value)?,
            "lambda" | "reg_lambda" => self.reg_lambda = parse_value(key, value)?,
            "alpha" | "reg_alpha" => self.reg_alpha = parse_value(key, value)?,
            "max_delta_step" => self.max_delta_step = parse_value(key, value)?,
            "subsample" => self.subsample = parse_value(key, value)?,
            "colsample_bytree" => self.colsample_bytree = parse_value(key, value)?,
            "colsample_bylevel" => self.colsample_bylevel = parse_value(key, value)?,
            "colsample_bynode" => self.colsample_bynode = parse_value(key, value)?,
            "monotone_constraints" => self.monotone_constraints = parse_monotone(value)?,
            "interaction_constraints" => {
                self.interaction_constraints = match value.trim() {
                    "" => None,
                    v => Some(v.to_string()),
                }
            }
            "max_cat_to_onehot" => self.max_cat_to_onehot = parse_value(key, value)?,
            "max_cat_threshold" => self.max_cat_threshold = parse_value(key, value)?,
            "multi_strategy" => self.multi_strategy = value.trim().parse()?,
            "huber_slope" => self.huber_slope = parse_value(key, value)?,
            "scale_pos_weight" => self.scale_pos_weight = parse_value(key, value)?,
            _ => {
                log::warn!(
                    "Parameter '{}' is not used by this version and will be ignored",
                    key
                );
                self.unknown_params.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Current value of the parameters belonging to `section`, as strings.
    pub fn section_params(&self, section: ParamSection) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            params.insert(key.to_string(), value);
        };
        match section {
            ParamSection::Generic => {
                put("nthread", self.nthread.to_string());
                put("seed", self.seed.to_string());
                put("verbosity", self.verbosity.to_string());
            }
            ParamSection::LearnerTrain => {
                put("objective", self.objective.clone());
                put("eval_metric", self.eval_metric.join(","));
                put(
                    "disable_default_eval_metric",
                    self.disable_default_eval_metric.to_string(),
                );
                put("boost_from_average", self.boost_from_average.to_string());
                put("num_boost_round", self.num_boost_round.to_string());
                put(
                    "early_stopping_rounds",
                    self.early_stopping_rounds
                        .map(|r| r.to_string())
                        .unwrap_or_default(),
                );
                put("verbose_eval", self.verbose_eval.to_string());
            }
            ParamSection::GbtreeModel => {
                put("num_parallel_tree", self.num_parallel_tree.to_string());
            }
            ParamSection::GbtreeTrain => {
                put("tree_method", self.tree_method.to_string());
                put("parallel_tree_combine", self.parallel_tree_combine.to_string());
            }
            ParamSection::TreeTrain => {
                put("eta", self.learning_rate.to_string());
                put("grow_policy", self.grow_policy.to_string());
                put("max_depth", self.max_depth.to_string());
                put("max_leaves", self.max_leaves.to_string());
                put("max_bin", self.max_bin.to_string());
                put("min_child_weight", self.min_child_weight.to_string());
                put("gamma", self.min_split_loss.to_string());
                put("lambda", self.reg_lambda.to_string());
                put("alpha", self.reg_alpha.to_string());
                put("max_delta_step", self.max_delta_step.to_string());
                put("subsample", self.subsample.to_string());
                put("colsample_bytree", self.colsample_bytree.to_string());
                put("colsample_bylevel", self.colsample_bylevel.to_string());
                put("colsample_bynode", self.colsample_bynode.to_string());
                put(
                    "monotone_constraints",
                    format_monotone(&self.monotone_constraints),
                );
                put(
                    "interaction_constraints",
                    self.interaction_constraints.clone().unwrap_or_default(),
                );
                put("max_cat_to_onehot", self.max_cat_to_onehot.to_string());
                put("max_cat_threshold", self.max_cat_threshold.to_string());
                put("multi_strategy", self.multi_strategy.to_string());
            }
            ParamSection::Objective => {
                put("num_class", self.num_class.to_string());
                put("huber_slope", self.huber_slope.to_string());
                put("scale_pos_weight", self.scale_pos_weight.to_string());
                if let Some(base_score) = self.base_score {
                    put("base_score", base_score.to_string());
                }
            }
        }
        params
    }

    /// Parses [`Config::interaction_constraints`] into feature index sets.
    pub fn interaction_sets(&self) -> Result<Vec<Vec<FeatureIndex>>> {
        match &self.interaction_constraints {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str::<Vec<Vec<FeatureIndex>>>(raw).map_err(|e| {
                XGBoostError::invalid_parameter(
                    "interaction_constraints",
                    raw.as_str(),
                    format!("expected a nested list of feature indices: {}", e),
                )
            }),
        }
    }

    /// Worker threads to use, resolving 0 to the number of cores.
    pub fn effective_num_threads(&self) -> usize {
        if self.nthread == 0 {
            num_cpus::get()
        } else {
            self.nthread
        }
    }

    /// Learning rate applied to every tree of one round.
    pub fn tree_learning_rate(&self) -> f64 {
        match self.parallel_tree_combine {
            ParallelTreeCombine::Average => self.learning_rate / self.num_parallel_tree.max(1) as f64,
            ParallelTreeCombine::Sum => self.learning_rate,
        }
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        crate::config::validation::validate_config(self)
    }
}

/// Builder for [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
    config: Config,
    errors: Vec<XGBoostError>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
            errors: Vec::new(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: Config) -> Self {
        ConfigBuilder {
            config,
            errors: Vec::new(),
        }
    }

    /// Set the objective by name
    pub fn objective<S: Into<String>>(mut self, objective: S) -> Self {
        self.config.objective = objective.into();
        self
    }

    /// Set the number of classes
    pub fn num_class(mut self, num_class: usize) -> Self {
        self.config.num_class = num_class;
        self
    }

    /// Set the intercept
    pub fn base_score(mut self, base_score: f32) -> Self {
        self.config.base_score = Some(base_score);
        self
    }

    /// Add a built-in evaluation metric
    pub fn eval_metric<S: Into<String>>(mut self, metric: S) -> Self {
        self.config.eval_metric.push(metric.into());
        self
    }

    /// Set the number of boosting rounds
    pub fn num_boost_round(mut self, rounds: usize) -> Self {
        self.config.num_boost_round = rounds;
        self
    }

    /// Set early stopping patience
    pub fn early_stopping_rounds(mut self, rounds: usize) -> Self {
        self.config.early_stopping_rounds = Some(rounds);
        self
    }

    /// Log one evaluation line per round
    pub fn verbose_eval(mut self, verbose: bool) -> Self {
        self.config.verbose_eval = verbose;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.config.learning_rate = rate;
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the number of worker threads
    pub fn nthread(mut self, threads: usize) -> Self {
        self.config.nthread = threads;
        self
    }

    /// Set log verbosity
    pub fn verbosity(mut self, verbosity: usize) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    /// Set the number of trees grown per round
    pub fn num_parallel_tree(mut self, trees: usize) -> Self {
        self.config.num_parallel_tree = trees;
        self
    }

    /// Set how parallel trees are combined
    pub fn parallel_tree_combine(mut self, combine: ParallelTreeCombine) -> Self {
        self.config.parallel_tree_combine = combine;
        self
    }

    /// Set the tree construction algorithm
    pub fn tree_method(mut self, method: TreeMethod) -> Self {
        self.config.tree_method = method;
        self
    }

    /// Set the expansion order
    pub fn grow_policy(mut self, policy: GrowPolicy) -> Self {
        self.config.grow_policy = policy;
        self
    }

    /// Set the maximum depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the maximum number of leaves
    pub fn max_leaves(mut self, leaves: usize) -> Self {
        self.config.max_leaves = leaves;
        self
    }

    /// Set the maximum number of bins
    pub fn max_bin(mut self, max_bin: usize) -> Self {
        self.config.max_bin = max_bin;
        self
    }

    /// Set the minimum child Hessian sum
    pub fn min_child_weight(mut self, weight: f64) -> Self {
        self.config.min_child_weight = weight;
        self
    }

    /// Set the minimum split loss (`gamma`)
    pub fn min_split_loss(mut self, gamma: f64) -> Self {
        self.config.min_split_loss = gamma;
        self
    }

    /// Set L2 regularization
    pub fn reg_lambda(mut self, lambda: f64) -> Self {
        self.config.reg_lambda = lambda;
        self
    }

    /// Set L1 regularization
    pub fn reg_alpha(mut self, alpha: f64) -> Self {
        self.config.reg_alpha = alpha;
        self
    }

    /// Set the maximum delta step
    pub fn max_delta_step(mut self, step: f64) -> Self {
        self.config.max_delta_step = step;
        self
    }

    /// Set row subsampling
    pub fn subsample(mut self, ratio: f64) -> Self {
        self.config.subsample = ratio;
        self
    }

    /// Set per-tree column subsampling
    pub fn colsample_bytree(mut self, ratio: f64) -> Self {
        self.config.colsample_bytree = ratio;
        self
    }

    /// Set per-level column subsampling
    pub fn colsample_bylevel(mut self, ratio: f64) -> Self {
        self.config.colsample_bylevel = ratio;
        self
    }

    /// Set per-node column subsampling
    pub fn colsample_bynode(mut self, ratio: f64) -> Self {
        self.config.colsample_bynode = ratio;
        self
    }

    /// Set monotone constraints
    pub fn monotone_constraints(mut self, constraints: Vec<i8>) -> Self {
        self.config.monotone_constraints = constraints;
        self
    }

    /// Set interaction constraints from index sets
    pub fn interaction_constraints(mut self, sets: Vec<Vec<FeatureIndex>>) -> Self {
        let rendered: Vec<String> = sets
            .iter()
            .map(|set| {
                let items: Vec<String> = set.iter().map(|f| f.to_string()).collect();
                format!("[{}]", items.join(", "))
            })
            .collect();
        self.config.interaction_constraints = Some(format!("[{}]", rendered.join(", ")));
        self
    }

    /// Set the one-hot threshold for categorical features
    pub fn max_cat_to_onehot(mut self, threshold: usize) -> Self {
        self.config.max_cat_to_onehot = threshold;
        self
    }

    /// Set the partition size limit for categorical features
    pub fn max_cat_threshold(mut self, threshold: usize) -> Self {
        self.config.max_cat_threshold = threshold;
        self
    }

    /// Set the multi-output strategy
    pub fn multi_strategy(mut self, strategy: MultiStrategy) -> Self {
        self.config.multi_strategy = strategy;
        self
    }

    /// Set an arbitrary parameter by name
    pub fn param(mut self, key: &str, value: &str) -> Self {
        if let Err(e) = self.config.set_param(key, value) {
            self.errors.push(e);
        }
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> Result<Config> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.objective, "reg:squarederror");
        assert_eq!(config.learning_rate, DEFAULT_LEARNING_RATE);
        assert_eq!(config.tree_method, TreeMethod::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_set_param_aliases() {
        let mut config = Config::default();
        config.set_param("eta", "0.1").unwrap();
        config.set_param("reg_lambda", "2").unwrap();
        config.set_param("gamma", "0.5").unwrap();
        config.set_param("n_jobs", "4").unwrap();
        assert_eq!(config.learning_rate, 0.1);
        assert_eq!(config.reg_lambda, 2.0);
        assert_eq!(config.min_split_loss, 0.5);
        assert_eq!(config.nthread, 4);
    }

    #[test]
    fn test_unknown_param_is_kept() {
        let mut config = Config::default();
        config.set_param("future_param", "42").unwrap();
        assert_eq!(config.unknown_params.get("future_param").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_bad_value_is_rejected() {
        let mut config = Config::default();
        let err = config.set_param("max_depth", "deep").unwrap_err();
        assert!(matches!(err, XGBoostError::InvalidParameter { .. }));
    }

    #[test]
    fn test_monotone_parsing_and_export() {
        let mut config = Config::default();
        config.set_param("monotone_constraints", "(1, 0,-1)").unwrap();
        assert_eq!(config.monotone_constraints, vec![1, 0, -1]);
        let params = config.section_params(ParamSection::TreeTrain);
        assert_eq!(params["monotone_constraints"], "(1,0,-1)");
    }

    #[test]
    fn test_interaction_constraints_round_trip() {
        let config = ConfigBuilder::new()
            .interaction_constraints(vec![vec![0, 1], vec![2, 3, 4]])
            .build()
            .unwrap();
        assert_eq!(
            config.interaction_constraints.as_deref(),
            Some("[[0, 1], [2, 3, 4]]")
        );
        assert_eq!(config.interaction_sets().unwrap(), vec![vec![0, 1], vec![2, 3, 4]]);
    }

    #[test]
    fn test_random_forest_preset() {
        let config = Config::random_forest(4);
        assert_eq!(config.num_parallel_tree, 4);
        assert_eq!(config.num_boost_round, 1);
        assert_eq!(config.learning_rate, 1.0);
        assert!((config.tree_learning_rate() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_from_params_validates() {
        let config = Config::from_params([("objective", "binary:logistic"), ("max_depth", "2")]).unwrap();
        assert_eq!(config.max_depth, 2);
        assert!(Config::from_params([("subsample", "1.5")]).is_err());
    }

    #[test]
    fn test_builder_surfaces_param_errors() {
        let result = ConfigBuilder::new().param("tree_method", "gpu").build();
        assert!(result.is_err());
    }
}
