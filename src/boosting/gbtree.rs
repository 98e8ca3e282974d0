//! Gradient boosted trees for the Pure Rust XGBoost framework.
//!
//! [`GradientBooster`] creates a [`BoosterState`] for a training run, either
//! from scratch or on top of a previously trained [`Booster`]. The state is
//! advanced one boosting round at a time:
//!
//! 1. the objective turns the cached training margins into gradient pairs,
//! 2. one tree per output and parallel tree is grown from them,
//! 3. the margin caches of the training and evaluation sets are updated,
//! 4. every metric is evaluated on every evaluation set,
//! 5. the early stopping rule inspects the most recent score.
//!
//! A failing round leaves the rounds committed before it intact.

use crate::boosting::booster::{build_thread_pool, Booster};
use crate::boosting::early_stopping::EarlyStoppingState;
use crate::boosting::ensemble::TreeEnsemble;
use crate::boosting::history::EvalHistory;
use crate::config::Config;
use crate::core::constants::DEFAULT_BASE_SCORE;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::{GradientPair, MultiStrategy, TreeMethod};
use crate::dataset::{FeatureMatrix, FeatureSchema};
use crate::metrics::{CustomMetric, MetricSet};
use crate::objective::{create_objective_function, CustomObjective, ObjectiveFunction};
use crate::prediction::predictor::{initial_margins, Predictor};
use crate::tree::sampling::tree_seed;
use crate::tree::{BinnedMatrix, HistogramCuts, RegTree, SortedColumns, SplitSource, TreeGrower};
use ndarray::{s, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Optional inputs of a training run besides the configuration.
#[derive(Debug, Default)]
pub struct TrainOptions<'a> {
    evals: Vec<(&'a FeatureMatrix, String)>,
    objective: Option<CustomObjective>,
    custom_metrics: Vec<CustomMetric>,
}

impl<'a> TrainOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named evaluation set.
    pub fn eval<S: Into<String>>(mut self, matrix: &'a FeatureMatrix, name: S) -> Self {
        self.evals.push((matrix, name.into()));
        self
    }

    /// Adds evaluation sets named `validation_0`, `validation_1`, ...
    pub fn evals<I>(mut self, matrices: I) -> Self
    where
        I: IntoIterator<Item = &'a FeatureMatrix>,
    {
        for matrix in matrices {
            let name = format!("validation_{}", self.evals.len());
            self.evals.push((matrix, name));
        }
        self
    }

    /// Replaces the configured objective by a user supplied gradient function.
    pub fn objective(mut self, objective: CustomObjective) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Adds a user supplied metric, evaluated after the built-in ones.
    pub fn custom_metric(mut self, metric: CustomMetric) -> Self {
        self.custom_metrics.push(metric);
        self
    }
}

/// Result of one boosting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Continue,
    /// The early stopping rule fired at the end of this round
    Stop,
}

/// Split candidate source kept across rounds.
enum TrainIndex {
    /// `hist` keeps its cuts for the run, `approx` rebuilds them every round
    Histogram {
        cuts: HistogramCuts,
        binned: BinnedMatrix,
        per_round: bool,
    },
    Exact {
        sorted: SortedColumns,
    },
}

impl TrainIndex {
    fn build(config: &Config, matrix: &FeatureMatrix) -> Self {
        match config.tree_method.resolve() {
            TreeMethod::Exact => TrainIndex::Exact {
                sorted: SortedColumns::from_matrix(matrix),
            },
            method => {
                let weights = matrix.info().weights().map(|w| w.to_vec());
                let cuts = HistogramCuts::build(matrix, weights.as_deref(), config.max_bin);
                let binned = BinnedMatrix::from_matrix(matrix, &cuts);
                TrainIndex::Histogram {
                    cuts,
                    binned,
                    per_round: method == TreeMethod::Approx,
                }
            }
        }
    }

    /// Re-sketches `approx` cuts with the Hessians of the current round.
    fn refresh(&mut self, config: &Config, matrix: &FeatureMatrix, gpairs: &Array2<GradientPair>) {
        if let TrainIndex::Histogram {
            cuts,
            binned,
            per_round: true,
        } = self
        {
            let hessians: Vec<f32> = gpairs
                .axis_iter(Axis(0))
                .map(|row| row.iter().map(|g| g.hess).sum::<f32>())
                .collect();
            *cuts = HistogramCuts::build(matrix, Some(&hessians), config.max_bin);
            *binned = BinnedMatrix::from_matrix(matrix, cuts);
        }
    }

    fn source(&self) -> SplitSource<'_> {
        match self {
            TrainIndex::Histogram { cuts, binned, .. } => SplitSource::Histogram { cuts, binned },
            TrainIndex::Exact { sorted } => SplitSource::Exact { sorted },
        }
    }
}

struct EvalSet<'a> {
    matrix: &'a FeatureMatrix,
    name: String,
    /// Input column of every training feature
    columns: Vec<usize>,
    margins: Array2<f32>,
}

/// Entry points of a training run.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientBooster;

impl GradientBooster {
    /// Starts a fresh training run on `train`.
    pub fn start<'a>(config: Config, train: &'a FeatureMatrix, options: TrainOptions<'a>) -> Result<BoosterState<'a>> {
        BoosterState::initialize(config, train, options, None)
    }

    /// Continues training on top of `prior`, replaying its trees once to
    /// rebuild the prediction caches.
    pub fn resume<'a>(
        prior: Booster,
        config: Config,
        train: &'a FeatureMatrix,
        options: TrainOptions<'a>,
    ) -> Result<BoosterState<'a>> {
        BoosterState::initialize(config, train, options, Some(prior))
    }
}

/// Trains a model for `config.num_boost_round` rounds, stopping early when
/// configured.
pub fn train<'a>(config: Config, train: &'a FeatureMatrix, options: TrainOptions<'a>) -> Result<Booster> {
    let mut state = GradientBooster::start(config, train, options)?;
    state.run()?;
    Ok(state.into_booster())
}

/// Mutable accumulator of one training run.
pub struct BoosterState<'a> {
    config: Config,
    objective: Arc<dyn ObjectiveFunction>,
    metrics: MetricSet,
    ensemble: TreeEnsemble,
    /// Intercept per output, in output space
    base_score: Vec<f32>,
    base_margin: Vec<f32>,
    schema: FeatureSchema,
    train: &'a FeatureMatrix,
    train_columns: Vec<usize>,
    train_margins: Array2<f32>,
    evals: Vec<EvalSet<'a>>,
    index: TrainIndex,
    history: EvalHistory,
    early_stopping: Option<EarlyStoppingState>,
    attributes: BTreeMap<String, String>,
    max_delta_step: f64,
    pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for BoosterState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoosterState")
            .field("objective", &self.objective.name())
            .field("rounds", &self.ensemble.num_boosted_rounds())
            .field("trees", &self.ensemble.num_trees())
            .field("base_score", &self.base_score)
            .field("early_stopping", &self.early_stopping)
            .finish()
    }
}

impl<'a> BoosterState<'a> {
    fn initialize(
        config: Config,
        train: &'a FeatureMatrix,
        options: TrainOptions<'a>,
        prior: Option<Booster>,
    ) -> Result<Self> {
        config.validate()?;
        let info = train.info();
        if !info.has_labels() {
            return Err(XGBoostError::invalid_input("training data has no labels"));
        }
        if train.num_rows() == 0 {
            return Err(XGBoostError::invalid_input("training data has no rows"));
        }

        let custom_objective = options.objective.is_some();
        let objective: Arc<dyn ObjectiveFunction> = match options.objective {
            Some(custom) => Arc::new(custom),
            None => {
                if prior.as_ref().map_or(false, |p| p.objective.name() == "custom") {
                    return Err(XGBoostError::config(
                        "the prior model was trained with a custom objective; supply it again to continue training",
                    ));
                }
                let objective: Arc<dyn ObjectiveFunction> =
                    Arc::from(create_objective_function(&config, info.num_targets())?);
                objective.validate_labels(info)?;
                objective
            }
        };
        let num_outputs = objective.num_model_outputs();

        let resolved = config.tree_method.resolve();
        let has_categorical = train.schema().types().iter().any(|t| t.is_categorical());
        if resolved == TreeMethod::Exact && has_categorical {
            return Err(XGBoostError::unsupported(
                "categorical features are not supported by the exact tree method",
            ));
        }
        let vector_leaf = config.multi_strategy == MultiStrategy::MultiOutputTree && num_outputs > 1;
        if vector_leaf && config.monotone_constraints.iter().any(|&c| c != 0) {
            return Err(XGBoostError::unsupported(
                "monotone constraints are not supported with multi_output_tree",
            ));
        }

        let mut names = config.eval_metric.clone();
        if names.is_empty() && !config.disable_default_eval_metric && options.custom_metrics.is_empty() {
            names.push(objective.default_metric().to_string());
        }
        let metrics = MetricSet::new(&names, options.custom_metrics)?;

        let (ensemble, base_score, schema, attributes) = match prior {
            Some(prior) => Self::check_prior(&prior, &config, train, num_outputs)?,
            None => {
                let estimated = match config.base_score {
                    None if config.boost_from_average && !custom_objective => objective
                        .init_estimation(info)
                        .filter(|scores| scores.len() == num_outputs),
                    _ => None,
                };
                let base_score = estimated
                    .unwrap_or_else(|| vec![config.base_score.unwrap_or(DEFAULT_BASE_SCORE); num_outputs]);
                let ensemble = TreeEnsemble::new(num_outputs, config.num_parallel_tree, config.multi_strategy);
                (ensemble, base_score, train.schema().clone(), BTreeMap::new())
            }
        };
        let base_margin = objective.base_margins(&base_score);
        if let Some(output) = base_margin.iter().position(|m| !m.is_finite()) {
            return Err(XGBoostError::invalid_parameter(
                "base_score",
                base_score[output].to_string(),
                format!("has no finite margin under {}", objective.name()),
            ));
        }

        let pool = build_thread_pool(config.effective_num_threads())?;
        let train_columns: Vec<usize> = (0..train.num_cols()).collect();
        let predictor = Predictor::new(&ensemble);
        let all_trees = 0..ensemble.num_trees();

        let mut train_margins = initial_margins(train, num_outputs, &base_margin)?;
        pool.install(|| predictor.accumulate(train, &train_columns, all_trees.clone(), &mut train_margins));

        let mut evals = Vec::with_capacity(options.evals.len());
        for (matrix, name) in options.evals {
            if !matrix.info().has_labels() {
                return Err(XGBoostError::invalid_input(format!(
                    "evaluation set {} has no labels",
                    name
                )));
            }
            let columns = schema.align(matrix.schema())?;
            let mut margins = initial_margins(matrix, num_outputs, &base_margin)?;
            pool.install(|| predictor.accumulate(matrix, &columns, all_trees.clone(), &mut margins));
            evals.push(EvalSet {
                matrix,
                name,
                columns,
                margins,
            });
        }

        let early_stopping = match config.early_stopping_rounds {
            None => None,
            Some(patience) => {
                let watched = match (evals.last(), metrics.last()) {
                    (Some(_), Some(metric)) => metric,
                    _ => {
                        return Err(XGBoostError::config(
                            "early stopping requires at least one evaluation set and one metric",
                        ))
                    }
                };
                Some(EarlyStoppingState::new(patience, watched.direction()))
            }
        };

        let index = pool.install(|| TrainIndex::build(&config, train));
        let max_delta_step = if config.max_delta_step > 0.0 {
            config.max_delta_step
        } else {
            objective.default_max_delta_step()
        };

        log::info!(
            "Starting training: objective={}, tree_method={}, rows={}, features={}, outputs={}, prior rounds={}",
            objective.name(),
            resolved,
            train.num_rows(),
            train.num_cols(),
            num_outputs,
            ensemble.num_boosted_rounds()
        );

        Ok(BoosterState {
            config,
            objective,
            metrics,
            ensemble,
            base_score,
            base_margin,
            schema,
            train,
            train_columns,
            train_margins,
            evals,
            index,
            history: EvalHistory::new(),
            early_stopping,
            attributes,
            max_delta_step,
            pool,
        })
    }

    /// Checks that `prior` can be extended with `config` on `train`.
    fn check_prior(
        prior: &Booster,
        config: &Config,
        train: &FeatureMatrix,
        num_outputs: usize,
    ) -> Result<(TreeEnsemble, Vec<f32>, FeatureSchema, BTreeMap<String, String>)> {
        let columns = prior.schema.align(train.schema())?;
        if columns.iter().enumerate().any(|(f, &c)| f != c) {
            return Err(XGBoostError::feature_mismatch(
                "training data must keep the column order of the prior model",
            ));
        }
        if prior.ensemble.num_outputs() != num_outputs {
            return Err(XGBoostError::config(format!(
                "prior model has {} outputs, the objective produces {}",
                prior.ensemble.num_outputs(),
                num_outputs
            )));
        }
        if prior.ensemble.num_parallel_tree() != config.num_parallel_tree.max(1) {
            return Err(XGBoostError::invalid_parameter(
                "num_parallel_tree",
                config.num_parallel_tree.to_string(),
                format!("prior model uses {}", prior.ensemble.num_parallel_tree()),
            ));
        }
        let mut attributes = prior.attributes.clone();
        attributes.remove("best_iteration");
        attributes.remove("best_score");
        Ok((
            prior.ensemble.clone(),
            prior.base_score.clone(),
            prior.schema.clone(),
            attributes,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ensemble(&self) -> &TreeEnsemble {
        &self.ensemble
    }

    pub fn num_boosted_rounds(&self) -> usize {
        self.ensemble.num_boosted_rounds()
    }

    pub fn eval_history(&self) -> &EvalHistory {
        &self.history
    }

    pub fn early_stopping(&self) -> Option<&EarlyStoppingState> {
        self.early_stopping.as_ref()
    }

    /// Current training margins, `n_rows x n_outputs`.
    pub fn train_margins(&self) -> &Array2<f32> {
        &self.train_margins
    }

    /// Runs boosting round `round`, which must be the next round.
    pub fn update(&mut self, round: usize) -> Result<RoundOutcome> {
        let expected = self.ensemble.num_boosted_rounds();
        if round != expected {
            return Err(XGBoostError::training(format!(
                "round {} requested, the next round is {}",
                round, expected
            )));
        }
        let pool = Arc::clone(&self.pool);
        pool.install(|| self.boost_one_round(round))
    }

    fn boost_one_round(&mut self, round: usize) -> Result<RoundOutcome> {
        let gpairs = self
            .objective
            .calculate_gradients_hessians(self.train_margins.view(), self.train.info(), round)?;
        self.index.refresh(&self.config, self.train, &gpairs);

        let trees = self.grow_round(round, &gpairs)?;
        self.ensemble.commit_round(trees);

        let new_trees = self.ensemble.tree_range(round, round + 1)?;
        let predictor = Predictor::new(&self.ensemble);
        predictor.accumulate(self.train, &self.train_columns, new_trees.clone(), &mut self.train_margins);
        for eval in &mut self.evals {
            predictor.accumulate(eval.matrix, &eval.columns, new_trees.clone(), &mut eval.margins);
        }
        log::debug!(
            "Round {}: grew {} trees, {} in total",
            round,
            new_trees.len(),
            self.ensemble.num_trees()
        );

        let watched = self.evaluate(round)?;
        let stop = match (&mut self.early_stopping, watched) {
            (Some(state), Some(score)) => {
                let stop = state.update(round, score);
                self.attributes
                    .insert("best_iteration".to_string(), state.best_round.to_string());
                self.attributes
                    .insert("best_score".to_string(), state.best_score.to_string());
                stop
            }
            _ => false,
        };
        if stop {
            if let Some(state) = &self.early_stopping {
                log::info!(
                    "Stopping. Best iteration: [{}] score {:.5} ({} rounds without improvement)",
                    state.best_round,
                    state.best_score,
                    state.patience()
                );
            }
            return Ok(RoundOutcome::Stop);
        }
        Ok(RoundOutcome::Continue)
    }

    fn grow_round(&self, round: usize, gpairs: &Array2<GradientPair>) -> Result<Vec<(RegTree, usize)>> {
        let grower = TreeGrower::from_config(&self.config, self.train, self.index.source(), self.max_delta_step)?;
        let vector_leaf = self.config.multi_strategy == MultiStrategy::MultiOutputTree && gpairs.ncols() > 1;
        let outputs = if vector_leaf { 1 } else { gpairs.ncols() };
        let jobs: Vec<(usize, usize)> = (0..outputs)
            .flat_map(|output| (0..self.ensemble.num_parallel_tree()).map(move |k| (output, k)))
            .collect();
        let seed = self.config.seed;

        jobs.par_iter()
            .map(|&(output, k)| -> Result<(RegTree, usize)> {
                let mut rng = StdRng::seed_from_u64(tree_seed(seed, round, output, k));
                let tree = if vector_leaf {
                    grower.grow(gpairs.view(), &mut rng)?
                } else {
                    grower.grow(gpairs.slice(s![.., output..output + 1]), &mut rng)?
                };
                Ok((tree, output))
            })
            .collect()
    }

    /// Evaluates every metric on every evaluation set and returns the score
    /// of the last metric on the last set.
    fn evaluate(&mut self, round: usize) -> Result<Option<f64>> {
        let mut watched = None;
        for eval in &self.evals {
            let predictions = self.objective.eval_transform(eval.margins.clone());
            let mut line = format!("[{}]", round);
            for metric in self.metrics.iter() {
                let score = metric.evaluate(predictions.view(), eval.matrix.info())?;
                self.history.push(&eval.name, metric.name(), score);
                line.push_str(&format!("\t{}-{}:{:.5}", eval.name, metric.name(), score));
                watched = Some(score);
            }
            if self.config.verbose_eval && !self.metrics.is_empty() {
                log::info!("{}", line);
            }
        }
        Ok(watched)
    }

    /// Runs `config.num_boost_round` more rounds or until early stopping.
    pub fn run(&mut self) -> Result<()> {
        let first = self.ensemble.num_boosted_rounds();
        for round in first..first + self.config.num_boost_round {
            if self.update(round)? == RoundOutcome::Stop {
                break;
            }
        }
        log::info!(
            "Finished training: {} rounds, {} trees",
            self.ensemble.num_boosted_rounds(),
            self.ensemble.num_trees()
        );
        Ok(())
    }

    /// Freezes the state into a [`Booster`].
    pub fn into_booster(self) -> Booster {
        Booster {
            config: self.config,
            ensemble: self.ensemble,
            base_score: self.base_score,
            objective: self.objective,
            schema: self.schema,
            attributes: self.attributes,
            history: self.history,
            pool: self.pool,
        }
    }

    /// Intercept of every output in margin space.
    pub fn base_margin(&self) -> &[f32] {
        &self.base_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use ndarray::{array, Array1};

    fn regression_data() -> FeatureMatrix {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| (i * (j + 1)) as f32 / 10.0);
        let y = Array1::from_shape_fn(40, |i| if i < 20 { 1.0 } else { 3.0 });
        FeatureMatrix::builder(x).labels(y).build().unwrap()
    }

    #[test]
    fn test_rounds_must_be_sequential() {
        let data = regression_data();
        let config = ConfigBuilder::new().num_boost_round(3).build().unwrap();
        let mut state = GradientBooster::start(config, &data, TrainOptions::new()).unwrap();
        assert!(state.update(1).is_err());
        assert_eq!(state.update(0).unwrap(), RoundOutcome::Continue);
        assert_eq!(state.num_boosted_rounds(), 1);
    }

    #[test]
    fn test_training_reduces_squared_error() {
        let data = regression_data();
        let config = ConfigBuilder::new()
            .num_boost_round(10)
            .max_depth(2)
            .eval_metric("rmse")
            .build()
            .unwrap();
        let mut state = GradientBooster::start(config, &data, TrainOptions::new().eval(&data, "train")).unwrap();
        state.run().unwrap();
        let rmse = state.eval_history().get("train", "rmse").unwrap().to_vec();
        assert_eq!(rmse.len(), 10);
        assert!(rmse.windows(2).all(|w| w[1] <= w[0] + 1e-9));
        assert!(rmse[9] < 0.1);
    }

    #[test]
    fn test_base_score_from_average() {
        let data = regression_data();
        let config = ConfigBuilder::new().num_boost_round(1).build().unwrap();
        let state = GradientBooster::start(config, &data, TrainOptions::new()).unwrap();
        assert_eq!(state.base_margin().len(), 1);
        assert!((state.base_margin()[0] - 2.0).abs() < 1e-6);
        assert!((state.train_margins()[[0, 0]] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_base_score_per_target() {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| i as f32);
        let y = Array2::from_shape_fn((20, 2), |(i, t)| if t == 0 { (i % 2) as f32 } else { 10.0 + (i % 2) as f32 });
        let data = FeatureMatrix::builder(x).labels_2d(y).build().unwrap();
        let config = ConfigBuilder::new().num_boost_round(1).build().unwrap();
        let state = GradientBooster::start(config, &data, TrainOptions::new()).unwrap();
        assert!((state.base_margin()[0] - 0.5).abs() < 1e-6);
        assert!((state.base_margin()[1] - 10.5).abs() < 1e-6);
        assert!((state.train_margins()[[3, 1]] - 10.5).abs() < 1e-6);

        let config = ConfigBuilder::new().num_boost_round(1).base_score(2.0).build().unwrap();
        let state = GradientBooster::start(config, &data, TrainOptions::new()).unwrap();
        assert_eq!(state.base_margin(), &[2.0, 2.0]);
    }

    #[test]
    fn test_missing_labels_rejected() {
        let data = FeatureMatrix::from_dense(array![[1.0], [2.0]]).unwrap();
        let err = GradientBooster::start(Config::default(), &data, TrainOptions::new()).unwrap_err();
        assert!(matches!(err, XGBoostError::InvalidInput { .. }));
    }

    #[test]
    fn test_early_stopping_needs_eval_set() {
        let data = regression_data();
        let config = ConfigBuilder::new().early_stopping_rounds(2).build().unwrap();
        assert!(GradientBooster::start(config, &data, TrainOptions::new()).is_err());
    }
}
