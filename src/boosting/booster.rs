//! Trained model handle for the Pure Rust XGBoost framework.
//!
//! A [`Booster`] is the frozen result of a training run or of loading a
//! model file. Prediction only reads the ensemble and can run from any
//! number of threads at once.

use crate::boosting::ensemble::TreeEnsemble;
use crate::boosting::history::EvalHistory;
use crate::config::Config;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::{FeatureType, ImportanceType};
use crate::dataset::{FeatureMatrix, FeatureSchema};
use crate::io::config::ConfigDocument;
use crate::io::model_file::ModelDocument;
use crate::io::serialization::{deserializer_for, detect_format, serializer_for, SerializationFormat};
use crate::objective::ObjectiveFunction;
use crate::prediction::feature_importance::{compute_importance, normalize};
use crate::prediction::predictor::{IterationRange, Predictor};
use ndarray::{Array1, Array2};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Builds the worker pool used for training and prediction.
pub(crate) fn build_thread_pool(threads: usize) -> Result<Arc<ThreadPool>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| XGBoostError::internal(format!("failed to build thread pool: {}", e)))?;
    Ok(Arc::new(pool))
}

/// Trained gradient boosted tree model.
#[derive(Clone)]
pub struct Booster {
    pub(crate) config: Config,
    pub(crate) ensemble: TreeEnsemble,
    /// Intercept per output, in output space
    pub(crate) base_score: Vec<f32>,
    pub(crate) objective: Arc<dyn ObjectiveFunction>,
    pub(crate) schema: FeatureSchema,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) history: EvalHistory,
    pub(crate) pool: Arc<ThreadPool>,
}

static_assertions::assert_impl_all!(Booster: Send, Sync);

impl fmt::Debug for Booster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Booster")
            .field("objective", &self.objective.name())
            .field("num_boosted_rounds", &self.ensemble.num_boosted_rounds())
            .field("num_trees", &self.ensemble.num_trees())
            .field("num_features", &self.schema.num_features())
            .field("base_score", &self.base_score)
            .finish()
    }
}

impl Booster {
    pub(crate) fn from_parts(
        config: Config,
        ensemble: TreeEnsemble,
        base_score: Vec<f32>,
        objective: Arc<dyn ObjectiveFunction>,
        schema: FeatureSchema,
        attributes: BTreeMap<String, String>,
    ) -> Result<Self> {
        let pool = build_thread_pool(config.effective_num_threads())?;
        Ok(Booster {
            config,
            ensemble,
            base_score,
            objective,
            schema,
            attributes,
            history: EvalHistory::new(),
            pool,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ensemble(&self) -> &TreeEnsemble {
        &self.ensemble
    }

    pub fn objective(&self) -> &dyn ObjectiveFunction {
        self.objective.as_ref()
    }

    /// Intercept of every output in output space.
    pub fn base_score(&self) -> &[f32] {
        &self.base_score
    }

    /// Intercept of every output in margin space.
    pub fn base_margin(&self) -> Vec<f32> {
        self.objective.base_margins(&self.base_score)
    }

    pub fn num_boosted_rounds(&self) -> usize {
        self.ensemble.num_boosted_rounds()
    }

    pub fn num_trees(&self) -> usize {
        self.ensemble.num_trees()
    }

    pub fn num_features(&self) -> usize {
        self.schema.num_features()
    }

    pub fn num_outputs(&self) -> usize {
        self.ensemble.num_outputs()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.schema.names()
    }

    pub fn feature_types(&self) -> &[FeatureType] {
        self.schema.types()
    }

    pub fn eval_history(&self) -> &EvalHistory {
        &self.history
    }

    /// Predictions over the rounds in `range`.
    ///
    /// With `output_margin` the raw margins are returned, otherwise the
    /// objective's link function is applied.
    pub fn predict<R: Into<IterationRange>>(
        &self,
        matrix: &FeatureMatrix,
        output_margin: bool,
        range: R,
    ) -> Result<Array2<f32>> {
        let columns = self.schema.align(matrix.schema())?;
        let range = range.into();
        let base_margin = self.base_margin();
        let predictor = Predictor::new(&self.ensemble);
        let margins = self
            .pool
            .install(|| predictor.predict_margin(matrix, &columns, &base_margin, range))?;
        if output_margin {
            Ok(margins)
        } else {
            Ok(self.objective.transform_predictions(margins))
        }
    }

    /// Leaf index reached in every tree of `range`, `n_rows x n_trees`.
    pub fn predict_leaf<R: Into<IterationRange>>(&self, matrix: &FeatureMatrix, range: R) -> Result<Array2<u32>> {
        let columns = self.schema.align(matrix.schema())?;
        let range = range.into();
        let predictor = Predictor::new(&self.ensemble);
        self.pool
            .install(|| predictor.predict_leaf(matrix, &columns, range))
    }

    /// Importance per feature name for every feature used in a split.
    pub fn get_score(&self, kind: ImportanceType) -> Result<BTreeMap<String, f64>> {
        let scores = compute_importance(&self.ensemble, self.num_features(), kind)?;
        let counts = compute_importance(&self.ensemble, self.num_features(), ImportanceType::Weight)?;
        Ok(scores
            .into_iter()
            .zip(counts)
            .enumerate()
            .filter(|(_, (_, count))| *count > 0.0)
            .map(|(f, (score, _))| (self.schema.feature_name(f), score))
            .collect())
    }

    /// Importance of every feature, normalized to sum to one.
    ///
    /// All zeros when the model has no split.
    pub fn feature_importances(&self, kind: ImportanceType) -> Result<Array1<f32>> {
        let scores = compute_importance(&self.ensemble, self.num_features(), kind)?;
        Ok(Array1::from(normalize(&scores)))
    }

    /// One dump per tree, as text or as JSON.
    pub fn get_dump(&self, with_stats: bool, json: bool) -> Vec<String> {
        self.ensemble
            .trees()
            .iter()
            .map(|tree| {
                if json {
                    tree.dump_json(&self.schema, with_stats).to_string()
                } else {
                    tree.dump_text(&self.schema, with_stats)
                }
            })
            .collect()
    }

    /// Updates a training parameter of the live configuration.
    pub fn set_param(&mut self, key: &str, value: &str) -> Result<()> {
        let mut config = self.config.clone();
        config.set_param(key, value)?;
        config.validate()?;
        if config.effective_num_threads() != self.config.effective_num_threads() {
            self.pool = build_thread_pool(config.effective_num_threads())?;
        }
        self.config = config;
        Ok(())
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Sets an attribute, or removes it when `value` is `None`.
    pub fn set_attr(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.attributes.insert(key.to_string(), value.to_string());
            }
            None => {
                self.attributes.remove(key);
            }
        }
    }

    /// Best round found by early stopping.
    pub fn best_iteration(&self) -> Option<usize> {
        self.attr("best_iteration")?.parse().ok()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.attr("best_score")?.parse().ok()
    }

    /// Serializes the model to `format`.
    pub fn to_bytes(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        serializer_for(format).serialize(&ModelDocument::from_booster(self))
    }

    /// Loads a model, detecting the format from its first bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        deserializer_for(detect_format(data)).deserialize(data)?.into_booster()
    }

    pub fn to_json(&self) -> Result<String> {
        let bytes = self.to_bytes(SerializationFormat::Json)?;
        String::from_utf8(bytes).map_err(|e| XGBoostError::serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        deserializer_for(SerializationFormat::Json)
            .deserialize(json.as_bytes())?
            .into_booster()
    }

    /// Writes the model; `.json` files are JSON, anything else binary.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = SerializationFormat::from_path(path);
        fs::write(path, self.to_bytes(format)?)?;
        log::info!("Saved model with {} trees to {} ({})", self.num_trees(), path.display(), format);
        Ok(())
    }

    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let booster = Self::from_bytes(&fs::read(path)?)?;
        log::info!("Loaded model with {} trees from {}", booster.num_trees(), path.display());
        Ok(booster)
    }

    /// Live configuration as a JSON document.
    pub fn save_config(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&ConfigDocument::from_booster(self))?)
    }

    /// Applies a document produced by [`Booster::save_config`].
    pub fn load_config(&mut self, json: &str) -> Result<()> {
        let document: ConfigDocument = serde_json::from_str(json)?;
        for (key, value) in document.params() {
            self.config.set_param(&key, &value)?;
        }
        self.config.validate()?;
        self.pool = build_thread_pool(self.config.effective_num_threads())?;
        Ok(())
    }
}
