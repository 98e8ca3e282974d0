//! Evaluation metrics for the Pure Rust XGBoost framework.
//!
//! A metric scores predictions that have already been mapped into the
//! objective's evaluation space (probabilities for logistic objectives,
//! class probabilities for multiclass objectives, raw values otherwise).
//! Built-in metrics are selected by name with [`create_metric`]; a single
//! user supplied score function is wrapped by [`CustomMetric`].
//!
//! # Examples
//!
//! ```rust
//! use xgboost_rust::metrics::create_metric;
//!
//! let metric = create_metric("ndcg@5").unwrap();
//! assert_eq!(metric.name(), "ndcg@5");
//! assert!(metric.direction().higher_is_better());
//! ```

pub mod classification;
pub mod custom;
pub mod ranking;
pub mod regression;

pub use classification::{AucMetric, BinaryErrorMetric, LogLossMetric, MultiErrorMetric, MultiLogLossMetric};
pub use custom::{CustomMetric, CustomMetricFn};
pub use ranking::{MapMetric, NdcgMetric};
pub use regression::{ElementwiseMetric, PointLoss};

use crate::core::error::{Result, XGBoostError};
use crate::dataset::MetaInfo;
use ndarray::ArrayView2;
use std::fmt::{self, Debug};

/// Whether smaller or larger metric values are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    Minimize,
    Maximize,
}

impl MetricDirection {
    pub fn higher_is_better(self) -> bool {
        matches!(self, MetricDirection::Maximize)
    }

    /// True when `candidate` improves on `incumbent`.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            MetricDirection::Minimize => candidate < incumbent,
            MetricDirection::Maximize => candidate > incumbent,
        }
    }
}

impl fmt::Display for MetricDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricDirection::Minimize => write!(f, "minimize"),
            MetricDirection::Maximize => write!(f, "maximize"),
        }
    }
}

/// Common trait for all evaluation metrics.
pub trait Metric: Send + Sync + Debug {
    /// Name as reported in the evaluation history, e.g. `ndcg@5`
    fn name(&self) -> &str;

    fn direction(&self) -> MetricDirection;

    /// Scores `predictions` (`n_rows x n_columns`, evaluation space) against
    /// the labels, weights and groups of `info`.
    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64>;
}

/// Splits `name@param` into its parts.
fn split_param(name: &str) -> (&str, Option<&str>) {
    match name.split_once('@') {
        Some((base, param)) => (base, Some(param)),
        None => (name, None),
    }
}

fn parse_metric_param<T: std::str::FromStr>(name: &str, param: &str) -> Result<T> {
    param
        .parse::<T>()
        .map_err(|_| XGBoostError::invalid_parameter("eval_metric", name, "cannot parse metric parameter"))
}

/// Creates the built-in metric named `name`.
pub fn create_metric(name: &str) -> Result<Box<dyn Metric>> {
    let (base, param) = split_param(name.trim());
    let metric: Box<dyn Metric> = match (base, param) {
        ("rmse", None) => Box::new(ElementwiseMetric::new(PointLoss::SquaredError)),
        ("rmsle", None) => Box::new(ElementwiseMetric::new(PointLoss::SquaredLogError)),
        ("mae", None) => Box::new(ElementwiseMetric::new(PointLoss::AbsoluteError)),
        ("mape", None) => Box::new(ElementwiseMetric::new(PointLoss::AbsolutePercentageError)),
        ("mphe", None) => Box::new(ElementwiseMetric::new(PointLoss::PseudoHuber { slope: 1.0 })),
        ("poisson-nloglik", None) => Box::new(ElementwiseMetric::new(PointLoss::PoissonNegLogLik)),
        ("logloss", None) => Box::new(LogLossMetric),
        ("error", None) => Box::new(BinaryErrorMetric::new(0.5, None)),
        ("error", Some(p)) => Box::new(BinaryErrorMetric::new(parse_metric_param(name, p)?, Some(name))),
        ("merror", None) => Box::new(MultiErrorMetric),
        ("mlogloss", None) => Box::new(MultiLogLossMetric),
        ("auc", None) => Box::new(AucMetric),
        ("ndcg", None) => Box::new(NdcgMetric::new(None)),
        ("ndcg", Some(p)) => Box::new(NdcgMetric::new(Some(parse_metric_param(name, p)?))),
        ("map", None) => Box::new(MapMetric::new(None)),
        ("map", Some(p)) => Box::new(MapMetric::new(Some(parse_metric_param(name, p)?))),
        _ => {
            return Err(XGBoostError::invalid_parameter(
                "eval_metric",
                name,
                "unknown evaluation metric",
            ))
        }
    };
    Ok(metric)
}

/// Direction of a metric known only by name (used when reading history).
pub fn direction_of(name: &str) -> MetricDirection {
    let (base, _) = split_param(name);
    match base {
        "auc" | "aucpr" | "ndcg" | "map" | "pre" => MetricDirection::Maximize,
        _ => MetricDirection::Minimize,
    }
}

/// The metrics evaluated every round: any number of built-in metrics plus at
/// most one custom metric.
#[derive(Debug, Default)]
pub struct MetricSet {
    metrics: Vec<Box<dyn Metric>>,
}

impl MetricSet {
    /// Resolves built-in `names` and appends `custom` metrics after them.
    pub fn new(names: &[String], custom: Vec<CustomMetric>) -> Result<Self> {
        if custom.len() > 1 {
            return Err(XGBoostError::unsupported(
                "multiple custom metrics is not yet supported",
            ));
        }
        let mut metrics = Vec::with_capacity(names.len() + custom.len());
        for name in names {
            let metric = create_metric(name)?;
            if metrics.iter().any(|m: &Box<dyn Metric>| m.name() == metric.name()) {
                continue;
            }
            metrics.push(metric);
        }
        for metric in custom {
            metrics.push(Box::new(metric) as Box<dyn Metric>);
        }
        Ok(MetricSet { metrics })
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Metric> {
        self.metrics.iter().map(|m| m.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name().to_string()).collect()
    }

    /// The metric early stopping watches.
    pub fn last(&self) -> Option<&dyn Metric> {
        self.metrics.last().map(|m| m.as_ref())
    }
}

/// Weighted mean of a per-element loss over every present label.
///
/// Rows whose label is `NaN` are skipped. The row weight applies to every
/// column of the row.
pub(crate) fn weighted_elementwise<F>(predictions: ArrayView2<'_, f32>, info: &MetaInfo, loss: F) -> Result<(f64, f64)>
where
    F: Fn(f64, f64) -> f64,
{
    let labels = info.labels()?;
    if labels.dim() != predictions.dim() {
        return Err(XGBoostError::shape(
            format!("predictions of shape {:?}", labels.dim()),
            format!("predictions of shape {:?}", predictions.dim()),
        ));
    }
    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    for (row, (label_row, pred_row)) in labels.outer_iter().zip(predictions.outer_iter()).enumerate() {
        let w = info.weight(row) as f64;
        for (&y, &p) in label_row.iter().zip(pred_row.iter()) {
            if y.is_nan() {
                continue;
            }
            sum += w * loss(p as f64, y as f64);
            weight_sum += w;
        }
    }
    Ok((sum, weight_sum))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_metric_names() {
        for name in [
            "rmse",
            "rmsle",
            "mae",
            "mape",
            "mphe",
            "poisson-nloglik",
            "logloss",
            "error",
            "error@0.7",
            "merror",
            "mlogloss",
            "auc",
            "ndcg",
            "ndcg@3",
            "map",
            "map@5",
        ] {
            let metric = create_metric(name).unwrap();
            assert_eq!(metric.name(), name);
        }
        assert!(create_metric("bogus").is_err());
        assert!(create_metric("ndcg@x").is_err());
    }

    #[test]
    fn test_direction() {
        assert!(create_metric("auc").unwrap().direction().higher_is_better());
        assert!(!create_metric("logloss").unwrap().direction().higher_is_better());
        assert_eq!(direction_of("map@3"), MetricDirection::Maximize);
        assert!(MetricDirection::Minimize.improves(0.1, 0.2));
        assert!(!MetricDirection::Maximize.improves(0.1, 0.2));
    }

    #[test]
    fn test_metric_set_rejects_two_custom_metrics() {
        let custom = || CustomMetric::new("mine", MetricDirection::Minimize, |_, _, _| Ok(0.0));
        let err = MetricSet::new(&[], vec![custom(), custom()]).unwrap_err();
        assert!(matches!(err, XGBoostError::Unsupported { .. }));
        assert!(err.to_string().contains("multiple custom metrics is not yet supported"));

        let set = MetricSet::new(&["rmse".to_string(), "mae".to_string()], vec![custom()]).unwrap();
        assert_eq!(set.names(), vec!["rmse", "mae", "mine"]);
        assert_eq!(set.last().unwrap().name(), "mine");
    }

    #[test]
    fn test_metric_set_deduplicates() {
        let names = vec!["rmse".to_string(), "rmse".to_string()];
        assert_eq!(MetricSet::new(&names, Vec::new()).unwrap().len(), 1);
    }
}
