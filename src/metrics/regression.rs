//! Pointwise regression metrics.

use crate::core::error::Result;
use crate::dataset::MetaInfo;
use crate::metrics::{weighted_elementwise, Metric, MetricDirection};
use ndarray::ArrayView2;

const PROB_EPS: f64 = 1e-16;

/// Per-element loss averaged by [`ElementwiseMetric`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointLoss {
    /// `rmse`
    SquaredError,
    /// `rmsle`
    SquaredLogError,
    /// `mae`
    AbsoluteError,
    /// `mape`
    AbsolutePercentageError,
    /// `mphe`
    PseudoHuber { slope: f64 },
    /// `poisson-nloglik`
    PoissonNegLogLik,
}

impl PointLoss {
    fn name(&self) -> &'static str {
        match self {
            PointLoss::SquaredError => "rmse",
            PointLoss::SquaredLogError => "rmsle",
            PointLoss::AbsoluteError => "mae",
            PointLoss::AbsolutePercentageError => "mape",
            PointLoss::PseudoHuber { .. } => "mphe",
            PointLoss::PoissonNegLogLik => "poisson-nloglik",
        }
    }

    #[inline]
    fn loss(&self, pred: f64, label: f64) -> f64 {
        match *self {
            PointLoss::SquaredError => (pred - label).powi(2),
            PointLoss::SquaredLogError => ((pred + 1.0).ln() - (label + 1.0).ln()).powi(2),
            PointLoss::AbsoluteError => (pred - label).abs(),
            PointLoss::AbsolutePercentageError => ((label - pred) / label).abs(),
            PointLoss::PseudoHuber { slope } => {
                let z = (pred - label) / slope;
                slope * slope * ((1.0 + z * z).sqrt() - 1.0)
            }
            PointLoss::PoissonNegLogLik => {
                let p = pred.max(PROB_EPS);
                ln_gamma(label + 1.0) + p - p.ln() * label
            }
        }
    }

    fn finalize(&self, mean: f64) -> f64 {
        match self {
            PointLoss::SquaredError | PointLoss::SquaredLogError => mean.sqrt(),
            _ => mean,
        }
    }
}

/// Weighted mean of a pointwise loss over every label.
#[derive(Debug, Clone)]
pub struct ElementwiseMetric {
    loss: PointLoss,
}

impl ElementwiseMetric {
    pub fn new(loss: PointLoss) -> Self {
        ElementwiseMetric { loss }
    }
}

impl Metric for ElementwiseMetric {
    fn name(&self) -> &str {
        self.loss.name()
    }

    fn direction(&self) -> MetricDirection {
        MetricDirection::Minimize
    }

    fn evaluate(&self, predictions: ArrayView2<'_, f32>, info: &MetaInfo) -> Result<f64> {
        let loss = self.loss;
        let (sum, weight_sum) = weighted_elementwise(predictions, info, |p, y| loss.loss(p, y))?;
        if weight_sum <= 0.0 {
            return Ok(0.0);
        }
        Ok(self.loss.finalize(sum / weight_sum))
    }
}

/// Natural log of the gamma function (Lanczos approximation, g = 7).
pub(crate) fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = COEFFICIENTS[0];
    let t = x + 7.5;
    for (i, c) in COEFFICIENTS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}
