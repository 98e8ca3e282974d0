//! Regularized leaf weight and split gain computation.
//!
//! With `G`, `H` the gradient and Hessian sums of a node, the optimal weight
//! is `-T(G) / (H + lambda)` where `T` soft-thresholds by `alpha`, optionally
//! clipped by `max_delta_step` and clamped to the node's monotone bounds.

use crate::config::Config;
use crate::core::constants::K_RT_EPS;
use crate::core::types::GradStats;
use crate::tree::split::constraints::{MonotonicConstraint, NodeBounds};

#[derive(Debug, Clone)]
pub struct SplitEvaluator {
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    pub max_delta_step: f64,
    pub min_child_weight: f64,
    pub min_split_loss: f64,
    /// Monotone constraints exist somewhere in the model
    pub has_constraint: bool,
}

impl Default for SplitEvaluator {
    fn default() -> Self {
        SplitEvaluator {
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            max_delta_step: 0.0,
            min_child_weight: 1.0,
            min_split_loss: 0.0,
            has_constraint: false,
        }
    }
}

#[inline]
fn threshold_l1(g: f64, alpha: f64) -> f64 {
    if g > alpha {
        g - alpha
    } else if g < -alpha {
        g + alpha
    } else {
        0.0
    }
}

impl SplitEvaluator {
    pub fn from_config(config: &Config, max_delta_step: f64, has_constraint: bool) -> Self {
        SplitEvaluator {
            reg_lambda: config.reg_lambda,
            reg_alpha: config.reg_alpha,
            max_delta_step,
            min_child_weight: config.min_child_weight,
            min_split_loss: config.min_split_loss,
            has_constraint,
        }
    }

    /// Optimal weight of one target.
    pub fn calc_weight(&self, stats: GradStats, bounds: NodeBounds) -> f64 {
        let denominator = stats.sum_hess + self.reg_lambda;
        if denominator <= 0.0 {
            return 0.0;
        }
        let mut weight = -threshold_l1(stats.sum_grad, self.reg_alpha) / denominator;
        if self.max_delta_step != 0.0 && weight.abs() > self.max_delta_step {
            weight = self.max_delta_step.copysign(weight);
        }
        bounds.clamp(weight)
    }

    /// Loss reduction achieved by assigning `weight` to a node.
    #[inline]
    pub fn calc_gain_given_weight(&self, stats: GradStats, weight: f64) -> f64 {
        -(2.0 * stats.sum_grad * weight + (stats.sum_hess + self.reg_lambda) * weight * weight)
    }

    /// Gain of one target at its optimal weight.
    pub fn calc_gain(&self, stats: GradStats, bounds: NodeBounds) -> f64 {
        let denominator = stats.sum_hess + self.reg_lambda;
        if denominator <= 0.0 {
            return 0.0;
        }
        if !self.has_constraint && self.max_delta_step == 0.0 {
            let t = threshold_l1(stats.sum_grad, self.reg_alpha);
            return t * t / denominator;
        }
        self.calc_gain_given_weight(stats, self.calc_weight(stats, bounds))
    }

    /// Gain summed over all targets of a node.
    pub fn node_gain(&self, stats: &[GradStats], bounds: NodeBounds) -> f64 {
        stats.iter().map(|s| self.calc_gain(*s, bounds)).sum()
    }

    /// Weights of every target of a node.
    pub fn node_weights(&self, stats: &[GradStats], bounds: NodeBounds) -> Vec<f64> {
        stats.iter().map(|s| self.calc_weight(*s, bounds)).collect()
    }

    /// Whether a child with these statistics satisfies `min_child_weight`.
    #[inline]
    pub fn child_is_heavy_enough(&self, stats: &[GradStats]) -> bool {
        let hess: f64 = stats.iter().map(|s| s.sum_hess).sum();
        hess >= self.min_child_weight
    }

    /// Combined gain of two children, `None` when a monotone constraint is violated.
    pub fn split_gain(
        &self,
        left: &[GradStats],
        right: &[GradStats],
        bounds: NodeBounds,
        constraint: MonotonicConstraint,
    ) -> Option<f64> {
        if constraint != MonotonicConstraint::None {
            // Monotone splits only exist on single-output trees.
            let wl = self.calc_weight(left[0], bounds);
            let wr = self.calc_weight(right[0], bounds);
            let violated = match constraint {
                MonotonicConstraint::Increasing => wl > wr,
                MonotonicConstraint::Decreasing => wl < wr,
                MonotonicConstraint::None => false,
            };
            if violated {
                return None;
            }
            return Some(
                self.calc_gain_given_weight(left[0], wl) + self.calc_gain_given_weight(right[0], wr),
            );
        }
        Some(self.node_gain(left, bounds) + self.node_gain(right, bounds))
    }

    /// Whether a loss change is large enough to keep a split.
    #[inline]
    pub fn accepts(&self, loss_change: f64) -> bool {
        loss_change > K_RT_EPS && loss_change >= self.min_split_loss
    }
}
