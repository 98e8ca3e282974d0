//! Constraint enforcement for tree splits in the Pure Rust XGBoost framework.
//!
//! Monotonic constraints bound the leaf weights of every subtree so that the
//! model output moves in one direction along a feature. Interaction
//! constraints restrict which features may appear together on one
//! root-to-leaf path.

use crate::config::Config;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::FeatureIndex;
use std::collections::BTreeSet;

/// Monotonic constraint types for individual features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonotonicConstraint {
    None,
    Increasing,
    Decreasing,
}

impl Default for MonotonicConstraint {
    fn default() -> Self {
        MonotonicConstraint::None
    }
}

impl From<i8> for MonotonicConstraint {
    fn from(value: i8) -> Self {
        match value {
            v if v > 0 => MonotonicConstraint::Increasing,
            v if v < 0 => MonotonicConstraint::Decreasing,
            _ => MonotonicConstraint::None,
        }
    }
}

impl std::fmt::Display for MonotonicConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonotonicConstraint::None => write!(f, "none"),
            MonotonicConstraint::Increasing => write!(f, "increasing"),
            MonotonicConstraint::Decreasing => write!(f, "decreasing"),
        }
    }
}

/// Range a node's weight must stay within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBounds {
    pub lower: f64,
    pub upper: f64,
}

impl NodeBounds {
    pub fn unbounded() -> Self {
        NodeBounds {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    #[inline]
    pub fn clamp(&self, weight: f64) -> f64 {
        weight.max(self.lower).min(self.upper)
    }
}

impl Default for NodeBounds {
    fn default() -> Self {
        NodeBounds::unbounded()
    }
}

/// Feature interaction constraint specification.
#[derive(Debug, Clone, Default)]
pub struct InteractionConstraint {
    /// Groups of features that can interact with each other
    pub allowed_groups: Vec<BTreeSet<FeatureIndex>>,
}

impl InteractionConstraint {
    pub fn new(groups: Vec<Vec<FeatureIndex>>) -> Self {
        InteractionConstraint {
            allowed_groups: groups
                .into_iter()
                .filter(|g| !g.is_empty())
                .map(|g| g.into_iter().collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allowed_groups.is_empty()
    }

    /// Whether `feature` may split a node whose path already uses `path_features`.
    ///
    /// Allowed when the path features plus `feature` form a single feature or
    /// are all contained in one allowed group.
    pub fn can_use_feature(&self, feature: FeatureIndex, path_features: &BTreeSet<FeatureIndex>) -> bool {
        if self.allowed_groups.is_empty() {
            return true;
        }
        if path_features.iter().all(|&f| f == feature) {
            return true;
        }
        self.allowed_groups.iter().any(|group| {
            group.contains(&feature) && path_features.iter().all(|f| group.contains(f))
        })
    }
}

/// Per-tree view of all split constraints.
#[derive(Debug, Clone, Default)]
pub struct ConstraintManager {
    monotonic: Vec<MonotonicConstraint>,
    interaction: InteractionConstraint,
}

impl ConstraintManager {
    pub fn new(monotonic: Vec<MonotonicConstraint>, interaction: InteractionConstraint) -> Self {
        ConstraintManager {
            monotonic,
            interaction,
        }
    }

    /// Builds the constraints for a matrix with `num_features` columns.
    pub fn from_config(config: &Config, num_features: usize) -> Result<Self> {
        if config.monotone_constraints.len() > num_features {
            return Err(XGBoostError::invalid_parameter(
                "monotone_constraints",
                config.monotone_constraints.len().to_string(),
                format!("more constraints than the {} features", num_features),
            ));
        }
        let groups = config.interaction_sets()?;
        if let Some(&bad) = groups.iter().flatten().find(|&&f| f >= num_features) {
            return Err(XGBoostError::invalid_parameter(
                "interaction_constraints",
                bad.to_string(),
                format!("feature index out of range for {} features", num_features),
            ));
        }
        let monotonic = config
            .monotone_constraints
            .iter()
            .map(|&c| MonotonicConstraint::from(c))
            .collect();
        Ok(ConstraintManager::new(monotonic, InteractionConstraint::new(groups)))
    }

    pub fn monotonic(&self, feature: FeatureIndex) -> MonotonicConstraint {
        self.monotonic.get(feature).copied().unwrap_or_default()
    }

    pub fn has_monotonic(&self) -> bool {
        self.monotonic.iter().any(|c| *c != MonotonicConstraint::None)
    }

    pub fn interaction(&self) -> &InteractionConstraint {
        &self.interaction
    }

    /// Keeps the candidate features allowed by the interaction constraints.
    pub fn filter_candidate_features(
        &self,
        features: &[FeatureIndex],
        path_features: &BTreeSet<FeatureIndex>,
    ) -> Vec<FeatureIndex> {
        if self.interaction.is_empty() {
            return features.to_vec();
        }
        features
            .iter()
            .copied()
            .filter(|&f| self.interaction.can_use_feature(f, path_features))
            .collect()
    }

    /// Bounds of the two children after splitting on `feature`.
    pub fn child_bounds(
        &self,
        feature: FeatureIndex,
        parent: NodeBounds,
        left_weight: f64,
        right_weight: f64,
    ) -> (NodeBounds, NodeBounds) {
        let mut left = parent;
        let mut right = parent;
        let mid = (left_weight + right_weight) / 2.0;
        match self.monotonic(feature) {
            MonotonicConstraint::None => {}
            MonotonicConstraint::Increasing => {
                left.upper = mid;
                right.lower = mid;
            }
            MonotonicConstraint::Decreasing => {
                left.lower = mid;
                right.upper = mid;
            }
        }
        (left, right)
    }
}
