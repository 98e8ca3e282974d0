//! Core data types for the Pure Rust XGBoost implementation.
//!
//! This module defines the scalar aliases shared across the crate together
//! with the small enumerations that select training strategies.

use crate::core::error::{Result, XGBoostError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// Prediction and gradient value type.
pub type Score = f32;

/// Target value and sample weight type.
pub type Label = f32;

/// Histogram accumulation type. 64-bit float for numerically stable sums.
pub type Hist = f64;

/// Feature index type for identifying features in the matrix.
pub type FeatureIndex = usize;

/// Bin index type for discretized feature values.
pub type BinIndex = u32;

/// Tree node identifier type (index into the node arena).
pub type NodeIndex = usize;

/// Boosting round number.
pub type IterationIndex = usize;

/// First and second order gradient of the loss for one row and one output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientPair {
    pub grad: f32,
    pub hess: f32,
}

impl GradientPair {
    pub fn new(grad: f32, hess: f32) -> Self {
        GradientPair { grad, hess }
    }
}

/// Summed gradient statistics of a set of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradStats {
    pub sum_grad: Hist,
    pub sum_hess: Hist,
}

impl GradStats {
    pub fn new(sum_grad: Hist, sum_hess: Hist) -> Self {
        GradStats { sum_grad, sum_hess }
    }

    #[inline]
    pub fn add_pair(&mut self, pair: GradientPair) {
        self.sum_grad += pair.grad as Hist;
        self.sum_hess += pair.hess as Hist;
    }

    pub fn is_empty(&self) -> bool {
        self.sum_hess == 0.0 && self.sum_grad == 0.0
    }
}

impl Add for GradStats {
    type Output = GradStats;
    fn add(self, rhs: GradStats) -> GradStats {
        GradStats::new(self.sum_grad + rhs.sum_grad, self.sum_hess + rhs.sum_hess)
    }
}

impl AddAssign for GradStats {
    fn add_assign(&mut self, rhs: GradStats) {
        self.sum_grad += rhs.sum_grad;
        self.sum_hess += rhs.sum_hess;
    }
}

impl Sub for GradStats {
    type Output = GradStats;
    fn sub(self, rhs: GradStats) -> GradStats {
        GradStats::new(self.sum_grad - rhs.sum_grad, self.sum_hess - rhs.sum_hess)
    }
}

impl SubAssign for GradStats {
    fn sub_assign(&mut self, rhs: GradStats) {
        self.sum_grad -= rhs.sum_grad;
        self.sum_hess -= rhs.sum_hess;
    }
}

/// Tree construction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeMethod {
    /// Provisional choice resolved before training starts
    Auto,
    /// Enumerate every distinct value of every feature
    Exact,
    /// Quantile sketch rebuilt every round from Hessian weights
    Approx,
    /// Quantile sketch built once for the whole run
    Hist,
}

impl TreeMethod {
    /// Resolves the provisional `auto` marker into a concrete method.
    pub fn resolve(self) -> TreeMethod {
        match self {
            TreeMethod::Auto => TreeMethod::Hist,
            other => other,
        }
    }

    pub fn uses_histograms(self) -> bool {
        !matches!(self.resolve(), TreeMethod::Exact)
    }
}

impl Default for TreeMethod {
    fn default() -> Self {
        TreeMethod::Auto
    }
}

impl fmt::Display for TreeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeMethod::Auto => write!(f, "auto"),
            TreeMethod::Exact => write!(f, "exact"),
            TreeMethod::Approx => write!(f, "approx"),
            TreeMethod::Hist => write!(f, "hist"),
        }
    }
}

impl FromStr for TreeMethod {
    type Err = XGBoostError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(TreeMethod::Auto),
            "exact" => Ok(TreeMethod::Exact),
            "approx" => Ok(TreeMethod::Approx),
            "hist" => Ok(TreeMethod::Hist),
            other => Err(XGBoostError::invalid_parameter(
                "tree_method",
                other,
                "expected one of auto, exact, approx, hist",
            )),
        }
    }
}

/// Order in which open nodes are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowPolicy {
    /// Level by level, bounded by depth
    Depthwise,
    /// Best loss change first, bounded by leaf count
    Lossguide,
}

impl Default for GrowPolicy {
    fn default() -> Self {
        GrowPolicy::Depthwise
    }
}

impl fmt::Display for GrowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowPolicy::Depthwise => write!(f, "depthwise"),
            GrowPolicy::Lossguide => write!(f, "lossguide"),
        }
    }
}

impl FromStr for GrowPolicy {
    type Err = XGBoostError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "depthwise" | "0" => Ok(GrowPolicy::Depthwise),
            "lossguide" | "1" => Ok(GrowPolicy::Lossguide),
            other => Err(XGBoostError::invalid_parameter(
                "grow_policy",
                other,
                "expected depthwise or lossguide",
            )),
        }
    }
}

/// How trees are built for models with more than one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiStrategy {
    /// One scalar-leaf tree per output per round
    OneOutputPerTree,
    /// A single tree per round whose leaves hold one weight per output
    MultiOutputTree,
}

impl Default for MultiStrategy {
    fn default() -> Self {
        MultiStrategy::OneOutputPerTree
    }
}

impl fmt::Display for MultiStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultiStrategy::OneOutputPerTree => write!(f, "one_output_per_tree"),
            MultiStrategy::MultiOutputTree => write!(f, "multi_output_tree"),
        }
    }
}

impl FromStr for MultiStrategy {
    type Err = XGBoostError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one_output_per_tree" => Ok(MultiStrategy::OneOutputPerTree),
            "multi_output_tree" => Ok(MultiStrategy::MultiOutputTree),
            other => Err(XGBoostError::invalid_parameter(
                "multi_strategy",
                other,
                "expected one_output_per_tree or multi_output_tree",
            )),
        }
    }
}

/// How the trees grown in parallel within one round are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallelTreeCombine {
    /// Random-forest style: each tree is scaled by `1 / num_parallel_tree`
    Average,
    /// Boosting style: each tree contributes with the full learning rate
    Sum,
}

impl Default for ParallelTreeCombine {
    fn default() -> Self {
        ParallelTreeCombine::Average
    }
}

impl fmt::Display for ParallelTreeCombine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParallelTreeCombine::Average => write!(f, "average"),
            ParallelTreeCombine::Sum => write!(f, "sum"),
        }
    }
}

impl FromStr for ParallelTreeCombine {
    type Err = XGBoostError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "average" => Ok(ParallelTreeCombine::Average),
            "sum" => Ok(ParallelTreeCombine::Sum),
            other => Err(XGBoostError::invalid_parameter(
                "parallel_tree_combine",
                other,
                "expected average or sum",
            )),
        }
    }
}

/// Semantic type of a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    /// Numeric column (`q`)
    #[serde(rename = "q")]
    Quantitative,
    /// Indicator column produced by one-hot expansion (`i`)
    #[serde(rename = "i")]
    Indicator,
    /// Native categorical column holding non-negative integer codes (`c`)
    #[serde(rename = "c")]
    Categorical,
}

impl FeatureType {
    pub fn is_categorical(self) -> bool {
        matches!(self, FeatureType::Categorical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Quantitative => "q",
            FeatureType::Indicator => "i",
            FeatureType::Categorical => "c",
        }
    }
}

impl Default for FeatureType {
    fn default() -> Self {
        FeatureType::Quantitative
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = XGBoostError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "q" | "float" | "int" => Ok(FeatureType::Quantitative),
            "i" => Ok(FeatureType::Indicator),
            "c" | "categorical" => Ok(FeatureType::Categorical),
            other => Err(XGBoostError::invalid_input(format!(
                "unknown feature type '{}', expected one of q, i, c",
                other
            ))),
        }
    }
}

/// Kind of feature importance to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceType {
    /// Number of splits using the feature
    Weight,
    /// Average loss change of splits using the feature
    Gain,
    /// Total loss change of splits using the feature
    TotalGain,
    /// Average Hessian sum of rows reaching splits on the feature
    Cover,
    /// Total Hessian sum of rows reaching splits on the feature
    TotalCover,
}

impl ImportanceType {
    /// Whether the importance reads split statistics (gain or cover).
    pub fn needs_split_stats(self) -> bool {
        !matches!(self, ImportanceType::Weight)
    }
}

impl Default for ImportanceType {
    fn default() -> Self {
        ImportanceType::Gain
    }
}

impl fmt::Display for ImportanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportanceType::Weight => write!(f, "weight"),
            ImportanceType::Gain => write!(f, "gain"),
            ImportanceType::TotalGain => write!(f, "total_gain"),
            ImportanceType::Cover => write!(f, "cover"),
            ImportanceType::TotalCover => write!(f, "total_cover"),
        }
    }
}

impl FromStr for ImportanceType {
    type Err = XGBoostError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "weight" => Ok(ImportanceType::Weight),
            "gain" => Ok(ImportanceType::Gain),
            "total_gain" => Ok(ImportanceType::TotalGain),
            "cover" => Ok(ImportanceType::Cover),
            "total_cover" => Ok(ImportanceType::TotalCover),
            other => Err(XGBoostError::invalid_parameter(
                "importance_type",
                other,
                "expected one of weight, gain, total_gain, cover, total_cover",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_method_resolution() {
        assert_eq!(TreeMethod::default(), TreeMethod::Auto);
        assert_eq!(TreeMethod::Auto.resolve(), TreeMethod::Hist);
        assert_eq!(TreeMethod::Approx.resolve(), TreeMethod::Approx);
        assert!(!TreeMethod::Exact.uses_histograms());
        assert!(TreeMethod::Auto.uses_histograms());
    }

    #[test]
    fn test_enum_display_round_trip() {
        for method in [TreeMethod::Auto, TreeMethod::Exact, TreeMethod::Approx, TreeMethod::Hist] {
            assert_eq!(method.to_string().parse::<TreeMethod>().unwrap(), method);
        }
        assert_eq!("lossguide".parse::<GrowPolicy>().unwrap(), GrowPolicy::Lossguide);
        assert_eq!(
            "multi_output_tree".parse::<MultiStrategy>().unwrap(),
            MultiStrategy::MultiOutputTree
        );
        assert!("gpu_hist".parse::<TreeMethod>().is_err());
    }

    #[test]
    fn test_feature_type_codes() {
        assert_eq!(FeatureType::Categorical.to_string(), "c");
        assert_eq!("float".parse::<FeatureType>().unwrap(), FeatureType::Quantitative);
        assert!("x".parse::<FeatureType>().is_err());
        let json = serde_json::to_string(&vec![FeatureType::Indicator, FeatureType::Categorical]).unwrap();
        assert_eq!(json, r#"["i","c"]"#);
    }

    #[test]
    fn test_grad_stats_arithmetic() {
        let mut stats = GradStats::default();
        stats.add_pair(GradientPair::new(0.5, 1.0));
        stats.add_pair(GradientPair::new(-1.5, 2.0));
        assert_eq!(stats, GradStats::new(-1.0, 3.0));

        let diff = stats - GradStats::new(-0.5, 1.0);
        assert_eq!(diff, GradStats::new(-0.5, 2.0));
    }

    #[test]
    fn test_importance_type_parsing() {
        assert_eq!("total_cover".parse::<ImportanceType>().unwrap(), ImportanceType::TotalCover);
        assert!(!ImportanceType::Weight.needs_split_stats());
        assert!(ImportanceType::Cover.needs_split_stats());
    }
}
