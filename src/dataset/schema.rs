//! Feature schema frozen at training time.
//!
//! The schema records feature names (when given) and types. At prediction
//! time [`FeatureSchema::align`] checks an incoming matrix against it and
//! returns the column permutation that brings the input into training order.

use crate::core::error::{Result, XGBoostError};
use crate::core::types::{FeatureIndex, FeatureType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Option<Vec<String>>,
    types: Vec<FeatureType>,
}

impl FeatureSchema {
    /// Creates a schema. `names`, when present, must have one entry per type.
    pub fn new(names: Option<Vec<String>>, types: Vec<FeatureType>) -> Result<Self> {
        if let Some(names) = &names {
            if names.len() != types.len() {
                return Err(XGBoostError::invalid_input(format!(
                    "{} feature names given for {} features",
                    names.len(),
                    types.len()
                )));
            }
            let mut seen = HashSet::with_capacity(names.len());
            for name in names {
                if !seen.insert(name.as_str()) {
                    return Err(XGBoostError::invalid_input(format!(
                        "feature names must be unique, '{}' appears twice",
                        name
                    )));
                }
            }
        }
        Ok(FeatureSchema { names, types })
    }

    /// All-numeric schema without names.
    pub fn unnamed(num_features: usize) -> Self {
        FeatureSchema {
            names: None,
            types: vec![FeatureType::Quantitative; num_features],
        }
    }

    pub fn num_features(&self) -> usize {
        self.types.len()
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn types(&self) -> &[FeatureType] {
        &self.types
    }

    pub fn feature_type(&self, feature: FeatureIndex) -> FeatureType {
        self.types.get(feature).copied().unwrap_or_default()
    }

    /// Display name of a feature, `f{index}` when the schema is unnamed.
    pub fn feature_name(&self, feature: FeatureIndex) -> String {
        match &self.names {
            Some(names) if feature < names.len() => names[feature].clone(),
            _ => format!("f{}", feature),
        }
    }

    /// Checks `input` against this schema.
    ///
    /// Returns, for every training feature, the column of `input` holding it.
    /// When both sides are named the name sets must be equal (order does not
    /// matter); otherwise the column counts must be equal.
    pub fn align(&self, input: &FeatureSchema) -> Result<Vec<usize>> {
        match (&self.names, &input.names) {
            (Some(expected), Some(actual)) => {
                let positions: HashMap<&str, usize> = actual
                    .iter()
                    .enumerate()
                    .map(|(i, name)| (name.as_str(), i))
                    .collect();
                let expected_set: HashSet<&str> = expected.iter().map(String::as_str).collect();

                let missing: Vec<&str> = expected
                    .iter()
                    .map(String::as_str)
                    .filter(|name| !positions.contains_key(name))
                    .collect();
                let extra: Vec<&str> = actual
                    .iter()
                    .map(String::as_str)
                    .filter(|name| !expected_set.contains(name))
                    .collect();

                if !missing.is_empty() || !extra.is_empty() {
                    let mut message = String::from("feature_names mismatch");
                    if !missing.is_empty() {
                        message.push_str(&format!("; expected {:?} in input data", missing));
                    }
                    if !extra.is_empty() {
                        message.push_str(&format!(
                            "; training data did not have the following fields: {:?}",
                            extra
                        ));
                    }
                    return Err(XGBoostError::feature_mismatch(message));
                }

                Ok(expected.iter().map(|name| positions[name.as_str()]).collect())
            }
            _ => {
                if self.num_features() != input.num_features() {
                    return Err(XGBoostError::feature_mismatch(format!(
                        "feature count mismatch: model expects {} features, input has {}",
                        self.num_features(),
                        input.num_features()
                    )));
                }
                Ok((0..self.num_features()).collect())
            }
        }
    }
}
