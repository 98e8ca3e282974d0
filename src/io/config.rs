//! Exported runtime configuration.
//!
//! Unlike the model document, this reflects the live [`Config`] of a
//! booster, including settings that are never persisted in a model such as
//! the provisional `auto` tree method.

use crate::boosting::booster::Booster;
use crate::config::ParamSection;
use crate::core::constants::MODEL_FORMAT_VERSION;
use crate::io::model_file::format_base_score;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub version: [u32; 3],
    pub learner: LearnerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    pub generic_param: BTreeMap<String, String>,
    pub learner_train_param: BTreeMap<String, String>,
    /// Read-only model shape, ignored when the document is applied
    pub learner_model_param: BTreeMap<String, String>,
    pub objective: ObjectiveConfig,
    pub gradient_booster: GradientBoosterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosterConfig {
    pub name: String,
    pub gbtree_model_param: BTreeMap<String, String>,
    pub gbtree_train_param: BTreeMap<String, String>,
    pub tree_train_param: BTreeMap<String, String>,
}

impl ConfigDocument {
    pub fn from_booster(booster: &Booster) -> Self {
        let config = booster.config();
        let mut model_param = BTreeMap::new();
        model_param.insert("base_score".to_string(), format_base_score(booster.base_score()));
        model_param.insert("num_feature".to_string(), booster.num_features().to_string());
        let (num_class, num_target) = if booster.objective().name().starts_with("multi:") {
            (booster.num_outputs(), 1)
        } else {
            (0, booster.num_outputs())
        };
        model_param.insert("num_class".to_string(), num_class.to_string());
        model_param.insert("num_target".to_string(), num_target.to_string());

        ConfigDocument {
            version: MODEL_FORMAT_VERSION,
            learner: LearnerConfig {
                generic_param: config.section_params(ParamSection::Generic),
                learner_train_param: config.section_params(ParamSection::LearnerTrain),
                learner_model_param: model_param,
                objective: ObjectiveConfig {
                    name: config.objective.clone(),
                    params: config.section_params(ParamSection::Objective),
                },
                gradient_booster: GradientBoosterConfig {
                    name: "gbtree".to_string(),
                    gbtree_model_param: config.section_params(ParamSection::GbtreeModel),
                    gbtree_train_param: config.section_params(ParamSection::GbtreeTrain),
                    tree_train_param: config.section_params(ParamSection::TreeTrain),
                },
            },
        }
    }

    /// Settings to apply, as `(key, value)` pairs.
    pub fn params(&self) -> Vec<(String, String)> {
        let learner = &self.learner;
        let booster = &learner.gradient_booster;
        let sections = [
            &learner.generic_param,
            &learner.learner_train_param,
            &learner.objective.params,
            &booster.gbtree_model_param,
            &booster.gbtree_train_param,
            &booster.tree_train_param,
        ];
        sections
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
