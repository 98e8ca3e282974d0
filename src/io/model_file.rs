//! Versioned model document for the Pure Rust XGBoost framework.
//!
//! The same document is written as JSON and as binary. Parameters are kept
//! as strings inside namespaced sections so that newer minor versions can
//! add keys without breaking older readers. Trees are stored as parallel
//! arrays indexed by node id.

use crate::boosting::booster::Booster;
use crate::boosting::ensemble::TreeEnsemble;
use crate::config::{Config, ParamSection};
use crate::core::constants::MODEL_FORMAT_VERSION;
use crate::core::error::{Result, XGBoostError};
use crate::core::types::{FeatureType, MultiStrategy};
use crate::dataset::FeatureSchema;
use crate::objective::{create_objective_function, CustomObjective, ObjectiveFunction};
use crate::tree::{RegTree, SplitCondition, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Checks that a document of version `found` can be read.
///
/// Any minor version of the current major is accepted; newer minors only
/// produce a warning since unknown keys are ignored.
pub fn check_version(found: [u32; 3]) -> Result<()> {
    let supported = MODEL_FORMAT_VERSION;
    let render = |v: [u32; 3]| format!("{}.{}.{}", v[0], v[1], v[2]);
    if found[0] != supported[0] {
        return Err(XGBoostError::incompatible_version(render(found), render(supported)));
    }
    if found[1] > supported[1] {
        log::warn!(
            "Model was written by a newer format version {}; loading with {}",
            render(found),
            render(supported)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub version: [u32; 3],
    pub learner: LearnerDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerDocument {
    pub attributes: BTreeMap<String, String>,
    /// Empty when the training data had no feature names
    pub feature_names: Vec<String>,
    pub feature_types: Vec<String>,
    pub learner_model_param: LearnerModelParam,
    pub objective: ObjectiveDocument,
    pub gradient_booster: GradientBoosterDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerModelParam {
    pub base_score: String,
    pub num_class: String,
    pub num_feature: String,
    pub num_target: String,
    pub boost_from_average: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDocument {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosterDocument {
    pub name: String,
    pub gbtree_model_param: GbtreeModelParam,
    pub gbtree_train_param: BTreeMap<String, String>,
    pub tree_train_param: BTreeMap<String, String>,
    pub model: GbtreeModelDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbtreeModelParam {
    pub num_trees: String,
    pub num_parallel_tree: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbtreeModelDocument {
    pub trees: Vec<TreeDocument>,
    pub tree_info: Vec<usize>,
    pub iteration_indptr: Vec<usize>,
    pub multi_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParam {
    pub num_nodes: String,
    pub size_leaf_vector: String,
    pub num_feature: String,
}

/// One tree as parallel per-node arrays; `-1` marks an absent node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    pub id: usize,
    pub tree_param: TreeParam,
    pub left_children: Vec<i32>,
    pub right_children: Vec<i32>,
    pub parents: Vec<i32>,
    pub split_indices: Vec<u32>,
    /// Threshold of numerical splits, leaf value of scalar leaves
    pub split_conditions: Vec<f32>,
    /// 0 numerical, 1 categorical
    pub split_type: Vec<u8>,
    pub default_left: Vec<u8>,
    /// `size_leaf_vector` weights per node
    pub base_weights: Vec<f32>,
    pub loss_changes: Vec<f32>,
    pub sum_hessian: Vec<f32>,
    pub categories: Vec<u32>,
    pub categories_nodes: Vec<u32>,
    pub categories_segments: Vec<u64>,
    pub categories_sizes: Vec<u64>,
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| XGBoostError::serialization(format!("invalid value '{}' for {}", value, field)))
}

/// Renders per-output base scores as a bracketed list, e.g. `[0.5,10.5]`.
pub(crate) fn format_base_score(base_score: &[f32]) -> String {
    serde_json::to_string(base_score).unwrap_or_else(|_| "[]".to_string())
}

/// Parses a bracketed list or a single scalar, which applies to every
/// output.
fn parse_base_score(value: &str, num_outputs: usize) -> Result<Vec<f32>> {
    let invalid = || XGBoostError::serialization(format!("invalid value '{}' for base_score", value));
    let scores: Vec<f32> = if value.trim_start().starts_with('[') {
        serde_json::from_str(value).map_err(|_| invalid())?
    } else {
        vec![value.trim().parse().map_err(|_| invalid())?]
    };
    match scores.len() {
        1 => Ok(vec![scores[0]; num_outputs]),
        n if n == num_outputs => Ok(scores),
        n => Err(XGBoostError::serialization(format!(
            "{} base scores for a model with {} outputs",
            n, num_outputs
        ))),
    }
}

fn node_index(value: i32) -> Option<usize> {
    usize::try_from(value).ok()
}

impl TreeDocument {
    pub fn from_tree(id: usize, tree: &RegTree, num_feature: usize) -> Self {
        let n = tree.num_nodes();
        let mut doc = TreeDocument {
            id,
            tree_param: TreeParam {
                num_nodes: n.to_string(),
                size_leaf_vector: tree.num_outputs().to_string(),
                num_feature: num_feature.to_string(),
            },
            left_children: Vec::with_capacity(n),
            right_children: Vec::with_capacity(n),
            parents: Vec::with_capacity(n),
            split_indices: Vec::with_capacity(n),
            split_conditions: Vec::with_capacity(n),
            split_type: Vec::with_capacity(n),
            default_left: Vec::with_capacity(n),
            base_weights: Vec::with_capacity(n * tree.num_outputs()),
            loss_changes: Vec::with_capacity(n),
            sum_hessian: Vec::with_capacity(n),
            categories: Vec::new(),
            categories_nodes: Vec::new(),
            categories_segments: Vec::new(),
            categories_sizes: Vec::new(),
        };
        let to_i32 = |index: Option<usize>| index.map_or(-1, |i| i as i32);
        for (nid, node) in tree.nodes().iter().enumerate() {
            doc.left_children.push(to_i32(node.left_child()));
            doc.right_children.push(to_i32(node.right_child()));
            doc.parents.push(to_i32(node.parent()));
            doc.default_left.push(node.default_left() as u8);
            doc.base_weights.extend_from_slice(node.weight());
            doc.loss_changes.push(node.loss_change());
            doc.sum_hessian.push(node.sum_hessian());
            match node.split() {
                Some(SplitCondition::Numerical { feature, threshold }) => {
                    doc.split_indices.push(*feature as u32);
                    doc.split_conditions.push(*threshold);
                    doc.split_type.push(0);
                }
                Some(SplitCondition::Categorical { feature, categories }) => {
                    doc.split_indices.push(*feature as u32);
                    doc.split_conditions.push(0.0);
                    doc.split_type.push(1);
                    doc.categories_nodes.push(nid as u32);
                    doc.categories_segments.push(doc.categories.len() as u64);
                    doc.categories_sizes.push(categories.len() as u64);
                    doc.categories.extend_from_slice(categories);
                }
                None => {
                    doc.split_indices.push(0);
                    doc.split_conditions
                        .push(if tree.is_vector_leaf() { 0.0 } else { node.weight()[0] });
                    doc.split_type.push(0);
                }
            }
        }
        doc
    }

    pub fn into_tree(self) -> Result<RegTree> {
        let n = self.left_children.len();
        let num_outputs: usize = parse_field("size_leaf_vector", &self.tree_param.size_leaf_vector)?;
        let num_outputs = num_outputs.max(1);
        let lengths = [
            self.right_children.len(),
            self.parents.len(),
            self.split_indices.len(),
            self.split_conditions.len(),
            self.split_type.len(),
            self.default_left.len(),
            self.loss_changes.len(),
            self.sum_hessian.len(),
        ];
        if lengths.iter().any(|&len| len != n) || self.base_weights.len() != n * num_outputs {
            return Err(XGBoostError::serialization(format!(
                "tree {} has inconsistent node arrays",
                self.id
            )));
        }

        let mut categorical: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
        for ((&nid, &start), &size) in self
            .categories_nodes
            .iter()
            .zip(&self.categories_segments)
            .zip(&self.categories_sizes)
        {
            let (start, end) = (start as usize, (start + size) as usize);
            let set = self.categories.get(start..end).ok_or_else(|| {
                XGBoostError::serialization(format!("tree {} has an invalid category segment", self.id))
            })?;
            categorical.insert(nid as usize, set.to_vec());
        }

        let mut depths = vec![0usize; n];
        let mut nodes = Vec::with_capacity(n);
        for nid in 0..n {
            let parent = node_index(self.parents[nid]);
            if let Some(p) = parent {
                if p >= nid {
                    return Err(XGBoostError::serialization(format!(
                        "tree {} node {} has parent {} after it",
                        self.id, nid, p
                    )));
                }
                depths[nid] = depths[p] + 1;
            }
            let children = match (node_index(self.left_children[nid]), node_index(self.right_children[nid])) {
                (Some(l), Some(r)) => Some((l, r)),
                (None, None) => None,
                _ => {
                    return Err(XGBoostError::serialization(format!(
                        "tree {} node {} has a single child",
                        self.id, nid
                    )))
                }
            };
            let split = match children {
                None => None,
                Some(_) => {
                    let feature = self.split_indices[nid] as usize;
                    Some(match self.split_type[nid] {
                        0 => SplitCondition::Numerical {
                            feature,
                            threshold: self.split_conditions[nid],
                        },
                        1 => SplitCondition::Categorical {
                            feature,
                            categories: categorical.remove(&nid).unwrap_or_default(),
                        },
                        other => {
                            return Err(XGBoostError::serialization(format!(
                                "tree {} node {} has unknown split type {}",
                                self.id, nid, other
                            )))
                        }
                    })
                }
            };
            nodes.push(TreeNode::from_parts(
                parent,
                children,
                split,
                self.default_left[nid] != 0,
                self.base_weights[nid * num_outputs..(nid + 1) * num_outputs].to_vec(),
                self.loss_changes[nid],
                self.sum_hessian[nid],
                depths[nid],
            ));
        }
        Ok(RegTree::from_nodes(nodes, num_outputs)?)
    }
}

impl ModelDocument {
    pub fn from_booster(booster: &Booster) -> Self {
        let config = booster.config();
        let ensemble = booster.ensemble();
        let num_feature = booster.num_features();

        let mut gbtree_train_param = config.section_params(ParamSection::GbtreeTrain);
        gbtree_train_param.insert("tree_method".to_string(), config.tree_method.resolve().to_string());

        let num_outputs = ensemble.num_outputs();
        let num_class = if booster.objective().name().starts_with("multi:") {
            num_outputs
        } else {
            0
        };
        let num_target = if num_class > 0 { 1 } else { num_outputs };

        ModelDocument {
            version: MODEL_FORMAT_VERSION,
            learner: LearnerDocument {
                attributes: booster.attributes().clone(),
                feature_names: booster.feature_names().map(<[String]>::to_vec).unwrap_or_default(),
                feature_types: booster
                    .feature_types()
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
                learner_model_param: LearnerModelParam {
                    base_score: format_base_score(booster.base_score()),
                    num_class: num_class.to_string(),
                    num_feature: num_feature.to_string(),
                    num_target: num_target.to_string(),
                    boost_from_average: config.boost_from_average.to_string(),
                },
                objective: ObjectiveDocument {
                    name: booster.objective().name().to_string(),
                    params: config.section_params(ParamSection::Objective),
                },
                gradient_booster: GradientBoosterDocument {
                    name: "gbtree".to_string(),
                    gbtree_model_param: GbtreeModelParam {
                        num_trees: ensemble.num_trees().to_string(),
                        num_parallel_tree: ensemble.num_parallel_tree().to_string(),
                    },
                    gbtree_train_param,
                    tree_train_param: config.section_params(ParamSection::TreeTrain),
                    model: GbtreeModelDocument {
                        trees: ensemble
                            .trees()
                            .iter()
                            .enumerate()
                            .map(|(id, tree)| TreeDocument::from_tree(id, tree, num_feature))
                            .collect(),
                        tree_info: ensemble.tree_info().to_vec(),
                        iteration_indptr: ensemble.iteration_indptr().to_vec(),
                        multi_strategy: ensemble.multi_strategy().to_string(),
                    },
                },
            },
        }
    }

    /// Rebuilds the configuration, objective and ensemble of the document.
    pub fn into_booster(self) -> Result<Booster> {
        check_version(self.version)?;
        let learner = self.learner;
        let booster_doc = learner.gradient_booster;
        if booster_doc.name != "gbtree" {
            return Err(XGBoostError::unsupported(format!(
                "gradient booster {}",
                booster_doc.name
            )));
        }

        let mut config = Config::default();
        let sections = [
            &learner.objective.params,
            &booster_doc.gbtree_train_param,
            &booster_doc.tree_train_param,
        ];
        for (key, value) in sections.into_iter().flatten() {
            config.set_param(key, value)?;
        }
        config.set_param("num_parallel_tree", &booster_doc.gbtree_model_param.num_parallel_tree)?;
        config.set_param("boost_from_average", &learner.learner_model_param.boost_from_average)?;

        let params = &learner.learner_model_param;
        let num_feature: usize = parse_field("num_feature", &params.num_feature)?;
        let num_class: usize = parse_field("num_class", &params.num_class)?;
        let num_target: usize = parse_field("num_target", &params.num_target)?;

        let objective: Arc<dyn ObjectiveFunction> = if learner.objective.name == "custom" {
            Arc::new(CustomObjective::detached(num_class.max(num_target)))
        } else {
            config.objective = learner.objective.name.clone();
            if num_class > 0 {
                config.num_class = num_class;
            }
            Arc::from(create_objective_function(&config, num_target)?)
        };
        let num_outputs = objective.num_model_outputs();
        let base_score = parse_base_score(&params.base_score, num_outputs)?;

        let types = learner
            .feature_types
            .iter()
            .map(|t| t.parse::<FeatureType>())
            .collect::<Result<Vec<_>>>()?;
        if types.len() != num_feature {
            return Err(XGBoostError::serialization(format!(
                "{} feature types for {} features",
                types.len(),
                num_feature
            )));
        }
        let names = if learner.feature_names.is_empty() {
            None
        } else {
            Some(learner.feature_names)
        };
        let schema = FeatureSchema::new(names, types)?;

        let model = booster_doc.model;
        let trees = model
            .trees
            .into_iter()
            .map(TreeDocument::into_tree)
            .collect::<Result<Vec<_>>>()?;
        for (id, tree) in trees.iter().enumerate() {
            if let Some(feature) = tree
                .split_nodes()
                .filter_map(|node| node.split_feature())
                .find(|&feature| feature >= num_feature)
            {
                return Err(XGBoostError::serialization(format!(
                    "tree {} splits on feature {} of a model with {} features",
                    id, feature, num_feature
                )));
            }
        }
        let multi_strategy: MultiStrategy = model.multi_strategy.parse()?;
        let num_parallel_tree: usize = parse_field(
            "num_parallel_tree",
            &booster_doc.gbtree_model_param.num_parallel_tree,
        )?;
        let ensemble = TreeEnsemble::from_parts(
            trees,
            model.tree_info,
            model.iteration_indptr,
            num_outputs,
            num_parallel_tree,
            multi_strategy,
        )?;

        Booster::from_parts(config, ensemble, base_score, objective, schema, learner.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> RegTree {
        let mut tree = RegTree::new(1, vec![0.0], 8.0);
        let (left, _) = tree
            .expand_node(
                0,
                SplitCondition::Numerical {
                    feature: 1,
                    threshold: 0.25,
                },
                true,
                3.5,
                vec![-0.2],
                vec![0.3],
                5.0,
                3.0,
            )
            .unwrap();
        tree.expand_node(
            left,
            SplitCondition::Categorical {
                feature: 0,
                categories: vec![1, 4],
            },
            false,
            1.25,
            vec![-0.4],
            vec![0.1],
            2.0,
            3.0,
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_tree_document_round_trip() {
        let tree = sample_tree();
        let doc = TreeDocument::from_tree(0, &tree, 2);
        assert_eq!(doc.left_children, vec![1, 3, -1, -1, -1]);
        assert_eq!(doc.parents, vec![-1, 0, 0, 1, 1]);
        assert_eq!(doc.split_type, vec![0, 1, 0, 0, 0]);
        assert_eq!(doc.categories, vec![1, 4]);
        assert_eq!(doc.categories_nodes, vec![1]);
        assert_eq!(doc.into_tree().unwrap(), tree);
    }

    #[test]
    fn test_inconsistent_tree_rejected() {
        let mut doc = TreeDocument::from_tree(0, &sample_tree(), 2);
        doc.loss_changes.pop();
        assert!(doc.into_tree().is_err());
    }

    #[test]
    fn test_base_score_formats() {
        assert_eq!(format_base_score(&[0.5, 10.25]), "[0.5,10.25]");
        assert_eq!(parse_base_score("[0.5,10.25]", 2).unwrap(), vec![0.5, 10.25]);
        assert_eq!(parse_base_score("0.5", 3).unwrap(), vec![0.5; 3]);
        assert_eq!(parse_base_score("[2.0]", 2).unwrap(), vec![2.0, 2.0]);
        assert!(parse_base_score("[1.0,2.0]", 3).is_err());
        assert!(parse_base_score("half", 1).is_err());
    }

    #[test]
    fn test_version_rules() {
        let [major, minor, patch] = MODEL_FORMAT_VERSION;
        assert!(check_version([major, minor, patch]).is_ok());
        assert!(check_version([major, minor + 1, 0]).is_ok());
        if minor > 0 {
            assert!(check_version([major, minor - 1, 0]).is_ok());
        }
        let err = check_version([major + 1, 0, 0]).unwrap_err();
        assert!(matches!(err, XGBoostError::IncompatibleVersion { .. }));
    }
}
