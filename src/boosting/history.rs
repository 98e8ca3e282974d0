//! Per-round evaluation history.

use serde::{Deserialize, Serialize};

/// Scores of one evaluation set, one series per metric in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    pub name: String,
    pub metrics: Vec<(String, Vec<f64>)>,
}

/// Evaluation results keyed by evaluation set, then metric, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalHistory {
    sets: Vec<EvalRecord>,
}

impl EvalHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Appends `value` to the series of `metric` on `set`.
    pub fn push(&mut self, set: &str, metric: &str, value: f64) {
        let index = match self.sets.iter().position(|r| r.name == set) {
            Some(index) => index,
            None => {
                self.sets.push(EvalRecord {
                    name: set.to_string(),
                    metrics: Vec::new(),
                });
                self.sets.len() - 1
            }
        };
        let record = &mut self.sets[index];
        match record.metrics.iter_mut().find(|(name, _)| name == metric) {
            Some((_, values)) => values.push(value),
            None => record.metrics.push((metric.to_string(), vec![value])),
        }
    }

    pub fn get(&self, set: &str, metric: &str) -> Option<&[f64]> {
        self.sets
            .iter()
            .find(|r| r.name == set)?
            .metrics
            .iter()
            .find(|(name, _)| name == metric)
            .map(|(_, values)| values.as_slice())
    }

    pub fn set_names(&self) -> Vec<&str> {
        self.sets.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn records(&self) -> &[EvalRecord] {
        &self.sets
    }
}
