//! Early stopping for the Pure Rust XGBoost framework.
//!
//! Training stops once the watched metric has not improved for
//! `early_stopping_rounds` consecutive rounds. The state is updated once per
//! round boundary and never interrupts a round in progress.

use crate::core::types::IterationIndex;
use crate::metrics::MetricDirection;

/// Best round seen so far and the number of rounds since.
#[derive(Debug, Clone, PartialEq)]
pub struct EarlyStoppingState {
    pub best_round: IterationIndex,
    pub best_score: f64,
    pub rounds_since_best: usize,
    patience: usize,
    direction: MetricDirection,
}

impl EarlyStoppingState {
    pub fn new(patience: usize, direction: MetricDirection) -> Self {
        let best_score = match direction {
            MetricDirection::Minimize => f64::INFINITY,
            MetricDirection::Maximize => f64::NEG_INFINITY,
        };
        EarlyStoppingState {
            best_round: 0,
            best_score,
            rounds_since_best: 0,
            patience,
            direction,
        }
    }

    /// Records the score of `round`; returns true when training should stop.
    pub fn update(&mut self, round: IterationIndex, score: f64) -> bool {
        if self.direction.improves(score, self.best_score) {
            self.best_round = round;
            self.best_score = score;
            self.rounds_since_best = 0;
        } else {
            self.rounds_since_best += 1;
        }
        self.should_stop()
    }

    pub fn should_stop(&self) -> bool {
        self.rounds_since_best >= self.patience
    }

    pub fn patience(&self) -> usize {
        self.patience
    }

    pub fn direction(&self) -> MetricDirection {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_after_patience_rounds() {
        let mut state = EarlyStoppingState::new(2, MetricDirection::Minimize);
        assert!(!state.update(0, 0.5));
        assert!(!state.update(1, 0.4));
        assert!(!state.update(2, 0.45));
        assert!(state.update(3, 0.41));
        assert_eq!(state.best_round, 1);
        assert_eq!(state.best_score, 0.4);
    }

    #[test]
    fn test_maximize_direction() {
        let mut state = EarlyStoppingState::new(1, MetricDirection::Maximize);
        state.update(0, 0.6);
        assert!(!state.update(1, 0.7));
        assert!(state.update(2, 0.7));
        assert_eq!(state.best_round, 1);
    }

    #[test]
    fn test_equal_score_is_not_improvement() {
        let mut state = EarlyStoppingState::new(3, MetricDirection::Minimize);
        state.update(0, 1.0);
        state.update(1, 1.0);
        assert_eq!(state.best_round, 0);
        assert_eq!(state.rounds_since_best, 1);
    }
}
