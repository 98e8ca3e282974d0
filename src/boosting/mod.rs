//! Gradient boosting for Pure Rust XGBoost.
//!
//! This module contains the training state machine, the tree ensemble it
//! accumulates, early stopping, and the trained [`Booster`] handle.

pub mod booster;
pub mod early_stopping;
pub mod ensemble;
pub mod gbtree;
pub mod history;

pub use booster::Booster;
pub use early_stopping::EarlyStoppingState;
pub use ensemble::TreeEnsemble;
pub use gbtree::{train, BoosterState, GradientBooster, RoundOutcome, TrainOptions};
pub use history::{EvalHistory, EvalRecord};
