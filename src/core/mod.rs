//! Core infrastructure module for Pure Rust XGBoost.
//!
//! This module provides the foundational components shared by every other
//! module: scalar types and strategy enumerations, defaults, error handling
//! and logging initialization.
//!
//! - [`types`]: Fundamental data types and enumerations
//! - [`constants`]: Configuration defaults and format constants
//! - [`error`]: Error taxonomy and the crate-wide [`Result`] alias

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{DatasetError, Result, XGBoostError};
pub use types::*;

use std::sync::Once;

static LOGGING: Once = Once::new();

static_assertions::const_assert_eq!(std::mem::size_of::<GradientPair>(), 8);

/// Maps the `verbosity` parameter (0 silent, 1 warning, 2 info, 3 debug)
/// to a log level filter.
pub fn verbosity_to_level(verbosity: usize) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

/// Initialize the logging subsystem once for the whole process.
///
/// `RUST_LOG` takes precedence over `verbosity` when it is set. Subsequent
/// calls, or calls after another logger was installed, are no-ops.
pub fn init_logging(verbosity: usize) {
    LOGGING.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(verbosity_to_level(verbosity));
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        // Another logger may already be installed by the host application.
        let _ = builder.try_init();
    });
}

/// Returns true once [`init_logging`] has run.
pub fn is_logging_initialized() -> bool {
    LOGGING.is_completed()
}
