//! Error handling and error types for Pure Rust XGBoost.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! [`XGBoostError`] distinguishes malformed input, schema mismatches at
//! prediction time, shape errors from user supplied functions, unsupported
//! parameter combinations and incompatible model documents.

use std::io;
use thiserror::Error;

/// Main error type for the XGBoost library.
#[derive(Error, Debug)]
pub enum XGBoostError {
    /// Configuration errors that are not tied to a single parameter
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Malformed or inconsistent feature matrix, labels, weights or groups
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Prediction-time input does not match the schema frozen at training
    #[error("Feature mismatch: {message}")]
    FeatureMismatch { message: String },

    /// Output of a custom objective or metric has the wrong shape
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    /// Disallowed parameter combination or feature
    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    /// Model document written by an incompatible schema version
    #[error("Incompatible model version: found {found}, supported {supported}")]
    IncompatibleVersion { found: String, supported: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Training-related errors
    #[error("Training error: {message}")]
    Training { message: String },


    /// Error raised from inside a user supplied objective or metric
    #[error("Custom function error: {message}")]
    CustomFunction { message: String },

    /// Model serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Bincode serialization errors
    #[error("Bincode error: {source}")]
    Bincode {
        #[from]
        source: bincode::Error,
    },

    /// Out of bounds access
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Specialized errors raised while assembling a feature matrix.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Empty feature matrix provided")]
    Empty,

    #[error("Row count mismatch for {field}: expected {expected}, got {actual}")]
    RowCountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Label is entirely unset")]
    LabelUnset,

    #[error("Categorical feature {index} has too many categories: {count} > {max}")]
    TooManyCategories {
        index: usize,
        count: usize,
        max: usize,
    },

    #[error("Categorical feature {index} has invalid category value: {value}")]
    InvalidCategory { index: usize, value: f32 },

    #[error("Query id {qid} appears in non-contiguous rows (first at block {first}, again at row {row})")]
    NonContiguousGroup { qid: u64, first: usize, row: usize },

    #[error("Invalid {field} value at index {index}: {value}")]
    InvalidValue {
        field: &'static str,
        index: usize,
        value: f32,
    },
}

/// Type alias for Results using XGBoostError
pub type Result<T> = std::result::Result<T, XGBoostError>;

impl XGBoostError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        XGBoostError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        XGBoostError::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a feature mismatch error
    pub fn feature_mismatch<S: Into<String>>(message: S) -> Self {
        XGBoostError::FeatureMismatch {
            message: message.into(),
        }
    }

    /// Create a shape error
    pub fn shape<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        XGBoostError::Shape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an unsupported error
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        XGBoostError::Unsupported {
            message: message.into(),
        }
    }

    /// Create an incompatible version error
    pub fn incompatible_version<F, S>(found: F, supported: S) -> Self
    where
        F: Into<String>,
        S: Into<String>,
    {
        XGBoostError::IncompatibleVersion {
            found: found.into(),
            supported: supported.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        XGBoostError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        XGBoostError::Training {
            message: message.into(),
        }
    }

    /// Create an error on behalf of a user supplied objective or metric
    pub fn custom<S: Into<String>>(message: S) -> Self {
        XGBoostError::CustomFunction {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        XGBoostError::Serialization {
            message: message.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        XGBoostError::IndexOutOfBounds { index, length }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        XGBoostError::Internal {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            XGBoostError::Config { .. } => "config",
            XGBoostError::InvalidInput { .. } => "invalid_input",
            XGBoostError::FeatureMismatch { .. } => "feature_mismatch",
            XGBoostError::Shape { .. } => "shape",
            XGBoostError::Unsupported { .. } => "unsupported",
            XGBoostError::IncompatibleVersion { .. } => "incompatible_version",
            XGBoostError::InvalidParameter { .. } => "invalid_parameter",
            XGBoostError::Training { .. } => "training",
            XGBoostError::CustomFunction { .. } => "custom_function",
            XGBoostError::Serialization { .. } => "serialization",
            XGBoostError::IO { .. } => "io",
            XGBoostError::Json { .. } => "json",
            XGBoostError::Bincode { .. } => "bincode",
            XGBoostError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            XGBoostError::Internal { .. } => "internal",
        }
    }
}

impl From<DatasetError> for XGBoostError {
    fn from(err: DatasetError) -> Self {
        XGBoostError::InvalidInput {
            message: err.to_string(),
        }
    }
}

/// Tree arena operations report through `anyhow`; surface them as internal errors.
impl From<anyhow::Error> for XGBoostError {
    fn from(err: anyhow::Error) -> Self {
        XGBoostError::Internal {
            message: format!("{:#}", err),
        }
    }
}

/// Early return with `$err` unless `$cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
