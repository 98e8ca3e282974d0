//! Model persistence for Pure Rust XGBoost.
//!
//! The versioned model document, its JSON and binary encodings, and the
//! separate runtime configuration export.

pub mod config;
pub mod model_file;
pub mod serialization;

pub use config::ConfigDocument;
pub use model_file::{check_version, ModelDocument, TreeDocument};
pub use serialization::{ModelDeserializer, ModelSerializer, SerializationFormat};
