//! Model serialization for Pure Rust XGBoost.
//!
//! A [`ModelDocument`] is written either as JSON (human readable) or as a
//! compact binary container. Both readers check the document version before
//! decoding the rest of the model.

pub mod bincode;
pub mod json;

pub use self::bincode::BincodeSerializer;
pub use self::json::JsonSerializer;

use crate::core::constants::BINARY_MODEL_MAGIC;
use crate::core::error::{Result, XGBoostError};
use crate::io::model_file::ModelDocument;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Supported serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SerializationFormat {
    /// JSON document
    Json,
    /// Magic header, format version and the bincode encoded document
    Binary,
}

impl Default for SerializationFormat {
    fn default() -> Self {
        SerializationFormat::Json
    }
}

impl std::fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationFormat::Json => write!(f, "json"),
            SerializationFormat::Binary => write!(f, "binary"),
        }
    }
}

impl std::str::FromStr for SerializationFormat {
    type Err = XGBoostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(SerializationFormat::Json),
            "binary" | "bin" | "ubj" | "bincode" => Ok(SerializationFormat::Binary),
            _ => Err(XGBoostError::serialization(format!("Unknown format: {}", s))),
        }
    }
}

impl SerializationFormat {
    /// `.json` files are JSON, every other extension is binary.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SerializationFormat::Json,
            _ => SerializationFormat::Binary,
        }
    }
}

/// Guesses the format of serialized model bytes from the magic header.
pub fn detect_format(data: &[u8]) -> SerializationFormat {
    if data.starts_with(BINARY_MODEL_MAGIC) {
        SerializationFormat::Binary
    } else {
        SerializationFormat::Json
    }
}

pub trait ModelSerializer: Send + Sync {
    /// Serialize a model document to bytes
    fn serialize(&self, model: &ModelDocument) -> Result<Vec<u8>>;

    /// Serialize a model document to a writer
    fn serialize_to_writer(&self, model: &ModelDocument, writer: &mut dyn Write) -> Result<()> {
        writer.write_all(&self.serialize(model)?)?;
        Ok(())
    }

    fn format(&self) -> SerializationFormat;
}

pub trait ModelDeserializer: Send + Sync {
    /// Deserialize a model document, rejecting incompatible versions
    fn deserialize(&self, data: &[u8]) -> Result<ModelDocument>;

    fn format(&self) -> SerializationFormat;
}

pub fn serializer_for(format: SerializationFormat) -> Box<dyn ModelSerializer> {
    match format {
        SerializationFormat::Json => Box::new(JsonSerializer::new()),
        SerializationFormat::Binary => Box::new(BincodeSerializer::new()),
    }
}

pub fn deserializer_for(format: SerializationFormat) -> Box<dyn ModelDeserializer> {
    match format {
        SerializationFormat::Json => Box::new(JsonSerializer::new()),
        SerializationFormat::Binary => Box::new(BincodeSerializer::new()),
    }
}
