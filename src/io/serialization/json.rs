//! JSON serialization for Pure Rust XGBoost models.

use crate::core::error::Result;
use crate::io::model_file::{check_version, ModelDocument};
use crate::io::serialization::{ModelDeserializer, ModelSerializer, SerializationFormat};
use serde::Deserialize;

/// Only the version field, read before the rest of the document.
#[derive(Deserialize)]
struct VersionHeader {
    version: [u32; 3],
}

/// JSON serializer
#[derive(Debug, Clone)]
pub struct JsonSerializer {
    pretty: bool,
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSerializer {
    pub fn new() -> Self {
        JsonSerializer { pretty: false }
    }

    pub fn pretty() -> Self {
        JsonSerializer { pretty: true }
    }
}

impl ModelSerializer for JsonSerializer {
    fn serialize(&self, model: &ModelDocument) -> Result<Vec<u8>> {
        if self.pretty {
            Ok(serde_json::to_vec_pretty(model)?)
        } else {
            Ok(serde_json::to_vec(model)?)
        }
    }

    fn format(&self) -> SerializationFormat {
        SerializationFormat::Json
    }
}

impl ModelDeserializer for JsonSerializer {
    fn deserialize(&self, data: &[u8]) -> Result<ModelDocument> {
        let header: VersionHeader = serde_json::from_slice(data)?;
        check_version(header.version)?;
        Ok(serde_json::from_slice(data)?)
    }

    fn format(&self) -> SerializationFormat {
        SerializationFormat::Json
    }
}
