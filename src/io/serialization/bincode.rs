//! Binary serialization for Pure Rust XGBoost models.
//!
//! Layout: the 4-byte magic, the format version as three little endian
//! `u32`, then the bincode encoded [`ModelDocument`].

use crate::core::constants::{BINARY_MODEL_MAGIC, MODEL_FORMAT_VERSION};
use crate::core::error::{Result, XGBoostError};
use crate::io::model_file::{check_version, ModelDocument};
use crate::io::serialization::{ModelDeserializer, ModelSerializer, SerializationFormat};

const HEADER_LEN: usize = 4 + 3 * 4;

/// Bincode serializer
#[derive(Debug, Clone, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    pub fn new() -> Self {
        BincodeSerializer
    }
}

fn read_version(data: &[u8]) -> Result<[u32; 3]> {
    if data.len() < HEADER_LEN || &data[..4] != BINARY_MODEL_MAGIC {
        return Err(XGBoostError::serialization("not a binary model file"));
    }
    let mut version = [0u32; 3];
    for (i, part) in version.iter_mut().enumerate() {
        let start = 4 + i * 4;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&data[start..start + 4]);
        *part = u32::from_le_bytes(bytes);
    }
    Ok(version)
}

impl ModelSerializer for BincodeSerializer {
    fn serialize(&self, model: &ModelDocument) -> Result<Vec<u8>> {
        let body = bincode::serialize(model)?;
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(BINARY_MODEL_MAGIC);
        for part in MODEL_FORMAT_VERSION {
            out.extend_from_slice(&part.to_le_bytes());
        }
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn format(&self) -> SerializationFormat {
        SerializationFormat::Binary
    }
}

impl ModelDeserializer for BincodeSerializer {
    fn deserialize(&self, data: &[u8]) -> Result<ModelDocument> {
        check_version(read_version(data)?)?;
        let model: ModelDocument = bincode::deserialize(&data[HEADER_LEN..])?;
        Ok(model)
    }

    fn format(&self) -> SerializationFormat {
        SerializationFormat::Binary
    }
}
