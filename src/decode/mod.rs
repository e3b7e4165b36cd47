//! Decode Module
//!
//! Narrow interface to the library that understands stored payloads.
//!
//! ## Responsibilities
//! - Sniff the encoding of a stored value (`detect_and_extract`)
//! - Convert between media types (`convert`)
//! - Produce a schema-agnostic document for filters and projections
//!
//! The reconstructor never touches a concrete schema. It asks a
//! [`PayloadDecoder`] for JSON and walks the resulting `serde_json::Value`.

mod storage;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{Result, RevscopeError};

pub use storage::{StorageDecoder, Unknown, UnknownTypeMeta, PROTO_ENCODING_PREFIX};

/// Encodings a stored value may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// `k8s\0` prefixed protobuf envelope
    StorageBinary,
    Protobuf,
    Json,
    Yaml,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::StorageBinary => "application/vnd.kubernetes.storagebinary",
            MediaType::Protobuf => "application/vnd.kubernetes.protobuf",
            MediaType::Json => "application/json",
            MediaType::Yaml => "application/yaml",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API group/version and kind of a stored object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMeta {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

/// External payload decoder.
///
/// The implementing value plays the role of the codec registry.
pub trait PayloadDecoder {
    /// Detect the media type of a stored value and return its canonical bytes
    fn detect_and_extract(&self, raw: &[u8]) -> Result<(MediaType, Vec<u8>)>;

    /// Convert canonical bytes from one media type to another
    fn convert(&self, input: MediaType, output: MediaType, data: &[u8]) -> Result<(Vec<u8>, TypeMeta)>;
}

/// A stored value decoded into a generic document
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    pub media_type: MediaType,
    /// `Value::Null` when only the envelope could be read
    pub value: Value,
    pub type_meta: TypeMeta,
}

/// Decode a stored value into a JSON document.
///
/// Binary-storage values whose body cannot be turned into JSON still yield
/// their type metadata, with a null value.
pub fn decode_document<D>(decoder: &D, raw: &[u8]) -> Result<DecodedPayload>
where
    D: PayloadDecoder + ?Sized,
{
    let (media_type, canonical) = decoder.detect_and_extract(raw)?;

    match decoder.convert(media_type, MediaType::Json, &canonical) {
        Ok((json, type_meta)) => {
            let value = serde_json::from_slice(&json).map_err(|e| {
                RevscopeError::Decode(format!("converted payload is not JSON: {}", e))
            })?;
            Ok(DecodedPayload {
                media_type,
                value,
                type_meta,
            })
        }
        Err(e) if media_type == MediaType::StorageBinary => {
            trace!(error = %e, "falling back to envelope type metadata");
            let (_, type_meta) = decoder.convert(media_type, MediaType::Protobuf, &canonical)?;
            Ok(DecodedPayload {
                media_type,
                value: Value::Null,
                type_meta,
            })
        }
        Err(e) => Err(e),
    }
}
