//! Default decoder for API server storage values
//!
//! Handles JSON values (custom resources, older clusters) and the `k8s\0`
//! protobuf envelope. Turning a typed protobuf body into JSON needs the API
//! schema and is left to richer decoders.

use prost::Message;
use serde_json::Value;

use crate::error::{Result, RevscopeError};

use super::{MediaType, PayloadDecoder, TypeMeta};

/// Magic prefix of the binary storage envelope
pub const PROTO_ENCODING_PREFIX: &[u8; 4] = b"k8s\x00";

/// `{`/`[` positions tried before a value is treated as opaque
const MAX_JSON_CANDIDATES: usize = 16;

/// `runtime.Unknown`: the envelope around binary-stored objects
#[derive(Clone, PartialEq, Message)]
pub struct Unknown {
    #[prost(message, optional, tag = "1")]
    pub type_meta: Option<UnknownTypeMeta>,

    /// Serialized object body
    #[prost(bytes = "vec", tag = "2")]
    pub raw: Vec<u8>,

    #[prost(string, tag = "3")]
    pub content_encoding: String,

    #[prost(string, tag = "4")]
    pub content_type: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct UnknownTypeMeta {
    #[prost(string, tag = "1")]
    pub api_version: String,

    #[prost(string, tag = "2")]
    pub kind: String,
}

impl From<UnknownTypeMeta> for TypeMeta {
    fn from(meta: UnknownTypeMeta) -> Self {
        TypeMeta {
            api_version: meta.api_version,
            kind: meta.kind,
        }
    }
}

/// Schema-free decoder for JSON and enveloped protobuf values
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageDecoder;

impl StorageDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode the `runtime.Unknown` envelope of a binary-stored value
    pub fn decode_unknown(data: &[u8]) -> Result<Unknown> {
        if data.len() < PROTO_ENCODING_PREFIX.len() {
            return Err(RevscopeError::Decode(format!(
                "input too short for the proto encoding prefix: {} bytes",
                data.len()
            )));
        }
        if &data[..4] != PROTO_ENCODING_PREFIX {
            return Err(RevscopeError::Decode(format!(
                "first 4 bytes {:?} do not match the proto encoding prefix",
                &data[..4]
            )));
        }
        Unknown::decode(&data[4..])
            .map_err(|e| RevscopeError::Decode(format!("invalid storage envelope: {}", e)))
    }

    /// `apiVersion` and `kind` of a JSON object; other documents have none
    fn type_meta_from_json(data: &[u8]) -> Result<TypeMeta> {
        let document: Value = serde_json::from_slice(data)
            .map_err(|e| RevscopeError::Decode(format!("cannot read type metadata: {}", e)))?;
        let field = |name: &str| {
            document
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(TypeMeta {
            api_version: field("apiVersion"),
            kind: field("kind"),
        })
    }
}

impl PayloadDecoder for StorageDecoder {
    fn detect_and_extract(&self, raw: &[u8]) -> Result<(MediaType, Vec<u8>)> {
        if let Some(start) = find(raw, PROTO_ENCODING_PREFIX) {
            return Ok((MediaType::StorageBinary, raw[start..].to_vec()));
        }
        if let Some(json) = find_json(raw) {
            let canonical = serde_json::to_vec(&json)
                .map_err(|e| RevscopeError::Decode(e.to_string()))?;
            return Ok((MediaType::Json, canonical));
        }
        Err(RevscopeError::Decode(
            "value does not appear to contain JSON or binary storage data".to_string(),
        ))
    }

    fn convert(&self, input: MediaType, output: MediaType, data: &[u8]) -> Result<(Vec<u8>, TypeMeta)> {
        match (input, output) {
            (MediaType::StorageBinary, MediaType::Protobuf) => {
                let unknown = Self::decode_unknown(data)?;
                let type_meta = unknown.type_meta.map(TypeMeta::from).unwrap_or_default();
                Ok((unknown.raw, type_meta))
            }
            (MediaType::Json, MediaType::Json) => {
                let type_meta = Self::type_meta_from_json(data)?;
                Ok((data.to_vec(), type_meta))
            }
            (MediaType::StorageBinary, MediaType::Json) => {
                let kind = Self::decode_unknown(data)?
                    .type_meta
                    .map(|meta| meta.kind)
                    .unwrap_or_default();
                Err(RevscopeError::Decode(format!(
                    "no schema available to convert {:?} from {} to {}",
                    kind, input, output
                )))
            }
            _ => Err(RevscopeError::Decode(format!(
                "unsupported conversion: {} to {}",
                input, output
            ))),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// First `{` or `[` from which the rest of the input is one JSON document.
///
/// Only the first `MAX_JSON_CANDIDATES` positions are tried, keeping large
/// binary values linear.
fn find_json(raw: &[u8]) -> Option<Value> {
    raw.iter()
        .enumerate()
        .filter(|(_, byte)| matches!(byte, b'{' | b'['))
        .map(|(start, _)| &raw[start..])
        .take_while(|rest| rest.len() >= 2)
        .take(MAX_JSON_CANDIDATES)
        .find_map(|rest| serde_json::from_slice(rest).ok())
}
