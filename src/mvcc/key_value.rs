//! Stored record payload
//!
//! Every value in the "key" bucket is a protobuf `mvccpb.KeyValue`.

use prost::Message;

use crate::error::{Result, RevscopeError};

/// One historical mutation of a logical key
#[derive(Clone, PartialEq, Message)]
pub struct KeyValue {
    /// Logical key, e.g. `/registry/pods/default/web-0`
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,

    /// Revision of the last creation of this key
    #[prost(int64, tag = "2")]
    pub create_revision: i64,

    /// Revision of this modification
    #[prost(int64, tag = "3")]
    pub mod_revision: i64,

    /// Number of modifications since creation; a delete resets it to zero
    #[prost(int64, tag = "4")]
    pub version: i64,

    #[prost(bytes = "vec", tag = "5")]
    pub value: Vec<u8>,

    /// Lease id attached to the key, 0 if none
    #[prost(int64, tag = "6")]
    pub lease: i64,
}

impl KeyValue {
    /// Decode a stored record value
    pub fn decode_record(raw: &[u8]) -> Result<Self> {
        KeyValue::decode(raw)
            .map_err(|e| RevscopeError::corrupt(format!("undecodable KeyValue: {}", e)))
    }

    pub fn key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}
