//! Snapshot Module
//!
//! Rebuilds the logical keyspace as of a revision from the record stream.
//!
//! ## Algorithm
//! ```text
//! records (ascending revision)
//!     │
//!     ▼
//! main > at_revision? ── yes ──► skip
//!     │ no
//!     ▼
//! tombstone? ── yes ──► remove key from live map
//!     │ no
//!     ▼
//! overwrite live[key] with this KeyValue
//!
//! after the walk: live map (ascending key) ──► filters ──► projection ──► KeySummary
//! ```
//!
//! Memory grows with the number of live keys, not with history length.
//! `version` and `mod_revision` are reported exactly as stored by the winning
//! record; they are never derived from update counts.

mod builder;
mod candidate;

use serde::Serialize;
use serde_json::Value;

use crate::decode::TypeMeta;
use crate::filter::DotPath;

pub use builder::{LiveEntry, SnapshotBuilder};
pub use candidate::Candidate;

/// Which parts of a live key end up in its summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// Decoded payload copied through unchanged
    #[default]
    Everything,

    /// Key and revision data only; payloads are decoded just for field filters
    KeysOnly,

    /// An object mapping each path to its resolved value. Paths address the
    /// same document field filters see (`.Value...`, `.TypeMeta...`).
    Fields(Vec<DotPath>),
}

impl Projection {
    pub fn wants_payload(&self) -> bool {
        !matches!(self, Projection::KeysOnly)
    }
}

/// Size and history counters for one live key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeySummaryStats {
    /// Size of the current stored value
    pub value_size: usize,
    /// Sum of value sizes over every put since the key was last created
    pub all_versions_value_size: usize,
    /// Number of puts since the key was last created
    pub version_count: usize,
}

/// Materialized state of one live key
#[derive(Debug, Clone, PartialEq)]
pub struct KeySummary {
    pub key: Vec<u8>,
    pub version: i64,
    pub mod_revision: i64,
    pub create_revision: i64,
    pub lease: i64,
    /// Projected payload, `None` when not requested or not decodable
    pub value: Option<Value>,
    pub type_meta: Option<TypeMeta>,
    pub stats: KeySummaryStats,
}

impl KeySummary {
    pub fn key_lossy(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}
