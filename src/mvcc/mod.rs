//! MVCC Module
//!
//! The record layer etcd builds on top of the bolt file.
//!
//! ## Record Layout
//! ```text
//! bucket "key":   RevisionKey ──► KeyValue (protobuf)
//!                 [main: 8][sub: 8]['t'?]
//! bucket "meta":  opaque scalars (consistent index, compaction marks, ...)
//! ```
//!
//! Several records exist per logical key, one per mutation. A deletion is a
//! record whose revision key ends with the tombstone marker.

mod key_value;
mod revision;
mod walker;

pub use key_value::KeyValue;
pub use revision::{RevisionKey, RevisionLayout, REVISION_SEPARATOR, TOMBSTONE_MARKER};
pub use walker::{walk, Visit, WalkStats, Walker};

/// Bucket holding the revision-keyed records
pub const KEY_BUCKET: &[u8] = b"key";

/// Bucket holding store metadata
pub const META_BUCKET: &[u8] = b"meta";
