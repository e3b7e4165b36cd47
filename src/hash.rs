//! Consistency Hasher
//!
//! Digest of a reconstructed snapshot that only depends on its logical
//! content: two files holding the same live keys at the same revision hash
//! identically, whatever their page layout or compaction history.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, RevscopeError};
use crate::snapshot::SnapshotBuilder;

/// Result of hashing a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Digest {
    /// CRC32 over the canonical tuples in ascending key order
    pub hash: u32,
    /// Newest `mod_revision` among the hashed keys; 0 for an empty snapshot
    pub revision: i64,
    pub key_count: usize,
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x} (revision {}, {} keys)",
            self.hash, self.revision, self.key_count
        )
    }
}

/// Canonical serialization unit, one per live key
#[derive(Serialize)]
struct HashedTuple<'a> {
    key: &'a [u8],
    value: &'a [u8],
    version: i64,
    mod_revision: i64,
    create_revision: i64,
}

/// Fold the live keys of `snapshot` into a digest
pub fn digest(snapshot: &SnapshotBuilder) -> Result<Digest> {
    let mut hasher = crc32fast::Hasher::new();
    let mut key_count = 0;
    let mut revision = 0;

    for (key, entry) in snapshot.entries() {
        let tuple = HashedTuple {
            key,
            value: &entry.kv.value,
            version: entry.kv.version,
            mod_revision: entry.kv.mod_revision,
            create_revision: entry.kv.create_revision,
        };
        let encoded =
            bincode::serialize(&tuple).map_err(|e| RevscopeError::Serialization(e.to_string()))?;
        hasher.update(&encoded);
        key_count += 1;
        revision = revision.max(entry.kv.mod_revision);
    }

    Ok(Digest {
        hash: hasher.finalize(),
        revision,
        key_count,
    })
}
