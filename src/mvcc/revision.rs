//! Revision key codec
//!
//! Record keys in the "key" bucket are encoded revisions. Big-endian encoding
//! makes byte order equal `(main, sub)` order, so a bucket scan visits records
//! in the order they were applied.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, RevscopeError};

/// Trailing byte marking a deletion record
pub const TOMBSTONE_MARKER: u8 = b't';

/// Separator between main and sub in the delimited layout
pub const REVISION_SEPARATOR: u8 = b'_';

/// On-disk arrangement of a revision key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevisionLayout {
    /// `[main: 8][sub: 8]` plus an optional marker (16 / 17 bytes)
    #[default]
    Packed,

    /// `[main: 8]['_'][sub: 8]` plus an optional marker (17 / 18 bytes), as
    /// written by etcd's backend
    Delimited,
}

impl RevisionLayout {
    /// Width of a live (non-tombstone) key
    pub fn live_len(self) -> usize {
        match self {
            RevisionLayout::Packed => 16,
            RevisionLayout::Delimited => 17,
        }
    }

    /// Width of a tombstone key
    pub fn tombstone_len(self) -> usize {
        self.live_len() + 1
    }

    fn sub_offset(self) -> usize {
        match self {
            RevisionLayout::Packed => 8,
            RevisionLayout::Delimited => 9,
        }
    }
}

/// Structured form of a record key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevisionKey {
    /// Transaction that wrote the record
    pub main: i64,
    /// Position of the operation within that transaction
    pub sub: i64,
    pub tombstone: bool,
}

impl RevisionKey {
    pub fn new(main: i64, sub: i64) -> Self {
        Self {
            main,
            sub,
            tombstone: false,
        }
    }

    pub fn tombstone(main: i64, sub: i64) -> Self {
        Self {
            main,
            sub,
            tombstone: true,
        }
    }

    /// Decode a packed key (16 bytes live, 17 bytes tombstone)
    pub fn decode(raw: &[u8]) -> Result<Self> {
        Self::decode_with(raw, RevisionLayout::Packed)
    }

    /// Encode as a packed key; exact inverse of [`RevisionKey::decode`]
    pub fn encode(&self) -> Vec<u8> {
        self.encode_with(RevisionLayout::Packed)
    }

    pub fn decode_with(raw: &[u8], layout: RevisionLayout) -> Result<Self> {
        let tombstone = if raw.len() == layout.live_len() {
            false
        } else if raw.len() == layout.tombstone_len() {
            true
        } else {
            return Err(RevscopeError::corrupt(format!(
                "revision key has {} bytes, expected {} or {}",
                raw.len(),
                layout.live_len(),
                layout.tombstone_len()
            )));
        };

        if layout == RevisionLayout::Delimited && raw[8] != REVISION_SEPARATOR {
            return Err(RevscopeError::corrupt(format!(
                "revision key separator is 0x{:02x}, expected '_'",
                raw[8]
            )));
        }
        if tombstone && raw[layout.live_len()] != TOMBSTONE_MARKER {
            return Err(RevscopeError::corrupt(format!(
                "revision key marker is 0x{:02x}, expected 't'",
                raw[layout.live_len()]
            )));
        }

        let sub_at = layout.sub_offset();
        Ok(Self {
            main: read_i64_be(&raw[0..8]),
            sub: read_i64_be(&raw[sub_at..sub_at + 8]),
            tombstone,
        })
    }

    pub fn encode_with(&self, layout: RevisionLayout) -> Vec<u8> {
        let mut buf = Vec::with_capacity(layout.tombstone_len());
        buf.extend_from_slice(&self.main.to_be_bytes());
        if layout == RevisionLayout::Delimited {
            buf.push(REVISION_SEPARATOR);
        }
        buf.extend_from_slice(&self.sub.to_be_bytes());
        if self.tombstone {
            buf.push(TOMBSTONE_MARKER);
        }
        buf
    }
}

impl Ord for RevisionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.main, self.sub, self.tombstone).cmp(&(other.main, other.sub, other.tombstone))
    }
}

impl PartialOrd for RevisionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RevisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.main, self.sub)?;
        if self.tombstone {
            write!(f, "t")?;
        }
        Ok(())
    }
}

fn read_i64_be(bytes: &[u8]) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    i64::from_be_bytes(raw)
}
