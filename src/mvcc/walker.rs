//! Keyspace Walker
//!
//! Streams every record of the "key" bucket, oldest revision first.

use tracing::{debug, trace};

use crate::bolt::BoltFile;
use crate::error::{Result, RevscopeError};

use super::{KeyValue, RevisionKey, RevisionLayout, KEY_BUCKET};

/// Visitor verdict after each record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    /// End the walk successfully without reading further records
    Stop,
}

/// Counters for a finished walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub records: u64,
    pub tombstones: u64,
    pub stopped_early: bool,
}

/// Configurable walk over a record bucket
pub struct Walker<'a> {
    file: &'a mut BoltFile,
    bucket: Vec<u8>,
    layout: RevisionLayout,
}

impl<'a> Walker<'a> {
    pub fn new(file: &'a mut BoltFile) -> Self {
        Self {
            file,
            bucket: KEY_BUCKET.to_vec(),
            layout: RevisionLayout::default(),
        }
    }

    pub fn bucket(mut self, name: impl Into<Vec<u8>>) -> Self {
        self.bucket = name.into();
        self
    }

    pub fn layout(mut self, layout: RevisionLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Visit every record exactly once in ascending revision order.
    ///
    /// Tombstones are visited too; their KeyValue only carries the key.
    /// The first visitor error aborts the walk and is returned unchanged.
    pub fn run<F>(self, mut visitor: F) -> Result<WalkStats>
    where
        F: FnMut(RevisionKey, KeyValue) -> Result<Visit>,
    {
        let bucket = self.file.require_bucket(&self.bucket)?;
        let mut stats = WalkStats::default();
        let mut previous: Option<RevisionKey> = None;

        for entry in self.file.cursor(&bucket)? {
            let entry = entry?;
            if entry.is_bucket {
                return Err(RevscopeError::corrupt(format!(
                    "nested bucket {:?} inside record bucket",
                    String::from_utf8_lossy(&entry.key)
                )));
            }

            let rev = RevisionKey::decode_with(&entry.key, self.layout)?;
            if let Some(prev) = previous {
                if (prev.main, prev.sub) >= (rev.main, rev.sub) {
                    return Err(RevscopeError::corrupt(format!(
                        "record {} follows {} out of order",
                        rev, prev
                    )));
                }
            }
            previous = Some(rev);

            let kv = KeyValue::decode_record(&entry.value)?;
            trace!(revision = %rev, key = %kv.key_lossy(), "visit");

            stats.records += 1;
            if rev.tombstone {
                stats.tombstones += 1;
            }

            if visitor(rev, kv)? == Visit::Stop {
                stats.stopped_early = true;
                break;
            }
        }

        debug!(
            records = stats.records,
            tombstones = stats.tombstones,
            stopped_early = stats.stopped_early,
            "walk finished"
        );
        Ok(stats)
    }
}

/// Walk the default "key" bucket with packed revision keys
pub fn walk<F>(file: &mut BoltFile, visitor: F) -> Result<()>
where
    F: FnMut(RevisionKey, KeyValue) -> Result<Visit>,
{
    Walker::new(file).run(visitor).map(|_| ())
}
