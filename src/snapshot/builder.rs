//! Snapshot Builder
//!
//! The revision fold, independent of where the records come from.

use std::collections::BTreeMap;

use tracing::debug;

use crate::decode::PayloadDecoder;
use crate::filter::{matches_all, Filter};
use crate::mvcc::{KeyValue, RevisionKey, Visit};

use super::candidate::Candidate;
use super::{KeySummary, KeySummaryStats, Projection};

/// Winning record of a live key plus its running stats
#[derive(Debug, Clone, PartialEq)]
pub struct LiveEntry {
    pub kv: KeyValue,
    pub stats: KeySummaryStats,
}

/// Folds a revision-ordered record stream into the keys alive at a revision
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    /// 0 means "latest"
    at_revision: i64,
    live: BTreeMap<Vec<u8>, LiveEntry>,
    /// Highest main revision applied
    revision: i64,
    skipped: u64,
}

impl SnapshotBuilder {
    pub fn new(at_revision: i64) -> Self {
        Self {
            at_revision,
            ..Self::default()
        }
    }

    /// Apply one record; records must arrive in ascending revision order
    pub fn observe(&mut self, rev: RevisionKey, kv: KeyValue) -> Visit {
        if self.at_revision > 0 && rev.main > self.at_revision {
            self.skipped += 1;
            return Visit::Continue;
        }
        self.revision = self.revision.max(rev.main);

        if rev.tombstone {
            self.live.remove(&kv.key);
            return Visit::Continue;
        }

        let size = kv.value.len();
        match self.live.get_mut(&kv.key) {
            Some(entry) => {
                entry.stats.value_size = size;
                entry.stats.all_versions_value_size += size;
                entry.stats.version_count += 1;
                entry.kv = kv;
            }
            None => {
                let stats = KeySummaryStats {
                    value_size: size,
                    all_versions_value_size: size,
                    version_count: 1,
                };
                self.live.insert(kv.key.clone(), LiveEntry { kv, stats });
            }
        }
        Visit::Continue
    }

    pub fn at_revision(&self) -> i64 {
        self.at_revision
    }

    /// Highest main revision that was applied
    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Records ignored because they postdate the target revision
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Option<&LiveEntry> {
        self.live.get(key)
    }

    /// Live entries in ascending key order
    pub fn entries(&self) -> impl Iterator<Item = (&[u8], &LiveEntry)> {
        self.live.iter().map(|(key, entry)| (key.as_slice(), entry))
    }

    /// Filter and project the live keys, in ascending key order
    pub fn summarize<D>(
        &self,
        decoder: &D,
        filters: &[Filter],
        projection: &Projection,
    ) -> Vec<KeySummary>
    where
        D: PayloadDecoder + ?Sized,
    {
        let summaries: Vec<KeySummary> = self
            .entries()
            .filter_map(|(key, entry)| {
                let mut candidate = Candidate::new(key, entry, decoder);
                if matches_all(filters, &mut candidate) {
                    Some(candidate.into_summary(projection))
                } else {
                    None
                }
            })
            .collect();

        debug!(
            live = self.live.len(),
            matched = summaries.len(),
            filters = filters.len(),
            at_revision = self.at_revision,
            "summarized snapshot"
        );
        summaries
    }
}
