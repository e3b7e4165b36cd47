//! Inspector Module
//!
//! Runs read operations against a configured database file.
//!
//! ## Lifecycle
//! Every operation opens the file, performs one scan, and drops the handle
//! before returning, on success and on error alike. Nothing is cached between
//! calls, so the file may be swapped for another snapshot between operations.

use std::path::Path;

use tracing::{debug, info};

use crate::bolt::BoltFile;
use crate::config::Config;
use crate::decode::PayloadDecoder;
use crate::error::{Result, RevscopeError};
use crate::filter::Filter;
use crate::hash::{self, Digest};
use crate::mvcc::{Visit, Walker};
use crate::snapshot::{KeySummary, Projection, SnapshotBuilder};

/// Read-only operations over one database file
#[derive(Debug, Clone)]
pub struct Inspector {
    config: Config,
}

impl Inspector {
    /// Validate `config` and create an inspector for it
    pub fn new(config: Config) -> Result<Self> {
        if config.at_revision < 0 {
            return Err(RevscopeError::Config(format!(
                "revision must not be negative, got {}",
                config.at_revision
            )));
        }
        if config.key_bucket.is_empty() || config.meta_bucket.is_empty() {
            return Err(RevscopeError::Config(
                "bucket names must not be empty".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Inspect `path` with the default config
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::new(Config::builder().db_path(path).build())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn open_file(&self) -> Result<BoltFile> {
        BoltFile::open(&self.config.db_path)
    }

    fn walker<'a>(&self, file: &'a mut BoltFile) -> Walker<'a> {
        Walker::new(file)
            .bucket(self.config.key_bucket.clone())
            .layout(self.config.revision_layout)
    }

    /// Fold the whole record stream into the live keys at the target revision
    fn reconstruct(&self, file: &mut BoltFile) -> Result<SnapshotBuilder> {
        let mut snapshot = SnapshotBuilder::new(self.config.at_revision);
        self.walker(file)
            .run(|rev, kv| Ok(snapshot.observe(rev, kv)))?;
        debug!(
            live = snapshot.len(),
            revision = snapshot.revision(),
            skipped = snapshot.skipped(),
            "reconstructed snapshot"
        );
        Ok(snapshot)
    }

    /// Live keys passing every filter, ascending by key
    pub fn key_summaries<D>(&self, decoder: &D, filters: &[Filter]) -> Result<Vec<KeySummary>>
    where
        D: PayloadDecoder + ?Sized,
    {
        let mut file = self.open_file()?;
        let snapshot = self.reconstruct(&mut file)?;
        drop(file);

        Ok(snapshot.summarize(decoder, filters, &self.config.projection))
    }

    /// Content digest of the snapshot at the target revision
    pub fn hash(&self) -> Result<Digest> {
        let mut file = self.open_file()?;
        file.require_bucket(&self.config.meta_bucket)?;
        let snapshot = self.reconstruct(&mut file)?;
        drop(file);

        let digest = hash::digest(&snapshot)?;
        info!(
            hash = %format!("{:08x}", digest.hash),
            revision = digest.revision,
            keys = digest.key_count,
            "hashed snapshot"
        );
        Ok(digest)
    }

    /// `version` of every put of `key` up to the target revision, oldest first
    pub fn versions(&self, key: &[u8]) -> Result<Vec<i64>> {
        let at_revision = self.config.at_revision;
        let mut versions = Vec::new();
        let mut file = self.open_file()?;

        self.walker(&mut file).run(|rev, kv| {
            if at_revision > 0 && rev.main > at_revision {
                return Ok(Visit::Stop);
            }
            if !rev.tombstone && kv.key == key {
                versions.push(kv.version);
            }
            Ok(Visit::Continue)
        })?;
        Ok(versions)
    }

    /// Raw stored value of `key` at `version`
    pub fn value(&self, key: &[u8], version: i64) -> Result<Vec<u8>> {
        let at_revision = self.config.at_revision;
        let mut found = None;
        let mut file = self.open_file()?;

        self.walker(&mut file).run(|rev, kv| {
            if at_revision > 0 && rev.main > at_revision {
                return Ok(Visit::Stop);
            }
            if !rev.tombstone && kv.key == key && kv.version == version {
                found = Some(kv.value);
                return Ok(Visit::Stop);
            }
            Ok(Visit::Continue)
        })?;
        found.ok_or(RevscopeError::KeyNotFound)
    }
}

// =============================================================================
// One-shot Operations
// =============================================================================

/// Summaries of the keys alive at `at_revision` (0 = latest) that pass `filters`
pub fn list_key_summaries<D>(
    decoder: &D,
    path: impl AsRef<Path>,
    filters: &[Filter],
    projection: &Projection,
    at_revision: i64,
) -> Result<Vec<KeySummary>>
where
    D: PayloadDecoder + ?Sized,
{
    let config = Config::builder()
        .db_path(path.as_ref())
        .projection(projection.clone())
        .at_revision(at_revision)
        .build();
    Inspector::new(config)?.key_summaries(decoder, filters)
}

/// Digest of the keys alive at `at_revision` (0 = latest)
pub fn hash_by_revision(path: impl AsRef<Path>, at_revision: i64) -> Result<Digest> {
    let config = Config::builder()
        .db_path(path.as_ref())
        .at_revision(at_revision)
        .build();
    Inspector::new(config)?.hash()
}

/// `version` of every put of `key`, oldest first
pub fn list_versions(path: impl AsRef<Path>, key: &[u8]) -> Result<Vec<i64>> {
    Inspector::open_path(path.as_ref())?.versions(key)
}

/// Raw stored value of `key` at `version`
pub fn get_value(path: impl AsRef<Path>, key: &[u8], version: i64) -> Result<Vec<u8>> {
    Inspector::open_path(path.as_ref())?.value(key, version)
}
