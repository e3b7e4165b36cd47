//! Configuration for revscope
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::mvcc::{RevisionLayout, KEY_BUCKET, META_BUCKET};
use crate::snapshot::Projection;

/// Settings for one inspection of a database file
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Source Configuration
    // -------------------------------------------------------------------------
    /// Bolt database file, typically `member/snap/db` inside an etcd data dir
    pub db_path: PathBuf,

    /// Bucket holding revision-keyed records
    pub key_bucket: Vec<u8>,

    /// Bucket whose presence the hasher requires
    pub meta_bucket: Vec<u8>,

    /// How record keys are laid out on disk
    pub revision_layout: RevisionLayout,

    // -------------------------------------------------------------------------
    // Snapshot Configuration
    // -------------------------------------------------------------------------
    /// Reconstruct as of this main revision; 0 means the latest
    pub at_revision: i64,

    /// Parts of each live key to report
    pub projection: Projection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./member/snap/db"),
            key_bucket: KEY_BUCKET.to_vec(),
            meta_bucket: META_BUCKET.to_vec(),
            revision_layout: RevisionLayout::Packed,
            at_revision: 0,
            projection: Projection::Everything,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database file to inspect
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the record bucket name
    pub fn key_bucket(mut self, name: impl Into<Vec<u8>>) -> Self {
        self.config.key_bucket = name.into();
        self
    }

    /// Set the metadata bucket name
    pub fn meta_bucket(mut self, name: impl Into<Vec<u8>>) -> Self {
        self.config.meta_bucket = name.into();
        self
    }

    /// Set the record key layout
    pub fn revision_layout(mut self, layout: RevisionLayout) -> Self {
        self.config.revision_layout = layout;
        self
    }

    /// Set the target revision (0 = latest)
    pub fn at_revision(mut self, revision: i64) -> Self {
        self.config.at_revision = revision;
        self
    }

    /// Set the summary projection
    pub fn projection(mut self, projection: Projection) -> Self {
        self.config.projection = projection;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
