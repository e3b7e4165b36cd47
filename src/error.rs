//! Error types for revscope
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RevscopeError
pub type Result<T> = std::result::Result<T, RevscopeError>;

/// Unified error type for revscope operations
#[derive(Debug, Error)]
pub enum RevscopeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // File Format Errors
    // -------------------------------------------------------------------------
    /// A required top-level bucket is absent from the file
    #[error("missing {name:?} bucket")]
    MissingBucket { name: String },

    /// A page, key or value could not be decoded; the walk is abandoned
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    // -------------------------------------------------------------------------
    // Filter Errors
    // -------------------------------------------------------------------------
    #[error("invalid filter {raw:?}: {reason}")]
    InvalidFilterSpec { raw: String, reason: String },

    /// A dot path did not resolve against a decoded payload.
    /// Filters treat this as a non-match.
    #[error("path {0:?} does not resolve")]
    InvalidPath(String),

    // -------------------------------------------------------------------------
    // Payload Errors
    // -------------------------------------------------------------------------
    #[error("decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RevscopeError {
    pub(crate) fn missing_bucket(name: &[u8]) -> Self {
        RevscopeError::MissingBucket {
            name: String::from_utf8_lossy(name).into_owned(),
        }
    }

    pub(crate) fn corrupt(context: impl Into<String>) -> Self {
        RevscopeError::CorruptRecord(context.into())
    }
}
