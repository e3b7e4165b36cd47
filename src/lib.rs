//! # revscope
//!
//! Offline inspection of an etcd bolt database file:
//! - Read-only page-level access, no running server required
//! - Reconstruction of the keyspace as of any retained revision
//! - Prefix and field filters over decoded payloads
//! - Order-independent consistency hashing across snapshots
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Inspector                            │
//! │          (one file open per operation, then closed)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Keyspace Walker (mvcc)                      │
//! │        RevisionKey codec + KeyValue, ascending order        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Snapshot   │          │    Hash     │
//!   │ (fold/live) │─────────►│  (digest)   │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐    ┌─────────────┐
//!   │   Filter    │───►│   Decode    │
//!   │ (AND set)   │    │ (payloads)  │
//!   └─────────────┘    └─────────────┘
//!
//!   all reads go through the bolt page reader
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod bolt;
pub mod mvcc;
pub mod decode;
pub mod filter;
pub mod snapshot;
pub mod hash;
pub mod inspector;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RevscopeError, Result};
pub use config::Config;
pub use decode::{PayloadDecoder, StorageDecoder};
pub use filter::{parse_filters, FieldConstraint, Filter, Operator};
pub use hash::Digest;
pub use inspector::{get_value, hash_by_revision, list_key_summaries, list_versions, Inspector};
pub use mvcc::{KeyValue, RevisionKey};
pub use snapshot::{KeySummary, Projection};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of revscope
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
