//! Bolt Module
//!
//! Read-only access to the paged B+tree file etcd keeps its MVCC store in.
//!
//! ## Responsibilities
//! - Validate the two meta pages and pick the newest consistent one
//! - Locate top-level buckets ("key", "meta", ...)
//! - Iterate a bucket's entries in ascending key order, one page at a time
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Page 0: Meta   │ Page 1: Meta   │ Page 2..N: tree pages │
//! └─────────────────────────────────────────────────────────┘
//!
//! Page header (16 bytes, little-endian)
//!   Id: u64 (8) | Flags: u16 (2) | Count: u16 (2) | Overflow: u32 (4)
//!
//! Meta body (64 bytes, after the page header)
//!   Magic: u32 | Version: u32 | PageSize: u32 | Flags: u32
//!   Root: {pgid u64, sequence u64} | Freelist: u64 | HighWater: u64
//!   TxId: u64 | Checksum: u64 (FNV-1a over the preceding 56 bytes)
//!
//! Branch element (16 bytes)    Leaf element (16 bytes)
//!   Pos: u32                     Flags: u32 (0x01 = nested bucket)
//!   KeySize: u32                 Pos: u32
//!   Pgid: u64                    KeySize: u32 | ValueSize: u32
//! ```
//!
//! `Pos` is relative to the element's own offset. A nested bucket value starts
//! with `{root u64, sequence u64}`; `root == 0` means the bucket's single page
//! is stored inline right after that header.

mod cursor;
mod file;
mod meta;
mod page;

pub use cursor::{BucketCursor, Entry};
pub use file::{Bucket, BoltFile};
pub use meta::Meta;

// =============================================================================
// Shared Constants
// =============================================================================

/// Size of every page header
pub(crate) const PAGE_HEADER_SIZE: usize = 16;

/// Size of both branch and leaf elements
pub(crate) const ELEMENT_SIZE: usize = 16;

/// Size of a nested bucket header `{root, sequence}`
pub(crate) const BUCKET_HEADER_SIZE: usize = 16;

pub(crate) const BRANCH_PAGE_FLAG: u16 = 0x01;
pub(crate) const LEAF_PAGE_FLAG: u16 = 0x02;
pub(crate) const META_PAGE_FLAG: u16 = 0x04;

/// Leaf element flag marking a nested bucket
pub(crate) const BUCKET_LEAF_FLAG: u32 = 0x01;

/// Magic number stored in both meta pages
pub const MAGIC: u32 = 0xED0C_DAED;

/// Only supported file format version
pub const FORMAT_VERSION: u32 = 2;
