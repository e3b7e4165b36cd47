//! Bolt File
//!
//! Opens a database file read-only and resolves top-level buckets.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Buf;
use tracing::{debug, warn};

use crate::error::{Result, RevscopeError};

use super::cursor::BucketCursor;
use super::meta::{Meta, META_SIZE};
use super::page::Page;
use super::{BUCKET_HEADER_SIZE, PAGE_HEADER_SIZE};

/// Page size assumed when meta page 0 is unreadable
const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Smallest page size accepted from a meta page
const MIN_PAGE_SIZE: u32 = 512;

/// Where a bucket's tree starts
#[derive(Debug, Clone)]
pub(crate) enum BucketRoot {
    Page(u64),
    Inline(Page),
}

/// Handle to a bucket found in the file
#[derive(Debug, Clone)]
pub struct Bucket {
    name: Vec<u8>,
    pub(crate) root: BucketRoot,
    sequence: u64,
}

impl Bucket {
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.root, BucketRoot::Inline(_))
    }

    /// Decode a nested bucket value: `[root u64][sequence u64][inline page?]`
    pub(crate) fn from_value(name: &[u8], value: &[u8]) -> Result<Self> {
        if value.len() < BUCKET_HEADER_SIZE {
            return Err(RevscopeError::corrupt(format!(
                "bucket {:?} header truncated",
                String::from_utf8_lossy(name)
            )));
        }
        let mut header = &value[..BUCKET_HEADER_SIZE];
        let root_pgid = header.get_u64_le();
        let sequence = header.get_u64_le();

        let root = if root_pgid == 0 {
            BucketRoot::Inline(Page::from_bytes(value[BUCKET_HEADER_SIZE..].to_vec())?)
        } else {
            BucketRoot::Page(root_pgid)
        };

        Ok(Self {
            name: name.to_vec(),
            root,
            sequence,
        })
    }
}

/// A bolt database file opened for one read-only operation.
///
/// The file handle is released when the value is dropped, on every exit path.
pub struct BoltFile {
    path: PathBuf,
    file: BufReader<File>,
    file_len: u64,
    meta: Meta,
}

impl BoltFile {
    /// Open a database file and select its newest valid meta page
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut file = BufReader::new(file);

        // Page 0 tells us the page size; page 1 sits right after it.
        let first = read_raw(&mut file, 0, PAGE_HEADER_SIZE + META_SIZE, file_len)?;
        let page0 = Page::from_bytes(first)?;
        let page_size = Meta::peek_page_size(page0.body())
            .filter(|size| *size >= MIN_PAGE_SIZE && size.is_power_of_two())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let meta0 = Meta::from_page(&page0);
        let meta1 = read_raw(
            &mut file,
            u64::from(page_size),
            PAGE_HEADER_SIZE + META_SIZE,
            file_len,
        )
        .and_then(Page::from_bytes)
        .and_then(|page| Meta::from_page(&page));

        let meta = match (meta0, meta1) {
            (Ok(a), Ok(b)) => {
                if b.txid > a.txid {
                    b
                } else {
                    a
                }
            }
            (Ok(a), Err(e)) | (Err(e), Ok(a)) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid meta page");
                a
            }
            (Err(e), Err(_)) => {
                return Err(RevscopeError::corrupt(format!(
                    "no valid meta page in {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        debug!(
            path = %path.display(),
            page_size = meta.page_size,
            txid = meta.txid,
            root = meta.root_pgid,
            "opened bolt file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            file_len,
            meta,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn page_size(&self) -> usize {
        self.meta.page_size as usize
    }

    /// Look up a top-level bucket by name
    ///
    /// Returns `Ok(None)` if the name is absent or names a plain value.
    pub fn bucket(&mut self, name: &[u8]) -> Result<Option<Bucket>> {
        let directory = BucketRoot::Page(self.meta.root_pgid);
        for entry in BucketCursor::new(self, &directory)? {
            let entry = entry?;
            if entry.key.as_slice() > name {
                break;
            }
            if entry.key == name {
                if !entry.is_bucket {
                    return Ok(None);
                }
                return Bucket::from_value(name, &entry.value).map(Some);
            }
        }
        Ok(None)
    }

    /// Look up a top-level bucket, failing with `MissingBucket` if absent
    pub fn require_bucket(&mut self, name: &[u8]) -> Result<Bucket> {
        self.bucket(name)?
            .ok_or_else(|| RevscopeError::missing_bucket(name))
    }

    /// Iterate a bucket's entries in ascending key order
    pub fn cursor<'a>(&'a mut self, bucket: &Bucket) -> Result<BucketCursor<'a>> {
        BucketCursor::new(self, &bucket.root)
    }

    /// Read page `pgid` including its overflow pages
    pub(crate) fn read_page(&mut self, pgid: u64) -> Result<Page> {
        if pgid >= self.meta.high_water_pgid {
            return Err(RevscopeError::corrupt(format!(
                "page {} is beyond the high-water mark {}",
                pgid, self.meta.high_water_pgid
            )));
        }
        let page_size = self.meta.page_size as u64;
        let offset = pgid
            .checked_mul(page_size)
            .ok_or_else(|| RevscopeError::corrupt(format!("page id {} overflows", pgid)))?;

        let header = read_raw(&mut self.file, offset, PAGE_HEADER_SIZE, self.file_len)?;
        let overflow = (&header[12..16]).get_u32_le() as u64;
        let len = (overflow + 1) * page_size;

        let page = Page::from_bytes(read_raw(&mut self.file, offset, len as usize, self.file_len)?)?;
        if page.id() != pgid {
            return Err(RevscopeError::corrupt(format!(
                "page {} carries id {}",
                pgid,
                page.id()
            )));
        }
        Ok(page)
    }
}

/// Read exactly `len` bytes at `offset`, rejecting reads past the end of file
fn read_raw(file: &mut BufReader<File>, offset: u64, len: usize, file_len: u64) -> Result<Vec<u8>> {
    if offset.saturating_add(len as u64) > file_len {
        return Err(RevscopeError::corrupt(format!(
            "read of {} bytes at offset {} exceeds file length {}",
            len, offset, file_len
        )));
    }
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf)?;
    Ok(buf)
}
