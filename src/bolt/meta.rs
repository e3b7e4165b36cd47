//! Meta page decoding and validation

use bytes::Buf;

use crate::error::{Result, RevscopeError};

use super::{FORMAT_VERSION, MAGIC, META_PAGE_FLAG};
use super::page::Page;

/// Bytes covered by the meta checksum
const CHECKSUMMED_LEN: usize = 56;

/// Full meta body length including the checksum
pub(crate) const META_SIZE: usize = CHECKSUMMED_LEN + 8;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Decoded meta page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub page_size: u32,
    pub flags: u32,
    /// Root page of the bucket directory
    pub root_pgid: u64,
    pub root_sequence: u64,
    pub freelist_pgid: u64,
    /// First page id past the end of the tree
    pub high_water_pgid: u64,
    pub txid: u64,
    pub checksum: u64,
}

impl Meta {
    /// Decode the meta body without validating it
    pub(crate) fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < META_SIZE {
            return Err(RevscopeError::corrupt("meta page truncated"));
        }
        let mut buf = &body[8..META_SIZE];
        Ok(Self {
            page_size: buf.get_u32_le(),
            flags: buf.get_u32_le(),
            root_pgid: buf.get_u64_le(),
            root_sequence: buf.get_u64_le(),
            freelist_pgid: buf.get_u64_le(),
            high_water_pgid: buf.get_u64_le(),
            txid: buf.get_u64_le(),
            checksum: buf.get_u64_le(),
        })
    }

    /// Page size advertised by a meta body, valid or not
    pub(crate) fn peek_page_size(body: &[u8]) -> Option<u32> {
        if body.len() < 12 {
            return None;
        }
        Some((&body[8..12]).get_u32_le())
    }

    /// Decode and fully validate the meta stored on `page`
    pub(crate) fn from_page(page: &Page) -> Result<Self> {
        if page.flags() & META_PAGE_FLAG == 0 {
            return Err(RevscopeError::corrupt(format!(
                "page {} is not a meta page (flags 0x{:02x})",
                page.id(),
                page.flags()
            )));
        }
        let body = page.body();
        if body.len() < META_SIZE {
            return Err(RevscopeError::corrupt("meta page truncated"));
        }
        let mut head = &body[0..8];
        let magic = head.get_u32_le();
        let version = head.get_u32_le();
        if magic != MAGIC {
            return Err(RevscopeError::corrupt(format!(
                "invalid magic 0x{:08x} on page {}",
                magic,
                page.id()
            )));
        }
        if version != FORMAT_VERSION {
            return Err(RevscopeError::corrupt(format!(
                "unsupported format version {}",
                version
            )));
        }

        let meta = Self::decode(body)?;
        let expected = fnv64a(&body[..CHECKSUMMED_LEN]);
        if meta.checksum != expected {
            return Err(RevscopeError::corrupt(format!(
                "meta checksum mismatch on page {}: stored 0x{:016x}, computed 0x{:016x}",
                page.id(),
                meta.checksum,
                expected
            )));
        }
        Ok(meta)
    }
}

/// 64-bit FNV-1a
pub(crate) fn fnv64a(data: &[u8]) -> u64 {
    data.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
