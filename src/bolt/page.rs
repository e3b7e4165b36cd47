//! Page decoding
//!
//! Bounds-checked views over a single page image.

use bytes::Buf;

use crate::error::{Result, RevscopeError};

use super::{
    BRANCH_PAGE_FLAG, BUCKET_LEAF_FLAG, ELEMENT_SIZE, LEAF_PAGE_FLAG, PAGE_HEADER_SIZE,
};

/// A page image, including any overflow pages that follow it
#[derive(Debug, Clone)]
pub(crate) struct Page {
    data: Vec<u8>,
}

/// One decoded leaf element, borrowing from its page
pub(crate) struct LeafElement<'a> {
    pub flags: u32,
    pub key: &'a [u8],
    pub value: &'a [u8],
}

impl LeafElement<'_> {
    pub fn is_bucket(&self) -> bool {
        self.flags & BUCKET_LEAF_FLAG != 0
    }
}

impl Page {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < PAGE_HEADER_SIZE {
            return Err(RevscopeError::corrupt(format!(
                "page image is {} bytes, shorter than its header",
                data.len()
            )));
        }
        Ok(Self { data })
    }

    pub fn id(&self) -> u64 {
        (&self.data[0..8]).get_u64_le()
    }

    pub fn flags(&self) -> u16 {
        (&self.data[8..10]).get_u16_le()
    }

    pub fn count(&self) -> usize {
        (&self.data[10..12]).get_u16_le() as usize
    }

    pub fn is_leaf(&self) -> bool {
        self.flags() & LEAF_PAGE_FLAG != 0
    }

    pub fn is_branch(&self) -> bool {
        self.flags() & BRANCH_PAGE_FLAG != 0
    }

    /// Body bytes after the header (meta pages keep their struct here)
    pub fn body(&self) -> &[u8] {
        &self.data[PAGE_HEADER_SIZE..]
    }

    fn element(&self, index: usize) -> Result<(usize, [u32; 4])> {
        let offset = PAGE_HEADER_SIZE + index * ELEMENT_SIZE;
        let end = offset + ELEMENT_SIZE;
        if index >= self.count() || end > self.data.len() {
            return Err(RevscopeError::corrupt(format!(
                "element {} out of bounds on page {}",
                index,
                self.id()
            )));
        }
        let mut raw = &self.data[offset..end];
        let fields = [
            raw.get_u32_le(),
            raw.get_u32_le(),
            raw.get_u32_le(),
            raw.get_u32_le(),
        ];
        Ok((offset, fields))
    }

    fn slice(&self, start: usize, len: usize) -> Result<&[u8]> {
        start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .map(|end| &self.data[start..end])
            .ok_or_else(|| {
                RevscopeError::corrupt(format!(
                    "element data [{}, +{}) exceeds page {} ({} bytes)",
                    start,
                    len,
                    self.id(),
                    self.data.len()
                ))
            })
    }

    /// Decode leaf element `index`: `[flags][pos][ksize][vsize]`
    pub fn leaf_element(&self, index: usize) -> Result<LeafElement<'_>> {
        let (offset, [flags, pos, ksize, vsize]) = self.element(index)?;
        let key_start = offset + pos as usize;
        let key = self.slice(key_start, ksize as usize)?;
        let value = self.slice(key_start + ksize as usize, vsize as usize)?;
        Ok(LeafElement { flags, key, value })
    }

    /// Decode the child page id of branch element `index`: `[pos][ksize][pgid]`
    pub fn branch_child(&self, index: usize) -> Result<u64> {
        let (_, [_, _, lo, hi]) = self.element(index)?;
        Ok(u64::from(lo) | (u64::from(hi) << 32))
    }
}
