//! Bucket Cursor
//!
//! Depth-first, in-order traversal of one bucket's B+tree.

use crate::error::{Result, RevscopeError};

use super::file::{BoltFile, BucketRoot};
use super::page::Page;

/// Deepest bucket tree accepted before the file is treated as corrupt
const MAX_TREE_DEPTH: usize = 64;

/// One key/value pair stored in a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// The value is a nested bucket header rather than user data
    pub is_bucket: bool,
}

/// Iterator over a bucket's entries in ascending key order.
///
/// Pages are read on demand, so only one page per tree level is held in
/// memory. The first error ends the iteration.
pub struct BucketCursor<'a> {
    file: &'a mut BoltFile,
    /// Path from the root to the current leaf: (page, next element index)
    stack: Vec<(Page, usize)>,
}

impl<'a> BucketCursor<'a> {
    pub(crate) fn new(file: &'a mut BoltFile, root: &BucketRoot) -> Result<Self> {
        let page = match root {
            BucketRoot::Page(pgid) => file.read_page(*pgid)?,
            BucketRoot::Inline(page) => page.clone(),
        };
        check_tree_page(&page)?;
        Ok(Self {
            file,
            stack: vec![(page, 0)],
        })
    }

    fn descend(&mut self, pgid: u64) -> Result<()> {
        if self.stack.iter().any(|(page, _)| page.id() == pgid) {
            return Err(RevscopeError::corrupt(format!(
                "page cycle: branch points back to ancestor page {}",
                pgid
            )));
        }
        if self.stack.len() >= MAX_TREE_DEPTH {
            return Err(RevscopeError::corrupt(format!(
                "bucket tree deeper than {} levels",
                MAX_TREE_DEPTH
            )));
        }
        let child = self.file.read_page(pgid)?;
        check_tree_page(&child)?;
        self.stack.push((child, 0));
        Ok(())
    }
}

impl Iterator for BucketCursor<'_> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (page, index) = self.stack.last_mut()?;
            if *index >= page.count() {
                self.stack.pop();
                continue;
            }
            let current = *index;
            *index += 1;

            if page.is_leaf() {
                let entry = page.leaf_element(current).map(|element| Entry {
                    key: element.key.to_vec(),
                    value: element.value.to_vec(),
                    is_bucket: element.is_bucket(),
                });
                if entry.is_err() {
                    self.stack.clear();
                }
                return Some(entry);
            }

            let child = page.branch_child(current);
            if let Err(e) = child.and_then(|pgid| self.descend(pgid)) {
                self.stack.clear();
                return Some(Err(e));
            }
        }
    }
}

fn check_tree_page(page: &Page) -> Result<()> {
    if page.is_leaf() || page.is_branch() {
        Ok(())
    } else {
        Err(RevscopeError::corrupt(format!(
            "page {} is neither a branch nor a leaf (flags 0x{:02x})",
            page.id(),
            page.flags()
        )))
    }
}
