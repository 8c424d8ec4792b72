//! # Node Traversal
//!
//! Walks an image node by node. A valid header advances the cursor past the
//! node and its padding; anything else is treated as erased or foreign space
//! and skipped up to the next erase block, where node chains restart.

use crate::ERASE_BLOCK_SIZE;
use crate::node::{Dirent, InodeRecord, NODE_HEADER_SIZE, NodeHeader};
use log::trace;

/// What the cursor does on its next step.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorState {
    /// Expecting a node header at the current offset.
    Scanning,
    /// The last header was invalid; skip to the next erase block.
    Resyncing,
}

/// A node found in the image.
#[derive(Debug, Copy, Clone)]
pub struct Node<'a> {
    /// Image offset of the header.
    pub offset: usize,
    pub header: NodeHeader,
    /// Bytes following the header, clipped to the image.
    pub body: &'a [u8],
}

impl<'a> Node<'a> {
    #[must_use]
    pub fn as_dirent(&self) -> Option<Dirent<'a>> {
        if self.header.node_type.is_dirent() {
            Dirent::parse(self.body)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_inode(&self) -> Option<InodeRecord<'a>> {
        if self.header.node_type.is_inode() {
            InodeRecord::parse(self.body)
        } else {
            None
        }
    }
}

/// Iterator over the nodes of an image, in physical order.
#[derive(Debug, Clone)]
pub struct NodeCursor<'a> {
    image: &'a [u8],
    offset: usize,
    state: CursorState,
}

impl<'a> NodeCursor<'a> {
    #[must_use]
    pub const fn new(image: &'a [u8]) -> Self {
        Self {
            image,
            offset: 0,
            state: CursorState::Scanning,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn state(&self) -> CursorState {
        self.state
    }

    /// Reads the node at the current offset and moves past it, or switches
    /// to [`CursorState::Resyncing`] if there is none.
    fn scan(&mut self, header: NodeHeader) -> Option<Node<'a>> {
        let total_len = usize::try_from(header.total_len)
            .ok()
            .filter(|&len| header.has_magic() && len >= NODE_HEADER_SIZE);
        let Some(total_len) = total_len else {
            self.state = CursorState::Resyncing;
            return None;
        };

        let body_start = self.offset + NODE_HEADER_SIZE;
        let body_end = self
            .offset
            .saturating_add(total_len)
            .min(self.image.len());
        let node = Node {
            offset: self.offset,
            header,
            body: &self.image[body_start..body_end],
        };

        self.offset = total_len
            .checked_next_multiple_of(4)
            .and_then(|len| self.offset.checked_add(len))
            .unwrap_or(self.image.len());
        Some(node)
    }

    fn resync(&mut self) {
        let from = self.offset;
        self.offset = from
            .checked_add(NODE_HEADER_SIZE)
            .and_then(|off| off.checked_next_multiple_of(ERASE_BLOCK_SIZE))
            .unwrap_or(self.image.len());
        self.state = CursorState::Scanning;
        trace!("no node at {from:#x}, resuming at {:#x}", self.offset);
    }
}

impl<'a> Iterator for NodeCursor<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                CursorState::Scanning => {
                    let end = self.offset.checked_add(NODE_HEADER_SIZE)?;
                    let header = NodeHeader::parse(self.image.get(self.offset..end)?)?;
                    if let Some(node) = self.scan(header) {
                        return Some(node);
                    }
                }
                CursorState::Resyncing => self.resync(),
            }
        }
    }
}

impl core::iter::FusedIterator for NodeCursor<'_> {}
