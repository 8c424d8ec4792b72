//! # Tiny JFFS2 Reader
//!
//! A read-only view over a JFFS2 image that is already mapped into memory.
//! It answers two questions, which is all a boot stage needs to pull a small
//! configuration file out of flash:
//!
//! * [`Image::lookup`]: which inode does `name` in directory `parent` refer to?
//! * [`Image::read`]: what are the contents of that inode?
//!
//! Nothing is allocated and the image is never written. CRCs are not checked
//! and compressed payloads are refused rather than decoded.
//!
//! ## Image Layout
//!
//! ```text
//! erase block 0                      erase block 1
//! ┌──────┬─────────┬──────┬───···───┬──────┬─────────┬───···
//! │ hdr  │ body    │ hdr  │ 0xFF    │ hdr  │ body    │
//! └──────┴─────────┴──────┴───···───┴──────┴─────────┴───···
//!  12 B   totlen-12  (nodes padded to 4 bytes)
//! ```
//!
//! The reader walks nodes with a [`NodeCursor`]. A header without the magic
//! value makes it skip to the next 64 KiB erase block.
//!
//! ## Features
//!
//! * `pack` (default): the [`pack::ImageBuilder`] used by the host packer and
//!   tests. Requires `alloc`.
//!
//! ## Usage
//! ```rust
//! # #[cfg(feature = "pack")] {
//! use tiny_jffs2::Image;
//! use tiny_jffs2::pack::{DirentSpec, ImageBuilder, InodeSpec};
//!
//! let bytes = ImageBuilder::new()
//!     .dirent(DirentSpec::new(1, 1, 5, b"cmdline"))
//!     .unwrap()
//!     .inode(InodeSpec::new(5, 1).data(b"console=ttyS0"))
//!     .build();
//!
//! let image = Image::new(&bytes);
//! let ino = image.lookup(1, b"cmdline").unwrap();
//! let mut buf = [0u8; 64];
//! let len = image.read(ino, &mut buf).unwrap();
//! assert_eq!(&buf[..len], b"console=ttyS0");
//! # }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "pack")]
extern crate alloc;

mod cursor;
mod lookup;
pub mod node;
mod read;

#[cfg(feature = "pack")]
pub mod pack;

pub use cursor::{CursorState, Node, NodeCursor};
pub use lookup::lookup;
pub use node::{Compat, Dirent, InodeRecord, NodeHeader, NodeType};
pub use read::{ReadError, read};

/// Inode number.
pub type Ino = u32;

/// Inode of the root directory.
pub const ROOT_INO: Ino = 1;

/// Erase block size; node chains restart at these boundaries.
pub const ERASE_BLOCK_SIZE: usize = 0x1_0000;

/// A mapped, read-only JFFS2 image.
#[derive(Debug, Copy, Clone)]
pub struct Image<'a> {
    bytes: &'a [u8],
}

impl<'a> Image<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// All nodes, in physical order.
    #[must_use]
    pub const fn nodes(&self) -> NodeCursor<'a> {
        NodeCursor::new(self.bytes)
    }

    /// See [`lookup`].
    #[must_use]
    pub fn lookup(&self, parent: Ino, name: &[u8]) -> Option<Ino> {
        lookup(self.bytes, parent, name)
    }

    /// See [`read`].
    ///
    /// # Errors
    /// See [`ReadError`].
    pub fn read(&self, ino: Ino, buf: &mut [u8]) -> Result<usize, ReadError> {
        read(self.bytes, ino, buf)
    }
}
