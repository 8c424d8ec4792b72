//! # Image Builder
//!
//! Writes well-formed JFFS2 node streams: directory entries, inode records
//! and erased padding, with all header, node, name and data CRCs filled in.
//! Used by the host packer and to generate test images.

use crate::node::{
    DIRENT_SIZE, INODE_SIZE, MAGIC, NODE_HEADER_SIZE, NODETYPE_DIRENT, NODETYPE_INODE,
};
use crate::{ERASE_BLOCK_SIZE, Ino};
use alloc::vec::Vec;
use crc::{Algorithm, Crc};

/// CRC-32 as computed by JFFS2: reflected IEEE polynomial, zero seed and
/// no final inversion.
pub const CRC_32_JFFS2: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04C1_1DB7,
    init: 0,
    refin: true,
    refout: true,
    xorout: 0,
    check: 0x2DFD_2D88,
    residue: 0,
};

const JFFS2_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_JFFS2);

/// Value of erased flash.
const ERASED: u8 = 0xFF;

/// Directory entry type of a regular file (`DT_REG`).
pub const DT_REG: u8 = 8;

/// Default mode of packed files: regular file, `0644`.
pub const DEFAULT_MODE: u32 = 0o100_644;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum PackError {
    #[error("file name of {0} bytes exceeds 255 bytes")]
    NameTooLong(usize),
}

/// One directory entry to be written.
#[derive(Debug, Clone, Copy)]
pub struct DirentSpec<'n> {
    pub parent: Ino,
    pub version: u32,
    pub ino: Ino,
    pub name: &'n [u8],
    pub kind: u8,
    pub mctime: u32,
}

impl<'n> DirentSpec<'n> {
    #[must_use]
    pub const fn new(parent: Ino, version: u32, ino: Ino, name: &'n [u8]) -> Self {
        Self {
            parent,
            version,
            ino,
            name,
            kind: DT_REG,
            mctime: 0,
        }
    }

    #[must_use]
    pub const fn mctime(mut self, mctime: u32) -> Self {
        self.mctime = mctime;
        self
    }
}

/// One inode record to be written.
#[derive(Debug, Clone, Copy)]
pub struct InodeSpec<'d> {
    pub ino: Ino,
    pub version: u32,
    pub mode: u32,
    /// File size after this record; defaults to `offset + data.len()`.
    pub isize: Option<u32>,
    pub offset: u32,
    pub compr: u8,
    /// Uncompressed length; defaults to `data.len()`.
    pub dsize: Option<u32>,
    pub mtime: u32,
    pub data: &'d [u8],
}

impl<'d> InodeSpec<'d> {
    #[must_use]
    pub const fn new(ino: Ino, version: u32) -> Self {
        Self {
            ino,
            version,
            mode: DEFAULT_MODE,
            isize: None,
            offset: 0,
            compr: 0,
            dsize: None,
            mtime: 0,
            data: &[],
        }
    }

    #[must_use]
    pub const fn isize(mut self, isize: u32) -> Self {
        self.isize = Some(isize);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub const fn compr(mut self, compr: u8) -> Self {
        self.compr = compr;
        self
    }

    #[must_use]
    pub const fn dsize(mut self, dsize: u32) -> Self {
        self.dsize = Some(dsize);
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn mtime(mut self, mtime: u32) -> Self {
        self.mtime = mtime;
        self
    }

    #[must_use]
    pub const fn data(mut self, data: &'d [u8]) -> Self {
        self.data = data;
        self
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn data_len(&self) -> u32 {
        self.data.len() as u32
    }
}

/// Appends nodes to an in-memory image.
#[derive(Debug, Default, Clone)]
pub struct ImageBuilder {
    bytes: Vec<u8>,
}

impl ImageBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends a directory entry.
    ///
    /// # Errors
    /// [`PackError::NameTooLong`] if the name does not fit the 8-bit length.
    pub fn dirent(mut self, spec: DirentSpec<'_>) -> Result<Self, PackError> {
        let name_len =
            u8::try_from(spec.name.len()).map_err(|_| PackError::NameTooLong(spec.name.len()))?;

        let mut body = Vec::with_capacity(DIRENT_SIZE + spec.name.len());
        body.extend_from_slice(&spec.parent.to_le_bytes());
        body.extend_from_slice(&spec.version.to_le_bytes());
        body.extend_from_slice(&spec.ino.to_le_bytes());
        body.extend_from_slice(&spec.mctime.to_le_bytes());
        body.push(name_len);
        body.push(spec.kind);
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(&[0; 4]); // node crc
        body.extend_from_slice(&JFFS2_CRC.checksum(spec.name).to_le_bytes());
        body.extend_from_slice(spec.name);

        self.push_node(NODETYPE_DIRENT, &body, DIRENT_SIZE - 8);
        Ok(self)
    }

    /// Appends an inode record.
    #[must_use]
    pub fn inode(mut self, spec: InodeSpec<'_>) -> Self {
        let isize = spec
            .isize
            .unwrap_or_else(|| spec.offset.saturating_add(spec.data_len()));

        let mut body = Vec::with_capacity(INODE_SIZE + spec.data.len());
        body.extend_from_slice(&spec.ino.to_le_bytes());
        body.extend_from_slice(&spec.version.to_le_bytes());
        body.extend_from_slice(&spec.mode.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes()); // uid
        body.extend_from_slice(&0u16.to_le_bytes()); // gid
        body.extend_from_slice(&isize.to_le_bytes());
        body.extend_from_slice(&spec.mtime.to_le_bytes()); // atime
        body.extend_from_slice(&spec.mtime.to_le_bytes());
        body.extend_from_slice(&spec.mtime.to_le_bytes()); // ctime
        body.extend_from_slice(&spec.offset.to_le_bytes());
        body.extend_from_slice(&spec.data_len().to_le_bytes()); // csize
        body.extend_from_slice(&spec.dsize.unwrap_or(spec.data_len()).to_le_bytes());
        body.push(spec.compr);
        body.push(0); // usercompr
        body.extend_from_slice(&0u16.to_le_bytes()); // flags
        body.extend_from_slice(&JFFS2_CRC.checksum(spec.data).to_le_bytes());
        body.extend_from_slice(&[0; 4]); // node crc
        body.extend_from_slice(spec.data);

        self.push_node(NODETYPE_INODE, &body, INODE_SIZE - 8);
        self
    }

    /// Appends raw bytes, e.g. to model foreign or corrupted space.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Fills with erased bytes up to the next erase block boundary.
    #[must_use]
    pub fn pad_to_erase_block(mut self) -> Self {
        let end = self.bytes.len().next_multiple_of(ERASE_BLOCK_SIZE);
        self.bytes.resize(end, ERASED);
        self
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    /// Writes header and `body`, filling the header CRC and the node CRC
    /// stored at `node_crc_at` within the body.
    fn push_node(&mut self, node_type: u16, body: &[u8], node_crc_at: usize) {
        let total_len = NODE_HEADER_SIZE + body.len();
        let start = self.bytes.len();

        self.bytes.extend_from_slice(&MAGIC.to_le_bytes());
        self.bytes.extend_from_slice(&node_type.to_le_bytes());
        self.bytes
            .extend_from_slice(&u32::try_from(total_len).unwrap_or(u32::MAX).to_le_bytes());
        let hdr_crc = JFFS2_CRC.checksum(&self.bytes[start..start + 8]);
        self.bytes.extend_from_slice(&hdr_crc.to_le_bytes());
        self.bytes.extend_from_slice(body);

        let crc_at = start + NODE_HEADER_SIZE + node_crc_at;
        let node_crc = JFFS2_CRC.checksum(&self.bytes[start..crc_at]);
        self.bytes[crc_at..crc_at + 4].copy_from_slice(&node_crc.to_le_bytes());

        let padded = total_len.next_multiple_of(4);
        self.bytes.resize(start + padded, 0);
    }
}
