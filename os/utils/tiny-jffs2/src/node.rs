//! # On-Flash Node Layout
//!
//! All multi-byte fields are little-endian. Records are read field by field
//! from the raw image so no alignment or layout of the image is assumed.

use bitfield_struct::bitfield;

/// Magic value opening every node header.
pub const MAGIC: u16 = 0x1985;

/// Size of the common node header.
pub const NODE_HEADER_SIZE: usize = 12;

/// Size of the fixed part of a directory entry record; the name follows.
pub const DIRENT_SIZE: usize = 28;

/// Size of the fixed part of an inode record; the payload follows.
pub const INODE_SIZE: usize = 56;

/// Full node type value of a directory entry.
pub const NODETYPE_DIRENT: u16 = 0xE001;

/// Full node type value of an inode record.
pub const NODETYPE_INODE: u16 = 0xE002;

/// How a reader that does not know a node kind must treat it.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Compat {
    /// Safe to drop on garbage collection.
    RwCompatDelete,
    /// Safe to copy on garbage collection.
    RwCompatCopy,
    /// The filesystem may only be mounted read-only.
    RoCompat,
    /// The filesystem must not be mounted.
    Incompat,
}

impl Compat {
    const fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => Self::RwCompatDelete,
            1 => Self::RwCompatCopy,
            2 => Self::RoCompat,
            _ => Self::Incompat,
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// The `nodetype` field of a node header.
#[bitfield(u16)]
pub struct NodeType {
    /// Node kind within its compatibility class (bits 0..13).
    #[bits(13)]
    pub kind: u16,
    /// Set on nodes written in full (bit 13).
    pub accurate: bool,
    /// Compatibility class (bits 14..16).
    #[bits(2)]
    pub compat: Compat,
}

impl NodeType {
    #[must_use]
    pub const fn is_dirent(self) -> bool {
        self.into_bits() == NODETYPE_DIRENT
    }

    #[must_use]
    pub const fn is_inode(self) -> bool {
        self.into_bits() == NODETYPE_INODE
    }
}

/// Common node header.
#[derive(Debug, Copy, Clone)]
pub struct NodeHeader {
    pub magic: u16,
    pub node_type: NodeType,
    /// Node length in bytes, header included, before padding to 4 bytes.
    pub total_len: u32,
    /// Not verified by the reader.
    pub hdr_crc: u32,
}

impl NodeHeader {
    /// Parses a header from the start of `buf`.
    #[must_use]
    pub fn parse(buf: &[u8]) -> Option<Self> {
        Some(Self {
            magic: read_u16_le(buf, 0)?,
            node_type: NodeType::from_bits(read_u16_le(buf, 2)?),
            total_len: read_u32_le(buf, 4)?,
            hdr_crc: read_u32_le(buf, 8)?,
        })
    }

    #[must_use]
    pub const fn has_magic(&self) -> bool {
        self.magic == MAGIC
    }
}

/// Directory entry: binds `name` under `parent` to `ino`.
#[derive(Debug, Copy, Clone)]
pub struct Dirent<'a> {
    pub parent: u32,
    pub version: u32,
    /// Target inode; zero marks an unlink.
    pub ino: u32,
    pub mctime: u32,
    /// Name length as recorded in the node.
    pub name_len: u8,
    pub kind: u8,
    pub node_crc: u32,
    pub name_crc: u32,
    /// Name bytes, clipped to what the node body holds.
    pub name: &'a [u8],
}

impl<'a> Dirent<'a> {
    /// Whether the recorded name is complete and equal to `name`.
    #[must_use]
    pub fn name_is(&self, name: &[u8]) -> bool {
        usize::from(self.name_len) == name.len() && self.name == name
    }

    /// Parses a directory entry from a node body.
    #[must_use]
    pub fn parse(body: &'a [u8]) -> Option<Self> {
        let name_len = *body.get(16)?;
        let name_end = (DIRENT_SIZE + usize::from(name_len)).min(body.len());
        Some(Self {
            parent: read_u32_le(body, 0)?,
            version: read_u32_le(body, 4)?,
            ino: read_u32_le(body, 8)?,
            mctime: read_u32_le(body, 12)?,
            name_len,
            kind: *body.get(17)?,
            node_crc: read_u32_le(body, 20)?,
            name_crc: read_u32_le(body, 24)?,
            name: body.get(DIRENT_SIZE..name_end)?,
        })
    }
}

/// One version of (a range of) a file's contents.
#[derive(Debug, Copy, Clone)]
pub struct InodeRecord<'a> {
    pub ino: u32,
    pub version: u32,
    pub mode: u32,
    pub uid: u16,
    pub gid: u16,
    /// Logical file size after this record is applied.
    pub isize: u32,
    pub atime: u32,
    pub mtime: u32,
    pub ctime: u32,
    /// File offset the payload is written to.
    pub offset: u32,
    /// Stored payload length.
    pub csize: u32,
    /// Payload length after decompression.
    pub dsize: u32,
    /// Compression method; zero means stored uncompressed.
    pub compr: u8,
    pub usercompr: u8,
    pub flags: u16,
    pub data_crc: u32,
    pub node_crc: u32,
    /// Payload bytes, clipped to what the node body holds.
    pub data: &'a [u8],
}

impl<'a> InodeRecord<'a> {
    /// Parses an inode record from a node body.
    #[must_use]
    pub fn parse(body: &'a [u8]) -> Option<Self> {
        Some(Self {
            ino: read_u32_le(body, 0)?,
            version: read_u32_le(body, 4)?,
            mode: read_u32_le(body, 8)?,
            uid: read_u16_le(body, 12)?,
            gid: read_u16_le(body, 14)?,
            isize: read_u32_le(body, 16)?,
            atime: read_u32_le(body, 20)?,
            mtime: read_u32_le(body, 24)?,
            ctime: read_u32_le(body, 28)?,
            offset: read_u32_le(body, 32)?,
            csize: read_u32_le(body, 36)?,
            dsize: read_u32_le(body, 40)?,
            compr: *body.get(44)?,
            usercompr: *body.get(45)?,
            flags: read_u16_le(body, 46)?,
            data_crc: read_u32_le(body, 48)?,
            node_crc: read_u32_le(body, 52)?,
            data: body.get(INODE_SIZE..)?,
        })
    }

    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        self.compr != 0
    }
}

#[inline]
fn read_u16_le(buf: &[u8], off: usize) -> Option<u16> {
    let s = buf.get(off..off.checked_add(2)?)?;
    Some(u16::from_le_bytes([s[0], s[1]]))
}

#[inline]
fn read_u32_le(buf: &[u8], off: usize) -> Option<u32> {
    let s = buf.get(off..off.checked_add(4)?)?;
    Some(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}
