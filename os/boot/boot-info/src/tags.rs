//! # Boot Tags
//!
//! Boot parameters handed to the Linux kernel as a list of tagged records.
//! Each record is a 4-byte header (`id`, `size`) followed by `size` bytes of
//! payload; the kernel advances from one header to the next by `4 + size`.

use crate::layout::{COMMAND_LINE_MAX, COMMAND_LINE_SIZE};

/// Well-known tag ids.
#[repr(u16)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BootTagId {
    /// NUL-terminated kernel command line.
    CommandLine = 0x1001,
    /// Address of a flattened device tree.
    Fdt = 0x1006,
    /// First tag of every list.
    First = 0x7B0B,
    /// Terminator.
    Last = 0x7E0B,
}

impl BootTagId {
    #[must_use]
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0x1001 => Some(Self::CommandLine),
            0x1006 => Some(Self::Fdt),
            0x7B0B => Some(Self::First),
            0x7E0B => Some(Self::Last),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_raw(self) -> u16 {
        self as u16
    }
}

/// The `{id, size}` pair preceding each payload, in CPU byte order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootTagHeader {
    pub id: u16,
    /// Payload length in bytes, header excluded.
    pub size: u16,
}

impl BootTagHeader {
    pub const SIZE: usize = 4;

    #[must_use]
    pub const fn new(id: BootTagId, size: u16) -> Self {
        Self {
            id: id.as_raw(),
            size,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> Option<BootTagId> {
        BootTagId::from_raw(self.id)
    }

    const fn to_bytes(self) -> [u8; Self::SIZE] {
        let id = self.id.to_ne_bytes();
        let size = self.size.to_ne_bytes();
        [id[0], id[1], size[0], size[1]]
    }

    const fn from_bytes(b: [u8; Self::SIZE]) -> Self {
        Self {
            id: u16::from_ne_bytes([b[0], b[1]]),
            size: u16::from_ne_bytes([b[2], b[3]]),
        }
    }
}

const FIRST_OFFSET: usize = 0;
const COMMAND_LINE_OFFSET: usize = FIRST_OFFSET + BootTagHeader::SIZE;
const COMMAND_LINE_DATA_OFFSET: usize = COMMAND_LINE_OFFSET + BootTagHeader::SIZE;
const LAST_OFFSET: usize = COMMAND_LINE_DATA_OFFSET + COMMAND_LINE_SIZE;

/// Total size of a [`BootTagList`] in bytes.
pub const BOOT_TAGS_SIZE: usize = LAST_OFFSET + BootTagHeader::SIZE;

/// Payload length recorded for a filled command line slot.
#[allow(clippy::cast_possible_truncation)]
const COMMAND_LINE_SLOT_SIZE: u16 = COMMAND_LINE_SIZE as u16;

/// Fixed-capacity tag list: `FIRST`, one command line slot, `LAST`.
///
/// The list is kept as raw bytes so its layout is exactly what the kernel
/// reads; pass [`as_ptr`](Self::as_ptr) across the handoff.
#[repr(C, align(4))]
#[derive(Clone, Eq, PartialEq)]
pub struct BootTagList {
    bytes: [u8; BOOT_TAGS_SIZE],
}

/// The three fixed slots of a [`BootTagList`], as currently written.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootTagSlots {
    pub first: BootTagHeader,
    pub command_line: BootTagHeader,
    pub last: BootTagHeader,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum TagError {
    #[error("command line of {len} bytes does not fit the {max}-byte slot")]
    CommandLineTooLong { len: usize, max: usize },
    #[error("tag list does not start with the FIRST tag")]
    MissingFirst,
    #[error("tag at offset {0} runs past the end of the list")]
    Truncated(usize),
}

impl BootTagList {
    /// A list with an inert command line slot.
    #[must_use]
    pub const fn new() -> Self {
        let mut list = Self {
            bytes: [0; BOOT_TAGS_SIZE],
        };
        list.write_header(FIRST_OFFSET, BootTagHeader::new(BootTagId::First, 0));
        list.write_header(COMMAND_LINE_OFFSET, BootTagHeader::new(BootTagId::Last, 0));
        list.write_header(LAST_OFFSET, BootTagHeader::new(BootTagId::Last, 0));
        list
    }

    /// Fills the command line slot with `cmdline` plus a NUL terminator.
    ///
    /// # Errors
    /// [`TagError::CommandLineTooLong`] if `cmdline` exceeds
    /// [`COMMAND_LINE_MAX`] bytes; the list is left unchanged.
    pub fn set_command_line(&mut self, cmdline: &[u8]) -> Result<(), TagError> {
        if cmdline.len() > COMMAND_LINE_MAX {
            return Err(TagError::CommandLineTooLong {
                len: cmdline.len(),
                max: COMMAND_LINE_MAX,
            });
        }

        let data = &mut self.bytes[COMMAND_LINE_DATA_OFFSET..LAST_OFFSET];
        data.fill(0);
        data[..cmdline.len()].copy_from_slice(cmdline);
        self.write_header(
            COMMAND_LINE_OFFSET,
            BootTagHeader::new(BootTagId::CommandLine, COMMAND_LINE_SLOT_SIZE),
        );
        Ok(())
    }

    /// Returns the slot to its inert state.
    pub fn clear_command_line(&mut self) {
        self.bytes[COMMAND_LINE_DATA_OFFSET..LAST_OFFSET].fill(0);
        self.write_header(COMMAND_LINE_OFFSET, BootTagHeader::new(BootTagId::Last, 0));
    }

    /// The command line without its terminator, if the slot is filled.
    #[must_use]
    pub fn command_line(&self) -> Option<&[u8]> {
        if self.slots().command_line.kind() != Some(BootTagId::CommandLine) {
            return None;
        }
        let data = &self.bytes[COMMAND_LINE_DATA_OFFSET..LAST_OFFSET];
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        Some(&data[..len])
    }

    #[must_use]
    pub const fn slots(&self) -> BootTagSlots {
        BootTagSlots {
            first: self.read_header(FIRST_OFFSET),
            command_line: self.read_header(COMMAND_LINE_OFFSET),
            last: self.read_header(LAST_OFFSET),
        }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Address handed to the next stage.
    #[must_use]
    pub const fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    /// Walks the list the way the kernel does.
    #[must_use]
    pub fn iter(&self) -> Tags<'_> {
        Tags::new(&self.bytes)
    }

    const fn read_header(&self, off: usize) -> BootTagHeader {
        BootTagHeader::from_bytes([
            self.bytes[off],
            self.bytes[off + 1],
            self.bytes[off + 2],
            self.bytes[off + 3],
        ])
    }

    const fn write_header(&mut self, off: usize, header: BootTagHeader) {
        let raw = header.to_bytes();
        self.bytes[off] = raw[0];
        self.bytes[off + 1] = raw[1];
        self.bytes[off + 2] = raw[2];
        self.bytes[off + 3] = raw[3];
    }
}

impl Default for BootTagList {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for BootTagList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootTagList")
            .field("slots", &self.slots())
            .field("command_line", &self.command_line().map(core::str::from_utf8))
            .finish()
    }
}

/// One record seen by a tag consumer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootTag<'a> {
    pub id: u16,
    pub data: &'a [u8],
}

impl BootTag<'_> {
    #[must_use]
    pub const fn kind(&self) -> Option<BootTagId> {
        BootTagId::from_raw(self.id)
    }
}

/// Consumer-side iterator: yields every tag from `FIRST` up to, but not
/// including, the first `LAST`.
pub struct Tags<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Tags<'a> {
    /// Walks an arbitrary tag list in memory.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            done: false,
        }
    }

    fn header_at(&self, off: usize) -> Option<BootTagHeader> {
        let end = off.checked_add(BootTagHeader::SIZE)?;
        let raw = self.bytes.get(off..end)?;
        Some(BootTagHeader::from_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

impl<'a> Iterator for Tags<'a> {
    type Item = Result<BootTag<'a>, TagError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(header) = self.header_at(self.pos) else {
            self.done = true;
            return Some(Err(TagError::Truncated(self.pos)));
        };

        if self.pos == 0 && header.kind() != Some(BootTagId::First) {
            self.done = true;
            return Some(Err(TagError::MissingFirst));
        }

        if header.kind() == Some(BootTagId::Last) {
            self.done = true;
            return None;
        }

        let start = self.pos + BootTagHeader::SIZE;
        let end = start + usize::from(header.size);
        let Some(data) = self.bytes.get(start..end) else {
            self.done = true;
            return Some(Err(TagError::Truncated(self.pos)));
        };

        self.pos = end;
        Some(Ok(BootTag {
            id: header.id,
            data,
        }))
    }
}

impl core::iter::FusedIterator for Tags<'_> {}
