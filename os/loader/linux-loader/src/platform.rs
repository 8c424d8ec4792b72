//! # Platform Services
//!
//! The firmware pieces the boot stage builds on: the partition table, the
//! flash MMU, raw flash reads and the final jump. Each is a trait so the
//! stage runs unchanged against the firmware and against test doubles.

use boot_info::tags::BootTagList;
use core::fmt;
use flash_addresses::{PhysicalAddress, Region, VirtualAddress};

/// Maximum length of a partition label.
pub const LABEL_LEN: usize = 16;

/// A partition label: up to 16 bytes, NUL padded.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Label([u8; LABEL_LEN]);

impl Label {
    /// Builds a label from `name`, keeping at most [`LABEL_LEN`] bytes.
    #[must_use]
    pub const fn new(name: &str) -> Self {
        let name = name.as_bytes();
        let mut raw = [0; LABEL_LEN];
        let mut i = 0;
        while i < name.len() && i < LABEL_LEN {
            raw[i] = name[i];
            i += 1;
        }
        Self(raw)
    }

    /// The label bytes without NUL padding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(LABEL_LEN);
        &self.0[..len]
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.as_bytes() == name.as_bytes()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(self.as_bytes()) {
            Ok(s) => f.write_str(s),
            Err(_) => write!(f, "{:02x?}", self.as_bytes()),
        }
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Partition type byte of the table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PartitionType(pub u8);

impl PartitionType {
    pub const APP: Self = Self(0x00);
    pub const DATA: Self = Self(0x01);
}

/// One entry of the partition table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Partition {
    pub label: Label,
    pub kind: PartitionType,
    pub subtype: u8,
    /// Flash offset of the first byte.
    pub address: PhysicalAddress,
    pub size: u32,
}

impl Partition {
    /// The flash range the partition covers.
    #[must_use]
    pub const fn region(&self) -> Region<PhysicalAddress> {
        Region::new(self.address, self.size)
    }
}

/// Selects partitions; every field that is set must match.
#[derive(Debug, Copy, Clone, Default)]
pub struct PartitionQuery<'a> {
    pub label: Option<&'a str>,
    pub kind: Option<PartitionType>,
    pub subtype: Option<u8>,
}

impl<'a> PartitionQuery<'a> {
    /// Any partition.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            label: None,
            kind: None,
            subtype: None,
        }
    }

    #[must_use]
    pub const fn label(label: &'a str) -> Self {
        Self {
            label: Some(label),
            ..Self::any()
        }
    }

    /// By type and subtype; `None` is a wildcard.
    #[must_use]
    pub const fn typed(kind: Option<PartitionType>, subtype: Option<u8>) -> Self {
        Self {
            label: None,
            kind,
            subtype,
        }
    }

    #[must_use]
    pub fn matches(&self, partition: &Partition) -> bool {
        self.label.is_none_or(|label| partition.label.matches(label))
            && self.kind.is_none_or(|kind| partition.kind == kind)
            && self.subtype.is_none_or(|subtype| partition.subtype == subtype)
    }
}

/// The partition table.
pub trait PartitionTable {
    type Partitions<'a>: Iterator<Item = Partition>
    where
        Self: 'a;

    /// All partitions in ascending address order. May be called repeatedly.
    fn partitions(&self) -> Self::Partitions<'_>;

    /// The first partition matching `query`.
    fn find_first(&self, query: &PartitionQuery<'_>) -> Option<Partition> {
        self.partitions().find(|p| query.matches(p))
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("range {offset:#x}+{size:#x} is outside the partition")]
    OutOfRange { offset: u32, size: u32 },
    #[error("no free MMU entries for {0:#x} bytes")]
    NoSpace(u32),
    #[error("mapping service failed with code {0:#x}")]
    Service(i32),
}

/// The flash MMU.
///
/// Mappings are never released; the boot stage does not return.
pub trait FlashMapper {
    /// Maps `size` bytes of `partition` starting at `offset` and returns the
    /// address of the first mapped byte.
    ///
    /// The caller cannot choose where the mapping lands; it only knows the
    /// low bits within the 32 MiB window equal those of the flash offset.
    ///
    /// # Errors
    /// Whatever the mapping service reports.
    fn mmap(
        &mut self,
        partition: &Partition,
        offset: u32,
        size: u32,
    ) -> Result<VirtualAddress, MapError>;

    /// The `len` bytes visible at `address`, or `None` if they are not all
    /// mapped.
    fn mapped_bytes(&self, address: VirtualAddress, len: u32) -> Option<&[u8]>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("read of {len:#x} bytes at {offset:#x} is outside the partition")]
    OutOfRange { offset: u32, len: usize },
    #[error("flash driver failed with code {0:#x}")]
    Driver(i32),
}

/// Reads through the flash driver instead of the MMU.
pub trait RawStorage {
    /// Fills `buf` from `partition` at `offset`.
    ///
    /// # Errors
    /// Whatever the flash driver reports.
    fn read(&mut self, partition: &Partition, offset: u32, buf: &mut [u8])
    -> Result<(), StorageError>;
}

/// Leaves the boot stage.
pub trait Handoff {
    /// Jumps to `entry` with `tags` as the boot parameter list.
    fn enter(&mut self, entry: VirtualAddress, tags: &BootTagList) -> !;

    /// Restarts the system after a failed boot attempt.
    fn restart(&mut self) -> !;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(label: &str, kind: PartitionType, subtype: u8) -> Partition {
        Partition {
            label: Label::new(label),
            kind,
            subtype,
            address: PhysicalAddress::new(0x1_0000),
            size: 0x1_0000,
        }
    }

    #[test]
    fn labels_are_truncated_and_compared_without_padding() {
        let label = Label::new("etc");
        assert_eq!(label.as_bytes(), b"etc");
        assert!(label.matches("etc"));
        assert!(!label.matches("et"));
        assert!(!label.matches("etc\0"));

        let long = Label::new("a-very-long-partition-name");
        assert_eq!(long.as_bytes(), b"a-very-long-part");
        assert_eq!(format!("{long}"), "a-very-long-part");
    }

    #[test]
    fn query_fields_are_anded() {
        let linux = partition("linux", PartitionType::DATA, 0x40);
        assert!(PartitionQuery::any().matches(&linux));
        assert!(PartitionQuery::label("linux").matches(&linux));
        assert!(!PartitionQuery::label("etc").matches(&linux));
        assert!(PartitionQuery::typed(Some(PartitionType::DATA), None).matches(&linux));
        assert!(!PartitionQuery::typed(Some(PartitionType::APP), None).matches(&linux));
        assert!(!PartitionQuery::typed(None, Some(0x41)).matches(&linux));
    }
}
