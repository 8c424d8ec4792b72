//! Test doubles: a partition table, a flash MMU with 64 KiB pages and a raw
//! storage driver, all backed by one in-memory flash image.

#![allow(clippy::cast_possible_truncation)]

use crate::platform::{
    FlashMapper, Handoff, Label, MapError, Partition, PartitionTable, PartitionType, RawStorage,
    StorageError,
};
use boot_info::tags::BootTagList;
use flash_addresses::{MemoryPage, PageSize, PhysicalAddress, Size64K, VirtualAddress};
use std::cell::Cell;
use tiny_jffs2::pack::{DirentSpec, ImageBuilder, InodeSpec};

/// First mapped address; its window offset is zero.
pub const VADDR_BASE: u32 = 0x4200_0000;
/// MMU entries; together they span the 32 MiB window.
pub const MMU_ENTRIES: usize = 512;

const PAGE: u32 = Size64K::SIZE;

pub fn part(label: &str, address: u32, size: u32) -> Partition {
    Partition {
        label: Label::new(label),
        kind: PartitionType::DATA,
        subtype: 0,
        address: PhysicalAddress::new(address),
        size,
    }
}

/// The stock flash layout:
///
/// ```text
/// 0x009000 nvs      0x006000
/// 0x010000 factory  0x100000  (app)
/// 0x110000 etc      0x010000  JFFS2 with /cmdline
/// 0x120000 linux    0x200000
/// 0x320000 rootfs   0x080000
/// ```
pub fn stock_partitions() -> Vec<Partition> {
    vec![
        part("nvs", 0x9000, 0x6000),
        Partition {
            kind: PartitionType::APP,
            ..part("factory", 0x1_0000, 0x10_0000)
        },
        part("etc", 0x11_0000, 0x1_0000),
        part("linux", 0x12_0000, 0x20_0000),
        part("rootfs", 0x32_0000, 0x8_0000),
    ]
}

/// A 4 MiB flash holding the stock layout, with `cmdline` as `/cmdline` in
/// the `etc` image. `None` leaves `etc` without that file.
pub fn stock_mmu(cmdline: Option<&[u8]>) -> SimMmu {
    let mut builder = ImageBuilder::new()
        .dirent(DirentSpec::new(1, 1, 2, b"fstab"))
        .unwrap()
        .inode(InodeSpec::new(2, 1).data(b"/dev/root / jffs2 ro 0 0\n"));
    if let Some(cmdline) = cmdline {
        builder = builder
            .dirent(DirentSpec::new(1, 1, 5, b"cmdline"))
            .unwrap()
            .inode(InodeSpec::new(5, 1).data(cmdline));
    }

    let mut mmu = SimMmu::new(0x40_0000);
    mmu.write(0x11_0000, &builder.build());
    mmu.write(0x12_0000, b"linux entry");
    mmu
}

pub struct SimTable(Vec<Partition>);

impl SimTable {
    pub fn new(partitions: Vec<Partition>) -> Self {
        Self(partitions)
    }
}

impl PartitionTable for SimTable {
    type Partitions<'a> = std::iter::Copied<std::slice::Iter<'a, Partition>>;

    fn partitions(&self) -> Self::Partitions<'_> {
        self.0.iter().copied()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Entry {
    page: u32,
    refs: u32,
}

/// Flash MMU model.
///
/// A request for `n` pages takes the lowest run of `n` entries where each
/// entry is free or already maps the page it would map. Mappings are never
/// released, so remapping a partition with a larger size grows it in place.
pub struct SimMmu {
    pub flash: Vec<u8>,
    entries: [Option<Entry>; MMU_ENTRIES],
    /// `(label, offset, size)` of every request, failed ones included.
    pub requests: Vec<(Label, u32, u32)>,
    /// Number of [`FlashMapper::mapped_bytes`] calls.
    pub reads: Cell<usize>,
    /// Error returned for the request with this index.
    pub fail_at: Option<(usize, MapError)>,
}

impl SimMmu {
    /// An MMU over `flash_len` bytes of erased flash, with entry 0 taken by
    /// the running firmware.
    pub fn new(flash_len: usize) -> Self {
        let mut entries = [None; MMU_ENTRIES];
        entries[0] = Some(Entry {
            page: 0x1FF,
            refs: 1,
        });
        Self {
            flash: vec![0xFF; flash_len],
            entries,
            requests: Vec::new(),
            reads: Cell::new(0),
            fail_at: None,
        }
    }

    /// Marks `count` entries from `first` as taken by foreign mappings.
    pub fn occupy(&mut self, first: usize, count: usize) {
        for entry in &mut self.entries[first..first + count] {
            *entry = Some(Entry {
                page: 0x1FF,
                refs: 1,
            });
        }
    }

    pub fn write(&mut self, address: u32, bytes: &[u8]) {
        let at = address as usize;
        self.flash[at..at + bytes.len()].copy_from_slice(bytes);
    }

    /// Flash page mapped by entry `index`.
    pub fn page_at(&self, index: usize) -> Option<u32> {
        self.entries[index].map(|e| e.page)
    }

    pub fn refs_at(&self, index: usize) -> u32 {
        self.entries[index].map_or(0, |e| e.refs)
    }

    fn place(&self, first_page: u32, count: usize) -> Option<usize> {
        (0..=MMU_ENTRIES - count).find(|&start| {
            (0..count).all(|i| match self.entries[start + i] {
                None => true,
                Some(entry) => entry.page == first_page + i as u32,
            })
        })
    }
}

impl FlashMapper for SimMmu {
    fn mmap(
        &mut self,
        partition: &Partition,
        offset: u32,
        size: u32,
    ) -> Result<VirtualAddress, MapError> {
        let index = self.requests.len();
        self.requests.push((partition.label, offset, size));
        if let Some((at, err)) = self.fail_at
            && at == index
        {
            return Err(err);
        }

        let in_range = offset
            .checked_add(size)
            .is_some_and(|end| size > 0 && end <= partition.size);
        if !in_range {
            return Err(MapError::OutOfRange { offset, size });
        }

        let phys = PhysicalAddress::new(partition.address.as_u32() + offset);
        let (page, in_page) = phys.split::<Size64K>();
        let (first_page, in_page) = (page.index(), in_page.as_u32());
        let count = (in_page + size).div_ceil(PAGE) as usize;
        let start = self.place(first_page, count).ok_or(MapError::NoSpace(size))?;

        for i in 0..count {
            let entry = &mut self.entries[start + i];
            let refs = entry.map_or(0, |e| e.refs);
            *entry = Some(Entry {
                page: first_page + i as u32,
                refs: refs + 1,
            });
        }

        let entry = MemoryPage::<Size64K>::from_index(start as u32);
        Ok(VirtualAddress::new(VADDR_BASE + entry.base().as_u32() + in_page))
    }

    fn mapped_bytes(&self, address: VirtualAddress, len: u32) -> Option<&[u8]> {
        self.reads.set(self.reads.get() + 1);

        let rel = address.as_u32().checked_sub(VADDR_BASE)?;
        let first = (rel / PAGE) as usize;
        let count = ((rel % PAGE) + len).div_ceil(PAGE) as usize;
        let page = self.entries.get(first)?.as_ref()?.page;
        for i in 0..count {
            if self.entries.get(first + i)?.as_ref()?.page != page + i as u32 {
                return None;
            }
        }

        let phys = (page * PAGE + rel % PAGE) as usize;
        self.flash.get(phys..phys + len as usize)
    }
}

/// Raw reads from a copy of the flash image.
pub struct SimStorage {
    pub flash: Vec<u8>,
    pub reads: Vec<(Label, u32, usize)>,
    pub fail: Option<StorageError>,
}

impl SimStorage {
    pub fn new(flash: &[u8]) -> Self {
        Self {
            flash: flash.to_vec(),
            reads: Vec::new(),
            fail: None,
        }
    }
}

impl RawStorage for SimStorage {
    fn read(
        &mut self,
        partition: &Partition,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<(), StorageError> {
        self.reads.push((partition.label, offset, buf.len()));
        if let Some(err) = self.fail {
            return Err(err);
        }
        if offset as usize + buf.len() > partition.size as usize {
            return Err(StorageError::OutOfRange {
                offset,
                len: buf.len(),
            });
        }
        let at = (partition.address.as_u32() + offset) as usize;
        buf.copy_from_slice(&self.flash[at..at + buf.len()]);
        Ok(())
    }
}

/// Ends a test by panicking with what the stage asked for.
pub struct PanicHandoff;

impl Handoff for PanicHandoff {
    fn enter(&mut self, entry: VirtualAddress, tags: &BootTagList) -> ! {
        let cmdline = tags.command_line().map(|c| String::from_utf8_lossy(c).into_owned());
        panic!("enter {entry} cmdline={cmdline:?}")
    }

    fn restart(&mut self) -> ! {
        panic!("restart")
    }
}
