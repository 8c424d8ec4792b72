use crate::error::BootError;
use crate::platform::{FlashMapper, Partition};
use flash_addresses::{PhysicalAddress, Region, Size32M, VirtualAddress};
use log::debug;

/// A partition, or a prefix of one, visible through the flash MMU.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Mapping {
    pub partition: Partition,
    pub region: Region<VirtualAddress>,
}

impl Mapping {
    #[must_use]
    pub const fn base(&self) -> VirtualAddress {
        self.region.base()
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        self.region.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Flash offset one past the last mapped byte.
    #[must_use]
    pub const fn physical_end(&self) -> Option<PhysicalAddress> {
        self.partition.address.checked_add(self.region.len())
    }

    /// The mapped bytes, if the MMU still shows all of them.
    #[must_use]
    pub fn bytes<'m, M: FlashMapper + ?Sized>(&self, mapper: &'m M) -> Option<&'m [u8]> {
        mapper.mapped_bytes(self.base(), self.len())
    }
}

/// Maps the first `size` bytes of `partition`; `0` maps all of it.
///
/// # Errors
/// * [`BootError::MappingFailure`] if the MMU refuses the request.
/// * [`BootError::AlignmentMismatch`] if the mapping does not keep the
///   window offset of the partition.
pub fn map_partition<M: FlashMapper + ?Sized>(
    mapper: &mut M,
    partition: &Partition,
    size: u32,
) -> Result<Mapping, BootError> {
    let size = if size == 0 { partition.size } else { size };
    let base = mapper
        .mmap(partition, 0, size)
        .map_err(|source| BootError::MappingFailure {
            label: partition.label,
            size,
            source,
        })?;

    if base.offset::<Size32M>() != partition.address.offset::<Size32M>() {
        return Err(BootError::AlignmentMismatch {
            label: partition.label,
            physical: partition.address,
            mapped: base,
        });
    }

    debug!("mapped {} {} bytes at {base}", partition.label, size);
    Ok(Mapping {
        partition: *partition,
        region: Region::new(base, size),
    })
}
