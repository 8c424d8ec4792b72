//! # Flash and Mapped Address Types
//!
//! Strongly typed wrappers for the two address spaces a flash-resident boot
//! stage juggles: **physical** flash offsets (where a partition lives on the
//! SPI chip) and **mapped** addresses (where the cache MMU makes those bytes
//! visible to the CPU).
//!
//! ## Overview
//!
//! | Concept | Generic | Description |
//! |----------|----------|-------------|
//! | [`MemoryAddress`] | – | A raw 32-bit address, either physical or mapped. |
//! | [`MemoryPage<S>`] | [`S: PageSize`](PageSize) | An `S`-aligned base address. |
//! | [`MemoryAddressOffset<S>`] | [`S: PageSize`](PageSize) | The position of an address within an `S`-sized block. |
//! | [`Region<A>`] | [`A: Address`](Address) | A `(base, length)` range with checked arithmetic. |
//!
//! [`PhysicalAddress`] and [`VirtualAddress`] wrap [`MemoryAddress`] so the two
//! kinds cannot be mixed by accident.
//!
//! ## Block Sizes
//!
//! - [`Size64K`]: one MMU page, which is also one flash erase block.
//! - [`Size32M`]: the addressable mapping window. The MMU decides *how much*
//!   gets mapped, never *where* in the window it lands, so the only thing a
//!   caller can rely on is that the low bits of a mapped address equal the low
//!   bits of the flash offset. [`WINDOW_MASK`] is `Size32M::SIZE - 1`.
//!
//! ```rust
//! # use flash_addresses::*;
//! let flash = PhysicalAddress::new(0x0011_0000);
//! let mapped = VirtualAddress::new(0x4211_0000);
//! assert_eq!(flash.offset::<Size32M>(), mapped.offset::<Size32M>());
//! assert_eq!(mapped.offset::<Size32M>().as_u32(), 0x0011_0000);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod memory_address;
mod memory_address_offset;
mod memory_page;
mod physical_address;
mod region;
mod virtual_address;

use core::fmt;
use core::hash::Hash;

pub use memory_address::MemoryAddress;
pub use memory_address_offset::MemoryAddressOffset;
pub use memory_page::MemoryPage;
pub use physical_address::PhysicalAddress;
pub use region::{Address, Region, WindowAlignment};
pub use virtual_address::VirtualAddress;

/// Mask selecting the bits of an address that the mapping window preserves.
pub const WINDOW_MASK: u32 = Size32M::SIZE - 1;

/// Sealed trait pattern to restrict `PageSize` impls to our markers.
mod sealed {
    pub trait Sealed {}
}

/// Marker trait for supported block sizes.
pub trait PageSize:
    sealed::Sealed
    + Clone
    + Copy
    + Eq
    + PartialEq
    + Ord
    + PartialOrd
    + Hash
    + fmt::Display
    + fmt::Debug
{
    /// Block size in bytes (power of two).
    const SIZE: u32;
    /// log2(SIZE), i.e., number of low bits used for the offset.
    const SHIFT: u32;

    fn as_str() -> &'static str;
}

/// 64 KiB MMU page / flash erase block.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size64K;
impl sealed::Sealed for Size64K {}
impl PageSize for Size64K {
    const SIZE: u32 = 64 * 1024;
    const SHIFT: u32 = 16;

    fn as_str() -> &'static str {
        "64K"
    }
}

/// 32 MiB mapping window.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size32M;
impl sealed::Sealed for Size32M {}
impl PageSize for Size32M {
    const SIZE: u32 = 32 * 1024 * 1024;
    const SHIFT: u32 = 25;

    fn as_str() -> &'static str {
        "32M"
    }
}

impl fmt::Display for Size64K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(Self::as_str())
    }
}

impl fmt::Display for Size32M {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(Self::as_str())
    }
}

impl fmt::Debug for Size64K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl fmt::Debug for Size32M {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

const _: () = {
    assert!(Size64K::SIZE == 1 << Size64K::SHIFT);
    assert!(Size32M::SIZE == 1 << Size32M::SHIFT);
    assert!(WINDOW_MASK == 0x01FF_FFFF);
};
