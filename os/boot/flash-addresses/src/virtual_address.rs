use crate::{MemoryAddress, MemoryAddressOffset, MemoryPage, PageSize};
use core::fmt;

/// Mapped (CPU-visible) address.
///
/// A thin wrapper around [`MemoryAddress`] that denotes an address handed out
/// by the flash MMU. It carries no invariant beyond "this points into the
/// mapping window"; in particular only the [`Size32M`](crate::Size32M)
/// offset bits are determined by the flash layout.
///
/// ### Examples
/// ```rust
/// # use flash_addresses::*;
/// let va = VirtualAddress::new(0x4205_1234);
/// assert_eq!(va.offset::<Size32M>().as_u32(), 0x0005_1234);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(pub(crate) MemoryAddress);

impl VirtualAddress {
    /// Convert a pointer, or `None` if it does not fit into 32 bits.
    #[inline]
    #[must_use]
    pub fn from_ptr<T>(ptr: *const T) -> Option<Self> {
        u32::try_from(ptr.addr()).ok().map(Self::new)
    }

    #[inline]
    #[must_use]
    pub const fn new(v: u32) -> Self {
        Self(MemoryAddress::new(v))
    }

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0.as_u32()
    }

    #[inline]
    #[must_use]
    pub const fn as_memory(self) -> MemoryAddress {
        self.0
    }

    /// Returns the address as a raw pointer. Dereferencing it is only sound
    /// while the mapping that produced this address is live.
    #[inline]
    #[must_use]
    pub fn as_ptr<T>(self) -> *const T {
        core::ptr::without_provenance(self.as_u32() as usize)
    }

    #[inline]
    #[must_use]
    pub const fn page<S: PageSize>(self) -> MemoryPage<S> {
        self.0.page::<S>()
    }

    #[inline]
    #[must_use]
    pub const fn offset<S: PageSize>(self) -> MemoryAddressOffset<S> {
        self.0.offset::<S>()
    }

    #[inline]
    #[must_use]
    pub const fn split<S: PageSize>(self) -> (MemoryPage<S>, MemoryAddressOffset<S>) {
        (self.page::<S>(), self.offset::<S>())
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u32) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA(0x{:08X})", self.as_u32())
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.as_u32())
    }
}

impl From<u32> for VirtualAddress {
    #[inline]
    fn from(v: u32) -> Self {
        Self::new(v)
    }
}
