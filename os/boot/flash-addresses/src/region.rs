//! # Address Regions

use crate::{MemoryAddress, PageSize, PhysicalAddress, VirtualAddress};
use core::fmt;

/// Common view over the typed address wrappers.
pub trait Address: Copy + Ord + fmt::Debug + fmt::Display {
    fn as_memory(self) -> MemoryAddress;
    fn from_memory(addr: MemoryAddress) -> Self;
}

impl Address for MemoryAddress {
    #[inline]
    fn as_memory(self) -> MemoryAddress {
        self
    }

    #[inline]
    fn from_memory(addr: MemoryAddress) -> Self {
        addr
    }
}

impl Address for PhysicalAddress {
    #[inline]
    fn as_memory(self) -> MemoryAddress {
        self.0
    }

    #[inline]
    fn from_memory(addr: MemoryAddress) -> Self {
        Self(addr)
    }
}

impl Address for VirtualAddress {
    #[inline]
    fn as_memory(self) -> MemoryAddress {
        self.0
    }

    #[inline]
    fn from_memory(addr: MemoryAddress) -> Self {
        Self(addr)
    }
}

/// A contiguous `[base, base + len)` range of addresses of kind `A`.
///
/// All arithmetic is checked; a region whose end does not fit into 32 bits
/// reports `None` from [`end`](Self::end) and never contains anything.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Region<A> {
    base: A,
    len: u32,
}

/// Where the end of a mapped region sits relative to a required target, both
/// taken modulo the block size `S`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WindowAlignment {
    /// The region ends exactly at the target.
    Aligned,
    /// The region ends this many bytes before the target.
    Short(u32),
    /// The region already extends this many bytes past the target.
    Overshoot(u32),
}

impl<A: Address> Region<A> {
    #[inline]
    #[must_use]
    pub const fn new(base: A, len: u32) -> Self {
        Self { base, len }
    }

    #[inline]
    #[must_use]
    pub const fn base(&self) -> A {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end address, or `None` on overflow.
    #[inline]
    #[must_use]
    pub fn end(&self) -> Option<A> {
        self.base.as_memory().checked_add(self.len).map(A::from_memory)
    }

    /// Whether `other` lies entirely inside this region.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        match (self.end(), other.end()) {
            (Some(end), Some(other_end)) => other.base >= self.base && other_end <= end,
            _ => false,
        }
    }

    /// Compares the end of this region against `target`, looking only at the
    /// offset bits within an `S`-sized block.
    ///
    /// This is the question the mapping window lets us ask: the landing
    /// position of a mapping is unknown, but its `S` offset bits are not, so
    /// `offset(base) + len` predicts the `S` offset of whatever gets mapped
    /// next. Returns `None` if the prediction overflows.
    #[must_use]
    pub fn alignment_to<S: PageSize, T: Address>(&self, target: T) -> Option<WindowAlignment> {
        let predicted = self.base.as_memory().offset::<S>().as_u32().checked_add(self.len)?;
        let target = target.as_memory().offset::<S>().as_u32();
        Some(match predicted.cmp(&target) {
            core::cmp::Ordering::Equal => WindowAlignment::Aligned,
            core::cmp::Ordering::Less => WindowAlignment::Short(target - predicted),
            core::cmp::Ordering::Greater => WindowAlignment::Overshoot(predicted - target),
        })
    }
}

impl<A: Address> fmt::Debug for Region<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region({:?}, {:#X})", self.base, self.len)
    }
}

impl<A: Address> fmt::Display for Region<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end() {
            Some(end) => write!(f, "[{}..{})", self.base, end),
            None => write!(f, "[{}..+{:#X})", self.base, self.len),
        }
    }
}
