//! Physical and Virtual Address types.
//!
//! This module defines strong types for the two address spaces of the VR4300
//! to prevent accidental mixing. It provides the following:
//! 1. **Type Safety:** A 64-bit virtual space and a 32-bit physical space,
//!    distinguished at compile time.
//! 2. **Address Manipulation:** Helpers for the low-bit offsets the caches
//!    use to index inside a line.

/// A virtual address as seen by software.
///
/// Virtual addresses are 64 bits wide; the 32-bit compatibility segments are
/// sign-extended into the upper half. Mapped addresses must pass through the
/// TLB before touching a cache or the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtAddr(pub u64);

/// A physical address on the SysAD bus.
///
/// The VR4300 drives a 32-bit physical address space; every cache tag and
/// every bus transaction uses this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhysAddr(pub u32);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 32-bit value.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw 32-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Byte offset of this address inside a cache line of the given size.
    ///
    /// `line_size` must be a power of two.
    #[inline(always)]
    pub const fn line_offset(self, line_size: u32) -> usize {
        (self.0 & (line_size - 1)) as usize
    }
}
