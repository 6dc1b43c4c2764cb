//! Virtual address segments.
//!
//! The VR4300 carves its virtual space into fixed windows with shared
//! mapping, cacheability, and offset properties. The stages cache the
//! descriptor of the window they are executing in and only come back here
//! when an address leaves that window, so `lookup` is deliberately cold
//! code.

use crate::common::constants::{STATUS_ERL, STATUS_EXL, STATUS_KSU_MASK};

/// A virtual address window.
///
/// `offset` is subtracted from a virtual address to form the physical
/// address baseline for unmapped windows; mapped windows go through the TLB
/// instead and ignore it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// First virtual address covered.
    pub start: u64,
    /// Length of the window in bytes.
    pub length: u64,
    /// Subtracted from a VA to form the PA baseline (unmapped windows).
    pub offset: u64,
    /// Whether addresses in this window require TLB translation.
    pub mapped: bool,
    /// Whether accesses in this window go through a cache.
    pub cached: bool,
}

impl Segment {
    /// Whether `va` falls inside this window.
    ///
    /// The zero-length default segment contains nothing, which is what
    /// forces the first fetch after reset to perform a lookup.
    #[inline(always)]
    pub const fn contains(&self, va: u64) -> bool {
        va.wrapping_sub(self.start) < self.length
    }
}

/// 2 GiB user space, TLB-mapped and cached.
const KUSEG: Segment = Segment {
    start: 0x0000_0000_0000_0000,
    length: 0x8000_0000,
    offset: 0,
    mapped: true,
    cached: true,
};

/// 512 MiB unmapped cached kernel window onto low physical memory.
const KSEG0: Segment = Segment {
    start: 0xFFFF_FFFF_8000_0000,
    length: 0x2000_0000,
    offset: 0xFFFF_FFFF_8000_0000,
    mapped: false,
    cached: true,
};

/// 512 MiB unmapped uncached kernel window onto low physical memory.
const KSEG1: Segment = Segment {
    start: 0xFFFF_FFFF_A000_0000,
    length: 0x2000_0000,
    offset: 0xFFFF_FFFF_A000_0000,
    mapped: false,
    cached: false,
};

/// 512 MiB supervisor window, TLB-mapped and cached.
const KSSEG: Segment = Segment {
    start: 0xFFFF_FFFF_C000_0000,
    length: 0x2000_0000,
    offset: 0,
    mapped: true,
    cached: true,
};

/// 512 MiB kernel window, TLB-mapped and cached.
const KSEG3: Segment = Segment {
    start: 0xFFFF_FFFF_E000_0000,
    length: 0x2000_0000,
    offset: 0,
    mapped: true,
    cached: true,
};

/// Privilege mode derived from the status register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Kernel,
    Supervisor,
    User,
}

/// Current privilege mode: EXL or ERL force kernel regardless of KSU.
fn mode(status: u64) -> Mode {
    if status & (STATUS_EXL | STATUS_ERL) != 0 {
        return Mode::Kernel;
    }
    match (status & STATUS_KSU_MASK) >> 3 {
        1 => Mode::Supervisor,
        2 => Mode::User,
        _ => Mode::Kernel,
    }
}

/// Looks up the segment containing `va` under the given CP0 status word.
///
/// Returns `None` when the address falls outside every window visible in
/// the current privilege mode; the caller turns that into an address error
/// fault.
pub fn lookup(va: u64, status: u64) -> Option<Segment> {
    let mode = mode(status);

    if KUSEG.contains(va) {
        return Some(KUSEG);
    }
    if mode == Mode::User {
        return None;
    }
    if KSSEG.contains(va) {
        return Some(KSSEG);
    }
    if mode == Mode::Supervisor {
        return None;
    }
    if KSEG0.contains(va) {
        return Some(KSEG0);
    }
    if KSEG1.contains(va) {
        return Some(KSEG1);
    }
    if KSEG3.contains(va) {
        return Some(KSEG3);
    }
    None
}

/// The zero-length seed segment.
///
/// Latches are initialized with this descriptor so their first use falls
/// outside the window and triggers a real lookup.
pub const fn default_segment() -> Segment {
    Segment {
        start: 0,
        length: 0,
        offset: 0,
        mapped: false,
        cached: false,
    }
}
