//! Direct-mapped instruction and data caches.
//!
//! This module implements the VR4300's two on-chip caches:
//! 1. **Instruction cache:** 16 KiB, 32-byte lines, read-only from the
//!    pipeline's point of view.
//! 2. **Data cache:** 8 KiB, 16-byte lines, write-back with a dirty bit.
//!
//! Both are virtually indexed and physically tagged. Line data is stored as
//! a big-endian byte image addressed by the low physical address bits, so
//! word extraction and merging match what the SysAD bus carries.

use crate::common::{PhysAddr, VirtAddr};
use crate::soc::SysAd;

/// Instruction cache line size in bytes.
pub const ICACHE_LINE_SIZE: usize = 32;
/// Number of instruction cache lines (16 KiB total).
pub const ICACHE_LINES: usize = 512;
/// Data cache line size in bytes.
pub const DCACHE_LINE_SIZE: usize = 16;
/// Number of data cache lines (8 KiB total).
pub const DCACHE_LINES: usize = 512;

/// One instruction cache line.
#[derive(Clone, Copy, Debug)]
pub struct ICacheLine {
    /// Physical line address (`pa >> 5`).
    tag: u32,
    valid: bool,
    /// Big-endian byte image of the line.
    pub data: [u8; ICACHE_LINE_SIZE],
}

/// One data cache line.
#[derive(Clone, Copy, Debug)]
pub struct DCacheLine {
    /// Physical line address (`pa >> 4`).
    tag: u32,
    valid: bool,
    dirty: bool,
    /// Big-endian byte image of the line.
    pub data: [u8; DCACHE_LINE_SIZE],
}

impl DCacheLine {
    /// Marks the line dirty; it will be written back on eviction.
    #[inline]
    pub const fn set_dirty(&mut self) {
        self.dirty = true;
    }

    /// Reads an aligned big-endian word from the line.
    #[inline]
    pub fn read_word(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Writes an aligned big-endian word into the line.
    #[inline]
    pub fn write_word(&mut self, offset: usize, word: u32) {
        self.data[offset..offset + 4].copy_from_slice(&word.to_be_bytes());
    }

    /// Reads a `size`-byte big-endian datum at `offset`, zero-extended.
    pub fn read_bytes(&self, offset: usize, size: usize) -> u64 {
        let mut value = 0u64;
        for byte in &self.data[offset..offset + size] {
            value = (value << 8) | u64::from(*byte);
        }
        value
    }
}

impl ICacheLine {
    /// Reads the aligned big-endian instruction word at `offset`.
    #[inline]
    pub fn read_word(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }
}

/// The instruction cache.
#[derive(Clone, Debug)]
pub struct ICache {
    lines: Vec<ICacheLine>,
}

impl Default for ICache {
    fn default() -> Self {
        Self::new()
    }
}

impl ICache {
    /// Creates an instruction cache with every line invalid.
    pub fn new() -> Self {
        Self {
            lines: vec![
                ICacheLine {
                    tag: 0,
                    valid: false,
                    data: [0; ICACHE_LINE_SIZE],
                };
                ICACHE_LINES
            ],
        }
    }

    /// Line index selected by the virtual address.
    #[inline]
    const fn index(va: VirtAddr) -> usize {
        (va.val() as usize >> 5) & (ICACHE_LINES - 1)
    }

    /// Probes for the line containing `(va, pa)`.
    pub fn probe(&self, va: VirtAddr, pa: PhysAddr) -> Option<&ICacheLine> {
        let line = &self.lines[Self::index(va)];
        (line.valid && line.tag == pa.val() >> 5).then_some(line)
    }

    /// Fills the line for `(va, pa)` with eight words from the bus.
    ///
    /// Called from the instruction-cache-busy interlock at the inter-tick
    /// synchronization point.
    pub fn fill(&mut self, va: VirtAddr, pa: PhysAddr, bus: &mut dyn SysAd) {
        let base = pa.val() & !(ICACHE_LINE_SIZE as u32 - 1);
        let line = &mut self.lines[Self::index(va)];
        for word in 0..ICACHE_LINE_SIZE / 4 {
            let data = bus.read_word(base + (word as u32) * 4);
            line.data[word * 4..word * 4 + 4].copy_from_slice(&data.to_be_bytes());
        }
        line.tag = pa.val() >> 5;
        line.valid = true;
    }
}

/// The write-back data cache.
#[derive(Clone, Debug)]
pub struct DCache {
    lines: Vec<DCacheLine>,
}

impl Default for DCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DCache {
    /// Creates a data cache with every line invalid.
    pub fn new() -> Self {
        Self {
            lines: vec![
                DCacheLine {
                    tag: 0,
                    valid: false,
                    dirty: false,
                    data: [0; DCACHE_LINE_SIZE],
                };
                DCACHE_LINES
            ],
        }
    }

    /// Line index selected by the virtual address.
    #[inline]
    const fn index(va: VirtAddr) -> usize {
        (va.val() as usize >> 4) & (DCACHE_LINES - 1)
    }

    /// Probes for the line containing `(va, pa)`.
    pub fn probe(&mut self, va: VirtAddr, pa: PhysAddr) -> Option<&mut DCacheLine> {
        let line = &mut self.lines[Self::index(va)];
        (line.valid && line.tag == pa.val() >> 4).then_some(line)
    }

    /// Fetches the block for `(va, pa)`, writing back a dirty victim first.
    ///
    /// Returns `true` when a write-back was performed, so the caller can
    /// account for it. Called from the data-cache-miss interlock at the
    /// inter-tick synchronization point.
    pub fn fill(&mut self, va: VirtAddr, pa: PhysAddr, bus: &mut dyn SysAd) -> bool {
        let line = &mut self.lines[Self::index(va)];

        let wrote_back = line.valid && line.dirty;
        if wrote_back {
            let victim_base = line.tag << 4;
            for word in 0..DCACHE_LINE_SIZE / 4 {
                bus.write_word(victim_base + (word as u32) * 4, line.read_word(word * 4));
            }
        }

        let base = pa.val() & !(DCACHE_LINE_SIZE as u32 - 1);
        for word in 0..DCACHE_LINE_SIZE / 4 {
            let data = bus.read_word(base + (word as u32) * 4);
            line.data[word * 4..word * 4 + 4].copy_from_slice(&data.to_be_bytes());
        }
        line.tag = pa.val() >> 4;
        line.valid = true;
        line.dirty = false;
        wrote_back
    }

    /// Writes every dirty line back to the bus and marks it clean.
    ///
    /// The device container uses this at synchronization points that demand
    /// coherence (DMA engines reading from RDRAM).
    pub fn write_back_all(&mut self, bus: &mut dyn SysAd) {
        for line in &mut self.lines {
            if line.valid && line.dirty {
                let base = line.tag << 4;
                for word in 0..DCACHE_LINE_SIZE / 4 {
                    bus.write_word(base + (word as u32) * 4, line.read_word(word * 4));
                }
                line.dirty = false;
            }
        }
    }
}
