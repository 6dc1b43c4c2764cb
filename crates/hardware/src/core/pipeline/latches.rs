//! Pipeline latch structures for inter-stage communication.
//!
//! This module defines the buffers that connect the five stages of the
//! pipeline. It implements:
//! 1. **Instruction Flow:** One latch per stage boundary (IC/RF, RF/EX,
//!    EX/DC, DC/WB).
//! 2. **Fault Propagation:** A common payload carried forward by every
//!    latch, holding the program counter, the latched fault, and the cause
//!    data word.
//! 3. **Bus Requests:** The decoded memory operation the execute stage
//!    hands to the data cache stage.

use crate::common::Fault;
use crate::core::units::segment::{self, Segment};
use crate::isa::OpcodeRecord;

/// Payload carried forward by every latch.
///
/// The fault is `None` exactly when the producing stage completed cleanly.
/// Bit 31 of `cause_data` records whether the instruction sits in a branch
/// delay slot; delivery folds it into the Cause register.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonLatch {
    /// Virtual program counter of the instruction in this slot.
    pub pc: u64,
    /// Fault latched by the producing stage.
    pub fault: Fault,
    /// Auxiliary cause data; bit 31 is the branch-delay flag.
    pub cause_data: u32,
}

/// IC/RF latch (instruction fetch to register fetch).
#[derive(Clone, Copy, Debug)]
pub struct IcRfLatch {
    /// Common payload of the instruction awaiting register fetch.
    pub common: CommonLatch,
    /// Virtual address of the next fetch.
    pub pc: u64,
    /// Segment the fetch stream is currently executing in.
    ///
    /// Valid only while `pc` stays inside its window; IC re-looks it up
    /// when the stream crosses out.
    pub segment: Segment,
}

impl Default for IcRfLatch {
    fn default() -> Self {
        Self {
            common: CommonLatch::default(),
            pc: 0,
            segment: segment::default_segment(),
        }
    }
}

/// RF/EX latch (register fetch to execute).
#[derive(Clone, Copy, Debug)]
pub struct RfExLatch {
    /// Common payload.
    pub common: CommonLatch,
    /// Raw instruction word fetched from the cache.
    pub iw: u32,
    /// Mask applied when IC completes the decode.
    ///
    /// Zeroed to bury an instruction: the masked word decodes as `SLL
    /// r0, r0, 0`, the architectural no-op. IC restores it to all-ones
    /// after each use.
    pub iw_mask: u32,
    /// Decoded opcode record of the masked word.
    pub opcode: OpcodeRecord,
    /// Physical address recorded for the instruction-cache interlock.
    pub paddr: u32,
}

impl Default for RfExLatch {
    fn default() -> Self {
        Self {
            common: CommonLatch::default(),
            iw: 0,
            iw_mask: !0,
            opcode: OpcodeRecord::default(),
            paddr: 0,
        }
    }
}

/// Kind of memory traffic requested by an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BusRequestKind {
    /// No memory access.
    #[default]
    None,
    /// A load.
    Read,
    /// A store.
    Write,
}

/// A decoded memory operation, populated by the opcode handler in EX.
///
/// The DC stage extracts loads as
/// `value = (((raw << postshift) as i64 >> postshift) as u64) & dqm`,
/// where `raw` is the `size`-byte big-endian datum zero-extended to 64
/// bits: an all-ones `dqm` selects sign extension, a low mask selects zero
/// extension. Stores merge `new = (old & !dqm) | (data & dqm)` at word
/// granularity, with `data` pre-positioned by the handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct BusRequest {
    /// Request kind; `None` for pure register instructions.
    pub kind: BusRequestKind,
    /// Virtual effective address.
    pub vaddr: u64,
    /// Physical address derived by the DC stage.
    pub paddr: u32,
    /// Access size in bytes (1, 2, 4, or 8).
    pub size: u32,
    /// Whether the access spans two 32-bit words of the line.
    pub two_words: bool,
    /// Keep/extend mask (see the struct docs).
    pub dqm: u64,
    /// Sign/zero extension shift for loads.
    pub postshift: u32,
    /// Store payload, positioned within its word.
    pub data: u64,
}

/// EX/DC latch (execute to data cache).
#[derive(Clone, Copy, Debug)]
pub struct ExDcLatch {
    /// Common payload.
    pub common: CommonLatch,
    /// Destination slot in the unified register file.
    pub dest: usize,
    /// Partial result before any cache load merges in.
    pub result: u64,
    /// Segment cached for the data side.
    pub segment: Segment,
    /// Memory operation requested by the opcode handler.
    pub request: BusRequest,
}

impl Default for ExDcLatch {
    fn default() -> Self {
        Self {
            common: CommonLatch::default(),
            dest: 0,
            result: 0,
            segment: segment::default_segment(),
            request: BusRequest::default(),
        }
    }
}

/// DC/WB latch (data cache to writeback).
#[derive(Clone, Copy, Debug, Default)]
pub struct DcWbLatch {
    /// Common payload.
    pub common: CommonLatch,
    /// Destination slot in the unified register file.
    pub dest: usize,
    /// Final result value.
    pub result: u64,
}
