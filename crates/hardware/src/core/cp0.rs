//! Coprocessor 0: system control registers and the TLB.
//!
//! This module owns the architectural CP0 state the pipeline reads and
//! writes:
//! 1. **Register Block:** A dense array with named indices.
//! 2. **Interrupt Predicate:** The masked-and-pending test the DC stage and
//!    the busy-wait shortcut sample.
//! 3. **Exception Commit:** `take_exception`, the single authority for EPC,
//!    Cause, Status, and vector selection when writeback delivers a fault.

use crate::common::Fault;
use crate::common::constants::{
    CAUSE_BD, CAUSE_EXC_CODE_MASK, CAUSE_IP7, CAUSE_IP_MASK, GENERAL_VECTOR, GENERAL_VECTOR_BEV,
    RESET_VECTOR, STATUS_BEV, STATUS_ERL, STATUS_EXL, STATUS_IE,
};
use crate::core::units::tlb::Tlb;

/// Number of CP0 register slots.
pub const NUM_CP0_REGISTERS: usize = 32;

/// `Index` register.
pub const INDEX: usize = 0;
/// `Random` register.
pub const RANDOM: usize = 1;
/// `EntryLo0` register.
pub const ENTRY_LO0: usize = 2;
/// `EntryLo1` register.
pub const ENTRY_LO1: usize = 3;
/// `Context` register.
pub const CONTEXT: usize = 4;
/// `PageMask` register.
pub const PAGE_MASK: usize = 5;
/// `Wired` register.
pub const WIRED: usize = 6;
/// `BadVAddr` register.
pub const BAD_VADDR: usize = 8;
/// `Count` register.
pub const COUNT: usize = 9;
/// `EntryHi` register (VPN2 and ASID).
pub const ENTRY_HI: usize = 10;
/// `Compare` register.
pub const COMPARE: usize = 11;
/// `Status` register.
pub const STATUS: usize = 12;
/// `Cause` register.
pub const CAUSE: usize = 13;
/// `EPC` register.
pub const EPC: usize = 14;
/// `PRId` register.
pub const PR_ID: usize = 15;
/// `Config` register.
pub const CONFIG: usize = 16;
/// `ErrorEPC` register.
pub const ERROR_EPC: usize = 30;

/// Processor revision identifier reported in `PRId`.
const PR_ID_VR4300: u64 = 0x0B22;

/// Coprocessor 0 state.
#[derive(Clone, Debug, Default)]
pub struct Cp0 {
    /// Dense register block indexed by the constants in this module.
    pub regs: [u64; NUM_CP0_REGISTERS],
    /// Joint instruction/data TLB.
    pub tlb: Tlb,
}

impl Cp0 {
    /// Creates the CP0 block in its pre-reset state.
    ///
    /// The architectural reset values (Status.ERL, the BEV bit, ErrorEPC)
    /// are applied by the cold-reset exception the pipeline raises on its
    /// first DC tick, not here.
    pub fn new() -> Self {
        let mut cp0 = Self::default();
        cp0.regs[PR_ID] = PR_ID_VR4300;
        cp0
    }

    /// Reads a CP0 register for `MFC0`.
    #[inline]
    pub const fn read_reg(&self, idx: usize) -> u64 {
        self.regs[idx]
    }

    /// Writes a CP0 register for `MTC0`, applying register side effects.
    ///
    /// Writing `Compare` acknowledges a pending timer interrupt by clearing
    /// Cause.IP7.
    pub const fn write_reg(&mut self, idx: usize, val: u64) {
        if idx == COMPARE {
            self.regs[CAUSE] &= !CAUSE_IP7;
        }
        self.regs[idx] = val;
    }

    /// The ASID field of `EntryHi`, used by TLB matching.
    #[inline]
    pub const fn asid(&self) -> u8 {
        (self.regs[ENTRY_HI] & 0xFF) as u8
    }

    /// Whether a masked, enabled interrupt is pending.
    ///
    /// True when some IP bit is both pending in Cause and unmasked in
    /// Status, interrupts are globally enabled, and neither EXL nor ERL is
    /// set.
    #[inline]
    pub const fn interrupt_pending(&self) -> bool {
        let status = self.regs[STATUS];
        (self.regs[CAUSE] & status & CAUSE_IP_MASK) != 0
            && (status & STATUS_IE) != 0
            && (status & (STATUS_EXL | STATUS_ERL)) == 0
    }

    /// Advances `Count` by one and raises the timer interrupt on match.
    ///
    /// The driver calls this every second master clock tick. The compare
    /// bit is set in the same tick the counter reaches `Compare`.
    pub fn increment_count(&mut self) {
        let count = (self.regs[COUNT] as u32).wrapping_add(1);
        self.regs[COUNT] = u64::from(count);
        if count == self.regs[COMPARE] as u32 {
            self.regs[CAUSE] |= CAUSE_IP7;
        }
    }

    /// Commits an exception delivered by the writeback stage.
    ///
    /// Updates EPC (or ErrorEPC for a cold reset), the Cause code and
    /// branch-delay bit, and the Status level bits, then returns the vector
    /// the fetch stream must restart from.
    pub fn take_exception(&mut self, fault: Fault, pc: u64, cause_data: u32) -> u64 {
        if matches!(fault, Fault::ColdReset) {
            self.regs[ERROR_EPC] = pc;
            self.regs[STATUS] |= STATUS_ERL | STATUS_BEV;
            return RESET_VECTOR;
        }

        let in_delay_slot = cause_data & CAUSE_BD != 0;
        if self.regs[STATUS] & STATUS_EXL == 0 {
            self.regs[EPC] = if in_delay_slot {
                pc.wrapping_sub(4)
            } else {
                pc
            };
            let mut cause = self.regs[CAUSE] & !(CAUSE_EXC_CODE_MASK | u64::from(CAUSE_BD));
            cause |= fault.exception_code() << 2;
            if in_delay_slot {
                cause |= u64::from(CAUSE_BD);
            }
            self.regs[CAUSE] = cause;
        }
        self.regs[STATUS] |= STATUS_EXL;

        if self.regs[STATUS] & STATUS_BEV != 0 {
            GENERAL_VECTOR_BEV
        } else {
            GENERAL_VECTOR
        }
    }
}
