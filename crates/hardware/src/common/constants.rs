//! Shared bit-level constants.
//!
//! Instruction field extraction masks, CP0 status/cause bit positions, and
//! the architectural exception vectors. Kept in one place so the stages, the
//! decoder, and the tests agree on every shift amount.

/// Number of stages in the pipeline (IC, RF, EX, DC, WB).
pub const PIPELINE_DEPTH: u32 = 5;

/// Primary opcode field position (bits 31:26).
pub const OPCODE_SHIFT: u32 = 26;
/// `rs` field position (bits 25:21).
pub const RS_SHIFT: u32 = 21;
/// `rt` field position (bits 20:16).
pub const RT_SHIFT: u32 = 16;
/// `rd` field position (bits 15:11).
pub const RD_SHIFT: u32 = 11;
/// Shift-amount field position (bits 10:6).
pub const SA_SHIFT: u32 = 6;
/// Width mask for all five-bit register/shift fields.
pub const FIELD_MASK: u32 = 0x1F;
/// SPECIAL/REGIMM function field mask (bits 5:0).
pub const FUNCTION_MASK: u32 = 0x3F;

/// Index of the architectural zero register.
pub const REG_ZERO: usize = 0;
/// First slot of the coprocessor-1 bank in the unified register file.
pub const CP1_REG_BASE: usize = 32;
/// Total number of slots in the unified register file.
pub const NUM_REGISTERS: usize = 64;

/// Status register: global interrupt enable.
pub const STATUS_IE: u64 = 1;
/// Status register: exception level.
pub const STATUS_EXL: u64 = 1 << 1;
/// Status register: error level (set by cold reset).
pub const STATUS_ERL: u64 = 1 << 2;
/// Status register: kernel/supervisor/user mode field (bits 4:3).
pub const STATUS_KSU_MASK: u64 = 3 << 3;
/// Status register: boot-time exception vectors.
pub const STATUS_BEV: u64 = 1 << 22;
/// Status register: soft-reset indicator.
pub const STATUS_SR: u64 = 1 << 20;
/// Status register: 32-register CP1 file select.
pub const STATUS_FR: u64 = 1 << 26;

/// Cause register: branch-delay flag (bit 31).
pub const CAUSE_BD: u32 = 1 << 31;
/// Cause register: all eight interrupt-pending bits.
pub const CAUSE_IP_MASK: u64 = 0xFF00;
/// Cause register: timer interrupt pending (IP7, bit 15).
pub const CAUSE_IP7: u64 = 1 << 15;
/// Cause register: exception code field mask (bits 6:2).
pub const CAUSE_EXC_CODE_MASK: u64 = 0x7C;

/// Exception code: interrupt.
pub const EXC_CODE_INTERRUPT: u64 = 0;
/// Exception code: address error on load or instruction fetch.
pub const EXC_CODE_ADDRESS_ERROR: u64 = 4;

/// Cold/soft reset exception vector (uncached kseg1 boot ROM window).
pub const RESET_VECTOR: u64 = 0xFFFF_FFFF_BFC0_0000;
/// General exception vector with `Status.BEV` clear.
pub const GENERAL_VECTOR: u64 = 0xFFFF_FFFF_8000_0180;
/// General exception vector with `Status.BEV` set.
pub const GENERAL_VECTOR_BEV: u64 = 0xFFFF_FFFF_BFC0_0380;

/// External signal: cold reset asserted.
pub const SIGNAL_COLD_RESET: u32 = 1;
