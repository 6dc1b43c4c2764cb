//! Cycle-accurate VR4300 pipeline simulator.
//!
//! This crate implements the execution core of the VR4300, the 64-bit
//! MIPS III processor with a five-stage in-order pipeline, with the
//! following:
//! 1. **Pipeline:** Per-clock advancement of IC, RF, EX, DC, and WB, the
//!    inter-stage latches, interlocks, and exception-driven stage aborts.
//! 2. **Translation:** Segment windows and the joint 32-entry TLB.
//! 3. **Caches:** The 16 KiB instruction and 8 KiB write-back data caches.
//! 4. **ISA:** Decode, opcode records, and the dispatch table the execute
//!    stage drives.
//! 5. **Boundary:** The `SysAd` bus trait the device container implements.
//!
//! The container calls [`Vr4300::cycle`] once per master clock tick;
//! stalls, interlocks, branch delay slots, and exception precedence are
//! all observable at tick granularity.

/// Common types and constants (addresses, faults, registers).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures).
pub mod config;
/// CPU core: machine state, CP0, pipeline, translation, and caches.
pub mod core;
/// Instruction set: decode, opcode records, dispatch, handlers.
pub mod isa;
/// System-on-chip boundary (the SysAD bus trait).
pub mod soc;
/// Simulation statistics collection.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;

/// Latched fault taxonomy and the fatal error type.
pub use crate::common::{Fault, SimError};

/// The machine itself; construct with a bus and a `Config`.
pub use crate::core::Vr4300;

/// The bus trait the device container implements.
pub use crate::soc::SysAd;

/// Run statistics.
pub use crate::stats::SimStats;
