//! The VR4300 machine state.
//!
//! This module defines the central `Vr4300` structure, which owns:
//! 1. **Architectural State:** The unified register file and CP0.
//! 2. **Pipeline State:** The four latches and drain bookkeeping.
//! 3. **Memory Hierarchy:** Both caches, the TLB (inside CP0), and the
//!    SysAD bus handle.
//!
//! The machine advances one master clock tick per [`Vr4300::cycle`] call;
//! everything else (DMA, device timing, interrupt wiring) lives in the
//! container that owns the bus implementation.

use std::fmt;

use crate::common::constants::SIGNAL_COLD_RESET;
use crate::common::{RegisterFile, SimError};
use crate::config::{Config, TimingConfig};
use crate::core::cp0::{self, Cp0};
use crate::core::pipeline::{Pipeline, driver};
use crate::core::units::cache::{DCache, ICache};
use crate::soc::SysAd;
use crate::stats::SimStats;

/// The VR4300 core: architectural state, pipeline latches, and caches.
pub struct Vr4300 {
    /// Unified general-purpose and coprocessor-1 register file.
    pub regs: RegisterFile,
    /// Coprocessor 0 (system control registers and the TLB).
    pub cp0: Cp0,
    /// Pipeline latches and drain bookkeeping.
    pub pipeline: Pipeline,
    /// 16 KiB instruction cache.
    pub icache: ICache,
    /// 8 KiB write-back data cache.
    pub dcache: DCache,
    /// The SysAD bus, supplied by the device container.
    pub bus: Box<dyn SysAd>,
    /// External signal lines (cold reset).
    pub signals: u32,
    /// Master clock ticks elapsed.
    pub cycles: u64,
    /// Per-stage trace output to stderr.
    pub trace: bool,
    /// Memory hierarchy timing.
    pub timing: TimingConfig,
    /// Run statistics.
    pub stats: SimStats,
}

impl fmt::Debug for Vr4300 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vr4300")
            .field("pc", &self.pipeline.icrf.pc)
            .field("cycles", &self.cycles)
            .field("fault_present", &self.pipeline.fault_present)
            .field("resume", &self.pipeline.resume)
            .finish_non_exhaustive()
    }
}

impl Vr4300 {
    /// Creates a core wired to `bus` and asserts the cold reset signal.
    ///
    /// The first data cache tick observes the signal and raises the reset
    /// exception, which vectors the fetch stream to the boot ROM window.
    pub fn new(bus: Box<dyn SysAd>, config: &Config) -> Self {
        let mut cpu = Self {
            regs: RegisterFile::new(),
            cp0: Cp0::new(),
            pipeline: Pipeline::default(),
            icache: ICache::new(),
            dcache: DCache::new(),
            bus,
            signals: 0,
            cycles: 0,
            trace: config.general.trace_stages,
            timing: config.timing,
            stats: SimStats::default(),
        };
        cpu.reset();
        cpu
    }

    /// Resets the pipeline and re-asserts the cold reset signal.
    ///
    /// Architectural register and cache contents are left as-is, matching
    /// the undefined-at-reset hardware behavior; CP0's reset state is
    /// applied when the reset exception is delivered.
    pub fn reset(&mut self) {
        self.pipeline.reset();
        self.signals |= SIGNAL_COLD_RESET;
    }

    /// Advances the machine by one master clock tick.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] on an internal invariant violation (a TLB
    /// miss inside a mapped segment). The machine state is not meaningful
    /// afterwards; stop driving ticks.
    #[inline]
    pub fn cycle(&mut self) -> Result<(), SimError> {
        driver::cycle(self)
    }

    /// Asserts external interrupt line `line` (0-4, mapping to IP2-IP6).
    pub fn assert_interrupt(&mut self, line: usize) {
        debug_assert!(line < 5);
        self.cp0.regs[cp0::CAUSE] |= 1 << (10 + line);
    }

    /// Deasserts external interrupt line `line` (0-4, mapping to IP2-IP6).
    pub fn deassert_interrupt(&mut self, line: usize) {
        debug_assert!(line < 5);
        self.cp0.regs[cp0::CAUSE] &= !(1 << (10 + line));
    }
}
