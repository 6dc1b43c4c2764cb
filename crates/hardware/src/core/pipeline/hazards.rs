//! Interlock and exception raisers.
//!
//! The stages never mutate the drain bookkeeping directly; when a stage
//! cannot complete it calls one of these raisers and returns "abort".
//! Interlocks perform their bus work immediately (the inter-tick
//! synchronization point), charge a stall, and pick the entry point the
//! slow path re-enters so the same instruction re-runs. Exceptions tag the
//! stage's output latch and let the dead slot travel to writeback for
//! delivery.

use crate::common::constants::SIGNAL_COLD_RESET;
use crate::common::{Fault, PhysAddr, VirtAddr};
use crate::core::Vr4300;
use crate::core::cp0;
use crate::core::pipeline::ResumePoint;
use crate::core::pipeline::latches::{BusRequestKind, CommonLatch, DcWbLatch};

impl Vr4300 {
    /// Charges a stall and picks the slow-path re-entry point.
    fn interlock(&mut self, cycles_to_stall: u64, resume: ResumePoint) {
        self.pipeline.cycles_to_stall = cycles_to_stall;
        self.pipeline.resume = resume;
    }

    /// Marks an exception in flight and restarts the drain counter.
    fn begin_exception(&mut self, fault: Fault, pc: u64) {
        self.pipeline.fault_present = true;
        self.pipeline.exception_history = 0;
        tracing::debug!(fault = %fault, pc, "exception raised");
    }

    /// IADE: IC found no segment for the program counter.
    pub(crate) fn raise_iade(&mut self) {
        let pc = self.pipeline.icrf.common.pc;
        self.cp0.regs[cp0::BAD_VADDR] = pc;
        self.pipeline.icrf.common.fault = Fault::InstructionAddressError;
        self.begin_exception(Fault::InstructionAddressError, pc);
    }

    /// ICB: the fetch missed the instruction cache (or is uncached).
    ///
    /// Cached fetches fill the line and re-enter at RF to re-probe;
    /// uncached fetches read the word directly into the RF/EX latch and
    /// re-enter at IC to complete the decode.
    pub(crate) fn raise_icb(&mut self) {
        let va = self.pipeline.icrf.common.pc;
        let pa = PhysAddr::new(self.pipeline.rfex.paddr);
        self.stats.icache_misses += 1;
        self.pipeline.rfex.common.fault = Fault::InstructionCacheBusy;

        if self.pipeline.icrf.segment.cached {
            self.icache.fill(VirtAddr::new(va), pa, self.bus.as_mut());
            self.interlock(self.timing.icache_fill, ResumePoint::Rf);
        } else {
            self.pipeline.rfex.iw = self.bus.read_word(pa.val() & !3);
            self.interlock(self.timing.uncached_word, ResumePoint::Ic);
        }
    }

    /// LDI: the instruction in EX needs a value still in flight from the
    /// load directly ahead of it.
    ///
    /// The request in the EX/DC latch has already been consumed by DC this
    /// tick; clearing it keeps the re-run from interlocking again.
    pub(crate) fn raise_ldi(&mut self) {
        self.stats.load_interlocks += 1;
        self.pipeline.exdc.common.fault = Fault::LoadDelayInterlock;
        self.pipeline.exdc.request.kind = BusRequestKind::None;
        self.interlock(0, ResumePoint::Ex);
    }

    /// DADE: DC found no segment for the effective address.
    pub(crate) fn raise_dade(&mut self) {
        let exdc = self.pipeline.exdc;
        self.cp0.regs[cp0::BAD_VADDR] = exdc.request.vaddr;
        self.pipeline.dcwb = DcWbLatch {
            common: CommonLatch {
                fault: Fault::DataAddressError,
                ..exdc.common
            },
            dest: 0,
            result: 0,
        };
        self.begin_exception(Fault::DataAddressError, exdc.common.pc);
    }

    /// DCM: the data access missed the cache and needs a block fetch.
    ///
    /// The block transfer (including any victim write-back) happens now;
    /// the pipeline freezes in the data-cache-block state and DC re-runs
    /// against a warm line when the stall drains.
    pub(crate) fn raise_dcm(&mut self, pa: PhysAddr) {
        let vaddr = self.pipeline.exdc.request.vaddr;
        self.stats.dcache_misses += 1;
        self.pipeline.dcwb.common.fault = Fault::DataCacheMiss;
        if self.dcache.fill(VirtAddr::new(vaddr), pa, self.bus.as_mut()) {
            self.stats.dcache_writebacks += 1;
        }
        self.interlock(self.timing.dcache_fill, ResumePoint::DcacheBlock);
    }

    /// DCB: the data access is uncached and goes straight to the bus.
    ///
    /// The transaction completes here, including the read-modify-write a
    /// partial store needs, and the DC/WB slot is finalized, so the
    /// pipeline re-enters at EX once the bus delay drains.
    pub(crate) fn raise_dcb(&mut self, pa: PhysAddr) {
        let req = {
            let mut req = self.pipeline.exdc.request;
            req.paddr = pa.val();
            req
        };
        self.stats.uncached_accesses += 1;
        self.pipeline.dcwb.common.fault = Fault::DataCacheBusy;

        match req.kind {
            BusRequestKind::Read => {
                let raw = if req.two_words {
                    let base = pa.val() & !7;
                    (u64::from(self.bus.read_word(base)) << 32)
                        | u64::from(self.bus.read_word(base + 4))
                } else {
                    let word = self.bus.read_word(pa.val() & !3);
                    let shift = (4 - req.size - (pa.val() & 3)) * 8;
                    u64::from(word >> shift) & (!0u64 >> (64 - req.size * 8))
                };
                let value = (((raw << req.postshift) as i64) >> req.postshift) as u64 & req.dqm;
                self.pipeline.dcwb.result |= value;
            }
            BusRequestKind::Write => {
                if req.two_words {
                    let base = pa.val() & !7;
                    self.bus.write_word(base, (req.data >> 32) as u32);
                    self.bus.write_word(base + 4, req.data as u32);
                } else {
                    let base = pa.val() & !3;
                    let dqm = req.dqm as u32;
                    if dqm == !0u32 {
                        self.bus.write_word(base, req.data as u32);
                    } else {
                        let old = self.bus.read_word(base);
                        self.bus.write_word(base, (old & !dqm) | (req.data as u32 & dqm));
                    }
                }
            }
            BusRequestKind::None => {}
        }

        let words = if req.two_words { 2 } else { 1 };
        self.interlock(self.timing.uncached_word * words, ResumePoint::Ex);
    }

    /// INTR: a masked, enabled interrupt is pending at DC.
    ///
    /// Also invoked from the busy-wait shortcut; in both cases the slot in
    /// the EX/DC latch names the instruction the interrupt lands on.
    pub(crate) fn raise_intr(&mut self) {
        let common = self.pipeline.exdc.common;
        self.pipeline.dcwb = DcWbLatch {
            common: CommonLatch {
                fault: Fault::Interrupt,
                ..common
            },
            dest: 0,
            result: 0,
        };
        self.begin_exception(Fault::Interrupt, common.pc);
    }

    /// RST: the cold reset signal was observed at DC.
    pub(crate) fn raise_rst(&mut self) {
        self.signals &= !SIGNAL_COLD_RESET;
        let common = self.pipeline.exdc.common;
        self.pipeline.dcwb = DcWbLatch {
            common: CommonLatch {
                fault: Fault::ColdReset,
                ..common
            },
            dest: 0,
            result: 0,
        };
        self.begin_exception(Fault::ColdReset, common.pc);
    }
}
