use crate::common::mocks::memory::LinearMemory;
use vr4300_core::common::constants::SIGNAL_COLD_RESET;
use vr4300_core::common::{PhysAddr, VirtAddr};
use vr4300_core::core::cp0;
use vr4300_core::core::pipeline::latches::CommonLatch;
use vr4300_core::core::units::cache::{DCACHE_LINE_SIZE, ICACHE_LINE_SIZE};
use vr4300_core::core::units::segment;
use vr4300_core::{Config, Vr4300};

/// Base of the unmapped cached kernel window the harness runs programs in.
pub const KSEG0_BASE: u64 = 0xFFFF_FFFF_8000_0000;
/// Base of the unmapped uncached kernel window.
pub const KSEG1_BASE: u64 = 0xFFFF_FFFF_A000_0000;
/// Default program placement.
pub const TEXT_BASE: u64 = KSEG0_BASE + 0x1000;
/// Default data placement, on its own cache lines.
pub const DATA_BASE: u64 = KSEG0_BASE + 0x8000;
/// Bytes of flat RAM behind the bus.
pub const RAM_SIZE: usize = 0x10_0000;

pub struct TestContext {
    pub cpu: Vr4300,
}

impl TestContext {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        // Short memory latencies keep stall arithmetic readable; scenarios
        // that must be stall-free pre-fill the caches instead.
        let mut config = Config::default();
        config.timing.icache_fill = 4;
        config.timing.dcache_fill = 4;
        config.timing.uncached_word = 2;

        let mut cpu = Vr4300::new(Box::new(LinearMemory::new(RAM_SIZE)), &config);
        // The harness jumps straight to a loaded program rather than
        // booting through the reset vector.
        cpu.signals &= !SIGNAL_COLD_RESET;
        Self { cpu }
    }

    /// Writes `instructions` to RAM at `addr` (a kseg0/kseg1 address),
    /// pre-fills the instruction cache so the stream runs stall-free, and
    /// points the fetch stream at it.
    pub fn load_program(&mut self, addr: u64, instructions: &[u32]) {
        for (i, iw) in instructions.iter().enumerate() {
            let pa = Self::phys(addr) + (i as u32) * 4;
            self.cpu.bus.write_word(pa, *iw);
        }
        self.prefill_icache(addr, instructions.len() * 4);
        self.jump_to(addr);
    }

    /// Redirects the fetch stream to `addr`, delivery-style: the first
    /// instruction enters RF on the next tick and IC stamps `addr + 4`.
    pub fn jump_to(&mut self, addr: u64) {
        let status = self.cpu.cp0.regs[cp0::STATUS];
        let Some(seg) = segment::lookup(addr, status) else {
            panic!("jump_to target {addr:#x} is outside every segment");
        };
        let p = &mut self.cpu.pipeline;
        p.icrf.segment = seg;
        p.icrf.common = CommonLatch {
            pc: addr,
            ..CommonLatch::default()
        };
        p.icrf.pc = addr.wrapping_add(4);
    }

    /// Pre-fills instruction cache lines covering `[addr, addr + len)`.
    pub fn prefill_icache(&mut self, addr: u64, len: usize) {
        let line = ICACHE_LINE_SIZE as u64;
        let mut va = addr & !(line - 1);
        while va < addr + len as u64 {
            self.cpu.icache.fill(
                VirtAddr::new(va),
                PhysAddr::new(Self::phys(va)),
                self.cpu.bus.as_mut(),
            );
            va += line;
        }
    }

    /// Pre-fills data cache lines covering `[addr, addr + len)`.
    pub fn prefill_dcache(&mut self, addr: u64, len: usize) {
        let line = DCACHE_LINE_SIZE as u64;
        let mut va = addr & !(line - 1);
        while va < addr + len as u64 {
            let _ = self.cpu.dcache.fill(
                VirtAddr::new(va),
                PhysAddr::new(Self::phys(va)),
                self.cpu.bus.as_mut(),
            );
            va += line;
        }
    }

    /// Physical address behind a kseg0/kseg1 virtual address.
    pub fn phys(addr: u64) -> u32 {
        (addr & 0x1FFF_FFFF) as u32
    }

    /// Runs the core for `ticks` master clock ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            if let Err(e) = self.cpu.cycle() {
                panic!("cycle failed: {e}");
            }
        }
    }

    /// Reads a general-purpose register.
    pub fn reg(&self, idx: usize) -> u64 {
        self.cpu.regs.read(idx)
    }

    /// Writes a general-purpose register.
    pub fn set_reg(&mut self, idx: usize, val: u64) {
        self.cpu.regs.write(idx, val);
    }
}
