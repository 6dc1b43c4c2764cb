//! Exception precedence, interrupt gating, and drain behavior.

use crate::common::builder::{addiu, eret, mfc0, mtc0, nop};
use crate::common::harness::{KSEG0_BASE, TEXT_BASE, TestContext};
use crate::common::mocks::memory::LinearMemory;
use pretty_assertions::assert_eq;
use vr4300_core::common::constants::{
    CAUSE_IP7, GENERAL_VECTOR, RESET_VECTOR, STATUS_BEV, STATUS_ERL, STATUS_EXL, STATUS_IE,
};
use vr4300_core::core::cp0;
use vr4300_core::{Config, Fault, Vr4300};

/// Unmasks external line 0 (IP2) and enables interrupts globally.
fn enable_int0(tc: &mut TestContext) {
    tc.cpu.cp0.regs[cp0::STATUS] |= STATUS_IE | (1 << 10);
}

#[test]
fn count_compare_sets_ip7_in_the_matching_tick() {
    let mut tc = TestContext::new();
    tc.load_program(TEXT_BASE, &[nop(); 12]);
    let count = tc.cpu.cp0.regs[cp0::COUNT];
    tc.cpu.cp0.regs[cp0::COMPARE] = count + 2;

    // Count advances every second tick, so the match lands on tick 4.
    tc.run(3);
    assert_eq!(tc.cpu.cp0.regs[cp0::CAUSE] & CAUSE_IP7, 0);
    tc.run(1);
    assert_ne!(
        tc.cpu.cp0.regs[cp0::CAUSE] & CAUSE_IP7,
        0,
        "IP7 in the tick Count reaches Compare"
    );
}

#[test]
fn writing_compare_acknowledges_the_timer() {
    let mut tc = TestContext::new();
    tc.cpu.cp0.regs[cp0::CAUSE] |= CAUSE_IP7;
    tc.set_reg(1, 0x100);
    tc.load_program(TEXT_BASE, &[mtc0(1, cp0::COMPARE as u32), nop(), nop(), nop()]);
    tc.run(9);
    assert_eq!(tc.cpu.cp0.regs[cp0::CAUSE] & CAUSE_IP7, 0, "IP7 cleared");
    assert_eq!(tc.cpu.cp0.regs[cp0::COMPARE], 0x100);
}

#[test]
fn pending_interrupt_is_delivered_on_the_next_dc_tick() {
    let mut tc = TestContext::new();
    tc.load_program(TEXT_BASE, &[nop(); 10]);
    enable_int0(&mut tc);
    tc.cpu.assert_interrupt(0);
    tc.run(3);
    assert!(tc.cpu.pipeline.fault_present, "interrupt raised at DC");
    tc.run(1);
    assert_eq!(tc.cpu.stats.exceptions, 1, "delivered at WB");
    assert_ne!(
        tc.cpu.cp0.regs[cp0::STATUS] & STATUS_EXL,
        0,
        "EXL set by delivery"
    );
}

#[test]
fn exl_blocks_interrupt_delivery() {
    let mut tc = TestContext::new();
    tc.load_program(TEXT_BASE, &[nop(); 10]);
    enable_int0(&mut tc);
    tc.cpu.cp0.regs[cp0::STATUS] |= STATUS_EXL;
    tc.cpu.assert_interrupt(0);
    tc.run(10);
    assert_eq!(tc.cpu.stats.exceptions, 0, "EXL masks interrupts");
}

#[test]
fn erl_blocks_interrupt_delivery() {
    let mut tc = TestContext::new();
    tc.load_program(TEXT_BASE, &[nop(); 10]);
    enable_int0(&mut tc);
    tc.cpu.cp0.regs[cp0::STATUS] |= STATUS_ERL;
    tc.cpu.assert_interrupt(0);
    tc.run(10);
    assert_eq!(tc.cpu.stats.exceptions, 0, "ERL masks interrupts");
}

#[test]
fn ie_clear_blocks_interrupt_delivery() {
    let mut tc = TestContext::new();
    tc.load_program(TEXT_BASE, &[nop(); 10]);
    tc.cpu.cp0.regs[cp0::STATUS] |= 1 << 10; // unmasked but globally disabled
    tc.cpu.assert_interrupt(0);
    tc.run(10);
    assert_eq!(tc.cpu.stats.exceptions, 0);
}

#[test]
fn interrupt_completes_older_instructions_and_kills_younger_ones() {
    let mut tc = TestContext::new();
    tc.load_program(
        TEXT_BASE,
        &[
            addiu(1, 0, 1),
            addiu(2, 0, 2),
            addiu(3, 0, 3),
            addiu(4, 0, 4),
            addiu(5, 0, 5),
            nop(),
            nop(),
        ],
    );
    // Let the first two retire, then post the interrupt: the next DC tick
    // lands on the third instruction.
    tc.run(5);
    enable_int0(&mut tc);
    tc.cpu.assert_interrupt(0);
    tc.run(10);

    assert_eq!(tc.reg(1), 1, "downstream instruction completed");
    assert_eq!(tc.reg(2), 2, "downstream instruction completed");
    assert_eq!(tc.reg(4), 0, "upstream instruction killed");
    assert_eq!(tc.reg(5), 0, "upstream instruction killed");
    assert_eq!(tc.cpu.stats.exceptions, 1);
    let epc = tc.cpu.cp0.regs[cp0::EPC];
    assert!(
        epc >= TEXT_BASE && epc < TEXT_BASE + 0x1C,
        "EPC names an instruction of the interrupted stream: {epc:#x}"
    );
}

#[test]
fn fast_path_reengages_after_depth_plus_one_clean_ticks() {
    let mut tc = TestContext::new();
    tc.load_program(TEXT_BASE, &[nop(); 10]);
    // Warm the exception vector so the drain is not interleaved with
    // fill stalls.
    let vector = GENERAL_VECTOR;
    assert_eq!(vector, KSEG0_BASE + 0x180);
    tc.prefill_icache(vector, 0x40);

    enable_int0(&mut tc);
    tc.cpu.assert_interrupt(0);

    // Walk up to the tick the fault is raised on.
    let mut guard = 0;
    while !tc.cpu.pipeline.fault_present {
        tc.run(1);
        guard += 1;
        assert!(guard < 10, "interrupt never raised");
    }

    // Exactly pipeline depth + 1 slow ticks later the fast path returns.
    let mut slow_ticks = 0;
    while tc.cpu.pipeline.fault_present {
        tc.run(1);
        slow_ticks += 1;
        assert!(slow_ticks < 20, "pipeline never drained");
    }
    assert_eq!(slow_ticks, 6, "depth + 1 fault-free ticks to re-engage");
    assert_eq!(tc.cpu.stats.exceptions, 1);
}

#[test]
fn eret_returns_to_epc_without_a_delay_slot() {
    let mut tc = TestContext::new();
    let resume = TEXT_BASE + 0x40;
    tc.cpu
        .bus
        .write_word(TestContext::phys(resume), addiu(9, 0, 6));
    tc.prefill_icache(resume, 0x10);
    tc.cpu.cp0.regs[cp0::STATUS] |= STATUS_EXL;
    tc.cpu.cp0.regs[cp0::EPC] = resume;
    tc.load_program(TEXT_BASE, &[eret(), addiu(8, 0, 1), nop(), nop()]);
    tc.run(14);
    assert_eq!(tc.cpu.cp0.regs[cp0::STATUS] & STATUS_EXL, 0, "EXL cleared");
    assert_eq!(tc.reg(8), 0, "the slot after ERET is buried, not executed");
    assert_eq!(tc.reg(9), 6, "stream resumed at EPC");
}

#[test]
fn mfc0_reads_the_register_block() {
    let mut tc = TestContext::new();
    tc.cpu.cp0.regs[cp0::BAD_VADDR] = 0x1234_5678;
    tc.load_program(
        TEXT_BASE,
        &[mfc0(7, cp0::BAD_VADDR as u32), nop(), nop(), nop()],
    );
    tc.run(9);
    assert_eq!(tc.reg(7), 0x1234_5678);
}

#[test]
fn cold_reset_vectors_to_the_boot_window() {
    let config = Config::default();
    let mut cpu = Vr4300::new(Box::new(LinearMemory::new(0x1000)), &config);
    // Vr4300::new asserts the reset signal; the first DC tick raises the
    // fault and the next tick delivers it.
    for _ in 0..2 {
        if let Err(e) = cpu.cycle() {
            panic!("cycle failed: {e}");
        }
    }
    assert_eq!(cpu.stats.exceptions, 1, "reset delivered");
    assert_ne!(cpu.cp0.regs[cp0::STATUS] & STATUS_ERL, 0, "ERL set");
    assert_ne!(cpu.cp0.regs[cp0::STATUS] & STATUS_BEV, 0, "BEV set");
    assert_eq!(cpu.pipeline.icrf.common.pc, RESET_VECTOR);
}

#[test]
fn reset_outranks_a_pending_interrupt() {
    let mut tc = TestContext::new();
    tc.load_program(TEXT_BASE, &[nop(); 8]);
    enable_int0(&mut tc);
    tc.cpu.assert_interrupt(0);
    tc.cpu.reset();
    tc.run(2);
    assert_eq!(
        tc.cpu.pipeline.dcwb.common.fault,
        Fault::None,
        "reset slot already delivered"
    );
    assert_ne!(tc.cpu.cp0.regs[cp0::STATUS] & STATUS_ERL, 0, "reset won");
}
