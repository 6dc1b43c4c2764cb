//! Branch, delay slot, and busy-wait tests.

use crate::common::builder::{addiu, beq, bgez, bgtz, blez, bltz, bne, j, jal, jalr, jr, nop};
use crate::common::harness::{TEXT_BASE, TestContext};
use pretty_assertions::assert_eq;
use vr4300_core::common::constants::CAUSE_BD;
use vr4300_core::core::pipeline::ResumePoint;

/// Runs a conditional branch over two landing pads with r1 = `rs_value`
/// and reports the (delay slot, fall-through, target) registers.
///
/// The branch offset of +2 targets the fourth word, so a taken branch
/// yields (1, 0, 3) and a fall-through yields (1, 2, 3).
fn run_branch(branch: u32, rs_value: u64) -> (u64, u64, u64) {
    let mut tc = TestContext::new();
    tc.set_reg(1, rs_value);
    tc.load_program(
        TEXT_BASE,
        &[
            branch,
            addiu(4, 0, 1), // delay slot
            addiu(5, 0, 2), // fall-through
            addiu(6, 0, 3), // target
            nop(),
            nop(),
            nop(),
        ],
    );
    tc.run(14);
    (tc.reg(4), tc.reg(5), tc.reg(6))
}

#[test]
fn taken_branch_executes_delay_slot_and_skips_fall_through() {
    let mut tc = TestContext::new();
    // beq +2 from the slot after the delay slot: the target is the fourth
    // word, so the third (fall-through) is never fetched.
    tc.load_program(
        TEXT_BASE,
        &[
            beq(0, 0, 2),
            addiu(4, 0, 1), // delay slot: executes
            addiu(5, 0, 2), // fall-through: skipped
            addiu(6, 0, 3), // target
            nop(),
            nop(),
            nop(),
        ],
    );
    tc.run(12);
    assert_eq!(tc.reg(4), 1, "delay slot executed");
    assert_eq!(tc.reg(5), 0, "fall-through skipped");
    assert_eq!(tc.reg(6), 3, "target executed");
}

#[test]
fn not_taken_branch_falls_through() {
    let mut tc = TestContext::new();
    tc.set_reg(1, 7);
    tc.load_program(
        TEXT_BASE,
        &[beq(1, 0, 2), addiu(4, 0, 1), addiu(5, 0, 2), nop(), nop(), nop()],
    );
    tc.run(12);
    assert_eq!(tc.reg(4), 1);
    assert_eq!(tc.reg(5), 2, "not-taken branch falls through");
}

#[test]
fn slot_after_branch_is_stamped_with_the_delay_flag() {
    let mut tc = TestContext::new();
    tc.load_program(TEXT_BASE, &[nop(), bne(0, 1, 2), nop(), nop(), nop()]);
    // Tick 2 is when RF fetches the branch and IC decodes it, stamping
    // the fresh slot as its delay slot.
    tc.run(1);
    assert_eq!(tc.cpu.pipeline.icrf.common.cause_data & CAUSE_BD, 0);
    tc.run(1);
    assert_ne!(
        tc.cpu.pipeline.icrf.common.cause_data & CAUSE_BD,
        0,
        "branch-delay flag on the slot after a branch"
    );
}

#[test]
fn jal_links_past_the_delay_slot() {
    let mut tc = TestContext::new();
    let target = TEXT_BASE + 0x40;
    for (i, iw) in [addiu(7, 0, 9), nop(), nop()].iter().enumerate() {
        tc.cpu
            .bus
            .write_word(TestContext::phys(target) + (i as u32) * 4, *iw);
    }
    tc.prefill_icache(target, 0x20);
    tc.load_program(TEXT_BASE, &[jal(target), nop(), nop(), nop()]);
    tc.run(14);
    assert_eq!(tc.reg(31), TEXT_BASE + 8, "link register");
    assert_eq!(tc.reg(7), 9, "jump target reached");
}

#[test]
fn bltz_takes_only_on_a_negative_operand() {
    assert_eq!(run_branch(bltz(1, 2), (-1i64) as u64), (1, 0, 3), "taken");
    assert_eq!(run_branch(bltz(1, 2), 1), (1, 2, 3), "fell through");
}

#[test]
fn bgez_takes_on_zero_and_positive_operands() {
    assert_eq!(run_branch(bgez(1, 2), 0), (1, 0, 3), "taken on zero");
    assert_eq!(run_branch(bgez(1, 2), (-5i64) as u64), (1, 2, 3), "fell through");
}

#[test]
fn blez_takes_on_zero_and_negative_operands() {
    assert_eq!(run_branch(blez(1, 2), 0), (1, 0, 3), "taken on zero");
    assert_eq!(
        run_branch(blez(1, 2), (-9i64) as u64),
        (1, 0, 3),
        "taken on negative"
    );
    assert_eq!(run_branch(blez(1, 2), 1), (1, 2, 3), "fell through");
}

#[test]
fn bgtz_takes_only_on_a_positive_operand() {
    assert_eq!(run_branch(bgtz(1, 2), 5), (1, 0, 3), "taken");
    assert_eq!(run_branch(bgtz(1, 2), 0), (1, 2, 3), "fell through on zero");
}

#[test]
fn plain_jump_redirects_past_the_fall_through() {
    let mut tc = TestContext::new();
    // The target is the fifth word; the third is never fetched.
    tc.load_program(
        TEXT_BASE,
        &[
            j(TEXT_BASE + 0x10),
            addiu(4, 0, 1), // delay slot
            addiu(5, 0, 2), // skipped
            nop(),
            addiu(6, 0, 3), // target
            nop(),
            nop(),
        ],
    );
    tc.run(14);
    assert_eq!(tc.reg(4), 1, "delay slot executed");
    assert_eq!(tc.reg(5), 0, "fall-through skipped");
    assert_eq!(tc.reg(6), 3, "target executed");
}

#[test]
fn jalr_links_through_rd_and_jumps_through_rs() {
    let mut tc = TestContext::new();
    let target = TEXT_BASE + 0x60;
    tc.set_reg(2, target);
    tc.cpu
        .bus
        .write_word(TestContext::phys(target), addiu(9, 0, 5));
    tc.prefill_icache(target, 0x10);
    tc.load_program(TEXT_BASE, &[jalr(30, 2), nop(), nop(), nop()]);
    tc.run(12);
    assert_eq!(tc.reg(30), TEXT_BASE + 8, "link lands in the named rd");
    assert_eq!(tc.reg(9), 5, "jump target reached");
}

#[test]
fn jr_returns_through_a_register() {
    let mut tc = TestContext::new();
    tc.set_reg(2, TEXT_BASE + 0x20);
    tc.cpu
        .bus
        .write_word(TestContext::phys(TEXT_BASE + 0x20), addiu(8, 0, 4));
    tc.prefill_icache(TEXT_BASE + 0x20, 0x10);
    tc.load_program(TEXT_BASE, &[jr(2), nop(), nop(), nop()]);
    tc.run(12);
    assert_eq!(tc.reg(8), 4);
}

#[test]
fn busy_wait_freezes_the_latches_and_keeps_counting() {
    let mut tc = TestContext::new();
    // beq r0, r0, -1: the canonical idle loop.
    tc.load_program(TEXT_BASE, &[beq(0, 0, 0xFFFF), nop(), nop()]);
    tc.run(6);
    assert_eq!(
        tc.cpu.pipeline.resume,
        ResumePoint::BusyWait,
        "idle loop detected"
    );
    let frozen_pc = tc.cpu.pipeline.icrf.pc;
    let cycles_before = tc.cpu.cycles;

    tc.run(1000);
    assert_eq!(tc.cpu.cycles, cycles_before + 1000, "cycle counter advances");
    assert_eq!(tc.cpu.pipeline.resume, ResumePoint::BusyWait);
    assert_eq!(tc.cpu.pipeline.icrf.pc, frozen_pc, "latches frozen");
    assert!(tc.cpu.stats.busy_wait_cycles >= 1000);
}
