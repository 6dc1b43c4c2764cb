//! Opcode handler cells and the dispatch table.
//!
//! Each cell receives the narrow [`ExecuteCtx`] view of the machine plus
//! the raw instruction word and the two operand values the execute stage
//! read for it. A cell's whole job is to populate the EX/DC latch (result,
//! destination, bus request), steer the fetch stream for branches, and
//! apply any CP0 side effects. Cells return `true` to stall the execute
//! stage; nothing in this table does.

use crate::common::constants::{
    CP1_REG_BASE, FIELD_MASK, RD_SHIFT, RS_SHIFT, RT_SHIFT, SA_SHIFT, STATUS_ERL, STATUS_EXL,
    STATUS_FR,
};
use crate::core::cp0::{self, Cp0};
use crate::core::pipeline::ResumePoint;
use crate::core::pipeline::latches::{BusRequest, BusRequestKind, ExDcLatch};

use super::decode::OPCODE_COUNT;

/// The narrow view of the machine an opcode cell is allowed to touch.
#[derive(Debug)]
pub struct ExecuteCtx<'a> {
    /// The EX/DC latch the cell populates.
    pub exdc: &'a mut ExDcLatch,
    /// The next-fetch program counter; branches redirect it so the slot
    /// after the delay slot comes from the target.
    pub next_pc: &'a mut u64,
    /// The RF/EX instruction word mask; zeroing it buries the in-flight
    /// successor (`ERET` has no delay slot).
    pub iw_mask: &'a mut u32,
    /// The driver resume point; the idle-loop detector parks it.
    pub resume: &'a mut ResumePoint,
    /// Coprocessor 0, for the move and return cells.
    pub cp0: &'a mut Cp0,
}

/// An opcode dispatch cell.
pub type OpcodeFn = fn(&mut ExecuteCtx<'_>, u32, u64, u64) -> bool;

#[inline(always)]
fn rt_index(iw: u32) -> usize {
    ((iw >> RT_SHIFT) & FIELD_MASK) as usize
}

#[inline(always)]
fn rd_index(iw: u32) -> usize {
    ((iw >> RD_SHIFT) & FIELD_MASK) as usize
}

#[inline(always)]
fn sa(iw: u32) -> u32 {
    (iw >> SA_SHIFT) & FIELD_MASK
}

/// Sign-extended 16-bit immediate.
#[inline(always)]
fn imm_sx(iw: u32) -> u64 {
    iw as u16 as i16 as i64 as u64
}

/// Zero-extended 16-bit immediate.
#[inline(always)]
fn imm_zx(iw: u32) -> u64 {
    u64::from(iw as u16)
}

/// Sign-extend a 32-bit result to register width.
#[inline(always)]
fn sx32(value: u64) -> u64 {
    value as u32 as i32 as i64 as u64
}

/// Branch target: delay slot address plus the shifted offset.
#[inline(always)]
fn branch_target(pc: u64, iw: u32) -> u64 {
    pc.wrapping_add(4).wrapping_add(imm_sx(iw) << 2)
}

fn set_result(ctx: &mut ExecuteCtx<'_>, dest: usize, result: u64) {
    ctx.exdc.dest = dest;
    ctx.exdc.result = result;
}

fn load(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, size: u32, postshift: u32, dqm: u64) {
    ctx.exdc.dest = rt_index(iw);
    ctx.exdc.request = BusRequest {
        kind: BusRequestKind::Read,
        vaddr: rs.wrapping_add(imm_sx(iw)),
        paddr: 0,
        size,
        two_words: size == 8,
        dqm,
        postshift,
        data: 0,
    };
}

fn store(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64, size: u32) {
    let vaddr = rs.wrapping_add(imm_sx(iw));
    // Position sub-word payloads inside their big-endian word; DC merges
    // at word granularity under dqm.
    let (data, dqm) = match size {
        1 => {
            let shift = (3 - (vaddr & 3)) * 8;
            ((rt & 0xFF) << shift, 0xFFu64 << shift)
        }
        2 => {
            let shift = (2 - (vaddr & 2)) * 8;
            ((rt & 0xFFFF) << shift, 0xFFFFu64 << shift)
        }
        4 => (rt & 0xFFFF_FFFF, 0xFFFF_FFFF),
        _ => (rt, !0u64),
    };
    ctx.exdc.request = BusRequest {
        kind: BusRequestKind::Write,
        vaddr,
        paddr: 0,
        size,
        two_words: size == 8,
        dqm,
        postshift: 0,
        data,
    };
}

fn sll(ctx: &mut ExecuteCtx<'_>, iw: u32, _rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32((rt as u32 as u64) << sa(iw)));
    false
}

fn srl(ctx: &mut ExecuteCtx<'_>, iw: u32, _rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32(u64::from(rt as u32 >> sa(iw))));
    false
}

fn sra(ctx: &mut ExecuteCtx<'_>, iw: u32, _rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32(((rt as u32 as i32) >> sa(iw)) as u32 as u64));
    false
}

fn sllv(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32((rt as u32 as u64) << (rs & 0x1F)));
    false
}

fn srlv(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32(u64::from(rt as u32 >> (rs & 0x1F))));
    false
}

fn srav(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(
        ctx,
        rd_index(iw),
        sx32(((rt as u32 as i32) >> (rs & 0x1F)) as u32 as u64),
    );
    false
}

fn jr(ctx: &mut ExecuteCtx<'_>, _iw: u32, rs: u64, _rt: u64) -> bool {
    *ctx.next_pc = rs;
    false
}

fn jalr(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rd_index(iw), ctx.exdc.common.pc.wrapping_add(8));
    *ctx.next_pc = rs;
    false
}

fn add(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32(rs.wrapping_add(rt)));
    false
}

fn addu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32(rs.wrapping_add(rt)));
    false
}

fn sub(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32(rs.wrapping_sub(rt)));
    false
}

fn subu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), sx32(rs.wrapping_sub(rt)));
    false
}

fn and(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), rs & rt);
    false
}

fn or(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), rs | rt);
    false
}

fn xor(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), rs ^ rt);
    false
}

fn nor(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), !(rs | rt));
    false
}

fn slt(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), u64::from((rs as i64) < (rt as i64)));
    false
}

fn sltu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), u64::from(rs < rt));
    false
}

fn daddu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), rs.wrapping_add(rt));
    false
}

fn dsubu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, rd_index(iw), rs.wrapping_sub(rt));
    false
}

fn bltz(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    if (rs as i64) < 0 {
        *ctx.next_pc = branch_target(ctx.exdc.common.pc, iw);
    }
    false
}

fn bgez(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    if (rs as i64) >= 0 {
        *ctx.next_pc = branch_target(ctx.exdc.common.pc, iw);
    }
    false
}

fn j(ctx: &mut ExecuteCtx<'_>, iw: u32, _rs: u64, _rt: u64) -> bool {
    let delay_slot = ctx.exdc.common.pc.wrapping_add(4);
    *ctx.next_pc = (delay_slot & !0x0FFF_FFFF) | u64::from((iw & 0x03FF_FFFF) << 2);
    false
}

fn jal(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    set_result(ctx, 31, ctx.exdc.common.pc.wrapping_add(8));
    j(ctx, iw, rs, rt)
}

fn beq(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    if rs == rt {
        let pc = ctx.exdc.common.pc;
        let target = branch_target(pc, iw);
        *ctx.next_pc = target;
        // A self-branch whose operands are the same register can never
        // fall through; park the pipeline instead of spinning it.
        let rs_field = (iw >> RS_SHIFT) & FIELD_MASK;
        let rt_field = (iw >> RT_SHIFT) & FIELD_MASK;
        if target == pc && rs_field == rt_field {
            *ctx.resume = ResumePoint::BusyWait;
        }
    }
    false
}

fn bne(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    if rs != rt {
        *ctx.next_pc = branch_target(ctx.exdc.common.pc, iw);
    }
    false
}

fn blez(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    if (rs as i64) <= 0 {
        *ctx.next_pc = branch_target(ctx.exdc.common.pc, iw);
    }
    false
}

fn bgtz(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    if (rs as i64) > 0 {
        *ctx.next_pc = branch_target(ctx.exdc.common.pc, iw);
    }
    false
}

fn addi(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), sx32(rs.wrapping_add(imm_sx(iw))));
    false
}

fn addiu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), sx32(rs.wrapping_add(imm_sx(iw))));
    false
}

fn slti(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), u64::from((rs as i64) < (imm_sx(iw) as i64)));
    false
}

fn sltiu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), u64::from(rs < imm_sx(iw)));
    false
}

fn andi(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), rs & imm_zx(iw));
    false
}

fn ori(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), rs | imm_zx(iw));
    false
}

fn xori(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), rs ^ imm_zx(iw));
    false
}

fn lui(ctx: &mut ExecuteCtx<'_>, iw: u32, _rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), sx32(imm_zx(iw) << 16));
    false
}

fn daddiu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    set_result(ctx, rt_index(iw), rs.wrapping_add(imm_sx(iw)));
    false
}

fn mfc0(ctx: &mut ExecuteCtx<'_>, iw: u32, _rs: u64, _rt: u64) -> bool {
    let value = ctx.cp0.read_reg(rd_index(iw));
    set_result(ctx, rt_index(iw), sx32(value));
    false
}

fn mtc0(ctx: &mut ExecuteCtx<'_>, iw: u32, _rs: u64, rt: u64) -> bool {
    ctx.cp0.write_reg(rd_index(iw), sx32(rt));
    false
}

fn eret(ctx: &mut ExecuteCtx<'_>, _iw: u32, _rs: u64, _rt: u64) -> bool {
    let status = ctx.cp0.regs[cp0::STATUS];
    if status & STATUS_ERL != 0 {
        *ctx.next_pc = ctx.cp0.regs[cp0::ERROR_EPC];
        ctx.cp0.regs[cp0::STATUS] = status & !STATUS_ERL;
    } else {
        *ctx.next_pc = ctx.cp0.regs[cp0::EPC];
        ctx.cp0.regs[cp0::STATUS] = status & !STATUS_EXL;
    }
    // No delay slot: bury the in-flight successor.
    *ctx.iw_mask = 0;
    false
}

fn mfc1(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    // rs was selected from the CP1 bank (the fs field).
    set_result(ctx, rt_index(iw), sx32(rs));
    false
}

fn mtc1(ctx: &mut ExecuteCtx<'_>, iw: u32, _rs: u64, rt: u64) -> bool {
    let mut fs = rd_index(iw);
    if ctx.cp0.regs[cp0::STATUS] & STATUS_FR == 0 {
        fs &= !1;
    }
    set_result(ctx, CP1_REG_BASE + fs, sx32(rt));
    false
}

fn lb(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    load(ctx, iw, rs, 1, 56, !0);
    false
}

fn lh(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    load(ctx, iw, rs, 2, 48, !0);
    false
}

fn lw(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    load(ctx, iw, rs, 4, 32, !0);
    false
}

fn lbu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    load(ctx, iw, rs, 1, 56, 0xFF);
    false
}

fn lhu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    load(ctx, iw, rs, 2, 48, 0xFFFF);
    false
}

fn lwu(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    load(ctx, iw, rs, 4, 32, 0xFFFF_FFFF);
    false
}

fn ld(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, _rt: u64) -> bool {
    load(ctx, iw, rs, 8, 0, !0);
    false
}

fn sb(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    store(ctx, iw, rs, rt, 1);
    false
}

fn sh(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    store(ctx, iw, rs, rt, 2);
    false
}

fn sw(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    store(ctx, iw, rs, rt, 4);
    false
}

fn sd(ctx: &mut ExecuteCtx<'_>, iw: u32, rs: u64, rt: u64) -> bool {
    store(ctx, iw, rs, rt, 8);
    false
}

fn invalid(_ctx: &mut ExecuteCtx<'_>, _iw: u32, _rs: u64, _rt: u64) -> bool {
    false
}

/// Dispatch table indexed by `Opcode as usize`.
pub static FUNCTION_TABLE: [OpcodeFn; OPCODE_COUNT] = [
    sll, srl, sra, sllv, srlv, srav, jr, jalr, add, addu, sub, subu, and, or, xor, nor, slt,
    sltu, daddu, dsubu, bltz, bgez, j, jal, beq, bne, blez, bgtz, addi, addiu, slti, sltiu, andi,
    ori, xori, lui, daddiu, mfc0, mtc0, eret, mfc1, mtc1, lb, lh, lw, lbu, lhu, lwu, ld, sb, sh,
    sw, sd, invalid,
];
