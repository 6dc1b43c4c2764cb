//! Execute (EX) Stage.
//!
//! EX selects the operand registers (GPR or CP1 bank, per the decoded
//! flags), detects the load-use interlock against the instruction that
//! just left DC, forwards the newest result out of the DC/WB latch, and
//! dispatches the opcode cell that populates the EX/DC latch.

use crate::common::constants::{CP1_REG_BASE, FIELD_MASK, REG_ZERO, STATUS_FR};
use crate::common::{Fault, SimError};
use crate::core::pipeline::latches::{BusRequest, BusRequestKind, CommonLatch};
use crate::core::{Vr4300, cp0};
use crate::isa::{ExecuteCtx, FUNCTION_TABLE};

/// Operand selector `(bank base, field shift)` pairs for `rs`, indexed by
/// the CP1 flag: GPR ops read the `rs` field, CP1 ops read `fs`.
const RS_SELECT: [(usize, u32); 2] = [(0, 21), (CP1_REG_BASE, 11)];
/// Operand selector pairs for `rt`: GPR ops and CP1 ops both read bits
/// 20:16, but from different banks.
const RT_SELECT: [(usize, u32); 2] = [(0, 16), (CP1_REG_BASE, 16)];

/// Executes the execute stage.
///
/// Returns `Ok(true)` when a load-use interlock (or a stalling opcode
/// cell) aborted the tick.
pub fn ex_stage(v: &mut Vr4300) -> Result<bool, SimError> {
    let rfex = v.pipeline.rfex;

    if rfex.common.fault.is_exception() {
        v.pipeline.exdc.common = rfex.common;
        v.pipeline.exdc.dest = REG_ZERO;
        v.pipeline.exdc.request.kind = BusRequestKind::None;
        return Ok(false);
    }

    let opcode = rfex.opcode;
    let iw = rfex.iw;

    let cp1 = opcode.is_cp1();
    let (rs_base, rs_shift) = RS_SELECT[usize::from(cp1)];
    let (rt_base, rt_shift) = RT_SELECT[usize::from(cp1)];
    let mut rs = rs_base + ((iw >> rs_shift) & FIELD_MASK) as usize;
    let mut rt = rt_base + ((iw >> rt_shift) & FIELD_MASK) as usize;
    if cp1 && v.cp0.regs[cp0::STATUS] & STATUS_FR == 0 {
        // 16-pair mode: odd CP1 registers alias their even partner.
        rs &= !1;
        rt &= !1;
    }

    // Load-use interlock: the instruction ahead just finished DC, but a
    // loaded value is architecturally a cycle away from being readable.
    let ahead = v.pipeline.exdc;
    if ahead.request.kind == BusRequestKind::Read && ahead.dest != REG_ZERO {
        let hazard = (opcode.reads_rs() && rs == ahead.dest)
            || (opcode.reads_rt() && rt == ahead.dest);
        if hazard {
            v.raise_ldi();
            return Ok(true);
        }
    }

    // Forward the newest result straight out of the DC/WB latch; the
    // register file itself is one writeback behind it. Slot zero never
    // forwards, so a write to r0 is invisible to the very next read.
    let dcwb = v.pipeline.dcwb;
    let rs_value = if rs != REG_ZERO && rs == dcwb.dest {
        dcwb.result
    } else {
        v.regs.read(rs)
    };
    let rt_value = if rt != REG_ZERO && rt == dcwb.dest {
        dcwb.result
    } else {
        v.regs.read(rt)
    };

    v.pipeline.exdc.common = CommonLatch {
        fault: Fault::None,
        ..rfex.common
    };
    v.pipeline.exdc.dest = REG_ZERO;
    v.pipeline.exdc.result = 0;
    v.pipeline.exdc.request = BusRequest::default();

    if v.trace {
        eprintln!("EX  pc={:#018x} iw={iw:#010x}", rfex.common.pc);
    }

    let handler = FUNCTION_TABLE[opcode.op as usize];
    let p = &mut v.pipeline;
    let mut ctx = ExecuteCtx {
        exdc: &mut p.exdc,
        next_pc: &mut p.icrf.pc,
        iw_mask: &mut p.rfex.iw_mask,
        resume: &mut p.resume,
        cp0: &mut v.cp0,
    };
    Ok(handler(&mut ctx, iw, rs_value, rt_value))
}
