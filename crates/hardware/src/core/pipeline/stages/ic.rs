//! Instruction Cache (IC) Stage.
//!
//! IC owns the fetch program counter. Each tick it completes the decode of
//! the word register fetch pulled in last tick, stamps the fresh IC/RF
//! slot, keeps the cached segment descriptor current, and advances the
//! fetch PC. The branch-delay flag is stamped here: if the word just
//! decoded is a branch, the slot being opened is its delay slot.

use crate::common::constants::CAUSE_BD;
use crate::common::{Fault, SimError};
use crate::core::units::segment;
use crate::core::{Vr4300, cp0};
use crate::isa::decode_instruction;

/// Executes the instruction cache stage.
///
/// Returns `Ok(true)` when the fetch aborted (segment lookup failure or a
/// dead fetch stream awaiting exception delivery).
pub fn ic_stage(v: &mut Vr4300) -> Result<bool, SimError> {
    // Complete the decode of the previous fetch. The mask buries a killed
    // instruction (the masked word decodes as the canonical no-op) and is
    // rearmed after each use.
    let p = &mut v.pipeline;
    p.rfex.iw &= p.rfex.iw_mask;
    p.rfex.iw_mask = !0;
    p.rfex.opcode = decode_instruction(p.rfex.iw);

    if p.icrf.common.fault.is_exception() {
        // Dead fetch stream; hold the slot until delivery redirects it.
        return Ok(true);
    }

    let pc = p.icrf.pc;
    p.icrf.common.pc = pc;
    p.icrf.common.fault = Fault::None;
    p.icrf.common.cause_data = if p.rfex.opcode.is_branch() {
        CAUSE_BD
    } else {
        0
    };

    if !v.pipeline.icrf.segment.contains(pc) {
        let status = v.cp0.regs[cp0::STATUS];
        v.stats.segment_lookups += 1;
        match segment::lookup(pc, status) {
            Some(seg) => v.pipeline.icrf.segment = seg,
            None => {
                v.raise_iade();
                return Ok(true);
            }
        }
    }

    v.pipeline.icrf.pc = pc.wrapping_add(4);
    if v.trace {
        eprintln!("IC  pc={pc:#018x}");
    }
    Ok(false)
}
