//! Writeback (WB) Stage.
//!
//! WB commits the DC/WB result to the register file. When the slot
//! carries an exception it instead delivers it to coprocessor 0 and restarts the
//! fetch stream from the vector. Delivery is the only place the pipeline
//! mutates user-visible CP0 state for a fault.

use crate::common::constants::REG_ZERO;
use crate::common::{Fault, SimError};
use crate::core::pipeline::latches::{CommonLatch, DcWbLatch, ExDcLatch, RfExLatch};
use crate::core::units::segment;
use crate::core::{Vr4300, cp0};
use crate::isa::OpcodeRecord;

/// Executes the writeback stage.
///
/// Never aborts; exception delivery happens here and the rest of the pass
/// continues over the freshly killed latches.
pub fn wb_stage(v: &mut Vr4300) -> Result<bool, SimError> {
    let dcwb = v.pipeline.dcwb;

    if dcwb.common.fault.is_exception() {
        deliver(v);
        return Ok(false);
    }

    v.regs.write(dcwb.dest, dcwb.result);
    v.stats.instructions_retired += 1;
    if v.trace && dcwb.dest != REG_ZERO {
        eprintln!(
            "WB  pc={:#018x} r{}={:#018x}",
            dcwb.common.pc, dcwb.dest, dcwb.result
        );
    }
    Ok(false)
}

/// Delivers the exception in the DC/WB slot to coprocessor 0.
///
/// Instructions downstream of the faulting one have already retired;
/// everything upstream is killed here (bubbled latches, buried instruction
/// word) and the fetch stream restarts at the vector.
fn deliver(v: &mut Vr4300) {
    let common = v.pipeline.dcwb.common;
    let vector = v
        .cp0
        .take_exception(common.fault, common.pc, common.cause_data);
    v.stats.exceptions += 1;
    tracing::debug!(
        fault = %common.fault,
        pc = common.pc,
        vector,
        "exception delivered"
    );

    let status = v.cp0.regs[cp0::STATUS];
    let p = &mut v.pipeline;
    p.dcwb = DcWbLatch::default();
    p.exdc = ExDcLatch {
        segment: p.exdc.segment,
        ..ExDcLatch::default()
    };
    p.rfex = RfExLatch {
        iw: 0,
        iw_mask: !0,
        opcode: OpcodeRecord::default(),
        common: CommonLatch::default(),
        paddr: 0,
    };
    p.icrf.common = CommonLatch {
        pc: vector,
        fault: Fault::None,
        cause_data: 0,
    };
    p.icrf.pc = vector.wrapping_add(4);
    p.icrf.segment = segment::lookup(vector, status).unwrap_or(segment::default_segment());
}
