//! Register Fetch (RF) Stage.
//!
//! RF translates the fetch address and pulls the instruction word out of
//! the instruction cache. A miss (or an uncached fetch) records the
//! physical address in the RF/EX latch and hands off to the
//! instruction-cache-busy interlock; the same slot re-runs after the fill.

use crate::common::{Fault, PhysAddr, SimError, VirtAddr};
use crate::core::Vr4300;
use crate::core::pipeline::latches::CommonLatch;

use super::translate_mapped;

/// Executes the register fetch stage.
///
/// Returns `Ok(true)` when the fetch stalled on the instruction cache.
pub fn rf_stage(v: &mut Vr4300) -> Result<bool, SimError> {
    let icrf = v.pipeline.icrf;

    if icrf.common.fault.is_exception() {
        // Carry the dead slot forward; it decodes as a no-op from here on.
        v.pipeline.rfex.common = icrf.common;
        v.pipeline.rfex.iw = 0;
        return Ok(false);
    }
    v.pipeline.rfex.common = CommonLatch {
        fault: Fault::None,
        ..icrf.common
    };

    let va = icrf.common.pc;
    let pa = if icrf.segment.mapped {
        translate_mapped(v, va)?
    } else {
        PhysAddr::new(va.wrapping_sub(icrf.segment.offset) as u32)
    };

    if !icrf.segment.cached {
        v.pipeline.rfex.paddr = pa.val();
        v.raise_icb();
        return Ok(true);
    }

    if let Some(line) = v.icache.probe(VirtAddr::new(va), pa) {
        let iw = line.read_word(pa.line_offset(32) & !3);
        v.pipeline.rfex.iw = iw;
        if v.trace {
            eprintln!("RF  pc={va:#018x} iw={iw:#010x}");
        }
        Ok(false)
    } else {
        v.pipeline.rfex.paddr = pa.val();
        v.raise_icb();
        Ok(true)
    }
}
