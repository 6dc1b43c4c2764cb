//! Data Cache (DC) Stage.
//!
//! DC is where exception precedence is resolved before any memory work
//! happens: cold reset first, then pending interrupts. A live bus request
//! then walks the same segment -> TLB -> cache path as the fetch side, but
//! against the data cache: address errors fault, misses hand off to the
//! block-fetch interlock, uncached traffic to the bus interlock, and hits
//! complete in place with the extract/merge laws documented on
//! [`BusRequest`](crate::core::pipeline::latches::BusRequest).

use crate::common::constants::{REG_ZERO, SIGNAL_COLD_RESET};
use crate::common::{Fault, PhysAddr, SimError, VirtAddr};
use crate::core::units::cache::DCacheLine;
use crate::core::units::segment;
use crate::core::{Vr4300, cp0};
use crate::core::pipeline::latches::{BusRequestKind, CommonLatch, DcWbLatch};

use super::translate_mapped;

/// Masked merge of one word into a line.
fn merge_word(line: &mut DCacheLine, offset: usize, data: u32, dqm: u32) {
    let old = line.read_word(offset);
    line.write_word(offset, (old & !dqm) | (data & dqm));
}

/// Executes the data cache stage.
///
/// Returns `Ok(true)` when the tick aborted: a fault was raised or the
/// access is waiting on the memory hierarchy.
pub fn dc_stage(v: &mut Vr4300) -> Result<bool, SimError> {
    let exdc = v.pipeline.exdc;

    if exdc.common.fault.is_exception() {
        v.pipeline.dcwb = DcWbLatch {
            common: exdc.common,
            dest: REG_ZERO,
            result: 0,
        };
        return Ok(false);
    }

    // Exception precedence: cold reset outranks interrupts, interrupts
    // outrank the memory access.
    if v.signals & SIGNAL_COLD_RESET != 0 {
        v.raise_rst();
        return Ok(true);
    }
    if v.cp0.interrupt_pending() {
        v.raise_intr();
        return Ok(true);
    }

    v.pipeline.dcwb = DcWbLatch {
        common: CommonLatch {
            fault: Fault::None,
            ..exdc.common
        },
        dest: exdc.dest,
        result: exdc.result,
    };

    if exdc.request.kind == BusRequestKind::None {
        return Ok(false);
    }

    // Same segment -> TLB -> cache walk as the fetch side.
    let vaddr = exdc.request.vaddr;
    let mut seg = exdc.segment;
    if !seg.contains(vaddr) {
        let status = v.cp0.regs[cp0::STATUS];
        v.stats.segment_lookups += 1;
        match segment::lookup(vaddr, status) {
            Some(found) => {
                seg = found;
                v.pipeline.exdc.segment = found;
            }
            None => {
                v.raise_dade();
                return Ok(true);
            }
        }
    }

    let pa = if seg.mapped {
        translate_mapped(v, vaddr)?
    } else {
        PhysAddr::new(vaddr.wrapping_sub(seg.offset) as u32)
    };
    v.pipeline.exdc.request.paddr = pa.val();

    if !seg.cached {
        v.raise_dcb(pa);
        return Ok(true);
    }

    let req = v.pipeline.exdc.request;
    if let Some(line) = v.dcache.probe(VirtAddr::new(vaddr), pa) {
        match req.kind {
            BusRequestKind::Read => {
                let offset = pa.line_offset(16) & !(req.size as usize - 1);
                let raw = line.read_bytes(offset, req.size as usize);
                let value = (((raw << req.postshift) as i64) >> req.postshift) as u64 & req.dqm;
                v.pipeline.dcwb.result |= value;
                if v.trace {
                    eprintln!("DC  pc={:#018x} read  va={vaddr:#018x}", exdc.common.pc);
                }
            }
            BusRequestKind::Write => {
                if req.two_words {
                    let offset = pa.line_offset(16) & 0x8;
                    merge_word(line, offset, (req.data >> 32) as u32, (req.dqm >> 32) as u32);
                    merge_word(line, offset + 4, req.data as u32, req.dqm as u32);
                } else {
                    let offset = pa.line_offset(16) & 0xC;
                    merge_word(line, offset, req.data as u32, req.dqm as u32);
                }
                line.set_dirty();
                if v.trace {
                    eprintln!("DC  pc={:#018x} write va={vaddr:#018x}", exdc.common.pc);
                }
            }
            BusRequestKind::None => {}
        }
        Ok(false)
    } else {
        v.raise_dcm(pa);
        Ok(true)
    }
}
