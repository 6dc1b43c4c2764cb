//! Per-tick pipeline drivers.
//!
//! `cycle` is the single entry point the device container calls. The fast
//! path runs the five stages back-to-front and short-circuits on the first
//! abort; the slow path re-enters an aborted tick at the stage that
//! stalled, or walks full passes while an exception drains to writeback.
//! The busy-wait shortcut freezes the latches entirely and only samples
//! the interrupt predicate.

use crate::common::SimError;
use crate::common::constants::PIPELINE_DEPTH;
use crate::core::Vr4300;
use crate::core::pipeline::ResumePoint;
use crate::core::pipeline::stages::{dc_stage, ex_stage, ic_stage, rf_stage, wb_stage};

/// Advances the machine by one master clock tick.
///
/// The cycle counter moves first, before the stall check and before any
/// stage runs. `Count` moves at half the master clock at the end of the
/// tick, so a compare hit is observable by DC from the next tick.
pub fn cycle(v: &mut Vr4300) -> Result<(), SimError> {
    v.cycles += 1;

    let result = if v.pipeline.cycles_to_stall > 0 {
        v.pipeline.cycles_to_stall -= 1;
        v.stats.stall_cycles += 1;
        Ok(())
    } else if v.pipeline.fault_present || v.pipeline.resume != ResumePoint::Full {
        cycle_slow(v)
    } else {
        run_from(v, ResumePoint::Full)
    };

    if v.cycles & 1 == 0 {
        v.cp0.increment_count();
    }
    result
}

/// One tick of the slow path.
///
/// Dispatches on the resume point recorded when the tick aborted, then
/// advances the drain counter: once a full pipeline depth plus one of
/// consecutive fault-free ticks have passed, the fast path re-engages.
fn cycle_slow(v: &mut Vr4300) -> Result<(), SimError> {
    let entry = v.pipeline.resume;
    v.pipeline.resume = ResumePoint::Full;

    if entry == ResumePoint::BusyWait {
        v.stats.busy_wait_cycles += 1;
        if v.cp0.interrupt_pending() {
            v.raise_intr();
        } else {
            v.pipeline.resume = ResumePoint::BusyWait;
        }
        return Ok(());
    }

    run_from(v, entry)?;

    if v.pipeline.fault_present {
        v.pipeline.exception_history += 1;
        if v.pipeline.exception_history > PIPELINE_DEPTH {
            v.pipeline.fault_present = false;
            v.pipeline.exception_history = 0;
            tracing::debug!("pipeline drained; fast path re-engaged");
        }
    }
    Ok(())
}

/// Runs the stages from `entry` down to IC, stopping at the first abort.
///
/// Downstream stages of an aborted tick already completed, so a resumed
/// tick starts where the abort happened and only the upstream stages run.
fn run_from(v: &mut Vr4300, entry: ResumePoint) -> Result<(), SimError> {
    match entry {
        ResumePoint::Full => {
            if wb_stage(v)? {
                return Ok(());
            }
            if dc_stage(v)? {
                return Ok(());
            }
            if ex_stage(v)? {
                return Ok(());
            }
            if rf_stage(v)? {
                return Ok(());
            }
            let _ = ic_stage(v)?;
        }
        ResumePoint::Dc | ResumePoint::DcacheBlock => {
            if dc_stage(v)? {
                return Ok(());
            }
            if ex_stage(v)? {
                return Ok(());
            }
            if rf_stage(v)? {
                return Ok(());
            }
            let _ = ic_stage(v)?;
        }
        ResumePoint::Ex => {
            if ex_stage(v)? {
                return Ok(());
            }
            if rf_stage(v)? {
                return Ok(());
            }
            let _ = ic_stage(v)?;
        }
        ResumePoint::Rf => {
            if rf_stage(v)? {
                return Ok(());
            }
            let _ = ic_stage(v)?;
        }
        ResumePoint::Ic => {
            let _ = ic_stage(v)?;
        }
        // Handled before dispatch; the busy-wait state never reaches here.
        ResumePoint::BusyWait => {}
    }
    Ok(())
}
