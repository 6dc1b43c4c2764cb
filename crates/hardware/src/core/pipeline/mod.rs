//! The five-stage instruction pipeline.
//!
//! This module contains the pipeline core:
//! 1. **Latches:** Inter-stage buffers carrying per-instruction state.
//! 2. **Stages:** IC, RF, EX, DC, and WB as functions over the machine.
//! 3. **Driver:** The per-tick fast path and the resumable slow path.
//! 4. **Hazards:** Interlock raisers, exception raisers, and delivery.

/// Per-tick drivers: the fast pass and the slow-path entry points.
pub mod driver;
/// Interlock and exception raisers.
pub mod hazards;
/// Inter-stage pipeline latches.
pub mod latches;
/// The five stage functions.
pub mod stages;

use self::latches::{DcWbLatch, ExDcLatch, IcRfLatch, RfExLatch};

/// Entry point the slow path re-enters on the next tick.
///
/// `Full` is the ordinary back-to-front pass. The per-stage points resume
/// an aborted tick at the stage that stalled; the two specials freeze the
/// pipeline while a long-running event completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResumePoint {
    /// Run all five stages.
    #[default]
    Full,
    /// Re-enter at the data cache stage.
    Dc,
    /// Re-enter at the execute stage.
    Ex,
    /// Re-enter at the register fetch stage.
    Rf,
    /// Re-enter at the instruction fetch stage.
    Ic,
    /// Idle loop detected; only sample for interrupts.
    BusyWait,
    /// Data cache block transfer in flight; re-enter at DC when it drains.
    DcacheBlock,
}

/// The pipeline state proper: the four latches and the drain bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    /// IC/RF latch.
    pub icrf: IcRfLatch,
    /// RF/EX latch.
    pub rfex: RfExLatch,
    /// EX/DC latch.
    pub exdc: ExDcLatch,
    /// DC/WB latch.
    pub dcwb: DcWbLatch,
    /// Outstanding stall ticks; while nonzero, no stage runs.
    pub cycles_to_stall: u64,
    /// Whether an exception is in flight somewhere in the latches.
    pub fault_present: bool,
    /// Consecutive slow ticks since the last exception was raised.
    pub exception_history: u32,
    /// Where the next tick resumes.
    pub resume: ResumePoint,
}

impl Pipeline {
    /// Resets every latch and counter to the post-power state.
    ///
    /// The IC and EX/DC latches are seeded with the default zero-length
    /// segment so their first use performs a real lookup.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
