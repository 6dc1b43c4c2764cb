//! The five stage functions.
//!
//! Each stage is a function over the whole machine returning `Ok(true)`
//! when it stalled or aborted, which tells the driver not to proceed past
//! it this tick. Stages read their upstream latch and write their
//! downstream latch, so the drivers run them back-to-front to preserve the
//! one-cycle delay between stages without double-buffering.

/// Data cache stage.
pub mod dc;
/// Execute stage.
pub mod ex;
/// Instruction cache stage.
pub mod ic;
/// Register fetch stage.
pub mod rf;
/// Writeback stage.
pub mod wb;

pub use self::dc::dc_stage;
pub use self::ex::ex_stage;
pub use self::ic::ic_stage;
pub use self::rf::rf_stage;
pub use self::wb::wb_stage;

use crate::common::{PhysAddr, SimError, VirtAddr};
use crate::core::Vr4300;

/// TLB translation for an address inside a mapped segment.
///
/// A miss (or an invalid selected page) is a contract violation: mappings
/// must be installed before mapped space is touched.
pub(crate) fn translate_mapped(v: &Vr4300, vaddr: u64) -> Result<PhysAddr, SimError> {
    let va = VirtAddr::new(vaddr);
    let index = v
        .cp0
        .tlb
        .probe(va, v.cp0.asid())
        .ok_or(SimError::TlbMiss { vaddr })?;
    v.cp0
        .tlb
        .physical_address(index, va)
        .ok_or(SimError::TlbMiss { vaddr })
}
