//! Fault and fatal-error definitions.
//!
//! This module defines the two failure channels of the core:
//! 1. **Faults:** Signaled values latched into the common latch payload and
//!    carried down the pipeline one stage per tick. These are never Rust
//!    errors; they are ordinary data the drivers act on.
//! 2. **Fatal Errors:** Internal invariant violations that terminate the
//!    simulation, surfaced to the caller of `cycle` as a `SimError`.

use std::fmt;

use thiserror::Error;

/// Fault kinds attached to a pipeline latch.
///
/// A latch's fault is `None` exactly when the stage that produced it
/// completed cleanly. Interlock kinds re-run the same instruction after a
/// stall; exception kinds bury the instruction and travel to writeback,
/// where they are delivered to coprocessor 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fault {
    /// No fault; the producing stage completed.
    #[default]
    None,
    /// IC could not locate a segment for the program counter.
    InstructionAddressError,
    /// The instruction cache needs a fill before the fetch can complete.
    InstructionCacheBusy,
    /// EX must re-run next tick, after the load ahead of it completes.
    LoadDelayInterlock,
    /// DC could not locate a segment for the effective address.
    DataAddressError,
    /// The data cache needs a block fetch before the access can complete.
    DataCacheMiss,
    /// The data access is waiting on an uncached bus transaction.
    DataCacheBusy,
    /// A masked, enabled interrupt was pending at the DC stage.
    Interrupt,
    /// The cold reset signal was observed at the DC stage.
    ColdReset,
}

impl Fault {
    /// Whether this kind is a true exception.
    ///
    /// Exceptions bury their instruction and propagate to writeback for
    /// delivery; everything else is an interlock that re-runs in place.
    #[inline]
    pub const fn is_exception(self) -> bool {
        matches!(
            self,
            Self::InstructionAddressError
                | Self::DataAddressError
                | Self::Interrupt
                | Self::ColdReset
        )
    }

    /// Whether this kind is an interlock (a stall that re-runs in place).
    #[inline]
    pub const fn is_interlock(self) -> bool {
        !matches!(self, Self::None) && !self.is_exception()
    }

    /// Exception code written into the Cause register on delivery.
    pub const fn exception_code(self) -> u64 {
        use crate::common::constants::{EXC_CODE_ADDRESS_ERROR, EXC_CODE_INTERRUPT};
        match self {
            Self::InstructionAddressError | Self::DataAddressError => EXC_CODE_ADDRESS_ERROR,
            _ => EXC_CODE_INTERRUPT,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::InstructionAddressError => "InstructionAddressError",
            Self::InstructionCacheBusy => "InstructionCacheBusy",
            Self::LoadDelayInterlock => "LoadDelayInterlock",
            Self::DataAddressError => "DataAddressError",
            Self::DataCacheMiss => "DataCacheMiss",
            Self::DataCacheBusy => "DataCacheBusy",
            Self::Interrupt => "Interrupt",
            Self::ColdReset => "ColdReset",
        };
        f.write_str(name)
    }
}

/// Fatal simulation errors.
///
/// Returned from `Vr4300::cycle` when the machine reaches a state the model
/// treats as unrecoverable. The caller is expected to stop driving ticks.
#[derive(Debug, Error)]
pub enum SimError {
    /// A mapped segment was probed and no TLB entry matched.
    ///
    /// The pipeline contract requires mappings to be loaded before mapped
    /// space is touched, so this is an invariant violation rather than a
    /// modeled TLB refill.
    #[error("TLB miss in mapped segment for virtual address {vaddr:#018x}")]
    TlbMiss {
        /// The virtual address that failed to translate.
        vaddr: u64,
    },

    /// Configuration text failed to deserialize.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
