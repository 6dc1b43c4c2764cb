//! Simulation statistics collection.
//!
//! Counters incremented by the pipeline as it runs. Several of the
//! per-clock properties of the core (segment lookup caching, interlock
//! accounting) are observable only through these counters, so the tests
//! lean on them as well as the architectural state.

/// Counters accumulated over a simulation run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimStats {
    /// Instructions that reached writeback without an exception.
    pub instructions_retired: u64,
    /// Ticks consumed while `cycles_to_stall` drained.
    pub stall_cycles: u64,
    /// Ticks spent frozen in the busy-wait shortcut.
    pub busy_wait_cycles: u64,
    /// Instruction cache misses (including uncached fetches).
    pub icache_misses: u64,
    /// Data cache block fetches.
    pub dcache_misses: u64,
    /// Dirty lines written back on eviction.
    pub dcache_writebacks: u64,
    /// Uncached data bus transactions.
    pub uncached_accesses: u64,
    /// Load-use interlocks raised by the execute stage.
    pub load_interlocks: u64,
    /// Exceptions delivered to coprocessor 0 at writeback.
    pub exceptions: u64,
    /// Segment table lookups performed by the IC and DC stages.
    pub segment_lookups: u64,
}

impl SimStats {
    /// Prints a short human-readable summary to stderr.
    pub fn report(&self) {
        eprintln!("retired:            {}", self.instructions_retired);
        eprintln!("stall cycles:       {}", self.stall_cycles);
        eprintln!("busy-wait cycles:   {}", self.busy_wait_cycles);
        eprintln!("icache misses:      {}", self.icache_misses);
        eprintln!("dcache misses:      {}", self.dcache_misses);
        eprintln!("dcache writebacks:  {}", self.dcache_writebacks);
        eprintln!("uncached accesses:  {}", self.uncached_accesses);
        eprintln!("load interlocks:    {}", self.load_interlocks);
        eprintln!("exceptions:         {}", self.exceptions);
        eprintln!("segment lookups:    {}", self.segment_lookups);
    }
}
