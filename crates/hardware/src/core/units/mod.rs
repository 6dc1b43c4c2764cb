//! Address translation and cache units.
//!
//! The helpers the pipeline stages call into:
//! 1. **Segments:** The fixed virtual address map and mode-checked lookup.
//! 2. **TLB:** The 32-entry translation buffer for mapped segments.
//! 3. **Caches:** Direct-mapped instruction and data caches.

/// Direct-mapped instruction and data caches.
pub mod cache;
/// Virtual address segments and the mode-checked lookup.
pub mod segment;
/// Joint TLB for instruction and data translation.
pub mod tlb;
