//! Configuration system for the pipeline core.
//!
//! This module defines the configuration structures used to parameterize a
//! `Vr4300` instance. It provides:
//! 1. **Defaults:** Baseline timing constants for the memory hierarchy.
//! 2. **Structures:** Hierarchical config for general behavior and timing.
//!
//! Configuration is supplied as JSON via [`Config::from_json`] or built in
//! code with `Config::default()`.

use serde::Deserialize;

use crate::common::SimError;

/// Default configuration constants.
///
/// These values define the baseline timing when not explicitly overridden.
mod defaults {
    /// Master clock ticks to fill a 32-byte instruction cache line.
    ///
    /// Covers the SysAD block read of eight words from RDRAM.
    pub const ICACHE_FILL_CYCLES: u64 = 50;

    /// Master clock ticks to fill a 16-byte data cache line.
    ///
    /// Covers the four-word SysAD block read plus any write-back of the
    /// victim line, which the controller overlaps with the fill.
    pub const DCACHE_FILL_CYCLES: u64 = 46;

    /// Master clock ticks for a single uncached word on the bus.
    pub const UNCACHED_WORD_CYCLES: u64 = 38;
}

/// General simulation behavior.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable per-stage instruction tracing to stderr.
    pub trace_stages: bool,
}

/// Memory hierarchy timing, in master clock ticks.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Stall inserted by an instruction cache line fill.
    pub icache_fill: u64,
    /// Stall inserted by a data cache block fetch.
    pub dcache_fill: u64,
    /// Stall inserted by one uncached word transaction.
    pub uncached_word: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            icache_fill: defaults::ICACHE_FILL_CYCLES,
            dcache_fill: defaults::DCACHE_FILL_CYCLES,
            uncached_word: defaults::UNCACHED_WORD_CYCLES,
        }
    }
}

/// Root configuration for a `Vr4300` instance.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General simulation behavior.
    pub general: GeneralConfig,
    /// Memory hierarchy timing.
    pub timing: TimingConfig,
}

impl Config {
    /// Deserializes a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the text is not valid JSON or does
    /// not match the configuration schema.
    pub fn from_json(text: &str) -> Result<Self, SimError> {
        let config = serde_json::from_str(text)?;
        Ok(config)
    }
}
