//! Engine configuration: tunable knobs for the similarity metric, the
//! matcher, the template store, and the block-size controller.
//!
//! Mirrors the defaults pinned in the distilled specification. Every default
//! here is independently documented; callers that only want to override one
//! or two knobs should start from [`EngineConfig::default`] and mutate the
//! fields they care about before calling [`EngineConfig::validate`] (done
//! automatically by `Engine::new`).

use crate::error::EngineError;

/// Acceptance threshold a candidate template's similarity must strictly
/// exceed for the matcher to call it a hit. Default 0.7.
pub const DEFAULT_P_THRESHOLD: f64 = 0.7;
/// Template store capacity. Default 100.
pub const DEFAULT_MAX_TEMPLATES: usize = 100;
/// Minimum vector length for the similarity metric to consider (C1). Default 1.
pub const DEFAULT_MIN_VALUES: usize = 1;
/// Samples processed between automatic `prune()` calls on the template store.
pub const DEFAULT_CLEAN_INTERVAL: u64 = 1000;
/// Initial / fixed block length. Default 8.
pub const DEFAULT_BLOCK_SIZE: usize = 8;
/// Lower bound for adaptive block size. Default 4.
pub const DEFAULT_MIN_BLOCK_SIZE: usize = 4;
/// Upper bound for adaptive block size. Default 16.
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 16;
/// Maximum number of block-size changes allowed in one run. Default 5.
pub const DEFAULT_KMAX: u32 = 5;
/// Minimum trials since the last change before another change is considered.
/// Default 30.
pub const DEFAULT_RMIN: u64 = 30;
/// Consecutive blocks required at the current N before a change may apply.
/// Default 2.
pub const DEFAULT_WC: u32 = 2;
/// Confidence level for the Wilson-style lower bound. Default 0.95.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
/// Similarity factor k in `similarity = max(0, 1 - k * mean_relative_diff)`.
/// Default 20.
pub const DEFAULT_SIMILARITY_FACTOR: f64 = 20.0;

/// All tunables for one [`crate::engine::Engine`] instance.
///
/// Constructed with [`EngineConfig::default`] and mutated field-by-field, or
/// built with the `with_*` builder methods. [`EngineConfig::validate`] is
/// called by `Engine::new` and rejects inconsistent bounds before any engine
/// state is allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Acceptance threshold for the matcher (C4). Must be in `[0, 1]`.
    pub p_threshold: f64,
    /// Template store capacity (C2). Must be `>= 1`.
    pub max_templates: usize,
    /// Minimum vector length the similarity metric will score (C1).
    pub min_values: usize,
    /// Samples between automatic template-store prunes.
    pub clean_interval: u64,
    /// Fixed block length when `adaptive_block_size` is false, and the
    /// starting block length otherwise.
    pub block_size: usize,
    /// Whether the block-size controller (C6) is active.
    pub adaptive_block_size: bool,
    /// Lower bound for the controller. Must be `>= 1`.
    pub min_block_size: usize,
    /// Upper bound for the controller. Must be `>= min_block_size`.
    pub max_block_size: usize,
    /// Maximum number of block-size changes in one run.
    pub kmax: u32,
    /// Minimum trials-since-change before a change may apply.
    pub rmin: u64,
    /// Consecutive blocks at the current N required before a change applies.
    pub wc: u32,
    /// Confidence level in `(0, 1)` used to derive z*.
    pub confidence_level: f64,
    /// Similarity factor k (C1). Must be `>= 0`.
    pub similarity_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            p_threshold: DEFAULT_P_THRESHOLD,
            max_templates: DEFAULT_MAX_TEMPLATES,
            min_values: DEFAULT_MIN_VALUES,
            clean_interval: DEFAULT_CLEAN_INTERVAL,
            block_size: DEFAULT_BLOCK_SIZE,
            adaptive_block_size: false,
            min_block_size: DEFAULT_MIN_BLOCK_SIZE,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            kmax: DEFAULT_KMAX,
            rmin: DEFAULT_RMIN,
            wc: DEFAULT_WC,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            similarity_factor: DEFAULT_SIMILARITY_FACTOR,
        }
    }
}

impl EngineConfig {
    /// Check every cross-field invariant the engine relies on.
    ///
    /// Called automatically by `Engine::new`; exposed publicly so callers
    /// building a config programmatically (e.g. from CLI flags) can validate
    /// early.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_block_size == 0 {
            return Err(EngineError::InvalidConfig(
                "min_block_size must be >= 1".into(),
            ));
        }
        if self.min_block_size > self.max_block_size {
            return Err(EngineError::InvalidConfig(format!(
                "min_block_size ({}) must be <= max_block_size ({})",
                self.min_block_size, self.max_block_size
            )));
        }
        if self.block_size < self.min_block_size || self.block_size > self.max_block_size {
            return Err(EngineError::InvalidConfig(format!(
                "block_size ({}) must be within [min_block_size, max_block_size] ([{}, {}])",
                self.block_size, self.min_block_size, self.max_block_size
            )));
        }
        if !(0.0..=1.0).contains(&self.p_threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "p_threshold ({}) must be within [0, 1]",
                self.p_threshold
            )));
        }
        if self.max_templates == 0 {
            return Err(EngineError::InvalidConfig(
                "max_templates must be >= 1".into(),
            ));
        }
        if self.similarity_factor < 0.0 {
            return Err(EngineError::InvalidConfig(
                "similarity_factor must be >= 0".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.confidence_level) {
            return Err(EngineError::InvalidConfig(format!(
                "confidence_level ({}) must be within [0, 1)",
                self.confidence_level
            )));
        }
        if self.clean_interval == 0 {
            return Err(EngineError::InvalidConfig(
                "clean_interval must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
