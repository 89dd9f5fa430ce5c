//! Engine configuration.
//!
//! Mirrors the teacher crate's `...Params` convention (`PixelSearchParams`,
//! `QuilterParams`, `WeiLevoyParams`): a plain struct with documented
//! fields and sane defaults, validated once at construction rather than
//! scattered through the call sites that consume it.

use crate::error::{EngineError, Result};

/// Which strategy seeds the Mapping of the coarsest pyramid level. Finer
/// levels always use coarser-mapping adaption (spec.md 4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoarseInitializer {
    Random,
    Appearance,
    Erosion,
    RandomErosion,
    Contour,
    PatchFullArea1,
    PatchFullArea2,
    PatchSubRegion1,
    PatchSubRegion2,
    PatchFullAreaHeuristic1,
    PatchFullAreaHeuristic2,
}

impl Default for CoarseInitializer {
    fn default() -> Self {
        CoarseInitializer::PatchFullArea1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Strategy used to seed the coarsest level's Mapping.
    pub coarse_initializer: CoarseInitializer,

    /// Weight applied to the spatial-coherence term, range `[0, inf)`.
    /// Typical value 5.
    pub weight_factor: f32,

    /// Multiplier applied to squared appearance differences whose neighbor
    /// pixel is itself a target pixel, range `[1, inf)`. Typical value 25.
    pub border_factor: u32,

    /// Cap applied to the raw (un-normalized) spatial cost before it enters
    /// the weighted total.
    pub max_spatial_cost: u32,

    /// Number of optimizer sweeps run per non-coarsest pyramid level.
    /// Default 2.
    pub optimization_iterations: u32,

    /// Number of finest levels collapsed to single-channel grayscale before
    /// search, to speed up early sweeps.
    pub forced_1channel_layers: u32,

    /// Number of finest levels on which spatial-cost skipping would be
    /// enabled. Reserved: accepted and defaulted, not yet read by the
    /// pyramid driver.
    pub skipping_layers: u32,

    /// Apply a binomial pre-smoothing pass when building the coarsest
    /// pyramid level.
    pub binomial_on_coarsest: bool,

    /// Apply a binomial pre-smoothing pass when building every
    /// non-coarsest pyramid level.
    pub binomial_on_fine: bool,

    /// Number of random candidates drawn by the Appearance initializer per
    /// target pixel. Typical value 100.
    pub appearance_candidates: u32,

    /// Number of sweeps run at the coarsest level. Default 4.
    pub coarsest_sweeps: u32,

    /// Number of sweeps run at the finest level (float mapping smoothing
    /// pass). Default 5.
    pub finest_sweeps: u32,

    /// Half-width, in pixels, of the finest-level boundary blend. `0`
    /// disables blending. Range `[0, 5]`.
    pub blend_band: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            coarse_initializer: CoarseInitializer::default(),
            weight_factor: 5.0,
            border_factor: 25,
            max_spatial_cost: u32::MAX,
            optimization_iterations: 2,
            forced_1channel_layers: 0,
            skipping_layers: 0,
            binomial_on_coarsest: false,
            binomial_on_fine: false,
            appearance_candidates: 100,
            coarsest_sweeps: 4,
            finest_sweeps: 5,
            blend_band: 3,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.border_factor == 0 {
            return Err(EngineError::InvalidInput(
                "border_factor must be >= 1".into(),
            ));
        }
        if self.weight_factor < 0.0 {
            return Err(EngineError::InvalidInput(
                "weight_factor must be >= 0".into(),
            ));
        }
        if self.optimization_iterations == 0 {
            return Err(EngineError::InvalidInput(
                "optimization_iterations must be >= 1".into(),
            ));
        }
        if self.blend_band > 5 {
            return Err(EngineError::InvalidInput(
                "blend_band must be in [0, 5]".into(),
            ));
        }
        Ok(())
    }
}
