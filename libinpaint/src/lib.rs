//! Patch-based pixel synthesis: a PatchMatch-style coarse-to-fine engine
//! for filling masked regions of a frame with plausible content sourced
//! from the rest of the frame. [`synthesize`] is the single entry point;
//! everything else is public so callers can drive the Pyramid Driver's
//! components directly (video sequences, custom coarse initializers,
//! structural constraints).

pub mod config;
pub mod constraint;
pub mod creator;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod init;
pub mod layer;
pub mod mapping;
pub mod mask;
pub mod optimize;
pub mod patch;
pub mod pyramid;
pub mod random;
pub mod video;

pub use config::{CoarseInitializer, EngineConfig};
pub use constraint::{Constraint, ConstraintSet};
pub use error::{EngineError, Result};
pub use frame::{Channels, FrameBuf, FrameView, FrameViewMut};
pub use mapping::MappingFloat;
pub use mask::Mask;
pub use optimize::CancelToken;
pub use pyramid::PyramidResult;
pub use video::VideoContext;

/// Output of [`synthesize`]: the inpainted frame, plus the two optional
/// diagnostics callers chain into further work (spec.md 6 "Outputs").
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// The synthesized frame, same dimensions and channel layout as the
    /// input.
    pub frame: FrameBuf,

    /// The finest level's converged float Mapping, ready to seed a
    /// [`VideoContext`] for the next frame of a sequence.
    pub mapping: MappingFloat,

    /// The finest level's total combined appearance/spatial/constraint
    /// cost, a convergence diagnostic rather than something callers should
    /// branch on.
    pub total_cost: u64,
}

impl From<PyramidResult> for EngineOutput {
    fn from(result: PyramidResult) -> EngineOutput {
        EngineOutput { frame: result.frame, mapping: result.mapping, total_cost: result.total_cost }
    }
}

/// Fills the target pixels of `frame` (as marked by `mask`) with content
/// sourced from `frame`'s own source pixels, restricted further by
/// `filter` if given (spec.md 6 "Option<Filter>") and nudged by
/// `constraints` if given (spec.md 9 "Constraint objects").
///
/// `video`, if given, warm-starts the finest level from a prior frame's
/// converged Mapping (spec.md 6 "Option<VideoContext>"); `pool` runs the
/// sweeps inside a caller-owned rayon pool instead of the global one.
/// `cancel` is polled cooperatively between rows; an already-cancelled
/// token aborts before the first sweep.
#[allow(clippy::too_many_arguments)]
pub fn synthesize(
    frame: FrameView,
    mask: &Mask,
    filter: Option<&Mask>,
    constraints: Option<&[Constraint]>,
    config: &EngineConfig,
    seed: u64,
    video: Option<&VideoContext>,
    pool: Option<&rayon::ThreadPool>,
    cancel: &CancelToken,
) -> Result<EngineOutput> {
    pyramid::run(frame, mask, filter, constraints, config, seed, video, pool, cancel).map(EngineOutput::from)
}
