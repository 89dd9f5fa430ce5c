//! Shared cost evaluation and cooperative cancellation for the optimizer
//! sweeps (spec.md 5 "cancellation is cooperative: workers check a shared
//! flag between pixels, not preemptive").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::constraint::ConstraintSet;
use crate::frame::FrameView;
use crate::geometry::{Point2f, Point2i};
use crate::mapping::{MappingFloat, MappingInt};
use crate::mask::Mask;

/// A cheap, cloneable handle workers poll between pixels. Dropping every
/// clone never cancels anything; only [`CancelToken::cancel`] does.
#[derive(Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        CancelToken::new()
    }
}

/// Combined per-pixel cost for a candidate integer source, as
/// `Normalization::pixel_cost` combines the appearance and spatial terms
/// (spec.md 4.A). Used by both propagation and random search.
pub fn candidate_cost_int(
    mapping: &MappingInt,
    frame: &FrameView,
    mask: &Mask,
    target: (u32, u32),
    source: Point2i,
    config: &EngineConfig,
) -> u64 {
    let channels = frame.channels().count();
    let appearance = mapping.appearance_cost(frame, mask, target, source, config.border_factor, false);
    let spatial = mapping.spatial_cost(mask, target, source, config.max_spatial_cost);
    mapping.norm().pixel_cost(appearance, spatial, config.weight_factor, channels)
}

/// As [`candidate_cost_int`], with an additional additive term from
/// `constraints` (spec.md 9 "Constraint objects") — applied only at the
/// finest level, where pixel coordinates match the constraint geometry's
/// frame of reference 1:1 without needing to rescale per pyramid level.
pub fn candidate_cost_float(
    mapping: &MappingFloat,
    frame: &FrameView,
    mask: &Mask,
    target: (u32, u32),
    source: Point2f,
    config: &EngineConfig,
    constraints: Option<&ConstraintSet>,
) -> u64 {
    let channels = frame.channels().count();
    let appearance = mapping.appearance_cost(frame, mask, target, source, config.border_factor, false);
    let spatial = mapping.spatial_cost(mask, target, source, config.max_spatial_cost);
    let base = mapping.norm().pixel_cost(appearance, spatial, config.weight_factor, channels);
    let constraint_cost = constraints.map_or(0.0, |cs| cs.cost(target, source));
    base + constraint_cost.round() as u64
}
