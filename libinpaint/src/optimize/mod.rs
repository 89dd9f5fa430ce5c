//! Component D — Optimizers (spec.md 4.D).
//!
//! Runs PatchMatch-style propagation + random search sweeps over a Layer's
//! Mapping in place. Parallelized in row stripes via `rayon`, one sweep at
//! a time, with a join barrier between sweeps (spec.md 5: "a sweep never
//! starts until every stripe from the previous sweep has finished").

mod sweep;
mod variants;

pub use variants::CancelToken;

use crate::config::EngineConfig;
use crate::constraint::ConstraintSet;
use crate::error::{EngineError, Result};
use crate::layer::{LayerFloat, LayerInt};
use crate::random::Seed;

/// Runs `sweeps` alternating forward/backward passes over `layer`'s integer
/// Mapping, used at every level but the finest. `filter`, if given, further
/// restricts which pixels may be used as a source on top of the layer's
/// own mask (spec.md 6 "Option<Filter>").
pub fn optimize_int(
    layer: &mut LayerInt,
    filter: Option<&crate::mask::Mask>,
    config: &EngineConfig,
    seed: Seed,
    sweeps: u32,
    cancel: &CancelToken,
) -> Result<()> {
    let bbox = layer.bounding_box();
    if bbox.is_empty() {
        return Ok(());
    }
    let (frame, mask, mapping) = layer.parts_mut();
    let frame = frame.as_view();
    for i in 0..sweeps {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let direction = if i % 2 == 0 { sweep::Direction::Forward } else { sweep::Direction::Backward };
        sweep::run_sweep_int(mapping, &frame, mask, filter, bbox, config, direction, seed.wrapping_add(i as u64), cancel);
    }
    Ok(())
}

/// As [`optimize_int`], refining `layer`'s float Mapping at sub-pixel
/// precision — used at the finest level. `constraints`, if given, adds
/// structural-constraint cost on top of the ordinary appearance/spatial
/// terms (spec.md 9 "Constraint objects").
#[allow(clippy::too_many_arguments)]
pub fn optimize_float(
    layer: &mut LayerFloat,
    filter: Option<&crate::mask::Mask>,
    constraints: Option<&ConstraintSet>,
    config: &EngineConfig,
    seed: Seed,
    sweeps: u32,
    cancel: &CancelToken,
) -> Result<()> {
    let bbox = layer.bounding_box();
    if bbox.is_empty() {
        return Ok(());
    }
    let (frame, mask, mapping) = layer.parts_mut();
    let frame = frame.as_view();
    for i in 0..sweeps {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let direction = if i % 2 == 0 { sweep::Direction::Forward } else { sweep::Direction::Backward };
        sweep::run_sweep_float(mapping, &frame, mask, filter, constraints, bbox, config, direction, seed.wrapping_add(i as u64), cancel);
    }
    Ok(())
}
