//! Component F — Pyramid Driver (spec.md 4.F).
//!
//! Builds the frame/mask/filter pyramid, seeds and optimizes the coarsest
//! level, adapts and optimizes every intermediate level, then seeds and
//! refines the finest level's float Mapping before handing it to the
//! Inpainting creator.
//!
//! Only `Clone`-able pyramid state (`MappingInt`/`Mask`) is carried forward
//! between levels, never a live `Layer`: a `Layer` borrows the frame buffer
//! its own level owns, and that buffer is replaced by the next level's
//! buffer on every iteration, which a borrowing value can't outlive
//! (spec.md 9 "owning vs borrowing").

use log::{debug, warn};
use rand::Rng;

use crate::config::EngineConfig;
use crate::constraint::{Constraint, ConstraintSet};
use crate::creator;
use crate::error::{EngineError, Result};
use crate::frame::{FrameBuf, FrameView};
use crate::init;
use crate::layer::{LayerFloat, LayerInt};
use crate::mapping::{MappingFloat, MappingInt};
use crate::mask::Mask;
use crate::optimize::{self, CancelToken};
use crate::random::{new_rng, Seed};
use crate::video::VideoContext;

/// Smallest extent a level may have before the pyramid stops descending;
/// below this a 5x5 appearance patch would mostly sample out of bounds.
const MIN_LEVEL_EXTENT: u32 = 4;

struct LevelPyramid {
    frames: Vec<FrameBuf>,
    masks: Vec<Mask>,
    filters: Vec<Option<Mask>>,
}

fn build_pyramid(frame: &FrameView, mask: &Mask, filter: Option<&Mask>, config: &EngineConfig) -> LevelPyramid {
    let base_frame = FrameBuf::from_raw(frame.width(), frame.height(), frame.channels(), frame.stride(), frame.data().to_vec())
        .expect("caller's FrameView is always a valid FrameBuf source");
    let mut frames = vec![base_frame];
    let mut masks = vec![mask.clone()];
    let mut filters = vec![filter.cloned()];

    loop {
        let prev_frame = frames.last().unwrap();
        let prev_mask = masks.last().unwrap();
        if prev_frame.width() <= MIN_LEVEL_EXTENT || prev_frame.height() <= MIN_LEVEL_EXTENT {
            break;
        }
        let next_mask = prev_mask.downsample_2x_or();
        if !next_mask.has_target() {
            break;
        }
        let mut next_frame = prev_frame.downsample_2x();
        if config.binomial_on_fine {
            next_frame.binomial_smooth();
        }
        let next_filter = filters.last().unwrap().as_ref().map(Mask::downsample_2x_or);
        frames.push(next_frame);
        masks.push(next_mask);
        filters.push(next_filter);
    }

    if config.binomial_on_coarsest {
        if let Some(coarsest) = frames.last_mut() {
            coarsest.binomial_smooth();
        }
    }

    debug!("built pyramid with {} levels, coarsest {}x{}", frames.len(), frames.last().unwrap().width(), frames.last().unwrap().height());
    LevelPyramid { frames, masks, filters }
}

/// Converts an integer Mapping to a float Mapping at the same resolution,
/// with no quadrant doubling — used only when the pyramid has a single
/// level, i.e. the coarsest level already *is* the finest level.
fn seed_float_same_resolution(coarse: &MappingInt, mask: &Mask, layer: &mut LayerFloat, valid: &mut Vec<bool>) {
    let (width, height) = (layer.width(), layer.height());
    layer.mapping_mut().reset(valid);
    for y in 0..height {
        for x in 0..width {
            if mask.is_target(x, y) {
                let source = coarse.get((x, y));
                if MappingInt::is_valid_source(source) {
                    layer.mapping_mut().set((x, y), (source.0 as f32, source.1 as f32));
                    valid[(y as usize) * (width as usize) + x as usize] = true;
                }
            }
        }
    }
}

/// Any finest-level target pixel that neither coarser-mapping adaption nor
/// video-prior projection managed to seed (possible at a mask's ragged
/// edges after repeated downsampling) gets one last uniform random
/// admissible draw, so the optimizer never sees an unseeded entry.
fn fill_unseeded<R: Rng + ?Sized>(layer: &mut LayerFloat, valid: &[bool], filter: Option<&Mask>, rng: &mut R) {
    let (width, height) = (layer.width(), layer.height());
    let mask = layer.mask().clone();
    for y in 0..height {
        for x in 0..width {
            let idx = (y as usize) * (width as usize) + x as usize;
            if mask.is_target(x, y) && !valid[idx] {
                loop {
                    let sx = rng.gen_range(0..width);
                    let sy = rng.gen_range(0..height);
                    if mask.is_source_admissible(sx, sy, filter) {
                        layer.mapping_mut().set((x, y), (sx as f32, sy as f32));
                        break;
                    }
                }
            }
        }
    }
}

/// Result of one full pyramid run: the inpainted output frame, the
/// converged finest-level float Mapping (for chaining to the next frame of
/// a video sequence), and the finest level's total combined cost (a
/// diagnostic for convergence logging and tests, spec.md property P1).
pub struct PyramidResult {
    pub frame: FrameBuf,
    pub mapping: MappingFloat,
    pub total_cost: u64,
}

/// Drives the whole coarse-to-fine synthesis over `frame`/`mask`, honoring
/// `filter` as an extra source-admissibility restriction and `video` as an
/// optional prior-frame warm start for the finest level. Runs inside `pool`
/// if given, otherwise the global rayon pool.
#[allow(clippy::too_many_arguments)]
pub fn run(
    frame: FrameView,
    mask: &Mask,
    filter: Option<&Mask>,
    constraints: Option<&[Constraint]>,
    config: &EngineConfig,
    seed: Seed,
    video: Option<&VideoContext>,
    pool: Option<&rayon::ThreadPool>,
    cancel: &CancelToken,
) -> Result<PyramidResult> {
    config.validate()?;
    if mask.bounding_box().is_none() {
        return Err(EngineError::InvalidInput("mask has no target pixels".into()));
    }

    let run_inner = || run_levels(frame, mask, filter, constraints, config, seed, video, cancel);
    match pool {
        Some(p) => p.install(run_inner),
        None => run_inner(),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_levels(
    frame: FrameView,
    mask: &Mask,
    filter: Option<&Mask>,
    constraints: Option<&[Constraint]>,
    config: &EngineConfig,
    seed: Seed,
    video: Option<&VideoContext>,
    cancel: &CancelToken,
) -> Result<PyramidResult> {
    let pyramid = build_pyramid(&frame, mask, filter, config);
    let num_levels = pyramid.frames.len();
    if num_levels == 0 {
        warn!("pyramid construction produced no usable level");
        return Err(EngineError::NumericDegenerate);
    }
    let coarsest_idx = num_levels - 1;

    // Coarsest level: seed via the configured strategy, then optimize.
    let mut coarsest_frame = pyramid.frames[coarsest_idx].clone();
    let mut coarse_mask = pyramid.masks[coarsest_idx].clone();
    let coarsest_filter = pyramid.filters[coarsest_idx].clone();
    let mut coarse_mapping = {
        let mut layer = LayerInt::new(coarsest_frame.view_mut(), coarse_mask.clone())?;
        let mut rng = new_rng(seed);
        init::initialize_coarsest(&mut layer, coarsest_filter.as_ref(), config, &mut rng);
        debug!(
            "coarsest level {}x{} seeded with {:?}",
            layer.width(),
            layer.height(),
            config.coarse_initializer
        );
        optimize::optimize_int(&mut layer, coarsest_filter.as_ref(), config, seed, config.coarsest_sweeps, cancel)?;
        layer.mapping().clone()
    };

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    // Intermediate levels: coarser-mapping adaption, then a few sweeps.
    for level in (1..coarsest_idx).rev() {
        let mut level_frame = if (level as u32) <= config.forced_1channel_layers {
            pyramid.frames[level].to_grayscale()
        } else {
            pyramid.frames[level].clone()
        };
        let level_mask = pyramid.masks[level].clone();
        let level_filter = pyramid.filters[level].clone();
        let mut layer = LayerInt::new(level_frame.view_mut(), level_mask.clone())?;
        init::adapt_from_coarser(&coarse_mapping, &coarse_mask, &mut layer);
        optimize::optimize_int(&mut layer, level_filter.as_ref(), config, seed, config.optimization_iterations, cancel)?;
        debug!("level {} ({}x{}) optimized", level, layer.width(), layer.height());
        coarse_mapping = layer.mapping().clone();
        coarse_mask = level_mask;

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
    }

    // Finest level: float Mapping, seeded from the coarser adaption and/or
    // a video prior, then refined.
    let mut finest_frame = pyramid.frames[0].clone();
    let finest_mask = pyramid.masks[0].clone();
    let finest_filter = pyramid.filters[0].clone();
    let mut layer = LayerFloat::new(finest_frame.view_mut(), finest_mask)?;
    let mut valid: Vec<bool> = Vec::new();

    if coarsest_idx == 0 {
        seed_float_same_resolution(&coarse_mapping, &coarse_mask, &mut layer, &mut valid);
    } else {
        init::adapt_from_coarser_to_float(&coarse_mapping, &coarse_mask, &mut layer, &mut valid);
    }
    if let Some(vc) = video {
        init::project_prior(&vc.prior_mapping, &vc.homography, finest_filter.as_ref(), &mut layer, &mut valid);
    }
    let mut fill_rng = new_rng(seed.wrapping_add(0xF11_u64));
    fill_unseeded(&mut layer, &valid, finest_filter.as_ref(), &mut fill_rng);

    let constraint_set = constraints.filter(|c| !c.is_empty()).map(|c| {
        let mask_ref = layer.mask();
        ConstraintSet::build(c.to_vec(), mask_ref.width(), mask_ref.height(), |x, y| mask_ref.is_target(x, y))
    });

    optimize::optimize_float(&mut layer, finest_filter.as_ref(), constraint_set.as_ref(), config, seed, config.finest_sweeps, cancel)?;

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let mapping = layer.mapping().clone();
    let total_cost = creator::total_cost_float(&layer, &frame, config);
    let output = creator::create_inpainted_frame_float(&layer, &frame, config);
    debug!("finest level converged, total cost {}", total_cost);

    Ok(PyramidResult { frame: output, mapping, total_cost })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};

    fn checkerboard(width: u32, height: u32) -> FrameBuf {
        let mut frame = FrameBuf::new(width, height, Channels::Gray);
        let mut view = frame.view_mut();
        for y in 0..height {
            for x in 0..width {
                view.pixel_mut(x, y)[0] = if (x / 4 + y / 4) % 2 == 0 { 220 } else { 30 };
            }
        }
        frame
    }

    #[test]
    fn rejects_a_mask_with_no_target_pixels() {
        let frame = checkerboard(32, 32);
        let mask = Mask::new_all_source(32, 32);
        let config = EngineConfig::default();
        let err = run(frame.view(), &mask, None, None, &config, 1, None, None, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn fills_a_small_masked_region_without_error() {
        let frame = checkerboard(32, 32);
        let mut mask = Mask::new_all_source(32, 32);
        for y in 12..20 {
            for x in 12..20 {
                mask.set(x, y, 0);
            }
        }
        let config = EngineConfig { coarsest_sweeps: 2, optimization_iterations: 1, finest_sweeps: 2, ..EngineConfig::default() };
        let result = run(frame.view(), &mask, None, None, &config, 7, None, None, &CancelToken::new()).unwrap();
        assert_eq!(result.frame.width(), 32);
        assert_eq!(result.frame.height(), 32);
        for y in 0..32 {
            for x in 0..32 {
                if mask.is_source(x, y) {
                    assert_eq!(result.frame.view().pixel(x, y), frame.view().pixel(x, y));
                }
            }
        }
    }

    #[test]
    fn forced_1channel_layers_still_produces_a_full_channel_output() {
        let mut frame = FrameBuf::new(48, 48, Channels::Rgb);
        {
            let mut view = frame.view_mut();
            for y in 0..48u32 {
                for x in 0..48u32 {
                    let p = view.pixel_mut(x, y);
                    p[0] = ((x * 5) % 256) as u8;
                    p[1] = ((y * 5) % 256) as u8;
                    p[2] = 128;
                }
            }
        }
        let mut mask = Mask::new_all_source(48, 48);
        for y in 18..30 {
            for x in 18..30 {
                mask.set(x, y, 0);
            }
        }
        let config = EngineConfig {
            forced_1channel_layers: 1,
            coarsest_sweeps: 2,
            optimization_iterations: 1,
            finest_sweeps: 2,
            ..EngineConfig::default()
        };
        let result = run(frame.view(), &mask, None, None, &config, 5, None, None, &CancelToken::new()).unwrap();
        assert_eq!(result.frame.channels(), Channels::Rgb);
    }

    #[test]
    fn cancellation_before_any_sweep_is_observed() {
        let frame = checkerboard(16, 16);
        let mut mask = Mask::new_all_source(16, 16);
        mask.set(8, 8, 0);
        let config = EngineConfig::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run(frame.view(), &mask, None, None, &config, 3, None, None, &cancel).unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
