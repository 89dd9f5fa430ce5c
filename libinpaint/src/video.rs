//! Video mode (spec.md 6 "Option<VideoContext>"): reprojects the previous
//! frame's converged finest-level Mapping through a homography tracked
//! from background motion, giving the next frame's finest level a warm
//! start instead of synthesizing it from scratch.

use crate::constraint::Constraint;
use crate::error::Result;
use crate::frame::FrameView;
use crate::init::Homography;
use crate::mapping::MappingFloat;
use crate::mask::Mask;
use crate::optimize::CancelToken;
use crate::pyramid::{self, PyramidResult};
use crate::random::Seed;
use crate::config::EngineConfig;

/// Carries one frame's converged Mapping forward into the next frame's
/// synthesis call.
#[derive(Clone)]
pub struct VideoContext {
    pub prior_mapping: MappingFloat,
    pub homography: Homography,
}

impl VideoContext {
    pub fn new(prior_mapping: MappingFloat, homography: Homography) -> VideoContext {
        VideoContext { prior_mapping, homography }
    }
}

/// Synthesizes one frame of a sequence, optionally warm-started from
/// `prior`, and returns both the inpainted frame and a [`VideoContext`]
/// ready to seed the next call.
#[allow(clippy::too_many_arguments)]
pub fn synthesize_frame(
    frame: FrameView,
    mask: &Mask,
    filter: Option<&Mask>,
    constraints: Option<&[Constraint]>,
    config: &EngineConfig,
    seed: Seed,
    prior: Option<&VideoContext>,
    pool: Option<&rayon::ThreadPool>,
    cancel: &CancelToken,
) -> Result<(PyramidResult, VideoContext)> {
    let result = pyramid::run(frame, mask, filter, constraints, config, seed, prior, pool, cancel)?;
    let homography = prior.map(|p| p.homography).unwrap_or_else(Homography::identity);
    let next_context = VideoContext::new(result.mapping.clone(), homography);
    Ok((result, next_context))
}

/// Runs [`synthesize_frame`] over a whole sequence, threading each frame's
/// converged Mapping into the next via `homography_for(i)` (the caller's
/// tracked background motion from frame `i` to frame `i+1`).
pub fn synthesize_sequence<'a, F>(
    frames: impl Iterator<Item = (FrameView<'a>, &'a Mask, Option<&'a Mask>, Option<&'a [Constraint]>)>,
    config: &EngineConfig,
    seed: Seed,
    mut homography_for: F,
    pool: Option<&rayon::ThreadPool>,
    cancel: &CancelToken,
) -> Result<Vec<PyramidResult>>
where
    F: FnMut(usize) -> Homography,
{
    let mut outputs = Vec::new();
    let mut context: Option<VideoContext> = None;
    for (i, (frame, mask, filter, constraints)) in frames.enumerate() {
        let prior = context.as_ref().map(|c| VideoContext::new(c.prior_mapping.clone(), homography_for(i)));
        let (result, next_context) = synthesize_frame(
            frame,
            mask,
            filter,
            constraints,
            config,
            seed.wrapping_add(i as u64),
            prior.as_ref(),
            pool,
            cancel,
        )?;
        context = Some(next_context);
        outputs.push(result);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};

    #[test]
    fn context_round_trips_the_mapping_and_homography() {
        let mapping = MappingFloat::new(4, 4);
        let h = Homography::identity();
        let ctx = VideoContext::new(mapping, h);
        assert_eq!(ctx.prior_mapping.width(), 4);
    }

    #[test]
    fn sequence_of_two_frames_both_synthesize() {
        let mut frame = FrameBuf::new(24, 24, Channels::Gray);
        {
            let mut view = frame.view_mut();
            for y in 0..24 {
                for x in 0..24 {
                    view.pixel_mut(x, y)[0] = ((x + y) % 7 * 30) as u8;
                }
            }
        }
        let mut mask = Mask::new_all_source(24, 24);
        for y in 10..14 {
            for x in 10..14 {
                mask.set(x, y, 0);
            }
        }
        let config = EngineConfig { coarsest_sweeps: 1, optimization_iterations: 1, finest_sweeps: 1, ..EngineConfig::default() };
        let frames = vec![(frame.view(), &mask, None, None), (frame.view(), &mask, None, None)];
        let cancel = CancelToken::new();
        let outputs = synthesize_sequence(frames.into_iter(), &config, 5, |_| Homography::identity(), None, &cancel).unwrap();
        assert_eq!(outputs.len(), 2);
    }
}
