//! Component C — Initializers (spec.md 4.C).
//!
//! Each submodule implements one family of strategies for seeding the
//! coarsest pyramid level's Mapping; [`initialize_coarsest`] is the single
//! entry point the Pyramid Driver calls, dispatching on
//! [`crate::config::CoarseInitializer`]. Every non-coarsest level is instead
//! seeded by [`coarser::adapt_from_coarser`], which all strategies share.
//!
//! Submodules take the Mapping, Mask and Frame apart rather than a whole
//! `&mut Layer`, since every strategy needs to read the frame while
//! mutating the mapping — two borrows a single `&mut Layer` can't express
//! through accessor methods (spec.md 9 "owning vs borrowing").

mod appearance;
mod coarser;
mod contour;
mod erosion;
mod homography;
mod patch_match;
mod random;

pub use coarser::{adapt_from_coarser, adapt_from_coarser_to_float};
pub use homography::{project_prior, Homography};

use rand::Rng;

use crate::config::{CoarseInitializer, EngineConfig};
use crate::layer::LayerInt;
use crate::mask::Mask;

/// Seeds `layer`'s Mapping at the coarsest pyramid level according to
/// `config.coarse_initializer`. `layer`'s mapping is assumed freshly reset.
/// `filter`, when given, is an extra admissibility restriction on top of
/// `layer`'s own mask (spec.md 6 "Option<Filter>"); the free-candidate
/// strategies (Random, Appearance, the Patch* family) honor it directly.
/// The marching Erosion/Contour strategies only ever propagate an already
/// admissible neighbor's mapping, so they never need to consult it.
pub fn initialize_coarsest<R: Rng + ?Sized>(layer: &mut LayerInt, filter: Option<&Mask>, config: &EngineConfig, rng: &mut R) {
    let bbox = layer.bounding_box();
    let (frame, mask, mapping) = layer.parts_mut();
    let frame = frame.as_view();
    match config.coarse_initializer {
        CoarseInitializer::Random => random::initialize(mapping, mask, filter, bbox, rng),
        CoarseInitializer::Appearance => {
            appearance::initialize(mapping, mask, filter, &frame, bbox, config.appearance_candidates, rng)
        }
        CoarseInitializer::Erosion => {
            erosion::initialize_erosion(mapping, mask, filter, &frame, bbox, config.appearance_candidates, rng)
        }
        CoarseInitializer::RandomErosion => {
            erosion::initialize_random_erosion(mapping, mask, filter, &frame, bbox, config.appearance_candidates, rng)
        }
        CoarseInitializer::Contour => contour::initialize(mapping, mask, &frame, rng),
        CoarseInitializer::PatchFullArea1 => {
            patch_match::initialize(mapping, mask, filter, &frame, bbox, patch_match::Strategy::FullArea, 1, rng)
        }
        CoarseInitializer::PatchFullArea2 => {
            patch_match::initialize(mapping, mask, filter, &frame, bbox, patch_match::Strategy::FullArea, 2, rng)
        }
        CoarseInitializer::PatchSubRegion1 => {
            patch_match::initialize(mapping, mask, filter, &frame, bbox, patch_match::Strategy::SubRegion, 1, rng)
        }
        CoarseInitializer::PatchSubRegion2 => {
            patch_match::initialize(mapping, mask, filter, &frame, bbox, patch_match::Strategy::SubRegion, 2, rng)
        }
        CoarseInitializer::PatchFullAreaHeuristic1 => {
            patch_match::initialize(mapping, mask, filter, &frame, bbox, patch_match::Strategy::FullAreaHeuristic, 1, rng)
        }
        CoarseInitializer::PatchFullAreaHeuristic2 => {
            patch_match::initialize(mapping, mask, filter, &frame, bbox, patch_match::Strategy::FullAreaHeuristic, 2, rng)
        }
    }
}
