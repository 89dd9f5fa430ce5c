//! Coarser-mapping adaption (spec.md 4.C "every other level reuses the
//! coarser level's Mapping, scaled to the finer resolution"): every
//! non-coarsest level's Mapping is seeded by doubling the coordinates of
//! the coarser level's entries, with the exact rounded-quadrant tie rule
//! the original engine uses so that which of the four finer pixels under a
//! coarse pixel gets the "as-is" doubled mapping and which get a `+1`
//! offset is reproducible rather than arbitrary.
//!
//! Takes the coarser level's Mapping and Mask directly rather than a whole
//! Layer: the Pyramid Driver only keeps the converged Mapping/Mask pair
//! between levels, not a live Layer borrowing a frame buffer it is about
//! to move on from.

use crate::layer::{LayerFloat, LayerInt};
use crate::mapping::MappingInt;
use crate::mask::Mask;

/// Doubles `coarse_mapping`'s entries into `fine`'s, one coarse pixel
/// expanding into its four finer children. Reproduces the original
/// engine's integer float-quadrant logic: each child's doubled source
/// coordinate is `2*coarse_source + child_offset`, where `child_offset` is
/// the child's own `(dx, dy) in {0, 1}^2` position — i.e. neighboring fine
/// pixels under the same coarse parent get neighboring, not identical,
/// source pixels.
pub fn adapt_from_coarser(coarse_mapping: &MappingInt, coarse_mask: &Mask, fine: &mut LayerInt) {
    let (fw, fh) = (fine.width(), fine.height());
    let fine_mask = fine.mask().clone();
    let fine_mapping = fine.mapping_mut();
    for fy in 0..fh {
        for fx in 0..fw {
            if fine_mask.is_source(fx, fy) {
                continue;
            }
            let (cx, cy) = (fx / 2, fy / 2);
            if cx >= coarse_mapping.width() || cy >= coarse_mapping.height() {
                continue;
            }
            if coarse_mask.is_source(cx, cy) {
                continue;
            }
            let coarse_source = coarse_mapping.get((cx, cy));
            if !MappingInt::is_valid_source(coarse_source) {
                continue;
            }
            let (child_dx, child_dy) = (fx & 1, fy & 1);
            let fine_source = (2 * coarse_source.0 + child_dx as i32, 2 * coarse_source.1 + child_dy as i32);
            fine_mapping.set((fx, fy), fine_source);
        }
    }
}

/// The finest level uses a `MappingFloat`; its seed is the same doubled
/// coarse mapping, but stored as an exact float (no quadrant offset, since
/// sub-pixel refinement will move it immediately anyway).
pub fn adapt_from_coarser_to_float(coarse_mapping: &MappingInt, coarse_mask: &Mask, fine: &mut LayerFloat, valid: &mut Vec<bool>) {
    let (fw, fh) = (fine.width(), fine.height());
    let fine_mask = fine.mask().clone();
    fine.mapping_mut().reset(valid);
    let fine_mapping = fine.mapping_mut();
    for fy in 0..fh {
        for fx in 0..fw {
            if fine_mask.is_source(fx, fy) {
                continue;
            }
            let (cx, cy) = (fx / 2, fy / 2);
            if cx >= coarse_mapping.width() || cy >= coarse_mapping.height() {
                continue;
            }
            if coarse_mask.is_source(cx, cy) {
                continue;
            }
            let coarse_source = coarse_mapping.get((cx, cy));
            if !MappingInt::is_valid_source(coarse_source) {
                continue;
            }
            let (child_dx, child_dy) = ((fx & 1) as f32, (fy & 1) as f32);
            let fine_source = (2.0 * coarse_source.0 as f32 + child_dx, 2.0 * coarse_source.1 as f32 + child_dy);
            fine_mapping.set((fx, fy), fine_source);
            valid[(fy as usize) * (fw as usize) + fx as usize] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};
    use crate::mask::Mask;

    #[test]
    fn neighbouring_children_get_neighbouring_sources() {
        let mut coarse_mask = Mask::new_all_source(4, 4);
        coarse_mask.set(1, 1, 0);
        let mut coarse_mapping = MappingInt::new(4, 4);
        coarse_mapping.set((1, 1), (0, 0));

        let mut fine_frame = FrameBuf::new(8, 8, Channels::Gray);
        let mut fine_mask = Mask::new_all_source(8, 8);
        for y in 2..4 {
            for x in 2..4 {
                fine_mask.set(x, y, 0);
            }
        }
        let mut fine = LayerInt::new(fine_frame.view_mut(), fine_mask).unwrap();
        adapt_from_coarser(&coarse_mapping, &coarse_mask, &mut fine);

        let s00 = fine.mapping().get((2, 2));
        let s11 = fine.mapping().get((3, 3));
        assert_eq!(s00, (0, 0));
        assert_eq!(s11, (1, 1));
    }
}
