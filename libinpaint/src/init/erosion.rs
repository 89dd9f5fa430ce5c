//! Erosion and RandomErosion Initializers (spec.md 4.C): the target region
//! is filled inward, ring by ring, from its source boundary — the same
//! marching-inward idea as [`crate::mask::Mask::erode_step`], but copying
//! mapping values forward instead of simply flipping mask bits. The march
//! only ever produces a rough placeholder Mapping; once the mask has fully
//! shrunk, the Appearance initializer re-picks every originally-target
//! pixel's source from scratch, which is the actual final Mapping ("For
//! the resulting initial inpainting image the final mapping is determined
//! by application of [a] simple appearance mapping initializer").

use rand::Rng;

use crate::frame::FrameView;
use crate::geometry::Rect;
use crate::mapping::MappingInt;
use crate::mask::Mask;
use crate::random::uniform_point;

use super::appearance;

/// Each newly-exposed ring pixel copies the mapping of whichever of its
/// four axial neighbors was exposed (or was already source) in the
/// previous ring, offset by the same axial step — a direct nearest-neighbor
/// extension of the boundary. The march result is then discarded in favor
/// of an Appearance pass over the original target region.
#[allow(clippy::too_many_arguments)]
pub fn initialize_erosion<R: Rng + ?Sized>(
    mapping: &mut MappingInt,
    mask: &Mask,
    filter: Option<&Mask>,
    frame: &FrameView,
    bbox: Rect,
    appearance_candidates: u32,
    rng: &mut R,
) {
    march::<R>(mapping, mask, None);
    appearance::initialize(mapping, mask, filter, frame, bbox, appearance_candidates, rng);
}

/// As [`initialize_erosion`], but the march perturbs a newly-exposed
/// pixel's source with a small random admissible jitter rather than
/// copying verbatim, before the same Appearance finalization pass.
#[allow(clippy::too_many_arguments)]
pub fn initialize_random_erosion<R: Rng + ?Sized>(
    mapping: &mut MappingInt,
    mask: &Mask,
    filter: Option<&Mask>,
    frame: &FrameView,
    bbox: Rect,
    appearance_candidates: u32,
    rng: &mut R,
) {
    march(mapping, mask, Some(&mut *rng));
    appearance::initialize(mapping, mask, filter, frame, bbox, appearance_candidates, rng);
}

fn march<R: Rng + ?Sized>(mapping: &mut MappingInt, real_mask: &Mask, mut rng: Option<&mut R>) {
    let (width, height) = (mapping.width(), mapping.height());
    let mut mask = real_mask.clone();
    let neighbors = [(0i32, -1i32), (-1, 0), (1, 0), (0, 1)];
    while mask.has_target() {
        let mut newly_source = Vec::new();
        for y in 0..height {
            for x in 0..width {
                if mask.is_source(x, y) {
                    continue;
                }
                for &(dx, dy) in &neighbors {
                    let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                    if nx < 0 || ny < 0 || nx as u32 >= width || ny as u32 >= height {
                        continue;
                    }
                    let (nx, ny) = (nx as u32, ny as u32);
                    if !mask.is_source(nx, ny) {
                        continue;
                    }
                    let neighbor_mapping = mapping.get((nx, ny));
                    let mut source = (neighbor_mapping.0 - dx, neighbor_mapping.1 - dy);
                    if let Some(r) = rng.as_deref_mut() {
                        if r.gen_bool(0.3) {
                            let (jx, jy) = uniform_point(r, width, height);
                            if real_mask.is_source(jx, jy) {
                                source = (jx as i32, jy as i32);
                            }
                        }
                    }
                    if real_mask.in_bounds(source.0 as i64, source.1 as i64)
                        && real_mask.is_source(source.0 as u32, source.1 as u32)
                    {
                        mapping.set((x, y), source);
                        newly_source.push((x, y));
                        break;
                    }
                }
            }
        }
        if newly_source.is_empty() {
            // No boundary pixel had an admissible neighbor mapping this
            // ring (can happen only if the whole frame is target); stop to
            // avoid looping forever.
            break;
        }
        for (x, y) in newly_source {
            mask.set(x, y, crate::mask::SOURCE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};
    use crate::mapping::MappingInt;
    use crate::mask::Mask;
    use crate::random::new_rng;

    #[test]
    fn erosion_fills_every_target_pixel() {
        let mut mask = Mask::new_all_source(8, 8);
        for y in 3..5 {
            for x in 3..5 {
                mask.set(x, y, 0);
            }
        }
        let frame = FrameBuf::new(8, 8, Channels::Gray);
        let mut mapping = MappingInt::new(8, 8);
        let mut rng = new_rng(1);
        let bbox = mask.bounding_box().unwrap();
        initialize_erosion(&mut mapping, &mask, None, &frame.view(), bbox, 20, &mut rng);
        let source = mapping.get((3, 3));
        assert!(mask.is_source(source.0 as u32, source.1 as u32));
    }

    #[test]
    fn random_erosion_also_fills_every_target_pixel() {
        let mut mask = Mask::new_all_source(8, 8);
        for y in 3..5 {
            for x in 3..5 {
                mask.set(x, y, 0);
            }
        }
        let frame = FrameBuf::new(8, 8, Channels::Gray);
        let mut mapping = MappingInt::new(8, 8);
        let mut rng = new_rng(3);
        let bbox = mask.bounding_box().unwrap();
        initialize_random_erosion(&mut mapping, &mask, None, &frame.view(), bbox, 20, &mut rng);
        let source = mapping.get((4, 4));
        assert!(mask.is_source(source.0 as u32, source.1 as u32));
    }
}
