//! Appearance Initializer (spec.md 4.C): draws `candidates` random
//! admissible sources per target pixel and keeps whichever has the lowest
//! appearance cost alone (no spatial term yet, since nothing has a mapping
//! to be coherent with at this stage).

use rand::Rng;

use crate::frame::FrameView;
use crate::geometry::Rect;
use crate::mapping::MappingInt;
use crate::mask::Mask;
use crate::random::uniform_point;

#[allow(clippy::too_many_arguments)]
pub fn initialize<R: Rng + ?Sized>(
    mapping: &mut MappingInt,
    mask: &Mask,
    filter: Option<&Mask>,
    frame: &FrameView,
    bbox: Rect,
    candidates: u32,
    rng: &mut R,
) {
    let (width, height) = (mapping.width(), mapping.height());
    for y in bbox.top()..bbox.bottom() {
        for x in bbox.left()..bbox.right() {
            if mask.is_source(x, y) {
                continue;
            }
            let mut best_cost = u64::MAX;
            let mut best_source = None;
            for _ in 0..candidates.max(1) {
                let (sx, sy) = uniform_point(rng, width, height);
                if !mask.is_source_admissible(sx, sy, filter) {
                    continue;
                }
                let source = (sx as i32, sy as i32);
                let cost = mapping.appearance_cost(frame, mask, (x, y), source, 1, false);
                if cost < best_cost {
                    best_cost = cost;
                    best_source = Some(source);
                }
            }
            if let Some(source) = best_source {
                mapping.set((x, y), source);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};
    use crate::mask::Mask;
    use crate::random::new_rng;

    #[test]
    fn prefers_the_closer_appearance_match() {
        let mut frame = FrameBuf::new(8, 8, Channels::Gray);
        {
            let mut view = frame.view_mut();
            for y in 0..8 {
                for x in 0..4 {
                    view.pixel_mut(x, y)[0] = 10;
                }
                for x in 4..8 {
                    view.pixel_mut(x, y)[0] = 200;
                }
            }
        }
        let mut mask = Mask::new_all_source(8, 8);
        mask.set(1, 1, 0);
        let mut mapping = MappingInt::new(8, 8);
        let mut rng = new_rng(7);
        initialize(&mut mapping, &mask, None, &frame.view(), mask.bounding_box().unwrap(), 200, &mut rng);
        let source = mapping.get((1, 1));
        assert!(source.0 < 4);
    }
}
