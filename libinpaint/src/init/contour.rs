//! Contour Initializer (spec.md 4.C): orders target pixels by distance to
//! the inner mask boundary ([`crate::mask::Mask::distance_to_boundary`])
//! and fills them innermost-last, each picking the best appearance match
//! among a handful of random admissible candidates plus its already-filled
//! neighbors' mappings as extra candidates.

use rand::Rng;

use crate::frame::FrameView;
use crate::mapping::MappingInt;
use crate::mask::Mask;
use crate::random::uniform_point;

const RANDOM_CANDIDATES: u32 = 16;
const DISTANCE_CAP: u8 = 255;

pub fn initialize<R: Rng + ?Sized>(mapping: &mut MappingInt, real_mask: &Mask, frame: &FrameView, rng: &mut R) {
    let (width, height) = (mapping.width(), mapping.height());
    let mut mask = real_mask.clone();
    let distance = mask.distance_to_boundary(DISTANCE_CAP);

    let mut order: Vec<(u32, u32)> = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if mask.is_target(x, y) {
                order.push((x, y));
            }
        }
    }
    order.sort_by_key(|&(x, y)| distance[(y as usize) * (width as usize) + x as usize]);

    let neighbors = [(0i32, -1i32), (-1, 0), (1, 0), (0, 1)];
    for (x, y) in order {
        let mut best_cost = u64::MAX;
        let mut best_source = None;
        let mut consider = |candidate: (i32, i32), best_cost: &mut u64, best_source: &mut Option<(i32, i32)>| {
            if candidate.0 < 0 || candidate.1 < 0 {
                return;
            }
            let (cx, cy) = (candidate.0 as u32, candidate.1 as u32);
            if cx >= width || cy >= height || !mask.is_source(cx, cy) {
                return;
            }
            let cost = mapping.appearance_cost(frame, &mask, (x, y), candidate, 1, false);
            if cost < *best_cost {
                *best_cost = cost;
                *best_source = Some(candidate);
            }
        };
        for &(dx, dy) in &neighbors {
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            if nx < 0 || ny < 0 || nx as u32 >= width || ny as u32 >= height {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if mask.is_source(nx, ny) {
                let neighbor_mapping = mapping.get((nx, ny));
                consider((neighbor_mapping.0 - dx, neighbor_mapping.1 - dy), &mut best_cost, &mut best_source);
            }
        }
        for _ in 0..RANDOM_CANDIDATES {
            let (sx, sy) = uniform_point(rng, width, height);
            consider((sx as i32, sy as i32), &mut best_cost, &mut best_source);
        }
        if let Some(source) = best_source {
            mapping.set((x, y), source);
        }
        mask.set(x, y, crate::mask::SOURCE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};
    use crate::mask::Mask;
    use crate::random::new_rng;

    #[test]
    fn every_target_pixel_is_assigned_a_source() {
        let frame = FrameBuf::new(8, 8, Channels::Gray);
        let mut mask = Mask::new_all_source(8, 8);
        for y in 3..5 {
            for x in 3..5 {
                mask.set(x, y, 0);
            }
        }
        let mut mapping = MappingInt::new(8, 8);
        let mut rng = new_rng(9);
        initialize(&mut mapping, &mask, &frame.view(), &mut rng);
        for y in 3..5 {
            for x in 3..5 {
                let source = mapping.get((x, y));
                assert!(mask.in_bounds(source.0 as i64, source.1 as i64));
            }
        }
    }
}
