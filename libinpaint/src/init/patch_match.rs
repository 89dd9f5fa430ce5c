//! Shrinking-patch-match coarsest Initializer (spec.md 4.C), grounded on
//! `InitializerShrinkingPatchMatchingI1.h`/`.cpp`: a priority-queue boundary
//! march, one 5x5 patch at a time, rather than the free-candidate or
//! ring-marching strategies the rest of `init/` uses. Every boundary pixel
//! is ranked by how well its border direction lines up with the
//! surrounding image's gradient orientation — a straight edge crossing the
//! mask gets inpainted before a flat, directionless patch of boundary — and
//! the highest-priority pixel is popped, matched against one 5x5 patch with
//! its own (not-yet-resolved) center excluded, and its resolved color
//! folded back into a working copy of the frame before the next pop, so
//! later matches in the same march see real neighbor colors rather than
//! the original mask-covered ones.
//!
//! `iterations` (1 or 2, from the `CoarseInitializer` variant's `1`/`2`
//! suffix) re-runs the whole march that many times: the boundary always
//! restarts from the original mask, but the frame and its Sobel response
//! carry resolved colors forward from the previous pass, so a second pass
//! refines the first pass's guesses rather than starting over blind.

use std::f32::consts::FRAC_PI_2;

use rand::Rng;

use crate::frame::{FrameBuf, FrameView};
use crate::geometry::Rect;
use crate::mapping::MappingInt;
use crate::mask::Mask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FullArea,
    SubRegion,
    FullAreaHeuristic,
}

/// Local search radius `InitializerShrinkingPatchMatchingI1`'s
/// `maximalBoundingBoxOffset_` constructor argument names for its bounded
/// (non-heuristic, non-full-area) mode.
const SUB_REGION_OFFSET: u32 = 24;

const RANDOM_DIRECTIONS: u32 = 100;
const RANDOM_REFINEMENT_ITERATIONS: i64 = 200;

/// Per-pixel, per-channel `(horizontal, vertical)` Sobel response; zero at
/// the frame border, where the original leaves the response unfilled.
type SobelResponse = Vec<[(i32, i32); 4]>;

#[allow(clippy::too_many_arguments)]
pub fn initialize<R: Rng + ?Sized>(
    mapping: &mut MappingInt,
    mask: &Mask,
    filter: Option<&Mask>,
    frame: &FrameView,
    bbox: Rect,
    strategy: Strategy,
    iterations: u32,
    rng: &mut R,
) {
    if bbox.is_empty() {
        return;
    }
    let heuristic = strategy == Strategy::FullAreaHeuristic;
    let maximal_offset = match strategy {
        Strategy::SubRegion => Some(SUB_REGION_OFFSET),
        Strategy::FullArea | Strategy::FullAreaHeuristic => None,
    };

    let mut working = FrameBuf::new(frame.width(), frame.height(), frame.channels());
    copy_into(frame, &mut working);
    let mut sobel = compute_sobel(&working);

    for _ in 0..iterations.max(1) {
        run_march(mapping, mask, filter, &mut working, &mut sobel, bbox, heuristic, maximal_offset, rng);
    }
}

fn copy_into(src: &FrameView, dst: &mut FrameBuf) {
    let c = src.channels().count();
    let mut view = dst.view_mut();
    for y in 0..src.height() {
        for x in 0..src.width() {
            view.pixel_mut(x, y)[..c].copy_from_slice(&src.pixel(x, y)[..c]);
        }
    }
}

fn compute_sobel(working: &FrameBuf) -> SobelResponse {
    let (width, height) = (working.width(), working.height());
    let channels = working.channels().count();
    let view = working.view();
    let mut out = vec![[(0i32, 0i32); 4]; (width as usize) * (height as usize)];
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let idx = (y as usize) * (width as usize) + x as usize;
            for ch in 0..channels {
                out[idx][ch] = sobel_at(&view, x, y, ch);
            }
        }
    }
    out
}

fn sobel_at(view: &FrameView, x: u32, y: u32, ch: usize) -> (i32, i32) {
    let p = |dx: i32, dy: i32| view.pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[ch] as i32;
    let gx = -p(-1, -1) + p(1, -1) - 2 * p(-1, 0) + 2 * p(1, 0) - p(-1, 1) + p(1, 1);
    let gy = -p(-1, -1) - 2 * p(0, -1) - p(1, -1) + p(-1, 1) + 2 * p(0, 1) + p(1, 1);
    (gx, gy)
}

fn update_sobel_window(sobel: &mut SobelResponse, working: &FrameBuf, x: u32, y: u32) {
    let (width, height) = (working.width(), working.height());
    let channels = working.channels().count();
    let view = working.view();
    for ny in y.saturating_sub(1).max(1)..(y + 2).min(height.saturating_sub(1)) {
        for nx in x.saturating_sub(1).max(1)..(x + 2).min(width.saturating_sub(1)) {
            let idx = (ny as usize) * (width as usize) + nx as usize;
            for ch in 0..channels {
                sobel[idx][ch] = sobel_at(&view, nx, ny, ch);
            }
        }
    }
}

/// Whether every in-bounds pixel of `(x, y)`'s own 3x3 neighborhood is a
/// source pixel under `mask` — the "deep source" predicate
/// `determineBorderDirection5x5`/`determineImageOrientation5x5` both use to
/// decide which 5x5-window cells may contribute.
fn is_deep_source(mask: &Mask, x: u32, y: u32) -> bool {
    let (width, height) = (mask.width() as i32, mask.height() as i32);
    for dy in -1..=1 {
        for dx in -1..=1 {
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            if nx < 0 || ny < 0 || nx >= width || ny >= height {
                continue;
            }
            if mask.is_target(nx as u32, ny as u32) {
                return false;
            }
        }
    }
    true
}

fn border_direction_5x5(mask: &Mask, x: u32, y: u32) -> (i32, i32) {
    let (width, height) = (mask.width() as i32, mask.height() as i32);
    let mut direction = (0i32, 0i32);
    for ny in (y as i32 - 2).max(0)..(y as i32 + 3).min(height) {
        for nx in (x as i32 - 2).max(0)..(x as i32 + 3).min(width) {
            if is_deep_source(mask, nx as u32, ny as u32) {
                direction.0 += nx - x as i32;
                direction.1 += ny - y as i32;
            }
        }
    }
    direction
}

fn image_orientation_5x5(sobel: &SobelResponse, mask: &Mask, width: u32, height: u32, channels: usize, x: u32, y: u32) -> (i32, i32) {
    let mut orientation = (0i32, 0i32);
    for ny in (y as i32 - 2).max(1)..(y as i32 + 3).min(height as i32 - 1) {
        for nx in (x as i32 - 2).max(1)..(x as i32 + 3).min(width as i32 - 1) {
            if is_deep_source(mask, nx as u32, ny as u32) {
                let idx = (ny as usize) * (width as usize) + nx as usize;
                for ch in 0..channels {
                    let (rx, ry) = sobel[idx][ch];
                    if rx >= 0 {
                        orientation.0 += rx;
                        orientation.1 += ry;
                    } else {
                        orientation.0 -= rx;
                        orientation.1 -= ry;
                    }
                }
            }
        }
    }
    orientation
}

#[derive(Debug, Clone, Copy)]
struct InpaintingPixel {
    priority: u64,
    tie_break: u64,
    x: u32,
    y: u32,
}

fn classify(mask: &Mask, sobel: &SobelResponse, width: u32, height: u32, channels: usize, x: u32, y: u32) -> InpaintingPixel {
    let border_direction = border_direction_5x5(mask, x, y);
    let image_orientation = image_orientation_5x5(sobel, mask, width, height, channels, x, y);
    let perpendicular = (-image_orientation.1, image_orientation.0);
    let dot = perpendicular.0 as i64 * border_direction.0 as i64 + perpendicular.1 as i64 * border_direction.1 as i64;
    InpaintingPixel { priority: dot.unsigned_abs(), tie_break: y as u64 * 1000 + x as u64, x, y }
}

fn sort_queue(queue: &mut [InpaintingPixel]) {
    queue.sort_by_key(|p| (p.priority, p.tie_break));
}

/// 4-connected mask-border pixels inside `bbox`: target pixels with at
/// least one in-bounds source neighbor.
fn find_border_pixels(mask: &Mask, bbox: Rect) -> Vec<(u32, u32)> {
    let mut result = Vec::new();
    for y in bbox.top()..bbox.bottom() {
        for x in bbox.left()..bbox.right() {
            if !mask.is_target(x, y) {
                continue;
            }
            let neighbors = [(0i32, -1i32), (-1, 0), (1, 0), (0, 1)];
            for (dx, dy) in neighbors {
                let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                if nx >= 0 && ny >= 0 && (nx as u32) < mask.width() && (ny as u32) < mask.height() && mask.is_source(nx as u32, ny as u32) {
                    result.push((x, y));
                    break;
                }
            }
        }
    }
    result
}

/// Tries `candidate` as a source for `target`, keeping it if it is
/// admissible and cheaper than whatever `best` already holds.
#[allow(clippy::too_many_arguments)]
fn try_candidate(
    mapping: &MappingInt,
    working: &FrameBuf,
    static_mask: &Mask,
    filter: Option<&Mask>,
    target: (u32, u32),
    candidate: (u32, u32),
    best: &mut Option<((u32, u32), u64)>,
) {
    if candidate == target {
        return;
    }
    if !static_mask.is_source_admissible(candidate.0, candidate.1, filter) {
        return;
    }
    let cost = mapping.appearance_cost(&working.view(), static_mask, target, (candidate.0 as i32, candidate.1 as i32), 1, true);
    if best.map_or(true, |(_, b)| cost < b) {
        *best = Some((candidate, cost));
    }
}

fn propagate_from_neighbor(
    mapping: &MappingInt,
    working: &FrameBuf,
    static_mask: &Mask,
    filter: Option<&Mask>,
    position: (u32, u32),
    width: u32,
    height: u32,
    best: &mut Option<((u32, u32), u64)>,
) {
    let (x, y) = position;
    let directions: [(i32, i32); 8] = [(-1, 0), (-1, -1), (0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1)];
    for (dx, dy) in directions {
        let (nx, ny) = (x as i32 + dx, y as i32 + dy);
        if nx < 0 || ny < 0 || nx as u32 >= width || ny as u32 >= height {
            continue;
        }
        let neighbor = (nx as u32, ny as u32);
        let neighbor_source = mapping.get(neighbor);
        if !MappingInt::is_valid_source(neighbor_source) {
            continue;
        }
        // Continue the neighbor's own offset one step further outward.
        let predicted = (neighbor_source.0 - dx, neighbor_source.1 - dy);
        for wy in (predicted.1 - 3).max(0)..(predicted.1 + 4).min(height as i32) {
            for wx in (predicted.0 - 3).max(0)..(predicted.0 + 4).min(width as i32) {
                try_candidate(mapping, working, static_mask, filter, (x, y), (wx as u32, wy as u32), best);
            }
        }
    }
}

fn rotate((x, y): (f32, f32), angle: f32) -> (f32, f32) {
    let (s, c) = angle.sin_cos();
    (x * c - y * s, x * s + y * c)
}

#[allow(clippy::too_many_arguments)]
fn random_direction_search<R: Rng + ?Sized>(
    mapping: &MappingInt,
    working: &FrameBuf,
    static_mask: &Mask,
    filter: Option<&Mask>,
    position: (u32, u32),
    border_direction: (i32, i32),
    width: u32,
    height: u32,
    rng: &mut R,
    best: &mut Option<((u32, u32), u64)>,
) {
    let length = (border_direction.0 as f32).hypot(border_direction.1 as f32);
    if length <= f32::EPSILON {
        return;
    }
    let normal = (border_direction.0 as f32 / length, border_direction.1 as f32 / length);
    let diagonal_quarter = ((width as f32).hypot(height as f32) * 0.25).min(10.0).max(1.0);

    for _ in 0..RANDOM_DIRECTIONS {
        let angle = rng.gen_range(-FRAC_PI_2..FRAC_PI_2);
        let offset_len = rng.gen_range(1.0..=diagonal_quarter);
        let rotated = rotate(normal, angle);
        let offset = (rotated.0 * offset_len, rotated.1 * offset_len);

        for sign in [1.0f32, -1.0] {
            let cand_x = position.0 as f32 + sign * offset.0;
            let cand_y = position.1 as f32 + sign * offset.1;
            let (cx, cy) = (cand_x.round(), cand_y.round());
            if cx < 0.0 || cy < 0.0 || cx >= width as f32 || cy >= height as f32 {
                continue;
            }
            try_candidate(mapping, working, static_mask, filter, position, (cx as u32, cy as u32), best);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn decaying_random_refinement<R: Rng + ?Sized>(
    mapping: &MappingInt,
    working: &FrameBuf,
    static_mask: &Mask,
    filter: Option<&Mask>,
    position: (u32, u32),
    width: u32,
    height: u32,
    rng: &mut R,
    best: &mut Option<((u32, u32), u64)>,
) {
    let Some((seed, _)) = *best else { return };
    for n in 0..RANDOM_REFINEMENT_ITERATIONS {
        let x_radius = (((width as i64 - (width as i64 - 1) * n / RANDOM_REFINEMENT_ITERATIONS) >> 1).max(1)) as i64;
        let y_radius = (((height as i64 - (height as i64 - 1) * n / RANDOM_REFINEMENT_ITERATIONS) >> 1).max(1)) as i64;
        let offset_x = rng.gen_range(-x_radius..=x_radius);
        let offset_y = rng.gen_range(-y_radius..=y_radius);
        let (cand_x, cand_y) = (seed.0 as i64 + offset_x, seed.1 as i64 + offset_y);
        if cand_x < 0 || cand_y < 0 || cand_x as u32 >= width || cand_y as u32 >= height {
            continue;
        }
        try_candidate(mapping, working, static_mask, filter, position, (cand_x as u32, cand_y as u32), best);
    }
}

#[allow(clippy::too_many_arguments)]
fn run_march<R: Rng + ?Sized>(
    mapping: &mut MappingInt,
    static_mask: &Mask,
    filter: Option<&Mask>,
    working: &mut FrameBuf,
    sobel: &mut SobelResponse,
    bbox: Rect,
    heuristic: bool,
    maximal_offset: Option<u32>,
    rng: &mut R,
) {
    let (width, height) = (working.width(), working.height());
    let channels = working.channels().count();
    let mut dynamic_mask = static_mask.clone();

    let mut queue: Vec<InpaintingPixel> = find_border_pixels(&dynamic_mask, bbox)
        .into_iter()
        .map(|(x, y)| classify(&dynamic_mask, sobel, width, height, channels, x, y))
        .collect();
    sort_queue(&mut queue);

    while let Some(current) = queue.pop() {
        let (x, y) = (current.x, current.y);
        let mut best: Option<((u32, u32), u64)> = None;

        if heuristic {
            propagate_from_neighbor(mapping, working, static_mask, filter, (x, y), width, height, &mut best);
            let border_direction = border_direction_5x5(&dynamic_mask, x, y);
            random_direction_search(mapping, working, static_mask, filter, (x, y), border_direction, width, height, rng, &mut best);
            decaying_random_refinement(mapping, working, static_mask, filter, (x, y), width, height, rng, &mut best);
        }

        if best.is_none() {
            match maximal_offset {
                None => {
                    for yy in 0..height {
                        for xx in 0..width {
                            try_candidate(mapping, working, static_mask, filter, (x, y), (xx, yy), &mut best);
                        }
                    }
                }
                Some(r) => {
                    let left = x.saturating_sub(r);
                    let top = y.saturating_sub(r);
                    let right = (x + r + 1).min(width);
                    let bottom = (y + r + 1).min(height);
                    for yy in top..bottom {
                        for xx in left..right {
                            try_candidate(mapping, working, static_mask, filter, (x, y), (xx, yy), &mut best);
                        }
                    }
                }
            }
        }

        if best.is_none() {
            // Practically unreachable: the static mask always has a source
            // pixel somewhere unless the whole frame is target, in which
            // case there is nothing sensible to match against anyway.
            'scan: for yy in 0..height {
                for xx in 0..width {
                    if (xx, yy) != (x, y) && static_mask.is_source(xx, yy) {
                        best = Some(((xx, yy), u64::MAX));
                        break 'scan;
                    }
                }
            }
        }

        let Some((source, _)) = best else { continue };

        let c = channels;
        let color = {
            let view = working.view();
            let mut buf = [0u8; 4];
            buf[..c].copy_from_slice(&view.pixel(source.0, source.1)[..c]);
            buf
        };
        working.view_mut().pixel_mut(x, y)[..c].copy_from_slice(&color[..c]);
        update_sobel_window(sobel, working, x, y);

        dynamic_mask.set(x, y, crate::mask::SOURCE);
        mapping.set((x, y), (source.0 as i32, source.1 as i32));

        let mut changed = Vec::new();
        queue.retain(|p| {
            let dx = (p.x as i32 - x as i32).abs();
            let dy = (p.y as i32 - y as i32).abs();
            if dx <= 3 && dy <= 3 {
                changed.push((p.x, p.y));
                false
            } else {
                true
            }
        });
        for (dx, dy) in [(0i32, -1i32), (-1, 0), (1, 0), (0, 1)] {
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            if nx < 0 || ny < 0 || nx as u32 >= width || ny as u32 >= height {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if dynamic_mask.is_target(nx, ny) && !changed.contains(&(nx, ny)) {
                changed.push((nx, ny));
            }
        }
        for (cx, cy) in changed {
            queue.push(classify(&dynamic_mask, sobel, width, height, channels, cx, cy));
        }
        sort_queue(&mut queue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};
    use crate::mask::Mask;
    use crate::random::new_rng;

    #[test]
    fn full_area_fills_every_target_pixel() {
        let frame = FrameBuf::new(16, 16, Channels::Gray);
        let mut mask = Mask::new_all_source(16, 16);
        for y in 6..10 {
            for x in 6..10 {
                mask.set(x, y, 0);
            }
        }
        let mut mapping = MappingInt::new(16, 16);
        let mut rng = new_rng(11);
        initialize(&mut mapping, &mask, None, &frame.view(), mask.bounding_box().unwrap(), Strategy::FullArea, 1, &mut rng);
        for y in 6..10 {
            for x in 6..10 {
                let source = mapping.get((x, y));
                assert!(mask.is_source(source.0 as u32, source.1 as u32));
            }
        }
    }

    #[test]
    fn heuristic_variant_also_fills_every_target_pixel() {
        let frame = FrameBuf::new(16, 16, Channels::Gray);
        let mut mask = Mask::new_all_source(16, 16);
        for y in 6..10 {
            for x in 6..10 {
                mask.set(x, y, 0);
            }
        }
        let mut mapping = MappingInt::new(16, 16);
        let mut rng = new_rng(12);
        initialize(
            &mut mapping,
            &mask,
            None,
            &frame.view(),
            mask.bounding_box().unwrap(),
            Strategy::FullAreaHeuristic,
            2,
            &mut rng,
        );
        let source = mapping.get((7, 7));
        assert!(mask.is_source(source.0 as u32, source.1 as u32));
    }

    #[test]
    fn sub_region_stays_within_the_bounded_offset_when_possible() {
        let frame = FrameBuf::new(64, 64, Channels::Gray);
        let mut mask = Mask::new_all_source(64, 64);
        for y in 30..34 {
            for x in 30..34 {
                mask.set(x, y, 0);
            }
        }
        let mut mapping = MappingInt::new(64, 64);
        let mut rng = new_rng(7);
        initialize(&mut mapping, &mask, None, &frame.view(), mask.bounding_box().unwrap(), Strategy::SubRegion, 1, &mut rng);
        let source = mapping.get((31, 31));
        assert!(mask.is_source(source.0 as u32, source.1 as u32));
        assert!((source.0 - 31).unsigned_abs() <= SUB_REGION_OFFSET + 4);
        assert!((source.1 - 31).unsigned_abs() <= SUB_REGION_OFFSET + 4);
    }

    #[test]
    fn second_iteration_still_fills_every_target_pixel() {
        let mut frame = FrameBuf::new(16, 16, Channels::Rgb);
        {
            let mut view = frame.view_mut();
            for y in 0..16 {
                for x in 0..16 {
                    view.pixel_mut(x, y)[0] = ((x * 16) % 255) as u8;
                }
            }
        }
        let mut mask = Mask::new_all_source(16, 16);
        for y in 6..10 {
            for x in 6..10 {
                mask.set(x, y, 0);
            }
        }
        let mut mapping = MappingInt::new(16, 16);
        let mut rng = new_rng(21);
        initialize(&mut mapping, &mask, None, &frame.view(), mask.bounding_box().unwrap(), Strategy::FullArea, 2, &mut rng);
        for y in 6..10 {
            for x in 6..10 {
                let source = mapping.get((x, y));
                assert!(mask.is_source(source.0 as u32, source.1 as u32));
            }
        }
    }
}
