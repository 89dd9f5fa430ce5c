//! One PatchMatch sweep: propagation from already-improved neighbors
//! followed by randomized local search, run row-stripe parallel (spec.md
//! 5). Forward sweeps scan top-to-bottom, left-to-right and propagate from
//! the up/left neighbors; backward sweeps scan in the opposite order and
//! propagate from the down/right neighbors, so good mappings spread in
//! both diagonal directions across sweeps.

use rand::Rng;
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::constraint::ConstraintSet;
use crate::frame::FrameView;
use crate::geometry::{Point2f, Point2i, Rect};
use crate::mapping::{MappingFloat, MappingInt};
use crate::mask::Mask;
use crate::random::fork_stripe_rng;

use super::variants::{candidate_cost_float, candidate_cost_int, CancelToken};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A raw, racy view over a Mapping's flat entry buffer: each stripe writes
/// only the rows it owns, but may read any row, including ones a sibling
/// stripe is concurrently writing. A reader that races a writer observes
/// either the old or the new value, never torn bytes (both are plain
/// `Copy` coordinate pairs written whole), and a stale read only costs one
/// sweep of lagging propagation, not correctness — the tolerated race the
/// sweep model accepts in exchange for not synchronizing every pixel.
struct RacyBuffer<T> {
    ptr: *mut T,
    len: usize,
}

unsafe impl<T: Send> Send for RacyBuffer<T> {}
unsafe impl<T: Send> Sync for RacyBuffer<T> {}

impl<T: Copy> RacyBuffer<T> {
    fn new(ptr: *mut T, len: usize) -> RacyBuffer<T> {
        RacyBuffer { ptr, len }
    }

    #[inline]
    unsafe fn read(&self, idx: usize) -> T {
        debug_assert!(idx < self.len);
        *self.ptr.add(idx)
    }

    #[inline]
    unsafe fn write(&self, idx: usize, value: T) {
        debug_assert!(idx < self.len);
        *self.ptr.add(idx) = value;
    }
}

fn stripe_bounds(bbox: Rect, stripe_count: u32) -> Vec<(u32, u32)> {
    let total = bbox.height;
    let per = (total + stripe_count - 1) / stripe_count;
    let mut bounds = Vec::new();
    let mut y = bbox.top();
    while y < bbox.bottom() {
        let end = (y + per).min(bbox.bottom());
        bounds.push((y, end));
        y = end;
    }
    bounds
}

fn row_order(forward: bool, start: u32, end: u32) -> Box<dyn Iterator<Item = u32>> {
    if forward {
        Box::new(start..end)
    } else {
        Box::new((start..end).rev())
    }
}

fn col_order(forward: bool, left: u32, right: u32) -> Vec<u32> {
    if forward {
        (left..right).collect()
    } else {
        (left..right).rev().collect()
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_sweep_int(
    mapping: &mut MappingInt,
    frame: &FrameView,
    mask: &Mask,
    filter: Option<&Mask>,
    bbox: Rect,
    config: &EngineConfig,
    direction: Direction,
    seed: u64,
    cancel: &CancelToken,
) {
    let width = mapping.width();
    let height = mapping.height();
    let forward = direction == Direction::Forward;
    let (neighbor_dy, neighbor_dx) = if forward { (-1i32, -1i32) } else { (1i32, 1i32) };
    let stripe_count = rayon::current_num_threads().max(1) as u32;
    let stripes = stripe_bounds(bbox, stripe_count);
    let (ptr, len) = mapping.raw_mut();
    let racy = RacyBuffer::new(ptr, len);
    let columns = col_order(forward, bbox.left(), bbox.right());

    stripes.par_iter().enumerate().for_each(|(stripe_idx, &(row_start, row_end))| {
        let mut rng = fork_stripe_rng(seed, stripe_idx as u32);
        for y in row_order(forward, row_start, row_end) {
            if cancel.is_cancelled() {
                return;
            }
            for &x in &columns {
                if mask.is_source(x, y) {
                    continue;
                }
                let target = (x, y);
                let idx = (y as usize) * (width as usize) + x as usize;
                let mut current = unsafe { racy.read(idx) };
                let mut current_cost = if MappingInt::is_valid_source(current) {
                    candidate_cost_int(mapping, frame, mask, target, current, config)
                } else {
                    u64::MAX
                };

                // Propagation: try the up/left (or down/right) neighbor's
                // mapping, offset by the same vector to this pixel.
                for &(dy, dx) in &[(neighbor_dy, 0i32), (0, neighbor_dx)] {
                    let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                    if nx < 0 || ny < 0 || nx as u32 >= width || ny as u32 >= height {
                        continue;
                    }
                    let neighbor_idx = (ny as usize) * (width as usize) + nx as usize;
                    let neighbor_mapping = unsafe { racy.read(neighbor_idx) };
                    if !MappingInt::is_valid_source(neighbor_mapping) {
                        continue;
                    }
                    let candidate: Point2i = (neighbor_mapping.0 - dx, neighbor_mapping.1 - dy);
                    if !mapping.source_is_admissible(candidate, mask, filter) {
                        continue;
                    }
                    let cost = candidate_cost_int(mapping, frame, mask, target, candidate, config);
                    if cost < current_cost {
                        current_cost = cost;
                        current = candidate;
                    }
                }

                // Random search: halve the search radius until it is
                // smaller than one pixel, same as classic PatchMatch.
                if MappingInt::is_valid_source(current) {
                    let mut radius = width.max(height) as i32;
                    while radius >= 1 {
                        let dx = rng.gen_range(-radius..=radius);
                        let dy = rng.gen_range(-radius..=radius);
                        let candidate = (current.0 + dx, current.1 + dy);
                        if mapping.source_is_admissible(candidate, mask, filter) {
                            let cost =
                                candidate_cost_int(mapping, frame, mask, target, candidate, config);
                            if cost < current_cost {
                                current_cost = cost;
                                current = candidate;
                            }
                        }
                        radius /= 2;
                    }
                } else {
                    // No admissible candidate yet at all; draw one
                    // uniformly so the pixel leaves the sweep with some
                    // mapping rather than staying invalid.
                    for _ in 0..16 {
                        let candidate = (rng.gen_range(0..width as i32), rng.gen_range(0..height as i32));
                        if mapping.source_is_admissible(candidate, mask, filter) {
                            current = candidate;
                            break;
                        }
                    }
                }

                unsafe { racy.write(idx, current) };
            }
        }
    });
}

#[allow(clippy::too_many_arguments)]
pub fn run_sweep_float(
    mapping: &mut MappingFloat,
    frame: &FrameView,
    mask: &Mask,
    filter: Option<&Mask>,
    constraints: Option<&ConstraintSet>,
    bbox: Rect,
    config: &EngineConfig,
    direction: Direction,
    seed: u64,
    cancel: &CancelToken,
) {
    let width = mapping.width();
    let height = mapping.height();
    let forward = direction == Direction::Forward;
    let (neighbor_dy, neighbor_dx) = if forward { (-1i32, -1i32) } else { (1i32, 1i32) };
    let stripe_count = rayon::current_num_threads().max(1) as u32;
    let stripes = stripe_bounds(bbox, stripe_count);
    let (ptr, len) = mapping.raw_mut();
    let racy = RacyBuffer::new(ptr, len);
    let columns = col_order(forward, bbox.left(), bbox.right());

    stripes.par_iter().enumerate().for_each(|(stripe_idx, &(row_start, row_end))| {
        let mut rng = fork_stripe_rng(seed, stripe_idx as u32);
        for y in row_order(forward, row_start, row_end) {
            if cancel.is_cancelled() {
                return;
            }
            for &x in &columns {
                if mask.is_source(x, y) {
                    continue;
                }
                let target = (x, y);
                let idx = (y as usize) * (width as usize) + x as usize;
                let mut current: Point2f = unsafe { racy.read(idx) };
                let mut current_cost = candidate_cost_float(mapping, frame, mask, target, current, config, constraints);

                for &(dy, dx) in &[(neighbor_dy, 0i32), (0, neighbor_dx)] {
                    let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                    if nx < 0 || ny < 0 || nx as u32 >= width || ny as u32 >= height {
                        continue;
                    }
                    let neighbor_idx = (ny as usize) * (width as usize) + nx as usize;
                    let neighbor_mapping: Point2f = unsafe { racy.read(neighbor_idx) };
                    let candidate: Point2f = (neighbor_mapping.0 - dx as f32, neighbor_mapping.1 - dy as f32);
                    if !mapping.source_is_admissible(candidate, mask, filter) {
                        continue;
                    }
                    let cost = candidate_cost_float(mapping, frame, mask, target, candidate, config, constraints);
                    if cost < current_cost {
                        current_cost = cost;
                        current = candidate;
                    }
                }

                let mut radius = width.max(height) as f32;
                while radius >= 0.5 {
                    let dx: f32 = rng.gen_range(-radius..=radius);
                    let dy: f32 = rng.gen_range(-radius..=radius);
                    let candidate = (current.0 + dx, current.1 + dy);
                    if mapping.source_is_admissible(candidate, mask, filter) {
                        let cost = candidate_cost_float(mapping, frame, mask, target, candidate, config, constraints);
                        if cost < current_cost {
                            current_cost = cost;
                            current = candidate;
                        }
                    }
                    radius *= 0.5;
                }

                unsafe { racy.write(idx, current) };
            }
        }
    });
}
