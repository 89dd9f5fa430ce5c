//! Mask and Filter rasters (spec.md 3): single 8-bit channel, `0xFF` means
//! "source / usable", anything else means "target / forbidden".

use crate::error::{EngineError, Result};
use crate::geometry::Rect;

pub const SOURCE: u8 = 0xFF;

#[derive(Debug, Clone)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    pub fn new_all_source(width: u32, height: u32) -> Mask {
        Mask { width, height, data: vec![SOURCE; (width * height) as usize] }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Mask> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(EngineError::InvalidInput(
                "mask buffer length does not match width*height".into(),
            ));
        }
        Ok(Mask { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, v: u8) {
        self.data[(y as usize) * (self.width as usize) + x as usize] = v;
    }

    #[inline]
    pub fn is_source(&self, x: u32, y: u32) -> bool {
        self.get(x, y) == SOURCE
    }

    #[inline]
    pub fn is_target(&self, x: u32, y: u32) -> bool {
        self.get(x, y) != SOURCE
    }

    /// Whether `(x, y)` may be used as a source: a source pixel under
    /// `self`, and, when `filter` is given, also a source pixel under it
    /// (spec.md 6 "Option<Filter>" — an extra admissibility mask on top of
    /// the ordinary source/target split).
    #[inline]
    pub fn is_source_admissible(&self, x: u32, y: u32, filter: Option<&Mask>) -> bool {
        self.is_source(x, y) && filter.map_or(true, |f| f.is_source(x, y))
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Tight bounding box around every target pixel, or `None` if the mask
    /// has no target pixels at all.
    pub fn bounding_box(&self) -> Option<Rect> {
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        let mut any = false;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_target(x, y) {
                    any = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if !any {
            return None;
        }
        Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Downsample by 2x with the "any contributing pixel is target" OR
    /// rule from spec.md 3 ("Synthesis Pyramid").
    pub fn downsample_2x_or(&self) -> Mask {
        let nw = (self.width / 2).max(1);
        let nh = (self.height / 2).max(1);
        let mut out = Mask::new_all_source(nw, nh);
        for y in 0..nh {
            for x in 0..nw {
                let (x0, y0) = (2 * x, 2 * y);
                let (x1, y1) = ((2 * x + 1).min(self.width - 1), (2 * y + 1).min(self.height - 1));
                let any_target = self.is_target(x0, y0)
                    || self.is_target(x1, y0)
                    || self.is_target(x0, y1)
                    || self.is_target(x1, y1);
                out.set(x, y, if any_target { 0 } else { SOURCE });
            }
        }
        out
    }

    /// Erodes the mask inward by one pixel using 4-connectivity: a target
    /// pixel becomes source if all four of its in-bounds axial neighbors
    /// are source. Returns the set of pixels that flipped this pass.
    pub fn erode_step(&mut self) -> Vec<(u32, u32)> {
        let mut flipped = Vec::new();
        let snapshot = self.data.clone();
        let is_target_snapshot = |x: i64, y: i64| -> bool {
            if !self.in_bounds(x, y) {
                return false;
            }
            snapshot[(y as usize) * (self.width as usize) + x as usize] != SOURCE
        };
        for y in 0..self.height {
            for x in 0..self.width {
                if !is_target_snapshot(x as i64, y as i64) {
                    continue;
                }
                let neighbors_all_source = !is_target_snapshot(x as i64 - 1, y as i64)
                    && !is_target_snapshot(x as i64 + 1, y as i64)
                    && !is_target_snapshot(x as i64, y as i64 - 1)
                    && !is_target_snapshot(x as i64, y as i64 + 1);
                if neighbors_all_source {
                    self.set(x, y, SOURCE);
                    flipped.push((x, y));
                }
            }
        }
        flipped
    }

    /// Whether any pixel is still a target.
    pub fn has_target(&self) -> bool {
        self.data.iter().any(|&v| v != SOURCE)
    }

    /// Distance-to-inner-boundary transform used by the secondary encoding
    /// of spec.md 3: 0 on the inner boundary, increasing away from it,
    /// saturated at `cap`. Computed with a two-pass chamfer approximation
    /// (4-neighborhood, unit step), sufficiently accurate for the small
    /// bounded distances synthesis needs.
    pub fn distance_to_boundary(&self, cap: u8) -> Vec<u8> {
        let (w, h) = (self.width as i64, self.height as i64);
        let mut dist = vec![u16::MAX; self.data.len()];
        let idx = |x: i64, y: i64| (y * w + x) as usize;
        for y in 0..h {
            for x in 0..w {
                if self.is_source(x as u32, y as u32) {
                    dist[idx(x, y)] = 0;
                    continue;
                }
                let on_boundary = [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)].iter().any(|&(dx, dy)| {
                    let (nx, ny) = (x + dx, y + dy);
                    nx < 0 || ny < 0 || nx >= w || ny >= h || self.is_source(nx as u32, ny as u32)
                });
                if on_boundary {
                    dist[idx(x, y)] = 0;
                }
            }
        }
        for _pass in 0..2 {
            for y in 0..h {
                for x in 0..w {
                    if dist[idx(x, y)] == 0 {
                        continue;
                    }
                    let mut best = dist[idx(x, y)];
                    for &(dx, dy) in &[(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
                        let (nx, ny) = (x + dx, y + dy);
                        if nx >= 0 && ny >= 0 && nx < w && ny < h {
                            best = best.min(dist[idx(nx, ny)].saturating_add(1));
                        }
                    }
                    dist[idx(x, y)] = best;
                }
            }
            for y in (0..h).rev() {
                for x in (0..w).rev() {
                    if dist[idx(x, y)] == 0 {
                        continue;
                    }
                    let mut best = dist[idx(x, y)];
                    for &(dx, dy) in &[(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
                        let (nx, ny) = (x + dx, y + dy);
                        if nx >= 0 && ny >= 0 && nx < w && ny < h {
                            best = best.min(dist[idx(nx, ny)].saturating_add(1));
                        }
                    }
                    dist[idx(x, y)] = best;
                }
            }
        }
        dist.into_iter().map(|d| d.min(cap as u16) as u8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_target_pixel_bbox() {
        let mut m = Mask::new_all_source(8, 8);
        m.set(4, 4, 0);
        let bb = m.bounding_box().unwrap();
        assert_eq!(bb, Rect::new(4, 4, 1, 1));
    }

    #[test]
    fn no_target_pixels_has_no_bbox() {
        let m = Mask::new_all_source(4, 4);
        assert!(m.bounding_box().is_none());
    }

    #[test]
    fn erosion_shrinks_a_plus_shape() {
        let mut m = Mask::new_all_source(5, 5);
        for &(x, y) in &[(2, 1), (1, 2), (2, 2), (3, 2), (2, 3)] {
            m.set(x, y, 0);
        }
        let flipped = m.erode_step();
        assert!(flipped.contains(&(2, 2)));
        assert!(m.is_source(2, 2));
    }

    #[test]
    fn downsample_or_rule_keeps_target_if_any_quadrant_is() {
        let mut m = Mask::new_all_source(4, 4);
        m.set(3, 3, 0);
        let d = m.downsample_2x_or();
        assert!(d.is_target(1, 1));
        assert!(d.is_source(0, 0));
    }

    #[test]
    fn distance_transform_zero_on_boundary() {
        let mut m = Mask::new_all_source(5, 5);
        for y in 1..4 {
            for x in 1..4 {
                m.set(x, y, 0);
            }
        }
        let dist = m.distance_to_boundary(10);
        assert_eq!(dist[1 * 5 + 1], 0);
        assert!(dist[2 * 5 + 2] > 0);
    }
}
