//! Component A — Mapping (spec.md 4.A).
//!
//! Stores, per target pixel, the source pixel its content is copied from,
//! and provides the two cost kernels every Initializer and Optimizer
//! shares: appearance cost (5x5 SSD, border-weighted) and spatial cost
//! (min-over-4-neighbors coherence violation). Integer and float variants
//! share the same normalization math; only the source coordinate type and
//! the sampling rule (nearest vs. bilinear) differ.

use crate::frame::{FrameView, FrameViewMut};
use crate::geometry::{
    is_valid_point_i, Point2f, Point2i, Rect, INVALID_POINT_F, INVALID_POINT_I,
};
use crate::mask::Mask;
use crate::patch::{squared_diff, OFFSETS};

/// `calculateAppearanceCostNormalization` from the original Ocean source:
/// for a small frame (appearance range dominates) this returns a large
/// multiplier so the naturally-tiny spatial term can compete; for a large
/// frame it collapses to 1.
fn appearance_cost_normalization(channels: u32, width: u32, height: u32) -> u32 {
    if width == 0 || height == 0 {
        return 1;
    }
    let appearance = channels as u64 * 255 * 255;
    let spatial = width as u64 * width as u64 + height as u64 * height as u64;
    if appearance > spatial {
        ((appearance + spatial / 2) / spatial) as u32
    } else {
        1
    }
}

/// `calculateSpatialCostNormalization`, the mirror image of the above.
fn spatial_cost_normalization(channels: u32, width: u32, height: u32) -> u32 {
    if width == 0 || height == 0 {
        return 1;
    }
    let appearance = channels as u64 * 255 * 255;
    let spatial = width as u64 * width as u64 + height as u64 * height as u64;
    if appearance > spatial {
        1
    } else {
        ((spatial + appearance / 2) / appearance) as u32
    }
}

/// Per-mapping normalization constants, cached for every channel count
/// 1..=4 at construction time regardless of which count the owning frame
/// actually has (spec.md 3: "cached for 1-4 channels").
#[derive(Debug, Clone, Copy)]
pub struct Normalization {
    appearance: [u32; 4],
    spatial: [u32; 4],
}

impl Normalization {
    pub fn new(width: u32, height: u32) -> Normalization {
        let mut appearance = [0u32; 4];
        let mut spatial = [0u32; 4];
        for (i, slot) in appearance.iter_mut().enumerate() {
            *slot = appearance_cost_normalization((i + 1) as u32, width, height);
        }
        for (i, slot) in spatial.iter_mut().enumerate() {
            *slot = spatial_cost_normalization((i + 1) as u32, width, height);
        }
        Normalization { appearance, spatial }
    }

    pub fn appearance(&self, channels: usize) -> u64 {
        self.appearance[channels - 1] as u64
    }

    pub fn spatial(&self, channels: usize) -> u64 {
        self.spatial[channels - 1] as u64
    }

    /// `pixelCost = weightFactor * spatialCost * Na + appearanceCost * Ns`
    /// (spec.md 4.A). Computed in `f64` to keep the `weightFactor`
    /// multiplication precise before truncating back to the `u64` totals
    /// every cost kernel otherwise deals in.
    pub fn pixel_cost(&self, appearance_cost: u64, spatial_cost: u64, weight_factor: f32, channels: usize) -> u64 {
        let spatial_term = weight_factor as f64 * spatial_cost as f64 * self.appearance(channels) as f64;
        let appearance_term = appearance_cost as f64 * self.spatial(channels) as f64;
        (spatial_term + appearance_term).round() as u64
    }
}

/// The four axial neighbors `T' = T + (dx, dy)` used by the spatial cost
/// kernel, in the order spec.md 4.A lists them.
const SPATIAL_NEIGHBORS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

#[inline]
fn in_bounds(x: i32, y: i32, width: u32, height: u32) -> bool {
    x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height
}

/// Integer-coordinate Mapping: fastest, used at every level but the
/// finest.
#[derive(Debug, Clone)]
pub struct MappingInt {
    width: u32,
    height: u32,
    entries: Vec<Point2i>,
    norm: Normalization,
}

impl MappingInt {
    pub fn new(width: u32, height: u32) -> MappingInt {
        MappingInt {
            width,
            height,
            entries: vec![INVALID_POINT_I; (width as usize) * (height as usize)],
            norm: Normalization::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn norm(&self) -> &Normalization {
        &self.norm
    }

    #[inline]
    fn idx(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, target: (u32, u32)) -> Point2i {
        self.entries[self.idx(target.0, target.1)]
    }

    #[inline]
    pub fn set(&mut self, target: (u32, u32), source: Point2i) {
        let idx = self.idx(target.0, target.1);
        self.entries[idx] = source;
    }

    pub fn is_valid_source(source: Point2i) -> bool {
        is_valid_point_i(source)
    }

    /// Resets every entry to the invalid sentinel (spec.md 4.A "Reset").
    pub fn reset(&mut self) {
        self.entries.fill(INVALID_POINT_I);
    }

    /// A source location is admissible if it lies inside the frame, is a
    /// source pixel in `mask`, and (when a filter is provided) is usable
    /// in `filter` too (spec.md property P2).
    pub fn source_is_admissible(&self, source: Point2i, mask: &Mask, filter: Option<&Mask>) -> bool {
        if !in_bounds(source.0, source.1, self.width, self.height) {
            return false;
        }
        let (sx, sy) = (source.0 as u32, source.1 as u32);
        if !mask.is_source(sx, sy) {
            return false;
        }
        if let Some(f) = filter {
            if !f.is_source(sx, sy) {
                return false;
            }
        }
        true
    }

    /// 5x5 SSD appearance cost between the patch centered on `target` and
    /// the patch centered on `source`, with border weighting and an
    /// optional center-pixel omission (spec.md 4.A).
    pub fn appearance_cost(
        &self,
        frame: &FrameView,
        mask: &Mask,
        target: (u32, u32),
        source: Point2i,
        border_factor: u32,
        omit_center: bool,
    ) -> u64 {
        let channels = frame.channels().count();
        let (tx, ty) = (target.0 as i32, target.1 as i32);
        let (sx, sy) = source;
        let mut total: u64 = 0;
        for &(dx, dy) in OFFSETS.iter() {
            if omit_center && dx == 0 && dy == 0 {
                continue;
            }
            let (ntx, nty) = (tx + dx, ty + dy);
            let (nsx, nsy) = (sx + dx, sy + dy);
            if !in_bounds(ntx, nty, self.width, self.height) || !in_bounds(nsx, nsy, self.width, self.height) {
                continue;
            }
            let tp = frame.pixel(ntx as u32, nty as u32);
            let sp = frame.pixel(nsx as u32, nsy as u32);
            let mut d: u32 = 0;
            for c in 0..channels {
                d += squared_diff(tp[c], sp[c]);
            }
            let weight = if mask.is_target(ntx as u32, nty as u32) { border_factor } else { 1 };
            total += d as u64 * weight as u64;
        }
        total
    }

    /// Minimum-over-four-neighbors spatial coherence cost (spec.md 4.A).
    pub fn spatial_cost(&self, mask: &Mask, target: (u32, u32), source: Point2i, max_spatial_cost: u32) -> u64 {
        let (tx, ty) = (target.0 as i32, target.1 as i32);
        let mut best: Option<u64> = None;
        for &(dx, dy) in SPATIAL_NEIGHBORS.iter() {
            let (nx, ny) = (tx + dx, ty + dy);
            if !in_bounds(nx, ny, self.width, self.height) {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if mask.is_source(nx, ny) {
                continue;
            }
            let neighbor_mapping = self.get((nx, ny));
            if !Self::is_valid_source(neighbor_mapping) {
                continue;
            }
            let vx = (neighbor_mapping.0 - source.0 - dx) as i64;
            let vy = (neighbor_mapping.1 - source.1 - dy) as i64;
            let v = (vx * vx + vy * vy) as u64;
            best = Some(best.map_or(v, |b| b.min(v)));
        }
        best.unwrap_or(0).min(max_spatial_cost as u64)
    }

    /// Writes `frame[T] <- frame[M(T)]` for every target pixel inside
    /// `rect` (spec.md 4.A "Apply mapping").
    pub fn apply(&self, frame: &mut FrameViewMut, mask: &Mask, rect: Rect) {
        let channels = frame.channels().count();
        let mut scratch = [0u8; 4];
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                if mask.is_source(x, y) {
                    continue;
                }
                let source = self.get((x, y));
                if !Self::is_valid_source(source) || !in_bounds(source.0, source.1, self.width, self.height) {
                    continue;
                }
                scratch[..channels].copy_from_slice(&frame.pixel(source.0 as u32, source.1 as u32)[..channels]);
                frame.pixel_mut(x, y)[..channels].copy_from_slice(&scratch[..channels]);
            }
        }
    }

    /// Raw pointer + length to the entries buffer, for the stripe-parallel
    /// optimizer, which needs to hand out one exclusive sub-range per
    /// worker thread while still allowing (tolerated, stale) cross-stripe
    /// reads. Not exposed outside the crate.
    pub(crate) fn raw_mut(&mut self) -> (*mut Point2i, usize) {
        (self.entries.as_mut_ptr(), self.entries.len())
    }
}

/// Sub-pixel Mapping used at the finest level for smoothness.
#[derive(Debug, Clone)]
pub struct MappingFloat {
    width: u32,
    height: u32,
    entries: Vec<Point2f>,
    norm: Normalization,
}

impl MappingFloat {
    pub fn new(width: u32, height: u32) -> MappingFloat {
        MappingFloat {
            width,
            height,
            entries: vec![INVALID_POINT_F; (width as usize) * (height as usize)],
            norm: Normalization::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn norm(&self) -> &Normalization {
        &self.norm
    }

    #[inline]
    fn idx(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, target: (u32, u32)) -> Point2f {
        self.entries[self.idx(target.0, target.1)]
    }

    #[inline]
    pub fn set(&mut self, target: (u32, u32), source: Point2f) {
        let idx = self.idx(target.0, target.1);
        self.entries[idx] = source;
    }

    /// A float mapping entry is valid once it has been written by an
    /// initializer; unlike the integer sentinel, `(0, 0)` is a legitimate
    /// source, so validity is tracked by a parallel bitmap instead.
    pub fn reset(&mut self, valid: &mut Vec<bool>) {
        self.entries.fill(INVALID_POINT_F);
        valid.clear();
        valid.resize(self.entries.len(), false);
    }

    pub fn source_is_admissible(&self, source: Point2f, mask: &Mask, filter: Option<&Mask>) -> bool {
        if source.0 < 0.0 || source.1 < 0.0 {
            return false;
        }
        let (sx, sy) = (source.0.round() as i64, source.1.round() as i64);
        if sx < 0 || sy < 0 || sx as u32 >= self.width || sy as u32 >= self.height {
            return false;
        }
        let (sx, sy) = (sx as u32, sy as u32);
        if !mask.is_source(sx, sy) {
            return false;
        }
        if let Some(f) = filter {
            if !f.is_source(sx, sy) {
                return false;
            }
        }
        true
    }

    /// Bilinear-sampled 5x5 SSD appearance cost; the 25 source samples come
    /// from the 2x2 cell surrounding each offset source location.
    pub fn appearance_cost(
        &self,
        frame: &FrameView,
        mask: &Mask,
        target: (u32, u32),
        source: Point2f,
        border_factor: u32,
        omit_center: bool,
    ) -> u64 {
        let channels = frame.channels().count();
        let (tx, ty) = (target.0 as i32, target.1 as i32);
        let mut total: u64 = 0;
        let mut sample = [0u8; 4];
        for &(dx, dy) in OFFSETS.iter() {
            if omit_center && dx == 0 && dy == 0 {
                continue;
            }
            let (ntx, nty) = (tx + dx, ty + dy);
            if !in_bounds(ntx, nty, self.width, self.height) {
                continue;
            }
            let (sfx, sfy) = (source.0 + dx as f32, source.1 + dy as f32);
            if sfx < -0.5 || sfy < -0.5 || sfx > self.width as f32 - 0.5 || sfy > self.height as f32 - 0.5 {
                continue;
            }
            frame.bilinear(sfx, sfy, &mut sample);
            let tp = frame.pixel(ntx as u32, nty as u32);
            let mut d: u32 = 0;
            for c in 0..channels {
                d += squared_diff(tp[c], sample[c]);
            }
            let weight = if mask.is_target(ntx as u32, nty as u32) { border_factor } else { 1 };
            total += d as u64 * weight as u64;
        }
        total
    }

    pub fn spatial_cost(&self, mask: &Mask, target: (u32, u32), source: Point2f, max_spatial_cost: u32) -> u64 {
        let (tx, ty) = (target.0 as i32, target.1 as i32);
        let mut best: Option<u64> = None;
        for &(dx, dy) in SPATIAL_NEIGHBORS.iter() {
            let (nx, ny) = (tx + dx, ty + dy);
            if !in_bounds(nx, ny, self.width, self.height) {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if mask.is_source(nx, ny) {
                continue;
            }
            let neighbor_mapping = self.get((nx, ny));
            let vx = (neighbor_mapping.0 - source.0 - dx as f32) as f64;
            let vy = (neighbor_mapping.1 - source.1 - dy as f32) as f64;
            let v = (vx * vx + vy * vy) as u64;
            best = Some(best.map_or(v, |b| b.min(v)));
        }
        best.unwrap_or(0).min(max_spatial_cost as u64)
    }

    pub fn apply(&self, frame: &mut FrameViewMut, mask: &Mask, rect: Rect) {
        let channels = frame.channels().count();
        let mut scratch = [0u8; 4];
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                if mask.is_source(x, y) {
                    continue;
                }
                let source = self.get((x, y));
                frame.as_view().bilinear(source.0, source.1, &mut scratch);
                frame.pixel_mut(x, y)[..channels].copy_from_slice(&scratch[..channels]);
            }
        }
    }

    /// As [`MappingInt::raw_mut`], for the float variant.
    pub(crate) fn raw_mut(&mut self) -> (*mut Point2f, usize) {
        (self.entries.as_mut_ptr(), self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};

    #[test]
    fn normalization_factors_are_never_zero() {
        let n = Normalization::new(64, 64);
        for c in 1..=4 {
            assert!(n.appearance(c) >= 1);
            assert!(n.spatial(c) >= 1);
        }
    }

    #[test]
    fn normalization_picks_exactly_one_nontrivial_side_for_small_frame() {
        // channels*255^2 >> w^2+h^2 for an 8x8 frame: appearance side wins.
        let n = Normalization::new(8, 8);
        assert!(n.appearance(1) > 1);
        assert_eq!(n.spatial(1), 1);
    }

    #[test]
    fn appearance_cost_zero_for_identical_constant_frame() {
        let frame = FrameBuf::new(16, 16, Channels::Rgb);
        let mask = Mask::new_all_source(16, 16);
        let m = MappingInt::new(16, 16);
        let cost = m.appearance_cost(&frame.view(), &mask, (8, 8), (6, 6), 25, false);
        assert_eq!(cost, 0);
    }

    #[test]
    fn spatial_cost_zero_when_no_target_neighbor_is_mapped() {
        let mask = Mask::new_all_source(8, 8);
        let m = MappingInt::new(8, 8);
        assert_eq!(m.spatial_cost(&mask, (4, 4), (1, 1), u32::MAX), 0);
    }

    #[test]
    fn spatial_cost_zero_when_propagated_consistently() {
        let mut mask = Mask::new_all_source(8, 8);
        mask.set(4, 4, 0);
        mask.set(5, 4, 0);
        let mut m = MappingInt::new(8, 8);
        m.set((4, 4), (1, 1));
        // Neighbor (5,4) = T+(1,0); ideal continuation keeps the same
        // shift, so M(T) = M(T') - (1,0) should make the violation 0 for
        // candidate source (1,1) at T=(4,4) seen from T'=(5,4).
        let cost = m.spatial_cost(&mask, (5, 4), (2, 1), u32::MAX);
        assert_eq!(cost, 0);
    }

    #[test]
    fn apply_copies_mapped_source_pixel() {
        let mut frame = FrameBuf::new(8, 8, Channels::Gray);
        frame.view_mut().pixel_mut(1, 1)[0] = 77;
        let mut mask = Mask::new_all_source(8, 8);
        mask.set(4, 4, 0);
        let mut m = MappingInt::new(8, 8);
        m.set((4, 4), (1, 1));
        let bbox = Rect::new(0, 0, 8, 8);
        m.apply(&mut frame.view_mut(), &mask, bbox);
        assert_eq!(frame.view().pixel(4, 4)[0], 77);
    }
}
