//! Video-prior projection (spec.md 4.C / 9 "VideoContext"): when inpainting
//! a frame of a sequence, the previous frame's converged float Mapping is
//! reprojected through a homography (estimated from tracked background
//! motion) to give the next frame's finest level a warm start instead of
//! beginning from the coarsest level's initializer alone. Grounded on
//! `InitializerHomographyMappingAdaptionF1::initializeSubsetF1`: rather than
//! sampling the prior Mapping at the target's own coordinates, the target
//! is forward-projected through `homography` into the prior frame, landing
//! in a 2x2 cell of prior Mapping entries; those four corners are each
//! warped back through the inverse homography, and used only if they agree
//! with each other (a static scene seen from a moving camera keeps its
//! Mapping locally consistent after reprojection; a scene cut or occlusion
//! does not).

use crate::geometry::Point2f;
use crate::layer::LayerFloat;
use crate::mapping::MappingFloat;
use crate::mask::Mask;

/// Row-major 3x3 homography, applied as `H * [x, y, 1]^T` then normalized
/// by the homogeneous coordinate.
#[derive(Debug, Clone, Copy)]
pub struct Homography(pub [[f32; 3]; 3]);

impl Homography {
    pub fn identity() -> Homography {
        Homography([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn apply(&self, p: Point2f) -> Point2f {
        let m = &self.0;
        let x = m[0][0] * p.0 + m[0][1] * p.1 + m[0][2];
        let y = m[1][0] * p.0 + m[1][1] * p.1 + m[1][2];
        let w = m[2][0] * p.0 + m[2][1] * p.1 + m[2][2];
        if w.abs() < f32::EPSILON {
            p
        } else {
            (x / w, y / w)
        }
    }

    /// The inverse homography, or `None` if this one is singular.
    pub fn inverse(&self) -> Option<Homography> {
        let m = &self.0;
        let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0];
        let a = cofactor(1, 2, 1, 2);
        let b = cofactor(1, 2, 0, 2);
        let c = cofactor(1, 2, 0, 1);
        let det = m[0][0] * a - m[0][1] * b + m[0][2] * c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let adj = [
            [a, -(m[0][1] * m[2][2] - m[0][2] * m[2][1]), m[0][1] * m[1][2] - m[0][2] * m[1][1]],
            [-b, m[0][0] * m[2][2] - m[0][2] * m[2][0], -(m[0][0] * m[1][2] - m[0][2] * m[1][0])],
            [c, -(m[0][0] * m[2][1] - m[0][1] * m[2][0]), m[0][0] * m[1][1] - m[0][1] * m[1][0]],
        ];
        let mut inv = [[0.0f32; 3]; 3];
        for r in 0..3 {
            for col in 0..3 {
                inv[r][col] = adj[r][col] * inv_det;
            }
        }
        Some(Homography(inv))
    }
}

/// Whether a prior Mapping entry actually got written by synthesis, as
/// opposed to still holding [`crate::geometry::INVALID_POINT_F`] because its
/// pixel was source in the prior frame. Mirrors the `.x() > 0` sentinel
/// check `initializeSubsetF1` itself uses to validate prior corners.
fn prior_corner_is_valid(p: Point2f) -> bool {
    p != crate::geometry::INVALID_POINT_F
}

/// Squared Euclidean distance.
fn sqr_dist(a: Point2f, b: Point2f) -> f32 {
    let (dx, dy) = (a.0 - b.0, a.1 - b.1);
    dx * dx + dy * dy
}

/// Projects `prior_mapping` through `homography` into `layer`'s Mapping.
/// For each target pixel, `homography` locates the corresponding 2x2 cell
/// of prior-frame Mapping entries; each of the four corners is warped back
/// into this frame's coordinates through the inverse homography, the
/// "dominant" corner (whichever quadrant the projected point rounds into)
/// is picked, and the other three are checked for agreement with it within
/// a distance of 2. All four agreeing bilinear-blends; otherwise the
/// dominant corner alone is used. Pixels whose cell falls outside the prior
/// frame, whose corners aren't all valid, or whose result fails the
/// consistency/bounds/mask checks keep whatever the ordinary coarsest
/// initializer already wrote.
pub fn project_prior(
    prior_mapping: &MappingFloat,
    homography: &Homography,
    filter: Option<&Mask>,
    layer: &mut LayerFloat,
    valid: &mut Vec<bool>,
) {
    let (width, height) = (layer.width(), layer.height());
    if prior_mapping.width() != width || prior_mapping.height() != height {
        return;
    }
    let inverse = match homography.inverse() {
        Some(inv) => inv,
        None => return,
    };
    let mask = layer.mask().clone();
    for y in 0..height {
        for x in 0..width {
            if mask.is_source(x, y) {
                continue;
            }
            if let Some(projected) = locate_prior(prior_mapping, homography, &inverse, (x as f32, y as f32), width, height) {
                if projected.0 < 2.0
                    || projected.1 < 2.0
                    || projected.0 >= width as f32 - 3.0
                    || projected.1 >= height as f32 - 3.0
                {
                    continue;
                }
                let (sx, sy) = (projected.0.round() as u32, projected.1.round() as u32);
                if sx >= width || sy >= height || !mask.is_source_admissible(sx, sy, filter) {
                    continue;
                }
                layer.mapping_mut().set((x, y), projected);
                valid[(y as usize) * (width as usize) + x as usize] = true;
            }
        }
    }
}

/// The 2x2-cell lookup and quadrant-consistency logic, isolated from the
/// admissibility/bounds checks that follow it.
fn locate_prior(
    prior_mapping: &MappingFloat,
    homography: &Homography,
    inverse: &Homography,
    target: Point2f,
    width: u32,
    height: u32,
) -> Option<Point2f> {
    let previous = homography.apply(target);
    let left = previous.0.floor();
    let top = previous.1.floor();
    let (left_i, top_i) = (left as i32, top as i32);
    let (right_i, bottom_i) = (left_i + 1, top_i + 1);
    if left_i < 0 || top_i < 0 || right_i >= width as i32 || bottom_i >= height as i32 {
        return None;
    }
    let corner = |cx: i32, cy: i32| prior_mapping.get((cx as u32, cy as u32));
    let top_left = corner(left_i, top_i);
    let top_right = corner(right_i, top_i);
    let bottom_left = corner(left_i, bottom_i);
    let bottom_right = corner(right_i, bottom_i);
    if !prior_corner_is_valid(top_left)
        || !prior_corner_is_valid(top_right)
        || !prior_corner_is_valid(bottom_left)
        || !prior_corner_is_valid(bottom_right)
    {
        return None;
    }
    let warped_tl = inverse.apply(top_left);
    let warped_tr = inverse.apply(top_right);
    let warped_bl = inverse.apply(bottom_left);
    let warped_br = inverse.apply(bottom_right);
    let tx = previous.0 - left;
    let ty = previous.1 - top;
    let rounded_x = previous.0.round() as i32;
    let rounded_y = previous.1.round() as i32;
    let dominant = if rounded_x <= left_i && rounded_y <= top_i {
        warped_tl
    } else if rounded_x <= left_i {
        warped_bl
    } else if rounded_y <= top_i {
        warped_tr
    } else {
        warped_br
    };
    let consistent = sqr_dist(dominant, warped_tl) < 4.0
        && sqr_dist(dominant, warped_tr) < 4.0
        && sqr_dist(dominant, warped_bl) < 4.0
        && sqr_dist(dominant, warped_br) < 4.0;
    if consistent {
        let tx_ = 1.0 - tx;
        let ty_ = 1.0 - ty;
        let top_mix = (warped_tl.0 * tx_ + warped_tr.0 * tx, warped_tl.1 * tx_ + warped_tr.1 * tx);
        let bottom_mix = (warped_bl.0 * tx_ + warped_br.0 * tx, warped_bl.1 * tx_ + warped_br.1 * tx);
        Some((top_mix.0 * ty_ + bottom_mix.0 * ty, top_mix.1 * ty_ + bottom_mix.1 * ty))
    } else {
        Some(dominant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};

    #[test]
    fn identity_homography_is_a_no_op() {
        let h = Homography::identity();
        assert_eq!(h.apply((3.0, 4.0)), (3.0, 4.0));
    }

    #[test]
    fn translation_homography_shifts_points() {
        let h = Homography([[1.0, 0.0, 2.0], [0.0, 1.0, -1.0], [0.0, 0.0, 1.0]]);
        assert_eq!(h.apply((3.0, 4.0)), (5.0, 3.0));
    }

    #[test]
    fn translation_homography_inverts_cleanly() {
        let h = Homography([[1.0, 0.0, 2.0], [0.0, 1.0, -1.0], [0.0, 0.0, 1.0]]);
        let inv = h.inverse().unwrap();
        let round_tripped = inv.apply(h.apply((3.0, 4.0)));
        assert!((round_tripped.0 - 3.0).abs() < 1e-4);
        assert!((round_tripped.1 - 4.0).abs() < 1e-4);
    }

    #[test]
    fn singular_homography_has_no_inverse() {
        let h = Homography([[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(h.inverse().is_none());
    }

    #[test]
    fn identity_projection_carries_a_consistent_prior_mapping_through() {
        // A prior Mapping that agrees everywhere on one source point
        // projects through cleanly under the identity homography, since
        // every corner of every 2x2 cell warps back to the same value.
        let mut prior = MappingFloat::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                prior.set((x, y), (1.0, 1.0));
            }
        }
        let mut frame = FrameBuf::new(8, 8, Channels::Gray);
        let mut mask = Mask::new_all_source(8, 8);
        mask.set(4, 4, 0);
        let mut valid = vec![false; 64];
        let mut layer = LayerFloat::new(frame.view_mut(), mask).unwrap();
        project_prior(&prior, &Homography::identity(), None, &mut layer, &mut valid);
        assert!(valid[4 * 8 + 4]);
        assert_eq!(layer.mapping().get((4, 4)), (1.0, 1.0));
    }

    #[test]
    fn all_invalid_prior_corners_leave_the_pixel_unset() {
        let prior = MappingFloat::new(8, 8);
        let mut frame = FrameBuf::new(8, 8, Channels::Gray);
        let mut mask = Mask::new_all_source(8, 8);
        mask.set(4, 4, 0);
        let mut valid = vec![false; 64];
        let mut layer = LayerFloat::new(frame.view_mut(), mask).unwrap();
        project_prior(&prior, &Homography::identity(), None, &mut layer, &mut valid);
        assert!(!valid[4 * 8 + 4]);
    }
}
