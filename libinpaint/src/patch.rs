//! The 5x5 appearance-cost kernel (spec.md 4.A), factored out as a small
//! function object so a scalar and a SIMD-oriented path can share the same
//! offset table (spec.md 9: "appearance cost is factored as a function
//! object so scalar and SIMD paths are selected at instantiation"). Only
//! the scalar path is implemented here; the offset table is the seam a
//! vectorized implementation would plug into.

pub const PATCH_RADIUS: i32 = 2;
pub const PATCH_SIDE: usize = 5;
pub const PATCH_AREA: usize = PATCH_SIDE * PATCH_SIDE;

/// The 25 `(dx, dy)` offsets of a 5x5 patch, center last so callers that
/// need the "omit center" variant can simply skip the final element.
pub const OFFSETS: [(i32, i32); PATCH_AREA] = build_offsets();

const fn build_offsets() -> [(i32, i32); PATCH_AREA] {
    let mut offsets = [(0i32, 0i32); PATCH_AREA];
    let mut i = 0;
    let mut dy = -PATCH_RADIUS;
    while dy <= PATCH_RADIUS {
        let mut dx = -PATCH_RADIUS;
        while dx <= PATCH_RADIUS {
            if dx != 0 || dy != 0 {
                offsets[i] = (dx, dy);
                i += 1;
            }
            dx += 1;
        }
        dy += 1;
    }
    offsets[PATCH_AREA - 1] = (0, 0);
    offsets
}

#[inline]
pub fn squared_diff(a: u8, b: u8) -> u32 {
    let d = a as i32 - b as i32;
    (d * d) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_cover_the_full_5x5_window_once() {
        let mut seen = std::collections::HashSet::new();
        for &(dx, dy) in OFFSETS.iter() {
            assert!(dx >= -PATCH_RADIUS && dx <= PATCH_RADIUS);
            assert!(dy >= -PATCH_RADIUS && dy <= PATCH_RADIUS);
            assert!(seen.insert((dx, dy)));
        }
        assert_eq!(seen.len(), PATCH_AREA);
        assert_eq!(OFFSETS[PATCH_AREA - 1], (0, 0));
    }
}
