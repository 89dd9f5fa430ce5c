//! Random Initializer (spec.md 4.C): every target pixel is mapped to an
//! independently and uniformly drawn admissible source pixel, the cheapest
//! and lowest-quality seed available.

use rand::Rng;

use crate::geometry::Rect;
use crate::mapping::MappingInt;
use crate::mask::Mask;
use crate::random::uniform_point;

pub fn initialize<R: Rng + ?Sized>(mapping: &mut MappingInt, mask: &Mask, filter: Option<&Mask>, bbox: Rect, rng: &mut R) {
    let (width, height) = (mapping.width(), mapping.height());
    for y in bbox.top()..bbox.bottom() {
        for x in bbox.left()..bbox.right() {
            if mask.is_source(x, y) {
                continue;
            }
            loop {
                let (sx, sy) = uniform_point(rng, width, height);
                if mask.is_source_admissible(sx, sy, filter) {
                    mapping.set((x, y), (sx as i32, sy as i32));
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingInt;
    use crate::mask::Mask;
    use crate::random::new_rng;

    #[test]
    fn every_target_pixel_gets_a_source_mapping() {
        let mut mask = Mask::new_all_source(8, 8);
        mask.set(4, 4, 0);
        let mut mapping = MappingInt::new(8, 8);
        let mut rng = new_rng(1);
        initialize(&mut mapping, &mask, None, mask.bounding_box().unwrap(), &mut rng);
        let source = mapping.get((4, 4));
        assert!(mask.is_source(source.0 as u32, source.1 as u32));
    }
}
