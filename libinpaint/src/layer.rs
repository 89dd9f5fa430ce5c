//! Component B — Layer (spec.md 4.B / 3 "Layer").
//!
//! A Layer borrows its frame (the caller, or the Pyramid Driver, owns that
//! lifetime), owns its mask and its Mapping, and caches an optional
//! bounding box so sweeps and initializers can skip empty rows/columns.
//! Generic over the Mapping variant so the same struct serves both the
//! integer and the float pyramid levels (spec.md: "Both variants implement
//! the same component interface").

use crate::error::{EngineError, Result};
use crate::frame::FrameViewMut;
use crate::geometry::Rect;
use crate::mapping::{MappingFloat, MappingInt};
use crate::mask::Mask;

pub struct Layer<'a, M> {
    width: u32,
    height: u32,
    frame: FrameViewMut<'a>,
    mask: Mask,
    mapping: M,
    bounding_box: Option<Rect>,
}

pub type LayerInt<'a> = Layer<'a, MappingInt>;
pub type LayerFloat<'a> = Layer<'a, MappingFloat>;

impl<'a> LayerInt<'a> {
    pub fn new(frame: FrameViewMut<'a>, mask: Mask) -> Result<LayerInt<'a>> {
        let (width, height) = (frame.width(), frame.height());
        if mask.width() != width || mask.height() != height {
            return Err(EngineError::InvalidInput(
                "mask dimensions do not match frame dimensions".into(),
            ));
        }
        let bounding_box = mask.bounding_box();
        let mapping = MappingInt::new(width, height);
        Ok(Layer { width, height, frame, mask, mapping, bounding_box })
    }
}

impl<'a> LayerFloat<'a> {
    pub fn new(frame: FrameViewMut<'a>, mask: Mask) -> Result<LayerFloat<'a>> {
        let (width, height) = (frame.width(), frame.height());
        if mask.width() != width || mask.height() != height {
            return Err(EngineError::InvalidInput(
                "mask dimensions do not match frame dimensions".into(),
            ));
        }
        let bounding_box = mask.bounding_box();
        let mapping = MappingFloat::new(width, height);
        Ok(Layer { width, height, frame, mask, mapping, bounding_box })
    }
}

impl<'a, M> Layer<'a, M> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> &FrameViewMut<'a> {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut FrameViewMut<'a> {
        &mut self.frame
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn mask_mut(&mut self) -> &mut Mask {
        &mut self.mask
    }

    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut M {
        &mut self.mapping
    }

    pub fn bounding_box(&self) -> Rect {
        self.bounding_box.unwrap_or(Rect::new(0, 0, 0, 0))
    }

    pub fn refresh_bounding_box(&mut self) {
        self.bounding_box = self.mask.bounding_box();
    }

    pub fn has_target_pixels(&self) -> bool {
        self.bounding_box.is_some()
    }

    /// Disjoint-field access to the frame, mask and mapping at once: every
    /// Initializer and Optimizer needs to read the frame while mutating
    /// the mapping, which a whole-struct `&mut self` borrow can't express
    /// through ordinary accessor methods. Defined here, inside Layer's own
    /// impl block, so the borrow checker sees three independent field
    /// borrows rather than one conflicting `&mut Layer`.
    pub fn parts_mut(&mut self) -> (&FrameViewMut<'a>, &Mask, &mut M) {
        (&self.frame, &self.mask, &mut self.mapping)
    }
}
