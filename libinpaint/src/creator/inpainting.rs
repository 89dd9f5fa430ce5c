//! The InpaintingCreator (spec.md 4.E): applies a Layer's Mapping to
//! produce the final output frame, optionally blending a band around the
//! mask boundary so the seam between synthesized and original content
//! isn't a hard edge (spec.md 6 "blend_band").

use crate::config::EngineConfig;
use crate::frame::{FrameBuf, FrameView};
use crate::layer::{LayerFloat, LayerInt};

fn blend(frame: &mut FrameBuf, source: &FrameView, mask: &crate::mask::Mask, band: u32) {
    if band == 0 {
        return;
    }
    let distance = mask.distance_to_boundary(band as u8);
    let channels = frame.channels().count();
    let (width, height) = (frame.width(), frame.height());
    for y in 0..height {
        for x in 0..width {
            if mask.is_source(x, y) {
                continue;
            }
            let d = distance[(y as usize) * (width as usize) + x as usize];
            if d == 0 || d as u32 > band {
                continue;
            }
            // Linear ramp: right on the boundary (d == 0 handled above by
            // the mask itself already being source there) the original
            // pixel dominates; it fades out by the band's outer edge.
            let alpha = d as f32 / band as f32;
            let original = source.pixel(x, y);
            let mut view = frame.view_mut();
            let synthesized = view.pixel_mut(x, y);
            for c in 0..channels {
                let blended = original[c] as f32 * (1.0 - alpha) + synthesized[c] as f32 * alpha;
                synthesized[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

pub fn create_inpainted_frame_int(layer: &LayerInt, original: &FrameView, config: &EngineConfig) -> FrameBuf {
    let (width, height, channels) = (layer.width(), layer.height(), original.channels());
    let mut out = FrameBuf::new(width, height, channels);
    {
        let mut view = out.view_mut();
        for y in 0..height {
            for x in 0..width {
                view.pixel_mut(x, y).copy_from_slice(original.pixel(x, y));
            }
        }
    }
    layer.mapping().apply(&mut out.view_mut(), layer.mask(), layer.bounding_box());
    blend(&mut out, original, layer.mask(), config.blend_band);
    out
}

pub fn create_inpainted_frame_float(layer: &LayerFloat, original: &FrameView, config: &EngineConfig) -> FrameBuf {
    let (width, height, channels) = (layer.width(), layer.height(), original.channels());
    let mut out = FrameBuf::new(width, height, channels);
    {
        let mut view = out.view_mut();
        for y in 0..height {
            for x in 0..width {
                view.pixel_mut(x, y).copy_from_slice(original.pixel(x, y));
            }
        }
    }
    layer.mapping().apply(&mut out.view_mut(), layer.mask(), layer.bounding_box());
    blend(&mut out, original, layer.mask(), config.blend_band);
    out
}
