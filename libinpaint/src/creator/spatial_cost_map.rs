//! The SpatialCostMapCreator (spec.md 4.E): a grayscale visualization of
//! each target pixel's spatial coherence cost, useful for debugging why an
//! optimizer sweep got stuck. Not used in the synthesis path itself.

use crate::config::EngineConfig;
use crate::frame::{Channels, FrameBuf};
use crate::layer::{LayerFloat, LayerInt};

fn normalize(raw: u64, max_spatial_cost: u32) -> u8 {
    if max_spatial_cost == 0 {
        return 0;
    }
    let scaled = (raw.min(max_spatial_cost as u64) * 255) / max_spatial_cost as u64;
    scaled as u8
}

pub fn spatial_cost_map_int(layer: &LayerInt, config: &EngineConfig) -> FrameBuf {
    let (width, height) = (layer.width(), layer.height());
    let mut out = FrameBuf::new(width, height, Channels::Gray);
    let mask = layer.mask();
    let mapping = layer.mapping();
    let mut view = out.view_mut();
    for y in 0..height {
        for x in 0..width {
            if mask.is_source(x, y) {
                continue;
            }
            let source = mapping.get((x, y));
            let cost = mapping.spatial_cost(mask, (x, y), source, config.max_spatial_cost);
            view.pixel_mut(x, y)[0] = normalize(cost, config.max_spatial_cost);
        }
    }
    out
}

pub fn spatial_cost_map_float(layer: &LayerFloat, config: &EngineConfig) -> FrameBuf {
    let (width, height) = (layer.width(), layer.height());
    let mut out = FrameBuf::new(width, height, Channels::Gray);
    let mask = layer.mask();
    let mapping = layer.mapping();
    let mut view = out.view_mut();
    for y in 0..height {
        for x in 0..width {
            if mask.is_source(x, y) {
                continue;
            }
            let source = mapping.get((x, y));
            let cost = mapping.spatial_cost(mask, (x, y), source, config.max_spatial_cost);
            view.pixel_mut(x, y)[0] = normalize(cost, config.max_spatial_cost);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels as Ch, FrameBuf as FB};
    use crate::mask::Mask;

    #[test]
    fn source_pixels_stay_zero() {
        let mut frame = FB::new(8, 8, Ch::Gray);
        let mut mask = Mask::new_all_source(8, 8);
        mask.set(4, 4, 0);
        let layer = LayerInt::new(frame.view_mut(), mask).unwrap();
        let config = EngineConfig::default();
        let map = spatial_cost_map_int(&layer, &config);
        assert_eq!(map.view().pixel(0, 0)[0], 0);
    }
}
