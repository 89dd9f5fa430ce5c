//! The CostTotalCreator (spec.md 4.E): sums the per-pixel combined cost
//! over every target pixel in a Layer, giving a single scalar that a
//! caller can log across sweeps to watch convergence, or a test can assert
//! strictly decreases (property P1).

use crate::config::EngineConfig;
use crate::frame::FrameView;
use crate::layer::{LayerFloat, LayerInt};
use crate::mapping::MappingInt;

pub fn total_cost_int(layer: &LayerInt, frame: &FrameView, config: &EngineConfig) -> u64 {
    let mask = layer.mask();
    let mapping = layer.mapping();
    let channels = frame.channels().count();
    let bbox = layer.bounding_box();
    let mut total = 0u64;
    for y in bbox.top()..bbox.bottom() {
        for x in bbox.left()..bbox.right() {
            if mask.is_source(x, y) {
                continue;
            }
            let source = mapping.get((x, y));
            if !MappingInt::is_valid_source(source) {
                continue;
            }
            let appearance = mapping.appearance_cost(frame, mask, (x, y), source, config.border_factor, false);
            let spatial = mapping.spatial_cost(mask, (x, y), source, config.max_spatial_cost);
            total += mapping.norm().pixel_cost(appearance, spatial, config.weight_factor, channels);
        }
    }
    total
}

pub fn total_cost_float(layer: &LayerFloat, frame: &FrameView, config: &EngineConfig) -> u64 {
    let mask = layer.mask();
    let mapping = layer.mapping();
    let channels = frame.channels().count();
    let bbox = layer.bounding_box();
    let mut total = 0u64;
    for y in bbox.top()..bbox.bottom() {
        for x in bbox.left()..bbox.right() {
            if mask.is_source(x, y) {
                continue;
            }
            let source = mapping.get((x, y));
            let appearance = mapping.appearance_cost(frame, mask, (x, y), source, config.border_factor, false);
            let spatial = mapping.spatial_cost(mask, (x, y), source, config.max_spatial_cost);
            total += mapping.norm().pixel_cost(appearance, spatial, config.weight_factor, channels);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Channels, FrameBuf};
    use crate::mask::Mask;

    #[test]
    fn zero_target_pixels_means_zero_cost() {
        let frame = FrameBuf::new(8, 8, Channels::Gray);
        let mut layer_frame = frame.clone();
        let mask = Mask::new_all_source(8, 8);
        let layer = LayerInt::new(layer_frame.view_mut(), mask).unwrap();
        let config = EngineConfig::default();
        assert_eq!(total_cost_int(&layer, &frame.view(), &config), 0);
    }
}
