#[macro_use]
extern crate criterion;
extern crate libinpaint;

use criterion::Criterion;

use libinpaint::frame::{Channels, FrameBuf};
use libinpaint::mapping::MappingInt;
use libinpaint::mask::Mask;

fn checkerboard(width: u32, height: u32) -> FrameBuf {
    let mut frame = FrameBuf::new(width, height, Channels::Rgb);
    let mut view = frame.view_mut();
    for y in 0..height {
        for x in 0..width {
            let p = view.pixel_mut(x, y);
            let v = if (x / 8 + y / 8) % 2 == 0 { 220 } else { 30 };
            p[0] = v;
            p[1] = v / 2;
            p[2] = 255 - v;
        }
    }
    frame
}

pub fn appearance_cost_benchmark(c: &mut Criterion) {
    let frame = checkerboard(256, 256);
    let mask = Mask::new_all_source(256, 256);
    let mapping = MappingInt::new(256, 256);

    c.bench_function("appearance_cost 5x5 RGB", |b| {
        b.iter(|| {
            mapping.appearance_cost(&frame.view(), &mask, (128, 128), (40, 40), 25, false);
        })
    });
}

pub fn spatial_cost_benchmark(c: &mut Criterion) {
    let mask = Mask::new_all_source(256, 256);
    let mapping = MappingInt::new(256, 256);

    c.bench_function("spatial_cost RGB", |b| {
        b.iter(|| {
            mapping.spatial_cost(&mask, (128, 128), (40, 40), u32::MAX);
        })
    });
}

criterion_group!(benches, appearance_cost_benchmark, spatial_cost_benchmark);
criterion_main!(benches);
