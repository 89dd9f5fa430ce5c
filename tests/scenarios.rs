//! Literal end-to-end scenarios exercising `libinpaint::synthesize`
//! directly, as a caller embedding the crate would.

use libinpaint::config::{CoarseInitializer, EngineConfig};
use libinpaint::frame::{Channels, FrameBuf};
use libinpaint::init::Homography;
use libinpaint::mask::Mask;
use libinpaint::optimize::CancelToken;
use libinpaint::video::{synthesize_frame, VideoContext};

#[test]
fn single_pixel_hole_is_filled_from_a_real_source() {
    let mut frame = FrameBuf::new(8, 8, Channels::Gray);
    {
        let mut view = frame.view_mut();
        for y in 0..8u32 {
            for x in 0..8u32 {
                view.pixel_mut(x, y)[0] = ((x * 16 + y) % 256) as u8;
            }
        }
    }
    let mut mask = Mask::new_all_source(8, 8);
    mask.set(4, 4, 0);

    let config = EngineConfig::default();
    let cancel = CancelToken::new();
    let output = libinpaint::synthesize(frame.view(), &mask, None, None, &config, 3, None, None, &cancel).unwrap();

    for y in 0..8 {
        for x in 0..8 {
            if (x, y) != (4, 4) {
                assert_eq!(output.frame.view().pixel(x, y), frame.view().pixel(x, y));
            }
        }
    }

    let source = output.mapping.get((4, 4));
    let (sx, sy) = (source.0.round() as u32, source.1.round() as u32);
    assert_eq!(output.frame.view().pixel(4, 4), frame.view().pixel(sx, sy));
}

#[test]
fn periodic_vertical_strip_mostly_converges_in_a_few_sweeps() {
    let width = 64u32;
    let height = 64u32;
    let mut frame = FrameBuf::new(width, height, Channels::Gray);
    {
        let mut view = frame.view_mut();
        for y in 0..height {
            for x in 0..width {
                view.pixel_mut(x, y)[0] = ((x % 8) * 32) as u8;
            }
        }
    }
    let mut mask = Mask::new_all_source(width, height);
    for y in 0..height {
        for x in 30..33 {
            mask.set(x, y, 0);
        }
    }

    let config = EngineConfig { coarsest_sweeps: 3, optimization_iterations: 3, finest_sweeps: 3, ..EngineConfig::default() };
    let cancel = CancelToken::new();
    let output = libinpaint::synthesize(frame.view(), &mask, None, None, &config, 21, None, None, &cancel).unwrap();

    let mut matches = 0u32;
    let mut total = 0u32;
    for y in 0..height {
        for x in 30..33 {
            total += 1;
            let expected = ((x % 8) * 32) as u8;
            if output.frame.view().pixel(x, y)[0] == expected {
                matches += 1;
            }
        }
    }
    assert!(matches as f64 >= 0.95 * total as f64);
}

#[test]
fn constant_rgb_source_fills_exactly() {
    let width = 32u32;
    let height = 32u32;
    let mut frame = FrameBuf::new(width, height, Channels::Rgb);
    {
        let mut view = frame.view_mut();
        for y in 0..height {
            for x in 0..width {
                let p = view.pixel_mut(x, y);
                p[0] = 200;
                p[1] = 100;
                p[2] = 50;
            }
        }
    }
    let mut mask = Mask::new_all_source(width, height);
    for y in 12..20 {
        for x in 12..20 {
            mask.set(x, y, 0);
        }
    }

    let config = EngineConfig::default();
    let cancel = CancelToken::new();
    let output = libinpaint::synthesize(frame.view(), &mask, None, None, &config, 5, None, None, &cancel).unwrap();

    for y in 0..height {
        for x in 0..width {
            assert_eq!(output.frame.view().pixel(x, y), [200u8, 100, 50].as_slice());
        }
    }
}

#[test]
fn video_coherence_with_identity_homography_reproduces_the_first_frame() {
    let width = 64u32;
    let height = 64u32;
    let mut frame = FrameBuf::new(width, height, Channels::Gray);
    {
        let mut view = frame.view_mut();
        for y in 0..height {
            for x in 0..width {
                view.pixel_mut(x, y)[0] = (((x * 7 + y * 3) % 251) % 256) as u8;
            }
        }
    }
    let mut mask = Mask::new_all_source(width, height);
    for y in 24..40 {
        for x in 24..40 {
            mask.set(x, y, 0);
        }
    }

    let config = EngineConfig::default();
    let cancel = CancelToken::new();

    let (first, ctx1) =
        synthesize_frame(frame.view(), &mask, None, None, &config, 13, None, None, &cancel).unwrap();

    let identity = Homography::identity();
    let prior = VideoContext::new(ctx1.prior_mapping.clone(), identity);
    let (second, _ctx2) =
        synthesize_frame(frame.view(), &mask, None, None, &config, 13, Some(&prior), None, &cancel).unwrap();

    for y in 0..height {
        for x in 0..width {
            let a = first.frame.view().pixel(x, y)[0] as i32;
            let b = second.frame.view().pixel(x, y)[0] as i32;
            assert!((a - b).abs() <= 1, "pixel ({x}, {y}) differs: {a} vs {b}");
        }
    }
}

#[test]
fn filter_restricts_the_fill_to_the_one_stamped_region() {
    let mut frame = FrameBuf::new(8, 8, Channels::Gray);
    {
        let mut view = frame.view_mut();
        for y in 0..8u32 {
            for x in 0..8u32 {
                view.pixel_mut(x, y)[0] = ((x * 16 + y) % 256) as u8;
            }
        }
        // Stamp a small uniform block so bilinear sampling near its only
        // filter-admissible pixel can't pick up a non-matching neighbor.
        for y in 0..3u32 {
            for x in 0..3u32 {
                view.pixel_mut(x, y)[0] = 250;
            }
        }
    }
    let mut mask = Mask::new_all_source(8, 8);
    mask.set(4, 4, 0);

    let mut filter = Mask::new_all_source(8, 8);
    for y in 0..8u32 {
        for x in 0..8u32 {
            filter.set(x, y, 0);
        }
    }
    filter.set(1, 1, 0xFF);

    let config = EngineConfig {
        coarse_initializer: CoarseInitializer::Appearance,
        appearance_candidates: 400,
        coarsest_sweeps: 6,
        finest_sweeps: 6,
        ..EngineConfig::default()
    };
    let cancel = CancelToken::new();
    let output =
        libinpaint::synthesize(frame.view(), &mask, Some(&filter), None, &config, 17, None, None, &cancel).unwrap();

    assert_eq!(output.frame.view().pixel(4, 4), [250u8].as_slice());
}

#[test]
fn cancellation_before_the_first_sweep_leaves_the_input_untouched() {
    let width = 512u32;
    let height = 512u32;
    let frame = FrameBuf::new(width, height, Channels::Gray);
    let mut mask = Mask::new_all_source(width, height);
    for y in 150..350 {
        for x in 150..350 {
            mask.set(x, y, 0);
        }
    }

    let config = EngineConfig::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = libinpaint::synthesize(frame.view(), &mask, None, None, &config, 1, None, None, &cancel);
    assert!(result.is_err());
}
