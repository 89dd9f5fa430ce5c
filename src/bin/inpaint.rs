#[macro_use]
extern crate clap;
extern crate env_logger;
extern crate image;
extern crate libinpaint;
extern crate log;

use clap::{App, Arg};
use image::GenericImageView;

use libinpaint::config::EngineConfig;
use libinpaint::frame::{Channels, FrameBuf};
use libinpaint::mask::{Mask, SOURCE};
use libinpaint::optimize::CancelToken;

fn main() {
    env_logger::init();

    let matches = App::new("inpaint")
        .version(crate_version!())
        .about("Removes a masked region from an image via patch-based synthesis")
        .arg(Arg::with_name("input").help("Input image").index(1).required(true))
        .arg(Arg::with_name("mask").help("Mask image: white pixels are filled in").index(2).required(true))
        .arg(Arg::with_name("output").help("Output image").default_value("inpainted.png").index(3))
        .arg(
            Arg::with_name("seed")
                .help("RNG seed")
                .takes_value(true)
                .short("s")
                .long("seed")
                .default_value("0"),
        )
        .get_matches();

    let in_file = matches.value_of("input").unwrap();
    let mask_file = matches.value_of("mask").unwrap();
    let out_file = matches.value_of("output").unwrap();
    let seed = value_t!(matches, "seed", u64).unwrap();

    let img = image::open(in_file).unwrap_or_else(|e| panic!("failed to open {in_file}: {e}"));
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let frame = FrameBuf::from_raw(width, height, Channels::Rgb, (width * 3) as usize, rgb.into_raw())
        .expect("invalid input frame");

    let mask_img = image::open(mask_file).unwrap_or_else(|e| panic!("failed to open {mask_file}: {e}"));
    let mask_gray = mask_img.to_luma8();
    if mask_gray.dimensions() != (width, height) {
        panic!("mask dimensions {:?} do not match input dimensions {:?}", mask_gray.dimensions(), (width, height));
    }
    let mask_data: Vec<u8> = mask_gray.into_raw().into_iter().map(|v| if v > 127 { 0 } else { SOURCE }).collect();
    let mask = Mask::from_raw(width, height, mask_data).expect("invalid mask");

    let config = EngineConfig::default();
    let cancel = CancelToken::new();
    let output = libinpaint::synthesize(frame.view(), &mask, None, None, &config, seed, None, None, &cancel)
        .unwrap_or_else(|e| panic!("synthesis failed: {e}"));

    log::info!("total cost: {}", output.total_cost);

    let out_img = image::RgbImage::from_raw(width, height, output.frame.into_data())
        .expect("output buffer had the wrong length for its dimensions");
    out_img.save(out_file).unwrap_or_else(|e| panic!("failed to write {out_file}: {e}"));
}
