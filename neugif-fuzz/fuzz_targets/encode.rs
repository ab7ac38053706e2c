// cargo fuzz run encode corpus/encode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use neugif::{Dither, EncodeOptions, RgbFrame, encode_gif_with_options};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let width = u32::from(data[0] % 32) + 1;
    let height = u32::from(data[1] % 32) + 1;
    let dither = match data[2] % 5 {
        0 => "none",
        1 => "FloydSteinberg",
        2 => "FalseFloydSteinberg-serpentine",
        3 => "Stucki",
        _ => "Atkinson-serpentine",
    };
    let options = EncodeOptions {
        quality: u32::from(data[3] % 30),
        dither: Dither::from(dither),
        ..Default::default()
    };
    let frames: Vec<RgbFrame> = data[4..]
        .chunks(256)
        .map(|px| RgbFrame::new(width, height, px.to_vec()))
        .collect();
    if let Ok(gif) = encode_gif_with_options(&frames, &options) {
        assert_eq!(&gif[..6], b"GIF89a");
        assert_eq!(gif.last(), Some(&0x3B));
    }
});
