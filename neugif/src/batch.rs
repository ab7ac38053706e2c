// batch.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Convenience functions for encoding a whole animation at once
use crate::dither::Dither;
use crate::enhance::ColorEnhancement;
use crate::error::{Error, Result};
use crate::sink::OutputBuffer;
use crate::source::PixelSource;
use crate::Encoder;

/// Default frame delay, in milliseconds
const DEFAULT_DELAY_MS: u32 = 100;

/// Default quantization sample factor
const DEFAULT_QUALITY: u32 = 10;

/// Options for [encode_gif_with_options]
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    /// Canvas width (0 uses the first frame's width)
    pub width: u16,
    /// Canvas height (0 uses the first frame's height)
    pub height: u16,
    /// Repeat count: 0 loops forever, negative plays once with no
    /// looping extension
    pub repeat: i32,
    /// Quantization sample factor (0 means default of 10)
    pub quality: u32,
    /// Dithering
    pub dither: Dither,
    /// Fixed palette (packed RGB) for all frames
    pub global_palette: Option<Vec<u8>>,
    /// Delay for each frame in milliseconds; missing or 0 means 100
    pub delays_ms: Vec<u32>,
    /// Saturation boost (clamped to 1.0 - 2.0)
    pub saturation_boost: f64,
    /// Contrast boost (clamped to 1.0 - 2.0)
    pub contrast_boost: f64,
}

/// Get the canvas size from the first frame
fn first_frame_size<S: PixelSource>(frames: &[S]) -> Result<(u16, u16)> {
    let first = frames.first().ok_or(Error::NoFrames)?;
    Ok((
        u16::try_from(first.width())?,
        u16::try_from(first.height())?,
    ))
}

/// Encode frames into a looping GIF.
///
/// * `frames` Canvas size is taken from the first frame.
/// * `delays_ms` Delay for each frame; missing delays are 100 ms.
pub fn encode_gif<S: PixelSource>(
    frames: &[S],
    delays_ms: &[u32],
) -> Result<Vec<u8>> {
    let (width, height) = first_frame_size(frames)?;
    let mut enc = Encoder::new(OutputBuffer::new())
        .into_step_enc(width, height)
        .with_loop_count(0)
        .with_quality(DEFAULT_QUALITY);
    for (i, frame) in frames.iter().enumerate() {
        enc.set_delay_ms(delays_ms.get(i).copied().unwrap_or(DEFAULT_DELAY_MS));
        enc.encode_frame(frame)?;
    }
    enc.finish()?;
    Ok(enc.into_inner().into_vec())
}

/// Encode frames into a GIF with options
pub fn encode_gif_with_options<S: PixelSource>(
    frames: &[S],
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    let (mut width, mut height) = (options.width, options.height);
    if width == 0 || height == 0 {
        (width, height) = first_frame_size(frames)?;
    } else if frames.is_empty() {
        return Err(Error::NoFrames);
    }
    let quality = if options.quality == 0 {
        DEFAULT_QUALITY
    } else {
        options.quality
    };
    let enhancement =
        ColorEnhancement::new(options.saturation_boost, options.contrast_boost);
    let mut enc = Encoder::new(OutputBuffer::new())
        .into_step_enc(width, height)
        .with_quality(quality)
        .with_dither(options.dither)
        .with_enhancement(enhancement);
    if options.repeat >= 0 {
        enc = enc.with_loop_count(options.repeat as u16);
    }
    if let Some(palette) = &options.global_palette {
        enc = enc.with_global_palette(palette);
    }
    for (i, frame) in frames.iter().enumerate() {
        let delay = match options.delays_ms.get(i) {
            Some(d) if *d > 0 => *d,
            _ => DEFAULT_DELAY_MS,
        };
        enc.set_delay_ms(delay);
        enc.encode_frame(frame)?;
    }
    enc.finish()?;
    Ok(enc.into_inner().into_vec())
}
