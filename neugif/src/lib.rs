// lib.rs      neugif crate.
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Animated GIF encoder with neural-net color quantization
//!
//! Frames are quantized to 256 colors ([NeuQuant]), optionally dithered,
//! LZW compressed and written as a GIF89a stream.
//!
//! [NeuQuant]: neuquant/struct.NeuQuant.html
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

mod batch;
pub mod block;
pub mod dither;
mod encode;
pub mod enhance;
mod error;
pub mod lzw;
pub mod neuquant;
pub mod palette;
mod private;
mod sink;
mod source;

pub use crate::batch::{encode_gif, encode_gif_with_options, EncodeOptions};
pub use crate::dither::{Dither, DitherMethod};
pub use crate::encode::{BlockEnc, StepEnc};
pub use crate::error::{Error, Result};
pub use crate::palette::Palette;
pub use crate::private::{Encoder, Step, StepConfig};
pub use crate::sink::OutputBuffer;
pub use crate::source::{PixelSource, RgbFrame, SENTINEL};
