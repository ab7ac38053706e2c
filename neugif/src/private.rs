// private.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Private module for top-level items
use crate::dither::{Dither, IndexedFrame};
use crate::encode;
use crate::error::Result;
use crate::enhance::ColorEnhancement;
use crate::neuquant::NeuQuant;
use crate::palette::{ColorMap, Palette, PaletteMap};
use crate::source::{self, PixelSource};
use std::io::Write;

/// Default quantization sample factor
const DEFAULT_QUALITY: u32 = 10;

/// Settings for preparing animation steps
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepConfig {
    /// Quantization sample factor (1 is best, 30 is fastest)
    pub quality: u32,
    /// Dithering
    pub dither: Dither,
    /// Color enhancement
    pub enhancement: ColorEnhancement,
}

impl Default for StepConfig {
    fn default() -> Self {
        StepConfig {
            quality: DEFAULT_QUALITY,
            dither: Dither::default(),
            enhancement: ColorEnhancement::default(),
        }
    }
}

/// One step of an animation, indexed and ready to encode.
///
/// Steps can be prepared independently (on other threads, for example) and
/// then handed to one [StepEnc] in order.
///
/// [StepEnc]: struct.StepEnc.html
#[derive(Clone, Debug)]
pub struct Step {
    /// Palette indices
    frame: IndexedFrame,
    /// Palette built for this step
    palette: Option<Palette>,
    /// Quantizer which built the palette
    quantizer: Option<NeuQuant>,
}

impl Step {
    /// Prepare a step from a pixel source.
    ///
    /// * `source` Pixels; areas outside it are filled with white.
    /// * `width` / `height` Canvas size.
    /// * `config` Quantization, dithering and enhancement settings.
    /// * `global_palette` Fixed palette; if `None`, a palette is built.
    pub fn prepare<S>(
        source: &S,
        width: u16,
        height: u16,
        config: &StepConfig,
        global_palette: Option<&Palette>,
    ) -> Result<Self>
    where
        S: PixelSource + ?Sized,
    {
        let (w, h) = (usize::from(width), usize::from(height));
        let mut pixels = source::extract(source, width.into(), height.into());
        config.enhancement.apply(&mut pixels);
        match global_palette {
            Some(palette) => {
                let map = PaletteMap::new(palette);
                let frame =
                    config.dither.apply(&mut pixels, w, h, palette, &map)?;
                Ok(Step {
                    frame,
                    palette: None,
                    quantizer: None,
                })
            }
            None => {
                debug!("building palette: quality {}", config.quality);
                let quantizer = NeuQuant::new(&pixels, config.quality);
                let palette = quantizer.palette();
                let frame = config
                    .dither
                    .apply(&mut pixels, w, h, &palette, &quantizer)?;
                debug!("step: {} palette entries used", frame.used_count());
                Ok(Step {
                    frame,
                    palette: Some(palette),
                    quantizer: Some(quantizer),
                })
            }
        }
    }

    /// Create a step from palette indices.
    ///
    /// Without a palette, the global color table is used: either the fixed
    /// global palette, or the table written with the first frame.
    pub fn with_indices(indices: Vec<u8>, palette: Option<Palette>) -> Self {
        Step {
            frame: IndexedFrame::new(indices),
            palette,
            quantizer: None,
        }
    }

    /// Get the palette indices
    pub fn indices(&self) -> &[u8] {
        self.frame.indices()
    }

    /// Get the indexed frame
    pub fn frame(&self) -> &IndexedFrame {
        &self.frame
    }

    /// Get the step's own palette
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Find the palette index of a transparent color.
    ///
    /// A trained quantizer is used when present; otherwise the active
    /// palette is searched.
    pub(crate) fn transparent_index(&self, rgb: [u8; 3], active: &Palette) -> u8 {
        match &self.quantizer {
            Some(quantizer) => quantizer.nearest(rgb),
            None => PaletteMap::new(active).nearest(rgb),
        }
    }
}

/// GIF file encoder
///
/// Can be converted to one of two encoders:
/// * [into_step_enc] for animation frames
/// * [into_block_enc] for low-level [Block]s
///
/// ## Encoding Example
/// ```
/// use neugif::{Encoder, RgbFrame};
/// use std::error::Error;
/// use std::io::Write;
///
/// fn encode<W: Write>(mut w: W) -> Result<(), Box<dyn Error>> {
///     let mut enc = Encoder::new(&mut w)
///         .into_step_enc(4, 4)
///         .with_loop_count(0)
///         .with_delay_ms(200);
///     let mut frame = RgbFrame::with_color(4, 4, [255, 255, 255]);
///     enc.encode_frame(&frame)?;
///     frame.set_rgb(1, 1, [255, 0, 0]);
///     frame.set_rgb(2, 2, [255, 0, 0]);
///     enc.encode_frame(&frame)?;
///     enc.finish()?;
///     Ok(())
/// }
/// # encode(Vec::new()).unwrap();
/// ```
///
/// [Block]: block/enum.Block.html
/// [into_block_enc]: struct.Encoder.html#method.into_block_enc
/// [into_step_enc]: struct.Encoder.html#method.into_step_enc
pub struct Encoder<W: Write> {
    /// Writer for output data
    writer: W,
}

impl<W: Write> Encoder<W> {
    /// Create a new GIF encoder.
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    /// Convert into a block encoder.
    pub fn into_block_enc(self) -> encode::BlockEnc<W> {
        encode::BlockEnc::new(self.writer)
    }

    /// Convert into a step encoder, with canvas size.
    pub fn into_step_enc(self, width: u16, height: u16) -> encode::StepEnc<W> {
        encode::StepEnc::new(self.into_block_enc(), width, height)
    }
}
