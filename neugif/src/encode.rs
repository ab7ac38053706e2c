// encode.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! GIF file encoding
use crate::block::*;
use crate::dither::Dither;
use crate::enhance::ColorEnhancement;
use crate::error::{Error, Result};
use crate::lzw::Compressor;
use crate::palette::Palette;
use crate::private::{Step, StepConfig};
use crate::source::PixelSource;
use std::io::Write;

/// Bits per palette index (color tables always hold 256 entries)
const COLOR_DEPTH: u8 = 8;

/// Encoder for writing [Block]s into a GIF file.
///
/// Build with Encoder.[into_block_enc].
///
/// [Block]: block/enum.Block.html
/// [into_block_enc]: struct.Encoder.html#method.into_block_enc
pub struct BlockEnc<W: Write> {
    /// Writer for blocks
    writer: W,
}

/// Encoder position within the block grammar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Header, screen descriptor and global color table not yet written
    AwaitingHeader,
    /// Frames may be written
    Streaming,
    /// Trailer has been written
    Finished,
}

/// Settings which apply to subsequent frames
#[derive(Clone, Debug, Default)]
struct StreamState {
    /// Color to make transparent
    transparent_color: Option<[u8; 3]>,
    /// Disposal method override
    disposal_method: Option<DisposalMethod>,
    /// Frame delay in centiseconds
    delay_time_cs: u16,
    /// Loop count for the application extension
    loop_count: Option<u16>,
}

/// Encoder for writing animation frames into a GIF file.
///
/// Build with Encoder.[into_step_enc].
///
/// [into_step_enc]: struct.Encoder.html#method.into_step_enc
pub struct StepEnc<W: Write> {
    /// Block encoder
    block_enc: BlockEnc<W>,
    /// Canvas width
    width: u16,
    /// Canvas height
    height: u16,
    /// Position in block grammar
    state: State,
    /// Per-frame block settings
    stream: StreamState,
    /// Frame preparation settings
    config: StepConfig,
    /// Fixed palette for all frames
    global_palette: Option<Palette>,
    /// Global color table written with the header
    screen_palette: Option<Palette>,
}

impl<W: Write> BlockEnc<W> {
    /// Create a new GIF block encoder.
    pub(crate) fn new(writer: W) -> Self {
        BlockEnc { writer }
    }

    /// Encode one [Block](block/enum.Block.html).
    pub fn encode<B>(&mut self, block: B) -> Result<()>
    where
        B: Into<Block>,
    {
        use crate::block::Block::*;
        let w = &mut self.writer;
        match block.into() {
            Header(b) => b.format(w),
            LogicalScreenDesc(b) => b.format(w),
            GlobalColorTable(b) => b.format(w),
            GraphicControl(b) => b.format(w),
            Application(b) => b.format(w),
            ImageDesc(b) => b.format(w),
            LocalColorTable(b) => b.format(w),
            ImageData(b) => b.format(w),
            Trailer(b) => b.format(w),
        }
    }

    /// Get a mutable reference to the writer
    fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Convert into the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl Header {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(b"GIF")?;
        w.write_all(&self.version())?;
        Ok(())
    }
}

impl LogicalScreenDesc {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut buf = Vec::with_capacity(7);
        buf.extend_from_slice(&self.screen_width().to_le_bytes());
        buf.extend_from_slice(&self.screen_height().to_le_bytes());
        buf.push(self.flags());
        buf.push(self.background_color_idx());
        buf.push(self.pixel_aspect_ratio());
        w.write_all(&buf)?;
        Ok(())
    }
}

impl GlobalColorTable {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(self.colors())?;
        Ok(())
    }
}

impl GraphicControl {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        let mut buf = Vec::with_capacity(7);
        buf.push(ExtensionCode::GraphicControl_.into());
        buf.push(4); // block size
        buf.push(self.flags());
        buf.extend_from_slice(&self.delay_time_cs().to_le_bytes());
        buf.push(self.transparent_color_idx());
        buf.push(0); // block size
        w.write_all(&buf)?;
        Ok(())
    }
}

impl Application {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        w.write_all(&[ExtensionCode::Application_.into()])?;
        for c in self.app_data() {
            debug_assert!(c.len() < 256);
            let len = c.len() as u8;
            w.write_all(&[len])?; // block size
            w.write_all(c)?;
        }
        w.write_all(&[0])?; // block size
        Ok(())
    }
}

impl ImageDesc {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(BlockCode::ImageDesc_.signature())?;
        let mut buf = Vec::with_capacity(9);
        buf.extend_from_slice(&self.left().to_le_bytes());
        buf.extend_from_slice(&self.top().to_le_bytes());
        buf.extend_from_slice(&self.width().to_le_bytes());
        buf.extend_from_slice(&self.height().to_le_bytes());
        buf.push(self.flags());
        w.write_all(&buf)?;
        Ok(())
    }
}

impl LocalColorTable {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(self.colors())?;
        Ok(())
    }
}

impl ImageData {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        format_image_data(w, self.min_code_size(), self.data())
    }
}

/// Write LZW compressed image data, with terminating sub-block
fn format_image_data<W: Write>(
    w: &mut W,
    min_code_size: u8,
    indices: &[u8],
) -> Result<()> {
    let mut compressor = Compressor::new(min_code_size);
    let mut buffer = Vec::with_capacity(indices.len() / 2 + 16);
    compressor.compress(indices, &mut buffer);
    w.write_all(&[compressor.min_code_bits()])?;
    w.write_all(&buffer)?;
    w.write_all(&[0])?; // block size
    Ok(())
}

impl Trailer {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(BlockCode::Trailer_.signature())?;
        Ok(())
    }
}

impl<W: Write> StepEnc<W> {
    /// Create a new GIF step encoder.
    pub(crate) fn new(block_enc: BlockEnc<W>, width: u16, height: u16) -> Self {
        StepEnc {
            block_enc,
            width,
            height,
            state: State::AwaitingHeader,
            stream: StreamState::default(),
            config: StepConfig::default(),
            global_palette: None,
            screen_palette: None,
        }
    }

    /// Set the loop count (zero means forever).
    ///
    /// Without a loop count, no looping extension is written.
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.stream.loop_count = Some(loop_count);
        self
    }

    /// Set the frame delay in milliseconds
    pub fn with_delay_ms(mut self, delay_ms: u32) -> Self {
        self.set_delay_ms(delay_ms);
        self
    }

    /// Set the frame delay from a frame rate
    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.set_frame_rate(fps);
        self
    }

    /// Set quantization sample factor (1 is best, 30 is fastest)
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.config.quality = quality.max(1);
        self
    }

    /// Set dithering
    pub fn with_dither<D: Into<Dither>>(mut self, dither: D) -> Self {
        self.set_dither(dither);
        self
    }

    /// Use a fixed palette (packed RGB) for all frames.
    ///
    /// Tables are padded or truncated to 256 entries; an empty table means
    /// every frame gets its own palette.
    pub fn with_global_palette(mut self, rgb: &[u8]) -> Self {
        self.global_palette = if rgb.is_empty() {
            None
        } else {
            Some(Palette::from_rgb_bytes(rgb))
        };
        self
    }

    /// Set the color to make transparent
    pub fn with_transparent_color(mut self, rgb: Option<[u8; 3]>) -> Self {
        self.set_transparent_color(rgb);
        self
    }

    /// Override the frame disposal method
    pub fn with_disposal_method(mut self, method: DisposalMethod) -> Self {
        self.set_disposal_method(method);
        self
    }

    /// Set color enhancement
    pub fn with_enhancement(mut self, enhancement: ColorEnhancement) -> Self {
        self.config.enhancement = enhancement;
        self
    }

    /// Set the delay in milliseconds for subsequent frames
    pub fn set_delay_ms(&mut self, delay_ms: u32) {
        self.stream.delay_time_cs = (delay_ms / 10) as u16;
    }

    /// Set the delay from a frame rate for subsequent frames
    pub fn set_frame_rate(&mut self, fps: u32) {
        self.stream.delay_time_cs = (100 / fps.max(1)) as u16;
    }

    /// Set the transparent color for subsequent frames
    pub fn set_transparent_color(&mut self, rgb: Option<[u8; 3]>) {
        self.stream.transparent_color = rgb;
    }

    /// Override the disposal method for subsequent frames
    pub fn set_disposal_method(&mut self, method: DisposalMethod) {
        self.stream.disposal_method = Some(method);
    }

    /// Set dithering for subsequent frames
    pub fn set_dither<D: Into<Dither>>(&mut self, dither: D) {
        self.config.dither = dither.into();
    }

    /// Get the global palette
    pub fn global_palette(&self) -> Option<&Palette> {
        self.global_palette.as_ref()
    }

    /// Get the frame preparation settings
    pub fn step_config(&self) -> &StepConfig {
        &self.config
    }

    /// Get the canvas size
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Quantize and encode one frame
    pub fn encode_frame<S>(&mut self, source: &S) -> Result<()>
    where
        S: PixelSource + ?Sized,
    {
        if self.state == State::Finished {
            return Err(Error::StreamFinished);
        }
        let step = Step::prepare(
            source,
            self.width,
            self.height,
            &self.config,
            self.global_palette.as_ref(),
        )?;
        self.encode_step(&step)
    }

    /// Encode one prepared [Step](struct.Step.html).
    pub fn encode_step(&mut self, step: &Step) -> Result<()> {
        if self.state == State::Finished {
            return Err(Error::StreamFinished);
        }
        let sz = usize::from(self.width) * usize::from(self.height);
        if step.indices().len() != sz {
            return Err(Error::InvalidFrameDimensions);
        }
        let global = self.global_palette.as_ref();
        let palette = step
            .palette()
            .or(global)
            .or(self.screen_palette.as_ref())
            .ok_or(Error::MissingColorTable)?;
        let first = self.state == State::AwaitingHeader;
        let has_local =
            step.palette().is_some() && (!first || global.is_some());
        let transparent = self
            .stream
            .transparent_color
            .map(|rgb| step.transparent_index(rgb, palette));
        if first {
            let table = global.unwrap_or(palette).clone();
            self.encode_header(&table)?;
            self.screen_palette = Some(table);
        }
        let local = if has_local { step.palette() } else { None };
        let control = self.graphic_control(transparent);
        debug!(
            "frame: {} palette, transparent {:?}, disposal {:?}",
            if local.is_some() { "local" } else { "global" },
            transparent,
            control.disposal_method(),
        );
        self.block_enc.encode(control)?;
        let tbl_cfg = if local.is_some() {
            ColorTableConfig::full()
        } else {
            ColorTableConfig::default()
        };
        let image_desc = ImageDesc::default()
            .with_width(self.width)
            .with_height(self.height)
            .with_color_table_config(&tbl_cfg);
        self.block_enc.encode(image_desc)?;
        if let Some(local) = local {
            self.block_enc.encode(LocalColorTable::with_palette(local))?;
        }
        format_image_data(
            self.block_enc.writer_mut(),
            COLOR_DEPTH,
            step.indices(),
        )?;
        self.state = State::Streaming;
        Ok(())
    }

    /// Encode header blocks, before first frame
    fn encode_header(&mut self, table: &Palette) -> Result<()> {
        debug!(
            "header: {}x{}, loop {:?}",
            self.width, self.height, self.stream.loop_count
        );
        self.block_enc.encode(Header::default())?;
        let desc = LogicalScreenDesc::default()
            .with_screen_width(self.width)
            .with_screen_height(self.height)
            .with_color_table_config(&ColorTableConfig::full());
        self.block_enc.encode(desc)?;
        self.block_enc.encode(GlobalColorTable::with_palette(table))?;
        if let Some(loop_count) = self.stream.loop_count {
            self.block_enc.encode(Application::with_loop_count(loop_count))?;
        }
        Ok(())
    }

    /// Build graphic control extension for the next frame
    fn graphic_control(&self, transparent: Option<u8>) -> GraphicControl {
        let disposal = self.stream.disposal_method.unwrap_or(
            if transparent.is_some() {
                DisposalMethod::Background
            } else {
                DisposalMethod::NoAction
            },
        );
        let mut control = GraphicControl::default();
        control.set_disposal_method(disposal);
        control.set_delay_time_cs(self.stream.delay_time_cs);
        control.set_transparent_color(transparent);
        control
    }

    /// Write the trailer, finishing the stream.
    ///
    /// Fails with `NoFrames` if no frame was encoded.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            State::AwaitingHeader => Err(Error::NoFrames),
            State::Finished => Err(Error::StreamFinished),
            State::Streaming => {
                self.block_enc.encode(Trailer::default())?;
                self.block_enc.writer_mut().flush()?;
                self.state = State::Finished;
                Ok(())
            }
        }
    }

    /// Check whether the trailer has been written
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Convert into the inner writer
    pub fn into_inner(self) -> W {
        self.block_enc.into_inner()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::RgbFrame;
    use crate::Encoder;

    fn gray_palette() -> Vec<u8> {
        (0..=255u8).flat_map(|v| [v, v, v]).collect()
    }

    #[test]
    fn block_bytes() {
        let mut enc = Encoder::new(Vec::new()).into_block_enc();
        enc.encode(Header::default()).unwrap();
        enc.encode(
            LogicalScreenDesc::default()
                .with_screen_width(0x0102)
                .with_screen_height(3)
                .with_color_table_config(&ColorTableConfig::full()),
        )
        .unwrap();
        enc.encode(Application::with_loop_count(0)).unwrap();
        let mut gc = GraphicControl::default();
        gc.set_delay_time_cs(10);
        gc.set_disposal_method(DisposalMethod::Background);
        gc.set_transparent_color(Some(5));
        enc.encode(gc).unwrap();
        enc.encode(ImageDesc::default().with_width(2).with_height(1))
            .unwrap();
        enc.encode(Trailer::default()).unwrap();
        let mut expected = b"GIF89a".to_vec();
        expected.extend_from_slice(&[0x02, 0x01, 3, 0, 0xF7, 0, 0]);
        expected.extend_from_slice(&[0x21, 0xFF, 11]);
        expected.extend_from_slice(b"NETSCAPE2.0");
        expected.extend_from_slice(&[3, 1, 0, 0, 0]);
        expected.extend_from_slice(&[0x21, 0xF9, 4, 0b0000_1001, 10, 0, 5, 0]);
        expected.extend_from_slice(&[0x2C, 0, 0, 0, 0, 2, 0, 1, 0, 0]);
        expected.push(0x3B);
        assert_eq!(enc.into_inner(), expected);
    }

    #[test]
    fn image_data_bytes() {
        let mut enc = Encoder::new(Vec::new()).into_block_enc();
        enc.encode(ImageData::with_indices(vec![1], 2)).unwrap();
        assert_eq!(enc.into_inner(), [2, 2, 0b0100_1100, 0b0000_0001, 0]);
    }

    #[test]
    fn delay_conversion() {
        let mut enc = Encoder::new(Vec::new())
            .into_step_enc(1, 1)
            .with_delay_ms(105);
        assert_eq!(enc.stream.delay_time_cs, 10);
        enc.set_delay_ms(9);
        assert_eq!(enc.stream.delay_time_cs, 0);
        enc.set_frame_rate(30);
        assert_eq!(enc.stream.delay_time_cs, 3);
        enc.set_frame_rate(0);
        assert_eq!(enc.stream.delay_time_cs, 100);
        let enc = enc.with_quality(0);
        assert_eq!(enc.step_config().quality, 1);
    }

    #[test]
    fn disposal_default() {
        let enc = Encoder::new(Vec::new()).into_step_enc(1, 1);
        let gc = enc.graphic_control(None);
        assert_eq!(gc.flags(), 0);
        let gc = enc.graphic_control(Some(3));
        assert_eq!(gc.disposal_method(), DisposalMethod::Background);
        assert_eq!(gc.flags(), 0b0000_1001);
        let enc = enc.with_disposal_method(DisposalMethod::Keep);
        let gc = enc.graphic_control(Some(3));
        assert_eq!(gc.flags(), 0b0000_0101);
        let enc = enc.with_disposal_method(DisposalMethod::from(0x0B));
        let gc = enc.graphic_control(None);
        assert_eq!(gc.flags(), 0b0000_1100);
    }

    #[test]
    fn stream_states() {
        let mut enc = Encoder::new(Vec::new())
            .into_step_enc(2, 2)
            .with_global_palette(&gray_palette());
        assert!(matches!(enc.finish(), Err(Error::NoFrames)));
        let frame = RgbFrame::with_color(2, 2, [9, 9, 9]);
        enc.encode_frame(&frame).unwrap();
        let bad = Step::with_indices(vec![0; 3], None);
        assert!(matches!(
            enc.encode_step(&bad),
            Err(Error::InvalidFrameDimensions)
        ));
        enc.finish().unwrap();
        assert!(enc.is_finished());
        assert!(matches!(
            enc.encode_frame(&frame),
            Err(Error::StreamFinished)
        ));
        assert!(matches!(enc.finish(), Err(Error::StreamFinished)));
        let bytes = enc.into_inner();
        assert_eq!(&bytes[..6], b"GIF89a");
        assert_eq!(bytes.last(), Some(&0x3B));
    }

    #[test]
    fn missing_color_table() {
        let mut enc = Encoder::new(Vec::new()).into_step_enc(1, 1);
        let step = Step::with_indices(vec![0], None);
        assert!(matches!(
            enc.encode_step(&step),
            Err(Error::MissingColorTable)
        ));
        // nothing written
        assert!(enc.into_inner().is_empty());
    }

    #[test]
    fn indexed_step_uses_screen_table() {
        let palette = Palette::from_rgb_bytes(&gray_palette());
        let mut enc = Encoder::new(Vec::new()).into_step_enc(1, 1);
        enc.encode_step(&Step::with_indices(vec![3], Some(palette)))
            .unwrap();
        enc.encode_step(&Step::with_indices(vec![7], None)).unwrap();
        enc.finish().unwrap();
        let bytes = enc.into_inner();
        // header 6 + screen 7 + table 768, then two frames of
        // control 8 + descriptor 10 + data 7
        assert_eq!(bytes.len(), 832);
        assert_eq!(&bytes[13..16], &[0, 0, 0]);
        assert_eq!(&bytes[22..25], &[3, 3, 3]);
        // neither descriptor has a local table
        assert_eq!(bytes[789], 0x2C);
        assert_eq!(bytes[798], 0);
        assert_eq!(bytes[814], 0x2C);
        assert_eq!(bytes[823], 0);
        assert_eq!(bytes[831], 0x3B);
    }

    #[test]
    fn transparent_global() {
        let mut enc = Encoder::new(Vec::new())
            .into_step_enc(1, 1)
            .with_global_palette(&gray_palette())
            .with_transparent_color(Some([200, 201, 199]));
        enc.encode_frame(&RgbFrame::with_color(1, 1, [0, 0, 0]))
            .unwrap();
        let bytes = enc.into_inner();
        // header 6 + screen 7 + table 768
        let gce = &bytes[781..789];
        assert_eq!(gce, [0x21, 0xF9, 4, 0b0000_1001, 0, 0, 200, 0]);
    }
}
