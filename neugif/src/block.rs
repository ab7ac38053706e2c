// block.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! GIF blocks written by the encoder
use crate::palette::Palette;

/// Whether a color table is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableExistence {
    /// No color table
    Absent,
    /// Color table follows the descriptor
    Present,
}

/// Color table configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    existence: ColorTableExistence,
    table_len: usize, // must be between 2...256
}

impl Default for ColorTableConfig {
    fn default() -> Self {
        ColorTableConfig {
            existence: ColorTableExistence::Absent,
            table_len: 2,
        }
    }
}

impl ColorTableConfig {
    /// Create a new color table config
    pub fn new(existence: ColorTableExistence, table_len: u16) -> Self {
        let table_len =
            (table_len as usize).max(2).next_power_of_two().min(256);
        ColorTableConfig {
            existence,
            table_len,
        }
    }

    /// Config for a full (256 entry) color table
    pub fn full() -> Self {
        Self::new(ColorTableExistence::Present, 256)
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        match self.existence {
            ColorTableExistence::Absent => 0,
            ColorTableExistence::Present => self.table_len,
        }
    }

    /// Check if table is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the size field (table length is `2 << bits`)
    fn len_bits(&self) -> u8 {
        let sz = self.table_len;
        for b in 0..7 {
            if (sz >> (b + 1)) == 1 {
                return b;
            }
        }
        7
    }

}

/// Disposal method for a frame
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified
    NoAction,
    /// Leave frame in place
    Keep,
    /// Restore to background color
    Background,
    /// Restore to previous frame
    Previous,
    /// Reserved value (4-7)
    Reserved(u8),
}

impl Default for DisposalMethod {
    fn default() -> Self {
        DisposalMethod::NoAction
    }
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            n => Reserved(n),
        }
    }
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
            Reserved(n) => n & 0b0111,
        }
    }
}

/// Block signatures
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    /// Get the signature byte(s)
    pub fn signature(&self) -> &'static [u8] {
        use self::BlockCode::*;
        match self {
            ImageDesc_ => b",", // (0x2C) Image separator
            Extension_ => b"!", // (0x21) Extension introducer
            Trailer_ => b";",   // (0x3B) GIF trailer
        }
    }
}

/// Extension labels
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    GraphicControl_,
    Application_,
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            GraphicControl_ => 0xF9,
            Application_ => 0xFF,
        }
    }
}

/// Header block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Default for Header {
    fn default() -> Self {
        Header::with_version(*b"89a")
    }
}

impl Header {
    /// Create a header with a version
    pub fn with_version(version: [u8; 3]) -> Self {
        Header { version }
    }

    /// Get the version
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical screen descriptor block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8, // index into global color table
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    /// Set color table config (color resolution matches table size)
    pub fn with_color_table_config(mut self, tbl: &ColorTableConfig) -> Self {
        let mut flags = tbl.len_bits() & Self::COLOR_TABLE_SIZE;
        flags |= (flags << 4) & Self::COLOR_RESOLUTION;
        if tbl.existence == ColorTableExistence::Present {
            flags |= Self::COLOR_TABLE_PRESENT;
        }
        self.flags = flags;
        self
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
}

/// Global color table block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalColorTable {
    colors: Vec<u8>,
}

impl GlobalColorTable {
    /// Create a global color table from a palette
    pub fn with_palette(palette: &Palette) -> Self {
        let colors = palette.as_bytes().to_vec();
        GlobalColorTable { colors }
    }
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
}

/// Graphic control extension block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }
    pub fn set_disposal_method(&mut self, disposal_method: DisposalMethod) {
        let d: u8 = disposal_method.into();
        self.flags =
            (self.flags & !Self::DISPOSAL_METHOD) | ((d << 2) & Self::DISPOSAL_METHOD);
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn set_delay_time_cs(&mut self, delay_time_cs: u16) {
        self.delay_time_cs = delay_time_cs;
    }
    pub fn transparent_color(&self) -> Option<u8> {
        if self.flags & Self::TRANSPARENT_COLOR != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }
    pub fn transparent_color_idx(&self) -> u8 {
        self.transparent_color_idx
    }
    pub fn set_transparent_color(&mut self, transparent_color: Option<u8>) {
        match transparent_color {
            Some(t) => {
                self.flags |= Self::TRANSPARENT_COLOR;
                self.transparent_color_idx = t;
            }
            None => {
                self.flags &= !Self::TRANSPARENT_COLOR;
                self.transparent_color_idx = 0;
            }
        }
    }
}

/// Application extension block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Application {
    app_data: Vec<Vec<u8>>, // sequence of sub-blocks
}

impl Application {
    /// Create a looping (NETSCAPE2.0) extension
    ///
    /// * `loop_count` Number of times to repeat (zero means forever).
    pub fn with_loop_count(loop_count: u16) -> Self {
        let [lo, hi] = loop_count.to_le_bytes();
        let app_data = vec![b"NETSCAPE2.0".to_vec(), vec![1, lo, hi]];
        Application { app_data }
    }
    pub fn app_data(&self) -> &[Vec<u8>] {
        &self.app_data
    }
    /// Get the loop count, if this is a looping extension
    pub fn loop_count(&self) -> Option<u16> {
        // NOTE: this block must follow immediately after GlobalColorTable
        let d = &self.app_data;
        let exists = d.len() == 2
            && d[0] == b"NETSCAPE2.0"
            && d[1].len() == 3
            && d[1][0] == 1;
        if exists {
            Some(u16::from_le_bytes([d[1][1], d[1][2]]))
        } else {
            None
        }
    }
}

/// Image descriptor block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    /// Set local color table config
    ///
    /// The size field is only written when a table is present.
    pub fn with_color_table_config(mut self, tbl: &ColorTableConfig) -> Self {
        self.flags = match tbl.existence {
            ColorTableExistence::Present => {
                Self::COLOR_TABLE_PRESENT
                    | (tbl.len_bits() & Self::COLOR_TABLE_SIZE)
            }
            ColorTableExistence::Absent => 0,
        };
        self
    }
}

/// Local color table block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalColorTable {
    colors: Vec<u8>,
}

impl LocalColorTable {
    /// Create a local color table from a palette
    pub fn with_palette(palette: &Palette) -> Self {
        let colors = palette.as_bytes().to_vec();
        LocalColorTable { colors }
    }
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
}

/// Image data block (uncompressed indices)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    min_code_size: u8,
    data: Vec<u8>,
}

impl ImageData {
    /// Create image data from palette indices
    pub fn with_indices(data: Vec<u8>, min_code_size: u8) -> Self {
        ImageData {
            min_code_size,
            data,
        }
    }
    pub fn min_code_size(&self) -> u8 {
        self.min_code_size.max(2) // must be >= 2
    }
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Trailer block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trailer {}

/// Any block which can be encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Header(Header),
    LogicalScreenDesc(LogicalScreenDesc),
    GlobalColorTable(GlobalColorTable),
    GraphicControl(GraphicControl),
    Application(Application),
    ImageDesc(ImageDesc),
    LocalColorTable(LocalColorTable),
    ImageData(ImageData),
    Trailer(Trailer),
}

impl From<Header> for Block {
    fn from(b: Header) -> Self {
        Block::Header(b)
    }
}

impl From<LogicalScreenDesc> for Block {
    fn from(b: LogicalScreenDesc) -> Self {
        Block::LogicalScreenDesc(b)
    }
}

impl From<GlobalColorTable> for Block {
    fn from(b: GlobalColorTable) -> Self {
        Block::GlobalColorTable(b)
    }
}

impl From<GraphicControl> for Block {
    fn from(b: GraphicControl) -> Self {
        Block::GraphicControl(b)
    }
}

impl From<Application> for Block {
    fn from(b: Application) -> Self {
        Block::Application(b)
    }
}

impl From<ImageDesc> for Block {
    fn from(b: ImageDesc) -> Self {
        Block::ImageDesc(b)
    }
}

impl From<LocalColorTable> for Block {
    fn from(b: LocalColorTable) -> Self {
        Block::LocalColorTable(b)
    }
}

impl From<ImageData> for Block {
    fn from(b: ImageData) -> Self {
        Block::ImageData(b)
    }
}

impl From<Trailer> for Block {
    fn from(b: Trailer) -> Self {
        Block::Trailer(b)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn color_table_len() {
        let t = ColorTableConfig::new(ColorTableExistence::Present, 0); // 0-2
        assert_eq!(t.len_bits(), 0);
        let t = ColorTableConfig::new(ColorTableExistence::Present, 7); // 5-8
        assert_eq!(t.len_bits(), 2);
        let t = ColorTableConfig::new(ColorTableExistence::Present, 65); // 65-128
        assert_eq!(t.len_bits(), 6);
        let t = ColorTableConfig::full();
        assert_eq!(t.len_bits(), 7);
        assert_eq!(t.len(), 256);
        let t = ColorTableConfig::default();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn screen_flags() {
        let lsd = LogicalScreenDesc::default()
            .with_color_table_config(&ColorTableConfig::full());
        assert_eq!(lsd.flags(), 0xF7);
    }

    #[test]
    fn image_desc_flags() {
        let desc = ImageDesc::default()
            .with_color_table_config(&ColorTableConfig::full());
        assert_eq!(desc.flags(), 0x87);
        let desc = desc.with_color_table_config(&ColorTableConfig::default());
        assert_eq!(desc.flags(), 0);
    }

    #[test]
    fn loop_count() {
        let b = Application::default();
        assert_eq!(b.loop_count(), None);
        let b = Application::with_loop_count(0);
        assert_eq!(b.loop_count(), Some(0));
        let b = Application::with_loop_count(0x0102);
        assert_eq!(b.app_data()[1], [1, 0x02, 0x01]);
        assert_eq!(b.loop_count(), Some(0x0102));
    }

    #[test]
    fn disposal_masked() {
        assert_eq!(DisposalMethod::from(2), DisposalMethod::Background);
        assert_eq!(DisposalMethod::from(0x0A), DisposalMethod::Background);
        assert_eq!(u8::from(DisposalMethod::Reserved(0xFF)), 7);
        let mut gc = GraphicControl::default();
        gc.set_disposal_method(DisposalMethod::Background);
        assert_eq!(gc.flags(), 0b0000_1000);
        gc.set_transparent_color(Some(9));
        assert_eq!(gc.flags(), 0b0000_1001);
        assert_eq!(gc.transparent_color(), Some(9));
        gc.set_disposal_method(DisposalMethod::Keep);
        assert_eq!(gc.disposal_method(), DisposalMethod::Keep);
        gc.set_transparent_color(None);
        assert_eq!(gc.flags(), 0b0000_0100);
        assert_eq!(gc.transparent_color_idx(), 0);
    }
}
