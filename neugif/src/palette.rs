// palette.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Color palettes and nearest-color lookup

/// Number of entries in every serialized palette
pub const PALETTE_LEN: usize = 256;

/// Palette of exactly 256 RGB entries (768 bytes)
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    /// Packed RGB triples
    colors: [u8; PALETTE_LEN * 3],
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("Palette")
            .field("first", &self.entry(0))
            .field("last", &self.entry(u8::MAX))
            .finish()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colors: [0; PALETTE_LEN * 3],
        }
    }
}

impl Palette {
    /// Create a palette from packed RGB bytes.
    ///
    /// Tables shorter than 768 bytes are padded with black; longer tables
    /// are truncated.  A trailing partial triple is ignored.
    pub fn from_rgb_bytes(rgb: &[u8]) -> Self {
        let mut palette = Palette::default();
        let len = (rgb.len() / 3 * 3).min(palette.colors.len());
        if rgb.len() > palette.colors.len() {
            warn!("Palette truncated: {} entries", rgb.len() / 3);
        } else if len < palette.colors.len() {
            debug!("Palette padded: {} entries", len / 3);
        }
        palette.colors[..len].copy_from_slice(&rgb[..len]);
        palette
    }

    /// Get packed RGB bytes (always 768)
    pub fn as_bytes(&self) -> &[u8] {
        &self.colors
    }

    /// Get one entry
    pub fn entry(&self, idx: u8) -> [u8; 3] {
        let i = usize::from(idx) * 3;
        [self.colors[i], self.colors[i + 1], self.colors[i + 2]]
    }

    /// Set one entry
    pub fn set_entry(&mut self, idx: u8, rgb: [u8; 3]) {
        let i = usize::from(idx) * 3;
        self.colors[i..i + 3].copy_from_slice(&rgb);
    }
}

/// Nearest-color oracle for a palette
pub trait ColorMap {
    /// Find index of the palette entry nearest to a color
    fn nearest(&self, rgb: [u8; 3]) -> u8;
}

/// Linear search of a palette (squared Euclidean distance)
#[derive(Debug)]
pub struct PaletteMap<'a> {
    palette: &'a Palette,
}

impl<'a> PaletteMap<'a> {
    /// Create a linear search map
    pub fn new(palette: &'a Palette) -> Self {
        PaletteMap { palette }
    }
}

impl ColorMap for PaletteMap<'_> {
    fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let mut best = 0;
        let mut best_dist = i32::MAX;
        for (i, c) in self.palette.colors.chunks_exact(3).enumerate() {
            let dr = i32::from(rgb[0]) - i32::from(c[0]);
            let dg = i32::from(rgb[1]) - i32::from(c[1]);
            let db = i32::from(rgb[2]) - i32::from(c[2]);
            let dist = dr * dr + dg * dg + db * db;
            if dist < best_dist {
                best_dist = dist;
                best = i;
            }
        }
        best as u8
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pad_and_truncate() {
        let p = Palette::from_rgb_bytes(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(p.as_bytes().len(), 768);
        assert_eq!(p.entry(0), [1, 2, 3]);
        assert_eq!(p.entry(1), [4, 5, 6]);
        assert_eq!(p.entry(2), [0, 0, 0]);
        let long: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
        let p = Palette::from_rgb_bytes(&long);
        assert_eq!(p.as_bytes(), &long[..768]);
    }

    #[test]
    fn linear_nearest() {
        let mut p = Palette::from_rgb_bytes(&[255; 768]);
        p.set_entry(3, [255, 0, 0]);
        p.set_entry(7, [0, 0, 250]);
        let map = PaletteMap::new(&p);
        assert_eq!(map.nearest([250, 10, 10]), 3);
        assert_eq!(map.nearest([0, 0, 255]), 7);
        // ties go to the first entry
        assert_eq!(map.nearest([255, 255, 255]), 0);
    }
}
