// dither.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Error diffusion dithering
use crate::error::{Error, Result};
use crate::palette::{ColorMap, Palette, PALETTE_LEN};

/// Error diffusion kernel
///
/// Each tap is `(dx, dy, weight)`; a neighbor receives
/// `error * weight / divisor`.  Taps only reach pixels later in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    /// (dx, dy, weight) taps
    pub taps: &'static [(i32, i32, i32)],
    /// Divisor for weights
    pub divisor: i32,
}

/// False Floyd-Steinberg kernel
///
/// ```text
///    X   3
///    3   2
/// ```
pub const FALSE_FLOYD_STEINBERG: Kernel = Kernel {
    taps: &[(1, 0, 3), (0, 1, 3), (1, 1, 2)],
    divisor: 8,
};

/// Floyd-Steinberg kernel
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    taps: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
};

/// Stucki kernel
///
/// ```text
///            X   8   4
///    2   4   8   4   2
///    1   2   4   2   1
/// ```
pub const STUCKI: Kernel = Kernel {
    taps: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
        (-2, 2, 1),
        (-1, 2, 2),
        (0, 2, 4),
        (1, 2, 2),
        (2, 2, 1),
    ],
    divisor: 42,
};

/// Atkinson kernel (propagates 3/4 of the error)
///
/// ```text
///        X   1   1
///    1   1   1
///        1
/// ```
pub const ATKINSON: Kernel = Kernel {
    taps: &[(1, 0, 1), (2, 0, 1), (-1, 1, 1), (0, 1, 1), (1, 1, 1), (0, 2, 1)],
    divisor: 8,
};

/// Dithering method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DitherMethod {
    /// Nearest color, no error diffusion
    #[default]
    None,
    /// Floyd-Steinberg
    FloydSteinberg,
    /// False Floyd-Steinberg
    FalseFloydSteinberg,
    /// Stucki
    Stucki,
    /// Atkinson
    Atkinson,
}

impl DitherMethod {
    /// Get the diffusion kernel
    pub fn kernel(self) -> Option<&'static Kernel> {
        match self {
            DitherMethod::None => None,
            DitherMethod::FloydSteinberg => Some(&FLOYD_STEINBERG),
            DitherMethod::FalseFloydSteinberg => Some(&FALSE_FLOYD_STEINBERG),
            DitherMethod::Stucki => Some(&STUCKI),
            DitherMethod::Atkinson => Some(&ATKINSON),
        }
    }
}

impl From<&str> for DitherMethod {
    /// Parse a method name; unknown names are `None`
    fn from(name: &str) -> Self {
        match name {
            "FloydSteinberg" => DitherMethod::FloydSteinberg,
            "FalseFloydSteinberg" => DitherMethod::FalseFloydSteinberg,
            "Stucki" => DitherMethod::Stucki,
            "Atkinson" => DitherMethod::Atkinson,
            _ => DitherMethod::None,
        }
    }
}

/// Dithering configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dither {
    /// Diffusion method
    pub method: DitherMethod,
    /// Reverse scan direction on alternate rows
    pub serpentine: bool,
}

impl From<DitherMethod> for Dither {
    fn from(method: DitherMethod) -> Self {
        Dither {
            method,
            serpentine: false,
        }
    }
}

impl From<bool> for Dither {
    /// `true` selects Floyd-Steinberg
    fn from(enable: bool) -> Self {
        if enable {
            DitherMethod::FloydSteinberg.into()
        } else {
            DitherMethod::None.into()
        }
    }
}

impl From<&str> for Dither {
    /// Parse a method name with optional `-serpentine` suffix
    fn from(name: &str) -> Self {
        match name.strip_suffix("-serpentine") {
            Some(method) if !method.is_empty() => Dither {
                method: method.into(),
                serpentine: true,
            },
            _ => DitherMethod::from(name).into(),
        }
    }
}

/// Frame of palette indices
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedFrame {
    /// One index per pixel, row-major
    indices: Vec<u8>,
    /// Palette entries referenced by any pixel
    used: [bool; PALETTE_LEN],
}

impl IndexedFrame {
    /// Create an indexed frame
    pub fn new(indices: Vec<u8>) -> Self {
        let mut used = [false; PALETTE_LEN];
        for idx in &indices {
            used[usize::from(*idx)] = true;
        }
        IndexedFrame { indices, used }
    }

    /// Get the indices
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Check whether a palette entry is used
    pub fn is_used(&self, idx: u8) -> bool {
        self.used[usize::from(idx)]
    }

    /// Count used palette entries
    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|u| **u).count()
    }

    /// Convert into indices
    pub fn into_indices(self) -> Vec<u8> {
        self.indices
    }
}

/// Map packed RGB pixels to nearest palette indices
pub fn index_pixels<M: ColorMap + ?Sized>(pixels: &[u8], map: &M) -> IndexedFrame {
    let indices = pixels
        .chunks_exact(3)
        .map(|c| map.nearest([c[0], c[1], c[2]]))
        .collect();
    IndexedFrame::new(indices)
}

/// Clamp a channel value to 0-255
fn clamp(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

impl Dither {
    /// Map packed RGB pixels to palette indices, diffusing error.
    ///
    /// Error is accumulated into `pixels` in place.  Without a kernel this is
    /// the same as [index_pixels].
    ///
    /// `pixels` must hold exactly `width * height` RGB triples.
    pub fn apply<M: ColorMap + ?Sized>(
        &self,
        pixels: &mut [u8],
        width: usize,
        height: usize,
        palette: &Palette,
        map: &M,
    ) -> Result<IndexedFrame> {
        let len = width.checked_mul(height).and_then(|n| n.checked_mul(3));
        if len != Some(pixels.len()) {
            return Err(Error::InvalidFrameDimensions);
        }
        let kernel = match self.method.kernel() {
            Some(kernel) => kernel,
            None => return Ok(index_pixels(pixels, map)),
        };
        let mut indices = vec![0; width * height];
        for y in 0..height {
            let reverse = self.serpentine && y % 2 == 1;
            for i in 0..width {
                let x = if reverse { width - 1 - i } else { i };
                let pos = y * width + x;
                let p = pos * 3;
                let rgb = [pixels[p], pixels[p + 1], pixels[p + 2]];
                let idx = map.nearest(rgb);
                indices[pos] = idx;
                let q = palette.entry(idx);
                let err = [
                    i32::from(rgb[0]) - i32::from(q[0]),
                    i32::from(rgb[1]) - i32::from(q[1]),
                    i32::from(rgb[2]) - i32::from(q[2]),
                ];
                for (dx, dy, weight) in kernel.taps {
                    let dx = if reverse { -dx } else { *dx };
                    let nx = x as i32 + dx;
                    let ny = y + *dy as usize;
                    if nx < 0 || nx >= width as i32 || ny >= height {
                        continue;
                    }
                    let n = (ny * width + nx as usize) * 3;
                    for c in 0..3 {
                        let v = i32::from(pixels[n + c])
                            + err[c] * weight / kernel.divisor;
                        pixels[n + c] = clamp(v);
                    }
                }
            }
        }
        Ok(IndexedFrame::new(indices))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::palette::PaletteMap;

    fn black_white() -> Palette {
        let mut palette = Palette::default();
        palette.set_entry(1, [255, 255, 255]);
        palette
    }

    #[test]
    fn kernel_weights() {
        let sum = |k: &Kernel| k.taps.iter().map(|t| t.2).sum::<i32>();
        assert_eq!(sum(&FALSE_FLOYD_STEINBERG), 8);
        assert_eq!(sum(&FLOYD_STEINBERG), 16);
        assert_eq!(sum(&STUCKI), 42);
        assert_eq!(sum(&ATKINSON), 6);
        for k in [FALSE_FLOYD_STEINBERG, FLOYD_STEINBERG, STUCKI, ATKINSON] {
            // only forward taps
            assert!(k.taps.iter().all(|(dx, dy, _)| *dy > 0 || *dx > 0));
        }
    }

    #[test]
    fn parse() {
        assert_eq!(Dither::from("none"), Dither::default());
        assert_eq!(Dither::from(""), Dither::default());
        assert_eq!(Dither::from("Bayer"), Dither::default());
        assert_eq!(
            Dither::from("Stucki"),
            Dither {
                method: DitherMethod::Stucki,
                serpentine: false
            }
        );
        assert_eq!(
            Dither::from("FloydSteinberg-serpentine"),
            Dither {
                method: DitherMethod::FloydSteinberg,
                serpentine: true
            }
        );
        assert_eq!(Dither::from("-serpentine"), Dither::default());
        assert_eq!(Dither::from(true).method, DitherMethod::FloydSteinberg);
        assert_eq!(Dither::from(false), Dither::default());
    }

    #[test]
    fn flat_frame() {
        let mut palette = black_white();
        palette.set_entry(2, [200, 30, 30]);
        let map = PaletteMap::new(&palette);
        let methods = [
            DitherMethod::None,
            DitherMethod::FloydSteinberg,
            DitherMethod::FalseFloydSteinberg,
            DitherMethod::Stucki,
            DitherMethod::Atkinson,
        ];
        for method in methods {
            for serpentine in [false, true] {
                let mut pixels = [200, 30, 30].repeat(7 * 5);
                let dither = Dither { method, serpentine };
                let frame =
                    dither.apply(&mut pixels, 7, 5, &palette, &map).unwrap();
                assert_eq!(frame.indices().len(), 35);
                assert!(frame.indices().iter().all(|i| *i == 2));
                assert_eq!(frame.used_count(), 1);
                assert!(frame.is_used(2));
            }
        }
    }

    #[test]
    fn gray_diffused() {
        let palette = black_white();
        let map = PaletteMap::new(&palette);
        let mut pixels = [128; 8 * 8 * 3].to_vec();
        let dither = Dither::from(DitherMethod::FloydSteinberg);
        let frame = dither.apply(&mut pixels, 8, 8, &palette, &map).unwrap();
        let white = frame.indices().iter().filter(|i| **i == 1).count();
        assert!((20..=44).contains(&white), "white: {}", white);
        assert!(frame.is_used(0) && frame.is_used(1));
        // without dithering, everything maps to white
        let pixels = [128; 8 * 8 * 3];
        let frame = index_pixels(&pixels[..], &map);
        assert!(frame.indices().iter().all(|i| *i == 1));
    }

    #[test]
    fn serpentine_mirrors_taps() {
        let palette = black_white();
        let map = PaletteMap::new(&palette);
        // second row runs right to left; its error must flow leftward
        let mut pixels = vec![0; 3 * 2 * 3];
        pixels[5 * 3..].copy_from_slice(&[100, 100, 100]);
        let dither = Dither {
            method: DitherMethod::FalseFloydSteinberg,
            serpentine: true,
        };
        dither.apply(&mut pixels, 3, 2, &palette, &map).unwrap();
        // (2,1) quantized to black; 3/8 of error reaches (1,1)
        assert_eq!(pixels[4 * 3], 37);
    }

    #[test]
    fn short_buffer() {
        let palette = black_white();
        let map = PaletteMap::new(&palette);
        for method in [DitherMethod::None, DitherMethod::Stucki] {
            let dither = Dither::from(method);
            let mut pixels = vec![0; 4 * 4 * 3 - 1];
            assert!(matches!(
                dither.apply(&mut pixels, 4, 4, &palette, &map),
                Err(Error::InvalidFrameDimensions)
            ));
            let mut pixels = vec![0; 4 * 4 * 3 + 3];
            assert!(dither.apply(&mut pixels, 4, 4, &palette, &map).is_err());
        }
    }
}
