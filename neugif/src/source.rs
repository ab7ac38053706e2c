// source.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Pixel sources for frames
use pix::Raster;
use pix::rgb::{Rgb, SRgb8, SRgba8};

/// Channel value for pixels outside of a source
pub const SENTINEL: u8 = 0xFF;

/// Source of RGB pixels for one frame
pub trait PixelSource {
    /// Get the source width
    fn width(&self) -> u32;

    /// Get the source height
    fn height(&self) -> u32;

    /// Get RGB for one pixel (must be within the source bounds)
    fn rgb(&self, x: u32, y: u32) -> [u8; 3];
}

impl PixelSource for Raster<SRgb8> {
    fn width(&self) -> u32 {
        Raster::width(self)
    }
    fn height(&self) -> u32 {
        Raster::height(self)
    }
    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let p = self.pixel(x as i32, y as i32);
        [
            u8::from(Rgb::red(p)),
            u8::from(Rgb::green(p)),
            u8::from(Rgb::blue(p)),
        ]
    }
}

impl PixelSource for Raster<SRgba8> {
    fn width(&self) -> u32 {
        Raster::width(self)
    }
    fn height(&self) -> u32 {
        Raster::height(self)
    }
    /// Alpha is ignored
    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let p = self.pixel(x as i32, y as i32);
        [
            u8::from(Rgb::red(p)),
            u8::from(Rgb::green(p)),
            u8::from(Rgb::blue(p)),
        ]
    }
}

impl<S: PixelSource + ?Sized> PixelSource for &S {
    fn width(&self) -> u32 {
        (**self).width()
    }
    fn height(&self) -> u32 {
        (**self).height()
    }
    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        (**self).rgb(x, y)
    }
}

/// Frame of packed RGB bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbFrame {
    /// Create a frame from packed RGB bytes.
    ///
    /// Short buffers are padded with the sentinel; extra bytes are dropped.
    pub fn new(width: u32, height: u32, mut pixels: Vec<u8>) -> Self {
        let len = width as usize * height as usize * 3;
        if pixels.len() != len {
            warn!(
                "RgbFrame {}x{}: {} bytes, expected {}",
                width,
                height,
                pixels.len(),
                len
            );
        }
        pixels.resize(len, SENTINEL);
        RgbFrame {
            width,
            height,
            pixels,
        }
    }

    /// Create a frame filled with one color
    pub fn with_color(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb.repeat(width as usize * height as usize);
        RgbFrame {
            width,
            height,
            pixels,
        }
    }

    /// Set one pixel (ignored when out of bounds)
    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            let i = (y as usize * self.width as usize + x as usize) * 3;
            self.pixels[i..i + 3].copy_from_slice(&rgb);
        }
    }

    /// Get packed RGB bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

impl PixelSource for RgbFrame {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }
}

/// Extract packed RGB bytes for a canvas.
///
/// Canvas pixels outside of the source are filled with [SENTINEL]; source
/// pixels outside of the canvas are ignored.
pub fn extract<S: PixelSource + ?Sized>(
    source: &S,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let (sw, sh) = (source.width(), source.height());
    if sw < width || sh < height {
        warn!(
            "Source {}x{} smaller than canvas {}x{}, filling",
            sw, sh, width, height
        );
    }
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            if x < sw && y < sh {
                pixels.extend_from_slice(&source.rgb(x, y));
            } else {
                pixels.extend_from_slice(&[SENTINEL; 3]);
            }
        }
    }
    pixels
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rgb_frame() {
        let mut f = RgbFrame::with_color(3, 2, [1, 2, 3]);
        f.set_rgb(2, 1, [9, 8, 7]);
        f.set_rgb(3, 1, [0, 0, 0]);
        assert_eq!(f.rgb(0, 0), [1, 2, 3]);
        assert_eq!(f.rgb(2, 1), [9, 8, 7]);
        let f = RgbFrame::new(2, 1, vec![1, 2, 3, 4]);
        assert_eq!(f.as_bytes(), [1, 2, 3, 4, 0xFF, 0xFF]);
    }

    #[test]
    fn sentinel_by_coordinate() {
        let f = RgbFrame::with_color(2, 2, [10, 20, 30]);
        let px = extract(&f, 3, 3);
        assert_eq!(px.len(), 27);
        let at = |x: usize, y: usize| {
            let i = (y * 3 + x) * 3;
            [px[i], px[i + 1], px[i + 2]]
        };
        assert_eq!(at(0, 0), [10, 20, 30]);
        assert_eq!(at(1, 1), [10, 20, 30]);
        assert_eq!(at(2, 0), [0xFF; 3]);
        assert_eq!(at(0, 2), [0xFF; 3]);
        assert_eq!(at(2, 2), [0xFF; 3]);
    }

    #[test]
    fn crop_larger_source() {
        let mut f = RgbFrame::with_color(4, 4, [0, 0, 0]);
        f.set_rgb(1, 1, [5, 5, 5]);
        f.set_rgb(3, 3, [6, 6, 6]);
        let px = extract(&f, 2, 2);
        assert_eq!(px, [0, 0, 0, 0, 0, 0, 0, 0, 0, 5, 5, 5]);
    }

    #[test]
    fn raster_source() {
        let mut r = Raster::<SRgb8>::with_clear(2, 2);
        *r.pixel_mut(1, 0) = SRgb8::new(200, 100, 50);
        assert_eq!(PixelSource::width(&r), 2);
        assert_eq!(r.rgb(1, 0), [200, 100, 50]);
        assert_eq!(r.rgb(0, 1), [0, 0, 0]);
        let mut r = Raster::<SRgba8>::with_clear(1, 1);
        *r.pixel_mut(0, 0) = SRgba8::new(1, 2, 3, 4);
        assert_eq!(r.rgb(0, 0), [1, 2, 3]);
    }
}
