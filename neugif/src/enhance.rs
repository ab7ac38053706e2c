// enhance.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Color enhancement applied before quantization

/// Minimum boost factor (identity)
const MIN_BOOST: f64 = 1.0;

/// Maximum boost factor
const MAX_BOOST: f64 = 2.0;

/// Contrast and saturation boost
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorEnhancement {
    saturation: f64,
    contrast: f64,
}

impl Default for ColorEnhancement {
    fn default() -> Self {
        ColorEnhancement {
            saturation: MIN_BOOST,
            contrast: MIN_BOOST,
        }
    }
}

/// Clamp a boost factor (NaN becomes identity)
fn clamp_boost(v: f64) -> f64 {
    if v.is_nan() {
        MIN_BOOST
    } else {
        v.clamp(MIN_BOOST, MAX_BOOST)
    }
}

/// Clamp and truncate a channel value
fn clamp_channel(v: f64) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

impl ColorEnhancement {
    /// Create a color enhancement (factors are clamped to 1.0 - 2.0)
    pub fn new(saturation: f64, contrast: f64) -> Self {
        ColorEnhancement {
            saturation: clamp_boost(saturation),
            contrast: clamp_boost(contrast),
        }
    }

    /// Get saturation factor
    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    /// Get contrast factor
    pub fn contrast(&self) -> f64 {
        self.contrast
    }

    /// Check whether this leaves pixels untouched
    pub fn is_identity(&self) -> bool {
        self.saturation == MIN_BOOST && self.contrast == MIN_BOOST
    }

    /// Enhance packed RGB pixels in place
    pub fn apply(&self, pixels: &mut [u8]) {
        if self.is_identity() {
            return;
        }
        for px in pixels.chunks_exact_mut(3) {
            let mut rgb = [px[0], px[1], px[2]];
            if self.contrast != MIN_BOOST {
                for c in rgb.iter_mut() {
                    let v = (f64::from(*c) - 128.0) * self.contrast + 128.0;
                    *c = clamp_channel(v);
                }
            }
            if self.saturation != MIN_BOOST {
                let (h, s, l) = rgb_to_hsl(rgb);
                let s = (s * self.saturation).min(1.0);
                rgb = hsl_to_rgb(h, s, l);
            }
            px.copy_from_slice(&rgb);
        }
    }
}

/// Convert RGB to hue, saturation, lightness (all 0 - 1)
fn rgb_to_hsl(rgb: [u8; 3]) -> (f64, f64, f64) {
    let [r, g, b] = rgb.map(|c| f64::from(c) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

/// Convert one hue sector to a channel
fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Convert hue, saturation, lightness to RGB
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    if s == 0.0 {
        let v = clamp_channel((l * 255.0).round());
        return [v, v, v];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
    .map(|c| clamp_channel((c * 255.0).round()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clamped() {
        let e = ColorEnhancement::new(0.5, 3.0);
        assert_eq!(e.saturation(), 1.0);
        assert_eq!(e.contrast(), 2.0);
        assert!(ColorEnhancement::new(f64::NAN, 1.0).is_identity());
        assert!(ColorEnhancement::default().is_identity());
    }

    #[test]
    fn identity() {
        let mut px = vec![1, 2, 3, 200, 100, 50, 255, 255, 255];
        ColorEnhancement::new(1.0, 1.0).apply(&mut px);
        assert_eq!(px, [1, 2, 3, 200, 100, 50, 255, 255, 255]);
    }

    #[test]
    fn contrast() {
        let mut px = vec![100, 128, 200];
        ColorEnhancement::new(1.0, 2.0).apply(&mut px);
        assert_eq!(px, [72, 128, 255]);
    }

    #[test]
    fn saturation() {
        // gray has no saturation to boost
        let mut px = vec![90, 90, 90];
        ColorEnhancement::new(2.0, 1.0).apply(&mut px);
        assert_eq!(px, [90, 90, 90]);
        let mut px = vec![150, 100, 100];
        ColorEnhancement::new(2.0, 1.0).apply(&mut px);
        assert!(px[0] > 150 && px[1] < 100 && px[2] < 100, "{:?}", px);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn hsl_round_trip() {
        for rgb in [[255, 0, 0], [0, 255, 0], [12, 34, 56], [250, 200, 10]] {
            let (h, s, l) = rgb_to_hsl(rgb);
            assert_eq!(hsl_to_rgb(h, s, l), rgb);
        }
    }
}
