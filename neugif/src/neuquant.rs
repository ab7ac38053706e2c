// neuquant.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Neural-net color quantization
//!
//! Based on the NeuQuant algorithm by Anthony Dekker (1994): "Kohonen neural
//! networks for optimal colour quantization", Network: Computation in Neural
//! Systems Vol. 5 pp 351-367.
use crate::palette::{ColorMap, Palette, PALETTE_LEN};

/// Number of neurons (palette colors)
const NET_SIZE: usize = PALETTE_LEN;

/// Highest neuron position
const MAX_NET_POS: usize = NET_SIZE - 1;

/// Number of learning cycles
const CYCLES: usize = 100;

/// Bias for color values
const NET_BIAS_SHIFT: i32 = 4;

/// Bias for fractions
const INT_BIAS_SHIFT: i32 = 16;
const INT_BIAS: i32 = 1 << INT_BIAS_SHIFT;

/// Frequency / bias learning rates (beta = 1/1024)
const GAMMA_SHIFT: i32 = 10;
const BETA_SHIFT: i32 = 10;
const BETA: i32 = INT_BIAS >> BETA_SHIFT;
const BETA_GAMMA: i32 = INT_BIAS << (GAMMA_SHIFT - BETA_SHIFT);

/// Initial neighborhood radius (32, biased by 6 bits)
const INIT_RAD: usize = NET_SIZE >> 3;
const RADIUS_BIAS_SHIFT: i32 = 6;
const RADIUS_BIAS: i32 = 1 << RADIUS_BIAS_SHIFT;
const INIT_RADIUS: i32 = INIT_RAD as i32 * RADIUS_BIAS;

/// Radius decreases by 1/30 each cycle
const RADIUS_DEC: i32 = 30;

/// Learning rate starts at 1.0 (biased by 10 bits)
const ALPHA_BIAS_SHIFT: i32 = 10;
const INIT_ALPHA: i32 = 1 << ALPHA_BIAS_SHIFT;

/// Neighborhood falloff bias
const RAD_BIAS_SHIFT: i32 = 8;
const RAD_BIAS: i32 = 1 << RAD_BIAS_SHIFT;
const ALPHA_RAD_BIAS: i32 = 1 << (ALPHA_BIAS_SHIFT + RAD_BIAS_SHIFT);

/// Sampling primes, in order of preference.  The stride is the first one
/// which does not divide the image length; images too small for the last
/// prime are sampled sequentially.
const PRIMES: [usize; 4] = [499, 491, 487, 503];

/// Smallest image (in bytes) sampled with a prime stride
const MIN_PICTURE_BYTES: usize = 3 * PRIMES[3];

/// One neuron of the network
#[derive(Clone, Copy, Debug, Default)]
struct Neuron {
    /// Color channels (biased during learning)
    chan: [i32; 3],
    /// Palette index (stamped after learning)
    index: u8,
}

impl Neuron {
    /// Create a neuron on the gray diagonal
    fn gray(i: usize) -> Self {
        let v = ((i << (NET_BIAS_SHIFT + 8)) / NET_SIZE) as i32;
        Neuron {
            chan: [v; 3],
            index: 0,
        }
    }

    /// Manhattan distance to a color
    fn distance(&self, c: [i32; 3]) -> i32 {
        (self.chan[0] - c[0]).abs()
            + (self.chan[1] - c[1]).abs()
            + (self.chan[2] - c[2]).abs()
    }

    /// Move toward a color by `alpha / bias`
    fn alter(&mut self, alpha: i32, bias: i32, c: [i32; 3]) {
        for (n, c) in self.chan.iter_mut().zip(c) {
            *n -= (alpha * (*n - c)) / bias;
        }
    }
}

/// Network in training
///
/// Scoped to one palette build; consumed by [NeuQuant::new].
struct Learner {
    /// The neurons
    net: [Neuron; NET_SIZE],
    /// Bias array for learning
    bias: [i32; NET_SIZE],
    /// Frequency array for learning
    freq: [i32; NET_SIZE],
    /// Neighborhood falloff table
    rad_power: [i32; INIT_RAD],
}

impl Learner {
    /// Create a network with neurons along the gray diagonal
    fn new() -> Self {
        let mut net = [Neuron::default(); NET_SIZE];
        for (i, n) in net.iter_mut().enumerate() {
            *n = Neuron::gray(i);
        }
        Learner {
            net,
            bias: [0; NET_SIZE],
            freq: [INT_BIAS / NET_SIZE as i32; NET_SIZE],
            rad_power: [0; INIT_RAD],
        }
    }

    /// Recompute neighborhood falloff for a learning rate and radius
    fn update_rad_power(&mut self, alpha: i32, rad: usize) {
        let rad = rad as i32;
        let rad_sq = rad * rad;
        for (j, p) in self.rad_power.iter_mut().take(rad as usize).enumerate()
        {
            let j = j as i32;
            *p = alpha * (((rad_sq - j * j) * RAD_BIAS) / rad_sq);
        }
    }

    /// Find the closest neuron, updating frequencies and biases.
    ///
    /// Returns the position of the best neuron after bias adjustment.
    fn contest(&mut self, c: [i32; 3]) -> usize {
        let mut best_d = i32::MAX;
        let mut best_bias_d = i32::MAX;
        let mut best_pos = 0;
        let mut best_bias_pos = 0;
        for i in 0..NET_SIZE {
            let dist = self.net[i].distance(c);
            if dist < best_d {
                best_d = dist;
                best_pos = i;
            }
            let bias_dist =
                dist - (self.bias[i] >> (INT_BIAS_SHIFT - NET_BIAS_SHIFT));
            if bias_dist < best_bias_d {
                best_bias_d = bias_dist;
                best_bias_pos = i;
            }
            let beta_freq = self.freq[i] >> BETA_SHIFT;
            self.freq[i] -= beta_freq;
            self.bias[i] += beta_freq << GAMMA_SHIFT;
        }
        self.freq[best_pos] += BETA;
        self.bias[best_pos] -= BETA_GAMMA;
        best_bias_pos
    }

    /// Move neurons within a radius of position `i` toward a color
    fn alter_neighbors(&mut self, rad: usize, i: usize, c: [i32; 3]) {
        let rad = rad as i32;
        let i = i as i32;
        let lo = (i - rad).abs();
        let hi = (i + rad).min(NET_SIZE as i32);
        let mut j = i + 1;
        let mut k = i - 1;
        let mut m = 1;
        while j < hi || k > lo {
            let a = self.rad_power[m];
            m += 1;
            if j < hi {
                self.net[j as usize].alter(a, ALPHA_RAD_BIAS, c);
                j += 1;
            }
            if k > lo {
                self.net[k as usize].alter(a, ALPHA_RAD_BIAS, c);
                k -= 1;
            }
        }
    }

    /// Train the network on packed RGB pixels
    fn learn(&mut self, pixels: &[u8], sample_factor: usize) {
        let length = pixels.len();
        let alpha_dec =
            i32::try_from(30 + (sample_factor - 1) / 3).unwrap_or(i32::MAX);
        let sample_pixels = length / (3 * sample_factor);
        let delta = (sample_pixels / CYCLES).max(1);
        let mut alpha = INIT_ALPHA;
        let mut radius = INIT_RADIUS;
        let mut rad = effective_radius(radius);
        self.update_rad_power(alpha, rad);
        let step = sample_step(length);
        debug!(
            "learning: {} samples, factor {}, step {}",
            sample_pixels, sample_factor, step
        );
        let mut pix = 0;
        for i in 1..=sample_pixels {
            let c = [
                i32::from(pixels[pix]) << NET_BIAS_SHIFT,
                i32::from(pixels[pix + 1]) << NET_BIAS_SHIFT,
                i32::from(pixels[pix + 2]) << NET_BIAS_SHIFT,
            ];
            let j = self.contest(c);
            self.net[j].alter(alpha, INIT_ALPHA, c);
            if rad != 0 {
                self.alter_neighbors(rad, j, c);
            }
            pix += step;
            if pix >= length {
                pix -= length;
            }
            if i % delta == 0 {
                alpha -= alpha / alpha_dec;
                radius -= radius / RADIUS_DEC;
                rad = effective_radius(radius);
                self.update_rad_power(alpha, rad);
            }
        }
    }

    /// Restore 0-255 channel values and stamp palette indices
    fn unbias(&mut self) {
        for (i, n) in self.net.iter_mut().enumerate() {
            for c in n.chan.iter_mut() {
                *c >>= NET_BIAS_SHIFT;
            }
            n.index = i as u8;
        }
    }
}

/// Get radius from biased radius (disabled at 1 or less)
fn effective_radius(radius: i32) -> usize {
    let rad = radius >> RADIUS_BIAS_SHIFT;
    if rad <= 1 {
        0
    } else {
        rad as usize
    }
}

/// Get sampling step (in bytes) for an image length
fn sample_step(length: usize) -> usize {
    if length < MIN_PICTURE_BYTES {
        return 3;
    }
    let prime = PRIMES
        .iter()
        .take(3)
        .find(|p| length % **p != 0)
        .unwrap_or(&PRIMES[3]);
    3 * prime
}

/// Trained color quantizer
///
/// Neurons are sorted by green channel, with an index of starting positions
/// for each green value.  Lookups search outward from there, stopping in
/// each direction when the green distance alone can no longer improve on
/// the best match.
#[derive(Clone)]
pub struct NeuQuant {
    /// Neurons, sorted by green channel
    net: [Neuron; NET_SIZE],
    /// Search start position for each green value
    net_index: [usize; 256],
}

impl std::fmt::Debug for NeuQuant {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("NeuQuant").finish_non_exhaustive()
    }
}

impl NeuQuant {
    /// Build a quantizer from packed RGB pixels.
    ///
    /// * `pixels` RGB triples; a trailing partial triple is ignored.
    /// * `sample_factor` 1 (slowest, best) to 30; values below 1 are
    ///   raised to 1.
    pub fn new(pixels: &[u8], sample_factor: u32) -> Self {
        let sample_factor = sample_factor.max(1) as usize;
        let pixels = &pixels[..pixels.len() / 3 * 3];
        let mut learner = Learner::new();
        learner.learn(pixels, sample_factor);
        learner.unbias();
        let mut nq = NeuQuant {
            net: learner.net,
            net_index: [0; 256],
        };
        nq.build_index();
        nq
    }

    /// Sort neurons by green and build the search index
    fn build_index(&mut self) {
        let mut previous = 0;
        let mut start_pos = 0;
        for i in 0..NET_SIZE {
            // selection sort keeps tie ordering stable between builds
            let mut small_pos = i;
            let mut small_val = self.net[i].chan[1];
            for j in i + 1..NET_SIZE {
                if self.net[j].chan[1] < small_val {
                    small_pos = j;
                    small_val = self.net[j].chan[1];
                }
            }
            self.net.swap(i, small_pos);
            let small_val = small_val as usize;
            if small_val != previous {
                self.net_index[previous] = (start_pos + i) >> 1;
                for idx in &mut self.net_index[previous + 1..small_val] {
                    *idx = i;
                }
                previous = small_val;
                start_pos = i;
            }
        }
        self.net_index[previous] = (start_pos + MAX_NET_POS) >> 1;
        for idx in &mut self.net_index[previous + 1..] {
            *idx = MAX_NET_POS;
        }
    }

    /// Get the palette, in palette index order
    pub fn palette(&self) -> Palette {
        let mut palette = Palette::default();
        for n in self.net.iter() {
            let [r, g, b] = n.chan;
            palette.set_entry(n.index, [r as u8, g as u8, b as u8]);
        }
        palette
    }

    /// Search for the nearest neuron to a color
    fn search(&self, rgb: [u8; 3]) -> u8 {
        let [r, g, b] = rgb.map(i32::from);
        // biggest possible distance is 256 * 3
        let mut best_d = 1000;
        let mut best = 0;
        let mut i = self.net_index[usize::from(rgb[1])];
        let mut j = i as isize - 1;
        while i < NET_SIZE || j >= 0 {
            if i < NET_SIZE {
                let n = &self.net[i];
                let mut dist = n.chan[1] - g;
                if dist >= best_d {
                    i = NET_SIZE;
                } else {
                    i += 1;
                    dist = dist.abs() + (n.chan[0] - r).abs();
                    if dist < best_d {
                        dist += (n.chan[2] - b).abs();
                        if dist < best_d {
                            best_d = dist;
                            best = n.index;
                        }
                    }
                }
            }
            if j >= 0 {
                let n = &self.net[j as usize];
                let mut dist = g - n.chan[1];
                if dist >= best_d {
                    j = -1;
                } else {
                    j -= 1;
                    dist = dist.abs() + (n.chan[0] - r).abs();
                    if dist < best_d {
                        dist += (n.chan[2] - b).abs();
                        if dist < best_d {
                            best_d = dist;
                            best = n.index;
                        }
                    }
                }
            }
        }
        best
    }
}

impl ColorMap for NeuQuant {
    fn nearest(&self, rgb: [u8; 3]) -> u8 {
        self.search(rgb)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gradient(width: usize, height: usize) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 255 / width) as u8);
                pixels.push((y * 255 / height) as u8);
                pixels.push(128);
            }
        }
        pixels
    }

    fn manhattan(a: [u8; 3], b: [u8; 3]) -> i32 {
        a.iter()
            .zip(b.iter())
            .map(|(a, b)| (i32::from(*a) - i32::from(*b)).abs())
            .sum()
    }

    #[test]
    fn stride() {
        assert_eq!(sample_step(300), 3);
        assert_eq!(sample_step(3 * 503 - 1), 3);
        assert_eq!(sample_step(30_000), 3 * 499);
        assert_eq!(sample_step(499 * 6), 3 * 491);
        assert_eq!(sample_step(499 * 491 * 3), 3 * 487);
        assert_eq!(sample_step(499 * 491 * 487 * 3), 3 * 503);
    }

    #[test]
    fn radius() {
        assert_eq!(effective_radius(INIT_RADIUS), 32);
        assert_eq!(effective_radius(2 * RADIUS_BIAS - 1), 0);
        assert_eq!(effective_radius(2 * RADIUS_BIAS), 2);
    }

    #[test]
    fn untrained_gray() {
        let nq = NeuQuant::new(&[], 10);
        let palette = nq.palette();
        assert_eq!(palette.entry(0), [0, 0, 0]);
        assert_eq!(palette.entry(128), [128, 128, 128]);
        assert_eq!(palette.entry(255), [255, 255, 255]);
        assert_eq!(nq.nearest([129, 129, 129]), 129);
    }

    #[test]
    fn small_image() {
        let pixels: Vec<u8> = (0..300).map(|i| (i % 256) as u8).collect();
        let nq = NeuQuant::new(&pixels, 10);
        let palette = nq.palette();
        assert_eq!(palette.as_bytes().len(), 768);
        for rgb in [[255, 0, 0], [0, 255, 0], [10, 200, 90], [128, 128, 128]] {
            let best = (0..=255u8)
                .map(|i| manhattan(rgb, palette.entry(i)))
                .min()
                .unwrap();
            let idx = nq.nearest(rgb);
            assert_eq!(manhattan(rgb, palette.entry(idx)), best);
        }
    }

    #[test]
    fn solid_color() {
        let pixels = [255, 0, 0].repeat(400);
        let nq = NeuQuant::new(&pixels, 10);
        let idx = nq.nearest([255, 0, 0]);
        assert_eq!(nq.palette().entry(idx), [255, 0, 0]);
    }

    #[test]
    fn deterministic() {
        let pixels = gradient(100, 100);
        let a = NeuQuant::new(&pixels, 10);
        let b = NeuQuant::new(&pixels, 10);
        assert_eq!(a.palette(), b.palette());
        for c in pixels.chunks_exact(3).step_by(37) {
            let c = [c[0], c[1], c[2]];
            assert_eq!(a.nearest(c), b.nearest(c));
        }
    }

    #[test]
    fn search_is_exact() {
        let pixels = gradient(64, 48);
        let nq = NeuQuant::new(&pixels, 1);
        let palette = nq.palette();
        for r in (0..=255).step_by(15) {
            for g in (0..=255).step_by(15) {
                for b in (0..=255).step_by(51) {
                    let c = [r as u8, g as u8, b as u8];
                    let best = (0..=255u8)
                        .map(|i| manhattan(palette.entry(i), c))
                        .min()
                        .unwrap();
                    let found = manhattan(palette.entry(nq.nearest(c)), c);
                    assert_eq!(found, best, "color {:?}", c);
                }
            }
        }
    }
}
