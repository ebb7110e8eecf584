//! Convolution engine.
//!
//! Every filter here is built on [`convolve_separable`]: a horizontal pass
//! then a vertical pass of a 1-D [`Kernel`] over reflect-padded frames, each
//! channel independent.
//!
//! - [`Blur`] - gaussian blur
//! - [`Sharpen`] - unsharp mask with optional threshold
//! - [`EdgeDetect`] - Sobel magnitude on luma, gray RGB output
//! - [`Glow`] - blur of the above-threshold highlights, added back
//!
//! # Example
//!
//! ```rust
//! use imageops::{ImageBatch, ImageOp, OpsConfig};
//! use imageops::filter::Blur;
//!
//! let img = ImageBatch::filled(1, 8, 8, &[0.5, 0.5, 0.5, 1.0]).unwrap();
//! let out = Blur { radius: 3, sigma: 1.5 }.process(&img, &OpsConfig::default()).unwrap();
//! assert!(out.data().iter().all(|v| (v - 0.5).abs() < 1e-5 || (v - 1.0).abs() < 1e-5));
//! ```

use imageops_core::{ImageBatch, OpsConfig, OpsResult, clamp01, luma};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::kernel::{Kernel, reflect_index};
use crate::operator::ImageOp;
use crate::parallel::{for_each_chunk, map_pixels};

/// Convolves `batch` frames of `height` × `width` × `channels` with `kernel`
/// horizontally then vertically, reflecting at the borders.
///
/// The result is not clamped. An identity kernel returns a copy.
pub fn convolve_separable(
    src: &[f32],
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    kernel: &Kernel,
) -> Vec<f32> {
    if kernel.is_identity() {
        return src.to_vec();
    }
    let weights = kernel.weights();
    let r = kernel.radius() as isize;
    let row_len = width * channels;

    // horizontal
    let mut temp = vec![0.0f32; src.len()];
    for_each_chunk(&mut temp, row_len, |row, dst| {
        let src_row = &src[row * row_len..(row + 1) * row_len];
        for x in 0..width {
            for (k, &wk) in weights.iter().enumerate() {
                let sx = reflect_index(x as isize + k as isize - r, width);
                for c in 0..channels {
                    dst[x * channels + c] += src_row[sx * channels + c] * wk;
                }
            }
        }
    });

    // vertical
    let mut out = vec![0.0f32; src.len()];
    let frame_len = height * row_len;
    for_each_chunk(&mut out, row_len, |row, dst| {
        let (b, y) = (row / height, row % height);
        let frame = &temp[b * frame_len..(b + 1) * frame_len];
        for (k, &wk) in weights.iter().enumerate() {
            let sy = reflect_index(y as isize + k as isize - r, height);
            let src_row = &frame[sy * row_len..(sy + 1) * row_len];
            for (d, s) in dst.iter_mut().zip(src_row) {
                *d += s * wk;
            }
        }
    });
    out
}

/// Gaussian blur of raw frames, clamped. Radius 0 returns an unclamped copy.
#[allow(clippy::too_many_arguments)]
pub(crate) fn blur_raw(
    src: &[f32],
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    radius: usize,
    sigma: f32,
    eps: f32,
) -> Vec<f32> {
    let kernel = Kernel::gaussian(radius, sigma, eps);
    let mut out = convolve_separable(src, batch, height, width, channels, &kernel);
    if !kernel.is_identity() {
        out.iter_mut().for_each(|v| *v = clamp01(*v));
    }
    out
}

/// Gaussian blur.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blur {
    /// Kernel half-width in pixels; 0 leaves the image untouched.
    pub radius: usize,
    /// Gaussian sigma in pixels.
    pub sigma: f32,
}

impl Default for Blur {
    fn default() -> Self {
        Self { radius: 3, sigma: 1.5 }
    }
}

impl ImageOp for Blur {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(radius = self.radius, sigma = self.sigma, "filter::blur");
        if self.radius == 0 {
            debug!("blur radius 0; returning source");
            return Ok(src.clone());
        }
        let (b, h, w, c) = src.shape();
        let data = blur_raw(src.data(), b, h, w, c, self.radius, self.sigma, cfg.epsilon);
        ImageBatch::from_data(b, h, w, c, data)
    }
}

/// Unsharp mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sharpen {
    /// Gain applied to the high-pass detail.
    pub amount: f32,
    /// Blur radius of the low-pass.
    pub radius: usize,
    /// Blur sigma of the low-pass.
    pub sigma: f32,
    /// Pixels whose mean absolute detail falls below this are left alone.
    pub threshold: f32,
}

impl Default for Sharpen {
    fn default() -> Self {
        Self { amount: 0.6, radius: 2, sigma: 1.0, threshold: 0.0 }
    }
}

impl ImageOp for Sharpen {
    fn name(&self) -> &'static str {
        "sharpen"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(amount = self.amount, radius = self.radius, threshold = self.threshold, "filter::sharpen");
        let x = src.clamped();
        if self.amount == 0.0 || self.radius == 0 {
            return Ok(x);
        }

        let (b, h, w, c) = x.shape();
        let sigma = self.sigma.max(cfg.epsilon);
        let blurred = blur_raw(x.data(), b, h, w, c, self.radius, sigma, cfg.epsilon);
        let (amount, threshold) = (self.amount, self.threshold);

        let mut out = x;
        let row_len = w * c;
        for_each_chunk(out.data_mut(), row_len, |row, dst| {
            let low = &blurred[row * row_len..(row + 1) * row_len];
            for (px, lp) in dst.chunks_exact_mut(c).zip(low.chunks_exact(c)) {
                let mut diff = [0.0f32; 4];
                for ch in 0..c {
                    diff[ch] = px[ch] - lp[ch];
                }
                if threshold > 0.0 {
                    let mean = diff[..c].iter().map(|d| d.abs()).sum::<f32>() / c as f32;
                    if mean < threshold {
                        continue;
                    }
                }
                for ch in 0..c {
                    px[ch] = clamp01(px[ch] + diff[ch] * amount);
                }
            }
        });
        Ok(out)
    }
}

/// Extracts clamped luma from every pixel.
fn luma_plane(src: &ImageBatch, weights: [f32; 3]) -> Vec<f32> {
    map_pixels(src.data(), src.channels(), 1, |px, out| {
        out[0] = clamp01(luma([px[0], px[1], px[2]], weights));
    })
}

/// Sobel edge magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDetect {
    /// Multiplier on the gradient magnitude.
    pub strength: f32,
}

impl Default for EdgeDetect {
    fn default() -> Self {
        Self { strength: 1.0 }
    }
}

impl ImageOp for EdgeDetect {
    fn name(&self) -> &'static str {
        "edge_detect"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(strength = self.strength, "filter::edge_detect");
        let x = src.clamped();
        let (_, h, w, c) = x.shape();
        let lum = luma_plane(&x, cfg.luma_weights);
        let strength = self.strength;

        let mut out = x;
        let row_len = w * c;
        for_each_chunk(out.data_mut(), row_len, |row, dst| {
            let (b, y) = (row / h, row % h);
            let plane = &lum[b * h * w..(b + 1) * h * w];
            let at = |yy: isize, xx: isize| plane[reflect_index(yy, h) * w + reflect_index(xx, w)];
            let y = y as isize;
            for x in 0..w {
                let xi = x as isize;
                let (tl, tc, tr) = (at(y - 1, xi - 1), at(y - 1, xi), at(y - 1, xi + 1));
                let (ml, mr) = (at(y, xi - 1), at(y, xi + 1));
                let (bl, bc, br) = (at(y + 1, xi - 1), at(y + 1, xi), at(y + 1, xi + 1));
                let gx = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
                let gy = (bl + 2.0 * bc + br) - (tl + 2.0 * tc + tr);
                let mag = clamp01((gx * gx + gy * gy).sqrt() * strength);
                let px = &mut dst[x * c..(x + 1) * c];
                px[..3].fill(mag);
            }
        });
        Ok(out)
    }
}

/// Highlight bloom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Glow {
    /// Luma above which pixels contribute.
    pub threshold: f32,
    /// Blur radius of the bloom.
    pub radius: usize,
    /// Blur sigma of the bloom.
    pub sigma: f32,
    /// Gain of the bloom when added back.
    pub intensity: f32,
}

impl Default for Glow {
    fn default() -> Self {
        Self { threshold: 0.7, radius: 6, sigma: 3.0, intensity: 0.8 }
    }
}

impl ImageOp for Glow {
    fn name(&self) -> &'static str {
        "glow"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(threshold = self.threshold, radius = self.radius, intensity = self.intensity, "filter::glow");
        let x = src.clamped();
        let (b, h, w, c) = x.shape();
        let (weights, threshold) = (cfg.luma_weights, self.threshold);

        let highlights = map_pixels(x.data(), c, 3, |px, out| {
            let m = clamp01(luma([px[0], px[1], px[2]], weights) - threshold);
            for ch in 0..3 {
                out[ch] = px[ch] * m;
            }
        });
        let sigma = self.sigma.max(cfg.epsilon);
        let bloom = blur_raw(&highlights, b, h, w, 3, self.radius, sigma, cfg.epsilon);

        let intensity = self.intensity;
        let mut out = x;
        for_each_chunk(out.data_mut(), w * c, |row, dst| {
            let glow = &bloom[row * w * 3..(row + 1) * w * 3];
            for (px, g) in dst.chunks_exact_mut(c).zip(glow.chunks_exact(3)) {
                for ch in 0..3 {
                    px[ch] = clamp01(px[ch] + g[ch] * intensity);
                }
            }
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn checker(channels: usize) -> ImageBatch {
        ImageBatch::from_fn(2, 6, 7, channels, |b, y, x| {
            let v = if (x + y + b) % 2 == 0 { 1.0 } else { 0.0 };
            let mut px = vec![v, 0.5 * v, 1.0 - v, 0.8];
            px.truncate(channels);
            px
        })
        .unwrap()
    }

    #[test]
    fn blur_radius_zero_returns_source() {
        let img = ImageBatch::from_data(1, 1, 1, 3, vec![-0.2, 0.5, 1.5]).unwrap();
        let out = Blur { radius: 0, sigma: 2.0 }.process(&img, &OpsConfig::default()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn blur_preserves_constant_and_smooths() {
        let cfg = OpsConfig::default();
        let flat = ImageBatch::filled(1, 5, 5, &[0.3, 0.6, 0.9]).unwrap();
        let out = Blur::default().process(&flat, &cfg).unwrap();
        for (a, b) in out.data().iter().zip(flat.data()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-5);
        }

        let img = checker(4);
        let out = Blur { radius: 2, sigma: 1.0 }.process(&img, &cfg).unwrap();
        assert!(out.is_normalized());
        // checker averages toward 0.5 on the first channel
        let v = out.pixel(0, 3, 3)[0];
        assert!(v > 0.2 && v < 0.8, "got {}", v);
        // alpha is constant and stays so
        assert_abs_diff_eq!(out.pixel(1, 2, 2)[3], 0.8, epsilon = 1e-5);
    }

    #[test]
    fn blur_radius_larger_than_image() {
        let img = ImageBatch::from_fn(1, 2, 3, 3, |_, y, x| vec![x as f32 / 2.0, y as f32, 0.0]).unwrap();
        let out = Blur { radius: 9, sigma: 4.0 }.process(&img, &OpsConfig::default()).unwrap();
        assert_eq!(out.shape(), img.shape());
        assert!(out.is_normalized());
    }

    #[test]
    fn reflect_blur_matches_hand_computation() {
        // 1x3 row [0, 1, 0], kernel radius 1: reflect pads to [1, 0, 1, 0, 1]
        let src = vec![0.0, 1.0, 0.0];
        let k = Kernel::gaussian(1, 1.0, 1e-6);
        let (a, m) = (k.weights()[0], k.weights()[1]);
        let out = convolve_separable(&src, 1, 1, 3, 1, &k);
        assert_abs_diff_eq!(out[0], 2.0 * a, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], m, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 2.0 * a, epsilon = 1e-6);
    }

    #[test]
    fn sharpen_identity_cases() {
        let cfg = OpsConfig::default();
        let img = ImageBatch::from_data(1, 1, 2, 3, vec![-0.5, 0.5, 2.0, 0.1, 0.2, 0.3]).unwrap();
        let none = Sharpen { amount: 0.0, ..Default::default() }.process(&img, &cfg).unwrap();
        assert_eq!(none, img.clamped());
        let flat = Sharpen { radius: 0, ..Default::default() }.process(&img, &cfg).unwrap();
        assert_eq!(flat, img.clamped());
    }

    #[test]
    fn sharpen_increases_local_contrast() {
        let cfg = OpsConfig::default();
        let img = ImageBatch::from_fn(1, 5, 5, 3, |_, _, x| {
            let v = if x < 2 { 0.3 } else if x == 2 { 0.5 } else { 0.7 };
            vec![v; 3]
        })
        .unwrap();
        let out = Sharpen { amount: 1.0, radius: 1, sigma: 1.0, threshold: 0.0 }
            .process(&img, &cfg)
            .unwrap();
        assert!(out.pixel(0, 2, 1)[0] < 0.3);
        assert!(out.pixel(0, 2, 3)[0] > 0.7);
    }

    #[test]
    fn sharpen_threshold_suppresses_small_detail() {
        let cfg = OpsConfig::default();
        let img = ImageBatch::from_fn(1, 5, 5, 3, |_, y, x| vec![0.5 + 0.01 * ((x + y) % 2) as f32; 3]).unwrap();
        let out = Sharpen { amount: 2.0, radius: 1, sigma: 1.0, threshold: 0.1 }
            .process(&img, &cfg)
            .unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn edge_detect_flat_is_black() {
        let img = ImageBatch::filled(1, 4, 4, &[0.4, 0.4, 0.4, 0.6]).unwrap();
        let out = EdgeDetect::default().process(&img, &OpsConfig::default()).unwrap();
        for px in out.data().chunks_exact(4) {
            assert_eq!(&px[..3], &[0.0, 0.0, 0.0]);
            assert_eq!(px[3], 0.6);
        }
    }

    #[test]
    fn edge_detect_vertical_step() {
        let img = ImageBatch::from_fn(1, 3, 4, 3, |_, _, x| vec![if x < 2 { 0.0 } else { 1.0 }; 3]).unwrap();
        let out = EdgeDetect { strength: 0.25 }.process(&img, &OpsConfig::default()).unwrap();
        // Gx across the step = 4 * luma(1,1,1); magnitude * 0.25 = 1
        let px = out.pixel(0, 1, 1);
        assert_abs_diff_eq!(px[0], 1.0, epsilon = 1e-5);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        // reflect at x = 0 mirrors x = 1, so no gradient there
        assert_abs_diff_eq!(out.pixel(0, 1, 0)[0], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn glow_below_threshold_is_identity() {
        let img = ImageBatch::filled(1, 4, 4, &[0.2, 0.3, 0.1, 0.5]).unwrap();
        let out = Glow::default().process(&img, &OpsConfig::default()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn glow_brightens_highlights() {
        let img = ImageBatch::filled(1, 4, 4, &[0.9, 0.9, 0.9]).unwrap();
        let g = Glow { threshold: 0.5, radius: 2, sigma: 1.0, intensity: 0.5 };
        let out = g.process(&img, &OpsConfig::default()).unwrap();
        // mask = 0.4, bloom = 0.36, out = 0.9 + 0.18
        for v in out.data() {
            assert_abs_diff_eq!(*v, 1.0, epsilon = 1e-6);
        }
        let dim = ImageBatch::filled(1, 4, 4, &[0.6, 0.6, 0.6]).unwrap();
        let out = g.process(&dim, &OpsConfig::default()).unwrap();
        assert_abs_diff_eq!(out.data()[0], 0.6 + 0.06 * 0.5, epsilon = 1e-5);
    }
}
