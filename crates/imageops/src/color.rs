//! Color engine: per-pixel grading operators.
//!
//! - [`ColorCorrect`] - brightness, contrast, gamma, saturation
//! - [`Levels`] - input range remap with gamma and output range, alpha too
//! - [`HueSat`] - HSV hue rotation and saturation/value scaling
//! - [`Invert`] - `1 - rgb`, alpha optional
//! - [`Clamp`] - clamp to `[min, max]` then `[0, 1]`
//! - [`ColorAdjust`] - color correct then hue/sat in one pass, with bypass
//!
//! Every gamma goes through [`OpsConfig::clamp_gamma`] first. RGB is
//! graded, alpha passes through (clamped) unless an operator says otherwise,
//! and the channel count is never changed.
//!
//! # Example
//!
//! ```rust
//! use imageops::{ImageBatch, ImageOp, OpsConfig};
//! use imageops::color::Levels;
//!
//! let img = ImageBatch::filled(1, 1, 1, &[0.25, 0.5, 0.75]).unwrap();
//! let out = Levels::default().process(&img, &OpsConfig::default()).unwrap();
//! assert_eq!(out.data(), img.data());
//! ```

use imageops_core::{ImageBatch, OpsConfig, OpsResult, clamp01, luma};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::operator::ImageOp;
use crate::parallel::map_image;

/// Clamps the alpha channel of an RGBA pixel, if any.
#[inline]
fn clamp_alpha(px: &mut [f32]) {
    if let Some(a) = px.get_mut(3) {
        *a = clamp01(*a);
    }
}

/// Brightness, contrast, gamma and saturation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorCorrect {
    /// Added to RGB before contrast, typically in `[-1, 1]`.
    pub brightness: f32,
    /// Contrast around 0.5.
    pub contrast: f32,
    /// Display gamma; output is `x^(1/gamma)`.
    pub gamma: f32,
    /// Saturation around luma, 0 = gray.
    pub saturation: f32,
}

impl Default for ColorCorrect {
    fn default() -> Self {
        Self { brightness: 0.0, contrast: 1.0, gamma: 1.0, saturation: 1.0 }
    }
}

impl ColorCorrect {
    #[inline]
    fn grade(&self, px: &mut [f32], inv_gamma: f32, weights: [f32; 3]) {
        let mut rgb = [0.0f32; 3];
        for (c, v) in rgb.iter_mut().enumerate() {
            let x = ((px[c] + self.brightness) - 0.5) * self.contrast + 0.5;
            *v = clamp01(x).powf(inv_gamma);
        }
        let y = luma(rgb, weights);
        for (c, v) in rgb.iter().enumerate() {
            px[c] = clamp01(y + (v - y) * self.saturation);
        }
        clamp_alpha(px);
    }
}

impl ImageOp for ColorCorrect {
    fn name(&self) -> &'static str {
        "color_correct"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        let inv_gamma = 1.0 / cfg.clamp_gamma(self.gamma);
        trace!(
            brightness = self.brightness,
            contrast = self.contrast,
            inv_gamma,
            saturation = self.saturation,
            "color::correct"
        );
        let weights = cfg.luma_weights;
        Ok(map_image(src, |px| self.grade(px, inv_gamma, weights)))
    }
}

/// Input/output levels, applied to every channel including alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Levels {
    /// Input black point.
    pub in_min: f32,
    /// Input white point.
    pub in_max: f32,
    /// Midtone gamma.
    pub gamma: f32,
    /// Output black point.
    pub out_min: f32,
    /// Output white point.
    pub out_max: f32,
}

impl Default for Levels {
    fn default() -> Self {
        Self { in_min: 0.0, in_max: 1.0, gamma: 1.0, out_min: 0.0, out_max: 1.0 }
    }
}

impl ImageOp for Levels {
    fn name(&self) -> &'static str {
        "levels"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        let range = (self.in_max - self.in_min).max(cfg.epsilon);
        let inv_gamma = 1.0 / cfg.clamp_gamma(self.gamma);
        let span = self.out_max - self.out_min;
        trace!(in_min = self.in_min, range, inv_gamma, "color::levels");

        Ok(map_image(src, |px| {
            for v in px.iter_mut() {
                let y = clamp01((*v - self.in_min) / range).powf(inv_gamma);
                *v = clamp01(self.out_min + y * span);
            }
        }))
    }
}

/// Hue rotation plus saturation and value gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HueSat {
    /// Hue shift in degrees.
    pub hue_deg: f32,
    /// Saturation gain, result limited to `[0, 4]`.
    pub saturation: f32,
    /// Value gain, result limited to `[0, 4]`.
    pub value: f32,
}

impl Default for HueSat {
    fn default() -> Self {
        Self { hue_deg: 0.0, saturation: 1.0, value: 1.0 }
    }
}

/// RGB in `[0, 1]` to HSV, hue in `[0, 1)`.
///
/// Denominators carry `eps`; achromatic pixels get hue 0.
pub fn rgb_to_hsv(rgb: [f32; 3], eps: f32) -> [f32; 3] {
    let [r, g, b] = rgb;
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let delta = maxc - minc;
    let s = if maxc > eps { delta / (maxc + eps) } else { 0.0 };

    let mut h = 0.0;
    if delta > eps {
        let rc = (maxc - r) / (delta + eps);
        let gc = (maxc - g) / (delta + eps);
        let bc = (maxc - b) / (delta + eps);
        // blue wins ties, then green, then red
        h = if maxc == b {
            4.0 + gc - rc
        } else if maxc == g {
            2.0 + rc - bc
        } else {
            bc - gc
        };
    }
    [(h / 6.0).rem_euclid(1.0), s, maxc]
}

/// HSV to RGB; hue wraps, no clamping.
pub fn hsv_to_rgb(hsv: [f32; 3]) -> [f32; 3] {
    let [h, s, v] = hsv;
    let h6 = h.rem_euclid(1.0) * 6.0;
    let i = h6.floor();
    let f = h6 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (i as i32).rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

impl HueSat {
    #[inline]
    fn grade(&self, px: &mut [f32], eps: f32) {
        let rgb = [clamp01(px[0]), clamp01(px[1]), clamp01(px[2])];
        let [h, s, v] = rgb_to_hsv(rgb, eps);
        let h = (h + self.hue_deg / 360.0).rem_euclid(1.0);
        let s = (s * self.saturation).clamp(0.0, 4.0);
        let v = (v * self.value).clamp(0.0, 4.0);
        let out = hsv_to_rgb([h, s, v]);
        for c in 0..3 {
            px[c] = clamp01(out[c]);
        }
        clamp_alpha(px);
    }
}

impl ImageOp for HueSat {
    fn name(&self) -> &'static str {
        "hue_sat"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(hue_deg = self.hue_deg, saturation = self.saturation, value = self.value, "color::hue_sat");
        let eps = cfg.epsilon;
        Ok(map_image(src, |px| self.grade(px, eps)))
    }
}

/// `1 - rgb`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Invert {
    /// Return the source untouched.
    pub bypass: bool,
    /// Also invert alpha.
    pub invert_alpha: bool,
}

impl ImageOp for Invert {
    fn name(&self) -> &'static str {
        "invert"
    }

    fn bypassed(&self) -> bool {
        self.bypass
    }

    fn process(&self, src: &ImageBatch, _cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(invert_alpha = self.invert_alpha, "color::invert");
        let invert_alpha = self.invert_alpha;
        Ok(map_image(src, |px| {
            for (c, v) in px.iter_mut().enumerate() {
                *v = if c < 3 || invert_alpha { clamp01(1.0 - *v) } else { clamp01(*v) };
            }
        }))
    }
}

/// Range clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clamp {
    /// Lower bound.
    pub min: f32,
    /// Upper bound; wins over `min` when they cross.
    pub max: f32,
}

impl Default for Clamp {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl ImageOp for Clamp {
    fn name(&self) -> &'static str {
        "clamp"
    }

    fn process(&self, src: &ImageBatch, _cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(min = self.min, max = self.max, "color::clamp");
        let (lo, hi) = (self.min, self.max);
        Ok(map_image(src, |px| {
            for v in px.iter_mut() {
                *v = clamp01(v.max(lo).min(hi));
            }
        }))
    }
}

/// Color correct followed by hue/sat/value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorAdjust {
    /// Return the source untouched.
    pub bypass: bool,
    /// See [`ColorCorrect::brightness`].
    pub brightness: f32,
    /// See [`ColorCorrect::contrast`].
    pub contrast: f32,
    /// See [`ColorCorrect::gamma`].
    pub gamma: f32,
    /// See [`ColorCorrect::saturation`].
    pub saturation: f32,
    /// See [`HueSat::hue_deg`].
    pub hue_deg: f32,
    /// See [`HueSat::saturation`].
    pub hs_saturation: f32,
    /// See [`HueSat::value`].
    pub hs_value: f32,
}

impl Default for ColorAdjust {
    fn default() -> Self {
        Self {
            bypass: false,
            brightness: 0.0,
            contrast: 1.0,
            gamma: 1.0,
            saturation: 1.0,
            hue_deg: 0.0,
            hs_saturation: 1.0,
            hs_value: 1.0,
        }
    }
}

impl ColorAdjust {
    /// The color-correct stage.
    pub fn correct(&self) -> ColorCorrect {
        ColorCorrect {
            brightness: self.brightness,
            contrast: self.contrast,
            gamma: self.gamma,
            saturation: self.saturation,
        }
    }

    /// The hue/sat stage.
    pub fn hue_sat(&self) -> HueSat {
        HueSat { hue_deg: self.hue_deg, saturation: self.hs_saturation, value: self.hs_value }
    }
}

impl ImageOp for ColorAdjust {
    fn name(&self) -> &'static str {
        "color_adjust"
    }

    fn bypassed(&self) -> bool {
        self.bypass
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        let cc = self.correct();
        let hs = self.hue_sat();
        let inv_gamma = 1.0 / cfg.clamp_gamma(cc.gamma);
        let weights = cfg.luma_weights;
        let eps = cfg.epsilon;
        trace!(?cc, ?hs, "color::adjust");
        Ok(map_image(src, |px| {
            cc.grade(px, inv_gamma, weights);
            hs.grade(px, eps);
        }))
    }
}
