//! Crop, pad and reformat.
//!
//! [`crop_pad`] cuts a rectangle out of every frame, filling the parts that
//! fall outside the source with a [`PadMode`], then adds a symmetric reflect
//! border. [`CropReformat`] follows that with an aspect-aware resize onto an
//! exact output size.
//!
//! Index mapping is done per axis up front, so no intermediate padded frame
//! is ever materialized.
//!
//! # Example
//!
//! ```rust
//! use imageops::{ImageBatch, ImageOp, OpsConfig};
//! use imageops::geometry::{CropReformat, ReformatMode};
//!
//! let img = ImageBatch::filled(1, 100, 200, &[1.0, 1.0, 1.0]).unwrap();
//! let op = CropReformat {
//!     crop_w: 200,
//!     crop_h: 100,
//!     out_w: 100,
//!     out_h: 100,
//!     mode: ReformatMode::Fit,
//!     ..Default::default()
//! };
//! let out = op.process(&img, &OpsConfig::default()).unwrap();
//! assert_eq!((out.width(), out.height()), (100, 100));
//! assert_eq!(out.pixel(0, 0, 50), &[0.0, 0.0, 0.0]); // letterbox
//! assert_eq!(out.pixel(0, 50, 50), &[1.0, 1.0, 1.0]);
//! ```

use imageops_core::{ImageBatch, OpsConfig, OpsError, OpsResult, clamp01};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, error, trace};

use crate::kernel::{reflect_index, replicate_index};
use crate::operator::ImageOp;
use crate::resize::{resize_bilinear, resize_bilinear_placed};

/// How the parts of a crop outside the source are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PadMode {
    /// Mirror without repeating the edge.
    #[default]
    Reflect,
    /// Repeat the edge pixel.
    Replicate,
    /// Zero.
    Constant,
}

impl PadMode {
    /// Parses a mode name case-insensitively. Unknown names yield [`PadMode::Reflect`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "replicate" => PadMode::Replicate,
            "constant" => PadMode::Constant,
            _ => PadMode::Reflect,
        }
    }
}

impl From<String> for PadMode {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// How a crop is fitted onto the output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ReformatMode {
    /// Scale to fit inside, letterbox with zeros.
    #[default]
    Fit,
    /// Scale to cover, center-crop the overflow.
    Fill,
    /// Scale each axis independently.
    Stretch,
}

impl ReformatMode {
    /// Parses a mode name case-insensitively. Unknown names yield [`ReformatMode::Fill`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "fit" => ReformatMode::Fit,
            "stretch" => ReformatMode::Stretch,
            _ => ReformatMode::Fill,
        }
    }
}

impl From<String> for ReformatMode {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// Maps every output index on one axis to a source index, `None` for zero fill.
///
/// `req` is the requested crop length starting at `start` (may be negative),
/// `src_len` the source length and `padding` the extra reflect border.
fn axis_map(start: i64, req: usize, src_len: usize, padding: usize, mode: PadMode) -> Vec<Option<usize>> {
    let end = start + req as i64;
    let lo = start.max(0);
    let hi = end.min(src_len as i64);
    let lead = lo - start;
    let overlap = (hi - lo).max(0) as usize;

    (0..req + 2 * padding)
        .map(|o| {
            let j = if padding > 0 {
                reflect_index(o as isize - padding as isize, req) as i64
            } else {
                o as i64
            };
            let i = (j - lead) as isize;
            let local = match mode {
                PadMode::Reflect => Some(reflect_index(i, overlap)),
                PadMode::Replicate => Some(replicate_index(i, overlap)),
                PadMode::Constant => (i >= 0 && (i as usize) < overlap).then_some(i as usize),
            };
            local.map(|l| lo as usize + l)
        })
        .collect()
}

/// Crops `(x, y, w, h)` out of every frame and adds `padding` reflect border.
///
/// Parts of the rectangle outside the source are filled per `mode`. If the
/// rectangle misses the source entirely the result is a zero canvas of the
/// requested size.
///
/// # Errors
///
/// - [`OpsError::InvalidInput`] for a zero-sized rectangle
/// - [`OpsError::SizeLimitExceeded`] if the padded size exceeds
///   `cfg.max_image_dimension`
#[allow(clippy::too_many_arguments)]
pub fn crop_pad(
    src: &ImageBatch,
    x: i64,
    y: i64,
    w: usize,
    h: usize,
    padding: usize,
    mode: PadMode,
    cfg: &OpsConfig,
) -> OpsResult<ImageBatch> {
    if w == 0 || h == 0 {
        return Err(OpsError::invalid_input(format!("crop size must be > 0, got {}x{}", w, h)));
    }
    let (out_w, out_h) = (w + 2 * padding, h + 2 * padding);
    check_dimension(out_w, out_h, cfg.max_image_dimension)?;

    let (b, sh, sw, c) = src.shape();
    trace!(x, y, w, h, padding, ?mode, "geometry::crop_pad");

    let overlaps = x < sw as i64 && x + w as i64 > 0 && y < sh as i64 && y + h as i64 > 0;
    if !overlaps {
        debug!(x, y, w, h, "crop misses the source; returning zero canvas");
        return ImageBatch::zeros(b, out_h, out_w, c);
    }

    let xs = axis_map(x, w, sw, padding, mode);
    let ys = axis_map(y, h, sh, padding, mode);

    let mut data = Vec::with_capacity(b * out_h * out_w * c);
    for frame in src.frames() {
        for sy in &ys {
            for sx in &xs {
                match (sy, sx) {
                    (Some(sy), Some(sx)) => {
                        let i = (sy * sw + sx) * c;
                        data.extend_from_slice(&frame[i..i + c]);
                    }
                    _ => data.extend(std::iter::repeat_n(0.0, c)),
                }
            }
        }
    }
    ImageBatch::from_data(b, out_h, out_w, c, data)
}

fn check_dimension(width: usize, height: usize, limit: usize) -> OpsResult<()> {
    if width > limit || height > limit {
        error!(width, height, limit, "output size exceeds maximum dimension");
        return Err(OpsError::SizeLimitExceeded { width, height, limit });
    }
    Ok(())
}

/// Resizes every frame to exactly `out_w` × `out_h`, clamped.
pub fn resize(src: &ImageBatch, out_w: usize, out_h: usize) -> OpsResult<ImageBatch> {
    let (b, h, w, c) = src.shape();
    let mut data = Vec::with_capacity(b * out_w * out_h * c);
    for frame in src.frames() {
        data.extend(resize_bilinear(frame, w, h, c, out_w, out_h).into_iter().map(clamp01));
    }
    ImageBatch::from_data(b, out_h, out_w, c, data)
}

/// Scaled length for an aspect-preserving reformat: round half to even, at least 1.
fn scaled_len(len: usize, scale: f64) -> usize {
    ((len as f64 * scale).round_ties_even() as usize).max(1)
}

/// Offset placing a resized length `n` on an output of length `out`.
fn placement(n: usize, out: usize, mode: ReformatMode) -> i64 {
    match mode {
        ReformatMode::Fit if n <= out => ((out - n) / 2) as i64,
        ReformatMode::Fill if n >= out => -(((n - out) / 2) as i64),
        _ => 0,
    }
}

/// Crop, pad, then reformat onto an exact output size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropReformat {
    /// Crop origin x; may be negative.
    pub x: i64,
    /// Crop origin y; may be negative.
    pub y: i64,
    /// Crop width.
    pub crop_w: usize,
    /// Crop height.
    pub crop_h: usize,
    /// Extra reflect border around the crop.
    pub padding: usize,
    /// Fill for parts of the crop outside the source.
    pub pad_mode: PadMode,
    /// Output width; 0 keeps the cropped size.
    pub out_w: usize,
    /// Output height; 0 keeps the cropped size.
    pub out_h: usize,
    /// Aspect handling.
    pub mode: ReformatMode,
}

impl Default for CropReformat {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            crop_w: 512,
            crop_h: 512,
            padding: 0,
            pad_mode: PadMode::Reflect,
            out_w: 0,
            out_h: 0,
            mode: ReformatMode::Fit,
        }
    }
}

impl ImageOp for CropReformat {
    fn name(&self) -> &'static str {
        "crop_reformat"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(out_w = self.out_w, out_h = self.out_h, mode = ?self.mode, "geometry::crop_reformat");
        let cropped = crop_pad(src, self.x, self.y, self.crop_w, self.crop_h, self.padding, self.pad_mode, cfg)?;
        if self.out_w == 0 || self.out_h == 0 {
            return Ok(cropped);
        }

        let (out_w, out_h) = (self.out_w, self.out_h);
        check_dimension(out_w, out_h, cfg.max_image_dimension)?;
        let (b, h, w, c) = cropped.shape();
        cfg.warn_if_large(out_w, out_h, c * b);

        if self.mode == ReformatMode::Stretch {
            return resize(&cropped, out_w, out_h);
        }

        let sx = out_w as f64 / w.max(1) as f64;
        let sy = out_h as f64 / h.max(1) as f64;
        let s = if self.mode == ReformatMode::Fit { sx.min(sy) } else { sx.max(sy) };
        let (nw, nh) = (scaled_len(w, s), scaled_len(h, s));
        let (off_x, off_y) = (placement(nw, out_w, self.mode), placement(nh, out_h, self.mode));
        debug!(nw, nh, off_x, off_y, "reformat placement");

        let mut data = Vec::with_capacity(b * out_w * out_h * c);
        for frame in cropped.frames() {
            let placed = resize_bilinear_placed(frame, w, h, c, nw, nh, out_w, out_h, off_x, off_y);
            data.extend(placed.into_iter().map(clamp01));
        }
        ImageBatch::from_data(b, out_h, out_w, c, data)
    }
}
