//! Affine transform: scale, rotate, translate.
//!
//! Steps run in that order on every frame:
//!
//! 1. **scale** - skipped when `|scale - 1| <= eps`; resampled with
//!    [`resize_filtered`] to `max(1, round(w * scale))`
//! 2. **rotate** - skipped when `|deg| <= eps`; counter-clockwise around the
//!    frame center, optionally growing the canvas to the rotated bounds
//! 3. **translate** - integer shift onto a same-size zero canvas
//!
//! Rotation works backwards: each output pixel center is mapped through a
//! [`DAffine2`] into the source and sampled there. Centers landing outside
//! the source are transparent black.

use glam::{DAffine2, DMat2, DVec2};
use imageops_core::{ImageBatch, OpsConfig, OpsError, OpsResult, clamp01};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::kernel::replicate_index;
use crate::operator::ImageOp;
use crate::parallel::for_each_chunk;
use crate::resize::{Filter, resize_filtered};

/// Scale, rotate and translate every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Horizontal shift in pixels, positive to the right.
    pub translate_x: i32,
    /// Vertical shift in pixels, positive downwards.
    pub translate_y: i32,
    /// Counter-clockwise rotation in degrees.
    pub rotate_deg: f32,
    /// Uniform scale factor.
    pub scale: f32,
    /// Resampling filter for scale and rotate.
    pub filter: Filter,
    /// Grow the canvas to fit the rotated frame.
    pub expand: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate_x: 0,
            translate_y: 0,
            rotate_deg: 0.0,
            scale: 1.0,
            filter: Filter::Bilinear,
            expand: false,
        }
    }
}

/// Output size and output-to-source mapping of a rotation.
#[derive(Debug, Clone, Copy)]
struct Rotation {
    to_source: DAffine2,
    width: usize,
    height: usize,
}

impl Rotation {
    fn new(width: usize, height: usize, deg: f64, expand: bool) -> Self {
        let center = DVec2::new(width as f64 / 2.0, height as f64 / 2.0);
        // Snap to 15 decimals so right angles yield exact integer bounds.
        let snap = |v: f64| (v * 1e15).round() / 1e15;
        let (sin, cos) = deg.to_radians().sin_cos();
        let (sin, cos) = (snap(sin), snap(cos));
        let rot = DMat2::from_cols_array(&[cos, sin, -sin, cos]);
        let mut to_source = DAffine2::from_translation(center)
            * DAffine2::from_mat2(rot)
            * DAffine2::from_translation(-center);

        if !expand {
            return Self { to_source, width, height };
        }

        let (w, h) = (width as f64, height as f64);
        let corners = [DVec2::ZERO, DVec2::new(w, 0.0), DVec2::new(w, h), DVec2::new(0.0, h)]
            .map(|p| to_source.transform_point2(p));
        let min = corners.iter().fold(DVec2::splat(f64::INFINITY), |a, p| a.min(*p));
        let max = corners.iter().fold(DVec2::splat(f64::NEG_INFINITY), |a, p| a.max(*p));
        let nw = (max.x.ceil() - min.x.floor()).max(1.0);
        let nh = (max.y.ceil() - min.y.floor()).max(1.0);

        to_source = to_source * DAffine2::from_translation(DVec2::new(-(nw - w) / 2.0, -(nh - h) / 2.0));
        Self { to_source, width: nw as usize, height: nh as usize }
    }
}

/// Samples `frame` at continuous position (`u`, `v`) into `out`.
///
/// Positions outside `[0, w) x [0, h)` yield zeros. Interpolating filters
/// place sample centers at half-integers and clamp their taps to the edge.
/// Cubic overshoot is clamped back to `[0, 1]`.
#[allow(clippy::too_many_arguments)]
fn sample(frame: &[f32], w: usize, h: usize, c: usize, u: f64, v: f64, filter: Filter, out: &mut [f32]) {
    if !(u >= 0.0 && u < w as f64 && v >= 0.0 && v < h as f64) {
        out.fill(0.0);
        return;
    }

    if filter == Filter::Nearest {
        let i = (v as usize * w + u as usize) * c;
        out.copy_from_slice(&frame[i..i + c]);
        return;
    }

    let (fx, fy) = (u - 0.5, v - 0.5);
    let (x0, y0) = (fx.floor(), fy.floor());
    let (dx, dy) = ((fx - x0) as f32, (fy - y0) as f32);
    let (x0, y0) = (x0 as isize, y0 as isize);
    let support = filter.support() as isize;

    out.fill(0.0);
    for ky in (1 - support)..=support {
        let wy = filter.weight(ky as f32 - dy);
        if wy == 0.0 {
            continue;
        }
        let sy = replicate_index(y0 + ky, h);
        for kx in (1 - support)..=support {
            let wx = filter.weight(kx as f32 - dx);
            if wx == 0.0 {
                continue;
            }
            let i = (sy * w + replicate_index(x0 + kx, w)) * c;
            for ch in 0..c {
                out[ch] += frame[i + ch] * wx * wy;
            }
        }
    }
    for v in out.iter_mut() {
        *v = clamp01(*v);
    }
}

fn check_scale_dimension(width: usize, height: usize, limit: usize) -> OpsResult<()> {
    if width > limit || height > limit {
        error!(width, height, limit, "transformed size exceeds maximum dimension");
        return Err(OpsError::SizeLimitExceeded { width, height, limit });
    }
    Ok(())
}

impl Transform {
    fn scale_step(&self, src: ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        if (self.scale - 1.0).abs() <= cfg.epsilon {
            return Ok(src);
        }
        let (b, h, w, c) = src.shape();
        let s = self.scale as f64;
        let nw = ((w as f64 * s).round_ties_even() as usize).max(1);
        let nh = ((h as f64 * s).round_ties_even() as usize).max(1);
        check_scale_dimension(nw, nh, cfg.max_scale_dimension)?;
        cfg.warn_if_large(nw, nh, c * b);
        debug!(from_w = w, from_h = h, nw, nh, "transform scale");

        let mut data = Vec::with_capacity(b * nw * nh * c);
        for frame in src.frames() {
            data.extend(resize_filtered(frame, w, h, c, nw, nh, self.filter).into_iter().map(clamp01));
        }
        ImageBatch::from_data(b, nh, nw, c, data)
    }

    fn rotate_step(&self, src: ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        if self.rotate_deg.abs() <= cfg.epsilon {
            return Ok(src);
        }
        let (b, h, w, c) = src.shape();
        let rot = Rotation::new(w, h, self.rotate_deg as f64, self.expand);
        if self.expand {
            check_scale_dimension(rot.width, rot.height, cfg.max_scale_dimension)?;
            cfg.warn_if_large(rot.width, rot.height, c * b);
        }
        let (ow, oh) = (rot.width, rot.height);
        debug!(ow, oh, "transform rotate");

        let filter = self.filter;
        let mut out = ImageBatch::zeros(b, oh, ow, c)?;
        let row_len = ow * c;
        for_each_chunk(out.data_mut(), row_len, |row, dst| {
            let (f, y) = (row / oh, row % oh);
            let frame = src.frame(f);
            for (x, px) in dst.chunks_exact_mut(c).enumerate() {
                let p = rot.to_source.transform_point2(DVec2::new(x as f64 + 0.5, y as f64 + 0.5));
                sample(frame, w, h, c, p.x, p.y, filter, px);
            }
        });
        Ok(out)
    }

    fn translate_step(&self, src: ImageBatch) -> ImageBatch {
        let (tx, ty) = (self.translate_x as i64, self.translate_y as i64);
        if tx == 0 && ty == 0 {
            return src;
        }
        let (_, h, w, c) = src.shape();
        let mut out = src.clone();
        let row_len = w * c;
        for_each_chunk(out.data_mut(), row_len, |row, dst| {
            let (f, y) = (row / h, row % h);
            let sy = y as i64 - ty;
            if sy < 0 || sy >= h as i64 {
                dst.fill(0.0);
                return;
            }
            let src_row = &src.frame(f)[sy as usize * row_len..(sy as usize + 1) * row_len];
            for (x, px) in dst.chunks_exact_mut(c).enumerate() {
                let sx = x as i64 - tx;
                if sx < 0 || sx >= w as i64 {
                    px.fill(0.0);
                } else {
                    let i = sx as usize * c;
                    px.copy_from_slice(&src_row[i..i + c]);
                }
            }
        });
        out
    }
}

impl ImageOp for Transform {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        trace!(
            translate_x = self.translate_x,
            translate_y = self.translate_y,
            rotate_deg = self.rotate_deg,
            scale = self.scale,
            filter = ?self.filter,
            expand = self.expand,
            "transform::process"
        );
        let scaled = self.scale_step(src.clone(), cfg)?;
        let rotated = self.rotate_step(scaled, cfg)?;
        Ok(self.translate_step(rotated))
    }
}
