//! Frame resampling.
//!
//! Two families live here:
//!
//! - [`resize_bilinear`] / [`resize_bilinear_placed`] - bilinear with
//!   half-pixel centers and clamped taps, no antialiasing. Used for reformat
//!   and mask resampling.
//! - [`resize_filtered`] - separable two-pass resample with a selectable
//!   [`Filter`], support widened when downscaling. Used by the transform scale
//!   step.
//!
//! All functions work on a single H,W,C frame and never clamp; callers clamp
//! where their contract asks for it.
//!
//! # Example
//!
//! ```rust
//! use imageops::resize::{resize_filtered, Filter};
//!
//! let src = vec![0.5f32; 16 * 16 * 3];
//! let dst = resize_filtered(&src, 16, 16, 3, 32, 8, Filter::Bicubic);
//! assert_eq!(dst.len(), 32 * 8 * 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::parallel::for_each_chunk;

/// Resampling filter for the transform scale and rotate steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Filter {
    /// Nearest neighbor.
    Nearest,
    /// Triangle filter.
    #[default]
    Bilinear,
    /// Keys cubic, a = -0.5.
    Bicubic,
}

impl Filter {
    /// Parses a filter name case-insensitively. Unknown names yield [`Filter::Bilinear`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "nearest" => Filter::Nearest,
            "bicubic" => Filter::Bicubic,
            _ => Filter::Bilinear,
        }
    }

    /// Support radius at scale 1.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Filter::Nearest => 0.5,
            Filter::Bilinear => 1.0,
            Filter::Bicubic => 2.0,
        }
    }

    /// Evaluates the filter kernel at `x`.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            Filter::Nearest => {
                if (-0.5..0.5).contains(&x) { 1.0 } else { 0.0 }
            }
            Filter::Bilinear => {
                let ax = x.abs();
                if ax < 1.0 { 1.0 - ax } else { 0.0 }
            }
            Filter::Bicubic => cubic_weight(x),
        }
    }
}

impl From<String> for Filter {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// Keys cubic convolution with a = -0.5.
#[inline]
fn cubic_weight(x: f32) -> f32 {
    const A: f32 = -0.5;
    let ax = x.abs();
    if ax < 1.0 {
        ((A + 2.0) * ax - (A + 3.0)) * ax * ax + 1.0
    } else if ax < 2.0 {
        (((ax - 5.0) * ax + 8.0) * ax - 4.0) * A
    } else {
        0.0
    }
}

/// Precomputed taps for one output coordinate.
#[derive(Debug, Clone)]
struct Taps {
    start: usize,
    weights: Vec<f32>,
}

/// Builds per-output-coordinate taps mapping `in_size` onto `out_size`.
fn build_taps(in_size: usize, out_size: usize, filter: Filter) -> Vec<Taps> {
    let scale = in_size as f32 / out_size as f32;

    if filter == Filter::Nearest {
        return (0..out_size)
            .map(|x| {
                let src = (((x as f32 + 0.5) * scale) as usize).min(in_size - 1);
                Taps { start: src, weights: vec![1.0] }
            })
            .collect();
    }

    let filter_scale = scale.max(1.0);
    let support = filter.support() * filter_scale;
    let inv = 1.0 / filter_scale;

    (0..out_size)
        .map(|x| {
            let center = (x as f32 + 0.5) * scale;
            let lo = ((center - support + 0.5).floor().max(0.0)) as usize;
            let hi = ((center + support + 0.5).floor() as usize).min(in_size);
            let lo = lo.min(hi.saturating_sub(1));

            let mut weights: Vec<f32> = (lo..hi)
                .map(|i| filter.weight((i as f32 - center + 0.5) * inv))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum.abs() > f32::EPSILON {
                for w in &mut weights {
                    *w /= sum;
                }
            } else {
                let nearest = (center as usize).min(in_size - 1);
                return Taps { start: nearest, weights: vec![1.0] };
            }
            Taps { start: lo, weights }
        })
        .collect()
}

/// Resamples a frame with `filter`, horizontal pass first.
///
/// Returns `dst_w * dst_h * channels` values.
pub fn resize_filtered(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
    filter: Filter,
) -> Vec<f32> {
    if src_w == dst_w && src_h == dst_h {
        return src.to_vec();
    }

    let htaps = build_taps(src_w, dst_w, filter);
    let mut temp = vec![0.0f32; dst_w * src_h * channels];
    for_each_chunk(&mut temp, dst_w * channels, |y, row| {
        let src_row = &src[y * src_w * channels..(y + 1) * src_w * channels];
        for (x, taps) in htaps.iter().enumerate() {
            for c in 0..channels {
                let mut acc = 0.0f32;
                for (k, w) in taps.weights.iter().enumerate() {
                    acc += src_row[(taps.start + k) * channels + c] * w;
                }
                row[x * channels + c] = acc;
            }
        }
    });

    let vtaps = build_taps(src_h, dst_h, filter);
    let mut dst = vec![0.0f32; dst_w * dst_h * channels];
    let stride = dst_w * channels;
    for_each_chunk(&mut dst, stride, |y, row| {
        let taps = &vtaps[y];
        for (k, w) in taps.weights.iter().enumerate() {
            let src_row = &temp[(taps.start + k) * stride..(taps.start + k + 1) * stride];
            for (d, s) in row.iter_mut().zip(src_row) {
                *d += s * w;
            }
        }
    });

    dst
}

/// Bilinear source coordinate and weight for one output index.
///
/// Half-pixel centers, negative positions clamped to 0, right tap clamped
/// to the last sample.
#[inline]
fn linear_tap(dst: usize, scale: f32, in_size: usize) -> (usize, usize, f32) {
    let pos = ((dst as f32 + 0.5) * scale - 0.5).max(0.0);
    let i0 = (pos as usize).min(in_size - 1);
    let i1 = (i0 + 1).min(in_size - 1);
    (i0, i1, pos - i0 as f32)
}

/// Bilinear resize of one frame to exactly `dst_w` × `dst_h`.
pub fn resize_bilinear(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<f32> {
    resize_bilinear_placed(src, src_w, src_h, channels, dst_w, dst_h, dst_w, dst_h, 0, 0)
}

/// Bilinear resize to `nw` × `nh`, written onto a zero `canvas_w` × `canvas_h`
/// canvas at offset (`off_x`, `off_y`).
///
/// Offsets may be negative, in which case the resized frame is cropped.
/// Only the visible window is ever evaluated, so a large resized size never
/// allocates.
#[allow(clippy::too_many_arguments)]
pub fn resize_bilinear_placed(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    nw: usize,
    nh: usize,
    canvas_w: usize,
    canvas_h: usize,
    off_x: i64,
    off_y: i64,
) -> Vec<f32> {
    let sx = src_w as f32 / nw as f32;
    let sy = src_h as f32 / nh as f32;
    let stride = canvas_w * channels;

    let xtaps: Vec<Option<(usize, usize, f32)>> = (0..canvas_w)
        .map(|cx| {
            let rx = cx as i64 - off_x;
            (rx >= 0 && (rx as usize) < nw).then(|| linear_tap(rx as usize, sx, src_w))
        })
        .collect();

    let mut dst = vec![0.0f32; stride * canvas_h];
    for_each_chunk(&mut dst, stride, |cy, row| {
        let ry = cy as i64 - off_y;
        if ry < 0 || ry as usize >= nh {
            return;
        }
        let (y0, y1, fy) = linear_tap(ry as usize, sy, src_h);
        let r0 = &src[y0 * src_w * channels..(y0 + 1) * src_w * channels];
        let r1 = &src[y1 * src_w * channels..(y1 + 1) * src_w * channels];
        for (cx, tap) in xtaps.iter().enumerate() {
            let Some((x0, x1, fx)) = *tap else { continue };
            for c in 0..channels {
                let top = r0[x0 * channels + c] * (1.0 - fx) + r0[x1 * channels + c] * fx;
                let bot = r1[x0 * channels + c] * (1.0 - fx) + r1[x1 * channels + c] * fx;
                row[cx * channels + c] = top * (1.0 - fy) + bot * fy;
            }
        }
    });
    dst
}
