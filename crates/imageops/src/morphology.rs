//! Grayscale dilate/erode on masks.
//!
//! The structuring window is a `(2r + 1)` square clipped to the frame, so
//! the output keeps the input size and edges only see in-bounds samples.
//! A square max (or min) is separable, so the filter runs a horizontal
//! pass then a vertical pass.

use imageops_core::{MaskBatch, MaskTensor, OpsError, OpsResult, clamp01};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::adapter::squeeze_mask;
use crate::parallel::for_each_chunk;

/// Morphological operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MorphOp {
    /// Window maximum; grows bright regions.
    #[default]
    Dilate,
    /// Window minimum; shrinks bright regions.
    Erode,
}

impl MorphOp {
    /// Names starting with "dil" dilate, anything else erodes.
    pub fn from_name(name: &str) -> Self {
        if name.trim().to_ascii_lowercase().starts_with("dil") {
            Self::Dilate
        } else {
            Self::Erode
        }
    }

    #[inline]
    fn pick(self, a: f32, b: f32) -> f32 {
        match self {
            Self::Dilate => a.max(b),
            Self::Erode => a.min(b),
        }
    }
}

impl From<String> for MorphOp {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// Dilates or erodes a mask batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DilateErode {
    /// Operation.
    pub op: MorphOp,
    /// Window radius in pixels; 0 is the identity.
    pub radius: usize,
}

impl Default for DilateErode {
    fn default() -> Self {
        Self { op: MorphOp::Dilate, radius: 2 }
    }
}

impl DilateErode {
    /// Filters every frame of `mask`, clamping the result to `[0, 1]`.
    pub fn apply(&self, mask: &MaskBatch) -> MaskBatch {
        let (b, h, w) = mask.shape();
        trace!(op = ?self.op, radius = self.radius, batch = b, width = w, height = h, "morphology::apply");
        if self.radius == 0 {
            debug!("radius 0, mask unchanged");
            return mask.clone();
        }

        let r = self.radius;
        let op = self.op;
        let src = mask.data();

        let mut temp = vec![0.0f32; src.len()];
        for_each_chunk(&mut temp, w, |row, dst| {
            let line = &src[row * w..(row + 1) * w];
            for (x, d) in dst.iter_mut().enumerate() {
                let lo = x.saturating_sub(r);
                let hi = (x + r).min(w - 1);
                *d = line[lo..=hi].iter().copied().fold(line[x], |acc, v| op.pick(acc, v));
            }
        });

        let mut out = mask.clone();
        for_each_chunk(out.data_mut(), w, |row, dst| {
            let (f, y) = (row / h, row % h);
            let frame = &temp[f * h * w..(f + 1) * h * w];
            let lo = y.saturating_sub(r);
            let hi = (y + r).min(h - 1);
            dst.copy_from_slice(&frame[y * w..(y + 1) * w]);
            for yy in lo..=hi {
                for (d, v) in dst.iter_mut().zip(&frame[yy * w..(yy + 1) * w]) {
                    *d = op.pick(*d, *v);
                }
            }
            for d in dst.iter_mut() {
                *d = clamp01(*d);
            }
        });
        out
    }

    /// Squeezes a raw host tensor to (N,H,W) and filters it.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidInput`] when the tensor has rank below 2 or cannot
    /// be interpreted as masks.
    pub fn apply_tensor(&self, mask: &MaskTensor) -> OpsResult<MaskBatch> {
        let batch = squeeze_mask(mask)?.ok_or_else(|| {
            OpsError::invalid_input(format!("mask tensor {:?} holds no usable masks", mask.shape()))
        })?;
        Ok(self.apply(&batch))
    }
}
