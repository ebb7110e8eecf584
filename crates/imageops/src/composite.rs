//! Two-input merge.
//!
//! A is the background, B the foreground. Both are clamped to `[0, 1]`
//! first, the blend runs on RGB, and the result is mixed back over A:
//!
//! ```text
//! out_rgb = A * (1 - mix) + clamp01(blend(A, B)) * mix
//! ```
//!
//! Output alpha is A's alpha, except for [`MergeMode::Over`] with an RGBA
//! foreground where it becomes `Ba + Aa * (1 - Ba)`. The output always has
//! A's channel count.
//!
//! # Example
//!
//! ```rust
//! use imageops::{ImageBatch, OpsConfig};
//! use imageops::composite::{Merge, MergeMode};
//!
//! let a = ImageBatch::filled(1, 2, 2, &[0.2, 0.2, 0.2]).unwrap();
//! let b = ImageBatch::filled(1, 2, 2, &[0.5, 0.5, 0.5]).unwrap();
//! let merge = Merge { mode: MergeMode::Add, mix: 1.0 };
//! let out = merge.apply(&a, &b, None, &OpsConfig::default()).unwrap();
//! assert!((out.data()[0] - 0.7).abs() < 1e-6);
//! ```

use imageops_core::{ImageBatch, MaskTensor, OpsConfig, OpsError, OpsResult, clamp01};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::masked::composite_masked;
use crate::parallel::for_each_chunk;

/// Blend applied to the RGB channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MergeMode {
    /// B over A by B's alpha; B replaces A when B has no alpha.
    #[default]
    Over,
    /// `A + B`.
    Add,
    /// `A - B`.
    Subtract,
    /// `A * B`.
    Multiply,
    /// `1 - (1 - A)(1 - B)`.
    Screen,
    /// `|A - B|`.
    Difference,
    /// Per-channel maximum.
    Max,
    /// Per-channel minimum.
    Min,
    /// B as is. Unknown mode names land here.
    Replace,
}

impl MergeMode {
    /// Parses a mode name case-insensitively. Unknown names yield [`MergeMode::Replace`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "over" => Self::Over,
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            "difference" => Self::Difference,
            "max" => Self::Max,
            "min" => Self::Min,
            _ => Self::Replace,
        }
    }

    /// Blends one channel. `b_alpha` is B's alpha when B has one.
    #[inline]
    pub fn blend(&self, a: f32, b: f32, b_alpha: Option<f32>) -> f32 {
        match self {
            Self::Over => match b_alpha {
                Some(ba) => b * ba + a * (1.0 - ba),
                None => b,
            },
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Screen => 1.0 - (1.0 - a) * (1.0 - b),
            Self::Difference => (a - b).abs(),
            Self::Max => a.max(b),
            Self::Min => a.min(b),
            Self::Replace => b,
        }
    }
}

impl From<String> for MergeMode {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

/// Merges a foreground batch onto a background batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Merge {
    /// Blend mode.
    pub mode: MergeMode,
    /// Blend amount in `[0, 1]`; 0 returns A.
    pub mix: f32,
}

impl Default for Merge {
    fn default() -> Self {
        Self { mode: MergeMode::Over, mix: 1.0 }
    }
}

impl Merge {
    /// Merges `b` onto `a`, then composites through `mask` against `a`.
    ///
    /// A single-frame `b` is broadcast over every frame of `a`.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidInput`] when the sizes differ, when `b` has more
    /// than one frame and a different frame count than `a`, or when the mask
    /// tensor is rejected.
    pub fn apply(
        &self,
        a: &ImageBatch,
        b: &ImageBatch,
        mask: Option<&MaskTensor>,
        _cfg: &OpsConfig,
    ) -> OpsResult<ImageBatch> {
        let (ab, h, w, ac) = a.shape();
        let (bb, bh, bw, bc) = b.shape();
        if (bh, bw) != (h, w) {
            return Err(OpsError::invalid_input(format!(
                "merge inputs differ in size: A is {}x{}, B is {}x{}",
                w, h, bw, bh
            )));
        }
        if bb != ab && bb != 1 {
            return Err(OpsError::invalid_input(format!(
                "merge B batch {} does not match A batch {}",
                bb, ab
            )));
        }
        trace!(mode = ?self.mode, mix = self.mix, batch = ab, width = w, height = h, "composite::merge");

        let mix = self.mix;
        let mode = self.mode;
        let b_has_alpha = bc == 4;
        let a_data = a.data();
        let b_data = b.data();
        let b_frame_len = b.frame_len();

        let mut out = a.clone();
        let row_len = w * ac;
        for_each_chunk(out.data_mut(), row_len, |row, dst| {
            let (f, y) = (row / h, row % h);
            let a_row = &a_data[row * row_len..(row + 1) * row_len];
            let b_base = if bb == 1 { 0 } else { f * b_frame_len };
            let b_row = &b_data[b_base + y * w * bc..b_base + (y + 1) * w * bc];

            for x in 0..w {
                let ap = &a_row[x * ac..(x + 1) * ac];
                let bp = &b_row[x * bc..(x + 1) * bc];
                let ba = b_has_alpha.then(|| clamp01(bp[3]));
                let px = &mut dst[x * ac..(x + 1) * ac];
                for c in 0..3 {
                    let av = clamp01(ap[c]);
                    let blended = clamp01(mode.blend(av, clamp01(bp[c]), ba));
                    px[c] = clamp01(av * (1.0 - mix) + blended * mix);
                }
                if ac == 4 {
                    let aa = clamp01(ap[3]);
                    px[3] = match (mode, ba) {
                        (MergeMode::Over, Some(ba)) => clamp01(ba + aa * (1.0 - ba)),
                        _ => aa,
                    };
                }
            }
        });

        composite_masked(a, out, mask)
    }
}
