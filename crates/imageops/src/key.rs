//! Luma keyer.

use imageops_core::{ImageBatch, MaskBatch, OpsConfig, OpsResult, clamp01, luma};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::adapter::select_source;
use crate::parallel::map_pixels;

/// Hermite smoothstep with an epsilon-guarded denominator.
#[inline]
pub fn smoothstep(a: f32, b: f32, t: f32, eps: f32) -> f32 {
    let s = clamp01((t - a) / (b - a + eps));
    s * s * (3.0 - 2.0 * s)
}

/// Keys the band of luma between `low` and `high`.
///
/// Both edges are softened by `softness` on either side. With zero softness
/// the edges become hard steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LumaKey {
    /// Lower edge of the keyed band.
    pub low: f32,
    /// Upper edge of the keyed band.
    pub high: f32,
    /// Half-width of each soft edge; negative values act as 0.
    pub softness: f32,
}

impl Default for LumaKey {
    fn default() -> Self {
        Self { low: 0.1, high: 0.9, softness: 0.05 }
    }
}

impl LumaKey {
    /// Key value for one luma sample.
    #[inline]
    pub fn key(&self, y: f32, eps: f32) -> f32 {
        let soft = self.softness.max(0.0);
        let (low1, low2, high1, high2) = if soft > 0.0 {
            (self.low - soft, self.low + soft, self.high - soft, self.high + soft)
        } else {
            (self.low, self.low, self.high, self.high)
        };
        let m_low = smoothstep(low1, low2, y, eps);
        let m_high = 1.0 - smoothstep(high1, high2, y, eps);
        clamp01(m_low * m_high)
    }

    /// Builds a mask from the selected source, one per frame.
    ///
    /// # Errors
    ///
    /// [`imageops_core::OpsError::NoSource`] when neither input is given.
    pub fn apply(
        &self,
        image: Option<&ImageBatch>,
        video: Option<&ImageBatch>,
        cfg: &OpsConfig,
    ) -> OpsResult<MaskBatch> {
        let src = select_source(image, video)?;
        let (b, h, w, c) = src.shape();
        trace!(low = self.low, high = self.high, softness = self.softness, batch = b, "key::luma");

        let weights = cfg.luma_weights;
        let eps = cfg.epsilon;
        let data = map_pixels(src.data(), c, 1, |px, out| {
            let rgb = [clamp01(px[0]), clamp01(px[1]), clamp01(px[2])];
            out[0] = self.key(clamp01(luma(rgb, weights)), eps);
        });
        MaskBatch::from_data(b, h, w, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use imageops_core::OpsError;

    fn gray(v: f32) -> ImageBatch {
        ImageBatch::filled(1, 2, 2, &[v, v, v]).unwrap()
    }

    #[test]
    fn smoothstep_shape() {
        assert_abs_diff_eq!(smoothstep(0.0, 1.0, -1.0, 1e-6), 0.0);
        assert_abs_diff_eq!(smoothstep(0.0, 1.0, 0.5, 1e-6), 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(smoothstep(0.0, 1.0, 2.0, 1e-6), 1.0);
    }

    #[test]
    fn hard_band() {
        let key = LumaKey { low: 0.4, high: 0.6, softness: 0.0 };
        let cfg = OpsConfig::default();
        let inside = key.apply(Some(&gray(0.5)), None, &cfg).unwrap();
        assert!(inside.data().iter().all(|v| (v - 1.0).abs() < 1e-5));
        let below = key.apply(Some(&gray(0.2)), None, &cfg).unwrap();
        assert!(below.data().iter().all(|v| *v == 0.0));
        let above = key.apply(Some(&gray(0.8)), None, &cfg).unwrap();
        assert!(above.data().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn soft_edges_ramp() {
        let key = LumaKey { low: 0.3, high: 0.7, softness: 0.1 };
        let eps = 1e-6;
        assert_abs_diff_eq!(key.key(0.3, eps), 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(key.key(0.5, eps), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(key.key(0.7, eps), 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(key.key(0.1, eps), 0.0);
    }

    #[test]
    fn negative_softness_is_hard() {
        let key = LumaKey { low: 0.4, high: 0.6, softness: -1.0 };
        assert_abs_diff_eq!(key.key(0.5, 1e-6), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(key.key(0.3, 1e-6), 0.0);
    }

    #[test]
    fn mask_per_frame_and_video_preferred() {
        let img = gray(0.5);
        let video = ImageBatch::filled(3, 2, 4, &[0.0, 0.0, 0.0, 1.0]).unwrap();
        let m = LumaKey::default().apply(Some(&img), Some(&video), &OpsConfig::default()).unwrap();
        assert_eq!(m.shape(), (3, 2, 4));
        assert!(m.data().iter().all(|v| *v == 0.0));
        assert!(matches!(
            LumaKey::default().apply(None, None, &OpsConfig::default()),
            Err(OpsError::NoSource)
        ));
    }
}
