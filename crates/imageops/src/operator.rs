//! Operator trait and the serializable operator enum.
//!
//! Every image-to-image operator implements [`ImageOp`]. Its provided
//! [`ImageOp::apply`] is the full call contract:
//!
//! 1. pick the source ([`select_source`]: video wins over image)
//! 2. return the source untouched when the operator is bypassed
//! 3. [`ImageOp::process`] the source
//! 4. blend the result back through the optional mask ([`composite_masked`])
//!
//! [`Operator`] wraps every image operator in one tagged enum so a host can
//! hold heterogeneous parameter sets, e.g. deserialized from JSON:
//!
//! ```rust
//! use imageops::{ImageBatch, ImageOp, Operator, OpsConfig};
//!
//! let op: Operator = serde_json::from_str(r#"{"op": "invert"}"#).unwrap();
//! let img = ImageBatch::filled(1, 2, 2, &[0.25, 0.5, 1.0]).unwrap();
//! let out = op.apply(Some(&img), None, None, &OpsConfig::default()).unwrap();
//! assert_eq!(out.pixel(0, 0, 0), &[0.75, 0.5, 0.0]);
//! ```

use imageops_core::{ImageBatch, MaskTensor, OpsConfig, OpsResult};
use serde::{Deserialize, Serialize};

use crate::adapter::select_source;
use crate::color::{Clamp, ColorAdjust, ColorCorrect, HueSat, Invert, Levels};
use crate::filter::{Blur, EdgeDetect, Glow, Sharpen};
use crate::geometry::CropReformat;
use crate::masked::composite_masked;
use crate::transform::Transform;

/// Stateless image-to-image operator.
pub trait ImageOp: Send + Sync {
    /// Short operator name used in logs.
    fn name(&self) -> &'static str;

    /// True when the operator should pass its source through untouched.
    fn bypassed(&self) -> bool {
        false
    }

    /// Transforms one source batch. Never sees the mask.
    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch>;

    /// Runs the operator with source selection, bypass and masked composite.
    ///
    /// # Errors
    ///
    /// - [`imageops_core::OpsError::NoSource`] if both `image` and `video` are `None`
    /// - whatever [`ImageOp::process`] or the masked composite report
    fn apply(
        &self,
        image: Option<&ImageBatch>,
        video: Option<&ImageBatch>,
        mask: Option<&MaskTensor>,
        cfg: &OpsConfig,
    ) -> OpsResult<ImageBatch> {
        let src = select_source(image, video)?;
        if self.bypassed() {
            tracing::debug!(op = self.name(), "bypassed");
            return Ok(src.clone());
        }
        let processed = self.process(src, cfg)?;
        composite_masked(src, processed, mask)
    }
}

/// Any image-to-image operator with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operator {
    /// Brightness, contrast, gamma, saturation.
    ColorCorrect(ColorCorrect),
    /// Color correct followed by hue/sat/value, with bypass.
    ColorAdjust(ColorAdjust),
    /// Input/output levels with gamma.
    Levels(Levels),
    /// Hue rotation, saturation and value scaling.
    HueSat(HueSat),
    /// RGB inversion, optional alpha.
    Invert(Invert),
    /// Range clamp.
    Clamp(Clamp),
    /// Separable gaussian blur.
    Blur(Blur),
    /// Unsharp mask.
    Sharpen(Sharpen),
    /// Sobel magnitude on luma.
    EdgeDetect(EdgeDetect),
    /// Thresholded bloom.
    Glow(Glow),
    /// Crop, pad and reformat.
    CropReformat(CropReformat),
    /// Scale, rotate, translate.
    Transform(Transform),
}

impl Operator {
    fn inner(&self) -> &dyn ImageOp {
        match self {
            Operator::ColorCorrect(op) => op,
            Operator::ColorAdjust(op) => op,
            Operator::Levels(op) => op,
            Operator::HueSat(op) => op,
            Operator::Invert(op) => op,
            Operator::Clamp(op) => op,
            Operator::Blur(op) => op,
            Operator::Sharpen(op) => op,
            Operator::EdgeDetect(op) => op,
            Operator::Glow(op) => op,
            Operator::CropReformat(op) => op,
            Operator::Transform(op) => op,
        }
    }
}

impl ImageOp for Operator {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn bypassed(&self) -> bool {
        self.inner().bypassed()
    }

    fn process(&self, src: &ImageBatch, cfg: &OpsConfig) -> OpsResult<ImageBatch> {
        self.inner().process(src, cfg)
    }
}
