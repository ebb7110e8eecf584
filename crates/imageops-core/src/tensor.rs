//! Raw mask tensors as handed over by a host.
//!
//! Hosts pass masks in whatever layout their graph produced: `(H,W)`,
//! `(N,H,W)`, channel-first `(N,1,H,W)`, channel-last `(N,H,W,1)` or even
//! `(N,H,W,C)`. [`MaskTensor`] carries that shape untouched; only the
//! adapter in `imageops` interprets it and squeezes it to a [`MaskBatch`].
//!
//! Construction never fails. A shape whose element count disagrees with the
//! data is detected later and treated as a failed conversion.

use crate::MaskBatch;

/// Shape-tagged flat mask data.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl MaskTensor {
    /// Wraps `data` with a declared `shape`.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<f32>) -> Self {
        Self { shape: shape.into(), data }
    }

    /// Single `(H,W)` mask.
    pub fn from_2d(height: usize, width: usize, data: Vec<f32>) -> Self {
        Self::new(vec![height, width], data)
    }

    /// Declared shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Flat data.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// True when the declared shape accounts for exactly `data.len()` values.
    pub fn is_consistent(&self) -> bool {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .is_some_and(|n| n == self.data.len())
    }
}

impl From<MaskBatch> for MaskTensor {
    fn from(mask: MaskBatch) -> Self {
        let (b, h, w) = mask.shape();
        Self::new(vec![b, h, w], mask.into_data())
    }
}

impl From<&MaskBatch> for MaskTensor {
    fn from(mask: &MaskBatch) -> Self {
        let (b, h, w) = mask.shape();
        Self::new(vec![b, h, w], mask.data().to_vec())
    }
}
