//! Masked composite applied after every image operator.
//!
//! `out = original * (1 - mask) + processed * mask`, per channel, alpha
//! included. Without a mask the processed batch is returned as is.

use imageops_core::{ImageBatch, MaskTensor, OpsError, OpsResult};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::adapter::prepare_mask;
use crate::parallel::for_each_chunk;

/// Blends `processed` over `original` through an optional host mask.
///
/// # Errors
///
/// - [`OpsError::InvalidInput`] if a usable mask is present and the two
///   batches differ in shape, or the mask tensor has rank 0 or 1.
pub fn composite_masked(
    original: &ImageBatch,
    processed: ImageBatch,
    mask: Option<&MaskTensor>,
) -> OpsResult<ImageBatch> {
    let (b, h, w, c) = original.shape();
    let Some(m) = prepare_mask(mask, b, h, w)? else {
        return Ok(processed);
    };
    if original.shape() != processed.shape() {
        return Err(OpsError::invalid_input(format!(
            "masked composite needs matching shapes, original {:?} vs processed {:?}",
            original.shape(),
            processed.shape()
        )));
    }
    trace!(batch = b, width = w, height = h, "masked::composite");

    let orig = original.data();
    let weights = m.data();
    let mut out = processed;
    let row_len = w * c;
    for_each_chunk(out.data_mut(), row_len, |row, dst| {
        let base = row * row_len;
        let mrow = &weights[row * w..(row + 1) * w];
        for (x, &mv) in mrow.iter().enumerate() {
            for ch in 0..c {
                let i = x * c + ch;
                dst[i] = orig[base + i] * (1.0 - mv) + dst[i] * mv;
            }
        }
    });
    Ok(out)
}
