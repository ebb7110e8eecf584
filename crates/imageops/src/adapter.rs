//! Input normalization.
//!
//! Every operator funnels its inputs through here:
//!
//! - [`select_source`] resolves the image/video aliasing
//! - [`squeeze_mask`] turns a host [`MaskTensor`] into an (N,H,W) [`MaskBatch`]
//! - [`prepare_mask`] additionally broadcasts/tiles to the target batch and
//!   resamples to the target size
//!
//! Mask squeeze rules:
//!
//! | input rank | interpretation |
//! |---|---|
//! | 0, 1 | rejected |
//! | 2 | (H,W), batch of one |
//! | 3 | (N,H,W) |
//! | 4 | (N,1,H,W) channel-first if axis 1 is 1, else (N,H,W,C) taking channel 0 |
//! | 5+ | leading axes flattened into N over the last two |

use imageops_core::{ImageBatch, MaskBatch, MaskTensor, OpsError, OpsResult, clamp01};
#[allow(unused_imports)]
use tracing::{debug, trace, warn};

use crate::resize::resize_bilinear;

/// Picks the frames to operate on. Video wins when both are given.
///
/// # Errors
///
/// [`OpsError::NoSource`] when neither input is present.
pub fn select_source<'a>(
    image: Option<&'a ImageBatch>,
    video: Option<&'a ImageBatch>,
) -> OpsResult<&'a ImageBatch> {
    match (video, image) {
        (Some(v), _) => Ok(v),
        (None, Some(i)) => Ok(i),
        (None, None) => Err(OpsError::NoSource),
    }
}

/// Squeezes a raw mask tensor to (N,H,W) without resampling.
///
/// Returns `Ok(None)` when the tensor's data does not match its declared
/// shape (logged) or when it holds zero masks.
///
/// # Errors
///
/// [`OpsError::InvalidInput`] for rank 0 or 1 tensors.
pub fn squeeze_mask(mask: &MaskTensor) -> OpsResult<Option<MaskBatch>> {
    let shape = mask.shape();
    if shape.len() < 2 {
        return Err(OpsError::invalid_input(format!(
            "mask must have at least 2 dimensions, got shape {:?}",
            shape
        )));
    }
    if !mask.is_consistent() {
        warn!(shape = ?shape, len = mask.data().len(), "mask tensor conversion failed; ignoring mask");
        return Ok(None);
    }

    let squeezed = match *shape {
        [h, w] => MaskBatch::from_data(1, h, w, mask.data().to_vec())?,
        [n, h, w] => MaskBatch::from_data(n, h, w, mask.data().to_vec())?,
        [n, 1, h, w] => MaskBatch::from_data(n, h, w, mask.data().to_vec())?,
        [n, h, w, c] => {
            if c == 0 {
                debug!("mask has zero channels; ignoring mask");
                return Ok(None);
            }
            let data = mask.data().iter().step_by(c).copied().collect();
            MaskBatch::from_data(n, h, w, data)?
        }
        _ => {
            let (h, w) = (shape[shape.len() - 2], shape[shape.len() - 1]);
            let n: usize = shape[..shape.len() - 2].iter().product();
            MaskBatch::from_data(n, h, w, mask.data().to_vec())?
        }
    };

    if squeezed.batch() == 0 {
        debug!("mask has zero frames; ignoring mask");
        return Ok(None);
    }
    if squeezed.height() == 0 || squeezed.width() == 0 {
        warn!(shape = ?shape, "mask has an empty spatial extent; ignoring mask");
        return Ok(None);
    }
    Ok(Some(squeezed))
}

/// Normalizes an optional mask to exactly `(batch, height, width)` in `[0, 1]`.
///
/// A single mask broadcasts; fewer masks than frames tile (frame `i` uses
/// mask `i mod n`); extra masks are dropped. Spatial mismatches are resolved
/// with bilinear resampling.
///
/// # Errors
///
/// [`OpsError::InvalidInput`] for rank 0 or 1 tensors.
pub fn prepare_mask(
    mask: Option<&MaskTensor>,
    batch: usize,
    height: usize,
    width: usize,
) -> OpsResult<Option<MaskBatch>> {
    let Some(mask) = mask else {
        return Ok(None);
    };
    let Some(squeezed) = squeeze_mask(mask)? else {
        return Ok(None);
    };

    let (n, mh, mw) = squeezed.shape();
    trace!(n, mh, mw, batch, height, width, "adapter::prepare_mask");

    let frame_len = height * width;
    let mut data = Vec::with_capacity(batch * frame_len);
    let resample = mh != height || mw != width;
    let mut cache: Vec<Option<Vec<f32>>> = vec![None; n.min(batch)];

    for i in 0..batch {
        let src = i % n;
        if resample {
            let slot = &mut cache[src];
            let frame = slot.get_or_insert_with(|| {
                resize_bilinear(squeezed.frame(src), mw, mh, 1, width, height)
            });
            data.extend_from_slice(frame);
        } else {
            data.extend_from_slice(squeezed.frame(src));
        }
    }

    for v in &mut data {
        *v = clamp01(*v);
    }
    Ok(Some(MaskBatch::from_data(batch, height, width, data)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn img(b: usize) -> ImageBatch {
        ImageBatch::filled(b, 2, 2, &[0.5, 0.5, 0.5]).unwrap()
    }

    #[test]
    fn video_wins() {
        let i = img(1);
        let v = img(3);
        assert_eq!(select_source(Some(&i), Some(&v)).unwrap().batch(), 3);
        assert_eq!(select_source(Some(&i), None).unwrap().batch(), 1);
        assert!(matches!(select_source(None, None), Err(OpsError::NoSource)));
    }

    #[test]
    fn rank_one_rejected() {
        let m = MaskTensor::new(vec![4], vec![0.0; 4]);
        assert!(matches!(prepare_mask(Some(&m), 1, 2, 2), Err(OpsError::InvalidInput(_))));
    }

    #[test]
    fn inconsistent_data_means_no_mask() {
        let m = MaskTensor::new(vec![2, 2], vec![0.0; 3]);
        assert!(prepare_mask(Some(&m), 1, 2, 2).unwrap().is_none());
    }

    #[test]
    fn empty_batch_means_no_mask() {
        let m = MaskTensor::new(vec![0, 2, 2], vec![]);
        assert!(prepare_mask(Some(&m), 3, 2, 2).unwrap().is_none());
    }

    #[test]
    fn two_d_broadcasts() {
        let m = MaskTensor::from_2d(2, 2, vec![0.0, 0.25, 0.5, 2.0]);
        let out = prepare_mask(Some(&m), 3, 2, 2).unwrap().unwrap();
        assert_eq!(out.shape(), (3, 2, 2));
        assert_eq!(out.frame(2), &[0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn tiles_modulo_and_truncates() {
        let m = MaskTensor::new(vec![2, 1, 1], vec![0.1, 0.9]);
        let out = prepare_mask(Some(&m), 5, 1, 1).unwrap().unwrap();
        assert_eq!(out.data(), &[0.1, 0.9, 0.1, 0.9, 0.1]);

        let m = MaskTensor::new(vec![4, 1, 1], vec![0.1, 0.2, 0.3, 0.4]);
        let out = prepare_mask(Some(&m), 2, 1, 1).unwrap().unwrap();
        assert_eq!(out.data(), &[0.1, 0.2]);
    }

    #[test]
    fn four_d_layouts() {
        // channel-first (N,1,H,W)
        let cf = MaskTensor::new(vec![1, 1, 1, 2], vec![0.2, 0.4]);
        assert_eq!(prepare_mask(Some(&cf), 1, 1, 2).unwrap().unwrap().data(), &[0.2, 0.4]);

        // channel-last (N,H,W,C): channel 0
        let cl = MaskTensor::new(vec![1, 2, 1, 3], vec![0.2, 9.0, 9.0, 0.4, 9.0, 9.0]);
        assert_eq!(prepare_mask(Some(&cl), 1, 2, 1).unwrap().unwrap().data(), &[0.2, 0.4]);

        // a unit axis 1 always reads as channel-first
        let ambiguous = MaskTensor::new(vec![1, 1, 2, 3], vec![0.0; 6]);
        assert_eq!(squeeze_mask(&ambiguous).unwrap().unwrap().shape(), (1, 2, 3));
    }

    #[test]
    fn five_d_flattens() {
        let m = MaskTensor::new(vec![2, 2, 1, 1, 1], vec![0.1, 0.2, 0.3, 0.4]);
        let sq = squeeze_mask(&m).unwrap().unwrap();
        assert_eq!(sq.shape(), (4, 1, 1));
    }

    #[test]
    fn resamples_to_target() {
        let m = MaskTensor::from_2d(1, 2, vec![0.0, 1.0]);
        let out = prepare_mask(Some(&m), 1, 1, 4).unwrap().unwrap();
        assert_abs_diff_eq!(out.data()[1], 0.25);
        assert_abs_diff_eq!(out.data()[2], 0.75);
    }
}
