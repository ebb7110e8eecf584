//! Batched frame buffers.
//!
//! - [`ImageBatch`] - B×H×W×C float frames, C = 3 (RGB) or 4 (RGBA)
//! - [`MaskBatch`] - B×H×W single-channel float masks
//!
//! Both are plain owned buffers. Operators never mutate their inputs; each
//! call returns a freshly allocated batch.
//!
//! # Example
//!
//! ```rust
//! use imageops_core::ImageBatch;
//!
//! let img = ImageBatch::filled(2, 4, 8, &[0.5, 0.25, 1.0, 1.0]).unwrap();
//! assert_eq!(img.shape(), (2, 4, 8, 4));
//! assert!(img.has_alpha());
//! assert_eq!(img.frame(1).len(), 4 * 8 * 4);
//! ```

use crate::{OpsError, OpsResult};

fn checked_len(dims: &[usize]) -> OpsResult<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| OpsError::invalid_input(format!("shape {:?} overflows", dims)))
}

/// Batch of RGB or RGBA frames sharing one size.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    data: Vec<f32>,
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
}

impl ImageBatch {
    /// Creates a zero-filled batch.
    pub fn zeros(batch: usize, height: usize, width: usize, channels: usize) -> OpsResult<Self> {
        Self::check_shape(batch, height, width, channels)?;
        let len = checked_len(&[batch, height, width, channels])?;
        Ok(Self { data: vec![0.0; len], batch, height, width, channels })
    }

    /// Wraps existing B,H,W,C data.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidInput`] if the shape is empty, the channel count is
    /// not 3 or 4, or `data.len()` does not match the shape.
    pub fn from_data(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> OpsResult<Self> {
        Self::check_shape(batch, height, width, channels)?;
        let expected = checked_len(&[batch, height, width, channels])?;
        if data.len() != expected {
            return Err(OpsError::invalid_input(format!(
                "expected {} values for {}x{}x{}x{}, got {}",
                expected,
                batch,
                height,
                width,
                channels,
                data.len()
            )));
        }
        Ok(Self { data, batch, height, width, channels })
    }

    /// Creates a batch where every pixel equals `pixel`.
    pub fn filled(batch: usize, height: usize, width: usize, pixel: &[f32]) -> OpsResult<Self> {
        let channels = pixel.len();
        Self::check_shape(batch, height, width, channels)?;
        let count = checked_len(&[batch, height, width])?;
        let mut data = Vec::with_capacity(count * channels);
        for _ in 0..count {
            data.extend_from_slice(pixel);
        }
        Ok(Self { data, batch, height, width, channels })
    }

    /// Builds a batch by evaluating `f(frame, y, x)` for every pixel.
    pub fn from_fn<F>(
        batch: usize,
        height: usize,
        width: usize,
        channels: usize,
        mut f: F,
    ) -> OpsResult<Self>
    where
        F: FnMut(usize, usize, usize) -> Vec<f32>,
    {
        let mut out = Self::zeros(batch, height, width, channels)?;
        for b in 0..batch {
            for y in 0..height {
                for x in 0..width {
                    let px = f(b, y, x);
                    let idx = ((b * height + y) * width + x) * channels;
                    for c in 0..channels.min(px.len()) {
                        out.data[idx + c] = px[c];
                    }
                }
            }
        }
        Ok(out)
    }

    fn check_shape(batch: usize, height: usize, width: usize, channels: usize) -> OpsResult<()> {
        if batch == 0 || height == 0 || width == 0 {
            return Err(OpsError::invalid_input(format!(
                "image batch must be non-empty, got {}x{}x{}",
                batch, height, width
            )));
        }
        if channels != 3 && channels != 4 {
            return Err(OpsError::invalid_input(format!(
                "image batch needs 3 or 4 channels, got {}",
                channels
            )));
        }
        Ok(())
    }

    /// Number of frames.
    #[inline]
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Channels per pixel (3 or 4).
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(batch, height, width, channels)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.height, self.width, self.channels)
    }

    /// True for RGBA batches.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Number of floats in one frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// Raw B,H,W,C data.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the batch, returning its buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// One frame as H,W,C data.
    ///
    /// # Panics
    ///
    /// Panics if `index >= batch`.
    pub fn frame(&self, index: usize) -> &[f32] {
        let len = self.frame_len();
        &self.data[index * len..(index + 1) * len]
    }

    /// Iterates frames in order.
    pub fn frames(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.frame_len())
    }

    /// Returns the pixel at `(frame, y, x)`.
    #[inline]
    pub fn pixel(&self, frame: usize, y: usize, x: usize) -> &[f32] {
        let idx = ((frame * self.height + y) * self.width + x) * self.channels;
        &self.data[idx..idx + self.channels]
    }

    /// Copy with every value clamped to `[0, 1]`.
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        for v in &mut out.data {
            *v = crate::clamp01(*v);
        }
        out
    }

    /// True when every value lies in `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        self.data.iter().all(|v| (0.0..=1.0).contains(v))
    }
}

/// Batch of single-channel masks sharing one size.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskBatch {
    data: Vec<f32>,
    batch: usize,
    height: usize,
    width: usize,
}

impl MaskBatch {
    /// Creates a zero-filled mask batch.
    pub fn zeros(batch: usize, height: usize, width: usize) -> OpsResult<Self> {
        Self::filled(batch, height, width, 0.0)
    }

    /// Creates a mask batch with a constant value.
    pub fn filled(batch: usize, height: usize, width: usize, value: f32) -> OpsResult<Self> {
        let len = checked_len(&[batch, height, width])?;
        Ok(Self { data: vec![value; len], batch, height, width })
    }

    /// Wraps existing B,H,W data.
    pub fn from_data(batch: usize, height: usize, width: usize, data: Vec<f32>) -> OpsResult<Self> {
        let expected = checked_len(&[batch, height, width])?;
        if data.len() != expected {
            return Err(OpsError::invalid_input(format!(
                "expected {} mask values for {}x{}x{}, got {}",
                expected,
                batch,
                height,
                width,
                data.len()
            )));
        }
        Ok(Self { data, batch, height, width })
    }

    /// Number of masks.
    #[inline]
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Mask height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Mask width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// `(batch, height, width)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.batch, self.height, self.width)
    }

    /// Number of floats in one mask.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.height * self.width
    }

    /// Raw B,H,W data.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the batch, returning its buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// One mask as H,W data.
    pub fn frame(&self, index: usize) -> &[f32] {
        let len = self.frame_len();
        &self.data[index * len..(index + 1) * len]
    }

    /// Value at `(frame, y, x)`.
    #[inline]
    pub fn value(&self, frame: usize, y: usize, x: usize) -> f32 {
        self.data[(frame * self.height + y) * self.width + x]
    }

    /// Copy with every value clamped to `[0, 1]`.
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        for v in &mut out.data {
            *v = crate::clamp01(*v);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_data_validates_len() {
        assert!(ImageBatch::from_data(1, 2, 2, 3, vec![0.0; 12]).is_ok());
        assert!(ImageBatch::from_data(1, 2, 2, 3, vec![0.0; 11]).is_err());
    }

    #[test]
    fn rejects_bad_channels() {
        assert!(ImageBatch::zeros(1, 2, 2, 2).is_err());
        assert!(ImageBatch::zeros(1, 2, 2, 5).is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(ImageBatch::zeros(0, 2, 2, 3).is_err());
        assert!(ImageBatch::zeros(1, 0, 2, 3).is_err());
    }

    #[test]
    fn frames_and_pixels() {
        let img = ImageBatch::from_fn(2, 2, 3, 3, |b, y, x| vec![b as f32, y as f32, x as f32]).unwrap();
        assert_eq!(img.frames().count(), 2);
        assert_eq!(img.pixel(1, 1, 2), &[1.0, 1.0, 2.0]);
        assert_eq!(img.frame(1)[0], 1.0);
    }

    #[test]
    fn clamped_normalizes() {
        let img = ImageBatch::from_data(1, 1, 1, 3, vec![-1.0, 0.5, 2.0]).unwrap();
        assert!(!img.is_normalized());
        let c = img.clamped();
        assert_eq!(c.data(), &[0.0, 0.5, 1.0]);
        assert!(c.is_normalized());
    }

    #[test]
    fn mask_value_indexing() {
        let mut m = MaskBatch::zeros(2, 2, 2).unwrap();
        m.data_mut()[4 + 3] = 0.75;
        assert_eq!(m.value(1, 1, 1), 0.75);
        assert_eq!(m.frame(1).len(), 4);
    }
}
