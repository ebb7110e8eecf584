//! Per-pixel helpers shared by the engines.

/// Clamps a value to `[0, 1]`.
///
/// NaN maps to 0 so a poisoned sample never escapes an operator.
#[inline]
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Weighted RGB luma.
///
/// # Example
///
/// ```rust
/// use imageops_core::luma;
///
/// let y = luma([1.0, 1.0, 1.0], [0.2126, 0.7152, 0.0722]);
/// assert!((y - 1.0).abs() < 1e-6);
/// ```
#[inline]
pub fn luma(rgb: [f32; 3], weights: [f32; 3]) -> f32 {
    rgb[0] * weights[0] + rgb[1] * weights[1] + rgb[2] * weights[2]
}
