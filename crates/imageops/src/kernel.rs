//! Separable gaussian kernels and border index mapping.
//!
//! Kernels are built per call and never cached. Weights are computed in
//! `f32` and normalized to sum to 1.
//!
//! # Example
//!
//! ```rust
//! use imageops::kernel::Kernel;
//!
//! let k = Kernel::gaussian(2, 1.0, 1e-6);
//! assert_eq!(k.weights().len(), 5);
//! assert!((k.weights().iter().sum::<f32>() - 1.0).abs() < 1e-6);
//! ```

/// 1-D normalized convolution kernel of length `2 * radius + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f32>,
    radius: usize,
}

impl Kernel {
    /// The `[1]` kernel.
    pub fn identity() -> Self {
        Self { weights: vec![1.0], radius: 0 }
    }

    /// Gaussian kernel sampled at integer offsets in `[-radius, radius]`.
    ///
    /// `sigma` is floored at `eps`. Radius 0 yields the identity.
    pub fn gaussian(radius: usize, sigma: f32, eps: f32) -> Self {
        if radius == 0 {
            return Self::identity();
        }
        let sigma = if sigma.is_nan() { eps } else { sigma.max(eps) };
        let two_sigma2 = 2.0 * sigma * sigma;
        let r = radius as isize;

        let mut weights: Vec<f32> = (-r..=r)
            .map(|x| {
                let x = x as f32;
                (-(x * x) / two_sigma2).exp()
            })
            .collect();

        // center tap is exp(0) = 1, so sum >= 1
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Self { weights, radius }
    }

    /// Half-width of the kernel.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Kernel taps, center at index `radius`.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// True for the `[1]` kernel.
    pub fn is_identity(&self) -> bool {
        self.radius == 0
    }
}

/// Mirrors `i` into `[0, n)` without repeating the edge sample.
///
/// Offsets further than one period fold back and forth; `n == 1` always
/// maps to 0.
#[inline]
pub fn reflect_index(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let m = i.rem_euclid(period);
    (if m < n { m } else { period - m }) as usize
}

/// Clamps `i` into `[0, n)`.
#[inline]
pub fn replicate_index(i: isize, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    i.clamp(0, n as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gaussian_is_normalized_and_symmetric() {
        let k = Kernel::gaussian(4, 2.0, 1e-6);
        let w = k.weights();
        assert_eq!(w.len(), 9);
        assert_abs_diff_eq!(w.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        for i in 0..4 {
            assert_abs_diff_eq!(w[i], w[8 - i], epsilon = 1e-7);
        }
        assert!(w[4] > w[3]);
    }

    #[test]
    fn radius_zero_is_identity() {
        let k = Kernel::gaussian(0, 3.0, 1e-6);
        assert!(k.is_identity());
        assert_eq!(k.weights(), &[1.0]);
    }

    #[test]
    fn tiny_sigma_collapses_to_center() {
        let k = Kernel::gaussian(2, 0.0, 1e-6);
        assert_eq!(k.weights(), &[0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn reflect_without_edge_repeat() {
        // n = 4: ... 2 1 | 0 1 2 3 | 2 1 0 ...
        assert_eq!(reflect_index(-1, 4), 1);
        assert_eq!(reflect_index(-2, 4), 2);
        assert_eq!(reflect_index(4, 4), 2);
        assert_eq!(reflect_index(5, 4), 1);
        assert_eq!(reflect_index(6, 4), 0);
        assert_eq!(reflect_index(7, 4), 1);
        assert_eq!(reflect_index(-7, 4), 1);
        assert_eq!(reflect_index(3, 1), 0);
    }

    #[test]
    fn replicate_clamps() {
        assert_eq!(replicate_index(-3, 5), 0);
        assert_eq!(replicate_index(9, 5), 4);
        assert_eq!(replicate_index(2, 5), 2);
    }
}
