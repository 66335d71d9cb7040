//! Interpolators
use num_complex::Complex32;

/// Pulse-shaping interpolator producing `factor()` output samples per input symbol.
///
/// Stands in for the root-raised-cosine interpolating filter, which lives outside
/// the hopping core.
pub trait Interpolator: Send {
    /// Output samples per input symbol.
    fn factor(&self) -> usize;
    /// Interpolate one symbol into `output[..factor()]`.
    fn interpolate(&mut self, symbol: Complex32, output: &mut [Complex32]);
    /// Clear the filter state between frames.
    fn reset(&mut self) {}
}

/// Rectangular pulse: each symbol is held for `factor` samples.
#[derive(Clone, Debug)]
pub struct HoldInterpolator {
    factor: usize,
}

impl HoldInterpolator {
    /// Create an interpolator with the given oversampling factor.
    ///
    /// # Panics
    /// Panics if `factor` is zero.
    pub fn new(factor: usize) -> Self {
        assert!(factor > 0, "interpolation factor must be positive");
        Self { factor }
    }
}

impl Interpolator for HoldInterpolator {
    fn factor(&self) -> usize {
        self.factor
    }

    fn interpolate(&mut self, symbol: Complex32, output: &mut [Complex32]) {
        output[..self.factor].fill(symbol);
    }
}
