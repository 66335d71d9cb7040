//! Rotator
use crate::ComputationStatus;
use num_complex::Complex32;
use std::f64::consts::PI;

/// Complex mixer with settable frequency and phase.
///
/// Frequencies are given in radians per sample. Every mix operation applies the
/// current phase to the sample and then advances the phase by one step.
pub trait Mixer: Send {
    /// Set the phase increment in radians per sample.
    fn set_frequency(&mut self, radians_per_sample: f64);
    /// Current phase increment in radians per sample.
    fn frequency(&self) -> f64;
    /// Set the current phase in radians.
    fn set_phase(&mut self, phase: f64);
    /// Current phase in radians, wrapped to `[-π, π)`.
    fn phase(&self) -> f64;
    /// Shift one sample up by the current frequency.
    fn mix_up(&mut self, sample: Complex32) -> Complex32;
    /// Shift one sample down by the current frequency.
    fn mix_down(&mut self, sample: Complex32) -> Complex32;

    /// Shift a buffer up, returning the number of samples written.
    fn mix_up_block(
        &mut self,
        input: &[Complex32],
        output: &mut [Complex32],
    ) -> (usize, ComputationStatus) {
        let (n, status) = ComputationStatus::from_lengths(input.len(), output.len());
        for (i, o) in input.iter().zip(output.iter_mut()) {
            *o = self.mix_up(*i);
        }
        (n, status)
    }

    /// Shift a buffer down, returning the number of samples written.
    fn mix_down_block(
        &mut self,
        input: &[Complex32],
        output: &mut [Complex32],
    ) -> (usize, ComputationStatus) {
        let (n, status) = ComputationStatus::from_lengths(input.len(), output.len());
        for (i, o) in input.iter().zip(output.iter_mut()) {
            *o = self.mix_down(*i);
        }
        (n, status)
    }
}

/// Rotate Complex32
///
/// Phase-accumulator NCO. The phase is kept in `f64` so long streams do not drift.
#[derive(Clone, Debug, Default)]
pub struct Rotator {
    phase_incr: f64,
    phase: f64,
}

impl Rotator {
    /// Create Rotator
    pub fn new(phase_incr: f64) -> Self {
        Self {
            phase_incr,
            phase: 0.0,
        }
    }

    #[inline]
    fn phasor(&self) -> Complex32 {
        Complex32::from_polar(1.0, self.phase as f32)
    }

    #[inline]
    fn step(&mut self) {
        self.phase = wrap_phase(self.phase + self.phase_incr);
    }
}

impl Mixer for Rotator {
    fn set_frequency(&mut self, radians_per_sample: f64) {
        self.phase_incr = radians_per_sample;
    }

    fn frequency(&self) -> f64 {
        self.phase_incr
    }

    fn set_phase(&mut self, phase: f64) {
        self.phase = wrap_phase(phase);
    }

    fn phase(&self) -> f64 {
        self.phase
    }

    fn mix_up(&mut self, sample: Complex32) -> Complex32 {
        let out = sample * self.phasor();
        self.step();
        out
    }

    fn mix_down(&mut self, sample: Complex32) -> Complex32 {
        let out = sample * self.phasor().conj();
        self.step();
        out
    }
}

/// Wrap a phase to `[-π, π)`.
pub fn wrap_phase(phase: f64) -> f64 {
    if (-PI..PI).contains(&phase) {
        return phase;
    }
    let wrapped = (phase + PI).rem_euclid(2.0 * PI) - PI;
    if !wrapped.is_finite() {
        warn!("non-finite phase {phase}, resetting to zero");
        return 0.0;
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn up_then_down_cancels() {
        let incr = 2.0 * PI * 1500.0 / 12000.0;
        let mut up = Rotator::new(incr);
        let mut down = Rotator::new(incr);
        for n in 0..10_000 {
            let x = Complex32::new(1.0, (n % 7) as f32 * 0.1);
            let y = down.mix_down(up.mix_up(x));
            assert_approx_eq!(f32, y.re, x.re, epsilon = 1e-4);
            assert_approx_eq!(f32, y.im, x.im, epsilon = 1e-4);
        }
    }

    #[test]
    fn first_sample_uses_current_phase() {
        let mut r = Rotator::new(0.3);
        r.set_phase(0.0);
        let y = r.mix_up(Complex32::new(1.0, 0.0));
        assert_approx_eq!(f32, y.re, 1.0);
        assert_approx_eq!(f32, y.im, 0.0);
        assert_approx_eq!(f64, r.phase(), 0.3);
    }

    #[test]
    fn phase_stays_bounded() {
        let mut r = Rotator::new(2.9);
        let input = vec![Complex32::new(1.0, 0.0); 100_000];
        let mut output = vec![Complex32::new(0.0, 0.0); input.len()];
        let (n, status) = r.mix_down_block(&input, &mut output);
        assert_eq!(n, input.len());
        assert_eq!(status, ComputationStatus::BothSufficient);
        assert!((-PI..PI).contains(&r.phase()));
        for v in output {
            assert_approx_eq!(f32, v.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn block_reports_insufficient_output() {
        let mut r = Rotator::new(0.1);
        let input = [Complex32::new(1.0, 0.0); 8];
        let mut output = [Complex32::new(0.0, 0.0); 5];
        let (n, status) = r.mix_up_block(&input, &mut output);
        assert_eq!(n, 5);
        assert_eq!(status, ComputationStatus::InsufficientOutput);
    }
}
