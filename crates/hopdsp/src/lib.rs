//! Signal processing primitives used by the hoplink stages.
//!
//! The hopping core treats these as black boxes: a [`Mixer`] that shifts a complex
//! baseband stream by a settable frequency and phase, a PSK [`Constellation`], and an
//! [`Interpolator`] standing in for the pulse-shaping filter.
#![warn(missing_docs)]

#[macro_use]
extern crate tracing;

pub use num_complex;

pub use constellation::Constellation;
pub use interpolator::HoldInterpolator;
pub use interpolator::Interpolator;
pub use rotator::Mixer;
pub use rotator::Rotator;

pub mod constellation;
pub mod interpolator;
pub mod rotator;

/// Represents the status of a computation.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ComputationStatus {
    /// Indicates that the output buffer could hold more samples, if more
    /// input samples were present.
    InsufficientInput,

    /// Indicates that more output samples can be computed from the given input,
    /// but there is not enough available space in the output buffer.
    InsufficientOutput,

    /// Indicates that as many samples as possible could be computed from the
    /// input buffer, and that the output buffer was exactly filled.
    BothSufficient,
}

impl ComputationStatus {
    /// Status for a one-to-one kernel given the input and output lengths.
    pub fn from_lengths(input: usize, output: usize) -> (usize, Self) {
        match input.cmp(&output) {
            core::cmp::Ordering::Greater => (output, ComputationStatus::InsufficientOutput),
            core::cmp::Ordering::Equal => (output, ComputationStatus::BothSufficient),
            core::cmp::Ordering::Less => (input, ComputationStatus::InsufficientInput),
        }
    }
}
