use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::Uniform;
use rand_chacha::ChaCha8Rng;

use crate::hop::HopParameters;
use crate::hop::MAX_CHANNELS;
use crate::runtime::Error;
use crate::runtime::Result;

/// Seed of the hop sequence shared by modulator and demodulator.
pub const HOP_SEQUENCE_SEED: u64 = 42;

/// Pseudo-random channel order, `2 * num_channels` entries long.
///
/// Entries are drawn uniformly from `[0, num_channels)` by a ChaCha8 generator,
/// so both ends derive the same order from the same seed on any platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HopSequence {
    channels: Vec<usize>,
}

impl HopSequence {
    /// Generate the sequence for `num_channels` channels.
    pub fn new(num_channels: usize, seed: u64) -> Result<Self> {
        if num_channels > MAX_CHANNELS {
            return Err(Error::invalid(
                "num_channels",
                format!("{num_channels} exceeds the limit of {MAX_CHANNELS}"),
            ));
        }
        let dist = Uniform::new(0, num_channels as u32)
            .map_err(|e| Error::invalid("num_channels", format!("{e}")))?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let channels = (0..2 * num_channels)
            .map(|_| dist.sample(&mut rng) as usize)
            .collect();
        Ok(Self { channels })
    }

    /// Channel at a sequence position, wrapping modulo the length.
    pub fn channel(&self, index: usize) -> usize {
        self.channels[index % self.channels.len()]
    }

    /// Sequence length.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false for a valid sequence.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channel indices in order.
    pub fn as_slice(&self) -> &[usize] {
        &self.channels
    }
}

/// Build the hop sequence for the given parameters.
pub fn build_hop_sequence(params: &HopParameters, seed: u64) -> Result<HopSequence> {
    HopSequence::new(params.num_channels(), seed)
}
