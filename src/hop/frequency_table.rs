use crate::hop::HopParameters;

/// Channel center frequencies in Hz, strictly increasing.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyTable {
    freqs: Vec<f64>,
}

impl FrequencyTable {
    /// Lay out `num_channels` channels around the carrier offset.
    ///
    /// Channel `i` sits at `(i - floor(n/2)) * separation + carrier_offset`.
    pub fn new(params: &HopParameters) -> Self {
        let n = params.num_channels();
        let center = (n / 2) as f64;
        let freqs = (0..n)
            .map(|i| (i as f64 - center) * params.channel_separation() + params.carrier_offset())
            .collect();
        Self { freqs }
    }

    /// Frequency of a channel, wrapping out-of-range indices.
    pub fn frequency(&self, channel: usize) -> f64 {
        self.freqs[channel % self.freqs.len()]
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    /// Always false, there is at least one channel.
    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// All channel frequencies.
    pub fn as_slice(&self) -> &[f64] {
        &self.freqs
    }
}

/// Build the channel grid for the given parameters.
pub fn build_frequency_table(params: &HopParameters) -> FrequencyTable {
    FrequencyTable::new(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_channel_count() {
        let p = HopParameters::new(12000.0, 3000.0, 0.0, 12000.0, 5.0).unwrap();
        let t = build_frequency_table(&p);
        assert_eq!(t.as_slice(), &[-6000.0, -3000.0, 0.0, 3000.0]);
    }

    #[test]
    fn odd_channel_count_with_offset() {
        let p = HopParameters::new(10000.0, 3000.0, 1000.0, 48000.0, 5.0).unwrap();
        let t = build_frequency_table(&p);
        assert_eq!(t.as_slice(), &[-2000.0, 1000.0, 4000.0]);
        assert_eq!(t.frequency(4), 1000.0);
    }

    #[test]
    fn strictly_increasing_and_spaced() {
        let p = HopParameters::new(1e6, 3e3, 500e3, 2457600.0, 20.0).unwrap();
        let t = FrequencyTable::new(&p);
        assert_eq!(t.len(), 333);
        for w in t.as_slice().windows(2) {
            assert!((w[1] - w[0] - 3e3).abs() < 1e-6);
        }
    }
}
