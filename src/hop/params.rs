use crate::runtime::Error;
use crate::runtime::Result;

/// Largest channel grid a hopping link may use.
pub const MAX_CHANNELS: usize = 1 << 16;

/// Shared hopping parameters of both link ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HopParameters {
    hop_bandwidth: f64,
    channel_separation: f64,
    carrier_offset: f64,
    sample_rate: f64,
    hop_rate: f64,
}

fn positive(name: &'static str, v: f64) -> Result<f64> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(Error::invalid(name, format!("must be finite and positive, got {v}")))
    }
}

impl HopParameters {
    /// Validate and create hopping parameters.
    ///
    /// Bandwidth, separation and rates are in Hz or hops/s and must be positive.
    /// The carrier offset may be zero or negative. At most [`MAX_CHANNELS`]
    /// channels fit the bandwidth.
    pub fn new(
        hop_bandwidth: f64,
        channel_separation: f64,
        carrier_offset: f64,
        sample_rate: f64,
        hop_rate: f64,
    ) -> Result<Self> {
        if !carrier_offset.is_finite() {
            return Err(Error::invalid("carrier_offset", "must be finite"));
        }
        let hop_bandwidth = positive("hop_bandwidth", hop_bandwidth)?;
        let channel_separation = positive("channel_separation", channel_separation)?;
        let channels = (hop_bandwidth / channel_separation).floor();
        if channels > MAX_CHANNELS as f64 {
            return Err(Error::invalid(
                "hop_bandwidth",
                format!("{channels} channels exceed the limit of {MAX_CHANNELS}"),
            ));
        }
        Ok(Self {
            hop_bandwidth,
            channel_separation,
            carrier_offset,
            sample_rate: positive("sample_rate", sample_rate)?,
            hop_rate: positive("hop_rate", hop_rate)?,
        })
    }

    /// Total hopping bandwidth in Hz.
    pub fn hop_bandwidth(&self) -> f64 {
        self.hop_bandwidth
    }

    /// Channel spacing in Hz.
    pub fn channel_separation(&self) -> f64 {
        self.channel_separation
    }

    /// Center offset of the channel grid in Hz.
    pub fn carrier_offset(&self) -> f64 {
        self.carrier_offset
    }

    /// Complex sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Hops per second.
    pub fn hop_rate(&self) -> f64 {
        self.hop_rate
    }

    /// Number of channels, at least one.
    pub fn num_channels(&self) -> usize {
        ((self.hop_bandwidth / self.channel_separation).floor() as usize).max(1)
    }

    /// Dwell time on one channel in seconds.
    pub fn hop_period(&self) -> f64 {
        1.0 / self.hop_rate
    }

    /// Samples per hop, possibly fractional.
    pub fn samples_per_hop(&self) -> f64 {
        self.sample_rate / self.hop_rate
    }
}
