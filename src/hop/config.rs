//! Link configuration
use config::Environment;
use config::File;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;

use crate::blocks::Derotation;
use crate::hop::FrameLayout;
use crate::hop::FrequencyTable;
use crate::hop::HOP_SEQUENCE_SEED;
use crate::hop::HopParameters;
use crate::hop::HopSequence;
use crate::hop::SlotClock;
use crate::runtime::Error;
use crate::runtime::PHASE_EST;
use crate::runtime::Result;

/// Parameters of both link ends.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    /// Hops per second
    pub hop_rate: u32,
    /// PSK order, 2, 4 or 8
    pub m_order: usize,
    /// Samples per symbol at the modulator
    pub oversampling: usize,
    /// Total hopping bandwidth in Hz
    pub hop_bandwidth: f64,
    /// Channel spacing in Hz
    pub channel_separation: f64,
    /// Center offset of the channel grid in Hz
    pub carrier_offset: f64,
    /// Sample rate of the hopping stages in Hz
    pub sample_rate: f64,
    /// Frame gate window in samples, defaults to the modulator frame length
    pub frame_length: Option<usize>,
    /// Samples per symbol at the receiver
    pub sps: usize,
    /// Seed of the frame payload
    pub info_seed: u64,
    /// Tag key marking frame starts
    pub sync_key: String,
    /// Where the receiver removes the carrier phase
    pub derotation: Derotation,
    /// Reference symbols for the symbol error rate
    pub reference_path: Option<PathBuf>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            hop_rate: 5,
            m_order: 4,
            oversampling: 4,
            hop_bandwidth: 12000.0,
            channel_separation: 3000.0,
            carrier_offset: 0.0,
            sample_rate: 12000.0,
            frame_length: None,
            sps: 4,
            info_seed: 12345,
            sync_key: PHASE_EST.to_string(),
            derotation: Derotation::InBlock,
            reference_path: None,
        }
    }
}

impl LinkConfig {
    /// Load a TOML file, overlaid with `HOPLINK_LINK_*` environment variables.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let c: LinkConfig = ::config::Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("hoplink_link"))
            .build()?
            .try_deserialize()?;
        c.validate()?;
        Ok(c)
    }

    /// Check all parameters.
    pub fn validate(&self) -> Result<()> {
        self.hop_params()?;
        if !matches!(self.m_order, 2 | 4 | 8) {
            return Err(Error::invalid(
                "m_order",
                format!("must be 2, 4 or 8, got {}", self.m_order),
            ));
        }
        if self.oversampling == 0 {
            return Err(Error::invalid("oversampling", "must be positive"));
        }
        if self.sps == 0 {
            return Err(Error::invalid("sps", "must be positive"));
        }
        if self.frame_length == Some(0) {
            return Err(Error::invalid("frame_length", "must be positive"));
        }
        if self.sync_key.is_empty() {
            return Err(Error::invalid("sync_key", "must not be empty"));
        }
        if FrameLayout::lookup(self.hop_rate).is_err() {
            warn!(
                "hop rate {} has no frame layout, frames use the default",
                self.hop_rate
            );
        }
        Ok(())
    }

    /// Validated hopping parameters.
    pub fn hop_params(&self) -> Result<HopParameters> {
        HopParameters::new(
            self.hop_bandwidth,
            self.channel_separation,
            self.carrier_offset,
            self.sample_rate,
            self.hop_rate as f64,
        )
    }

    /// Channel grid.
    pub fn frequency_table(&self) -> Result<FrequencyTable> {
        Ok(FrequencyTable::new(&self.hop_params()?))
    }

    /// Hop sequence from the shared seed.
    pub fn hop_sequence(&self) -> Result<HopSequence> {
        HopSequence::new(self.hop_params()?.num_channels(), HOP_SEQUENCE_SEED)
    }

    /// Slot clock for the hop sequence.
    pub fn slot_clock(&self) -> Result<SlotClock> {
        SlotClock::from_params(&self.hop_params()?, self.hop_sequence()?.len())
    }

    /// Frame layout of the hop rate.
    pub fn frame_layout(&self) -> FrameLayout {
        FrameLayout::for_hop_rate(self.hop_rate)
    }

    /// Modulated samples per frame.
    pub fn samples_per_frame(&self) -> usize {
        FrameLayout::samples_per_frame(self.hop_rate, self.oversampling)
    }

    /// Frame gate window in samples.
    pub fn gate_length(&self) -> usize {
        self.frame_length.unwrap_or_else(|| self.samples_per_frame())
    }
}
