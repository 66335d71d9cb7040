use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::hop::HopParameters;
use crate::runtime::Error;
use crate::runtime::Result;
use crate::runtime::TimeSpec;

/// Source of the current absolute time.
pub trait TimeSource: Send {
    /// Current time
    fn now(&self) -> TimeSpec;
}

/// Wall clock relative to the UNIX epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> TimeSpec {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => TimeSpec::new(d.as_secs(), d.subsec_nanos() as f64 / 1e9),
            Err(_) => {
                warn!("system clock before UNIX epoch");
                TimeSpec::default()
            }
        }
    }
}

/// Clock frozen at a given time, for simulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedClock(pub TimeSpec);

impl TimeSource for FixedClock {
    fn now(&self) -> TimeSpec {
        self.0
    }
}

/// Position of a timestamp inside the slot grid of its day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotPosition {
    /// Slot index since midnight
    pub slot_index: u64,
    /// Nanoseconds since the start of the slot
    pub residual_ns: u64,
}

/// Transmitter alignment: the first hop starts at the next slot boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TxAlignment {
    /// Slot index of the first hop
    pub start_slot: u64,
    /// Absolute start time of the first hop
    pub start_time: TimeSpec,
    /// Initial hop counter, `start_slot mod len`
    pub hop_count: usize,
}

/// Receiver alignment derived from an `rx_time` tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RxAlignment {
    /// Slot index containing the tagged sample
    pub slot_index: u64,
    /// Samples already elapsed in that slot
    pub elapsed_samples: f64,
}

/// Maps absolute time onto the daily slot grid.
///
/// Slots are `round(1e9 / hop_rate)` nanoseconds long and counted from UTC
/// midnight. Both link ends use the same grid, which is all the synchronisation
/// the link has.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotClock {
    slot_size_ns: u64,
    sample_rate: f64,
    sequence_len: usize,
}

impl SlotClock {
    /// Create a slot clock.
    pub fn new(hop_rate: f64, sample_rate: f64, sequence_len: usize) -> Result<Self> {
        if !(hop_rate.is_finite() && hop_rate > 0.0) {
            return Err(Error::invalid("hop_rate", "must be finite and positive"));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::invalid("sample_rate", "must be finite and positive"));
        }
        if sequence_len == 0 {
            return Err(Error::invalid("sequence_len", "must not be zero"));
        }
        let slot_size_ns = (1e9 / hop_rate).round() as u64;
        if slot_size_ns == 0 {
            return Err(Error::invalid("hop_rate", "slot shorter than a nanosecond"));
        }
        Ok(Self {
            slot_size_ns,
            sample_rate,
            sequence_len,
        })
    }

    /// Slot clock for validated hop parameters.
    pub fn from_params(params: &HopParameters, sequence_len: usize) -> Result<Self> {
        Self::new(params.hop_rate(), params.sample_rate(), sequence_len)
    }

    /// Slot length in nanoseconds.
    pub fn slot_size_ns(&self) -> u64 {
        self.slot_size_ns
    }

    /// Hop sequence length.
    pub fn sequence_len(&self) -> usize {
        self.sequence_len
    }

    /// Split nanoseconds since midnight into slot and residual.
    pub fn resolve(&self, time_ns: u64) -> SlotPosition {
        SlotPosition {
            slot_index: time_ns / self.slot_size_ns,
            residual_ns: time_ns % self.slot_size_ns,
        }
    }

    /// Start transmitting at the slot after `now`.
    pub fn tx_alignment(&self, now: TimeSpec) -> TxAlignment {
        let pos = self.resolve(now.nanos_since_midnight());
        let start_slot = pos.slot_index + 1;
        let start_ns = now.midnight().as_nanos() + (start_slot * self.slot_size_ns) as u128;
        TxAlignment {
            start_slot,
            start_time: TimeSpec::from_nanos(start_ns),
            hop_count: (start_slot % self.sequence_len as u64) as usize,
        }
    }

    /// Locate a received timestamp in the slot grid.
    pub fn rx_alignment(&self, rx_time: TimeSpec) -> RxAlignment {
        let pos = self.resolve(rx_time.nanos_since_midnight());
        RxAlignment {
            slot_index: pos.slot_index,
            elapsed_samples: pos.residual_ns as f64 * self.sample_rate / 1e9,
        }
    }

    /// Hop sequence position of hop `hop_count` after `slot_index`.
    pub fn sequence_index(&self, slot_index: u64, hop_count: u64) -> usize {
        (slot_index.wrapping_add(hop_count) % self.sequence_len as u64) as usize
    }
}

/// Receiver hop tracking state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlotState {
    /// Slot of the last time reference
    pub slot_index: u64,
    /// Hops since the last time reference
    pub hop_count: u64,
    /// Samples elapsed in the current hop
    pub elapsed_samples: f64,
    /// Frequency the mixer is tuned to
    pub current_frequency: f64,
    /// Whether an `rx_time` tag was seen
    pub has_time_reference: bool,
}

impl SlotState {
    /// Restart hop tracking from a new time reference.
    pub fn reset(&mut self, rx: RxAlignment, frequency: f64) {
        self.slot_index = rx.slot_index;
        self.hop_count = 0;
        self.elapsed_samples = rx.elapsed_samples;
        self.current_frequency = frequency;
        self.has_time_reference = true;
    }

    /// Hop boundary check before a sample. Returns true if a new hop started.
    pub fn step(&mut self, samples_per_hop: f64) -> bool {
        if self.elapsed_samples >= samples_per_hop {
            self.elapsed_samples -= samples_per_hop;
            self.hop_count += 1;
            true
        } else {
            false
        }
    }

    /// Samples that can be processed before the next hop boundary, at least one.
    ///
    /// Call after [`step`](Self::step).
    pub fn samples_until_hop(&self, samples_per_hop: f64) -> usize {
        ((samples_per_hop - self.elapsed_samples).ceil() as usize).max(1)
    }

    /// Account for processed samples.
    pub fn advance(&mut self, samples: usize) {
        self.elapsed_samples += samples as f64;
    }
}
