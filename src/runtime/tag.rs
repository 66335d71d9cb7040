use std::fmt;

/// Key of the receive timestamp attached by the radio front end.
pub const RX_TIME: &str = "rx_time";
/// Key of the transmit timestamp attached by the hop modulator.
pub const TX_TIME: &str = "tx_time";
/// Key of the symbol-aligned phase estimate emitted by the correlator.
pub const PHASE_EST: &str = "phase_est";
/// Key of the correlation strength emitted next to [`PHASE_EST`].
pub const CORR_EST: &str = "corr_est";

/// Absolute timestamp as whole seconds plus a fractional second.
///
/// This is the `(u64, f64)` payload of `rx_time` and `tx_time` tags.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeSpec {
    /// Whole seconds since the UNIX epoch
    pub secs: u64,
    /// Fractional second in `[0, 1)`
    pub frac: f64,
}

impl TimeSpec {
    /// Nanoseconds per day.
    pub const NANOS_PER_DAY: u64 = 86_400 * 1_000_000_000;

    /// Create a timestamp, carrying whole seconds out of `frac`.
    pub fn new(secs: u64, frac: f64) -> Self {
        let carry = frac.floor();
        Self {
            secs: secs.saturating_add_signed(carry as i64),
            frac: frac - carry,
        }
    }

    /// Timestamp from floating point seconds. Negative values clamp to zero.
    pub fn from_secs_f64(t: f64) -> Self {
        let t = t.max(0.0);
        Self::new(t.trunc() as u64, t.fract())
    }

    /// Timestamp from nanoseconds.
    pub fn from_nanos(ns: u128) -> Self {
        Self {
            secs: (ns / 1_000_000_000) as u64,
            frac: (ns % 1_000_000_000) as f64 / 1e9,
        }
    }

    /// Seconds as `f64`.
    pub fn as_secs_f64(&self) -> f64 {
        self.secs as f64 + self.frac
    }

    /// Total nanoseconds, rounded to the nearest nanosecond.
    pub fn as_nanos(&self) -> u128 {
        self.secs as u128 * 1_000_000_000 + self.frac_nanos() as u128
    }

    /// Nanoseconds since the start of the current UTC day.
    pub fn nanos_since_midnight(&self) -> u64 {
        (self.secs % 86_400) * 1_000_000_000 + self.frac_nanos()
    }

    fn frac_nanos(&self) -> u64 {
        (self.frac * 1e9).round() as u64
    }

    /// Timestamp of the start of the current UTC day.
    pub fn midnight(&self) -> Self {
        Self {
            secs: self.secs - self.secs % 86_400,
            frac: 0.0,
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}s", self.as_secs_f64())
    }
}

/// Stream tag
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    /// Id
    Id(u64),
    /// String
    String(String),
    /// An `f64` with a name
    NamedF64(String, f64),
    /// A timestamp with a name
    NamedTime(String, TimeSpec),
    /// A `usize` with a name
    NamedUsize(String, usize),
}

impl Tag {
    /// Key of a named tag.
    pub fn key(&self) -> Option<&str> {
        match self {
            Tag::NamedF64(k, _) | Tag::NamedTime(k, _) | Tag::NamedUsize(k, _) => Some(k),
            _ => None,
        }
    }

    /// Whether this is a named tag with the given key, regardless of payload.
    pub fn has_key(&self, key: &str) -> bool {
        self.key() == Some(key)
    }

    /// Value of an `f64` tag with the given key.
    pub fn f64_named(&self, key: &str) -> Option<f64> {
        match self {
            Tag::NamedF64(k, v) if k == key => Some(*v),
            _ => None,
        }
    }

    /// Value of a timestamp tag with the given key.
    pub fn time_named(&self, key: &str) -> Option<TimeSpec> {
        match self {
            Tag::NamedTime(k, v) if k == key => Some(*v),
            _ => None,
        }
    }
}

/// Item tag
#[derive(Clone, Debug, PartialEq)]
pub struct ItemTag {
    /// Index of sample in buffer
    pub index: usize,
    /// [`Tag`] value
    pub tag: Tag,
}

impl ItemTag {
    /// Create item tag
    pub fn new(index: usize, tag: Tag) -> Self {
        Self { index, tag }
    }
}
