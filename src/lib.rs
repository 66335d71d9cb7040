#![warn(missing_docs)]

//! Synchronization and framing core of a frequency-hopping spread-spectrum link.
//!
//! Both link ends derive the same channel grid and pseudo-random hop sequence
//! from shared parameters and align hops to a slot grid counted from UTC
//! midnight. The transmitter starts hopping at the next slot boundary, the
//! receiver locates itself from `rx_time` tags attached by the radio front end.
//!
//! ## Example
//! Hop one vector of samples and undo the hop at the receiver:
//! ```
//! use hoplink::blocks::HopDemod;
//! use hoplink::blocks::HopMod;
//! use hoplink::hop::FixedClock;
//! use hoplink::hop::HopParameters;
//! use hoplink::num_complex::Complex32;
//! use hoplink::runtime::ItemTag;
//! use hoplink::runtime::Mocker;
//! use hoplink::runtime::Tag;
//! use hoplink::runtime::TimeSpec;
//! use hoplink::runtime::RX_TIME;
//! use hoplink::runtime::Result;
//!
//! fn main() -> Result<()> {
//!     let params = HopParameters::new(12000.0, 3000.0, 0.0, 12000.0, 5.0)?;
//!     let clock = FixedClock(TimeSpec::from_secs_f64(0.1));
//!     let hop_mod: HopMod<FixedClock> = HopMod::new(params, 2400, clock)?;
//!     let mut tx = Mocker::new(hop_mod);
//!     let (hopped, tags, _) = tx.process(vec![Complex32::new(1.0, 0.0); 2400], vec![]);
//!
//!     let start = tags[0].tag.time_named("tx_time").unwrap();
//!     let demod: HopDemod = HopDemod::new(params)?;
//!     let mut rx = Mocker::new(demod);
//!     let rx_tags = vec![ItemTag::new(0, Tag::NamedTime(RX_TIME.to_string(), start))];
//!     let (baseband, _, _) = rx.process(hopped, rx_tags);
//!     assert!((baseband[100].re - 1.0).abs() < 1e-3);
//!     Ok(())
//! }
//! ```

/// Logging macro
#[macro_use]
pub extern crate tracing;

// re-exports
pub use anyhow;
pub use hopdsp;
pub use num_complex;

pub mod blocks;
pub mod hop;
pub mod runtime;

/// Commonly used types for implementing and driving stages
pub mod prelude {
    pub use crate::num_complex::Complex32;
    pub use crate::runtime::CORR_EST;
    pub use crate::runtime::DefaultCpuReader;
    pub use crate::runtime::DefaultCpuWriter;
    pub use crate::runtime::ItemTag;
    pub use crate::runtime::Kernel;
    pub use crate::runtime::Mocker;
    pub use crate::runtime::PHASE_EST;
    pub use crate::runtime::RX_TIME;
    pub use crate::runtime::StreamInput;
    pub use crate::runtime::StreamOutput;
    pub use crate::runtime::TX_TIME;
    pub use crate::runtime::Tag;
    pub use crate::runtime::TimeSpec;
    pub use crate::runtime::WorkIo;
    pub use crate::runtime::buffer::CpuBufferReader;
    pub use crate::runtime::buffer::CpuBufferWriter;
    pub use anyhow::Result;
}
