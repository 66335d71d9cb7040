//! Hop control plane
//!
//! Everything both link ends must derive identically: the channel grid, the
//! hop sequence, the daily slot grid and the symbol frame of each hop.
mod config;
mod frame;
mod frequency_table;
mod hop_sequence;
mod params;
mod slot_clock;

pub use config::LinkConfig;
pub use frame::FrameLayout;
pub use frame::HEADER_SEED;
pub use frame::MAX_FRAME;
pub use frame::SYMBOL_RATE;
pub use frame::SlotFrameBuilder;
pub use frame::reference_payload;
pub use frequency_table::FrequencyTable;
pub use frequency_table::build_frequency_table;
pub use hop_sequence::HOP_SEQUENCE_SEED;
pub use hop_sequence::HopSequence;
pub use hop_sequence::build_hop_sequence;
pub use params::HopParameters;
pub use params::MAX_CHANNELS;
pub use slot_clock::FixedClock;
pub use slot_clock::RxAlignment;
pub use slot_clock::SlotClock;
pub use slot_clock::SlotPosition;
pub use slot_clock::SlotState;
pub use slot_clock::SystemClock;
pub use slot_clock::TimeSource;
pub use slot_clock::TxAlignment;
