//! ## Transmit stages
//! | Block | Usage |
//! |---|---|
//! | [SlotFrameSource] | Emits one header + payload symbol frame per hop |
//! | [PskMod] | Maps symbol frames to oversampled PSK baseband |
//! | [HopMod] | Shifts each hop vector to its channel, aligned to the slot grid |
//!
//! ## Receive stages
//! | Block | Usage |
//! |---|---|
//! | [HopDemod] | Tracks the hop sequence from `rx_time` tags and mixes back to baseband |
//! | [FrameGate] | Passes a fixed window of samples after each sync tag |
//! | [SymbolTimingRecovery] | Picks one sample per symbol, realigned by `phase_est` triggers |
//! | [SerAccumulator] | Symbol error rate against a reference frame |

mod frame_gate;
pub use frame_gate::FrameGate;

mod hop_demod;
pub use hop_demod::HopDemod;

mod hop_mod;
pub use hop_mod::HopMod;

mod psk_mod;
pub use psk_mod::PskMod;

mod ser;
pub use ser::HISTORY_SIZE;
pub use ser::REPORT_INTERVAL;
pub use ser::SerAccumulator;
pub use ser::SerReport;

mod slot_frame;
pub use slot_frame::SlotFrameSource;

mod symbol_recovery;
pub use symbol_recovery::Derotation;
pub use symbol_recovery::SymbolTimingRecovery;
