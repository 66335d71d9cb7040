//! ## Stage runtime
//!
//! Tags, buffers, the [`Kernel`] trait every stage implements, and the
//! [`Mocker`] harness that drives a stage without a scheduler.
use std::io;
use std::path::PathBuf;
use std::result;
use thiserror::Error;

pub mod buffer;
pub mod config;
mod kernel;
mod logging;
mod mocker;
mod tag;
mod work_io;

pub use kernel::Kernel;
pub use logging::LOG_ENV;
pub use logging::init;
pub use mocker::Mocker;
pub use mocker::StreamInput;
pub use mocker::StreamOutput;
pub use tag::CORR_EST;
pub use tag::ItemTag;
pub use tag::PHASE_EST;
pub use tag::RX_TIME;
pub use tag::TX_TIME;
pub use tag::Tag;
pub use tag::TimeSpec;
pub use work_io::WorkIo;

/// Default reader of a stage
pub type DefaultCpuReader<T> = buffer::host::Reader<T>;
/// Default writer of a stage
pub type DefaultCpuWriter<T> = buffer::host::Writer<T>;

/// Result type for stage construction
pub type Result<T, E = Error> = result::Result<T, E>;

/// hoplink Error
#[derive(Error, Debug)]
pub enum Error {
    /// A construction parameter is out of range
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
    /// No frame layout is tabulated for the hop rate
    #[error("unsupported hop rate {0} hops/s")]
    UnsupportedHopRate(u32),
    /// Reference symbol file could not be read
    #[error("cannot read reference file {path:?}: {source}")]
    ReferenceLoad {
        /// File path
        path: PathBuf,
        /// IO error
        #[source]
        source: io::Error,
    },
    /// Reference symbol file is empty
    #[error("reference file {path:?} is empty")]
    EmptyReference {
        /// File path
        path: PathBuf,
    },
    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<::config::ConfigError> for Error {
    fn from(e: ::config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
