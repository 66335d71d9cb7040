use anyhow::Result;

use crate::runtime::WorkIo;

/// Kernel
///
/// Central trait to implement a stage. `work` processes as much of the
/// available input as fits into the available output and returns.
pub trait Kernel: Send {
    /// Processes stream data
    fn work(&mut self, _io: &mut WorkIo) -> Result<()> {
        Ok(())
    }
    /// Initialize kernel
    fn init(&mut self) -> Result<()> {
        Ok(())
    }
    /// De-initialize kernel
    fn deinit(&mut self) -> Result<()> {
        Ok(())
    }
}
