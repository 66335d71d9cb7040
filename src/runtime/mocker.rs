use anyhow::Result;
use std::fmt::Debug;

use crate::runtime::ItemTag;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;
use crate::runtime::buffer::CpuBufferReader;
use crate::runtime::buffer::CpuBufferWriter;
use crate::runtime::buffer::host;
use crate::runtime::config::config;

/// Access to the stream input of a stage.
pub trait StreamInput {
    /// Reader type
    type Input: CpuBufferReader;
    /// Stream input
    fn input(&mut self) -> &mut Self::Input;
}

/// Access to the stream output of a stage.
pub trait StreamOutput {
    /// Writer type
    type Output: CpuBufferWriter;
    /// Stream output
    fn output(&mut self) -> &mut Self::Output;
}

/// Mocker for a block
///
/// A harness to run a block without a scheduler. Used for unit tests and benchmarking.
pub struct Mocker<K> {
    kernel: K,
    io: WorkIo,
}

impl<K: Kernel> Mocker<K> {
    /// Create mocker
    pub fn new(kernel: K) -> Self {
        Mocker {
            kernel,
            io: WorkIo::default(),
        }
    }

    /// Initialize the block wrapped by the mocker
    pub fn init(&mut self) {
        self.kernel.init().expect("mocked kernel failed to initialize");
    }

    /// De-initialize the block wrapped by the mocker
    pub fn deinit(&mut self) {
        self.kernel
            .deinit()
            .expect("mocked kernel failed to de-initialize");
    }

    /// Run the block wrapped by the mocker, panicking on error
    pub fn run(&mut self) {
        self.try_run().expect("mocked kernel failed");
    }

    /// Run the block until it neither asks to be called again nor finishes
    pub fn try_run(&mut self) -> Result<()> {
        loop {
            self.kernel.work(&mut self.io)?;
            if self.io.finished || !self.io.call_again {
                break;
            }
            self.io.call_again = false;
        }
        Ok(())
    }

    /// Whether the block marked itself as finished
    pub fn finished(&self) -> bool {
        self.io.finished
    }

    /// Wrapped kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Wrapped kernel, mutable
    pub fn kernel_mut(&mut self) -> &mut K {
        &mut self.kernel
    }

    /// Unwrap the kernel
    pub fn into_inner(self) -> K {
        self.kernel
    }
}

impl<K: Kernel + StreamInput> Mocker<K> {
    /// Input buffer of the block
    pub fn input(&mut self) -> &mut K::Input {
        self.kernel.input()
    }
}

impl<K: Kernel + StreamOutput> Mocker<K> {
    /// Output buffer of the block
    pub fn output(&mut self) -> &mut K::Output {
        self.kernel.output()
    }
}

impl<A, B, K> Mocker<K>
where
    A: Send,
    B: Clone + Debug + Default + Send,
    K: Kernel + StreamInput<Input = host::Reader<A>> + StreamOutput<Output = host::Writer<B>>,
{
    /// Push `data` with `tags` through the block.
    ///
    /// Returns the items and tags produced in this call and the number of input items
    /// consumed. If the output has no free space, it is sized to the configured
    /// `buffer_size`.
    pub fn process(&mut self, data: Vec<A>, tags: Vec<ItemTag>) -> (Vec<B>, Vec<ItemTag>, usize) {
        if self.kernel.output().space() == 0 {
            self.kernel.output().reserve(config().buffer_size);
        }
        let before = self.kernel.input().len() + data.len();
        self.kernel.input().push_with_tags(data, tags);
        self.run();
        let consumed = before - self.kernel.input().len();
        let (items, tags) = self.kernel.output().take();
        (items, tags, consumed)
    }
}
