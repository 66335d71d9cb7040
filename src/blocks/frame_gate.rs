use num_complex::Complex32;

use crate::runtime::DefaultCpuReader;
use crate::runtime::DefaultCpuWriter;
use crate::runtime::Error;
use crate::runtime::Kernel;
use crate::runtime::PHASE_EST;
use crate::runtime::Result;
use crate::runtime::StreamInput;
use crate::runtime::StreamOutput;
use crate::runtime::WorkIo;
use crate::runtime::buffer::CpuBufferReader;
use crate::runtime::buffer::CpuBufferWriter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GateState {
    Idle,
    Active { remaining: usize },
}

/// Pass a fixed window of samples after every synchronisation tag.
///
/// A tag with the sync key (re)starts a window of `frame_length` samples, even
/// in the middle of a running one. Samples outside a window are dropped. The
/// sync tag is forwarded to the first output sample of its window.
///
/// # Stream Inputs
///
/// `input`: Samples with sync tags
///
/// # Stream Outputs
///
/// `output`: Gated samples
pub struct FrameGate<T = Complex32, I = DefaultCpuReader<T>, O = DefaultCpuWriter<T>>
where
    T: Copy + Send + 'static,
    I: CpuBufferReader<Item = T>,
    O: CpuBufferWriter<Item = T>,
{
    input: I,
    output: O,
    frame_length: usize,
    sync_key: String,
    state: GateState,
    frames: u64,
    dropped: u64,
}

impl<T, I, O> FrameGate<T, I, O>
where
    T: Copy + Send + 'static,
    I: CpuBufferReader<Item = T>,
    O: CpuBufferWriter<Item = T>,
{
    /// Create a gate triggered by `phase_est` tags.
    pub fn new(frame_length: usize) -> Result<Self> {
        Self::with_sync_key(frame_length, PHASE_EST)
    }

    /// Create a gate triggered by tags with the given key.
    pub fn with_sync_key(frame_length: usize, sync_key: impl Into<String>) -> Result<Self> {
        if frame_length == 0 {
            return Err(Error::invalid("frame_length", "must be positive"));
        }
        Ok(Self {
            input: I::default(),
            output: O::default(),
            frame_length,
            sync_key: sync_key.into(),
            state: GateState::Idle,
            frames: 0,
            dropped: 0,
        })
    }

    /// Whether a window is open.
    pub fn is_active(&self) -> bool {
        matches!(self.state, GateState::Active { .. })
    }

    /// Samples left in the open window.
    pub fn remaining(&self) -> usize {
        match self.state {
            GateState::Active { remaining } => remaining,
            GateState::Idle => 0,
        }
    }

    /// Number of windows opened.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of samples dropped outside windows.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<T, I, O> Kernel for FrameGate<T, I, O>
where
    T: Copy + Send + 'static,
    I: CpuBufferReader<Item = T>,
    O: CpuBufferWriter<Item = T>,
{
    fn work(&mut self, io: &mut WorkIo) -> anyhow::Result<()> {
        let finished = self.input.finished();
        let (input, in_tags) = self.input.slice_with_tags();
        let (output, mut out_tags) = self.output.slice_with_tags();

        let mut i = 0;
        let mut o = 0;
        let mut t = 0;

        while i < input.len() {
            let mut sync = None;
            let mut next = t;
            while next < in_tags.len() && in_tags[next].index == i {
                if in_tags[next].tag.has_key(&self.sync_key) {
                    sync = Some(next);
                }
                next += 1;
            }

            let emits = sync.is_some() || matches!(self.state, GateState::Active { .. });
            if emits && o == output.len() {
                break;
            }

            if let Some(s) = sync {
                self.state = GateState::Active {
                    remaining: self.frame_length,
                };
                self.frames += 1;
                out_tags.add_tag(o, in_tags[s].tag.clone());
            }

            match self.state {
                GateState::Active { remaining } => {
                    output[o] = input[i];
                    o += 1;
                    self.state = if remaining > 1 {
                        GateState::Active {
                            remaining: remaining - 1,
                        }
                    } else {
                        GateState::Idle
                    };
                }
                GateState::Idle => self.dropped += 1,
            }

            i += 1;
            t = next;
        }

        let done = finished && i == input.len();
        self.input.consume(i);
        self.output.produce(o);

        if done {
            io.finished = true;
        }
        Ok(())
    }
}

impl<T, I, O> StreamInput for FrameGate<T, I, O>
where
    T: Copy + Send + 'static,
    I: CpuBufferReader<Item = T>,
    O: CpuBufferWriter<Item = T>,
{
    type Input = I;
    fn input(&mut self) -> &mut I {
        &mut self.input
    }
}

impl<T, I, O> StreamOutput for FrameGate<T, I, O>
where
    T: Copy + Send + 'static,
    I: CpuBufferReader<Item = T>,
    O: CpuBufferWriter<Item = T>,
{
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }
}
