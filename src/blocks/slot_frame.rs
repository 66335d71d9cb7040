use crate::hop::SlotFrameBuilder;
use crate::runtime::DefaultCpuWriter;
use crate::runtime::Kernel;
use crate::runtime::Result;
use crate::runtime::StreamOutput;
use crate::runtime::WorkIo;
use crate::runtime::buffer::CpuBufferWriter;

/// Emit one symbol frame per hop.
///
/// Writes whole frames of `head + payload` symbol indices while the output has
/// room for them.
///
/// # Stream Outputs
///
/// `output`: Symbol indices in `[0, m_order)`
pub struct SlotFrameSource<O = DefaultCpuWriter<u8>>
where
    O: CpuBufferWriter<Item = u8>,
{
    output: O,
    builder: SlotFrameBuilder,
    max_frames: Option<u64>,
}

impl<O> SlotFrameSource<O>
where
    O: CpuBufferWriter<Item = u8>,
{
    /// Create an endless frame source.
    pub fn new(hop_rate: u32, m_order: usize, info_seed: u64) -> Result<Self> {
        Ok(Self {
            output: O::default(),
            builder: SlotFrameBuilder::new(hop_rate, m_order, info_seed)?,
            max_frames: None,
        })
    }

    /// Finish after `n` frames.
    pub fn with_max_frames(mut self, n: u64) -> Self {
        self.max_frames = Some(n);
        self
    }

    /// Frame length in symbols.
    pub fn frame_len(&self) -> usize {
        self.builder.frame_len()
    }

    /// Frames emitted so far.
    pub fn frames(&self) -> u64 {
        self.builder.frames_built()
    }

    /// The frame builder.
    pub fn builder(&self) -> &SlotFrameBuilder {
        &self.builder
    }
}

impl<O> Kernel for SlotFrameSource<O>
where
    O: CpuBufferWriter<Item = u8>,
{
    fn work(&mut self, io: &mut WorkIo) -> anyhow::Result<()> {
        let frame_len = self.builder.frame_len();
        let out = self.output.slice();

        let mut n = 0;
        while (n + 1) * frame_len <= out.len()
            && self
                .max_frames
                .is_none_or(|max| self.builder.frames_built() < max)
        {
            self.builder.next_frame_into(&mut out[n * frame_len..]);
            n += 1;
        }

        self.output.produce(n * frame_len);

        if self
            .max_frames
            .is_some_and(|max| self.builder.frames_built() >= max)
        {
            io.finished = true;
        }
        Ok(())
    }
}

impl<O> StreamOutput for SlotFrameSource<O>
where
    O: CpuBufferWriter<Item = u8>,
{
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }
}
