use std::collections::VecDeque;
use std::path::Path;

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

/// Number of past frames the rolling average covers.
pub const HISTORY_SIZE: usize = 100;
/// Frames between aggregate reports.
pub const REPORT_INTERVAL: u64 = 100;

/// Aggregate symbol error rate, produced every [`REPORT_INTERVAL`] frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SerReport {
    /// Frames seen so far
    pub total_frames: u64,
    /// Mean SER over the history
    pub average: f64,
    /// Number of frames in the average
    pub frames_averaged: usize,
}

#[derive(Debug)]
struct SerStats {
    reference: Vec<u8>,
    index: usize,
    errors: usize,
    history: VecDeque<f64>,
    total_frames: u64,
    desync_samples: u64,
    last_report: Option<SerReport>,
}

impl SerStats {
    fn new(reference: Vec<u8>) -> Self {
        Self {
            reference,
            index: 0,
            errors: 0,
            history: VecDeque::with_capacity(HISTORY_SIZE + 1),
            total_frames: 0,
            desync_samples: 0,
            last_report: None,
        }
    }

    fn rolling_average(&self) -> Option<f64> {
        if self.history.is_empty() {
            None
        } else {
            Some(self.history.iter().sum::<f64>() / self.history.len() as f64)
        }
    }

    fn current_frame_ser(&self) -> Option<f64> {
        (self.index > 0).then(|| self.errors as f64 / self.index as f64)
    }

    fn has_received(&self) -> bool {
        self.total_frames > 0 || self.index > 0
    }

    fn finish_frame(&mut self) {
        if let Some(ser) = self.current_frame_ser() {
            self.history.push_back(ser);
            if self.history.len() > HISTORY_SIZE {
                self.history.pop_front();
            }
        }
        self.index = 0;
        self.errors = 0;
        self.total_frames += 1;

        if self.total_frames % REPORT_INTERVAL == 0 {
            let report = SerReport {
                total_frames: self.total_frames,
                average: self.rolling_average().unwrap_or(0.0),
                frames_averaged: self.history.len(),
            };
            info!(
                "frames received: {}, average SER (last {} frames): {:.6}",
                report.total_frames, report.frames_averaged, report.average
            );
            self.last_report = Some(report);
        }
    }

    fn compare(&mut self, symbol: u8) {
        match self.reference.get(self.index) {
            Some(r) => {
                if *r != symbol {
                    self.errors += 1;
                }
                self.index += 1;
            }
            None => {
                if self.desync_samples == 0 {
                    debug!("frame longer than reference, excluding samples");
                }
                self.desync_samples += 1;
            }
        }
    }
}

/// Symbol error rate against a known reference frame.
///
/// Every frame-boundary tag closes the current frame. With the output enabled,
/// the rolling average over the last [`HISTORY_SIZE`] frames is emitted at each
/// boundary before the closing frame is added, or the partial SER of the first
/// frame while there is no history yet.
///
/// # Stream Inputs
///
/// `input`: Received symbols with frame-boundary tags
///
/// # Stream Outputs
///
/// `output`: Rolling average SER, one item per boundary (only if enabled)
pub struct SerAccumulator<I = DefaultCpuReader<u8>, O = DefaultCpuWriter<f32>>
where
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = f32>,
{
    input: I,
    output: O,
    output_enabled: bool,
    boundary_key: String,
    stats: SerStats,
}

impl<I, O> SerAccumulator<I, O>
where
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = f32>,
{
    /// Load the reference frame from a file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reference = std::fs::read(path).map_err(|source| Error::ReferenceLoad {
            path: path.to_path_buf(),
            source,
        })?;
        if reference.is_empty() {
            return Err(Error::EmptyReference {
                path: path.to_path_buf(),
            });
        }
        info!(
            "loaded reference file {} ({} bytes)",
            path.display(),
            reference.len()
        );
        Self::from_reference(reference)
    }

    /// Use an in-memory reference frame.
    pub fn from_reference(reference: Vec<u8>) -> Result<Self> {
        if reference.is_empty() {
            return Err(Error::invalid("reference", "must not be empty"));
        }
        Ok(Self {
            input: I::default(),
            output: O::default(),
            output_enabled: false,
            boundary_key: PHASE_EST.to_string(),
            stats: SerStats::new(reference),
        })
    }

    /// Emit the rolling average at every frame boundary.
    pub fn with_output(mut self) -> Self {
        self.output_enabled = true;
        self
    }

    /// Close frames on tags with this key instead of `phase_est`.
    pub fn with_boundary_key(mut self, key: impl Into<String>) -> Self {
        self.boundary_key = key.into();
        self
    }

    /// Frame length, the reference length.
    pub fn frame_length(&self) -> usize {
        self.stats.reference.len()
    }

    /// SER of the completed frames still in the history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.stats.history.iter().copied()
    }

    /// Mean SER over the history.
    pub fn rolling_average(&self) -> Option<f64> {
        self.stats.rolling_average()
    }

    /// SER of the frame in progress.
    pub fn current_frame_ser(&self) -> Option<f64> {
        self.stats.current_frame_ser()
    }

    /// Frame boundaries seen.
    pub fn total_frames(&self) -> u64 {
        self.stats.total_frames
    }

    /// Latest aggregate report.
    pub fn last_report(&self) -> Option<SerReport> {
        self.stats.last_report
    }

    /// Samples past the end of the reference, excluded from the tally.
    pub fn desync_samples(&self) -> u64 {
        self.stats.desync_samples
    }
}

impl<I, O> Kernel for SerAccumulator<I, O>
where
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = f32>,
{
    fn work(&mut self, io: &mut WorkIo) -> anyhow::Result<()> {
        let finished = self.input.finished();
        let (input, in_tags) = self.input.slice_with_tags();
        let output = self.output.slice();
        let stats = &mut self.stats;

        let mut i = 0;
        let mut o = 0;
        let mut t = 0;

        while i < input.len() {
            let mut boundary = false;
            while t < in_tags.len() && in_tags[t].index == i {
                boundary |= in_tags[t].tag.has_key(&self.boundary_key);
                t += 1;
            }

            if boundary {
                let emits = self.output_enabled && stats.has_received();
                if emits {
                    if o == output.len() {
                        break;
                    }
                    output[o] = stats
                        .rolling_average()
                        .or_else(|| stats.current_frame_ser())
                        .unwrap_or(0.0) as f32;
                    o += 1;
                }
                stats.finish_frame();
            }

            stats.compare(input[i]);
            i += 1;
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

impl<I, O> StreamInput for SerAccumulator<I, O>
where
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = f32>,
{
    type Input = I;
    fn input(&mut self) -> &mut I {
        &mut self.input
    }
}

impl<I, O> StreamOutput for SerAccumulator<I, O>
where
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = f32>,
{
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }
}
