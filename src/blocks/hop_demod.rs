use hopdsp::Mixer;
use hopdsp::Rotator;
use num_complex::Complex32;
use std::f64::consts::PI;

use crate::hop::FrequencyTable;
use crate::hop::HOP_SEQUENCE_SEED;
use crate::hop::HopParameters;
use crate::hop::HopSequence;
use crate::hop::SlotClock;
use crate::hop::SlotState;
use crate::runtime::DefaultCpuReader;
use crate::runtime::DefaultCpuWriter;
use crate::runtime::Kernel;
use crate::runtime::RX_TIME;
use crate::runtime::Result;
use crate::runtime::StreamInput;
use crate::runtime::StreamOutput;
use crate::runtime::TimeSpec;
use crate::runtime::WorkIo;
use crate::runtime::buffer::CpuBufferReader;
use crate::runtime::buffer::CpuBufferWriter;

#[derive(Debug)]
struct Tuner {
    table: FrequencyTable,
    sequence: HopSequence,
    clock: SlotClock,
    sample_rate: f64,
    samples_per_hop: f64,
    state: SlotState,
    mixer: Rotator,
}

impl Tuner {
    fn sequence_index(&self) -> usize {
        self.clock
            .sequence_index(self.state.slot_index, self.state.hop_count)
    }

    fn tune(&mut self) -> f64 {
        let freq = self.table.frequency(self.sequence.channel(self.sequence_index()));
        self.mixer.set_phase(0.0);
        self.mixer.set_frequency(2.0 * PI * freq / self.sample_rate);
        freq
    }

    fn align(&mut self, rx_time: TimeSpec) {
        let rx = self.clock.rx_alignment(rx_time);
        self.state.reset(rx, 0.0);
        self.state.current_frequency = self.tune();
        debug!(
            "rx aligned at {rx_time}: slot {}, sequence index {}, elapsed {:.1} samples, {} Hz",
            rx.slot_index,
            self.sequence_index(),
            rx.elapsed_samples,
            self.state.current_frequency
        );
    }

    /// Mix down samples up to the next hop boundary. Returns the number consumed.
    fn mix_down(&mut self, input: &[Complex32], output: &mut [Complex32]) -> usize {
        if self.state.step(self.samples_per_hop) {
            self.state.current_frequency = self.tune();
            trace!(
                "hop {}: {} Hz",
                self.state.hop_count, self.state.current_frequency
            );
        }
        let len = self
            .state
            .samples_until_hop(self.samples_per_hop)
            .min(input.len());
        let (n, _) = self.mixer.mix_down_block(&input[..len], output);
        self.state.advance(n);
        n
    }
}

/// Hop demodulator
///
/// Follows the hop sequence from the last `rx_time` tag and mixes every sample
/// back to baseband. An `rx_time` tag locates its sample in the slot grid and
/// restarts hop tracking there. Until the first one arrives, samples pass
/// through unmodified. Tags are forwarded at the same positions.
///
/// # Stream Inputs
///
/// `input`: Hopped samples with `rx_time` tags
///
/// # Stream Outputs
///
/// `output`: Baseband samples
pub struct HopDemod<I = DefaultCpuReader<Complex32>, O = DefaultCpuWriter<Complex32>>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    input: I,
    output: O,
    tuner: Tuner,
    passthrough_samples: u64,
    malformed_tags: u64,
}

impl<I, O> HopDemod<I, O>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    /// Create a hop demodulator.
    pub fn new(params: HopParameters) -> Result<Self> {
        let table = FrequencyTable::new(&params);
        let sequence = HopSequence::new(table.len(), HOP_SEQUENCE_SEED)?;
        let clock = SlotClock::from_params(&params, sequence.len())?;
        info!(
            "hop demod: {} channels, {} hops/s, {} Hz, {} samples per hop",
            table.len(),
            params.hop_rate(),
            params.sample_rate(),
            params.samples_per_hop()
        );
        Ok(Self {
            input: I::default(),
            output: O::default(),
            tuner: Tuner {
                table,
                sequence,
                clock,
                sample_rate: params.sample_rate(),
                samples_per_hop: params.samples_per_hop(),
                state: SlotState::default(),
                mixer: Rotator::default(),
            },
            passthrough_samples: 0,
            malformed_tags: 0,
        })
    }

    /// Whether an `rx_time` tag was received.
    pub fn has_time_reference(&self) -> bool {
        self.tuner.state.has_time_reference
    }

    /// Hops since the last time reference.
    pub fn hop_count(&self) -> u64 {
        self.tuner.state.hop_count
    }

    /// Frequency currently removed, zero before the first time reference.
    pub fn current_frequency(&self) -> f64 {
        self.tuner.state.current_frequency
    }

    /// Channel currently tracked, `None` before the first time reference.
    pub fn current_channel(&self) -> Option<usize> {
        self.has_time_reference()
            .then(|| self.tuner.sequence.channel(self.tuner.sequence_index()))
    }

    /// Hop sequence position currently tracked.
    pub fn sequence_index(&self) -> Option<usize> {
        self.has_time_reference().then(|| self.tuner.sequence_index())
    }

    /// Hop tracking state.
    pub fn slot_state(&self) -> SlotState {
        self.tuner.state
    }

    /// Samples passed through without a time reference.
    pub fn passthrough_samples(&self) -> u64 {
        self.passthrough_samples
    }

    /// `rx_time` tags ignored for carrying no timestamp.
    pub fn malformed_tags(&self) -> u64 {
        self.malformed_tags
    }
}

impl<I, O> Kernel for HopDemod<I, O>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    fn work(&mut self, io: &mut WorkIo) -> anyhow::Result<()> {
        let finished = self.input.finished();
        let (input, in_tags) = self.input.slice_with_tags();
        let (output, mut out_tags) = self.output.slice_with_tags();

        let n = input.len().min(output.len());
        let mut t = 0;

        let mut i = 0;
        while i < n {
            while t < in_tags.len() && in_tags[t].index == i {
                let tag = &in_tags[t].tag;
                if tag.has_key(RX_TIME) {
                    match tag.time_named(RX_TIME) {
                        Some(rx_time) => self.tuner.align(rx_time),
                        None => {
                            warn!("ignoring rx_time tag without timestamp: {tag:?}");
                            self.malformed_tags += 1;
                        }
                    }
                }
                out_tags.add_tag(i, tag.clone());
                t += 1;
            }

            let end = in_tags.get(t).map_or(n, |tag| tag.index.min(n));
            if self.tuner.state.has_time_reference {
                i += self.tuner.mix_down(&input[i..end], &mut output[i..end]);
            } else {
                output[i..end].copy_from_slice(&input[i..end]);
                self.passthrough_samples += (end - i) as u64;
                i = end;
            }
        }

        let done = finished && n == input.len();
        self.input.consume(n);
        self.output.produce(n);

        if done {
            io.finished = true;
        }
        Ok(())
    }
}

impl<I, O> StreamInput for HopDemod<I, O>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    type Input = I;
    fn input(&mut self) -> &mut I {
        &mut self.input
    }
}

impl<I, O> StreamOutput for HopDemod<I, O>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }
}
