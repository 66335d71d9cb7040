use hopdsp::Mixer;
use hopdsp::Rotator;
use num_complex::Complex32;
use std::f64::consts::PI;

use crate::hop::FrequencyTable;
use crate::hop::HOP_SEQUENCE_SEED;
use crate::hop::HopParameters;
use crate::hop::HopSequence;
use crate::hop::SlotClock;
use crate::hop::SystemClock;
use crate::hop::TimeSource;
use crate::hop::TxAlignment;
use crate::runtime::DefaultCpuReader;
use crate::runtime::DefaultCpuWriter;
use crate::runtime::Error;
use crate::runtime::Kernel;
use crate::runtime::Result;
use crate::runtime::StreamInput;
use crate::runtime::StreamOutput;
use crate::runtime::TX_TIME;
use crate::runtime::Tag;
use crate::runtime::WorkIo;
use crate::runtime::buffer::CpuBufferReader;
use crate::runtime::buffer::CpuBufferWriter;

/// Hop modulator
///
/// Shifts each vector of `vlen` samples to the channel of its hop. On the first
/// vector the modulator reads its time source and waits for the next slot
/// boundary: the hop counter starts at that slot, and the first output sample
/// carries a `tx_time` tag with the slot start time so the radio can schedule
/// the burst. The mixer phase restarts at zero for every hop.
///
/// # Stream Inputs
///
/// `input`: Baseband samples, one hop per `vlen` samples
///
/// # Stream Outputs
///
/// `output`: Hopped samples
pub struct HopMod<
    C = SystemClock,
    I = DefaultCpuReader<Complex32>,
    O = DefaultCpuWriter<Complex32>,
> where
    C: TimeSource,
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    input: I,
    output: O,
    table: FrequencyTable,
    sequence: HopSequence,
    clock: SlotClock,
    time_source: C,
    sample_rate: f64,
    vlen: usize,
    mixer: Rotator,
    alignment: Option<TxAlignment>,
    hop_count: usize,
    hops: u64,
}

impl<C, I, O> HopMod<C, I, O>
where
    C: TimeSource,
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    /// Create a hop modulator.
    pub fn new(params: HopParameters, vlen: usize, time_source: C) -> Result<Self> {
        if vlen == 0 {
            return Err(Error::invalid("vlen", "must be positive"));
        }
        let table = FrequencyTable::new(&params);
        let sequence = HopSequence::new(table.len(), HOP_SEQUENCE_SEED)?;
        let clock = SlotClock::from_params(&params, sequence.len())?;
        info!(
            "hop mod: {} channels, {} hops/s, {} samples per hop vector",
            table.len(),
            params.hop_rate(),
            vlen
        );
        if (params.samples_per_hop() - vlen as f64).abs() > 0.5 {
            warn!(
                "hop vector of {vlen} samples does not match {} samples per slot",
                params.samples_per_hop()
            );
        }
        Ok(Self {
            input: I::default(),
            output: O::default(),
            table,
            sequence,
            clock,
            time_source,
            sample_rate: params.sample_rate(),
            vlen,
            mixer: Rotator::default(),
            alignment: None,
            hop_count: 0,
            hops: 0,
        })
    }

    /// Slot alignment, once the first vector was processed.
    pub fn alignment(&self) -> Option<TxAlignment> {
        self.alignment
    }

    /// Hop counter of the next vector.
    pub fn hop_count(&self) -> usize {
        self.hop_count
    }

    /// Channel of the next vector.
    pub fn next_channel(&self) -> usize {
        self.sequence.channel(self.hop_count)
    }

    /// Hops transmitted.
    pub fn hops(&self) -> u64 {
        self.hops
    }

    /// Channel grid.
    pub fn frequency_table(&self) -> &FrequencyTable {
        &self.table
    }

    /// Hop sequence.
    pub fn hop_sequence(&self) -> &HopSequence {
        &self.sequence
    }
}

impl<C, I, O> Kernel for HopMod<C, I, O>
where
    C: TimeSource,
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    fn work(&mut self, io: &mut WorkIo) -> anyhow::Result<()> {
        let finished = self.input.finished();
        let input = self.input.slice();
        let (output, mut out_tags) = self.output.slice_with_tags();

        let n = input.len().min(output.len()) / self.vlen;

        if n > 0 && self.alignment.is_none() {
            let now = self.time_source.now();
            let a = self.clock.tx_alignment(now);
            info!(
                "tx aligned at {now}: start slot {}, start time {}, hop count {}",
                a.start_slot, a.start_time, a.hop_count
            );
            self.hop_count = a.hop_count;
            self.alignment = Some(a);
            out_tags.add_tag(0, Tag::NamedTime(TX_TIME.to_string(), a.start_time));
        }

        for v in 0..n {
            let range = v * self.vlen..(v + 1) * self.vlen;
            let freq = self.table.frequency(self.sequence.channel(self.hop_count));
            trace!("hop {}: {freq} Hz", self.hop_count);
            self.mixer.set_phase(0.0);
            self.mixer.set_frequency(2.0 * PI * freq / self.sample_rate);
            self.mixer.mix_up_block(&input[range.clone()], &mut output[range]);
            self.hop_count = (self.hop_count + 1) % self.sequence.len();
            self.hops += 1;
        }

        let rest = input.len() - n * self.vlen;
        self.input.consume(n * self.vlen);
        self.output.produce(n * self.vlen);

        if finished && rest < self.vlen {
            io.finished = true;
        }
        Ok(())
    }
}

impl<C, I, O> StreamInput for HopMod<C, I, O>
where
    C: TimeSource,
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    type Input = I;
    fn input(&mut self) -> &mut I {
        &mut self.input
    }
}

impl<C, I, O> StreamOutput for HopMod<C, I, O>
where
    C: TimeSource,
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }
}
