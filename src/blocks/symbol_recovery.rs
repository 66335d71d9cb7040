use num_complex::Complex32;
use serde::Deserialize;

use crate::runtime::CORR_EST;
use crate::runtime::DefaultCpuReader;
use crate::runtime::DefaultCpuWriter;
use crate::runtime::Error;
use crate::runtime::Kernel;
use crate::runtime::PHASE_EST;
use crate::runtime::Result;
use crate::runtime::StreamInput;
use crate::runtime::StreamOutput;
use crate::runtime::Tag;
use crate::runtime::WorkIo;
use crate::runtime::buffer::CpuBufferReader;
use crate::runtime::buffer::CpuBufferWriter;

/// Where the carrier phase estimate is removed.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Derotation {
    /// Multiply every emitted sample by `exp(-j·phase)`.
    #[default]
    InBlock,
    /// Emit samples unmodified, a later stage applies the forwarded `phase_est`.
    Downstream,
}

#[derive(Clone, Copy, Debug, Default)]
struct Trigger {
    offset: u64,
    strength: f64,
}

#[derive(Debug, Default)]
struct TimingState {
    counter: usize,
    phase_correction: f64,
    is_synced: bool,
    last: Option<Trigger>,
    accepted: u64,
    rejected: u64,
}

impl TimingState {
    // Spurious: too close to the last accepted trigger and weaker than it. A
    // trigger without a strength is never spurious.
    fn is_spurious(&self, offset: u64, strength: Option<f64>, sps: usize) -> bool {
        match (self.last, strength) {
            (Some(last), Some(s)) => offset - last.offset < sps as u64 && s < last.strength,
            _ => false,
        }
    }

    fn accept(&mut self, offset: u64, phase: f64, strength: Option<f64>) {
        self.counter = 0;
        self.is_synced = true;
        self.phase_correction = phase;
        self.last = Some(Trigger {
            offset,
            strength: strength.unwrap_or(0.0),
        });
        self.accepted += 1;
    }
}

/// Symbol timing recovery driven by `phase_est` triggers.
///
/// Emits one sample per symbol: the sample carrying a genuine trigger, then every
/// `sps` samples until the next genuine trigger realigns the grid. Nothing is
/// emitted before the first genuine trigger. A trigger is rejected if it lies
/// closer than `sps` samples to the last accepted one and its `corr_est` is
/// lower.
///
/// # Stream Inputs
///
/// `input`: Samples with `phase_est` and optional `corr_est` tags
///
/// # Stream Outputs
///
/// `output`: One sample per symbol, genuine triggers tagged with `phase_est`
pub struct SymbolTimingRecovery<I = DefaultCpuReader<Complex32>, O = DefaultCpuWriter<Complex32>>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    input: I,
    output: O,
    sps: usize,
    derotation: Derotation,
    state: TimingState,
    consumed: u64,
}

impl<I, O> SymbolTimingRecovery<I, O>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    /// Create symbol timing recovery that derotates in the block.
    pub fn new(sps: usize) -> Result<Self> {
        Self::with_derotation(sps, Derotation::InBlock)
    }

    /// Create symbol timing recovery with the given derotation mode.
    pub fn with_derotation(sps: usize, derotation: Derotation) -> Result<Self> {
        if sps == 0 {
            return Err(Error::invalid("sps", "must be positive"));
        }
        debug!("symbol timing recovery: sps {sps}, derotation {derotation:?}");
        Ok(Self {
            input: I::default(),
            output: O::default(),
            sps,
            derotation,
            state: TimingState::default(),
            consumed: 0,
        })
    }

    /// Whether a genuine trigger was seen.
    pub fn is_synced(&self) -> bool {
        self.state.is_synced
    }

    /// Phase of the last genuine trigger in radians.
    pub fn phase_correction(&self) -> f64 {
        self.state.phase_correction
    }

    /// Number of genuine triggers.
    pub fn accepted_triggers(&self) -> u64 {
        self.state.accepted
    }

    /// Number of triggers rejected as spurious.
    pub fn rejected_triggers(&self) -> u64 {
        self.state.rejected
    }

    /// Derotation mode.
    pub fn derotation(&self) -> Derotation {
        self.derotation
    }
}

impl<I, O> Kernel for SymbolTimingRecovery<I, O>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    fn work(&mut self, io: &mut WorkIo) -> anyhow::Result<()> {
        let finished = self.input.finished();
        let (input, in_tags) = self.input.slice_with_tags();
        let (output, mut out_tags) = self.output.slice_with_tags();
        let st = &mut self.state;

        let mut i = 0;
        let mut o = 0;
        let mut t = 0;

        while i < input.len() {
            let offset = self.consumed + i as u64;

            let mut phase = None;
            let mut strength = None;
            let mut next = t;
            while next < in_tags.len() && in_tags[next].index == i {
                let tag = &in_tags[next].tag;
                if tag.has_key(PHASE_EST) {
                    match tag.f64_named(PHASE_EST) {
                        Some(p) => phase = Some(p),
                        None => debug!("ignoring phase_est tag without f64 payload at {offset}"),
                    }
                } else if let Some(s) = tag.f64_named(CORR_EST) {
                    strength = Some(s);
                }
                next += 1;
            }

            let genuine = phase.is_some() && !st.is_spurious(offset, strength, self.sps);
            let emits = genuine || (st.is_synced && st.counter == self.sps);
            if emits && o == output.len() {
                break;
            }

            if let Some(p) = phase {
                if genuine {
                    st.accept(offset, p, strength);
                    trace!("trigger at {offset}, phase {p:.4}");
                } else {
                    st.rejected += 1;
                    debug!("rejected spurious trigger at {offset}, strength {strength:?}");
                }
            }

            if emits {
                output[o] = match self.derotation {
                    Derotation::InBlock => {
                        input[i] * Complex32::from_polar(1.0, -(st.phase_correction as f32))
                    }
                    Derotation::Downstream => input[i],
                };
                if genuine {
                    out_tags.add_tag(
                        o,
                        Tag::NamedF64(PHASE_EST.to_string(), st.phase_correction),
                    );
                }
                o += 1;
                st.counter = 0;
            }
            st.counter += 1;

            i += 1;
            t = next;
        }

        let done = finished && i == input.len();
        self.input.consume(i);
        self.output.produce(o);
        self.consumed += i as u64;

        if done {
            io.finished = true;
        }
        Ok(())
    }
}

impl<I, O> StreamInput for SymbolTimingRecovery<I, O>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    type Input = I;
    fn input(&mut self) -> &mut I {
        &mut self.input
    }
}

impl<I, O> StreamOutput for SymbolTimingRecovery<I, O>
where
    I: CpuBufferReader<Item = Complex32>,
    O: CpuBufferWriter<Item = Complex32>,
{
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }
}
