use hopdsp::Constellation;
use hopdsp::HoldInterpolator;
use hopdsp::Interpolator;
use num_complex::Complex32;

use crate::hop::FrameLayout;
use crate::runtime::DefaultCpuReader;
use crate::runtime::DefaultCpuWriter;
use crate::runtime::Error;
use crate::runtime::Kernel;
use crate::runtime::Result;
use crate::runtime::StreamInput;
use crate::runtime::StreamOutput;
use crate::runtime::WorkIo;
use crate::runtime::buffer::CpuBufferReader;
use crate::runtime::buffer::CpuBufferWriter;

/// Baseband PSK modulator working on whole symbol frames.
///
/// Each frame of symbol indices is mapped onto the constellation, interpolated
/// by the oversampling factor, and zero padded to the modulator frame length
/// of the hop rate.
///
/// # Stream Inputs
///
/// `input`: Symbol frames
///
/// # Stream Outputs
///
/// `output`: Complex baseband frames
pub struct PskMod<
    P = HoldInterpolator,
    I = DefaultCpuReader<u8>,
    O = DefaultCpuWriter<Complex32>,
> where
    P: Interpolator,
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = Complex32>,
{
    input: I,
    output: O,
    constellation: Constellation,
    interpolator: P,
    frame_symbols: usize,
    frame_samples: usize,
    frames: u64,
}

impl<I, O> PskMod<HoldInterpolator, I, O>
where
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = Complex32>,
{
    /// Create a modulator with rectangular pulses.
    pub fn new(hop_rate: u32, m_order: usize, oversampling: usize) -> Result<Self> {
        if oversampling == 0 {
            return Err(Error::invalid("oversampling", "must be positive"));
        }
        Self::with_interpolator(hop_rate, m_order, HoldInterpolator::new(oversampling))
    }
}

impl<P, I, O> PskMod<P, I, O>
where
    P: Interpolator,
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = Complex32>,
{
    /// Create a modulator with the given pulse-shaping interpolator.
    ///
    /// The oversampling factor is the interpolation factor.
    pub fn with_interpolator(hop_rate: u32, m_order: usize, interpolator: P) -> Result<Self> {
        let constellation = Constellation::psk(m_order).ok_or_else(|| {
            Error::invalid("m_order", format!("must be 2, 4 or 8, got {m_order}"))
        })?;
        let oversampling = interpolator.factor();
        if oversampling == 0 {
            return Err(Error::invalid("oversampling", "must be positive"));
        }
        let frame_symbols = FrameLayout::symbols_for(hop_rate);
        let frame_samples = FrameLayout::samples_per_frame(hop_rate, oversampling);
        if frame_symbols * oversampling > frame_samples {
            return Err(Error::invalid(
                "hop_rate",
                format!(
                    "{frame_symbols} symbols at {oversampling}x do not fit {frame_samples} samples"
                ),
            ));
        }
        debug!(
            "psk mod: M={m_order}, {frame_symbols} symbols -> {frame_samples} samples per frame"
        );
        Ok(Self {
            input: I::default(),
            output: O::default(),
            constellation,
            interpolator,
            frame_symbols,
            frame_samples,
            frames: 0,
        })
    }

    /// Input frame length in symbols.
    pub fn frame_symbols(&self) -> usize {
        self.frame_symbols
    }

    /// Output frame length in samples.
    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }

    /// Frames modulated so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Constellation in use.
    pub fn constellation(&self) -> &Constellation {
        &self.constellation
    }
}

impl<P, I, O> Kernel for PskMod<P, I, O>
where
    P: Interpolator,
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = Complex32>,
{
    fn work(&mut self, io: &mut WorkIo) -> anyhow::Result<()> {
        let finished = self.input.finished();
        let input = self.input.slice();
        let output = self.output.slice();

        let n = (input.len() / self.frame_symbols).min(output.len() / self.frame_samples);
        let os = self.interpolator.factor();

        for f in 0..n {
            let symbols = &input[f * self.frame_symbols..(f + 1) * self.frame_symbols];
            let frame = &mut output[f * self.frame_samples..(f + 1) * self.frame_samples];
            self.interpolator.reset();
            for (s, chunk) in symbols.iter().zip(frame.chunks_exact_mut(os)) {
                self.interpolator
                    .interpolate(self.constellation.map(*s), chunk);
            }
            frame[self.frame_symbols * os..].fill(Complex32::new(0.0, 0.0));
        }

        let rest = input.len() - n * self.frame_symbols;
        self.input.consume(n * self.frame_symbols);
        self.output.produce(n * self.frame_samples);
        self.frames += n as u64;

        if finished && rest < self.frame_symbols {
            io.finished = true;
        }
        Ok(())
    }
}

impl<P, I, O> StreamInput for PskMod<P, I, O>
where
    P: Interpolator,
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = Complex32>,
{
    type Input = I;
    fn input(&mut self) -> &mut I {
        &mut self.input
    }
}

impl<P, I, O> StreamOutput for PskMod<P, I, O>
where
    P: Interpolator,
    I: CpuBufferReader<Item = u8>,
    O: CpuBufferWriter<Item = Complex32>,
{
    type Output = O;
    fn output(&mut self) -> &mut O {
        &mut self.output
    }
}
