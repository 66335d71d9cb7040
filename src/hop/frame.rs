use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::Uniform;
use rand_chacha::ChaCha8Rng;

use crate::runtime::Error;
use crate::runtime::Result;

/// Symbol rate in symbols per second the frame table is defined for.
pub const SYMBOL_RATE: u32 = 2400;

/// Seed of the synchronisation header.
pub const HEADER_SEED: u64 = 2025;

/// Largest frame in symbols, and in samples per oversampling step.
pub const MAX_FRAME: usize = 500;

// hop rate -> (head, payload, head + payload, pad, total) per 1000 symbols/s
const LAYOUTS: [(u32, [f64; 5]); 6] = [
    (5, [45.0, 135.0, 180.0, 20.0, 200.0]),
    (10, [22.5, 67.5, 90.0, 10.0, 100.0]),
    (20, [11.25, 33.75, 45.0, 5.0, 50.0]),
    (50, [4.167, 12.5, 16.667, 3.332, 20.0]),
    (100, [2.083, 6.25, 8.333, 1.667, 10.0]),
    (110, [2.5, 5.0, 7.5, 1.563, 9.063]),
];

fn scaled(coefficients: &[f64; 5], rate: f64) -> [usize; 5] {
    coefficients.map(|c| (c * rate / 1000.0).round() as usize)
}

/// Per-hop frame structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    /// Header symbols
    pub head: usize,
    /// Payload symbols
    pub payload: usize,
    /// Guard symbols after the payload
    pub pad: usize,
    /// Total symbol periods per hop
    pub total: usize,
}

impl FrameLayout {
    /// Layout used for hop rates missing from the table.
    pub const DEFAULT: FrameLayout = FrameLayout {
        head: 108,
        payload: 324,
        pad: 48,
        total: 480,
    };

    /// Hop rates with a tabulated layout.
    pub fn supported_hop_rates() -> impl Iterator<Item = u32> {
        LAYOUTS.iter().map(|(r, _)| *r)
    }

    /// Tabulated layout for a hop rate.
    pub fn lookup(hop_rate: u32) -> Result<Self> {
        let (_, c) = LAYOUTS
            .iter()
            .find(|(r, _)| *r == hop_rate)
            .ok_or(Error::UnsupportedHopRate(hop_rate))?;
        let [head, payload, _, pad, total] = scaled(c, SYMBOL_RATE as f64);
        Ok(Self {
            head,
            payload,
            pad,
            total,
        })
    }

    /// Layout for a hop rate, falling back to [`FrameLayout::DEFAULT`].
    pub fn for_hop_rate(hop_rate: u32) -> Self {
        Self::lookup(hop_rate).unwrap_or_else(|e| {
            warn!("{e}, using default frame layout");
            Self::DEFAULT
        })
    }

    /// Frame length in symbols, clamped to `[1, 500]`.
    ///
    /// Unlisted hop rates give 432.
    pub fn symbols_for(hop_rate: u32) -> usize {
        match LAYOUTS.iter().find(|(r, _)| *r == hop_rate) {
            Some((_, c)) => scaled(c, SYMBOL_RATE as f64)[2].clamp(1, MAX_FRAME),
            None => Self::DEFAULT.head + Self::DEFAULT.payload,
        }
    }

    /// Symbols this layout carries, header plus payload.
    pub fn symbols(&self) -> usize {
        (self.head + self.payload).clamp(1, MAX_FRAME)
    }

    /// Modulated samples per hop frame at the given oversampling.
    ///
    /// The `total` coefficient is scaled at `2400 * oversampling` and clamped to
    /// `[1, 500 * oversampling]`. Unlisted hop rates give `480 * oversampling`.
    pub fn samples_per_frame(hop_rate: u32, oversampling: usize) -> usize {
        match LAYOUTS.iter().find(|(r, _)| *r == hop_rate) {
            Some((_, c)) => {
                let rate = (SYMBOL_RATE as usize * oversampling) as f64;
                scaled(c, rate)[4].clamp(1, MAX_FRAME * oversampling)
            }
            None => 480 * oversampling,
        }
    }
}

/// Builds the symbol frame of every hop.
///
/// Frames are a pseudo-random header from [`HEADER_SEED`] followed by a
/// pseudo-random payload from the information seed. Both are the same in
/// every frame, which is what lets the receiver measure the symbol error rate.
#[derive(Clone, Debug)]
pub struct SlotFrameBuilder {
    layout: FrameLayout,
    m_order: usize,
    info_seed: u64,
    payload: Vec<u8>,
    frames_built: u64,
}

impl SlotFrameBuilder {
    /// Create a frame builder. `m_order` must be 2, 4 or 8.
    pub fn new(hop_rate: u32, m_order: usize, info_seed: u64) -> Result<Self> {
        if !matches!(m_order, 2 | 4 | 8) {
            return Err(Error::invalid(
                "m_order",
                format!("must be 2, 4 or 8, got {m_order}"),
            ));
        }
        let layout = FrameLayout::for_hop_rate(hop_rate);
        let payload = symbols(info_seed, m_order, layout.payload);
        debug!(
            "slot frame: hop rate {hop_rate}, {} header + {} payload symbols, M={m_order}",
            layout.head, layout.payload
        );
        Ok(Self {
            layout,
            m_order,
            info_seed,
            payload,
            frames_built: 0,
        })
    }

    /// Frame layout in use.
    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Modulation order.
    pub fn m_order(&self) -> usize {
        self.m_order
    }

    /// Payload seed.
    pub fn info_seed(&self) -> u64 {
        self.info_seed
    }

    /// Frame length in symbols.
    pub fn frame_len(&self) -> usize {
        self.layout.head + self.layout.payload
    }

    /// The payload every frame carries.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Write the next frame into `out[..frame_len()]`.
    pub fn next_frame_into(&mut self, out: &mut [u8]) {
        let head = self.layout.head;
        fill_symbols(HEADER_SEED, self.m_order, &mut out[..head]);
        out[head..head + self.layout.payload].copy_from_slice(&self.payload);
        self.frames_built += 1;
    }

    /// Build the next frame.
    pub fn next_frame(&mut self) -> Vec<u8> {
        let mut frame = vec![0; self.frame_len()];
        self.next_frame_into(&mut frame);
        frame
    }

    /// Number of frames built.
    pub fn frames_built(&self) -> u64 {
        self.frames_built
    }
}

fn fill_symbols(seed: u64, m_order: usize, out: &mut [u8]) {
    // m_order is 2, 4 or 8
    let dist = Uniform::new(0, m_order as u8).unwrap_or_else(|_| unreachable!());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for s in out.iter_mut() {
        *s = dist.sample(&mut rng);
    }
}

fn symbols(seed: u64, m_order: usize, n: usize) -> Vec<u8> {
    let mut v = vec![0; n];
    fill_symbols(seed, m_order, &mut v);
    v
}

/// Reference payload for symbol error measurement.
pub fn reference_payload(hop_rate: u32, m_order: usize, info_seed: u64) -> Result<Vec<u8>> {
    Ok(SlotFrameBuilder::new(hop_rate, m_order, info_seed)?
        .payload()
        .to_vec())
}
