//! PSK constellations
use num_complex::Complex32;
use std::f32::consts::PI;

/// M-ary PSK constellation with unit-energy points.
///
/// BPSK uses the real axis (`+1`, `-1`); higher orders place point `k` at
/// `exp(j·2πk/M)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constellation {
    points: Vec<Complex32>,
}

impl Constellation {
    /// Modulation orders this constellation supports.
    pub const SUPPORTED_ORDERS: [usize; 3] = [2, 4, 8];

    /// PSK constellation of the given order, `None` for unsupported orders.
    pub fn psk(order: usize) -> Option<Self> {
        let points = match order {
            2 => vec![Complex32::new(1.0, 0.0), Complex32::new(-1.0, 0.0)],
            4 | 8 => (0..order)
                .map(|k| Complex32::from_polar(1.0, 2.0 * PI * k as f32 / order as f32))
                .collect(),
            _ => return None,
        };
        Some(Self { points })
    }

    /// Number of points.
    pub fn order(&self) -> usize {
        self.points.len()
    }

    /// Constellation points.
    pub fn points(&self) -> &[Complex32] {
        &self.points
    }

    /// Map a symbol index to its point. Out-of-range indices map to point 0.
    pub fn map(&self, symbol: u8) -> Complex32 {
        self.points
            .get(symbol as usize)
            .copied()
            .unwrap_or(self.points[0])
    }

    /// Hard decision: index of the nearest point.
    pub fn decide(&self, sample: Complex32) -> u8 {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (k, p) in self.points.iter().enumerate() {
            let d = (sample - p).norm_sqr();
            if d < best_dist {
                best_dist = d;
                best = k;
            }
        }
        best as u8
    }
}
