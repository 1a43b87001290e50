//! Seeded random stream with a resumable position.
//!
//! Same seed and same position produce the same draws, which is what makes
//! replays bit-identical and snapshots resumable.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Serialized form of [`SimRng`]: the seed plus the ChaCha word position,
/// split into two halves so every serializer can carry it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngPosition {
    pub seed: u64,
    pub word_pos_hi: u64,
    pub word_pos_lo: u64,
}

/// Deterministic random stream for the simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RngPosition", into = "RngPosition")]
pub struct SimRng {
    seed: u64,
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn position(&self) -> RngPosition {
        let pos = self.inner.get_word_pos();
        RngPosition {
            seed: self.seed,
            word_pos_hi: (pos >> 64) as u64,
            word_pos_lo: pos as u64,
        }
    }

    pub fn from_position(p: RngPosition) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(p.seed);
        inner.set_word_pos(((p.word_pos_hi as u128) << 64) | p.word_pos_lo as u128);
        Self {
            seed: p.seed,
            inner,
        }
    }

    /// Uniform draw in [0, 1).
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform draw in [lo, hi). Returns `lo` for an empty range.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if !(hi > lo) {
            return lo;
        }
        self.inner.gen_range(lo..hi)
    }

    /// True with probability `p` (clamped to [0,1]). Always consumes one draw.
    pub fn chance(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.unit() < p
    }

    /// Index drawn proportionally to integer weights. Always consumes one
    /// draw; returns `None` when every weight is zero.
    pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|w| *w as u64).sum();
        let u = self.unit();
        if total == 0 {
            return None;
        }
        let target = (u * total as f64) as u64;
        let mut acc = 0u64;
        for (i, w) in weights.iter().enumerate() {
            acc += *w as u64;
            if target < acc {
                return Some(i);
            }
        }
        weights.iter().rposition(|w| *w > 0)
    }
}

impl PartialEq for SimRng {
    fn eq(&self, other: &Self) -> bool {
        self.position() == other.position()
    }
}

impl From<RngPosition> for SimRng {
    fn from(p: RngPosition) -> Self {
        SimRng::from_position(p)
    }
}

impl From<SimRng> for RngPosition {
    fn from(r: SimRng) -> Self {
        r.position()
    }
}
