//! Seedable pseudo-random source.
//!
//! The engine never touches system randomness. Every stochastic decision
//! (pill placement, fruit spawning) draws from one [`GameRng`] seeded by the
//! game configuration, so a game is fully reproducible from its seed. The
//! state is part of snapshots.

use serde::{Deserialize, Serialize};

/// Simple deterministic 64-bit congruential generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state
    }

    /// Uniform fraction in `[0, 1)` built from the high 53 bits.
    pub fn next_fraction(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Bernoulli draw: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_fraction() <= p
    }

    /// Uniform index into a collection of `len` elements.
    ///
    /// `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() needs a non-empty range");
        (self.next_u64() % len as u64) as usize
    }

    /// Uniformly chosen element, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.index(items.len())])
        }
    }
}
