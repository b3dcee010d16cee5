//! Seeded run generator
//!
//! Wraps `Pcg32` (PCG-XSH-RR, 64-bit state, 32-bit output). The output
//! stream for a given seed is fixed by the PCG reference algorithm, so the
//! same seed and call sequence reproduce a run bit for bit.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// The single source of randomness for a run
#[derive(Debug, Clone)]
pub struct Prng {
    inner: Pcg32,
    draws: u64,
}

impl Prng {
    pub fn new(seed: u32) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed as u64),
            draws: 0,
        }
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform value in [0, 1)
    pub fn next(&mut self) -> f32 {
        self.draws += 1;
        // Scale in f64 and clamp so rounding to f32 can never produce 1.0
        let v = self.inner.next_u32() as f64 / 4_294_967_296.0;
        (v as f32).min(1.0 - f32::EPSILON / 2.0)
    }

    /// Uniform integer in `[min, max]` (inclusive)
    pub fn int_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        (self.next() * span).floor() as i32 + min
    }

    /// Uniform index in `[0, len)`; `len` must be non-zero
    pub fn index(&mut self, len: usize) -> usize {
        ((self.next() * len as f32).floor() as usize).min(len.saturating_sub(1))
    }

    /// Pick an item with probability proportional to `weight`
    ///
    /// Items are scanned in order; the first whose running weight reaches the
    /// roll wins. Falls back to the last item so float rounding can't miss.
    /// Returns `None` only for an empty slice.
    pub fn weighted_pick<'a, T, F>(&mut self, items: &'a [T], weight: F) -> Option<&'a T>
    where
        F: Fn(&T) -> f32,
    {
        let total: f32 = items.iter().map(&weight).sum();
        let roll = self.next() * total;
        let mut acc = 0.0;
        for item in items {
            acc += weight(item);
            if acc >= roll {
                return Some(item);
            }
        }
        items.last()
    }
}
