//! Injectable randomness.
//!
//! The engine never reaches for a global RNG. Every operation that samples
//! takes a `&mut impl RandomSource`; any `rand::Rng` qualifies, so tests pass
//! a seeded `Mcg128Xsl64` or a `StepRng` and get the same answer every run.

use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;

/// Source of uniform random numbers.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize {
        let scaled = (self.next_unit() * len as f64) as usize;
        scaled.min(len.saturating_sub(1))
    }
}

impl<R: Rng> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.gen_range(0..len)
    }
}

/// Production generator: seeded for reproducible runs, entropy otherwise.
pub fn engine_rng(seed: Option<u64>) -> Mcg128Xsl64 {
    match seed {
        Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
        None => Mcg128Xsl64::from_entropy(),
    }
}
