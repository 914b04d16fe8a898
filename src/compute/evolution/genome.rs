//! Random number stream for genome operations.
//!
//! Every random draw of a run (shape construction, mutation, crossover,
//! parent selection) goes through one [`GenomeRng`] owned by the engine, so
//! a seeded run is reproducible.

use rand::prelude::*;
use rand_distr::StandardNormal;

/// Random number generator wrapper for genome operations.
#[derive(Debug, Clone)]
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform integer in `[lo, hi)`. Returns `lo` for an empty range.
    pub fn int_in(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    /// Uniform index in `[0, len)`.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }

    /// Uniform real in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Uniform real in `[min, max]`.
    pub fn uniform(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Fair coin.
    pub fn coin(&mut self) -> bool {
        self.rng.r#gen::<bool>()
    }

    /// Gaussian noise with mean 0 and the given standard deviation.
    pub fn gaussian(&mut self, sigma: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * sigma
    }
}
