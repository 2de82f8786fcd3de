//! Seedable Gaussian noise for sensor and motor models.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Noise source backed by a ChaCha stream, reproducible for a given seed and stream id.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: ChaCha8Rng,
}

impl NoiseGenerator {
    /// Without a seed the generator draws one from the process RNG.
    pub fn new(seed: Option<u64>) -> Self {
        Self::stream(resolve_seed(seed), 0)
    }

    /// Independent stream `stream` of the sequence identified by `seed`.
    pub fn stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }

    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }
}

pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}
