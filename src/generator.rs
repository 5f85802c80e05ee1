//! Random fill-in of latent factors for newly seen users and items.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::factor::LatentFactor;

/// Source of fresh latent factors.
///
/// For a fixed seed, the sequence of values must be reproducible.
pub trait FactorGenerator {
    fn set_seed(&mut self, seed: u64);

    fn next_value(&mut self) -> LatentFactor;
}

/// Draws the bias and then `rank` vector components uniformly from `[0, 1)`.
///
/// The stream for a seed must stay bit-identical across releases.
pub struct RandomFactorGenerator {
    rank: usize,
    rng: ChaCha8Rng,
}

impl RandomFactorGenerator {
    #[must_use]
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    #[must_use]
    pub fn with_seed(rank: usize, seed: u64) -> Self {
        let mut generator = Self::new(rank);
        generator.set_seed(seed);
        generator
    }
}

impl FactorGenerator for RandomFactorGenerator {
    fn set_seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    fn next_value(&mut self) -> LatentFactor {
        let bias = self.rng.gen::<f32>();
        let vector = (0..self.rank).map(|_| self.rng.gen::<f32>()).collect::<Vec<_>>();
        LatentFactor::new(bias, vector)
    }
}
