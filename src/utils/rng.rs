//! Deterministic seeding helpers.
//!
//! - `RngStream`: the reproducible PRNG used across the crate (ChaCha8)
//! - `SeedSequence`: expands one root seed into independent sub-seeds, e.g. one
//!   for the scripted engine's traffic and one for an agent's exploration

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub type RngStream = ChaCha8Rng;

/// SplitMix64 expansion of a root seed.
#[derive(Clone, Debug)]
pub struct SeedSequence {
    state: u64,
}

impl SeedSequence {
    pub fn new(seed: u64) -> Self { Self { state: seed } }

    /// Next sub-seed in the sequence.
    pub fn next_subseed(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// RNG stream seeded from the next sub-seed.
    pub fn next_rng(&mut self) -> RngStream { rng_from_seed(self.next_subseed()) }
}

pub fn rng_from_seed(seed: u64) -> RngStream { RngStream::seed_from_u64(seed) }
