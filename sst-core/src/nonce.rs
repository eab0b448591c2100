//! Random nonces for new timestamps

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sst_types::Nonce;

/// Source of fresh 16-byte nonces.
///
/// `StdRng` seeded from OS entropy is cryptographically secure and `Send`,
/// so a generator can move between tasks.
pub struct NonceGenerator {
    rng: StdRng,
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn generate(&mut self) -> Nonce {
        let mut bytes = [0u8; Nonce::LEN];
        self.rng.fill_bytes(&mut bytes);
        Nonce::new(bytes)
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}
