//! Deterministic RNG streams derived from a single user-visible game seed.
//!
//! Each consumer (role dealing, deck shuffles, governor pick) gets its own
//! stream so that adding draws to one never shifts the others.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use crate::constants::{STREAM_DECK, STREAM_GOVERNOR, STREAM_ROLES};

/// Derive the seed for a named stream from the game seed.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length, so this cannot fail for an 8-byte key.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Build the RNG for a named stream.
#[must_use]
pub fn stream_rng(user_seed: u64, domain_tag: &[u8]) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_stream_seed(user_seed, domain_tag))
}

/// Independent RNG streams used while setting up and playing a seeded game.
#[derive(Debug, Clone)]
pub struct GameRng {
    pub roles: ChaCha20Rng,
    pub deck: ChaCha20Rng,
    pub governor: ChaCha20Rng,
}

impl GameRng {
    /// Construct every stream from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            roles: stream_rng(seed, STREAM_ROLES),
            deck: stream_rng(seed, STREAM_DECK),
            governor: stream_rng(seed, STREAM_GOVERNOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn streams_are_stable_and_distinct() {
        let a = derive_stream_seed(1337, b"deck");
        assert_eq!(a, derive_stream_seed(1337, b"deck"));
        assert_ne!(a, derive_stream_seed(1337, b"roles"));
        assert_ne!(a, derive_stream_seed(1338, b"deck"));
    }

    #[test]
    fn bundle_streams_do_not_share_state() {
        let mut first = GameRng::from_user_seed(42);
        let mut second = GameRng::from_user_seed(42);
        // Draining one stream leaves its siblings where they were.
        for _ in 0..16 {
            first.deck.next_u64();
        }
        assert_eq!(first.roles.next_u64(), second.roles.next_u64());
        assert_eq!(first.governor.next_u64(), second.governor.next_u64());
    }
}
