use crate::{
    credential::Password,
    crypto::base::KdfParams,
    identity::Identity,
};
use rand::SeedableRng;

/// A deterministic RNG so test failures are reproducible.
pub(crate) fn rng() -> rand_chacha::ChaCha20Rng {
    rng_seeded(b"hi hungry, i'm dad")
}

/// A deterministic RNG from any old seed.
pub(crate) fn rng_seeded(seed: &[u8]) -> rand_chacha::ChaCha20Rng {
    rand_chacha::ChaCha20Rng::from_seed(*blake3::hash(seed).as_bytes())
}

/// Argon2 at its cheapest, so keystore tests don't crawl.
pub(crate) fn kdf() -> KdfParams {
    KdfParams::new(1, 64)
}

pub(crate) fn password(pass: &str) -> Password {
    Password::new(pass.to_string()).unwrap()
}

pub(crate) fn setup_identity() -> (rand_chacha::ChaCha20Rng, Identity) {
    let mut rng = rng();
    let identity = Identity::generate(&mut rng);
    (rng, identity)
}
