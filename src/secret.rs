//! Secret generation and the iterated-hash integrity fingerprint used to recognize a correctly
//! recovered secret.

use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length in bytes of the store's shielded secret.
pub const SECRET_LEN: usize = 32;

/// Number of SHA-256 iterations applied when computing the integrity fingerprint.
///
/// Iterating slows brute-force verification of a candidate recovered secret. This constant is
/// part of the on-disk format: a store loaded with a different value here would silently accept
/// or reject the wrong candidates on `unlock`.
pub const RECOMBINATION_ITERATIONS: u32 = 100_000;

/// A 32-byte secret. Zeroized on drop since it is the shielded key that protects every other
/// account in the store.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(pub [u8; SECRET_LEN]);

impl Secret {
    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.0
    }
}

/// The integrity fingerprint stored alongside the account data. Not sensitive on its own (it
/// reveals nothing about the secret short of a pre-image search through `RECOMBINATION_ITERATIONS`
/// rounds of SHA-256), so it is not zeroized.
pub type Fingerprint = [u8; 32];

/// Applies SHA-256 `iterations` times to `input`, feeding each digest back in as the next input.
fn iterated_hash(input: &[u8], iterations: u32) -> [u8; 32] {
    let mut digest: [u8; 32] = Sha256::digest(input).into();
    for _ in 1..iterations {
        digest = Sha256::digest(digest).into();
    }
    digest
}

/// Generates a fresh, uniformly random secret and its integrity fingerprint.
pub fn create_secret() -> (Secret, Fingerprint) {
    let mut bytes = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    let fingerprint = iterated_hash(&bytes, RECOMBINATION_ITERATIONS);
    (Secret(bytes), fingerprint)
}

/// Returns `true` iff `candidate`, iterated-hashed `RECOMBINATION_ITERATIONS` times, matches
/// `fingerprint`. The comparison is constant-time.
pub fn verify_secret(candidate: &[u8; SECRET_LEN], fingerprint: &Fingerprint) -> bool {
    let digest = iterated_hash(candidate, RECOMBINATION_ITERATIONS);
    crate::bytes::ct_eq(&digest, fingerprint)
}
