//! Isolated-check bits (ICB): a short, deterministic suffix that lets a locked store give a
//! coarse right/wrong verdict on a password without ever reconstructing the shielded secret.
//!
//! The suffix is the last `b` bytes of `SHA256` iterated `ICB_ITERATIONS` times over the salted
//! password hash. Larger `b` leaks more of the hash (roughly `8*b` bits); the design caps `b` at
//! [`MAX_ICB_BYTES`] and recommends keeping it small (2-4 bytes).

use sha2::{Digest, Sha256};

/// Number of SHA-256 iterations applied when computing isolated-check bits.
pub const ICB_ITERATIONS: u32 = 1000;

/// Upper bound on the number of isolated-check bytes a store may be configured with.
pub const MAX_ICB_BYTES: u8 = 32;

/// Computes the `b`-byte isolated-check suffix for a salted password hash.
///
/// Returns an empty vector when `b == 0`.
pub fn compute(salted_hash: &[u8; 32], b: u8) -> Vec<u8> {
    if b == 0 {
        return Vec::new();
    }
    let mut digest: [u8; 32] = Sha256::digest(salted_hash).into();
    for _ in 1..ICB_ITERATIONS {
        digest = Sha256::digest(digest).into();
    }
    digest[32 - b as usize..].to_vec()
}
