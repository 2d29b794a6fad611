//! AES-256 ECB encryption of a single 32-byte block (as two independent 16-byte AES blocks).
//!
//! ECB is safe here only because the plaintext is always a fixed-length, high-entropy, unique
//! value (a salted password hash) — never attacker-chosen, never repeated in a way that would
//! leak structure. This module must not be reused to encrypt anything else.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes256;

/// Encrypts a 32-byte block under `key` using AES-256 in ECB mode (two chained-free 16-byte
/// blocks).
pub fn encrypt(key: &[u8; 32], data: &[u8; 32]) -> [u8; 32] {
    let cipher = Aes256::new(GenericArray::from_slice(key));
    let mut out = [0u8; 32];
    for chunk in 0..2 {
        let mut block = GenericArray::clone_from_slice(&data[chunk * 16..chunk * 16 + 16]);
        cipher.encrypt_block(&mut block);
        out[chunk * 16..chunk * 16 + 16].copy_from_slice(&block);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic_for_a_fixed_key_and_input() {
        let key = [7u8; 32];
        let data = [9u8; 32];
        assert_eq!(encrypt(&key, &data), encrypt(&key, &data));
    }

    #[test]
    fn differs_across_keys() {
        let data = [1u8; 32];
        assert_ne!(encrypt(&[1u8; 32], &data), encrypt(&[2u8; 32], &data));
    }

    #[test]
    fn each_half_is_an_independent_ecb_block() {
        // Two identical 16-byte halves must encrypt identically under ECB.
        let key = [3u8; 32];
        let mut data = [0u8; 32];
        for i in 0..16 {
            data[i] = i as u8;
            data[16 + i] = i as u8;
        }
        let out = encrypt(&key, &data);
        assert_eq!(&out[0..16], &out[16..32]);
    }
}
