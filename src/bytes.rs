//! Byte-level utilities shared by the rest of the crate.

use subtle::ConstantTimeEq;

/// Computes the position-wise XOR of two equal-length byte slices.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    assert_eq!(a.len(), b.len(), "xor operands must have equal length");
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

/// Compares two byte slices for equality in constant time.
///
/// Returns `false` immediately (non-constant-time) if the lengths differ, since a length
/// mismatch is not itself secret. When lengths match, every byte is compared.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
