//! The share engine: Shamir secret sharing over `GF(2^8)` with Berlekamp-Welch error-correcting
//! recovery.
//!
//! Each byte of the 32-byte secret is the constant term of its own degree-`(k-1)` polynomial over
//! `GF(2^8)`. A share for coordinate `x` is the vector of all 32 polynomials evaluated at `x`.
//! Recovery solves, independently per byte, for a polynomial `Q` and a monic error locator `E`
//! such that `Q(x_i) = y_i * E(x_i)` at every submitted point; `Q / E` is then the original
//! per-byte polynomial, and its value at `x = 0` is the secret byte. This tolerates up to
//! `(n - k) / 2` of the `n` submitted shares being wrong, per the classical Berlekamp-Welch
//! decoder for Reed-Solomon codes.

use gf256::gf256;
use rand::RngCore;

use crate::secret::SECRET_LEN;

/// Errors raised while computing or recovering shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareError {
    /// Fewer shares were submitted than the threshold requires.
    InsufficientShares,
    /// Recovery was attempted with more erroneous shares than the threshold's correction
    /// capacity, or the submitted shares are otherwise mutually inconsistent.
    UnrecoverableShares,
}

/// A polynomial over `GF(2^8)`, stored lowest-degree coefficient first.
#[derive(Debug, Clone)]
struct Poly(Vec<gf256>);

impl Poly {
    /// Builds a degree-`degree` polynomial with the given constant term and uniformly random
    /// higher-order coefficients.
    fn random_with_constant(degree: usize, constant: gf256) -> Self {
        let mut rng = rand::thread_rng();
        let mut coefficients = vec![constant; degree + 1];
        for coeff in coefficients.iter_mut().skip(1) {
            *coeff = gf256::new(rng.gen_u8());
        }
        Poly(coefficients)
    }

    /// Builds a polynomial from explicit coefficients (lowest degree first).
    fn from_coefficients(coefficients: Vec<gf256>) -> Self {
        Poly(coefficients)
    }

    fn evaluate(&self, x: gf256) -> gf256 {
        let mut result = gf256::new(0);
        let mut power = gf256::new(1);
        for &coeff in &self.0 {
            result = result + coeff * power;
            power = power * x;
        }
        result
    }

    /// Degree of the polynomial, ignoring trailing (highest-order) zero coefficients.
    fn degree(&self) -> usize {
        for i in (0..self.0.len()).rev() {
            if u8::from(self.0[i]) != 0 {
                return i;
            }
        }
        0
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| u8::from(c) == 0)
    }

    /// Long division over `GF(2^8)`: returns `(quotient, remainder)` such that
    /// `self == quotient * divisor + remainder`.
    fn div_rem(&self, divisor: &Poly) -> (Poly, Poly) {
        assert!(!divisor.is_zero(), "division by the zero polynomial");
        let mut remainder = self.0.clone();
        let divisor_degree = divisor.degree();
        let divisor_lead = divisor.0[divisor_degree];
        let quotient_degree = remainder.len().saturating_sub(divisor_degree + 1);
        let mut quotient = vec![gf256::new(0); quotient_degree.max(1)];

        loop {
            let remainder_degree = {
                let mut d = 0;
                let mut found = false;
                for i in (0..remainder.len()).rev() {
                    if u8::from(remainder[i]) != 0 {
                        d = i;
                        found = true;
                        break;
                    }
                }
                if !found {
                    break;
                }
                d
            };
            if remainder_degree < divisor_degree {
                break;
            }
            let coeff = remainder[remainder_degree] / divisor_lead;
            let shift = remainder_degree - divisor_degree;
            if shift >= quotient.len() {
                quotient.resize(shift + 1, gf256::new(0));
            }
            quotient[shift] = coeff;
            for (i, &d) in divisor.0.iter().enumerate() {
                remainder[shift + i] = remainder[shift + i] + coeff * d;
            }
        }

        (Poly(quotient), Poly(remainder))
    }
}

/// A minimal trait-free RNG helper; kept local so `Poly` doesn't need to depend on `rand::Rng`
/// directly at the call site.
trait RandomByte {
    fn gen_u8(&mut self) -> u8;
}

impl RandomByte for rand::rngs::ThreadRng {
    fn gen_u8(&mut self) -> u8 {
        let mut buf = [0u8; 1];
        self.fill_bytes(&mut buf);
        buf[0]
    }
}

/// Solves an `n`-row, `m`-unknown linear system over `GF(2^8)` given as augmented rows of length
/// `m + 1` (coefficients followed by the right-hand side). Returns the unique solution if the
/// system has full column rank and is consistent; `None` otherwise (rank-deficient or
/// contradictory, which both indicate more errors than the chosen correction capacity allows).
fn solve_linear_system(mut rows: Vec<Vec<gf256>>, m: usize) -> Option<Vec<gf256>> {
    let n = rows.len();
    if n < m {
        return None;
    }
    for col in 0..m {
        let pivot_row = (col..n).find(|&r| u8::from(rows[r][col]) != 0)?;
        rows.swap(col, pivot_row);
        let pivot = rows[col][col];
        for v in rows[col].iter_mut() {
            *v = *v / pivot;
        }
        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = rows[r][col];
            if u8::from(factor) == 0 {
                continue;
            }
            for c in col..=m {
                rows[r][c] = rows[r][c] + factor * rows[col][c];
            }
        }
    }
    for row in rows.iter().skip(m) {
        if u8::from(row[m]) != 0 {
            return None;
        }
    }
    Some((0..m).map(|col| rows[col][m]).collect())
}

/// Runs Berlekamp-Welch decoding for a single byte plane against every assumed error count from
/// `max_e` down to 0, returning the first that decodes successfully.
///
/// The key equation `Q(x_i) = y_i * E(x_i)` with `deg E = e` has a *unique* solution only when the
/// assumed `e` equals the actual number of wrong points `t`. Assuming `e > t` makes the system
/// rank-deficient (the valid `(Q, E)` pairs form a family `(P*W, W)` over every monic `W` of degree
/// `e - t`), so `solve_linear_system` hits a pivot-less column and reports no solution; assuming
/// `e < t` overconstrains the system and the consistency check on the trailing rows fails instead.
/// Searching downward from `max_e` therefore finds the true error count (if it exists) without
/// having to distinguish "no solution because over-assumed" from "no solution because
/// under-assumed" — both simply advance to the next `e`.
fn decode_byte(points: &[(gf256, gf256)], k: usize, max_e: usize) -> Result<Poly, ShareError> {
    for e in (0..=max_e).rev() {
        if let Ok(poly) = decode_byte_at(points, k, e) {
            return Ok(poly);
        }
    }
    Err(ShareError::UnrecoverableShares)
}

/// Runs Berlekamp-Welch decoding for a single byte plane assuming exactly `e` errors: `points` are
/// `(x, y)` pairs and `k` is the threshold (degree bound is `k - 1`). Returns the original
/// degree-`(k-1)` polynomial itself, not just its value at zero: callers need the full polynomial
/// to keep computing shares at coordinates consistent with the ones issued before this decode, not
/// just the secret byte.
fn decode_byte_at(points: &[(gf256, gf256)], k: usize, e: usize) -> Result<Poly, ShareError> {
    let m = k + 2 * e;
    if points.len() < m {
        return Err(ShareError::UnrecoverableShares);
    }
    let rows: Vec<Vec<gf256>> = points
        .iter()
        .map(|&(x, y)| {
            let mut row = Vec::with_capacity(m + 1);
            let mut power = gf256::new(1);
            for _ in 0..(k + e) {
                row.push(power);
                power = power * x;
            }
            let mut power = gf256::new(1);
            for _ in 0..e {
                row.push(y * power);
                power = power * x;
            }
            let x_pow_e = {
                let mut p = gf256::new(1);
                for _ in 0..e {
                    p = p * x;
                }
                p
            };
            row.push(y * x_pow_e);
            row
        })
        .collect();

    let solution = solve_linear_system(rows, m).ok_or(ShareError::UnrecoverableShares)?;
    let q_coeffs = solution[0..k + e].to_vec();
    let mut e_coeffs = solution[k + e..m].to_vec();
    e_coeffs.push(gf256::new(1)); // monic leading term at degree `e`.

    let q = Poly::from_coefficients(q_coeffs);
    let e_poly = Poly::from_coefficients(e_coeffs);
    let (quotient, remainder) = q.div_rem(&e_poly);
    if !remainder.is_zero() || quotient.degree() >= k {
        return Err(ShareError::UnrecoverableShares);
    }
    let mut coefficients = quotient.0;
    coefficients.resize(k, gf256::new(0));
    Ok(Poly::from_coefficients(coefficients))
}

/// The share engine bound to a store's threshold `k`. Holds the per-byte secret polynomials only
/// while the store is unlocked; a locked engine can be built to recover a secret but cannot compute
/// or validate individual shares until it does.
pub struct ShareEngine {
    threshold: u8,
    polys: Option<[Poly; SECRET_LEN]>,
}

impl Drop for ShareEngine {
    fn drop(&mut self) {
        if let Some(polys) = &mut self.polys {
            for poly in polys.iter_mut() {
                for coeff in poly.0.iter_mut() {
                    *coeff = gf256::new(0);
                }
            }
        }
    }
}

impl ShareEngine {
    /// Creates a locked engine awaiting `recover_secretdata`.
    pub fn new_locked(threshold: u8) -> Self {
        ShareEngine {
            threshold,
            polys: None,
        }
    }

    /// Creates an unlocked engine holding `secret`, with a fresh random polynomial per byte.
    pub fn new_unlocked(threshold: u8, secret: &[u8; SECRET_LEN]) -> Self {
        let degree = (threshold as usize).saturating_sub(1);
        let polys = core::array::from_fn(|i| Poly::random_with_constant(degree, gf256::new(secret[i])));
        ShareEngine {
            threshold,
            polys: Some(polys),
        }
    }

    /// Returns the 32-byte share vector for coordinate `x` (`1..=254`).
    ///
    /// Returns `None` if the engine is locked (no secret known).
    pub fn compute_share(&self, x: u8) -> Option<[u8; SECRET_LEN]> {
        let polys = self.polys.as_ref()?;
        let gx = gf256::new(x);
        let mut out = [0u8; SECRET_LEN];
        for (i, poly) in polys.iter().enumerate() {
            out[i] = u8::from(poly.evaluate(gx));
        }
        Some(out)
    }

    /// Returns `true` iff `(x, bytes)` lies on the current secret's share surface.
    ///
    /// Returns `false` (rather than failing) if the engine is locked, since a locked engine has no
    /// basis on which to validate an individual share.
    pub fn is_valid_share(&self, x: u8, bytes: &[u8; SECRET_LEN]) -> bool {
        match self.compute_share(x) {
            Some(expected) => crate::bytes::ct_eq(&expected, bytes),
            None => false,
        }
    }

    /// Reconstructs the 32-byte secret from submitted shares, tolerating up to
    /// `(shares.len() - threshold) / 2` erroneous entries. On success, the engine becomes
    /// unlocked and holds the recovered secret's polynomials.
    ///
    /// The actual number of wrong shares is not known in advance, only the ceiling
    /// `max_e = (n - threshold) / 2` the threshold math guarantees correction up to. `decode_byte`
    /// searches assumed error counts from `max_e` down to 0 per byte plane and keeps the first
    /// that decodes, which is the true count whenever one exists.
    pub fn recover_secretdata(
        &mut self,
        shares: &[(u8, [u8; SECRET_LEN])],
    ) -> Result<[u8; SECRET_LEN], ShareError> {
        let k = self.threshold as usize;
        let n = shares.len();
        if n < k {
            return Err(ShareError::InsufficientShares);
        }
        let max_e = (n - k) / 2;

        let mut secret = [0u8; SECRET_LEN];
        let mut polys: Vec<Poly> = Vec::with_capacity(SECRET_LEN);
        for byte_index in 0..SECRET_LEN {
            let points: Vec<(gf256, gf256)> = shares
                .iter()
                .map(|&(x, bytes)| (gf256::new(x), gf256::new(bytes[byte_index])))
                .collect();
            let poly = decode_byte(&points, k, max_e)?;
            secret[byte_index] = u8::from(poly.evaluate(gf256::new(0)));
            polys.push(poly);
        }

        // These are the original per-byte polynomials, not freshly chosen ones: Berlekamp-Welch
        // recovers `Q/E` exactly whenever the error count is within capacity, so every share
        // issued before this recovery (at any `x`, not only the ones submitted here) still lies on
        // the resulting surface.
        self.polys = Some(
            polys
                .try_into()
                .unwrap_or_else(|_| unreachable!("exactly SECRET_LEN polynomials built")),
        );

        Ok(secret)
    }
}
