//! Rational reconstruction
//!
//! Recovers a numerator/denominator pair from a residue modulo `m` given
//! magnitude bounds, by running the extended Euclidean algorithm on
//! `(m, n)` and tracking only the second Bezout coefficient. "No rational
//! fits the bounds" is an expected outcome reported as `None`: callers of
//! multi-modular algorithms routinely probe growing moduli until a probe
//! succeeds, so failure here is flow control, not an error.
//!
//! Three stopping rules are provided: explicit numerator/denominator
//! bounds, the Farey rule `2*r^2 + 1 <= m` guaranteeing a unique
//! minimal-height rational, and an error-tolerant Farey variant that walks
//! while the squared norm `r^2 + t^2` keeps shrinking and accepts the
//! best-so-far pair (a heuristic for residues carrying representation
//! error). The same walk generalizes to any Euclidean ring through
//! caller-supplied size predicates, degree bounds for polynomial rings
//! being the canonical instance.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::error::Result;
use crate::machine::{floor_mod_i64, gcd_i64};
use crate::ring::Ring;

/// Reconstruct `(numerator, denominator)` from `n mod modulus` over
/// machine words, or `None` when nothing fits the bounds.
///
/// Requires `modulus > 0` and non-negative bounds. A successful pair
/// satisfies `numerator == denominator * n (mod modulus)`,
/// `|numerator| <= numerator_bound`, `0 < denominator <= denominator_bound`
/// and `gcd(numerator, denominator) == 1`.
pub fn reconstruct_i64(
    n: i64,
    modulus: i64,
    numerator_bound: i64,
    denominator_bound: i64,
) -> Option<(i64, i64)> {
    debug_assert!(modulus > 0);
    let mut v = (modulus, 0i64);
    let mut w = (floor_mod_i64(n, modulus), 1i64);
    while w.0 > numerator_bound {
        let q = v.0 / w.0;
        let z = (v.0 - q * w.0, v.1 - q * w.1);
        v = w;
        w = z;
    }
    if w.1 < 0 {
        w = (-w.0, -w.1);
    }
    if w.1 <= denominator_bound && gcd_i64(w.0, w.1) == 1 {
        Some(w)
    } else {
        None
    }
}

/// Reconstruct `(numerator, denominator)` from `n mod modulus` over big
/// integers, or `None` when nothing fits the bounds.
pub fn reconstruct(
    n: &BigInt,
    modulus: &BigInt,
    numerator_bound: &BigInt,
    denominator_bound: &BigInt,
) -> Option<(BigInt, BigInt)> {
    debug_assert!(modulus.is_positive());
    let mut v = (modulus.clone(), BigInt::zero());
    let mut w = (n.mod_floor(modulus), BigInt::from(1));
    while &w.0 > numerator_bound {
        let q = &v.0 / &w.0;
        let z = (&v.0 - &q * &w.0, &v.1 - &q * &w.1);
        v = w;
        w = z;
    }
    if w.1.is_negative() {
        w = (-w.0, -w.1);
    }
    if &w.1 <= denominator_bound && w.0.gcd(&w.1).abs() == BigInt::from(1) {
        Some(w)
    } else {
        None
    }
}

/// Farey reconstruction: bounds derived from the modulus alone.
///
/// The walk stops at the first remainder with `2*r^2 + 1 <= m`; the pair
/// is accepted only when `2*t^2 <= m`, which makes the reconstructed
/// rational the unique one of minimal height below the threshold.
pub fn reconstruct_farey(n: &BigInt, modulus: &BigInt) -> Option<(BigInt, BigInt)> {
    debug_assert!(modulus.is_positive());
    let mut v = (modulus.clone(), BigInt::zero());
    let mut w = (n.mod_floor(modulus), BigInt::from(1));
    while &w.0 * &w.0 * 2 + 1 > *modulus {
        let q = &v.0 / &w.0;
        let z = (&v.0 - &q * &w.0, &v.1 - &q * &w.1);
        v = w;
        w = z;
    }
    if w.1.is_negative() {
        w = (-w.0, -w.1);
    }
    if &w.1 * &w.1 * 2 <= *modulus && w.0.gcd(&w.1).abs() == BigInt::from(1) {
        Some(w)
    } else {
        None
    }
}

/// Error-tolerant Farey reconstruction.
///
/// Relaxes the stopping rule to a monotonic comparison of successive
/// squared norms `r^2 + t^2`, returning the pair where the norm stopped
/// improving. Heuristic by construction; intended for residues that carry
/// representation error, where the exact rules above reject everything.
pub fn reconstruct_farey_error_tolerant(
    n: &BigInt,
    modulus: &BigInt,
) -> Option<(BigInt, BigInt)> {
    debug_assert!(modulus.is_positive());
    let norm = |p: &(BigInt, BigInt)| &p.0 * &p.0 + &p.1 * &p.1;
    let mut v = (modulus.clone(), BigInt::zero());
    let mut w = (n.mod_floor(modulus), BigInt::from(1));
    if w.0.is_zero() {
        return Some((BigInt::zero(), BigInt::from(1)));
    }
    let mut best_norm = norm(&w);
    loop {
        if w.0.is_zero() {
            break;
        }
        let q = &v.0 / &w.0;
        let z = (&v.0 - &q * &w.0, &v.1 - &q * &w.1);
        let z_norm = norm(&z);
        if z_norm >= best_norm {
            break;
        }
        best_norm = z_norm;
        v = w;
        w = z;
    }
    if w.1.is_zero() {
        return None;
    }
    if w.1.is_negative() {
        w = (-w.0, -w.1);
    }
    let g = w.0.gcd(&w.1);
    Some((w.0 / &g, w.1 / &g))
}

/// The reconstruction walk over any Euclidean ring or field.
///
/// `numerator_fits` is the stopping rule on remainders (for polynomial
/// rings, a degree bound); `denominator_fits` validates the tracked
/// coefficient. Returns `Ok(None)` when the walk stops outside the bounds
/// or the pair is not coprime.
pub fn reconstruct_in<R: Ring>(
    ring: &R,
    n: &R::Element,
    modulus: &R::Element,
    numerator_fits: impl Fn(&R::Element) -> bool,
    denominator_fits: impl Fn(&R::Element) -> bool,
) -> Result<Option<(R::Element, R::Element)>> {
    let mut v = (modulus.clone(), ring.zero());
    let mut w = (ring.rem(n, modulus)?, ring.one());
    while !numerator_fits(&w.0) {
        if ring.is_zero(&w.0) {
            return Ok(None);
        }
        let (q, _) = ring.div_rem(&v.0, &w.0)?;
        let z = (
            ring.sub(&v.0, &ring.mul(&q, &w.0)),
            ring.sub(&v.1, &ring.mul(&q, &w.1)),
        );
        v = w;
        w = z;
    }
    if !denominator_fits(&w.1) {
        return Ok(None);
    }
    let g = ring.gcd(&w.0, &w.1)?;
    if !ring.is_unit(&g) {
        return Ok(None);
    }
    Ok(Some(w))
}
