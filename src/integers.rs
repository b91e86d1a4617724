//! The integer rings Z
//!
//! [`Integers`] is arbitrary-precision Z over `BigInt`; [`Integers64`] is
//! machine-word Z with overflow-checked operations that fail loudly rather
//! than wrap. Both are Euclidean, neither is a field.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use rand::Rng;

use crate::error::{ArithmeticError, Result};
use crate::ring::Ring;

/// Extended Euclidean algorithm over `BigInt`: `(g, s, t)` with
/// `s*a + t*b == g`; `g >= 0` for non-negative inputs.
pub fn ext_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());
    while !r.is_zero() {
        let q = &old_r / &r;
        let tmp = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, tmp);
        let tmp = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, tmp);
        let tmp = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, tmp);
    }
    (old_r, old_s, old_t)
}

/// Modular inverse of `a` modulo `m > 0`, or `None` when `gcd(a, m) != 1`.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    if m.is_one() {
        return Some(BigInt::zero());
    }
    let (g, s, _) = ext_gcd(&a.mod_floor(m), m);
    if !g.is_one() {
        return None;
    }
    Some(s.mod_floor(m))
}

/// Arbitrary-precision Z.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Integers;

impl fmt::Display for Integers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z")
    }
}

impl Ring for Integers {
    type Element = BigInt;

    fn zero(&self) -> BigInt {
        BigInt::zero()
    }

    fn one(&self) -> BigInt {
        BigInt::one()
    }

    fn add(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a + b
    }

    fn sub(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a - b
    }

    fn neg(&self, a: &BigInt) -> BigInt {
        -a
    }

    fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        a * b
    }

    fn div_rem(&self, a: &BigInt, b: &BigInt) -> Result<(BigInt, BigInt)> {
        if b.is_zero() {
            return Err(ArithmeticError::DivisionUndefined);
        }
        // floored division keeps remainders canonical in [0, b) for b > 0,
        // which CRT and rational reconstruction rely on
        Ok(a.div_mod_floor(b))
    }

    fn reciprocal(&self, a: &BigInt) -> Result<BigInt> {
        if a.abs().is_one() {
            Ok(a.clone())
        } else {
            Err(ArithmeticError::NotInvertible)
        }
    }

    fn is_zero(&self, a: &BigInt) -> bool {
        Zero::is_zero(a)
    }

    fn is_one(&self, a: &BigInt) -> bool {
        One::is_one(a)
    }

    fn is_unit(&self, a: &BigInt) -> bool {
        a.abs().is_one()
    }

    fn value_of(&self, n: i64) -> BigInt {
        BigInt::from(n)
    }

    fn element_cmp(&self, a: &BigInt, b: &BigInt) -> Ordering {
        a.cmp(b)
    }

    fn is_field(&self) -> bool {
        false
    }

    fn is_euclidean(&self) -> bool {
        true
    }

    fn sample(&self, rng: &mut impl Rng) -> BigInt {
        BigInt::from(rng.gen_range(-(1i64 << 31)..(1i64 << 31)))
    }
}

/// Machine-word Z.
///
/// Operations use checked arithmetic and panic on 64-bit overflow; wrapped
/// values are never produced.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Integers64;

impl fmt::Display for Integers64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z64")
    }
}

impl Ring for Integers64 {
    type Element = i64;

    fn zero(&self) -> i64 {
        0
    }

    fn one(&self) -> i64 {
        1
    }

    fn add(&self, a: &i64, b: &i64) -> i64 {
        a.checked_add(*b).expect("i64 overflow in Z64 addition")
    }

    fn sub(&self, a: &i64, b: &i64) -> i64 {
        a.checked_sub(*b).expect("i64 overflow in Z64 subtraction")
    }

    fn neg(&self, a: &i64) -> i64 {
        a.checked_neg().expect("i64 overflow in Z64 negation")
    }

    fn mul(&self, a: &i64, b: &i64) -> i64 {
        a.checked_mul(*b).expect("i64 overflow in Z64 multiplication")
    }

    fn div_rem(&self, a: &i64, b: &i64) -> Result<(i64, i64)> {
        if *b == 0 {
            return Err(ArithmeticError::DivisionUndefined);
        }
        Ok((a.div_euclid(*b), a.rem_euclid(*b)))
    }

    fn reciprocal(&self, a: &i64) -> Result<i64> {
        if *a == 1 || *a == -1 {
            Ok(*a)
        } else {
            Err(ArithmeticError::NotInvertible)
        }
    }

    fn is_zero(&self, a: &i64) -> bool {
        *a == 0
    }

    fn is_one(&self, a: &i64) -> bool {
        *a == 1
    }

    fn is_unit(&self, a: &i64) -> bool {
        *a == 1 || *a == -1
    }

    fn value_of(&self, n: i64) -> i64 {
        n
    }

    fn element_cmp(&self, a: &i64, b: &i64) -> Ordering {
        a.cmp(b)
    }

    fn is_field(&self) -> bool {
        false
    }

    fn is_euclidean(&self) -> bool {
        true
    }

    fn sample(&self, rng: &mut impl Rng) -> i64 {
        rng.gen_range(-(1i64 << 31)..(1i64 << 31))
    }
}
