//! The modular rings Z/m
//!
//! [`IntegersZp64`] keeps elements as canonical `u64` residues and routes
//! every reduction through precomputed magic descriptors: products of
//! residues under a 32-bit modulus stay inside one 64-bit word and use the
//! direct multiply-and-shift path, larger moduli take the 128-bit Knuth
//! reduction. [`IntegersZp`] is the arbitrary-precision rendition of the
//! same ring; the two bridge into each other so multi-modular algorithms
//! can move values between representations as primes grow.
//!
//! Ring identity (the modulus) never changes after construction. Derived
//! data that is expensive to compute, such as the reciprocal table for
//! small moduli or the perfect-power decomposition of the modulus, is
//! memoized in a once-cell on first use and computed at most once per
//! ring.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rand::Rng;

use crate::error::{ArithmeticError, Result};
use crate::integers::mod_inverse;
use crate::machine::{mod_inverse_u64, perfect_power_decomposition, symmetric_form_i64};
use crate::magic::{MagicUnsigned, MulModMagic};
use crate::primes::is_prime_u64;
use crate::ring::Ring;

/// Moduli up to this bound get a full reciprocal table on first inverse.
const RECIPROCAL_TABLE_LIMIT: u64 = 1 << 16;

/// Machine-word Z/m with magic-accelerated reduction.
#[derive(Debug, Clone)]
pub struct IntegersZp64 {
    modulus: u64,
    /// Direct 64-bit divide/modulo by the modulus.
    magic: MagicUnsigned,
    /// 128-bit product reduction for moduli beyond 32 bits.
    mul_magic: MulModMagic,
    is_field: bool,
    perfect_power: OnceLock<Option<(u64, u32)>>,
    /// Reciprocals of every residue for small moduli; 0 marks non-units.
    reciprocals: OnceLock<Option<Box<[u64]>>>,
}

impl PartialEq for IntegersZp64 {
    fn eq(&self, other: &Self) -> bool {
        self.modulus == other.modulus
    }
}

impl Eq for IntegersZp64 {}

impl fmt::Display for IntegersZp64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z/{}", self.modulus)
    }
}

impl IntegersZp64 {
    /// Create the ring Z/m for `modulus > 0`.
    pub fn new(modulus: u64) -> Self {
        assert!(modulus > 0, "modulus must be positive");
        Self {
            modulus,
            magic: MagicUnsigned::new(modulus),
            mul_magic: MulModMagic::new(modulus),
            is_field: is_prime_u64(modulus),
            perfect_power: OnceLock::new(),
            reciprocals: OnceLock::new(),
        }
    }

    #[inline]
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Canonical residue of an unsigned word.
    #[inline]
    pub fn modulus_of_u64(&self, v: u64) -> u64 {
        self.magic.rem(v)
    }

    /// Canonical residue of a signed word.
    #[inline]
    pub fn modulus_of_i64(&self, v: i64) -> u64 {
        let r = self.magic.rem(v.unsigned_abs());
        if v < 0 && r != 0 {
            self.modulus - r
        } else {
            r
        }
    }

    /// Canonical residue of a big integer.
    pub fn modulus_of_bigint(&self, v: &BigInt) -> u64 {
        v.mod_floor(&BigInt::from(self.modulus))
            .to_u64()
            .expect("residue fits the machine word")
    }

    #[inline]
    pub fn add_mod(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.modulus && b < self.modulus);
        let (s, carry) = a.overflowing_add(b);
        if carry || s >= self.modulus {
            s.wrapping_sub(self.modulus)
        } else {
            s
        }
    }

    #[inline]
    pub fn sub_mod(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.modulus && b < self.modulus);
        if a >= b {
            a - b
        } else {
            self.modulus - b + a
        }
    }

    #[inline]
    pub fn neg_mod(&self, a: u64) -> u64 {
        debug_assert!(a < self.modulus);
        if a == 0 {
            0
        } else {
            self.modulus - a
        }
    }

    /// `a * b mod m`. Under a 32-bit modulus the product fits one word and
    /// the direct magic path applies; otherwise the 128-bit Knuth path runs.
    #[inline]
    pub fn mul_mod(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.modulus && b < self.modulus);
        if self.modulus <= u32::MAX as u64 {
            self.magic.rem(a * b)
        } else {
            self.mul_magic.mul_mod(a, b)
        }
    }

    /// `base^exp mod m` by repeated squaring on the fast multiply.
    pub fn pow_mod(&self, base: u64, mut exp: u64) -> u64 {
        if self.modulus == 1 {
            return 0;
        }
        let mut base = self.modulus_of_u64(base);
        let mut result = 1u64;
        while exp > 0 {
            if exp & 1 == 1 {
                result = self.mul_mod(result, base);
            }
            exp >>= 1;
            base = self.mul_mod(base, base);
        }
        result
    }

    /// Reciprocal table for small moduli, built on first use. Entry 0
    /// marks a non-unit; 0 is never a true inverse for `modulus > 1`.
    fn reciprocal_table(&self) -> Option<&[u64]> {
        self.reciprocals
            .get_or_init(|| {
                if self.modulus < 2 || self.modulus > RECIPROCAL_TABLE_LIMIT {
                    return None;
                }
                let table = (0..self.modulus)
                    .map(|a| mod_inverse_u64(a, self.modulus).unwrap_or(0))
                    .collect();
                Some(table)
            })
            .as_deref()
    }

    /// Modular inverse, failing with [`ArithmeticError::NotInvertible`]
    /// when `gcd(a, m) != 1`. Small moduli answer from the cached
    /// reciprocal table, larger ones run an extended Euclid per call.
    pub fn inverse(&self, a: u64) -> Result<u64> {
        if let Some(table) = self.reciprocal_table() {
            let inv = table[self.modulus_of_u64(a) as usize];
            return if inv == 0 {
                Err(ArithmeticError::NotInvertible)
            } else {
                Ok(inv)
            };
        }
        mod_inverse_u64(a, self.modulus).ok_or(ArithmeticError::NotInvertible)
    }

    /// Map a canonical residue into the symmetric range `(-m/2, m/2]`.
    #[inline]
    pub fn symmetric_form(&self, a: u64) -> i64 {
        symmetric_form_i64(a, self.modulus)
    }

    /// Uniformly random canonical residue.
    pub fn random_element(&self, rng: &mut impl Rng) -> u64 {
        rng.gen_range(0..self.modulus)
    }

    /// The same modulus over arbitrary-precision representatives.
    pub fn as_generic_ring(&self) -> IntegersZp {
        IntegersZp::new(BigInt::from(self.modulus))
    }

    /// `(base, exp)` with `base^exp == m` and maximal `exp >= 2`, if the
    /// modulus is a perfect power. Computed on first use, then cached.
    pub fn modulus_perfect_power(&self) -> Option<(u64, u32)> {
        *self
            .perfect_power
            .get_or_init(|| perfect_power_decomposition(self.modulus))
    }

    /// The ring Z/base for a perfect-power modulus `base^exp`.
    pub fn perfect_power_base_ring(&self) -> Option<IntegersZp64> {
        self.modulus_perfect_power()
            .map(|(base, _)| IntegersZp64::new(base))
    }
}

impl Ring for IntegersZp64 {
    type Element = u64;

    fn zero(&self) -> u64 {
        0
    }

    fn one(&self) -> u64 {
        if self.modulus == 1 {
            0
        } else {
            1
        }
    }

    fn add(&self, a: &u64, b: &u64) -> u64 {
        self.add_mod(*a, *b)
    }

    fn sub(&self, a: &u64, b: &u64) -> u64 {
        self.sub_mod(*a, *b)
    }

    fn neg(&self, a: &u64) -> u64 {
        self.neg_mod(*a)
    }

    fn mul(&self, a: &u64, b: &u64) -> u64 {
        self.mul_mod(*a, *b)
    }

    fn div_rem(&self, a: &u64, b: &u64) -> Result<(u64, u64)> {
        match self.inverse(*b) {
            Ok(inv) => Ok((self.mul_mod(*a, inv), 0)),
            Err(_) => Err(ArithmeticError::DivisionUndefined),
        }
    }

    fn reciprocal(&self, a: &u64) -> Result<u64> {
        self.inverse(*a)
    }

    fn is_zero(&self, a: &u64) -> bool {
        *a == 0
    }

    fn is_one(&self, a: &u64) -> bool {
        *a == self.one()
    }

    fn is_unit(&self, a: &u64) -> bool {
        self.inverse(*a).is_ok()
    }

    fn value_of(&self, n: i64) -> u64 {
        self.modulus_of_i64(n)
    }

    fn element_cmp(&self, a: &u64, b: &u64) -> Ordering {
        a.cmp(b)
    }

    fn is_field(&self) -> bool {
        self.is_field
    }

    fn is_euclidean(&self) -> bool {
        // Z/m for composite m is not a domain; the Euclidean walk on
        // representatives proves nothing there
        false
    }

    fn sample(&self, rng: &mut impl Rng) -> u64 {
        self.random_element(rng)
    }
}

/// Arbitrary-precision Z/m.
#[derive(Debug, Clone)]
pub struct IntegersZp {
    modulus: BigInt,
    is_field: bool,
    perfect_power: OnceLock<Option<(BigInt, u32)>>,
}

impl PartialEq for IntegersZp {
    fn eq(&self, other: &Self) -> bool {
        self.modulus == other.modulus
    }
}

impl Eq for IntegersZp {}

impl fmt::Display for IntegersZp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z/{}", self.modulus)
    }
}

impl IntegersZp {
    /// Create the ring Z/m for `modulus > 0`.
    pub fn new(modulus: BigInt) -> Self {
        assert!(modulus.is_positive(), "modulus must be positive");
        let is_field = is_prime_bigint(&modulus);
        Self {
            modulus,
            is_field,
            perfect_power: OnceLock::new(),
        }
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    /// Canonical residue in `[0, m)`.
    pub fn modulus_of(&self, v: &BigInt) -> BigInt {
        v.mod_floor(&self.modulus)
    }

    /// Modular inverse, failing with [`ArithmeticError::NotInvertible`]
    /// when `gcd(a, m) != 1`.
    pub fn inverse(&self, a: &BigInt) -> Result<BigInt> {
        mod_inverse(a, &self.modulus).ok_or(ArithmeticError::NotInvertible)
    }

    /// `base^exp mod m`.
    pub fn pow_mod(&self, base: &BigInt, exp: &BigInt) -> BigInt {
        self.modulus_of(base).modpow(exp, &self.modulus)
    }

    /// Map a canonical residue into the symmetric range `(-m/2, m/2]`.
    pub fn symmetric_form(&self, a: &BigInt) -> BigInt {
        let a = self.modulus_of(a);
        if &a * 2 <= self.modulus {
            a
        } else {
            a - &self.modulus
        }
    }

    /// The same modulus over machine words, when it fits one.
    pub fn as_machine_ring(&self) -> Option<IntegersZp64> {
        self.modulus.to_u64().map(IntegersZp64::new)
    }

    /// `(base, exp)` with `base^exp == m` and maximal `exp >= 2`, if the
    /// modulus is a perfect power. Computed on first use, then cached.
    /// Moduli beyond one machine word are never perfect powers we care to
    /// chase digit by digit, so the probe runs through the u64 kernel.
    pub fn modulus_perfect_power(&self) -> Option<(BigInt, u32)> {
        self.perfect_power
            .get_or_init(|| {
                let m = self.modulus.to_u64()?;
                let (base, exp) = perfect_power_decomposition(m)?;
                Some((BigInt::from(base), exp))
            })
            .clone()
    }
}

impl Ring for IntegersZp {
    type Element = BigInt;

    fn zero(&self) -> BigInt {
        BigInt::zero()
    }

    fn one(&self) -> BigInt {
        if self.modulus.is_one() {
            BigInt::zero()
        } else {
            BigInt::one()
        }
    }

    fn add(&self, a: &BigInt, b: &BigInt) -> BigInt {
        let s = a + b;
        if s >= self.modulus {
            s - &self.modulus
        } else {
            s
        }
    }

    fn sub(&self, a: &BigInt, b: &BigInt) -> BigInt {
        if a >= b {
            a - b
        } else {
            &self.modulus - b + a
        }
    }

    fn neg(&self, a: &BigInt) -> BigInt {
        if Zero::is_zero(a) {
            BigInt::zero()
        } else {
            &self.modulus - a
        }
    }

    fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        (a * b) % &self.modulus
    }

    fn div_rem(&self, a: &BigInt, b: &BigInt) -> Result<(BigInt, BigInt)> {
        match mod_inverse(b, &self.modulus) {
            Some(inv) => Ok((self.mul(a, &inv), BigInt::zero())),
            None => Err(ArithmeticError::DivisionUndefined),
        }
    }

    fn reciprocal(&self, a: &BigInt) -> Result<BigInt> {
        self.inverse(a)
    }

    fn is_zero(&self, a: &BigInt) -> bool {
        Zero::is_zero(a)
    }

    fn is_one(&self, a: &BigInt) -> bool {
        *a == self.one()
    }

    fn is_unit(&self, a: &BigInt) -> bool {
        mod_inverse(a, &self.modulus).is_some()
    }

    fn value_of(&self, n: i64) -> BigInt {
        BigInt::from(n).mod_floor(&self.modulus)
    }

    fn element_cmp(&self, a: &BigInt, b: &BigInt) -> Ordering {
        a.cmp(b)
    }

    fn is_field(&self) -> bool {
        self.is_field
    }

    fn is_euclidean(&self) -> bool {
        false
    }

    fn sample(&self, rng: &mut impl Rng) -> BigInt {
        // rejection-free: reduce a uniformly random value twice the width
        let bits = self.modulus.bits() as usize;
        let mut v = BigInt::zero();
        for _ in 0..(2 * bits + 63) / 64 {
            v = (v << 64) | BigInt::from(rng.gen::<u64>());
        }
        v.mod_floor(&self.modulus)
    }
}

/// Miller-Rabin over `BigInt`: deterministic witnesses below 2^64,
/// probabilistic (40 random rounds) beyond.
fn is_prime_bigint(n: &BigInt) -> bool {
    if let Some(n64) = n.to_u64() {
        return is_prime_u64(n64);
    }
    let two = BigInt::from(2);
    if n % &two == BigInt::zero() {
        return false;
    }
    let n_minus_one: BigInt = n - 1;
    let mut d = n_minus_one.clone();
    let mut r = 0u32;
    while (&d % &two).is_zero() {
        d /= 2;
        r += 1;
    }
    let mut rng = rand::thread_rng();
    'witness: for _ in 0..40 {
        // witness in [2, n-2]
        let a: BigInt = {
            let bits = n.bits() as usize;
            let mut v = BigInt::zero();
            for _ in 0..(bits + 63) / 64 {
                v = (v << 64) | BigInt::from(rng.gen::<u64>());
            }
            v.mod_floor(&(n - 3)) + 2
        };
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 0..r.saturating_sub(1) {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zp64_concrete() {
        let zp = IntegersZp64::new(13);
        assert_eq!(zp.add_mod(10, 6), 3);
        assert_eq!(zp.sub_mod(3, 10), 6);
        assert_eq!(zp.neg_mod(5), 8);
        assert_eq!(zp.mul_mod(10, 6), 8);
        assert_eq!(zp.pow_mod(2, 12), 1);
    }

    #[test]
    fn test_zp64_residues() {
        let zp = IntegersZp64::new(13);
        assert_eq!(zp.modulus_of_u64(26), 0);
        assert_eq!(zp.modulus_of_u64(27), 1);
        assert_eq!(zp.modulus_of_i64(-1), 12);
        assert_eq!(zp.modulus_of_i64(-13), 0);
        assert_eq!(zp.modulus_of_i64(40), 1);
        assert_eq!(zp.modulus_of_bigint(&BigInt::from(-1)), 12);
    }

    #[test]
    fn test_zp64_symmetric_form() {
        let zp = IntegersZp64::new(13);
        assert_eq!(zp.symmetric_form(6), 6);
        assert_eq!(zp.symmetric_form(7), -6);
        assert_eq!(zp.symmetric_form(12), -1);
        assert_eq!(zp.symmetric_form(0), 0);
    }

    #[test]
    fn test_zp64_large_modulus() {
        // products overflow 64 bits; the Knuth path must agree with u128
        let p = (1u64 << 62) - 57;
        let zp = IntegersZp64::new(p);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10_000 {
            let a = rng.gen_range(0..p);
            let b = rng.gen_range(0..p);
            let expected = ((a as u128 * b as u128) % p as u128) as u64;
            assert_eq!(zp.mul_mod(a, b), expected);
        }
        assert_eq!(zp.pow_mod(3, p - 1), 1);
    }

    #[test]
    fn test_zp64_add_near_word_boundary() {
        let m = u64::MAX; // addition of residues can carry out of the word
        let zp = IntegersZp64::new(m);
        assert_eq!(zp.add_mod(m - 1, m - 1), m - 2);
        assert_eq!(zp.add_mod(m - 1, 1), 0);
        assert_eq!(zp.sub_mod(0, m - 1), 1);
    }

    #[test]
    fn test_zp64_inverse() {
        let zp = IntegersZp64::new(101);
        for a in 1..101 {
            let inv = zp.inverse(a).unwrap();
            assert_eq!(zp.mul_mod(a, inv), 1);
        }
        assert_eq!(zp.inverse(0), Err(ArithmeticError::NotInvertible));
        let z12 = IntegersZp64::new(12);
        assert_eq!(z12.inverse(4), Err(ArithmeticError::NotInvertible));
        assert_eq!(z12.inverse(5).unwrap(), 5);
    }

    #[test]
    fn test_zp64_reciprocal_table() {
        // modulus under the table limit: inverses answer from the cache
        let z12 = IntegersZp64::new(12);
        for a in 0..12u64 {
            match z12.inverse(a) {
                Ok(inv) => {
                    assert_eq!(z12.mul_mod(a, inv), 1);
                    assert!(z12.is_unit(&a));
                }
                Err(e) => {
                    assert_eq!(e, ArithmeticError::NotInvertible);
                    assert!(!z12.is_unit(&a));
                }
            }
        }
        // repeated calls hit the same cached table
        assert_eq!(z12.inverse(7), z12.inverse(7));
        // non-canonical input is reduced before the lookup
        let zp = IntegersZp64::new(13);
        assert_eq!(zp.inverse(2), zp.inverse(15));
    }

    #[test]
    fn test_zp64_inverse_beyond_table_limit() {
        // modulus too large for a table: the direct path answers
        let p = (1u64 << 62) - 57;
        let zp = IntegersZp64::new(p);
        for a in [1u64, 2, 123456789, p - 1] {
            let inv = zp.inverse(a).unwrap();
            assert_eq!(zp.mul_mod(a, inv), 1);
        }
        assert_eq!(zp.inverse(0), Err(ArithmeticError::NotInvertible));
    }

    #[test]
    fn test_zp64_perfect_power_cache() {
        let zp = IntegersZp64::new(27);
        assert_eq!(zp.modulus_perfect_power(), Some((3, 3)));
        // second call hits the cache, same answer
        assert_eq!(zp.modulus_perfect_power(), Some((3, 3)));
        assert_eq!(zp.perfect_power_base_ring().unwrap().modulus(), 3);
        let zp = IntegersZp64::new(13);
        assert_eq!(zp.modulus_perfect_power(), None);
    }

    #[test]
    fn test_zp64_field_detection() {
        assert!(IntegersZp64::new(13).is_field());
        assert!(IntegersZp64::new((1u64 << 62) - 57).is_field());
        assert!(!IntegersZp64::new(12).is_field());
        assert!(!IntegersZp64::new(1).is_field());
    }

    #[test]
    fn test_zp_bigint_matches_machine() {
        let p = 1000003u64;
        let machine = IntegersZp64::new(p);
        let generic = machine.as_generic_ring();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let a = rng.gen_range(0..p);
            let b = rng.gen_range(0..p);
            let (ba, bb) = (BigInt::from(a), BigInt::from(b));
            assert_eq!(BigInt::from(machine.add_mod(a, b)), generic.add(&ba, &bb));
            assert_eq!(BigInt::from(machine.sub_mod(a, b)), generic.sub(&ba, &bb));
            assert_eq!(BigInt::from(machine.mul_mod(a, b)), generic.mul(&ba, &bb));
        }
    }

    #[test]
    fn test_zp_bridge_round_trip() {
        let zp = IntegersZp::new(BigInt::from(65537));
        let machine = zp.as_machine_ring().unwrap();
        assert_eq!(machine.modulus(), 65537);
        assert_eq!(machine.as_generic_ring(), zp);
        // moduli beyond one word do not bridge
        let huge = IntegersZp::new(BigInt::from(u64::MAX) * 7 + 4);
        assert!(huge.as_machine_ring().is_none());
    }

    #[test]
    fn test_zp_symmetric_form() {
        let zp = IntegersZp::new(BigInt::from(13));
        assert_eq!(zp.symmetric_form(&BigInt::from(6)), BigInt::from(6));
        assert_eq!(zp.symmetric_form(&BigInt::from(7)), BigInt::from(-6));
        assert_eq!(zp.symmetric_form(&BigInt::from(12)), BigInt::from(-1));
    }

    #[test]
    fn test_zp_inverse_and_pow() {
        let zp = IntegersZp::new(BigInt::from(101));
        let inv = zp.inverse(&BigInt::from(7)).unwrap();
        assert_eq!((&inv * 7) % 101, BigInt::one());
        assert_eq!(
            zp.pow_mod(&BigInt::from(2), &BigInt::from(100)),
            BigInt::one()
        );
        let z12 = IntegersZp::new(BigInt::from(12));
        assert_eq!(
            z12.inverse(&BigInt::from(4)),
            Err(ArithmeticError::NotInvertible)
        );
    }

    #[test]
    fn test_is_prime_bigint_large() {
        // 2^89 - 1, a Mersenne prime
        let p = (BigInt::one() << 89) - 1;
        assert!(is_prime_bigint(&p));
        assert!(!is_prime_bigint(&(p + 2)));
    }
}
