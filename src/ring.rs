//! The commutative-ring contract
//!
//! Every coefficient domain in the algebra stack implements [`Ring`]: a
//! small required primitive set (addition, multiplication, divide-and-
//! remainder, reciprocal, canonical constants) from which the trait derives
//! the shared generic algorithms once: Euclidean GCD, the extended GCD and
//! Bezout coefficients, LCM, exponentiation by squaring, and factorial.
//!
//! Ring objects are stateless or immutable after construction and safe to
//! share across threads; elements are plain values owned by the caller.

use std::cmp::Ordering;
use std::fmt;

use rand::Rng;

use crate::error::{ArithmeticError, Result};

/// A commutative ring over an element type.
///
/// Contract: `(Element, add, mul)` obeys the ring axioms;
/// `is_zero(add(a, neg(a)))` holds for every `a`; `value_of` produces the
/// canonical representative (e.g. reduced modulo m) and is idempotent.
///
/// The default GCD family runs the Euclidean algorithm on `div_rem`; it is
/// exact only when the remainder is consistent with a Euclidean size
/// function, which is what [`Ring::is_euclidean`] asserts. Fields
/// short-circuit `gcd` to return any nonzero operand. Rings that are
/// neither fail with [`ArithmeticError::Unsupported`].
pub trait Ring: Clone + PartialEq + fmt::Debug + fmt::Display {
    type Element: Clone + PartialEq + fmt::Debug + fmt::Display;

    fn zero(&self) -> Self::Element;
    fn one(&self) -> Self::Element;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn neg(&self, a: &Self::Element) -> Self::Element;
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Quotient and remainder, failing with
    /// [`ArithmeticError::DivisionUndefined`] where division has no meaning
    /// for these operands.
    fn div_rem(&self, a: &Self::Element, b: &Self::Element)
        -> Result<(Self::Element, Self::Element)>;

    /// Multiplicative inverse, failing with
    /// [`ArithmeticError::NotInvertible`] on non-units.
    fn reciprocal(&self, a: &Self::Element) -> Result<Self::Element>;

    fn is_zero(&self, a: &Self::Element) -> bool;
    fn is_one(&self, a: &Self::Element) -> bool;
    fn is_unit(&self, a: &Self::Element) -> bool;

    /// Canonical representative of the machine integer `n` in this ring.
    fn value_of(&self, n: i64) -> Self::Element;

    /// Total order on canonical representatives.
    fn element_cmp(&self, a: &Self::Element, b: &Self::Element) -> Ordering;

    /// Whether every nonzero element is a unit.
    fn is_field(&self) -> bool;

    /// Whether `div_rem` realises a Euclidean size function, making the
    /// Euclidean GCD exact.
    fn is_euclidean(&self) -> bool;

    /// A random element, canonical form.
    fn sample(&self, rng: &mut impl Rng) -> Self::Element;

    /// Remainder of `a` by `b`.
    fn rem(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element> {
        Ok(self.div_rem(a, b)?.1)
    }

    /// Exact quotient where the caller knows the division is exact or the
    /// ring is a field.
    fn div(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element> {
        Ok(self.div_rem(a, b)?.0)
    }

    /// Greatest common divisor.
    ///
    /// In a field any nonzero element is a unit, so any nonzero operand is
    /// returned as-is; no canonical associate is chosen.
    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element> {
        if self.is_field() {
            if !self.is_zero(a) {
                return Ok(a.clone());
            }
            return Ok(b.clone());
        }
        if !self.is_euclidean() {
            return Err(ArithmeticError::Unsupported);
        }
        let mut x = a.clone();
        let mut y = b.clone();
        while !self.is_zero(&y) {
            let r = self.rem(&x, &y)?;
            x = y;
            y = r;
        }
        Ok(x)
    }

    /// Extended GCD: `(g, s, t)` with `s*a + t*b == g`.
    fn extended_gcd(
        &self,
        a: &Self::Element,
        b: &Self::Element,
    ) -> Result<(Self::Element, Self::Element, Self::Element)> {
        if self.is_field() {
            if !self.is_zero(a) {
                return Ok((a.clone(), self.one(), self.zero()));
            }
            return Ok((b.clone(), self.zero(), self.one()));
        }
        if !self.is_euclidean() {
            return Err(ArithmeticError::Unsupported);
        }
        let (mut old_r, mut r) = (a.clone(), b.clone());
        let (mut old_s, mut s) = (self.one(), self.zero());
        let (mut old_t, mut t) = (self.zero(), self.one());
        while !self.is_zero(&r) {
            let (q, rem) = self.div_rem(&old_r, &r)?;
            old_r = std::mem::replace(&mut r, rem);
            let next_s = self.sub(&old_s, &self.mul(&q, &s));
            old_s = std::mem::replace(&mut s, next_s);
            let next_t = self.sub(&old_t, &self.mul(&q, &t));
            old_t = std::mem::replace(&mut t, next_t);
        }
        Ok((old_r, old_s, old_t))
    }

    /// Half-extended GCD: `(g, s)` with `s*a == g (mod b)`. Tracks a single
    /// coefficient, which is all CRT needs.
    fn first_bezout_coefficient(
        &self,
        a: &Self::Element,
        b: &Self::Element,
    ) -> Result<(Self::Element, Self::Element)> {
        if self.is_field() {
            if !self.is_zero(a) {
                return Ok((a.clone(), self.one()));
            }
            return Ok((b.clone(), self.zero()));
        }
        if !self.is_euclidean() {
            return Err(ArithmeticError::Unsupported);
        }
        let (mut old_r, mut r) = (a.clone(), b.clone());
        let (mut old_s, mut s) = (self.one(), self.zero());
        while !self.is_zero(&r) {
            let (q, rem) = self.div_rem(&old_r, &r)?;
            old_r = std::mem::replace(&mut r, rem);
            let next_s = self.sub(&old_s, &self.mul(&q, &s));
            old_s = std::mem::replace(&mut s, next_s);
        }
        Ok((old_r, old_s))
    }

    /// Least common multiple via `a/gcd * b`.
    fn lcm(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element> {
        if self.is_zero(a) || self.is_zero(b) {
            return Ok(self.zero());
        }
        let g = self.gcd(a, b)?;
        let (q, _) = self.div_rem(a, &g)?;
        Ok(self.mul(&q, b))
    }

    /// Exponentiation by squaring; negative exponents invert the base first
    /// and therefore fail on non-units.
    fn pow(&self, base: &Self::Element, exp: i64) -> Result<Self::Element> {
        let (mut base, mut exp) = if exp < 0 {
            (self.reciprocal(base)?, exp.unsigned_abs())
        } else {
            (base.clone(), exp as u64)
        };
        let mut result = self.one();
        while exp > 0 {
            if exp & 1 == 1 {
                result = self.mul(&result, &base);
            }
            exp >>= 1;
            if exp > 0 {
                base = self.mul(&base, &base);
            }
        }
        Ok(result)
    }

    /// Sum of a slice of elements; the empty sum is zero.
    fn add_many(&self, elements: &[Self::Element]) -> Self::Element {
        let mut result = self.zero();
        for e in elements {
            result = self.add(&result, e);
        }
        result
    }

    /// `n!` as a ring element.
    fn factorial(&self, n: u64) -> Self::Element {
        let mut result = self.one();
        for i in 2..=n {
            result = self.mul(&result, &self.value_of(i as i64));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integers::{Integers, Integers64};
    use crate::zp::IntegersZp64;
    use num_bigint::BigInt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ring_axioms<R: Ring>(ring: &R, samples: &[R::Element]) {
        let zero = ring.zero();
        let one = ring.one();
        for a in samples {
            assert!(ring.is_zero(&ring.add(a, &ring.neg(a))), "a + (-a) == 0");
            assert_eq!(&ring.add(a, &zero), a, "a + 0 == a");
            assert_eq!(&ring.mul(a, &one), a, "a * 1 == a");
            for b in samples {
                assert_eq!(ring.add(a, b), ring.add(b, a), "commutative +");
                assert_eq!(ring.mul(a, b), ring.mul(b, a), "commutative *");
                for c in samples {
                    assert_eq!(
                        ring.add(&ring.add(a, b), c),
                        ring.add(a, &ring.add(b, c)),
                        "associative +"
                    );
                    assert_eq!(
                        ring.mul(&ring.mul(a, b), c),
                        ring.mul(a, &ring.mul(b, c)),
                        "associative *"
                    );
                    assert_eq!(
                        ring.mul(a, &ring.add(b, c)),
                        ring.add(&ring.mul(a, b), &ring.mul(a, c)),
                        "distributive"
                    );
                }
            }
        }
    }

    #[test]
    fn test_axioms_integers() {
        let ring = Integers;
        let mut rng = StdRng::seed_from_u64(1);
        let samples: Vec<BigInt> = (0..6).map(|_| ring.sample(&mut rng)).collect();
        ring_axioms(&ring, &samples);
    }

    #[test]
    fn test_axioms_integers64() {
        let ring = Integers64;
        // kept small so products of three cannot overflow
        let samples: Vec<i64> = vec![-1023, -17, 0, 1, 12, 4096];
        ring_axioms(&ring, &samples);
    }

    #[test]
    fn test_axioms_zp64() {
        let ring = IntegersZp64::new(65537);
        let mut rng = StdRng::seed_from_u64(2);
        let samples: Vec<u64> = (0..6).map(|_| ring.sample(&mut rng)).collect();
        ring_axioms(&ring, &samples);
    }

    #[test]
    fn test_generic_gcd_over_integers() {
        let ring = Integers;
        let g = ring
            .gcd(&BigInt::from(240), &BigInt::from(46))
            .unwrap();
        assert_eq!(g, BigInt::from(2));

        let (g, s, t) = ring
            .extended_gcd(&BigInt::from(240), &BigInt::from(46))
            .unwrap();
        assert_eq!(&s * 240 + &t * 46, g);

        let lcm = ring.lcm(&BigInt::from(4), &BigInt::from(6)).unwrap();
        assert_eq!(lcm, BigInt::from(12));
    }

    #[test]
    fn test_field_gcd_short_circuit() {
        let ring = IntegersZp64::new(13);
        // any nonzero operand comes back as-is
        assert_eq!(ring.gcd(&5, &7).unwrap(), 5);
        assert_eq!(ring.gcd(&0, &7).unwrap(), 7);
        assert_eq!(ring.gcd(&0, &0).unwrap(), 0);
    }

    #[test]
    fn test_gcd_unsupported() {
        // Z/12 is neither a field nor Euclidean
        let ring = IntegersZp64::new(12);
        assert_eq!(ring.gcd(&4, &6), Err(ArithmeticError::Unsupported));
    }

    #[test]
    fn test_pow() {
        let ring = Integers;
        assert_eq!(
            ring.pow(&BigInt::from(3), 20).unwrap(),
            BigInt::from(3u64.pow(20))
        );
        assert_eq!(ring.pow(&BigInt::from(5), 0).unwrap(), BigInt::from(1));

        let zp = IntegersZp64::new(101);
        assert_eq!(zp.pow(&2, 100).unwrap(), 1); // Fermat
        let inv7 = zp.pow(&7, -1).unwrap();
        assert_eq!(zp.mul(&inv7, &7), 1);
        assert_eq!(zp.pow(&7, -2).unwrap(), zp.mul(&inv7, &inv7));
        // negative exponent on a non-unit fails
        assert_eq!(
            Integers.pow(&BigInt::from(2), -1),
            Err(ArithmeticError::NotInvertible)
        );
    }

    #[test]
    fn test_add_many() {
        let ring = Integers;
        let elements: Vec<BigInt> = (1..=10).map(BigInt::from).collect();
        assert_eq!(ring.add_many(&elements), BigInt::from(55));
        assert_eq!(ring.add_many(&[]), BigInt::from(0));
        let zp = IntegersZp64::new(13);
        assert_eq!(zp.add_many(&[10, 6, 12]), (10 + 6 + 12) % 13);
    }

    #[test]
    fn test_factorial() {
        assert_eq!(Integers.factorial(0), BigInt::from(1));
        assert_eq!(Integers.factorial(5), BigInt::from(120));
        assert_eq!(Integers.factorial(20), BigInt::from(2432902008176640000u64));
        let zp = IntegersZp64::new(13);
        // Wilson: (p-1)! == -1 mod p
        assert_eq!(zp.factorial(12), 12);
    }

    #[test]
    fn test_first_bezout_coefficient() {
        let ring = Integers;
        let (g, s) = ring
            .first_bezout_coefficient(&BigInt::from(240), &BigInt::from(46))
            .unwrap();
        assert_eq!(g, BigInt::from(2));
        // s*240 == g (mod 46)
        let lhs = (&s * 240 - &g) % 46;
        assert_eq!(lhs, BigInt::from(0), "{} * 240 != {} mod 46", s, g);
    }
}
