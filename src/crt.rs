//! Chinese remainder reconstruction
//!
//! Rebuilds the unique value modulo a product of pairwise-coprime moduli
//! from its residues: one-shot pairwise and n-ary forms over machine words,
//! `BigInt`, and any [`Ring`]; magic objects that precompute the Bezout
//! residues once and amortize them across many reconstructions with the
//! same moduli (the hot path when combining one value per polynomial
//! coefficient); and a Garner basis for folding dozens of 62-bit primes
//! into signed big integers in one pass.
//!
//! Moduli must be positive and pairwise coprime. This is a documented
//! precondition, not a checked one: violating it returns a silently wrong
//! value, not an error. The machine-word paths do check for 64-bit
//! overflow and fail loudly there.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::error::{ArithmeticError, Result};
use crate::integers::ext_gcd;
use crate::machine::{ext_gcd_i64, floor_mod_i64, mul_mod_u64, pow_mod_u64};
use crate::magic::MulModMagic;
use crate::ring::Ring;

/// Bezout coefficient `s` of `(a, b)` normalized into `[0, b)`, so that
/// `s*a == gcd(a, b) (mod b)`.
fn bezout0_i64(a: i64, b: i64) -> i64 {
    let (_, s, _) = ext_gcd_i64(a, b);
    floor_mod_i64(s, b)
}

/// Pairwise CRT over machine words: the unique `x` in `[0, p1*p2)` with
/// `x == r1 (mod p1)` and `x == r2 (mod p2)`.
///
/// Checked arithmetic: the caller must keep `p1*p2` within 63 bits, and the
/// call fails with [`ArithmeticError::Overflow`] when it does not.
pub fn crt_i64(prime1: i64, prime2: i64, remainder1: i64, remainder2: i64) -> Result<i64> {
    debug_assert!(prime1 > 0 && prime2 > 0);
    let product = prime1
        .checked_mul(prime2)
        .ok_or(ArithmeticError::Overflow)?;
    let b21 = bezout0_i64(prime2, prime1) as u64;
    let b12 = bezout0_i64(prime1, prime2) as u64;
    let t1 = mul_mod_u64(b21, floor_mod_i64(remainder1, prime1) as u64, prime1 as u64);
    let t2 = mul_mod_u64(b12, floor_mod_i64(remainder2, prime2) as u64, prime2 as u64);
    // x = p2*t1 + p1*t2 < 2*product <= 2^64, so the sum fits unsigned
    let x = (prime2 as u64 * t1 + prime1 as u64 * t2) % product as u64;
    Ok(x as i64)
}

/// n-ary CRT over machine words, folding the pairwise formula left to
/// right. The running product must stay within 63 bits.
pub fn crt_i64_slice(primes: &[i64], remainders: &[i64]) -> Result<i64> {
    assert_eq!(primes.len(), remainders.len());
    assert!(!primes.is_empty());
    let mut x = floor_mod_i64(remainders[0], primes[0]);
    let mut product = primes[0];
    for i in 1..primes.len() {
        x = crt_i64(product, primes[i], x, remainders[i])?;
        product = product
            .checked_mul(primes[i])
            .ok_or(ArithmeticError::Overflow)?;
    }
    Ok(x)
}

/// Pairwise CRT over big integers; no overflow limit.
pub fn crt_bigint(
    prime1: &BigInt,
    prime2: &BigInt,
    remainder1: &BigInt,
    remainder2: &BigInt,
) -> BigInt {
    debug_assert!(prime1.is_positive() && prime2.is_positive());
    let product = prime1 * prime2;
    let (_, s, _) = ext_gcd(prime2, prime1);
    let t1 = (s * remainder1).mod_floor(prime1);
    let (_, s, _) = ext_gcd(prime1, prime2);
    let t2 = (s * remainder2).mod_floor(prime2);
    (prime2 * t1 + prime1 * t2).mod_floor(&product)
}

/// n-ary CRT over big integers.
pub fn crt_bigint_slice(primes: &[BigInt], remainders: &[BigInt]) -> BigInt {
    assert_eq!(primes.len(), remainders.len());
    assert!(!primes.is_empty());
    let mut x = remainders[0].mod_floor(&primes[0]);
    let mut product = primes[0].clone();
    for i in 1..primes.len() {
        x = crt_bigint(&product, &primes[i], &x, &remainders[i]);
        product *= &primes[i];
    }
    x
}

/// Pairwise CRT over any Euclidean ring or field.
pub fn crt_in<R: Ring>(
    ring: &R,
    prime1: &R::Element,
    prime2: &R::Element,
    remainder1: &R::Element,
    remainder2: &R::Element,
) -> Result<R::Element> {
    let magic = CrtMagic::new(ring, prime1.clone(), prime2.clone())?;
    Ok(magic.combine(remainder1, remainder2))
}

/// Precomputed pairwise CRT over machine words.
///
/// Valid for exactly this pair of moduli. Computing the two Bezout
/// residues costs an extended Euclid each; reconstructing with them costs
/// O(1) multiplications, which is what makes reconstructing millions of
/// independent values modulo the same prime pair cheap.
#[derive(Debug, Clone)]
pub struct CrtMagic64 {
    prime1: u64,
    prime2: u64,
    product: u64,
    /// `prime2^-1 mod prime1`, as a Bezout residue.
    bezout21: u64,
    /// `prime1^-1 mod prime2`.
    bezout12: u64,
    magic1: MulModMagic,
    magic2: MulModMagic,
    magic_product: MulModMagic,
}

impl CrtMagic64 {
    /// Precompute for the pair `(prime1, prime2)`; fails with
    /// [`ArithmeticError::Overflow`] when the product leaves 64 bits.
    pub fn new(prime1: u64, prime2: u64) -> Result<Self> {
        debug_assert!(prime1 > 0 && prime2 > 0);
        let product = prime1
            .checked_mul(prime2)
            .ok_or(ArithmeticError::Overflow)?;
        Ok(Self {
            prime1,
            prime2,
            product,
            bezout21: bezout0_u64(prime2, prime1),
            bezout12: bezout0_u64(prime1, prime2),
            magic1: MulModMagic::new(prime1),
            magic2: MulModMagic::new(prime2),
            magic_product: MulModMagic::new(product),
        })
    }

    #[inline]
    pub fn product(&self) -> u64 {
        self.product
    }

    /// The unique `x` in `[0, p1*p2)` with the given residues; operands
    /// must already be reduced below their moduli.
    #[inline]
    pub fn combine(&self, remainder1: u64, remainder2: u64) -> u64 {
        debug_assert!(remainder1 < self.prime1 && remainder2 < self.prime2);
        let t1 = self.magic1.mul_mod(self.bezout21, remainder1);
        let t2 = self.magic2.mul_mod(self.bezout12, remainder2);
        let x = self.prime2 as u128 * t1 as u128 + self.prime1 as u128 * t2 as u128;
        // x < 2*product, so the high half stays below the product
        self.magic_product.rem_u128(x)
    }
}

fn bezout0_u64(a: u64, b: u64) -> u64 {
    let (mut old_r, mut r) = ((a % b) as i128, b as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        let tmp = old_r - q * r;
        old_r = r;
        r = tmp;
        let tmp = old_s - q * s;
        old_s = s;
        s = tmp;
    }
    let b = b as i128;
    ((old_s % b + b) % b) as u64
}

/// Precomputed pairwise CRT over any Euclidean ring or field.
#[derive(Debug, Clone)]
pub struct CrtMagic<R: Ring> {
    ring: R,
    prime1: R::Element,
    prime2: R::Element,
    product: R::Element,
    bezout21: R::Element,
    bezout12: R::Element,
}

impl<R: Ring> CrtMagic<R> {
    /// Precompute both Bezout residues for the pair; fails with
    /// [`ArithmeticError::Unsupported`] on rings without a GCD.
    pub fn new(ring: &R, prime1: R::Element, prime2: R::Element) -> Result<Self> {
        let (_, s) = ring.first_bezout_coefficient(&prime2, &prime1)?;
        let bezout21 = ring.rem(&s, &prime1)?;
        let (_, s) = ring.first_bezout_coefficient(&prime1, &prime2)?;
        let bezout12 = ring.rem(&s, &prime2)?;
        let product = ring.mul(&prime1, &prime2);
        Ok(Self {
            ring: ring.clone(),
            prime1,
            prime2,
            product,
            bezout21,
            bezout12,
        })
    }

    pub fn product(&self) -> &R::Element {
        &self.product
    }

    /// Reconstruct from a residue pair in O(1) ring multiplications.
    pub fn combine(&self, remainder1: &R::Element, remainder2: &R::Element) -> R::Element {
        let ring = &self.ring;
        let t1 = ring
            .rem(&ring.mul(&self.bezout21, remainder1), &self.prime1)
            .expect("remainder by a fixed nonzero modulus");
        let t2 = ring
            .rem(&ring.mul(&self.bezout12, remainder2), &self.prime2)
            .expect("remainder by a fixed nonzero modulus");
        let x = ring.add(&ring.mul(&self.prime2, &t1), &ring.mul(&self.prime1, &t2));
        ring.rem(&x, &self.product)
            .expect("remainder by a fixed nonzero modulus")
    }
}

/// Precomputed Garner basis over many 62-bit primes.
///
/// Where the magic objects above amortize one prime pair, this amortizes a
/// whole prime ladder: partial products and their inverses are computed
/// once, then every residue vector folds into a `BigInt` with one u64
/// Garner step per prime.
#[derive(Debug, Clone)]
pub struct CrtBasis {
    /// The prime moduli.
    primes: Vec<u64>,
    /// Product of all primes.
    product: BigInt,
    /// Half the product, for signed reconstruction.
    half_product: BigInt,
    /// `partial_products[i] = primes[0] * ... * primes[i-1]`.
    partial_products: Vec<BigInt>,
    /// `partial_products[i]^-1 mod primes[i]`.
    garner_inverses: Vec<u64>,
}

impl CrtBasis {
    /// Build the basis for the given pairwise-coprime primes.
    pub fn new(primes: Vec<u64>) -> Self {
        let k = primes.len();
        let mut partial_products = vec![BigInt::one(); k];
        for i in 1..k {
            partial_products[i] = &partial_products[i - 1] * BigInt::from(primes[i - 1]);
        }
        let product = if k > 0 {
            &partial_products[k - 1] * BigInt::from(primes[k - 1])
        } else {
            BigInt::one()
        };
        let half_product = &product / 2;

        let mut garner_inverses = vec![0u64; k];
        for i in 1..k {
            let pp_mod = bigint_mod_u64(&partial_products[i], primes[i]);
            // primes here are prime, so Fermat gives the inverse
            garner_inverses[i] = pow_mod_u64(pp_mod, primes[i] - 2, primes[i]);
        }

        Self {
            primes,
            product,
            half_product,
            partial_products,
            garner_inverses,
        }
    }

    /// Basis over `count` generated 62-bit primes.
    pub fn with_primes(count: usize) -> Self {
        Self::new(crate::primes::generate_62bit_primes(count))
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    pub fn product(&self) -> &BigInt {
        &self.product
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    /// Residues of `value` for every prime in the basis.
    pub fn reduce(&self, value: &BigInt) -> Vec<u64> {
        self.primes
            .iter()
            .map(|&p| {
                if value.is_negative() {
                    let r = bigint_mod_u64(&-value, p);
                    if r == 0 {
                        0
                    } else {
                        p - r
                    }
                } else {
                    bigint_mod_u64(value, p)
                }
            })
            .collect()
    }

    /// Garner reconstruction: the unique value in `[0, product)`.
    pub fn reconstruct(&self, residues: &[u64]) -> BigInt {
        debug_assert_eq!(residues.len(), self.len());
        let k = residues.len();
        if k == 0 {
            return BigInt::zero();
        }
        let mut result = BigInt::from(residues[0]);
        for i in 1..k {
            let p = self.primes[i];
            let result_mod = bigint_mod_u64(&result, p);
            let diff = if residues[i] >= result_mod {
                residues[i] - result_mod
            } else {
                p - (result_mod - residues[i])
            };
            let coeff = mul_mod_u64(diff, self.garner_inverses[i], p);
            result += &self.partial_products[i] * BigInt::from(coeff);
        }
        result
    }

    /// Reconstruction into the symmetric range `[-product/2, product/2)`.
    pub fn reconstruct_signed(&self, residues: &[u64]) -> BigInt {
        let unsigned = self.reconstruct(residues);
        if unsigned > self.half_product {
            unsigned - &self.product
        } else {
            unsigned
        }
    }
}

/// `n mod p` for non-negative `n`, one Horner step per 64-bit digit.
fn bigint_mod_u64(n: &BigInt, p: u64) -> u64 {
    debug_assert!(!n.is_negative());
    let (_, digits) = n.to_u64_digits();
    if digits.is_empty() {
        return 0;
    }
    // 2^64 mod p
    let base_mod = {
        let two32 = (1u64 << 32) % p;
        mul_mod_u64(two32, two32, p)
    };
    let mut result = 0u64;
    for &digit in digits.iter().rev() {
        result = mul_mod_u64(result, base_mod, p);
        result = ((result as u128 + (digit % p) as u128) % p as u128) as u64;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integers::Integers;
    use crate::primes::generate_62bit_primes;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_crt_pairwise_concrete() {
        // x == 2 (mod 3), x == 3 (mod 5) -> 8
        assert_eq!(crt_i64(3, 5, 2, 3).unwrap(), 8);
        assert_eq!(crt_i64(3, 5, 0, 0).unwrap(), 0);
        assert_eq!(crt_i64(7, 11, 3, 4), Ok(59));
    }

    #[test]
    fn test_crt_negative_remainders() {
        // remainders are reduced into canonical form first
        let x = crt_i64(3, 5, -1, -2).unwrap();
        assert_eq!(x.rem_euclid(3), 2);
        assert_eq!(x.rem_euclid(5), 3);
    }

    #[test]
    fn test_crt_overflow_detected() {
        let p = (1i64 << 62) - 57;
        assert_eq!(crt_i64(p, p - 24, 1, 2), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn test_crt_slice_round_trip() {
        let primes = [3i64, 5, 7, 11, 13];
        let value = 9973i64;
        let remainders: Vec<i64> = primes.iter().map(|&p| value % p).collect();
        let x = crt_i64_slice(&primes, &remainders).unwrap();
        assert_eq!(x, value);
        for (&p, &r) in primes.iter().zip(&remainders) {
            assert_eq!(x % p, r);
        }
    }

    #[test]
    fn test_crt_magic64_matches_direct() {
        let mut rng = StdRng::seed_from_u64(17);
        let pairs = [(3u64, 5u64), (10007, 10009), ((1 << 31) - 1, (1 << 31) - 19)];
        for &(p1, p2) in &pairs {
            let magic = CrtMagic64::new(p1, p2).unwrap();
            for _ in 0..2_000 {
                let r1 = rng.gen_range(0..p1);
                let r2 = rng.gen_range(0..p2);
                let direct = crt_i64(p1 as i64, p2 as i64, r1 as i64, r2 as i64).unwrap();
                assert_eq!(magic.combine(r1, r2), direct as u64);
            }
        }
    }

    #[test]
    fn test_crt_magic64_large_product() {
        // product just below 2^64: only the magic path can hold it unsigned
        let p1 = (1u64 << 32) - 5;
        let p2 = (1u64 << 32) - 17;
        let magic = CrtMagic64::new(p1, p2).unwrap();
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..2_000 {
            let r1 = rng.gen_range(0..p1);
            let r2 = rng.gen_range(0..p2);
            let x = magic.combine(r1, r2);
            assert_eq!(x % p1, r1);
            assert_eq!(x % p2, r2);
            assert!(x < magic.product());
        }
        // 2^63-bit overflow of the pair itself is caught
        assert!(CrtMagic64::new(u64::MAX, 3).is_err());
    }

    #[test]
    fn test_crt_bigint_round_trip() {
        let primes: Vec<BigInt> = generate_62bit_primes(4)
            .into_iter()
            .map(BigInt::from)
            .collect();
        let value: BigInt = BigInt::from(u64::MAX) * u64::MAX * 31 + 7;
        let remainders: Vec<BigInt> = primes.iter().map(|p| value.mod_floor(p)).collect();
        let x = crt_bigint_slice(&primes, &remainders);
        assert_eq!(x, value);
    }

    #[test]
    fn test_crt_in_generic_ring() {
        let ring = Integers;
        let x = crt_in(
            &ring,
            &BigInt::from(3),
            &BigInt::from(5),
            &BigInt::from(2),
            &BigInt::from(3),
        )
        .unwrap();
        assert_eq!(x, BigInt::from(8));
    }

    #[test]
    fn test_crt_magic_generic_matches_machine() {
        let ring = Integers;
        let magic = CrtMagic::new(&ring, BigInt::from(10007), BigInt::from(10009)).unwrap();
        let machine = CrtMagic64::new(10007, 10009).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let r1 = rng.gen_range(0u64..10007);
            let r2 = rng.gen_range(0u64..10009);
            let generic = magic.combine(&BigInt::from(r1), &BigInt::from(r2));
            assert_eq!(generic, BigInt::from(machine.combine(r1, r2)));
        }
    }

    #[test]
    fn test_basis_round_trip() {
        let basis = CrtBasis::with_primes(4);
        let value = BigInt::from(1234567890123456789i64) * 987654321;
        let residues = basis.reduce(&value);
        assert_eq!(basis.reconstruct(&residues), value);
    }

    #[test]
    fn test_basis_signed_round_trip() {
        let basis = CrtBasis::with_primes(3);
        for v in [-12345i64, -1, 0, 1, 42, i64::MIN + 1, i64::MAX] {
            let value = BigInt::from(v);
            let residues = basis.reduce(&value);
            assert_eq!(basis.reconstruct_signed(&residues), value, "value {}", v);
        }
    }

    #[test]
    fn test_basis_matches_pairwise() {
        let basis = CrtBasis::new(vec![10007, 10009]);
        let pair = CrtMagic64::new(10007, 10009).unwrap();
        for (r1, r2) in [(0u64, 0u64), (1, 2), (10006, 10008), (523, 9999)] {
            assert_eq!(
                basis.reconstruct(&[r1, r2]),
                BigInt::from(pair.combine(r1, r2))
            );
        }
    }

    #[test]
    fn test_bigint_mod_u64() {
        let p = (1u64 << 62) - 57;
        let n = BigInt::from(u64::MAX) * u64::MAX * u64::MAX + 12345;
        assert_eq!(
            BigInt::from(bigint_mod_u64(&n, p)),
            n.mod_floor(&BigInt::from(p))
        );
        assert_eq!(bigint_mod_u64(&BigInt::zero(), p), 0);
    }
}
