//! Machine-word prime generation
//!
//! Multi-modular algorithms pick several machine-word primes, compute
//! modulo each, and recombine with CRT. This module supplies the primes:
//! a deterministic Miller-Rabin test and generators for 31-bit and 62-bit
//! prime batches (62-bit primes leave two bits of headroom for sums of
//! products before reduction).

use crate::machine::{mul_mod_u64, pow_mod_u64};

/// Deterministic Miller-Rabin primality test for 64-bit integers.
pub fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 || n == 3 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    // Write n-1 as 2^r * d
    let mut d = n - 1;
    let mut r = 0u32;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }

    // These witnesses decide primality for every n < 2^64
    let witnesses: [u64; 7] = [2, 325, 9375, 28178, 450775, 9780504, 1795265022];

    for &a in &witnesses {
        if a % n == 0 {
            continue;
        }
        if !miller_rabin_witness(a, d, r, n) {
            return false;
        }
    }
    true
}

fn miller_rabin_witness(a: u64, d: u64, r: u32, n: u64) -> bool {
    let mut x = pow_mod_u64(a, d, n);
    if x == 1 || x == n - 1 {
        return true;
    }
    for _ in 0..r - 1 {
        x = mul_mod_u64(x, x, n);
        if x == n - 1 {
            return true;
        }
    }
    false
}

/// Primality test for 32-bit integers.
pub fn is_prime_u32(n: u32) -> bool {
    is_prime_u64(n as u64)
}

/// Generate `count` distinct 31-bit primes, descending from just below 2^31.
///
/// Products of two residues fit a 64-bit intermediate, which keeps the
/// per-prime arithmetic on the direct fast path.
pub fn generate_31bit_primes(count: usize) -> Vec<u32> {
    let mut primes = Vec::with_capacity(count);
    let mut candidate = (1u32 << 31) - 1;
    while primes.len() < count {
        if is_prime_u32(candidate) {
            primes.push(candidate);
        }
        candidate -= 2; // skip even numbers
    }
    primes
}

/// Generate `count` distinct 62-bit primes, descending from just below 2^62.
///
/// Larger primes halve the prime count needed to cover a given bit width;
/// their products require the 128-bit reduction path.
pub fn generate_62bit_primes(count: usize) -> Vec<u64> {
    let mut primes = Vec::with_capacity(count);
    let mut candidate = (1u64 << 62) - 57; // 2^62 - 57 is prime
    while primes.len() < count {
        if is_prime_u64(candidate) {
            primes.push(candidate);
        }
        candidate = candidate.saturating_sub(2);
        if candidate < (1u64 << 61) {
            break;
        }
    }
    primes
}

/// Largest prime strictly below `n`, or `None` when there is none.
pub fn next_prime_below(n: u64) -> Option<u64> {
    if n <= 2 {
        return None;
    }
    if n == 3 {
        return Some(2);
    }
    let mut candidate = if n % 2 == 0 { n - 1 } else { n - 2 };
    while candidate >= 3 {
        if is_prime_u64(candidate) {
            return Some(candidate);
        }
        candidate -= 2;
    }
    Some(2)
}

/// Number of 62-bit primes whose product covers `bit_width` bits, with one
/// prime of margin.
pub fn estimate_primes_needed(bit_width: usize) -> usize {
    (bit_width + 61) / 62 + 1
}
