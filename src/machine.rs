//! Checked and unchecked 64-bit arithmetic primitives
//!
//! Overflow-checked add/multiply/pow, binary GCD, the extended Euclidean
//! algorithm, modular inverses and exponentiation with 128-bit
//! intermediates, and perfect-power decomposition. Everything above
//! (modular rings, CRT, rational reconstruction) is built on these.

use crate::error::{ArithmeticError, Result};

/// Checked addition, failing with [`ArithmeticError::Overflow`] instead of
/// wrapping.
#[inline]
pub fn checked_add_i64(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow)
}

/// Checked subtraction.
#[inline]
pub fn checked_sub_i64(a: i64, b: i64) -> Result<i64> {
    a.checked_sub(b).ok_or(ArithmeticError::Overflow)
}

/// Checked multiplication.
#[inline]
pub fn checked_mul_i64(a: i64, b: i64) -> Result<i64> {
    a.checked_mul(b).ok_or(ArithmeticError::Overflow)
}

/// Checked exponentiation by squaring.
pub fn checked_pow_i64(base: i64, exp: u32) -> Result<i64> {
    let mut result = 1i64;
    let mut base = base;
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result = checked_mul_i64(result, base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = checked_mul_i64(base, base)?;
        }
    }
    Ok(result)
}

/// Binary (Stein) GCD for unsigned words.
pub fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    if a == 0 {
        return b;
    }
    if b == 0 {
        return a;
    }
    let shift = (a | b).trailing_zeros();
    a >>= a.trailing_zeros();
    loop {
        b >>= b.trailing_zeros();
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        b -= a;
        if b == 0 {
            break;
        }
    }
    a << shift
}

/// GCD for signed words; the result is non-negative.
pub fn gcd_i64(a: i64, b: i64) -> i64 {
    gcd_u64(a.unsigned_abs(), b.unsigned_abs()) as i64
}

/// Extended Euclidean algorithm: returns `(g, s, t)` with `s*a + t*b == g`.
///
/// For non-negative inputs the returned gcd is non-negative.
pub fn ext_gcd_i64(a: i64, b: i64) -> (i64, i64, i64) {
    let (mut old_r, mut r) = (a, b);
    let (mut old_s, mut s) = (1i64, 0i64);
    let (mut old_t, mut t) = (0i64, 1i64);
    while r != 0 {
        let q = old_r / r;
        let tmp = old_r - q * r;
        old_r = r;
        r = tmp;
        let tmp = old_s - q * s;
        old_s = s;
        s = tmp;
        let tmp = old_t - q * t;
        old_t = t;
        t = tmp;
    }
    (old_r, old_s, old_t)
}

/// Modular inverse of `a` modulo `m`, or `None` when `gcd(a, m) != 1`.
pub fn mod_inverse_u64(a: u64, m: u64) -> Option<u64> {
    if m == 0 {
        return None;
    }
    if m == 1 {
        return Some(0);
    }
    let m128 = m as i128;
    let (mut old_r, mut r) = ((a % m) as i128, m128);
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
    if old_r != 1 {
        return None;
    }
    Some(((old_s % m128 + m128) % m128) as u64)
}

/// Modular multiplication with a 128-bit intermediate product.
#[inline]
pub fn mul_mod_u64(a: u64, b: u64, modulus: u64) -> u64 {
    ((a as u128 * b as u128) % modulus as u128) as u64
}

/// Modular exponentiation with 128-bit intermediates.
pub fn pow_mod_u64(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result = 1u64;
    base %= modulus;
    while exp > 0 {
        if exp % 2 == 1 {
            result = mul_mod_u64(result, base, modulus);
        }
        exp /= 2;
        base = mul_mod_u64(base, base, modulus);
    }
    result
}

/// Least non-negative residue of `a` modulo `m > 0`.
#[inline]
pub fn floor_mod_i64(a: i64, m: i64) -> i64 {
    a.rem_euclid(m)
}

/// Map a canonical residue `a` in `[0, m)` into the symmetric range
/// `(-m/2, m/2]`.
#[inline]
pub fn symmetric_form_i64(a: u64, m: u64) -> i64 {
    debug_assert!(a < m);
    if a <= m / 2 {
        a as i64
    } else {
        -((m - a) as i64)
    }
}

/// Largest `r` with `r^k <= n`.
fn nth_root_u64(n: u64, k: u32) -> u64 {
    debug_assert!(k >= 1);
    if k == 1 || n <= 1 {
        return n;
    }
    let mut lo = 1u64;
    // 2^ceil(64/k) is a safe upper bound on the root
    let mut hi = 1u64 << (64 / k + 1).min(63);
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        match mid.checked_pow(k) {
            Some(p) if p <= n => lo = mid,
            _ => hi = mid - 1,
        }
    }
    lo
}

/// Decompose `n` as `base^exp` with the maximal exponent `exp >= 2`,
/// or `None` when `n` is not a perfect power.
pub fn perfect_power_decomposition(n: u64) -> Option<(u64, u32)> {
    if n < 4 {
        return None;
    }
    // The largest useful exponent is log2(n); try from the top so the first
    // hit has maximal exponent (and hence minimal base).
    let max_exp = 63 - n.leading_zeros();
    for exp in (2..=max_exp).rev() {
        let base = nth_root_u64(n, exp);
        if base < 2 {
            continue;
        }
        if let Some(p) = base.checked_pow(exp) {
            if p == n {
                return Some((base, exp));
            }
        }
    }
    None
}
