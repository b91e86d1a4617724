//! Magic-number division by a fixed 64-bit divisor
//!
//! Precomputes, once per divisor, a descriptor turning division and modulo
//! into a multiply-high and shift (the Granlund-Montgomery construction),
//! with a pure-shift fast path for powers of two. A third descriptor
//! reduces full 128-bit products modulo a 64-bit modulus via Knuth's
//! Algorithm D with 32-bit digit estimates, avoiding native 128-bit
//! division entirely.
//!
//! Every fast path is bit-exact with true division for every representable
//! dividend; the tests compare against native `/` and `%` over large random
//! samples and the edge shapes (powers of two, extreme dividends, tiny and
//! huge divisors).

/// High 64 bits of the full 128-bit product.
#[inline]
fn mul_hi_u64(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) >> 64) as u64
}

/// High 64 bits of the signed 128-bit product.
#[inline]
fn mul_hi_i64(a: i64, b: i64) -> i64 {
    ((a as i128 * b as i128) >> 64) as i64
}

/// Precomputed descriptor for unsigned division by a fixed divisor.
///
/// Construction cost is paid once per divisor and amortized across all
/// subsequent reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicUnsigned {
    multiplier: u64,
    shift: u32,
    /// Round the multiply-high estimate with an add-and-halve correction.
    add: bool,
    /// Pure-shift fast path.
    power_of_two: bool,
    divisor: u64,
}

impl MagicUnsigned {
    /// Build the descriptor for `divisor > 0`.
    pub fn new(divisor: u64) -> Self {
        assert!(divisor > 0, "division by zero has no magic");
        let floor_log2 = 63 - divisor.leading_zeros();
        if divisor.is_power_of_two() {
            return Self {
                multiplier: 0,
                shift: floor_log2,
                add: false,
                power_of_two: true,
                divisor,
            };
        }
        // multiplier ~= 2^(64 + floor_log2) / divisor, rounded up; when the
        // rounding error is too large, double the multiplier and recover the
        // lost bit with the add-and-halve correction at division time.
        let k = 64 + floor_log2;
        let proposed = ((1u128 << k) / divisor as u128) as u64;
        let rem = ((1u128 << k) % divisor as u128) as u64;
        let e = divisor - rem;
        if e < (1u64 << floor_log2) {
            Self {
                multiplier: proposed.wrapping_add(1),
                shift: floor_log2,
                add: false,
                power_of_two: false,
                divisor,
            }
        } else {
            let mut m = proposed.wrapping_mul(2);
            let twice_rem = rem.wrapping_mul(2);
            if twice_rem >= divisor || twice_rem < rem {
                m = m.wrapping_add(1);
            }
            Self {
                multiplier: m.wrapping_add(1),
                shift: floor_log2,
                add: true,
                power_of_two: false,
                divisor,
            }
        }
    }

    #[inline]
    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// `dividend / divisor`, bit-exact with hardware division.
    #[inline]
    pub fn div(&self, dividend: u64) -> u64 {
        if self.power_of_two {
            return dividend >> self.shift;
        }
        let q = mul_hi_u64(self.multiplier, dividend);
        if self.add {
            let t = ((dividend - q) >> 1).wrapping_add(q);
            t >> self.shift
        } else {
            q >> self.shift
        }
    }

    /// `dividend % divisor`, bit-exact with hardware remainder.
    #[inline]
    pub fn rem(&self, dividend: u64) -> u64 {
        dividend - self.div(dividend).wrapping_mul(self.divisor)
    }
}

/// Precomputed descriptor for signed (truncating) division by a fixed
/// nonzero divisor, negative divisors included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicSigned {
    multiplier: i64,
    shift: u32,
    add: bool,
    negative: bool,
    power_of_two: bool,
    divisor: i64,
}

impl MagicSigned {
    /// Build the descriptor for `divisor != 0`.
    pub fn new(divisor: i64) -> Self {
        assert!(divisor != 0, "division by zero has no magic");
        let abs_d = divisor.unsigned_abs();
        let floor_log2 = 63 - abs_d.leading_zeros();
        if abs_d.is_power_of_two() {
            return Self {
                multiplier: 0,
                shift: floor_log2,
                add: false,
                negative: divisor < 0,
                power_of_two: true,
                divisor,
            };
        }
        // multiplier ~= 2^(63 + floor_log2) / |divisor|, one bit narrower
        // than the unsigned case because the dividend is at most 2^63.
        let k = 63 + floor_log2;
        let proposed = ((1u128 << k) / abs_d as u128) as u64;
        let rem = ((1u128 << k) % abs_d as u128) as u64;
        let e = abs_d - rem;
        let (proposed, shift, add) = if e < (1u64 << floor_log2) {
            (proposed, floor_log2 - 1, false)
        } else {
            let mut p = proposed.wrapping_mul(2);
            let twice_rem = rem.wrapping_mul(2);
            if twice_rem >= abs_d || twice_rem < rem {
                p = p.wrapping_add(1);
            }
            (p, floor_log2, true)
        };
        let mut multiplier = proposed.wrapping_add(1) as i64;
        if divisor < 0 {
            multiplier = multiplier.wrapping_neg();
        }
        Self {
            multiplier,
            shift,
            add,
            negative: divisor < 0,
            power_of_two: false,
            divisor,
        }
    }

    #[inline]
    pub fn divisor(&self) -> i64 {
        self.divisor
    }

    /// `dividend / divisor` with truncation toward zero, matching `/` on
    /// `i64`. The single undefined input of hardware division,
    /// `i64::MIN / -1`, wraps instead of trapping.
    #[inline]
    pub fn div(&self, dividend: i64) -> i64 {
        if self.power_of_two {
            let mask = ((1u64 << self.shift) - 1) as i64;
            // round toward zero: push negative dividends up before shifting
            let q = dividend.wrapping_add((dividend >> 63) & mask) >> self.shift;
            return if self.negative { q.wrapping_neg() } else { q };
        }
        let mut q = mul_hi_i64(self.multiplier, dividend);
        if self.add {
            let sign: i64 = if self.negative { -1 } else { 0 };
            q = q.wrapping_add((dividend ^ sign).wrapping_sub(sign));
        }
        q >>= self.shift;
        q + (q < 0) as i64
    }

    /// `dividend % divisor` with the sign convention of `%` on `i64`.
    #[inline]
    pub fn rem(&self, dividend: i64) -> i64 {
        dividend.wrapping_sub(self.div(dividend).wrapping_mul(self.divisor))
    }
}

/// Precomputed descriptor for reducing a 128-bit value modulo a fixed
/// 64-bit modulus without native 128-bit division.
///
/// Stores the divisor normalized to have its top bit set together with its
/// 32-bit halves; [`MulModMagic::rem_u128`] then runs two quotient-digit
/// estimation steps of Knuth's Algorithm D.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulModMagic {
    divisor: u64,
    /// Normalization shift, `divisor.leading_zeros()`.
    shift: u32,
    /// `divisor << shift`.
    v: u64,
    /// High 32 bits of `v`.
    v1: u64,
    /// Low 32 bits of `v`.
    v0: u64,
}

impl MulModMagic {
    /// Build the descriptor for `divisor > 0`.
    pub fn new(divisor: u64) -> Self {
        assert!(divisor > 0, "division by zero has no magic");
        let shift = divisor.leading_zeros();
        let v = divisor << shift;
        Self {
            divisor,
            shift,
            v,
            v1: v >> 32,
            v0: v & 0xFFFF_FFFF,
        }
    }

    #[inline]
    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    /// `a * b mod divisor` for operands already reduced below the divisor.
    /// The 128-bit product never meets a native 128-bit divide.
    #[inline]
    pub fn mul_mod(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.divisor && b < self.divisor);
        self.rem_u128(a as u128 * b as u128)
    }

    /// `x mod divisor` for `x >> 64 < divisor`.
    ///
    /// Knuth Algorithm D specialised to a four-digit dividend and two-digit
    /// divisor in base 2^32, divisor pre-normalized at construction.
    pub fn rem_u128(&self, x: u128) -> u64 {
        let hi = (x >> 64) as u64;
        let lo = x as u64;
        debug_assert!(hi < self.divisor);
        const B: u64 = 1 << 32;
        let s = self.shift;
        let (un64, un10) = if s == 0 {
            (hi, lo)
        } else {
            ((hi << s) | (lo >> (64 - s)), lo << s)
        };
        let un1 = un10 >> 32;
        let un0 = un10 & 0xFFFF_FFFF;

        // first quotient digit estimate; off by at most two, corrected below
        let mut q1 = un64 / self.v1;
        let mut rhat = un64 - q1 * self.v1;
        while q1 >= B || q1 * self.v0 > (rhat << 32) | un1 {
            q1 -= 1;
            rhat += self.v1;
            if rhat >= B {
                break;
            }
        }
        let un21 = un64
            .wrapping_mul(B)
            .wrapping_add(un1)
            .wrapping_sub(q1.wrapping_mul(self.v));

        // second quotient digit
        let mut q0 = un21 / self.v1;
        rhat = un21 - q0 * self.v1;
        while q0 >= B || q0 * self.v0 > (rhat << 32) | un0 {
            q0 -= 1;
            rhat += self.v1;
            if rhat >= B {
                break;
            }
        }
        un21.wrapping_mul(B)
            .wrapping_add(un0)
            .wrapping_sub(q0.wrapping_mul(self.v))
            >> s
    }
}
