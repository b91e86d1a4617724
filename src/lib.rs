//! Exact arithmetic kernel for computer algebra
//!
//! The commutative-ring abstraction plus the number-theoretic primitives
//! every higher-level algebraic structure is built on: fast modular
//! reduction via precomputed magic constants, Chinese Remainder
//! reconstruction, and rational reconstruction.
//!
//! # Overview
//!
//! A multi-modular algorithm picks several machine-word primes, performs
//! an exact computation modulo each through [`IntegersZp64`] (whose
//! reductions ride the precomputed descriptors in [`magic`]), combines the
//! per-prime results with [`crt`] into a value modulo the product of the
//! primes, and, when the true answer is rational, recovers a
//! numerator/denominator pair with [`ratrec`].
//!
//! # Key components
//!
//! - [`machine`] - overflow-checked 64-bit primitives, binary and extended
//!   GCD, modular inverse, perfect-power decomposition
//! - [`magic`] - magic-number division descriptors (Granlund-Montgomery
//!   multiply-and-shift, 128-bit Knuth reduction)
//! - [`primes`] - Miller-Rabin and machine-word prime generation
//! - [`ring`] - the [`Ring`] contract and its default generic algorithms
//! - [`integers`] / [`zp`] - the concrete numeric rings Z, Z64, Z/m
//! - [`crt`] - pairwise, n-ary, magic-object and Garner-basis CRT
//! - [`ratrec`] - bounded, Farey and error-tolerant rational reconstruction

pub mod crt;
pub mod error;
pub mod integers;
pub mod machine;
pub mod magic;
pub mod primes;
pub mod ratrec;
pub mod ring;
pub mod zp;

pub use crt::{crt_bigint, crt_bigint_slice, crt_i64, crt_i64_slice, crt_in, CrtBasis, CrtMagic, CrtMagic64};
pub use error::ArithmeticError;
pub use integers::{Integers, Integers64};
pub use magic::{MagicSigned, MagicUnsigned, MulModMagic};
pub use ratrec::{
    reconstruct, reconstruct_farey, reconstruct_farey_error_tolerant, reconstruct_i64,
    reconstruct_in,
};
pub use ring::Ring;
pub use zp::{IntegersZp, IntegersZp64};
