//! Error types for ring arithmetic

use thiserror::Error;

/// Errors raised by ring operations and checked machine arithmetic.
///
/// All variants signal caller logic errors (wrong ring, wrong operands) and
/// are not meant to be retried. "No reconstruction within the bounds" is a
/// normal outcome of CRT/rational reconstruction and is reported as `None`
/// by those functions, never through this enum.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("divide-and-remainder is not defined for these operands in this ring")]
    DivisionUndefined,

    #[error("element is not invertible in this ring")]
    NotInvertible,

    #[error("operation requires a Euclidean ring or a field")]
    Unsupported,

    #[error("checked 64-bit arithmetic overflowed")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, ArithmeticError>;
