//! Error types for address, balance, and hex parsing.

use thiserror::Error;

/// Address string parsing failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("bad address length")]
    BadLength,
    #[error("bad address prefix")]
    BadPrefix,
    #[error("bad address encoding")]
    BadEncoding,
    #[error("bad address checksum")]
    BadChecksum,
}

/// Balance formatting/parsing failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("unknown balance unit: {0}")]
    UnknownUnit(String),
    #[error("malformed balance string: {0:?}")]
    Malformed(String),
    #[error("{decimals} decimals exceed the precision of unit {unit}")]
    TooPrecise { unit: String, decimals: usize },
    #[error("balance out of range")]
    Overflow,
}

/// Hex constant parsing failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("bad hex length: expected {expected}, got {got}")]
    BadLength { expected: usize, got: usize },
    #[error("bad hex digit: {0:?}")]
    BadDigit(char),
}
