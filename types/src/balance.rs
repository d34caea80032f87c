//! Account balances in raw units, with unit-scaled decimal formatting.
//!
//! Balances are unsigned 128-bit integers of the smallest unit ("raw").
//! Unit suffixes name decimal shifts: `uxrb` 10^18 up to `Gxrb` 10^33.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BalanceError;

/// Highest number of decimals any unit can produce; used as the "don't
/// truncate" precision.
pub const MAX_PRECISION: u32 = 39;

/// Recognized units and their decimal exponents.
const UNITS: &[(&str, u32)] = &[
    ("raw", 0),
    ("uxrb", 18),
    ("mxrb", 21),
    ("xrb", 24),
    ("kxrb", 27),
    ("Mxrb", 30),
    ("Gxrb", 33),
];

fn unit_exp(unit: &str) -> Result<u32, BalanceError> {
    UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, exp)| *exp)
        .ok_or_else(|| BalanceError::UnknownUnit(unit.to_string()))
}

/// An amount of raw units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Balance(u128);

impl Balance {
    pub const SIZE: usize = 16;
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Build a balance from two 64-bit halves (high, low).
    pub fn from_ints(hi: u64, lo: u64) -> Self {
        Self(((hi as u128) << 64) | lo as u128)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Canonical 16-byte big-endian encoding.
    pub fn to_be_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// Format this balance in the given unit, truncated to at most
    /// `precision` decimals (trailing zeros are trimmed).
    pub fn format(&self, unit: &str, precision: u32) -> Result<String, BalanceError> {
        let exp = unit_exp(unit)?;
        if exp == 0 {
            return Ok(self.0.to_string());
        }

        let div = 10u128.pow(exp);
        let int = self.0 / div;
        let frac = self.0 % div;
        if frac == 0 {
            return Ok(int.to_string());
        }

        let mut decimals = format!("{:0width$}", frac, width = exp as usize);
        if (precision as usize) < decimals.len() {
            decimals.truncate(precision as usize);
        }
        while decimals.ends_with('0') {
            decimals.pop();
        }

        if decimals.is_empty() {
            Ok(int.to_string())
        } else {
            Ok(format!("{int}.{decimals}"))
        }
    }

    /// Parse a decimal string in the given unit back to raw.
    pub fn parse(s: &str, unit: &str) -> Result<Self, BalanceError> {
        let exp = unit_exp(unit)?;

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() || int_part.bytes().any(|b| !b.is_ascii_digit()) {
            return Err(BalanceError::Malformed(s.to_string()));
        }
        if !frac_part.is_empty() && frac_part.bytes().any(|b| !b.is_ascii_digit()) {
            return Err(BalanceError::Malformed(s.to_string()));
        }
        if frac_part.len() as u32 > exp {
            return Err(BalanceError::TooPrecise {
                unit: unit.to_string(),
                decimals: frac_part.len(),
            });
        }

        let int: u128 = int_part
            .parse()
            .map_err(|_| BalanceError::Overflow)?;
        let scaled = int
            .checked_mul(10u128.pow(exp))
            .ok_or(BalanceError::Overflow)?;

        let frac = if frac_part.is_empty() {
            0u128
        } else {
            let digits: u128 = frac_part
                .parse()
                .map_err(|_| BalanceError::Overflow)?;
            digits * 10u128.pow(exp - frac_part.len() as u32)
        };

        scaled
            .checked_add(frac)
            .map(Self)
            .ok_or(BalanceError::Overflow)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Mxrb is the conventional human unit.
        match self.format("Mxrb", MAX_PRECISION) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{} raw", self.0),
        }
    }
}
