//! Fixed-point decimal arithmetic over `U256`.
//!
//! On-chain amounts are integers in the asset's smallest unit. Ratios between
//! reserves are fractional, so they are carried as a [`FixedDecimal`] with an
//! explicit number of fractional digits. Floating point is never used.

use alloy_primitives::U256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use stake_types::StakeError;

/// Fractional digits used for reserve ratios and LP conversions.
pub const RATIO_PRECISION: u32 = 18;

/// Largest power of ten that fits in a `U256`.
const MAX_SCALE: u32 = 77;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumericError {
    #[error("invalid decimal string '{0}'")]
    Parse(String),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("scale {0} exceeds the supported maximum")]
    ScaleTooLarge(u32),
}

impl From<NumericError> for StakeError {
    fn from(e: NumericError) -> Self {
        StakeError::Numeric(e.to_string())
    }
}

fn pow10(exp: u32) -> Result<U256, NumericError> {
    if exp > MAX_SCALE {
        return Err(NumericError::ScaleTooLarge(exp));
    }
    U256::from(10u8)
        .checked_pow(U256::from(exp))
        .ok_or(NumericError::Overflow)
}

/// A non-negative decimal `mantissa / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDecimal {
    mantissa: U256,
    scale: u32,
}

impl FixedDecimal {
    pub fn new(mantissa: U256, scale: u32) -> Result<Self, NumericError> {
        if scale > MAX_SCALE {
            return Err(NumericError::ScaleTooLarge(scale));
        }
        Ok(Self { mantissa, scale })
    }

    pub fn from_integer(value: U256) -> Self {
        Self {
            mantissa: value,
            scale: 0,
        }
    }

    /// Interpret a native amount as a human amount with `decimals` places.
    pub fn from_native(amount: U256, decimals: u32) -> Result<Self, NumericError> {
        Self::new(amount, decimals)
    }

    /// Convert back to a native amount with `decimals` places, truncating
    /// any digits beyond them.
    pub fn to_native(&self, decimals: u32) -> Result<U256, NumericError> {
        if decimals >= self.scale {
            self.mantissa
                .checked_mul(pow10(decimals - self.scale)?)
                .ok_or(NumericError::Overflow)
        } else {
            Ok(self.mantissa / pow10(self.scale - decimals)?)
        }
    }

    pub fn parse(s: &str) -> Result<Self, NumericError> {
        let trimmed = s.trim();
        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((i, f)) => (i, f),
            None => (trimmed, ""),
        };
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
            return Err(NumericError::Parse(s.to_string()));
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| NumericError::Parse(s.to_string()))?;
        if scale > MAX_SCALE {
            return Err(NumericError::ScaleTooLarge(scale));
        }
        let digits = format!("{int_part}{frac_part}");
        let digits = if digits.is_empty() { "0" } else { digits.as_str() };
        let mantissa =
            U256::from_str_radix(digits, 10).map_err(|_| NumericError::Parse(s.to_string()))?;
        Ok(Self { mantissa, scale })
    }

    pub fn mantissa(&self) -> U256 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn mul(&self, other: &Self) -> Result<Self, NumericError> {
        let mantissa = self
            .mantissa
            .checked_mul(other.mantissa)
            .ok_or(NumericError::Overflow)?;
        Self::new(mantissa, self.scale + other.scale)
    }

    /// `a / b` truncated to `precision` fractional digits.
    pub fn div(a: &Self, b: &Self, precision: u32) -> Result<Self, NumericError> {
        if b.mantissa.is_zero() {
            return Err(NumericError::DivisionByZero);
        }
        // a/b = a.m * 10^b.s / (b.m * 10^a.s)
        let numerator = a
            .mantissa
            .checked_mul(pow10(b.scale + precision)?)
            .ok_or(NumericError::Overflow)?;
        let denominator = b
            .mantissa
            .checked_mul(pow10(a.scale)?)
            .ok_or(NumericError::Overflow)?;
        Self::new(numerator / denominator, precision)
    }

    /// Integer part, fractional digits dropped.
    pub fn truncate(&self) -> Result<U256, NumericError> {
        Ok(self.mantissa / pow10(self.scale)?)
    }

    /// Nearest integer, rounding up iff the first fractional digit is 5 or more.
    pub fn round_half_up(&self) -> Result<U256, NumericError> {
        if self.scale == 0 {
            return Ok(self.mantissa);
        }
        let unit = pow10(self.scale)?;
        let int = self.mantissa / unit;
        let first_digit = (self.mantissa % unit) / pow10(self.scale - 1)?;
        if first_digit >= U256::from(5u8) {
            int.checked_add(U256::from(1u8)).ok_or(NumericError::Overflow)
        } else {
            Ok(int)
        }
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            f.write_str(int)
        } else {
            write!(f, "{int}.{frac}")
        }
    }
}

impl FromStr for FixedDecimal {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Round a decimal string to the nearest integer string, half up.
pub fn round(value: &str) -> Result<String, NumericError> {
    Ok(FixedDecimal::parse(value)?.round_half_up()?.to_string())
}

/// `round(amount * (numerator / denominator))`, the ratio truncated to
/// `precision` fractional digits first.
pub fn scale_by_ratio(
    amount: U256,
    numerator: U256,
    denominator: U256,
    precision: u32,
) -> Result<U256, NumericError> {
    let ratio = FixedDecimal::div(
        &FixedDecimal::from_integer(numerator),
        &FixedDecimal::from_integer(denominator),
        precision,
    )?;
    FixedDecimal::from_integer(amount).mul(&ratio)?.round_half_up()
}
