//! Native (smallest-unit) token amounts.
//!
//! Amounts are arbitrary-precision integers backed by [`U256`], the width of
//! an EVM word. They serialize as base-10 strings so that no consumer ever
//! sees them as floating point.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::StakeError;

/// An on-chain amount in the asset's smallest unit (wei, for example).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeAmount(U256);

impl NativeAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn new(raw: U256) -> Self {
        Self(raw)
    }

    pub fn from_u128(raw: u128) -> Self {
        Self(U256::from(raw))
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
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

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl From<U256> for NativeAmount {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl From<NativeAmount> for U256 {
    fn from(amount: NativeAmount) -> Self {
        amount.0
    }
}

impl Add for NativeAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for NativeAmount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NativeAmount {
    type Err = StakeError;

    /// Parse a base-10 integer string. Signs, decimal points and hex are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StakeError::InvalidAmount(s.to_string()));
        }
        U256::from_str_radix(trimmed, 10)
            .map(Self)
            .map_err(|_| StakeError::InvalidAmount(s.to_string()))
    }
}

impl Serialize for NativeAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for NativeAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings() {
        let amount: NativeAmount = "1000000000000000000".parse().unwrap();
        assert_eq!(amount.raw(), U256::from(10u128.pow(18)));
    }

    #[test]
    fn rejects_non_integer_input() {
        assert!("1.5".parse::<NativeAmount>().is_err());
        assert!("-1".parse::<NativeAmount>().is_err());
        assert!("0x10".parse::<NativeAmount>().is_err());
        assert!("".parse::<NativeAmount>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let amount = NativeAmount::from_u128(42);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"42\"");
        let back: NativeAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let a = NativeAmount::from_u128(5);
        let b = NativeAmount::from_u128(9);
        assert_eq!(a.saturating_sub(b), NativeAmount::ZERO);
    }
}
