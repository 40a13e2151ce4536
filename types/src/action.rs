//! The closed set of stake actions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StakeError;

/// An action a caller can request a quote for.
///
/// Policies match on this exhaustively, so adding a variant forces every
/// policy to handle it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeAction {
    Stake,
    Unstake,
    Claim,
}

impl StakeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Unstake => "unstake",
            Self::Claim => "claim",
        }
    }
}

impl fmt::Display for StakeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StakeAction {
    type Err = StakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stake" => Ok(Self::Stake),
            "unstake" => Ok(Self::Unstake),
            "claim" => Ok(Self::Claim),
            other => Err(StakeError::Unsupported(format!("unknown action '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Stake".parse::<StakeAction>().unwrap(), StakeAction::Stake);
        assert_eq!("CLAIM".parse::<StakeAction>().unwrap(), StakeAction::Claim);
        assert!("swap".parse::<StakeAction>().is_err());
    }
}
