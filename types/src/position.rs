//! Stake positions.

use serde::{Deserialize, Serialize};

use crate::amount::NativeAmount;
use crate::time::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionAllocationType {
    Staked,
    Earned,
}

/// A balance held in a stake policy.
///
/// A present `locktime` means the amount cannot be acted on before that instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionAllocation {
    pub plugin_id: String,
    pub token_id: Option<String>,
    pub currency_code: String,
    pub allocation_type: PositionAllocationType,
    pub native_amount: NativeAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locktime: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakePosition {
    pub allocations: Vec<PositionAllocation>,
    pub can_stake: bool,
    pub can_unstake: bool,
    pub can_claim: bool,
}

impl StakePosition {
    pub fn staked(&self) -> impl Iterator<Item = &PositionAllocation> {
        self.allocations
            .iter()
            .filter(|a| a.allocation_type == PositionAllocationType::Staked)
    }

    pub fn earned(&self) -> impl Iterator<Item = &PositionAllocation> {
        self.allocations
            .iter()
            .filter(|a| a.allocation_type == PositionAllocationType::Earned)
    }
}

/// Wrapper returned by the plugin facade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeDetails {
    pub position: StakePosition,
}
