//! Public description of a stake policy.

use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;

/// Who operates the contracts behind a policy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeProviderInfo {
    pub display_name: String,
    pub plugin_id: String,
    pub stake_provider_id: String,
}

/// The caller-facing view of a policy, without its implementation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakePolicy {
    pub stake_policy_id: String,
    pub stake_provider_info: StakeProviderInfo,
    pub parent_plugin_id: String,
    pub parent_currency_code: String,
    pub stake_assets: Vec<AssetRef>,
    pub reward_assets: Vec<AssetRef>,
}
