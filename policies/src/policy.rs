//! The policy port and the static description every policy carries.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use stake_contracts::SigningContext;
use stake_types::{
    AssetRef, ChangeQuote, NativeAmount, StakeAction, StakeError, StakePolicy, StakePosition,
    StakeProviderInfo,
};

/// Strategy object behind one or more stake policies.
#[async_trait]
pub trait StakePluginPolicy: Send + Sync {
    async fn fetch_change_quote(
        &self,
        info: &StakePolicyInfo,
        request: ChangeQuoteRequest,
    ) -> Result<ChangeQuote, StakeError>;

    async fn fetch_stake_position(
        &self,
        info: &StakePolicyInfo,
        request: StakePositionRequest,
    ) -> Result<StakePosition, StakeError>;
}

/// Per-policy switches for retired or paused actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyOptions {
    pub disable_stake: bool,
    pub disable_unstake: bool,
    pub disable_claim: bool,
}

impl PolicyOptions {
    pub fn is_disabled(&self, action: StakeAction) -> bool {
        match action {
            StakeAction::Stake => self.disable_stake,
            StakeAction::Unstake => self.disable_unstake,
            StakeAction::Claim => self.disable_claim,
        }
    }

    /// Fail with `Unsupported` when `action` is switched off.
    pub fn check(&self, action: StakeAction, stake_policy_id: &str) -> Result<(), StakeError> {
        if self.is_disabled(action) {
            return Err(StakeError::Unsupported(format!(
                "{action} is disabled for stake policy '{stake_policy_id}'"
            )));
        }
        Ok(())
    }
}

/// A policy as loaded at start-up. Never mutated afterwards.
#[derive(Clone)]
pub struct StakePolicyInfo {
    pub stake_policy_id: String,
    pub stake_provider_info: StakeProviderInfo,
    pub parent_plugin_id: String,
    pub parent_currency_code: String,
    pub stake_assets: Vec<AssetRef>,
    pub reward_assets: Vec<AssetRef>,
    pub policy: Arc<dyn StakePluginPolicy>,
}

impl StakePolicyInfo {
    /// Build a policy whose id is derived from its provider and assets.
    pub fn new(
        stake_provider_info: StakeProviderInfo,
        parent_plugin_id: impl Into<String>,
        parent_currency_code: impl Into<String>,
        stake_assets: Vec<AssetRef>,
        reward_assets: Vec<AssetRef>,
        policy: Arc<dyn StakePluginPolicy>,
    ) -> Result<Self, StakeError> {
        if stake_assets.is_empty() || reward_assets.is_empty() {
            return Err(StakeError::Config(format!(
                "stake policy for '{}' needs at least one stake and one reward asset",
                stake_provider_info.stake_provider_id
            )));
        }
        let stake_policy_id = derive_stake_policy_id(
            &stake_provider_info.stake_provider_id,
            &stake_assets,
            &reward_assets,
        );
        Ok(Self {
            stake_policy_id,
            stake_provider_info,
            parent_plugin_id: parent_plugin_id.into(),
            parent_currency_code: parent_currency_code.into(),
            stake_assets,
            reward_assets,
            policy,
        })
    }

    /// The fee asset: the parent chain's native currency.
    pub fn native_asset(&self) -> AssetRef {
        AssetRef::native(&self.parent_plugin_id, &self.parent_currency_code)
    }

    /// Find a stake or reward asset by currency code.
    pub fn find_asset(&self, currency_code: &str) -> Option<&AssetRef> {
        self.stake_assets
            .iter()
            .chain(self.reward_assets.iter())
            .find(|asset| asset.currency_code == currency_code)
    }

    pub fn to_public(&self) -> StakePolicy {
        StakePolicy {
            stake_policy_id: self.stake_policy_id.clone(),
            stake_provider_info: self.stake_provider_info.clone(),
            parent_plugin_id: self.parent_plugin_id.clone(),
            parent_currency_code: self.parent_currency_code.clone(),
            stake_assets: self.stake_assets.clone(),
            reward_assets: self.reward_assets.clone(),
        }
    }
}

impl fmt::Debug for StakePolicyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StakePolicyInfo")
            .field("stake_policy_id", &self.stake_policy_id)
            .field("stake_assets", &self.stake_assets)
            .field("reward_assets", &self.reward_assets)
            .finish_non_exhaustive()
    }
}

/// `"{provider}:{stake assets joined by +}={reward assets joined by +}"`.
pub fn derive_stake_policy_id(
    stake_provider_id: &str,
    stake_assets: &[AssetRef],
    reward_assets: &[AssetRef],
) -> String {
    let join = |assets: &[AssetRef]| {
        assets
            .iter()
            .map(AssetRef::to_string)
            .collect::<Vec<_>>()
            .join("+")
    };
    format!(
        "{stake_provider_id}:{}={}",
        join(stake_assets),
        join(reward_assets)
    )
}

#[derive(Clone)]
pub struct ChangeQuoteRequest {
    pub action: StakeAction,
    pub stake_policy_id: String,
    pub currency_code: String,
    pub token_id: Option<String>,
    pub native_amount: NativeAmount,
    pub wallet: Arc<dyn SigningContext>,
}

impl fmt::Debug for ChangeQuoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeQuoteRequest")
            .field("action", &self.action)
            .field("stake_policy_id", &self.stake_policy_id)
            .field("currency_code", &self.currency_code)
            .field("native_amount", &self.native_amount)
            .field("wallet", &self.wallet.address())
            .finish()
    }
}

#[derive(Clone)]
pub struct StakePositionRequest {
    pub stake_policy_id: String,
    pub wallet: Arc<dyn SigningContext>,
}

impl fmt::Debug for StakePositionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StakePositionRequest")
            .field("stake_policy_id", &self.stake_policy_id)
            .field("wallet", &self.wallet.address())
            .finish()
    }
}
