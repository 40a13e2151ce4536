//! Single-asset masonry: stake one token, earn another, with epoch lockups
//! on both withdrawing and claiming.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

use stake_contracts::{ContractError, Ecosystem, Erc20, Masonry, Treasury};
use stake_types::{
    AllocationType, AssetRef, ChangeQuote, NativeAmount, PositionAllocation,
    PositionAllocationType, QuoteAllocation, StakeAction, StakeError, StakePosition, Timestamp,
};
use crate::locktime::{epoch_unlock_time, EpochSchedule};
use crate::metadata::{MetadataCategory, TxMetadataCache};
use crate::policy::{
    ChangeQuoteRequest, PolicyOptions, StakePluginPolicy, StakePolicyInfo, StakePositionRequest,
};
use crate::workflow::{
    allocation, ensure_allowance, token_contract, StepEnv, Workflow, APPROVE_GAS_LIMIT,
    POOL_GAS_LIMIT,
};

const METADATA_NAME: &str = "Tomb Finance";

/// Which registry entries make up a masonry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasonryOptions {
    pub masonry: String,
    pub treasury: String,
    pub actions: PolicyOptions,
}

pub struct MasonryPolicy {
    eco: Ecosystem,
    masonry: Masonry,
    treasury: Treasury,
    actions: PolicyOptions,
    metadata: Arc<TxMetadataCache>,
}

/// Epoch-derived unlock instants for withdrawing and for claiming, `None`
/// once the lockup has elapsed on-chain.
struct Lockups {
    unstake: Option<Timestamp>,
    claim: Option<Timestamp>,
}

impl MasonryPolicy {
    pub fn new(
        eco: Ecosystem,
        options: MasonryOptions,
        metadata: Arc<TxMetadataCache>,
    ) -> Result<Self, StakeError> {
        let masonry = Masonry::new(eco.make_contract(&options.masonry)?);
        let treasury = Treasury::new(eco.make_contract(&options.treasury)?);
        Ok(Self {
            eco,
            masonry,
            treasury,
            actions: options.actions,
            metadata,
        })
    }

    fn assets<'a>(&self, info: &'a StakePolicyInfo) -> Result<(&'a AssetRef, &'a AssetRef), StakeError> {
        let [stake_asset] = info.stake_assets.as_slice() else {
            return Err(StakeError::Unsupported(
                "multi-asset staking is not supported".into(),
            ));
        };
        let reward_asset = info
            .reward_assets
            .first()
            .ok_or_else(|| StakeError::Config(format!("{} has no reward asset", info.stake_policy_id)))?;
        Ok((stake_asset, reward_asset))
    }

    async fn staked(&self, account: Address) -> Result<U256, ContractError> {
        self.eco
            .read(&self.masonry, |m| async move { m.balance_of(account).await })
            .await
    }

    async fn earned(&self, account: Address) -> Result<U256, ContractError> {
        self.eco
            .read(&self.masonry, |m| async move { m.earned(account).await })
            .await
    }

    async fn token_balance(&self, token: &Erc20, account: Address) -> Result<U256, ContractError> {
        self.eco
            .read(token, |t| async move { t.balance_of(account).await })
            .await
    }

    /// The on-chain guard for `action`, if it has one.
    async fn guard(&self, action: StakeAction, account: Address) -> Result<bool, ContractError> {
        match action {
            StakeAction::Stake => Ok(true),
            StakeAction::Unstake => {
                self.eco
                    .read(&self.masonry, |m| async move { m.can_withdraw(account).await })
                    .await
            }
            StakeAction::Claim => {
                self.eco
                    .read(&self.masonry, |m| async move { m.can_claim_reward(account).await })
                    .await
            }
        }
    }

    async fn lockups(&self, account: Address) -> Result<Lockups, ContractError> {
        let eco = &self.eco;
        let (epoch, next_epoch_point, timer_start, period, withdraw_lockup, reward_lockup) = futures::try_join!(
            eco.read(&self.masonry, |m| async move { m.epoch().await }),
            eco.read(&self.masonry, |m| async move { m.next_epoch_point().await }),
            eco.read(&self.masonry, |m| async move { m.epoch_timer_start(account).await }),
            eco.read(&self.treasury, |t| async move { t.period().await }),
            eco.read(&self.masonry, |m| async move { m.withdraw_lockup_epochs().await }),
            eco.read(&self.masonry, |m| async move { m.reward_lockup_epochs().await }),
        )?;
        let schedule = EpochSchedule {
            current_epoch: epoch,
            next_epoch_point: Timestamp::new(next_epoch_point.saturating_to()),
            period_secs: period.saturating_to(),
            timer_start,
        };
        Ok(Lockups {
            unstake: epoch_unlock_time(&schedule, withdraw_lockup),
            claim: epoch_unlock_time(&schedule, reward_lockup),
        })
    }

    async fn check_balance(
        &self,
        allocation: &QuoteAllocation,
        token: &Erc20,
        account: Address,
    ) -> Result<(), StakeError> {
        let available = match allocation.allocation_type {
            AllocationType::Stake => self.token_balance(token, account).await?,
            AllocationType::Unstake => self.staked(account).await?,
            AllocationType::Claim => self.earned(account).await?,
            AllocationType::Fee => return Ok(()),
        };
        if allocation.native_amount.raw() > available {
            return Err(StakeError::insufficient(&allocation.currency_code));
        }
        Ok(())
    }
}

#[async_trait]
impl StakePluginPolicy for MasonryPolicy {
    async fn fetch_change_quote(
        &self,
        info: &StakePolicyInfo,
        request: ChangeQuoteRequest,
    ) -> Result<ChangeQuote, StakeError> {
        let action = request.action;
        self.actions.check(action, &info.stake_policy_id)?;
        let (stake_asset, reward_asset) = self.assets(info)?;
        let token = token_contract(&self.eco, stake_asset)?;
        let account = request.wallet.address();

        let mut allocations = Vec::new();
        if matches!(action, StakeAction::Stake | StakeAction::Unstake) {
            if stake_asset.currency_code != request.currency_code {
                return Err(StakeError::Unsupported(format!(
                    "requested token '{}' to {action} not found in policy",
                    request.currency_code
                )));
            }
            let allocation_type = if action == StakeAction::Stake {
                AllocationType::Stake
            } else {
                AllocationType::Unstake
            };
            allocations.push(allocation(allocation_type, stake_asset, request.native_amount));
        }
        if matches!(action, StakeAction::Claim | StakeAction::Unstake) {
            let earned = self.earned(account).await?;
            allocations.push(allocation(
                AllocationType::Claim,
                reward_asset,
                NativeAmount::new(earned),
            ));
        }

        if !self.guard(action, account).await? {
            return Err(StakeError::PermissionDenied(format!(
                "Cannot {action} for token '{}'",
                request.currency_code
            )));
        }

        try_join_all(
            allocations
                .iter()
                .map(|a| self.check_balance(a, &token, account)),
        )
        .await?;

        let mut workflow = Workflow::start(&self.eco, account).await?;
        let env = StepEnv::new(self.eco.clone(), self.metadata.clone(), METADATA_NAME, info);
        let masonry = self.masonry.address();
        let amount = request.native_amount.raw();
        let stake_code = stake_asset.currency_code.clone();
        let reward_code = reward_asset.currency_code.clone();

        match action {
            StakeAction::Stake => {
                let gas_limit = workflow.reserve_gas(APPROVE_GAS_LIMIT);
                let step_env = env.clone();
                workflow
                    .builder
                    .build("approvePoolContract", move |signer, _| {
                        let env = step_env.clone();
                        let token = token.clone();
                        async move {
                            if let Some(receipt) =
                                ensure_allowance(&env.eco, &signer, &token, masonry, amount, gas_limit)
                                    .await?
                            {
                                env.note_fee(
                                    receipt.transaction_hash,
                                    "Approve staking rewards pool contract",
                                );
                            }
                            Ok(None)
                        }
                    });

                let gas_limit = workflow.reserve_gas(POOL_GAS_LIMIT);
                workflow.builder.build("stake", move |signer, _| {
                    let env = env.clone();
                    let stake_code = stake_code.clone();
                    async move {
                        let receipt = signer
                            .send(masonry, Masonry::stake_data(amount), U256::ZERO, gas_limit)
                            .await?;
                        let hash = receipt.transaction_hash;
                        env.note_fee(hash, "Stake funds");
                        env.note(hash, &stake_code, MetadataCategory::TransferStaking, "Stake funds");
                        Ok(None)
                    }
                });
            }
            StakeAction::Unstake => {
                let gas_limit = workflow.reserve_gas(POOL_GAS_LIMIT);
                workflow.builder.build("withdraw", move |signer, _| {
                    let env = env.clone();
                    let stake_code = stake_code.clone();
                    let reward_code = reward_code.clone();
                    async move {
                        let receipt = signer
                            .send(masonry, Masonry::withdraw_data(amount), U256::ZERO, gas_limit)
                            .await?;
                        let hash = receipt.transaction_hash;
                        env.note_fee(hash, "Unstake funds");
                        env.note(hash, &stake_code, MetadataCategory::TransferStaking, "Unstake funds");
                        env.note(
                            hash,
                            &reward_code,
                            MetadataCategory::IncomeStaking,
                            "Reward for staked funds",
                        );
                        Ok(None)
                    }
                });
            }
            StakeAction::Claim => {
                let gas_limit = workflow.reserve_gas(POOL_GAS_LIMIT);
                workflow.builder.build("claimReward", move |signer, _| {
                    let env = env.clone();
                    let reward_code = reward_code.clone();
                    async move {
                        let receipt = signer
                            .send(masonry, Masonry::claim_reward_data(), U256::ZERO, gas_limit)
                            .await?;
                        let hash = receipt.transaction_hash;
                        env.note_fee(hash, "Claiming reward");
                        env.note(
                            hash,
                            &reward_code,
                            MetadataCategory::IncomeStaking,
                            "Reward for staked funds",
                        );
                        Ok(None)
                    }
                });
            }
        }

        workflow.into_quote(info, allocations, self.eco.clone(), request.wallet)
    }

    async fn fetch_stake_position(
        &self,
        info: &StakePolicyInfo,
        request: StakePositionRequest,
    ) -> Result<StakePosition, StakeError> {
        let (stake_asset, reward_asset) = self.assets(info)?;
        let token = token_contract(&self.eco, stake_asset)?;
        let account = request.wallet.address();

        let (staked, earned, wallet_balance, lockups) = futures::try_join!(
            self.staked(account),
            self.earned(account),
            self.token_balance(&token, account),
            self.lockups(account),
        )?;
        debug!(staked = %staked, earned = %earned, wallet = %wallet_balance, "masonry position read");

        let can_stake = !self.actions.disable_stake && !wallet_balance.is_zero();
        let can_unstake =
            !self.actions.disable_unstake && !staked.is_zero() && lockups.unstake.is_none();
        let can_claim = !self.actions.disable_claim && !earned.is_zero() && lockups.claim.is_none();

        Ok(StakePosition {
            allocations: vec![
                PositionAllocation {
                    plugin_id: stake_asset.plugin_id.clone(),
                    token_id: stake_asset.token_id.clone(),
                    currency_code: stake_asset.currency_code.clone(),
                    allocation_type: PositionAllocationType::Staked,
                    native_amount: NativeAmount::new(staked),
                    locktime: lockups.unstake,
                },
                PositionAllocation {
                    plugin_id: reward_asset.plugin_id.clone(),
                    token_id: reward_asset.token_id.clone(),
                    currency_code: reward_asset.currency_code.clone(),
                    allocation_type: PositionAllocationType::Earned,
                    native_amount: NativeAmount::new(earned),
                    locktime: lockups.claim,
                },
            ],
            can_stake,
            can_unstake,
            can_claim,
        })
    }
}
