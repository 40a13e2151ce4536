//! Two-asset LP reward pools (Cemetery V2 over a Uniswap-V2 router).
//!
//! Staking pairs both assets into LP tokens and deposits those into the
//! reward pool; unstaking withdraws the LP tokens and removes the liquidity.
//! LP tokens already sitting in the wallet are reused before any new
//! liquidity is added or any stake is withdrawn.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

use stake_contracts::{
    minted_liquidity, ContractError, Ecosystem, Erc20, RewardPool, UniswapV2Pair, UniswapV2Router,
};
use stake_transactions::{SignerContext, TxError};
use stake_types::{
    AllocationType, AssetRef, ChangeQuote, NativeAmount, PositionAllocation,
    PositionAllocationType, StakeAction, StakeError, StakePosition,
};
use stake_utils::Clock;

use crate::lp_math::{
    expected_liquidity, lp_to_underlying, pair_amount, slippage_min, PairReserves,
    DEADLINE_OFFSET_SECS,
};
use crate::metadata::{MetadataCategory, TxMetadataCache};
use crate::policy::{
    ChangeQuoteRequest, PolicyOptions, StakePluginPolicy, StakePolicyInfo, StakePositionRequest,
};
use crate::workflow::{
    allocation, ensure_allowance, wallet_balance, PipelineContext, StepEnv, Workflow,
    ADD_LIQUIDITY_GAS_LIMIT, APPROVE_GAS_LIMIT, POOL_GAS_LIMIT, REMOVE_LIQUIDITY_GAS_LIMIT,
};

const METADATA_NAME: &str = "Tomb Finance";

/// Which registry entries make up one LP reward pool.
///
/// `token_a`/`token_b` name the pair's contracts in stake-asset order; a
/// native leg names the wrapped-native contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CemeteryOptions {
    pub pool_id: u64,
    pub lp_token: String,
    pub reward_pool: String,
    pub router: String,
    pub token_a: String,
    pub token_b: String,
    pub actions: PolicyOptions,
}

/// One side of the pair.
#[derive(Clone)]
struct Leg {
    asset: AssetRef,
    token: Erc20,
}

pub struct CemeteryPolicy {
    eco: Ecosystem,
    pool_id: u64,
    pair: UniswapV2Pair,
    pool: RewardPool,
    router: Address,
    token_a: Erc20,
    token_b: Erc20,
    actions: PolicyOptions,
    metadata: Arc<TxMetadataCache>,
    clock: Arc<dyn Clock>,
}

async fn read_reserves(eco: &Ecosystem, pair: &UniswapV2Pair) -> Result<PairReserves, ContractError> {
    let ((reserve0, reserve1), token0, token1, total_supply) = futures::try_join!(
        eco.read(pair, |p| async move { p.get_reserves().await }),
        eco.read(pair, |p| async move { p.token0().await }),
        eco.read(pair, |p| async move { p.token1().await }),
        eco.read(pair, |p| async move { p.as_erc20().total_supply().await }),
    )?;
    Ok(PairReserves {
        token0,
        token1,
        reserve0,
        reserve1,
        total_supply,
    })
}

fn reserve_for(reserves: &PairReserves, leg: &Leg) -> Result<U256, StakeError> {
    reserves.reserve_of(leg.token.address()).ok_or_else(|| {
        StakeError::Unsupported(format!(
            "could not find reserve amount in liquidity pool for {}",
            leg.asset.currency_code
        ))
    })
}

impl CemeteryPolicy {
    pub fn new(
        eco: Ecosystem,
        options: CemeteryOptions,
        metadata: Arc<TxMetadataCache>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StakeError> {
        let pair = UniswapV2Pair::new(eco.make_contract(&options.lp_token)?);
        let pool = RewardPool::new(eco.make_contract(&options.reward_pool)?);
        let router = UniswapV2Router::new(eco.make_contract(&options.router)?).address();
        let token_a = Erc20::new(eco.make_contract(&options.token_a)?);
        let token_b = Erc20::new(eco.make_contract(&options.token_b)?);
        Ok(Self {
            eco,
            pool_id: options.pool_id,
            pair,
            pool,
            router,
            token_a,
            token_b,
            actions: options.actions,
            metadata,
            clock,
        })
    }

    fn legs(&self, info: &StakePolicyInfo) -> Result<[Leg; 2], StakeError> {
        let [a, b] = info.stake_assets.as_slice() else {
            return Err(StakeError::Unsupported(format!(
                "staking {} assets is not supported, only pairs",
                info.stake_assets.len()
            )));
        };
        if a.is_native() && b.is_native() {
            return Err(StakeError::Unsupported(
                "stake plugin does not support two native assets".into(),
            ));
        }
        Ok([
            Leg {
                asset: a.clone(),
                token: self.token_a.clone(),
            },
            Leg {
                asset: b.clone(),
                token: self.token_b.clone(),
            },
        ])
    }

    async fn staked_lp(&self, account: Address) -> Result<U256, ContractError> {
        let pool_id = self.pool_id;
        self.eco
            .read(&self.pool, |p| async move { p.staked_amount(pool_id, account).await })
            .await
    }

    async fn pending_reward(&self, account: Address) -> Result<U256, ContractError> {
        let pool_id = self.pool_id;
        self.eco
            .read(&self.pool, |p| async move { p.pending_share(pool_id, account).await })
            .await
    }

    async fn lp_balance(&self, account: Address) -> Result<U256, ContractError> {
        self.eco
            .read(&self.pair, |p| async move { p.as_erc20().balance_of(account).await })
            .await
    }

    /// Stake only: each leg's wallet balance plus what the wallet's loose LP
    /// tokens would unwind to must cover the allocation.
    async fn check_stake_balances(
        &self,
        legs: &[Leg; 2],
        amounts: &[U256; 2],
        reserves: &PairReserves,
        account: Address,
    ) -> Result<(), StakeError> {
        let lp_balance = self.lp_balance(account).await?;
        let checks = legs.iter().zip(amounts).map(move |(leg, &amount)| async move {
            let reserve = reserve_for(reserves, leg)?;
            let from_lp = lp_to_underlying(lp_balance, reserve, reserves.total_supply)?;
            let balance = wallet_balance(&self.eco, &leg.asset, &leg.token, account).await?;
            if balance.saturating_add(from_lp) < amount {
                return Err(StakeError::insufficient(&leg.asset.currency_code));
            }
            Ok::<(), StakeError>(())
        });
        try_join_all(checks).await?;
        Ok(())
    }
}

/// Everything the pipeline steps of one quote share.
struct LiquidityPlan {
    env: StepEnv,
    clock: Arc<dyn Clock>,
    pool_id: u64,
    pair: UniswapV2Pair,
    pool: Address,
    router: Address,
    legs: [Leg; 2],
    /// Allocation amounts, in leg order.
    amounts: [U256; 2],
    lp_name: String,
    reward_codes: Vec<String>,
}

impl LiquidityPlan {
    fn native_index(&self) -> Option<usize> {
        self.legs.iter().position(|leg| leg.asset.is_native())
    }

    fn deadline(&self) -> U256 {
        U256::from(self.clock.now().plus_secs(DEADLINE_OFFSET_SECS).as_secs())
    }

    async fn lp_balance(&self, account: Address) -> Result<U256, ContractError> {
        self.env
            .eco
            .read(&self.pair, |p| async move { p.as_erc20().balance_of(account).await })
            .await
    }

    fn note_pair(&self, hash: B256, notes: &str) {
        for leg in &self.legs {
            self.env
                .note(hash, &leg.asset.currency_code, MetadataCategory::TransferStaking, notes);
        }
    }

    fn note_rewards(&self, hash: B256) {
        let notes = format!("Claimed rewards from {}", self.lp_name);
        for code in &self.reward_codes {
            self.env.note(hash, code, MetadataCategory::IncomeStaking, &notes);
        }
    }

    async fn approve_router(&self, signer: &SignerContext, leg: usize, gas_limit: U256) -> Result<(), TxError> {
        let token = &self.legs[leg].token;
        let amount = self.amounts[leg];
        if let Some(receipt) =
            ensure_allowance(&self.env.eco, signer, token, self.router, amount, gas_limit).await?
        {
            self.env.note_fee(
                receipt.transaction_hash,
                &format!("Approve {} liquidity pool contract", self.lp_name),
            );
        }
        Ok(())
    }

    /// Top the wallet's LP balance up to what the allocations are worth.
    async fn add_liquidity(
        &self,
        signer: &SignerContext,
        gas_limit: U256,
    ) -> Result<Option<PipelineContext>, TxError> {
        let account = signer.address();
        let (reserves, lp_balance) = futures::try_join!(
            read_reserves(&self.env.eco, &self.pair),
            self.lp_balance(account),
        )?;
        let reserve_of = |leg: &Leg| {
            reserves.reserve_of(leg.token.address()).ok_or_else(|| {
                TxError::Other(format!("{} is not in the pair", leg.asset.currency_code))
            })
        };
        let reserve_a = reserve_of(&self.legs[0])?;
        let reserve_b = reserve_of(&self.legs[1])?;
        let expected = expected_liquidity(self.amounts[0], reserve_a, reserves.total_supply)?;

        if lp_balance >= expected {
            debug!(lp_balance = %lp_balance, expected = %expected, "wallet already holds the liquidity");
            return Ok(Some(PipelineContext {
                liquidity: Some(expected),
            }));
        }

        let missing = expected - lp_balance;
        let desired = [
            lp_to_underlying(missing, reserve_a, reserves.total_supply)?,
            lp_to_underlying(missing, reserve_b, reserves.total_supply)?,
        ];
        let minimum = [slippage_min(desired[0])?, slippage_min(desired[1])?];
        let deadline = self.deadline();

        let (data, value) = match self.native_index() {
            Some(native) => {
                let token = 1 - native;
                (
                    UniswapV2Router::add_liquidity_eth_data(
                        self.legs[token].token.address(),
                        desired[token],
                        minimum[token],
                        minimum[native],
                        account,
                        deadline,
                    ),
                    desired[native],
                )
            }
            None => (
                UniswapV2Router::add_liquidity_data(
                    self.legs[0].token.address(),
                    self.legs[1].token.address(),
                    desired[0],
                    desired[1],
                    minimum[0],
                    minimum[1],
                    account,
                    deadline,
                ),
                U256::ZERO,
            ),
        };

        let receipt = signer.send(self.router, data, value, gas_limit).await?;
        let notes = format!("Provide liquidity for {} - LP", self.lp_name);
        self.env.note_fee(receipt.transaction_hash, &notes);
        self.note_pair(receipt.transaction_hash, &notes);

        let minted = minted_liquidity(&receipt)?;
        info!(minted = %minted, reused = %lp_balance, "liquidity added");
        Ok(Some(PipelineContext {
            liquidity: Some(minted.saturating_add(lp_balance)),
        }))
    }

    async fn approve_pool(
        &self,
        signer: &SignerContext,
        ctx: &PipelineContext,
        gas_limit: U256,
    ) -> Result<(), TxError> {
        let liquidity = ctx.liquidity()?;
        let lp = self.pair.as_erc20();
        if let Some(receipt) =
            ensure_allowance(&self.env.eco, signer, &lp, self.pool, liquidity, gas_limit).await?
        {
            self.env.note_fee(
                receipt.transaction_hash,
                &format!("Approve {} rewards pool contract", self.lp_name),
            );
        }
        Ok(())
    }

    async fn deposit(
        &self,
        signer: &SignerContext,
        ctx: &PipelineContext,
        gas_limit: U256,
    ) -> Result<(), TxError> {
        let liquidity = ctx.liquidity()?;
        let receipt = signer
            .send(
                self.pool,
                RewardPool::deposit_data(self.pool_id, liquidity),
                U256::ZERO,
                gas_limit,
            )
            .await?;
        self.env.note_fee(
            receipt.transaction_hash,
            &format!("Stake into {} reward pool", self.lp_name),
        );
        Ok(())
    }

    /// Withdraw only the part of `expected` the wallet's loose LP tokens
    /// do not already cover.
    async fn withdraw_shortfall(
        &self,
        signer: &SignerContext,
        expected: U256,
        gas_limit: U256,
    ) -> Result<(), TxError> {
        let lp_balance = self.lp_balance(signer.address()).await?;
        if lp_balance >= expected {
            debug!(lp_balance = %lp_balance, expected = %expected, "no stake to withdraw");
            return Ok(());
        }
        let receipt = signer
            .send(
                self.pool,
                RewardPool::withdraw_data(self.pool_id, expected - lp_balance),
                U256::ZERO,
                gas_limit,
            )
            .await?;
        self.note_rewards(receipt.transaction_hash);
        self.env.note_fee(
            receipt.transaction_hash,
            &format!("Unstake and claim rewards from {} reward pool", self.lp_name),
        );
        Ok(())
    }

    async fn approve_router_lp(
        &self,
        signer: &SignerContext,
        expected: U256,
        gas_limit: U256,
    ) -> Result<(), TxError> {
        let lp = self.pair.as_erc20();
        if let Some(receipt) =
            ensure_allowance(&self.env.eco, signer, &lp, self.router, expected, gas_limit).await?
        {
            self.env.note_fee(
                receipt.transaction_hash,
                &format!("Approve {} liquidity pool contract", self.lp_name),
            );
        }
        Ok(())
    }

    async fn remove_liquidity(
        &self,
        signer: &SignerContext,
        liquidity: U256,
        gas_limit: U256,
    ) -> Result<(), TxError> {
        let account = signer.address();
        let minimum = [slippage_min(self.amounts[0])?, slippage_min(self.amounts[1])?];
        let deadline = self.deadline();
        let data = match self.native_index() {
            Some(native) => {
                let token = 1 - native;
                UniswapV2Router::remove_liquidity_eth_data(
                    self.legs[token].token.address(),
                    liquidity,
                    minimum[token],
                    minimum[native],
                    account,
                    deadline,
                )
            }
            None => UniswapV2Router::remove_liquidity_data(
                self.legs[0].token.address(),
                self.legs[1].token.address(),
                liquidity,
                minimum[0],
                minimum[1],
                account,
                deadline,
            ),
        };
        let receipt = signer.send(self.router, data, U256::ZERO, gas_limit).await?;
        let notes = format!("Remove liquidity from {} - LP", self.lp_name);
        self.env.note_fee(receipt.transaction_hash, &notes);
        self.note_pair(receipt.transaction_hash, &notes);
        Ok(())
    }

    /// A zero withdraw pays out the whole pending reward.
    async fn claim(&self, signer: &SignerContext, gas_limit: U256) -> Result<(), TxError> {
        let receipt = signer
            .send(
                self.pool,
                RewardPool::withdraw_data(self.pool_id, U256::ZERO),
                U256::ZERO,
                gas_limit,
            )
            .await?;
        self.note_rewards(receipt.transaction_hash);
        self.env.note_fee(
            receipt.transaction_hash,
            &format!("Claimed rewards from {}", self.lp_name),
        );
        Ok(())
    }
}

#[async_trait]
impl StakePluginPolicy for CemeteryPolicy {
    async fn fetch_change_quote(
        &self,
        info: &StakePolicyInfo,
        request: ChangeQuoteRequest,
    ) -> Result<ChangeQuote, StakeError> {
        let action = request.action;
        self.actions.check(action, &info.stake_policy_id)?;
        if info.find_asset(&request.currency_code).is_none() {
            return Err(StakeError::Unsupported(format!(
                "asset '{}' not found in policy '{}'",
                request.currency_code, info.stake_policy_id
            )));
        }
        let legs = self.legs(info)?;
        let account = request.wallet.address();
        let lp_name = format!(
            "{} - {}",
            legs[0].asset.currency_code, legs[1].asset.currency_code
        );

        let mut allocations = Vec::new();
        let mut amounts = [U256::ZERO; 2];
        let mut reserves = None;
        if matches!(action, StakeAction::Stake | StakeAction::Unstake) {
            let snapshot = read_reserves(&self.eco, &self.pair).await?;
            let request_leg = legs
                .iter()
                .find(|leg| leg.asset.currency_code == request.currency_code)
                .ok_or_else(|| {
                    StakeError::Unsupported(format!(
                        "cannot {action} {} directly, only {lp_name}",
                        request.currency_code
                    ))
                })?;
            let request_reserve = reserve_for(&snapshot, request_leg)?;
            let allocation_type = if action == StakeAction::Stake {
                AllocationType::Stake
            } else {
                AllocationType::Unstake
            };
            for (i, leg) in legs.iter().enumerate() {
                amounts[i] = pair_amount(
                    request.native_amount.raw(),
                    request_reserve,
                    reserve_for(&snapshot, leg)?,
                )?;
                allocations.push(allocation(
                    allocation_type,
                    &leg.asset,
                    NativeAmount::new(amounts[i]),
                ));
            }
            reserves = Some(snapshot);
        }
        if matches!(action, StakeAction::Claim | StakeAction::Unstake) {
            let pending = self.pending_reward(account).await?;
            for asset in &info.reward_assets {
                allocations.push(allocation(
                    AllocationType::Claim,
                    asset,
                    NativeAmount::new(pending),
                ));
            }
        }

        let mut workflow = Workflow::start(&self.eco, account).await?;
        let plan = Arc::new(LiquidityPlan {
            env: StepEnv::new(self.eco.clone(), self.metadata.clone(), METADATA_NAME, info),
            clock: self.clock.clone(),
            pool_id: self.pool_id,
            pair: self.pair.clone(),
            pool: self.pool.address(),
            router: self.router,
            legs: legs.clone(),
            amounts,
            lp_name,
            reward_codes: info
                .reward_assets
                .iter()
                .map(|a| a.currency_code.clone())
                .collect(),
        });

        match (action, reserves) {
            (StakeAction::Stake, Some(reserves)) => {
                self.check_stake_balances(&legs, &amounts, &reserves, account)
                    .await?;

                for (index, leg) in legs.iter().enumerate() {
                    if leg.asset.is_native() {
                        continue;
                    }
                    let gas_limit = workflow.reserve_gas(APPROVE_GAS_LIMIT);
                    let plan = plan.clone();
                    workflow.builder.build("approveSwapRouter", move |signer, _| {
                        let plan = plan.clone();
                        async move {
                            plan.approve_router(&signer, index, gas_limit).await?;
                            Ok(None)
                        }
                    });
                }

                let gas_limit = workflow.reserve_gas(ADD_LIQUIDITY_GAS_LIMIT);
                let step_plan = plan.clone();
                workflow.builder.build("addLiquidity", move |signer, _| {
                    let plan = step_plan.clone();
                    async move { plan.add_liquidity(&signer, gas_limit).await }
                });

                let gas_limit = workflow.reserve_gas(APPROVE_GAS_LIMIT);
                let step_plan = plan.clone();
                workflow.builder.build("approveStakingPool", move |signer, ctx| {
                    let plan = step_plan.clone();
                    async move {
                        plan.approve_pool(&signer, &ctx, gas_limit).await?;
                        Ok(None)
                    }
                });

                let gas_limit = workflow.reserve_gas(POOL_GAS_LIMIT);
                workflow.builder.build("stakeLiquidity", move |signer, ctx| {
                    let plan = plan.clone();
                    async move {
                        plan.deposit(&signer, &ctx, gas_limit).await?;
                        Ok(None)
                    }
                });
            }
            (StakeAction::Unstake, Some(reserves)) => {
                let reserve_a = reserve_for(&reserves, &legs[0])?;
                let expected = expected_liquidity(amounts[0], reserve_a, reserves.total_supply)?;
                let (lp_balance, staked) =
                    futures::try_join!(self.lp_balance(account), self.staked_lp(account))?;
                if lp_balance.saturating_add(staked) < expected {
                    return Err(StakeError::insufficient(&legs[0].asset.currency_code));
                }

                let gas_limit = workflow.reserve_gas(POOL_GAS_LIMIT);
                let step_plan = plan.clone();
                workflow.builder.build("unstakeLiquidity", move |signer, _| {
                    let plan = step_plan.clone();
                    async move {
                        plan.withdraw_shortfall(&signer, expected, gas_limit).await?;
                        Ok(None)
                    }
                });

                let gas_limit = workflow.reserve_gas(APPROVE_GAS_LIMIT);
                let step_plan = plan.clone();
                workflow.builder.build("approveSwapRouter", move |signer, _| {
                    let plan = step_plan.clone();
                    async move {
                        plan.approve_router_lp(&signer, expected, gas_limit).await?;
                        Ok(None)
                    }
                });

                let gas_limit = workflow.reserve_gas(REMOVE_LIQUIDITY_GAS_LIMIT);
                workflow.builder.build("removeLiquidity", move |signer, _| {
                    let plan = plan.clone();
                    async move {
                        plan.remove_liquidity(&signer, expected, gas_limit).await?;
                        Ok(None)
                    }
                });
            }
            (StakeAction::Claim, _) => {
                let gas_limit = workflow.reserve_gas(POOL_GAS_LIMIT);
                workflow.builder.build("claimReward", move |signer, _| {
                    let plan = plan.clone();
                    async move {
                        plan.claim(&signer, gas_limit).await?;
                        Ok(None)
                    }
                });
            }
            (StakeAction::Stake | StakeAction::Unstake, None) => {
                return Err(StakeError::Other("pair reserves were not read".into()));
            }
        }

        workflow.into_quote(info, allocations, self.eco.clone(), request.wallet)
    }

    async fn fetch_stake_position(
        &self,
        info: &StakePolicyInfo,
        request: StakePositionRequest,
    ) -> Result<StakePosition, StakeError> {
        let legs = self.legs(info)?;
        let reward_asset = info.reward_assets.first().ok_or_else(|| {
            StakeError::Config(format!("{} has no reward asset", info.stake_policy_id))
        })?;
        let account = request.wallet.address();

        let (staked_lp, reward, balance_a, balance_b, lp_balance, reserves) = futures::try_join!(
            self.staked_lp(account),
            self.pending_reward(account),
            wallet_balance(&self.eco, &legs[0].asset, &legs[0].token, account),
            wallet_balance(&self.eco, &legs[1].asset, &legs[1].token, account),
            self.lp_balance(account),
            read_reserves(&self.eco, &self.pair),
        )?;
        debug!(staked_lp = %staked_lp, reward = %reward, lp_balance = %lp_balance, "cemetery position read");

        let mut allocations = Vec::with_capacity(legs.len() + 1);
        for leg in &legs {
            let amount = if staked_lp.is_zero() {
                U256::ZERO
            } else {
                lp_to_underlying(staked_lp, reserve_for(&reserves, leg)?, reserves.total_supply)?
            };
            allocations.push(PositionAllocation {
                plugin_id: leg.asset.plugin_id.clone(),
                token_id: leg.asset.token_id.clone(),
                currency_code: leg.asset.currency_code.clone(),
                allocation_type: PositionAllocationType::Staked,
                native_amount: NativeAmount::new(amount),
                locktime: None,
            });
        }
        allocations.push(PositionAllocation {
            plugin_id: reward_asset.plugin_id.clone(),
            token_id: reward_asset.token_id.clone(),
            currency_code: reward_asset.currency_code.clone(),
            allocation_type: PositionAllocationType::Earned,
            native_amount: NativeAmount::new(reward),
            locktime: None,
        });

        let can_stake = !self.actions.disable_stake
            && ((!balance_a.is_zero() && !balance_b.is_zero()) || !lp_balance.is_zero());
        let can_unstake = !self.actions.disable_unstake && !staked_lp.is_zero();
        let can_claim = !self.actions.disable_claim && !reward.is_zero();

        Ok(StakePosition {
            allocations,
            can_stake,
            can_unstake,
            can_claim,
        })
    }
}
