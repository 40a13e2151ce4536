//! Pieces shared by every policy's quote: the pipeline context, gas and
//! nonce bookkeeping, the allowance check, and the trailing fee allocation.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, Instrument};

use stake_contracts::{ContractError, Ecosystem, Erc20, SigningContext, TransactionReceipt};
use stake_transactions::{Merge, NonceCounter, Pipeline, SignerContext, TxBuilder, TxError};
use stake_types::{
    AllocationType, Approve, AssetRef, ChangeQuote, NativeAmount, QuoteAllocation, StakeError,
};
use stake_utils::{BigAccumulator, NumericError};

use crate::metadata::{MetadataCategory, TxMetadata, TxMetadataCache};
use crate::policy::StakePolicyInfo;
use crate::spans::approve_span;

pub const APPROVE_GAS_LIMIT: u64 = 50_000;
pub const ADD_LIQUIDITY_GAS_LIMIT: u64 = 450_000;
pub const REMOVE_LIQUIDITY_GAS_LIMIT: u64 = 500_000;
/// Reward-pool and masonry calls: deposit, stake, withdraw, claim.
pub const POOL_GAS_LIMIT: u64 = 240_000;

/// Values one step hands to the steps after it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineContext {
    /// LP tokens ready to deposit, set by the add-liquidity step.
    pub liquidity: Option<U256>,
}

impl PipelineContext {
    pub fn liquidity(&self) -> Result<U256, TxError> {
        self.liquidity.ok_or(TxError::MissingContext("liquidity"))
    }
}

impl Merge for PipelineContext {
    fn merge(&mut self, patch: Self) {
        if patch.liquidity.is_some() {
            self.liquidity = patch.liquidity;
        }
    }
}

/// What a step needs besides the signer: chain access and somewhere to
/// write accounting notes.
#[derive(Clone)]
pub(crate) struct StepEnv {
    pub eco: Ecosystem,
    metadata: Arc<TxMetadataCache>,
    name: &'static str,
    parent_currency_code: String,
}

impl StepEnv {
    pub fn new(
        eco: Ecosystem,
        metadata: Arc<TxMetadataCache>,
        name: &'static str,
        info: &StakePolicyInfo,
    ) -> Self {
        Self {
            eco,
            metadata,
            name,
            parent_currency_code: info.parent_currency_code.clone(),
        }
    }

    pub fn note(&self, hash: B256, currency_code: &str, category: MetadataCategory, notes: &str) {
        self.metadata
            .record(hash, currency_code, TxMetadata::new(self.name, category, notes));
    }

    /// The network fee paid in the parent currency.
    pub fn note_fee(&self, hash: B256, notes: &str) {
        self.note(hash, &self.parent_currency_code, MetadataCategory::ExpenseFees, notes);
    }
}

/// A pipeline under construction plus the gas it has reserved so far.
pub(crate) struct Workflow {
    pub builder: TxBuilder<SignerContext, PipelineContext>,
    gas: BigAccumulator,
    gas_price: U256,
    nonces: NonceCounter,
}

impl Workflow {
    /// Read the current gas price and the account's pending nonce.
    pub async fn start(eco: &Ecosystem, account: Address) -> Result<Self, StakeError> {
        let (gas_price, nonce) = futures::try_join!(
            eco.multipass(|p| async move { p.gas_price().await }),
            eco.multipass(|p| async move { p.transaction_count(account).await }),
        )?;
        debug!(gas_price = %gas_price, nonce, "starting transaction pipeline");
        Ok(Self {
            builder: TxBuilder::new(),
            gas: BigAccumulator::new(),
            gas_price,
            nonces: NonceCounter::new(nonce),
        })
    }

    /// Reserve a step's gas limit and return it for the step to capture.
    pub fn reserve_gas(&mut self, gas_limit: u64) -> U256 {
        self.gas.add(U256::from(gas_limit))
    }

    pub fn network_fee(&self) -> Result<U256, StakeError> {
        self.gas
            .total()
            .checked_mul(self.gas_price)
            .ok_or_else(|| NumericError::Overflow.into())
    }

    /// Append the fee allocation and wrap the pipeline into a quote.
    pub fn into_quote(
        self,
        info: &StakePolicyInfo,
        mut allocations: Vec<QuoteAllocation>,
        eco: Ecosystem,
        wallet: Arc<dyn SigningContext>,
    ) -> Result<ChangeQuote, StakeError> {
        let fee = self.network_fee()?;
        allocations.push(allocation(
            AllocationType::Fee,
            &info.native_asset(),
            NativeAmount::new(fee),
        ));
        let pipeline = Pipeline::new(self.builder, eco, wallet, self.nonces, self.gas_price);
        debug!(steps = ?pipeline.step_names(), fee = %fee, "transaction pipeline built");
        Ok(ChangeQuote::new(
            allocations,
            Arc::new(PolicyApprover {
                stake_policy_id: info.stake_policy_id.clone(),
                pipeline,
            }),
        ))
    }
}

struct PolicyApprover {
    stake_policy_id: String,
    pipeline: Pipeline<PipelineContext>,
}

#[async_trait]
impl Approve for PolicyApprover {
    async fn approve(&self) -> Result<(), StakeError> {
        self.pipeline
            .execute()
            .instrument(approve_span(&self.stake_policy_id))
            .await
            .map(|_| ())
    }
}

pub(crate) fn allocation(
    allocation_type: AllocationType,
    asset: &AssetRef,
    native_amount: NativeAmount,
) -> QuoteAllocation {
    QuoteAllocation {
        allocation_type,
        plugin_id: asset.plugin_id.clone(),
        token_id: asset.token_id.clone(),
        currency_code: asset.currency_code.clone(),
        native_amount,
    }
}

/// The ERC-20 contract behind a token asset.
pub(crate) fn token_contract(eco: &Ecosystem, asset: &AssetRef) -> Result<Erc20, StakeError> {
    let token_id = asset.token_id.as_deref().ok_or_else(|| {
        StakeError::Unsupported(format!("{} has no token contract", asset.currency_code))
    })?;
    Ok(Erc20::new(eco.make_contract(token_id)?))
}

/// Wallet balance of `asset`: the account balance for the native asset,
/// `balanceOf` otherwise.
pub(crate) async fn wallet_balance(
    eco: &Ecosystem,
    asset: &AssetRef,
    token: &Erc20,
    account: Address,
) -> Result<U256, ContractError> {
    if asset.is_native() {
        eco.multipass(|p| async move { p.get_balance(account).await })
            .await
    } else {
        eco.read(token, |t| async move { t.balance_of(account).await })
            .await
    }
}

/// Approve `spender` for `MAX_UINT256` unless the current allowance already
/// covers `amount`. Returns the receipt when an approval was sent.
pub(crate) async fn ensure_allowance(
    eco: &Ecosystem,
    signer: &SignerContext,
    token: &Erc20,
    spender: Address,
    amount: U256,
    gas_limit: U256,
) -> Result<Option<TransactionReceipt>, TxError> {
    let owner = signer.address();
    let allowance = eco
        .read(token, |t| async move { t.allowance(owner, spender).await })
        .await?;
    if allowance >= amount {
        debug!(token = %token.address(), spender = %spender, "allowance already sufficient");
        return Ok(None);
    }
    let receipt = signer
        .send(
            token.address(),
            Erc20::approve_data(spender, U256::MAX),
            U256::ZERO,
            gas_limit,
        )
        .await?;
    Ok(Some(receipt))
}
