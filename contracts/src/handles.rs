//! Typed contract handles.
//!
//! A handle is an address bound to one provider. Reads go through the
//! provider; writes are returned as calldata for the transaction builder to
//! sign and send. `connect` rebinds the same contract to another provider,
//! which is how reads are raced across endpoints.

use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::{Log, TransactionReceipt};
use alloy::sol_types::SolCall;
use std::sync::Arc;

use crate::error::ContractError;
use crate::interfaces::{IMasonry, IRewardPool, ITreasury, IUniswapV2Pair, IUniswapV2Router, IERC20};
use crate::provider::Provider;

/// Anything that can be rebound to another provider.
pub trait Handle: Clone + Send + Sync {
    fn connect(&self, provider: Arc<dyn Provider>) -> Self;
}

#[derive(Clone)]
pub struct Contract {
    address: Address,
    provider: Arc<dyn Provider>,
}

impl Contract {
    pub fn new(address: Address, provider: Arc<dyn Provider>) -> Self {
        Self { address, provider }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `eth_call` one view function and decode its return values.
    pub async fn call<C: SolCall>(&self, call: C) -> Result<C::Return, ContractError> {
        let data = self
            .provider
            .call(self.address, Bytes::from(call.abi_encode()))
            .await?;
        C::abi_decode_returns(&data, true)
            .map_err(|e| ContractError::Abi(format!("{}: {e}", C::SIGNATURE)))
    }
}

impl Handle for Contract {
    fn connect(&self, provider: Arc<dyn Provider>) -> Self {
        Self::new(self.address, provider)
    }
}

macro_rules! handle {
    ($name:ident) => {
        #[derive(Clone)]
        pub struct $name(Contract);

        impl $name {
            pub fn new(contract: Contract) -> Self {
                Self(contract)
            }

            pub fn at(address: Address, provider: Arc<dyn Provider>) -> Self {
                Self(Contract::new(address, provider))
            }

            pub fn address(&self) -> Address {
                self.0.address()
            }
        }

        impl Handle for $name {
            fn connect(&self, provider: Arc<dyn Provider>) -> Self {
                Self(self.0.connect(provider))
            }
        }
    };
}

handle!(Erc20);
handle!(UniswapV2Pair);
handle!(UniswapV2Router);
handle!(Masonry);
handle!(Treasury);
handle!(RewardPool);

fn calldata(call: impl SolCall) -> Bytes {
    Bytes::from(call.abi_encode())
}

impl Erc20 {
    pub async fn balance_of(&self, owner: Address) -> Result<U256, ContractError> {
        Ok(self.0.call(IERC20::balanceOfCall { owner }).await?.balance)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ContractError> {
        Ok(self
            .0
            .call(IERC20::allowanceCall { owner, spender })
            .await?
            .remaining)
    }

    pub async fn total_supply(&self) -> Result<U256, ContractError> {
        Ok(self.0.call(IERC20::totalSupplyCall {}).await?.supply)
    }

    pub fn approve_data(spender: Address, amount: U256) -> Bytes {
        calldata(IERC20::approveCall { spender, amount })
    }
}

impl UniswapV2Pair {
    pub fn as_erc20(&self) -> Erc20 {
        Erc20(self.0.clone())
    }

    /// `(reserve0, reserve1)`; the block timestamp is ignored.
    pub async fn get_reserves(&self) -> Result<(U256, U256), ContractError> {
        let reserves = self.0.call(IUniswapV2Pair::getReservesCall {}).await?;
        Ok((U256::from(reserves.reserve0), U256::from(reserves.reserve1)))
    }

    pub async fn token0(&self) -> Result<Address, ContractError> {
        Ok(self.0.call(IUniswapV2Pair::token0Call {}).await?.token)
    }

    pub async fn token1(&self) -> Result<Address, ContractError> {
        Ok(self.0.call(IUniswapV2Pair::token1Call {}).await?.token)
    }
}

impl UniswapV2Router {
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity_data(
        token_a: Address,
        token_b: Address,
        amount_a_desired: U256,
        amount_b_desired: U256,
        amount_a_min: U256,
        amount_b_min: U256,
        to: Address,
        deadline: U256,
    ) -> Bytes {
        calldata(IUniswapV2Router::addLiquidityCall {
            tokenA: token_a,
            tokenB: token_b,
            amountADesired: amount_a_desired,
            amountBDesired: amount_b_desired,
            amountAMin: amount_a_min,
            amountBMin: amount_b_min,
            to,
            deadline,
        })
    }

    /// The native amount itself travels as the transaction value.
    pub fn add_liquidity_eth_data(
        token: Address,
        amount_token_desired: U256,
        amount_token_min: U256,
        amount_eth_min: U256,
        to: Address,
        deadline: U256,
    ) -> Bytes {
        calldata(IUniswapV2Router::addLiquidityETHCall {
            token,
            amountTokenDesired: amount_token_desired,
            amountTokenMin: amount_token_min,
            amountETHMin: amount_eth_min,
            to,
            deadline,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity_data(
        token_a: Address,
        token_b: Address,
        liquidity: U256,
        amount_a_min: U256,
        amount_b_min: U256,
        to: Address,
        deadline: U256,
    ) -> Bytes {
        calldata(IUniswapV2Router::removeLiquidityCall {
            tokenA: token_a,
            tokenB: token_b,
            liquidity,
            amountAMin: amount_a_min,
            amountBMin: amount_b_min,
            to,
            deadline,
        })
    }

    pub fn remove_liquidity_eth_data(
        token: Address,
        liquidity: U256,
        amount_token_min: U256,
        amount_eth_min: U256,
        to: Address,
        deadline: U256,
    ) -> Bytes {
        calldata(IUniswapV2Router::removeLiquidityETHCall {
            token,
            liquidity,
            amountTokenMin: amount_token_min,
            amountETHMin: amount_eth_min,
            to,
            deadline,
        })
    }
}

impl Masonry {
    pub async fn balance_of(&self, mason: Address) -> Result<U256, ContractError> {
        Ok(self.0.call(IMasonry::balanceOfCall { mason }).await?.balance)
    }

    pub async fn earned(&self, mason: Address) -> Result<U256, ContractError> {
        Ok(self.0.call(IMasonry::earnedCall { mason }).await?.reward)
    }

    pub async fn can_withdraw(&self, mason: Address) -> Result<bool, ContractError> {
        Ok(self.0.call(IMasonry::canWithdrawCall { mason }).await?.allowed)
    }

    pub async fn can_claim_reward(&self, mason: Address) -> Result<bool, ContractError> {
        Ok(self.0.call(IMasonry::canClaimRewardCall { mason }).await?.allowed)
    }

    pub async fn epoch(&self) -> Result<U256, ContractError> {
        Ok(self.0.call(IMasonry::epochCall {}).await?.current)
    }

    pub async fn next_epoch_point(&self) -> Result<U256, ContractError> {
        Ok(self.0.call(IMasonry::nextEpochPointCall {}).await?.point)
    }

    pub async fn epoch_timer_start(&self, mason: Address) -> Result<U256, ContractError> {
        Ok(self.0.call(IMasonry::masonsCall { mason }).await?.epochTimerStart)
    }

    pub async fn withdraw_lockup_epochs(&self) -> Result<U256, ContractError> {
        Ok(self.0.call(IMasonry::withdrawLockupEpochsCall {}).await?.epochs)
    }

    pub async fn reward_lockup_epochs(&self) -> Result<U256, ContractError> {
        Ok(self.0.call(IMasonry::rewardLockupEpochsCall {}).await?.epochs)
    }

    pub fn stake_data(amount: U256) -> Bytes {
        calldata(IMasonry::stakeCall { amount })
    }

    pub fn withdraw_data(amount: U256) -> Bytes {
        calldata(IMasonry::withdrawCall { amount })
    }

    pub fn claim_reward_data() -> Bytes {
        calldata(IMasonry::claimRewardCall {})
    }
}

impl Treasury {
    /// Epoch length in seconds.
    pub async fn period(&self) -> Result<U256, ContractError> {
        Ok(self.0.call(ITreasury::PERIODCall {}).await?.period)
    }
}

impl RewardPool {
    /// Deposited LP amount from `userInfo(pid, user)`.
    pub async fn staked_amount(&self, pool_id: u64, user: Address) -> Result<U256, ContractError> {
        let info = self
            .0
            .call(IRewardPool::userInfoCall {
                pid: U256::from(pool_id),
                user,
            })
            .await?;
        Ok(info.amount)
    }

    pub async fn pending_share(&self, pool_id: u64, user: Address) -> Result<U256, ContractError> {
        let share = self
            .0
            .call(IRewardPool::pendingShareCall {
                pid: U256::from(pool_id),
                user,
            })
            .await?;
        Ok(share.pending)
    }

    pub fn deposit_data(pool_id: u64, amount: U256) -> Bytes {
        calldata(IRewardPool::depositCall {
            pid: U256::from(pool_id),
            amount,
        })
    }

    /// Withdrawing zero claims the pending reward only.
    pub fn withdraw_data(pool_id: u64, amount: U256) -> Bytes {
        calldata(IRewardPool::withdrawCall {
            pid: U256::from(pool_id),
            amount,
        })
    }
}

/// LP tokens minted by an `addLiquidity` receipt: the amount of the last
/// ERC-20 `Transfer` log.
pub fn minted_liquidity(receipt: &TransactionReceipt) -> Result<U256, ContractError> {
    last_transfer(receipt.inner.logs())
}

fn last_transfer(logs: &[Log]) -> Result<U256, ContractError> {
    logs.iter()
        .rev()
        .find_map(|log| log.log_decode::<IERC20::Transfer>().ok())
        .map(|transfer| transfer.inner.data.value)
        .ok_or_else(|| ContractError::Abi("receipt has no Transfer log".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{LogData, B256};
    use alloy::sol_types::SolEvent;

    fn transfer_log(amount: u64) -> Log {
        let event = IERC20::Transfer {
            from: Address::ZERO,
            to: Address::repeat_byte(0x11),
            value: U256::from(amount),
        };
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0xaa),
                data: event.encode_log_data(),
            },
            ..Log::default()
        }
    }

    fn other_log(topic: u8) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: Address::ZERO,
                data: LogData::new_unchecked(vec![B256::repeat_byte(topic)], Bytes::new()),
            },
            ..Log::default()
        }
    }

    #[test]
    fn minted_liquidity_reads_last_transfer() {
        let logs = vec![transfer_log(100), other_log(1), transfer_log(42), other_log(2)];
        assert_eq!(last_transfer(&logs).unwrap(), U256::from(42u8));
    }

    #[test]
    fn minted_liquidity_requires_transfer() {
        assert!(last_transfer(&[other_log(1)]).is_err());
    }

    #[test]
    fn claim_uses_zero_withdraw() {
        let data = RewardPool::withdraw_data(3, U256::ZERO);
        let call = IRewardPool::withdrawCall::abi_decode(&data, true).unwrap();
        assert_eq!(call.pid, U256::from(3u8));
        assert_eq!(call.amount, U256::ZERO);
        assert_eq!(&data[..4], &IRewardPool::withdrawCall::SELECTOR);
    }

    #[test]
    fn approve_selector_matches_erc20() {
        let data = Erc20::approve_data(Address::repeat_byte(0x22), U256::MAX);
        assert_eq!(&data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(data.len(), 4 + 64);
    }
}
