//! Nullable chain: an in-memory EVM stand-in.
//!
//! Speaks just enough of the ERC-20, Uniswap-V2 pair and router, Tomb
//! masonry and treasury, and Cemetery reward-pool interfaces for the stake
//! policies to run end to end. Calldata is decoded with the same `sol!`
//! interfaces the contract handles encode with. Transactions execute
//! atomically against a draft of the state: a failing call leaves balances
//! untouched but still consumes the sender's nonce and yields a reverted
//! receipt, as a real chain would.

use alloy::primitives::{keccak256, Address, Bloom, Bytes, Log as EventLog, B256, U256};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::sol_types::abi::TokenSeq;
use alloy::sol_types::{SolCall, SolEvent, SolInterface, SolType, SolValue};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use stake_contracts::interfaces::{
    IMasonry::{self, IMasonryCalls},
    IRewardPool::{self, IRewardPoolCalls},
    ITreasury::ITreasuryCalls,
    IUniswapV2Pair::IUniswapV2PairCalls,
    IUniswapV2Router::{self, IUniswapV2RouterCalls},
    IERC20::{self, IERC20Calls},
};
use stake_contracts::ContractError;

/// Selector and signature of every state-changing call, for naming sent
/// transactions.
const METHODS: &[([u8; 4], &str)] = &[
    (IERC20::approveCall::SELECTOR, IERC20::approveCall::SIGNATURE),
    (IUniswapV2Router::addLiquidityCall::SELECTOR, IUniswapV2Router::addLiquidityCall::SIGNATURE),
    (IUniswapV2Router::addLiquidityETHCall::SELECTOR, IUniswapV2Router::addLiquidityETHCall::SIGNATURE),
    (IUniswapV2Router::removeLiquidityCall::SELECTOR, IUniswapV2Router::removeLiquidityCall::SIGNATURE),
    (IUniswapV2Router::removeLiquidityETHCall::SELECTOR, IUniswapV2Router::removeLiquidityETHCall::SIGNATURE),
    (IMasonry::stakeCall::SELECTOR, IMasonry::stakeCall::SIGNATURE),
    (IMasonry::withdrawCall::SELECTOR, IMasonry::withdrawCall::SIGNATURE),
    (IMasonry::claimRewardCall::SELECTOR, IMasonry::claimRewardCall::SIGNATURE),
    (IRewardPool::depositCall::SELECTOR, IRewardPool::depositCall::SIGNATURE),
    (IRewardPool::withdrawCall::SELECTOR, IRewardPool::withdrawCall::SIGNATURE),
];

fn method_name(data: &[u8]) -> &'static str {
    data.get(..4)
        .and_then(|selector| METHODS.iter().find(|(s, _)| s[..] == *selector))
        .and_then(|(_, signature)| signature.split('(').next())
        .unwrap_or("unknown")
}

fn decode<I: SolInterface>(data: &[u8]) -> ExecResult<I> {
    I::abi_decode(data, true).map_err(|e| e.to_string())
}

fn ret<T: SolValue>(value: T) -> Bytes {
    Bytes::from(value.abi_encode())
}

fn ret_tuple<T: SolValue>(values: T) -> Bytes
where
    for<'a> <T::SolType as SolType>::Token<'a>: TokenSeq<'a>,
{
    Bytes::from(values.abi_encode_params())
}

type ExecResult<T> = Result<T, String>;

#[derive(Debug, Clone, Default)]
struct TokenState {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
}

#[derive(Debug, Clone)]
struct PairState {
    token0: Address,
    token1: Address,
    reserve0: U256,
    reserve1: U256,
}

#[derive(Debug, Clone, Default)]
struct MasonryState {
    stake_token: Address,
    reward_token: Address,
    epoch: U256,
    next_epoch_point: U256,
    withdraw_lockup: U256,
    reward_lockup: U256,
    staked: HashMap<Address, U256>,
    earned: HashMap<Address, U256>,
    timer_start: HashMap<Address, U256>,
}

impl MasonryState {
    fn timer(&self, owner: &Address) -> U256 {
        self.timer_start.get(owner).copied().unwrap_or_default()
    }

    fn can_withdraw(&self, owner: &Address) -> bool {
        self.timer(owner).saturating_add(self.withdraw_lockup) <= self.epoch
    }

    fn can_claim(&self, owner: &Address) -> bool {
        self.timer(owner).saturating_add(self.reward_lockup) <= self.epoch
    }
}

#[derive(Debug, Clone, Default)]
struct RewardPoolState {
    reward_token: Address,
    lp_tokens: HashMap<u64, Address>,
    staked: HashMap<(u64, Address), U256>,
    pending: HashMap<(u64, Address), U256>,
}

/// A transaction as the chain received it.
#[derive(Debug, Clone, PartialEq)]
pub struct SentTransaction {
    pub from: Address,
    pub hash: B256,
    pub method: String,
    pub request: TransactionRequest,
    pub status: bool,
}

#[derive(Debug, Clone, Default)]
struct ChainState {
    native: HashMap<Address, U256>,
    tokens: HashMap<Address, TokenState>,
    pairs: HashMap<Address, PairState>,
    routers: HashMap<Address, Address>,
    masonries: HashMap<Address, MasonryState>,
    treasuries: HashMap<Address, U256>,
    reward_pools: HashMap<Address, RewardPoolState>,
    gas_price: U256,
    nonces: HashMap<Address, u64>,
    sent: Vec<SentTransaction>,
    receipts: HashMap<B256, TransactionReceipt>,
    reverting: HashSet<String>,
}

/// Shared handle to one in-memory chain. Clones see the same state.
#[derive(Debug, Clone, Default)]
pub struct NullChain {
    state: Arc<Mutex<ChainState>>,
}

impl NullChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── setup ───────────────────────────────────────────────────────────

    pub fn set_gas_price(&self, price: u64) {
        self.state().gas_price = U256::from(price);
    }

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        self.state().native.insert(owner, amount);
    }

    pub fn add_token(&self, token: Address) {
        self.state().tokens.entry(token).or_default();
    }

    pub fn mint(&self, token: Address, owner: Address, amount: U256) {
        self.state().mint(token, owner, amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state()
            .tokens
            .entry(token)
            .or_default()
            .allowances
            .insert((owner, spender), amount);
    }

    /// Register a pair holding the given reserves. `total_supply` LP tokens
    /// are minted to an outside holder so the wallet starts with none.
    pub fn add_pair(
        &self,
        pair: Address,
        (token0, reserve0): (Address, U256),
        (token1, reserve1): (Address, U256),
        total_supply: U256,
    ) {
        let mut state = self.state();
        state.mint(token0, pair, reserve0);
        state.mint(token1, pair, reserve1);
        state.mint(pair, Address::repeat_byte(0xee), total_supply);
        state.pairs.insert(
            pair,
            PairState {
                token0,
                token1,
                reserve0,
                reserve1,
            },
        );
    }

    pub fn add_router(&self, router: Address, wrapped_native: Address) {
        let mut state = self.state();
        state.tokens.entry(wrapped_native).or_default();
        state.routers.insert(router, wrapped_native);
    }

    pub fn add_masonry(&self, masonry: Address, stake_token: Address, reward_token: Address) {
        let mut state = self.state();
        state.tokens.entry(stake_token).or_default();
        state.tokens.entry(reward_token).or_default();
        state.masonries.insert(
            masonry,
            MasonryState {
                stake_token,
                reward_token,
                ..MasonryState::default()
            },
        );
    }

    pub fn set_masonry_epoch(
        &self,
        masonry: Address,
        epoch: u64,
        next_epoch_point: u64,
        withdraw_lockup: u64,
        reward_lockup: u64,
    ) {
        if let Some(m) = self.state().masonries.get_mut(&masonry) {
            m.epoch = U256::from(epoch);
            m.next_epoch_point = U256::from(next_epoch_point);
            m.withdraw_lockup = U256::from(withdraw_lockup);
            m.reward_lockup = U256::from(reward_lockup);
        }
    }

    /// Seat `owner` in the masonry with `staked` tokens since `timer_start`.
    pub fn set_masonry_stake(&self, masonry: Address, owner: Address, staked: U256, timer_start: u64) {
        let mut state = self.state();
        let Some(stake_token) = state.masonries.get(&masonry).map(|m| m.stake_token) else {
            return;
        };
        state.mint(stake_token, masonry, staked);
        if let Some(m) = state.masonries.get_mut(&masonry) {
            m.staked.insert(owner, staked);
            m.timer_start.insert(owner, U256::from(timer_start));
        }
    }

    pub fn set_masonry_earned(&self, masonry: Address, owner: Address, earned: U256) {
        if let Some(m) = self.state().masonries.get_mut(&masonry) {
            m.earned.insert(owner, earned);
        }
    }

    pub fn add_treasury(&self, treasury: Address, period_secs: u64) {
        self.state().treasuries.insert(treasury, U256::from(period_secs));
    }

    pub fn add_reward_pool(&self, pool: Address, reward_token: Address) {
        let mut state = self.state();
        state.tokens.entry(reward_token).or_default();
        state.reward_pools.insert(
            pool,
            RewardPoolState {
                reward_token,
                ..RewardPoolState::default()
            },
        );
    }

    pub fn add_pool(&self, pool: Address, pool_id: u64, lp_token: Address) {
        if let Some(p) = self.state().reward_pools.get_mut(&pool) {
            p.lp_tokens.insert(pool_id, lp_token);
        }
    }

    /// Deposit `amount` LP tokens for `user` without going through a transaction.
    pub fn set_pool_stake(&self, pool: Address, pool_id: u64, user: Address, amount: U256) {
        let mut state = self.state();
        let Some(lp) = state
            .reward_pools
            .get(&pool)
            .and_then(|p| p.lp_tokens.get(&pool_id).copied())
        else {
            return;
        };
        // Move the LP tokens out of the outside holder so supply is unchanged.
        let _ = state.transfer(lp, Address::repeat_byte(0xee), pool, amount);
        if let Some(p) = state.reward_pools.get_mut(&pool) {
            p.staked.insert((pool_id, user), amount);
        }
    }

    pub fn set_pending_reward(&self, pool: Address, pool_id: u64, user: Address, amount: U256) {
        if let Some(p) = self.state().reward_pools.get_mut(&pool) {
            p.pending.insert((pool_id, user), amount);
        }
    }

    /// Hand `amount` of the outside holder's LP tokens to `owner`.
    pub fn give_lp(&self, pair: Address, owner: Address, amount: U256) {
        let _ = self
            .state()
            .transfer(pair, Address::repeat_byte(0xee), owner, amount);
    }

    /// Make every transaction calling `method` (e.g. `"deposit"`) revert.
    pub fn revert_method(&self, method: &str) {
        self.state().reverting.insert(method.to_string());
    }

    pub fn clear_reverts(&self) {
        self.state().reverting.clear();
    }

    // ── inspection ──────────────────────────────────────────────────────

    pub fn native_balance(&self, owner: Address) -> U256 {
        self.state().native.get(&owner).copied().unwrap_or_default()
    }

    pub fn token_balance(&self, token: Address, owner: Address) -> U256 {
        self.state().token_balance(token, owner)
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state()
            .tokens
            .get(&token)
            .and_then(|t| t.allowances.get(&(owner, spender)).copied())
            .unwrap_or_default()
    }

    pub fn reserves(&self, pair: Address) -> Option<(U256, U256)> {
        self.state().pairs.get(&pair).map(|p| (p.reserve0, p.reserve1))
    }

    pub fn pool_stake(&self, pool: Address, pool_id: u64, user: Address) -> U256 {
        self.state()
            .reward_pools
            .get(&pool)
            .and_then(|p| p.staked.get(&(pool_id, user)).copied())
            .unwrap_or_default()
    }

    pub fn masonry_stake(&self, masonry: Address, owner: Address) -> U256 {
        self.state()
            .masonries
            .get(&masonry)
            .and_then(|m| m.staked.get(&owner).copied())
            .unwrap_or_default()
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.state().sent.clone()
    }

    /// Method names of every transaction received, in order.
    pub fn sent_methods(&self) -> Vec<String> {
        self.state().sent.iter().map(|t| t.method.clone()).collect()
    }

    pub fn nonce(&self, owner: Address) -> u64 {
        self.state().nonces.get(&owner).copied().unwrap_or_default()
    }

    // ── RPC surface ─────────────────────────────────────────────────────

    pub fn read(&self, to: Address, data: &[u8]) -> Result<Bytes, ContractError> {
        self.state()
            .read(to, data)
            .map_err(|reason| ContractError::Rpc(format!("execution reverted: {reason}")))
    }

    pub fn gas_price(&self) -> U256 {
        self.state().gas_price
    }

    pub fn submit(&self, from: Address, request: TransactionRequest) -> Result<B256, ContractError> {
        let mut state = self.state();
        let expected = state.nonces.get(&from).copied().unwrap_or_default();
        let nonce = request
            .nonce
            .ok_or_else(|| ContractError::Signer("transaction has no nonce".into()))?;
        if nonce != expected {
            return Err(ContractError::Signer(format!(
                "nonce mismatch for {from}: expected {expected}, got {nonce}"
            )));
        }
        let to = request
            .to
            .and_then(|kind| kind.to().copied())
            .ok_or_else(|| ContractError::Signer("contract creation is not supported".into()))?;

        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&nonce.to_be_bytes());
        let hash = keccak256(&preimage);

        let input = request.input.input().cloned().unwrap_or_default();
        let value = request.value.unwrap_or_default();
        let method = method_name(&input).to_string();

        let mut draft = state.clone();
        let outcome = if state.reverting.contains(&method) {
            Err(format!("{method} forced to revert"))
        } else {
            draft.execute(from, to, &input, value)
        };
        let (status, logs) = match outcome {
            Ok(logs) => {
                *state = draft;
                (true, logs)
            }
            Err(_) => (false, Vec::new()),
        };

        let block = state.sent.len() as u64 + 1;
        let receipt = build_receipt(ReceiptFields {
            hash,
            block,
            from,
            to,
            status,
            gas_price: request.gas_price.unwrap_or_default(),
            logs,
        })?;

        state.nonces.insert(from, expected + 1);
        state.receipts.insert(hash, receipt);
        state.sent.push(SentTransaction {
            from,
            hash,
            method,
            request,
            status,
        });
        Ok(hash)
    }

    pub fn receipt(&self, hash: B256) -> Option<TransactionReceipt> {
        self.state().receipts.get(&hash).cloned()
    }
}

struct ReceiptFields {
    hash: B256,
    block: u64,
    from: Address,
    to: Address,
    status: bool,
    gas_price: u128,
    logs: Vec<EventLog>,
}

/// A legacy receipt in the shape `eth_getTransactionReceipt` returns it.
fn build_receipt(fields: ReceiptFields) -> Result<TransactionReceipt, ContractError> {
    let block_hash = keccak256(fields.block.to_be_bytes());
    let block_number = format!("{:#x}", fields.block);
    let logs: Vec<_> = fields
        .logs
        .iter()
        .enumerate()
        .map(|(index, log)| {
            json!({
                "address": log.address,
                "topics": log.data.topics(),
                "data": log.data.data,
                "blockHash": block_hash,
                "blockNumber": block_number,
                "transactionHash": fields.hash,
                "transactionIndex": "0x0",
                "logIndex": format!("{index:#x}"),
                "removed": false,
            })
        })
        .collect();
    let receipt = json!({
        "type": "0x0",
        "status": if fields.status { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0x5208",
        "logs": logs,
        "logsBloom": Bloom::default(),
        "transactionHash": fields.hash,
        "transactionIndex": "0x0",
        "blockHash": block_hash,
        "blockNumber": block_number,
        "gasUsed": "0x5208",
        "effectiveGasPrice": format!("{:#x}", fields.gas_price),
        "from": fields.from,
        "to": fields.to,
        "contractAddress": null,
    });
    serde_json::from_value(receipt)
        .map_err(|e| ContractError::Signer(format!("malformed receipt: {e}")))
}

fn transfer_log(token: Address, from: Address, to: Address, value: U256) -> EventLog {
    EventLog {
        address: token,
        data: IERC20::Transfer { from, to, value }.encode_log_data(),
    }
}

fn mul_div(a: U256, b: U256, c: U256) -> ExecResult<U256> {
    if c.is_zero() {
        return Err("division by zero".into());
    }
    a.checked_mul(b)
        .map(|p| p / c)
        .ok_or_else(|| "overflow".to_string())
}

impl ChainState {
    fn token_balance(&self, token: Address, owner: Address) -> U256 {
        self.tokens
            .get(&token)
            .and_then(|t| t.balances.get(&owner).copied())
            .unwrap_or_default()
    }

    fn mint(&mut self, token: Address, to: Address, amount: U256) {
        let t = self.tokens.entry(token).or_default();
        *t.balances.entry(to).or_default() += amount;
        t.total_supply += amount;
    }

    fn burn(&mut self, token: Address, from: Address, amount: U256) -> ExecResult<()> {
        let t = self.tokens.get_mut(&token).ok_or("unknown token")?;
        let balance = t.balances.entry(from).or_default();
        if *balance < amount {
            return Err("burn exceeds balance".into());
        }
        *balance -= amount;
        t.total_supply -= amount;
        Ok(())
    }

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> ExecResult<()> {
        let t = self.tokens.get_mut(&token).ok_or("unknown token")?;
        let balance = t.balances.entry(from).or_default();
        if *balance < amount {
            return Err(format!("transfer amount exceeds balance of {from}"));
        }
        *balance -= amount;
        *t.balances.entry(to).or_default() += amount;
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> ExecResult<()> {
        let t = self.tokens.get_mut(&token).ok_or("unknown token")?;
        let allowance = t.allowances.entry((owner, spender)).or_default();
        if *allowance < amount {
            return Err(format!("insufficient allowance for {spender}"));
        }
        if *allowance != U256::MAX {
            *allowance -= amount;
        }
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        to: Address,
        amount: U256,
    ) -> ExecResult<EventLog> {
        self.spend_allowance(token, owner, spender, amount)?;
        self.transfer(token, owner, to, amount)?;
        Ok(transfer_log(token, owner, to, amount))
    }

    fn find_pair(&self, a: Address, b: Address) -> ExecResult<(Address, bool)> {
        self.pairs
            .iter()
            .find_map(|(addr, p)| {
                if p.token0 == a && p.token1 == b {
                    Some((*addr, false))
                } else if p.token0 == b && p.token1 == a {
                    Some((*addr, true))
                } else {
                    None
                }
            })
            .ok_or_else(|| "pair does not exist".to_string())
    }

    /// Reserves ordered as `(a, b)`.
    fn oriented_reserves(&self, pair: Address, flipped: bool) -> ExecResult<(U256, U256)> {
        let p = self.pairs.get(&pair).ok_or("unknown pair")?;
        Ok(if flipped {
            (p.reserve1, p.reserve0)
        } else {
            (p.reserve0, p.reserve1)
        })
    }

    fn set_oriented_reserves(&mut self, pair: Address, flipped: bool, ra: U256, rb: U256) {
        if let Some(p) = self.pairs.get_mut(&pair) {
            if flipped {
                p.reserve0 = rb;
                p.reserve1 = ra;
            } else {
                p.reserve0 = ra;
                p.reserve1 = rb;
            }
        }
    }

    fn read(&self, to: Address, data: &[u8]) -> ExecResult<Bytes> {
        if let Some(m) = self.masonries.get(&to) {
            return match decode::<IMasonryCalls>(data)? {
                IMasonryCalls::balanceOf(c) => Ok(ret(m.staked.get(&c.mason).copied().unwrap_or_default())),
                IMasonryCalls::earned(c) => Ok(ret(m.earned.get(&c.mason).copied().unwrap_or_default())),
                IMasonryCalls::canWithdraw(c) => Ok(ret(m.can_withdraw(&c.mason))),
                IMasonryCalls::canClaimReward(c) => Ok(ret(m.can_claim(&c.mason))),
                IMasonryCalls::epoch(_) => Ok(ret(m.epoch)),
                IMasonryCalls::nextEpochPoint(_) => Ok(ret(m.next_epoch_point)),
                IMasonryCalls::masons(c) => {
                    let earned = m.earned.get(&c.mason).copied().unwrap_or_default();
                    Ok(ret_tuple((U256::ZERO, earned, m.timer(&c.mason))))
                }
                IMasonryCalls::withdrawLockupEpochs(_) => Ok(ret(m.withdraw_lockup)),
                IMasonryCalls::rewardLockupEpochs(_) => Ok(ret(m.reward_lockup)),
                _ => Err("masonry call is not a view".into()),
            };
        }

        if let Some(period) = self.treasuries.get(&to) {
            return match decode::<ITreasuryCalls>(data)? {
                ITreasuryCalls::PERIOD(_) => Ok(ret(*period)),
            };
        }

        if let Some(pool) = self.reward_pools.get(&to) {
            return match decode::<IRewardPoolCalls>(data)? {
                IRewardPoolCalls::userInfo(c) => {
                    let key = (c.pid.saturating_to::<u64>(), c.user);
                    let amount = pool.staked.get(&key).copied().unwrap_or_default();
                    Ok(ret_tuple((amount, U256::ZERO)))
                }
                IRewardPoolCalls::pendingShare(c) => {
                    let key = (c.pid.saturating_to::<u64>(), c.user);
                    Ok(ret(pool.pending.get(&key).copied().unwrap_or_default()))
                }
                _ => Err("reward pool call is not a view".into()),
            };
        }

        if let Some(pair) = self.pairs.get(&to) {
            if let Ok(call) = decode::<IUniswapV2PairCalls>(data) {
                return Ok(match call {
                    IUniswapV2PairCalls::getReserves(_) => {
                        ret_tuple((pair.reserve0, pair.reserve1, U256::ZERO))
                    }
                    IUniswapV2PairCalls::token0(_) => ret(pair.token0),
                    IUniswapV2PairCalls::token1(_) => ret(pair.token1),
                });
            }
        }

        let token = self.tokens.get(&to).ok_or("no contract at address")?;
        match decode::<IERC20Calls>(data)? {
            IERC20Calls::balanceOf(c) => Ok(ret(token.balances.get(&c.owner).copied().unwrap_or_default())),
            IERC20Calls::allowance(c) => Ok(ret(token
                .allowances
                .get(&(c.owner, c.spender))
                .copied()
                .unwrap_or_default())),
            IERC20Calls::totalSupply(_) => Ok(ret(token.total_supply)),
            IERC20Calls::approve(_) => Err("approve is not a view".into()),
        }
    }

    fn execute(&mut self, from: Address, to: Address, data: &[u8], value: U256) -> ExecResult<Vec<EventLog>> {
        let native = self.native.get(&from).copied().unwrap_or_default();
        if native < value {
            return Err("insufficient funds for value".into());
        }
        let payable = data.get(..4) == Some(&IUniswapV2Router::addLiquidityETHCall::SELECTOR[..]);
        if !value.is_zero() && !payable {
            return Err("function is not payable".into());
        }

        if let Some(wrapped) = self.routers.get(&to).copied() {
            return self.execute_router(from, to, wrapped, data, value);
        }
        if self.masonries.contains_key(&to) {
            return self.execute_masonry(from, to, data);
        }
        if self.reward_pools.contains_key(&to) {
            return self.execute_reward_pool(from, to, data);
        }
        if self.tokens.contains_key(&to) {
            if let IERC20Calls::approve(c) = decode::<IERC20Calls>(data)? {
                if let Some(t) = self.tokens.get_mut(&to) {
                    t.allowances.insert((from, c.spender), c.amount);
                }
                return Ok(Vec::new());
            }
        }
        Err(format!("cannot execute {} on {to}", method_name(data)))
    }

    #[allow(clippy::too_many_arguments)]
    fn add_liquidity(
        &mut self,
        from: Address,
        router: Address,
        token_a: Address,
        token_b: Address,
        (a_desired, b_desired): (U256, U256),
        (a_min, b_min): (U256, U256),
        to: Address,
        b_is_native: bool,
    ) -> ExecResult<Vec<EventLog>> {
        let (pair, flipped) = self.find_pair(token_a, token_b)?;
        let (ra, rb) = self.oriented_reserves(pair, flipped)?;

        let (a, b) = if ra.is_zero() && rb.is_zero() {
            (a_desired, b_desired)
        } else {
            let b_optimal = mul_div(a_desired, rb, ra)?;
            if b_optimal <= b_desired {
                if b_optimal < b_min {
                    return Err("insufficient B amount".into());
                }
                (a_desired, b_optimal)
            } else {
                let a_optimal = mul_div(b_desired, ra, rb)?;
                if a_optimal > a_desired || a_optimal < a_min {
                    return Err("insufficient A amount".into());
                }
                (a_optimal, b_desired)
            }
        };

        let mut logs = vec![self.transfer_from(token_a, from, router, pair, a)?];
        if b_is_native {
            let balance = self.native.entry(from).or_default();
            *balance -= b;
            self.mint(token_b, pair, b);
            logs.push(transfer_log(token_b, router, pair, b));
        } else {
            logs.push(self.transfer_from(token_b, from, router, pair, b)?);
        }

        let supply = self.tokens.get(&pair).map(|t| t.total_supply).unwrap_or_default();
        let liquidity = if supply.is_zero() {
            a.min(b)
        } else {
            mul_div(a, supply, ra)?.min(mul_div(b, supply, rb)?)
        };
        if liquidity.is_zero() {
            return Err("insufficient liquidity minted".into());
        }
        self.mint(pair, to, liquidity);
        self.set_oriented_reserves(pair, flipped, ra + a, rb + b);
        logs.push(transfer_log(pair, Address::ZERO, to, liquidity));
        Ok(logs)
    }

    #[allow(clippy::too_many_arguments)]
    fn remove_liquidity(
        &mut self,
        from: Address,
        router: Address,
        token_a: Address,
        token_b: Address,
        liquidity: U256,
        (a_min, b_min): (U256, U256),
        to: Address,
        b_is_native: bool,
    ) -> ExecResult<Vec<EventLog>> {
        let (pair, flipped) = self.find_pair(token_a, token_b)?;
        let (ra, rb) = self.oriented_reserves(pair, flipped)?;
        let supply = self.tokens.get(&pair).map(|t| t.total_supply).unwrap_or_default();

        let mut logs = vec![self.transfer_from(pair, from, router, pair, liquidity)?];
        let a = mul_div(liquidity, ra, supply)?;
        let b = mul_div(liquidity, rb, supply)?;
        if a < a_min {
            return Err("insufficient A amount".into());
        }
        if b < b_min {
            return Err("insufficient B amount".into());
        }
        self.burn(pair, pair, liquidity)?;
        logs.push(transfer_log(pair, pair, Address::ZERO, liquidity));

        self.transfer(token_a, pair, to, a)?;
        logs.push(transfer_log(token_a, pair, to, a));
        if b_is_native {
            self.burn(token_b, pair, b)?;
            *self.native.entry(to).or_default() += b;
        } else {
            self.transfer(token_b, pair, to, b)?;
            logs.push(transfer_log(token_b, pair, to, b));
        }
        self.set_oriented_reserves(pair, flipped, ra - a, rb - b);
        Ok(logs)
    }

    fn execute_router(
        &mut self,
        from: Address,
        router: Address,
        wrapped: Address,
        data: &[u8],
        value: U256,
    ) -> ExecResult<Vec<EventLog>> {
        match decode::<IUniswapV2RouterCalls>(data)? {
            IUniswapV2RouterCalls::addLiquidity(c) => self.add_liquidity(
                from,
                router,
                c.tokenA,
                c.tokenB,
                (c.amountADesired, c.amountBDesired),
                (c.amountAMin, c.amountBMin),
                c.to,
                false,
            ),
            IUniswapV2RouterCalls::addLiquidityETH(c) => self.add_liquidity(
                from,
                router,
                c.token,
                wrapped,
                (c.amountTokenDesired, value),
                (c.amountTokenMin, c.amountETHMin),
                c.to,
                true,
            ),
            IUniswapV2RouterCalls::removeLiquidity(c) => self.remove_liquidity(
                from,
                router,
                c.tokenA,
                c.tokenB,
                c.liquidity,
                (c.amountAMin, c.amountBMin),
                c.to,
                false,
            ),
            IUniswapV2RouterCalls::removeLiquidityETH(c) => self.remove_liquidity(
                from,
                router,
                c.token,
                wrapped,
                c.liquidity,
                (c.amountTokenMin, c.amountETHMin),
                c.to,
                true,
            ),
        }
    }

    fn pay_masonry_reward(&mut self, masonry: Address, owner: Address) -> ExecResult<Vec<EventLog>> {
        let m = self.masonries.get_mut(&masonry).ok_or("unknown masonry")?;
        let reward = m.earned.remove(&owner).unwrap_or_default();
        m.timer_start.insert(owner, m.epoch);
        let reward_token = m.reward_token;
        if reward.is_zero() {
            return Ok(Vec::new());
        }
        self.mint(reward_token, owner, reward);
        Ok(vec![transfer_log(reward_token, masonry, owner, reward)])
    }

    fn execute_masonry(&mut self, from: Address, masonry: Address, data: &[u8]) -> ExecResult<Vec<EventLog>> {
        let m = self.masonries.get(&masonry).ok_or("unknown masonry")?.clone();
        match decode::<IMasonryCalls>(data)? {
            IMasonryCalls::stake(c) => {
                if c.amount.is_zero() {
                    return Err("Masonry: Cannot stake 0".into());
                }
                let log = self.transfer_from(m.stake_token, from, masonry, masonry, c.amount)?;
                if let Some(m) = self.masonries.get_mut(&masonry) {
                    *m.staked.entry(from).or_default() += c.amount;
                    m.timer_start.insert(from, m.epoch);
                }
                Ok(vec![log])
            }
            IMasonryCalls::withdraw(c) => {
                if !m.can_withdraw(&from) {
                    return Err("Masonry: still in withdraw lockup".into());
                }
                let staked = m.staked.get(&from).copied().unwrap_or_default();
                if staked < c.amount {
                    return Err("Masonry: withdraw request greater than staked amount".into());
                }
                let mut logs = if m.can_claim(&from) {
                    self.pay_masonry_reward(masonry, from)?
                } else {
                    Vec::new()
                };
                if let Some(m) = self.masonries.get_mut(&masonry) {
                    m.staked.insert(from, staked - c.amount);
                }
                self.transfer(m.stake_token, masonry, from, c.amount)?;
                logs.push(transfer_log(m.stake_token, masonry, from, c.amount));
                Ok(logs)
            }
            IMasonryCalls::claimReward(_) => {
                if !m.can_claim(&from) {
                    return Err("Masonry: still in reward lockup".into());
                }
                self.pay_masonry_reward(masonry, from)
            }
            _ => Err("masonry view called as a transaction".into()),
        }
    }

    fn execute_reward_pool(&mut self, from: Address, pool: Address, data: &[u8]) -> ExecResult<Vec<EventLog>> {
        let (pid, amount, depositing) = match decode::<IRewardPoolCalls>(data)? {
            IRewardPoolCalls::deposit(c) => (c.pid, c.amount, true),
            IRewardPoolCalls::withdraw(c) => (c.pid, c.amount, false),
            _ => return Err("reward pool view called as a transaction".into()),
        };
        let pid = pid.saturating_to::<u64>();
        let p = self.reward_pools.get(&pool).ok_or("unknown pool")?.clone();
        let lp = *p.lp_tokens.get(&pid).ok_or("unknown pool id")?;
        let staked = p.staked.get(&(pid, from)).copied().unwrap_or_default();

        let mut logs = Vec::new();
        let pending = p.pending.get(&(pid, from)).copied().unwrap_or_default();
        if !pending.is_zero() {
            self.mint(p.reward_token, from, pending);
            logs.push(transfer_log(p.reward_token, pool, from, pending));
        }

        let new_staked = if depositing {
            if !amount.is_zero() {
                logs.push(self.transfer_from(lp, from, pool, pool, amount)?);
            }
            staked + amount
        } else {
            if staked < amount {
                return Err("withdraw: not good".into());
            }
            if !amount.is_zero() {
                self.transfer(lp, pool, from, amount)?;
                logs.push(transfer_log(lp, pool, from, amount));
            }
            staked - amount
        };

        if let Some(p) = self.reward_pools.get_mut(&pool) {
            p.pending.remove(&(pid, from));
            p.staked.insert((pid, from), new_staked);
        }
        Ok(logs)
    }
}
