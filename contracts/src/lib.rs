//! On-chain access for the staking engine.
//!
//! - [`registry`]: logical contract names and addresses, checked for duplicates.
//! - [`interfaces`]: `sol!` declarations of the ERC-20, Uniswap-V2, masonry,
//!   treasury and reward-pool interfaces.
//! - [`provider`]: the `Provider`, `TxSigner` and `SigningContext` ports.
//! - [`jsonrpc`]: an alloy-backed HTTP implementation of `Provider`.
//! - [`ecosystem`]: the multi-endpoint client that races reads across providers.
//! - [`handles`]: typed wrappers for the contracts the policies talk to.

pub mod ecosystem;
pub mod error;
pub mod handles;
pub mod interfaces;
pub mod jsonrpc;
pub mod provider;
pub mod registry;

pub use alloy::rpc::types::{Log, TransactionReceipt, TransactionRequest};
pub use ecosystem::{ChainEndpoints, Ecosystem};
pub use error::ContractError;
pub use handles::{
    minted_liquidity, Contract, Erc20, Handle, Masonry, RewardPool, Treasury, UniswapV2Pair,
    UniswapV2Router,
};
pub use jsonrpc::JsonRpcProvider;
pub use provider::{Provider, SigningContext, TxSigner};
pub use registry::{parse_address, token_id, AbiKind, ContractInfo, ContractRegistry};
