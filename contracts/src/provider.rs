//! Ports to the outside world: chain reads, transaction signing, and the
//! wallet that hands out signers.
//!
//! Transactions and receipts are alloy's RPC types, so a real signer can
//! hand them straight to an alloy provider.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ContractError;

/// A read-only chain endpoint.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Endpoint identifier used in logs.
    fn url(&self) -> &str;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ContractError>;

    async fn get_balance(&self, address: Address) -> Result<U256, ContractError>;

    async fn gas_price(&self) -> Result<U256, ContractError>;

    /// Transaction count including pending transactions.
    async fn transaction_count(&self, address: Address) -> Result<u64, ContractError>;
}

/// Signs and broadcasts transactions for one account through one provider.
///
/// Requests arrive fully specified: recipient, input, value, nonce, gas
/// limit and legacy gas price are all set.
#[async_trait]
pub trait TxSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, ContractError>;

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, ContractError>;
}

/// The wallet collaborator. It never exposes key material; it only produces
/// signers bound to a provider.
#[async_trait]
pub trait SigningContext: Send + Sync {
    fn address(&self) -> Address;

    async fn signer(&self, provider: Arc<dyn Provider>) -> Result<Arc<dyn TxSigner>, ContractError>;
}
