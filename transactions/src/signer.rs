//! The global value handed to every pipeline step.

use alloy::network::{ReceiptResponse as _, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use std::sync::Arc;
use tracing::info;

use stake_contracts::{ContractError, TxSigner};

use crate::error::TxError;
use crate::nonce::NonceCounter;

/// A live signer plus the nonce source and gas price fixed at quote time.
#[derive(Clone)]
pub struct SignerContext {
    signer: Arc<dyn TxSigner>,
    nonces: NonceCounter,
    gas_price: U256,
}

impl SignerContext {
    pub fn new(signer: Arc<dyn TxSigner>, nonces: NonceCounter, gas_price: U256) -> Self {
        Self {
            signer,
            nonces,
            gas_price,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    /// Broadcast a call with the next nonce and wait for it to be mined.
    ///
    /// A reverted receipt is an error.
    pub async fn send(
        &self,
        to: Address,
        data: Bytes,
        value: U256,
        gas_limit: U256,
    ) -> Result<TransactionReceipt, TxError> {
        let nonce = self.nonces.next();
        let request = TransactionRequest::default()
            .with_from(self.address())
            .with_to(to)
            .with_input(data)
            .with_value(value)
            .with_nonce(nonce)
            .with_gas_limit(gas_limit.saturating_to::<u64>())
            .with_gas_price(self.gas_price.saturating_to::<u128>());
        let hash = self.signer.send_transaction(request).await?;
        info!(tx = %hash, nonce, gas_limit = %gas_limit, to = %to, "transaction sent");

        let receipt = self.signer.wait_for_receipt(hash).await?;
        if !receipt.status() {
            return Err(ContractError::Reverted(hash.to_string()).into());
        }
        Ok(receipt)
    }
}
