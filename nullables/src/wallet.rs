//! Nullable wallet: signs by submitting straight to a [`NullChain`].

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use std::sync::Arc;

use stake_contracts::{
    ContractError, Provider, SigningContext, TransactionReceipt, TransactionRequest, TxSigner,
};

use crate::chain::NullChain;

pub struct NullSigner {
    address: Address,
    chain: NullChain,
}

#[async_trait]
impl TxSigner for NullSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, ContractError> {
        self.chain.submit(self.address, tx)
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, ContractError> {
        self.chain
            .receipt(hash)
            .ok_or_else(|| ContractError::Signer(format!("unknown transaction {hash}")))
    }
}

/// A wallet for one account on a [`NullChain`].
#[derive(Clone)]
pub struct NullWallet {
    address: Address,
    chain: NullChain,
}

impl NullWallet {
    pub fn new(address: Address, chain: NullChain) -> Self {
        Self { address, chain }
    }

    pub fn shared(address: Address, chain: NullChain) -> Arc<dyn SigningContext> {
        Arc::new(Self::new(address, chain))
    }
}

#[async_trait]
impl SigningContext for NullWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn signer(&self, _provider: Arc<dyn Provider>) -> Result<Arc<dyn TxSigner>, ContractError> {
        Ok(Arc::new(NullSigner {
            address: self.address,
            chain: self.chain.clone(),
        }))
    }
}
