//! A wallet that can be read but never signs.

use alloy_primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;

use stake_contracts::{ContractError, Provider, SigningContext, TxSigner};

pub struct WatchOnlyWallet {
    address: Address,
}

impl WatchOnlyWallet {
    pub fn shared(address: Address) -> Arc<dyn SigningContext> {
        Arc::new(Self { address })
    }
}

#[async_trait]
impl SigningContext for WatchOnlyWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn signer(&self, _provider: Arc<dyn Provider>) -> Result<Arc<dyn TxSigner>, ContractError> {
        Err(ContractError::Signer(format!(
            "{} is watch-only and cannot sign",
            self.address
        )))
    }
}
