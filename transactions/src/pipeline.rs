//! A built pipeline waiting for the caller to approve it.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use stake_contracts::{Ecosystem, SigningContext};
use stake_types::{Approve, StakeError};

use crate::builder::{Merge, TxBuilder};
use crate::nonce::NonceCounter;
use crate::signer::SignerContext;

/// Everything `approve()` needs: the steps, the wallet to sign with, and the
/// gas price the quote's fee was computed from.
///
/// Approving twice runs the steps twice. Steps are expected to re-check
/// on-chain allowances and balances so that already-satisfied work is
/// skipped on the second run. Runs never overlap: a second `approve()` waits
/// for the first to finish, since both draw from the same nonce counter.
pub struct Pipeline<C> {
    builder: TxBuilder<SignerContext, C>,
    ecosystem: Ecosystem,
    wallet: Arc<dyn SigningContext>,
    nonces: NonceCounter,
    gas_price: U256,
    running: Mutex<()>,
}

impl<C> Pipeline<C>
where
    C: Merge + Default + Clone + Send + Sync + 'static,
{
    pub fn new(
        builder: TxBuilder<SignerContext, C>,
        ecosystem: Ecosystem,
        wallet: Arc<dyn SigningContext>,
        nonces: NonceCounter,
        gas_price: U256,
    ) -> Self {
        Self {
            builder,
            ecosystem,
            wallet,
            nonces,
            gas_price,
            running: Mutex::new(()),
        }
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.builder.step_names()
    }

    pub async fn execute(&self) -> Result<C, StakeError> {
        let _running = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("waiting for the previous run of this pipeline");
                self.running.lock().await
            }
        };

        let signer = self.wallet.signer(self.ecosystem.first_provider()?).await?;
        let address = signer.address();
        let pending = self
            .ecosystem
            .multipass(|p| async move { p.transaction_count(address).await })
            .await?;
        self.nonces.reseed(pending);

        info!(account = %address, steps = self.builder.len(), nonce = pending, "running transaction pipeline");
        let context = SignerContext::new(signer, self.nonces.clone(), self.gas_price);
        Ok(self.builder.run(context).await?)
    }
}

#[async_trait]
impl<C> Approve for Pipeline<C>
where
    C: Merge + Default + Clone + Send + Sync + 'static,
{
    async fn approve(&self) -> Result<(), StakeError> {
        self.execute().await.map(|_| ())
    }
}
