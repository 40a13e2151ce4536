//! Nullable providers: RPC endpoints backed by a [`NullChain`], plus
//! endpoints that fail or stall on purpose.

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stake_contracts::{ContractError, Provider};

use crate::chain::NullChain;

/// A healthy endpoint reading from a [`NullChain`].
pub struct NullProvider {
    url: String,
    chain: NullChain,
    calls: AtomicUsize,
}

impl NullProvider {
    pub fn new(url: impl Into<String>, chain: NullChain) -> Self {
        Self {
            url: url.into(),
            chain,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn shared(url: impl Into<String>, chain: NullChain) -> Arc<dyn Provider> {
        Arc::new(Self::new(url, chain))
    }

    /// Number of requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for NullProvider {
    fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ContractError> {
        self.tick();
        self.chain.read(to, &data)
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ContractError> {
        self.tick();
        Ok(self.chain.native_balance(address))
    }

    async fn gas_price(&self) -> Result<U256, ContractError> {
        self.tick();
        Ok(self.chain.gas_price())
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ContractError> {
        self.tick();
        Ok(self.chain.nonce(address))
    }
}

/// An endpoint that rejects every request after an optional delay.
pub struct FailingProvider {
    url: String,
    delay: Duration,
}

impl FailingProvider {
    pub fn new(url: impl Into<String>, delay: Duration) -> Self {
        Self {
            url: url.into(),
            delay,
        }
    }

    pub fn shared(url: impl Into<String>, delay: Duration) -> Arc<dyn Provider> {
        Arc::new(Self::new(url, delay))
    }

    async fn fail<T>(&self) -> Result<T, ContractError> {
        tokio::time::sleep(self.delay).await;
        Err(ContractError::Rpc(format!("{} is unavailable", self.url)))
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, ContractError> {
        self.fail().await
    }

    async fn get_balance(&self, _address: Address) -> Result<U256, ContractError> {
        self.fail().await
    }

    async fn gas_price(&self) -> Result<U256, ContractError> {
        self.fail().await
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64, ContractError> {
        self.fail().await
    }
}

/// Wraps another provider and delays every response.
pub struct SlowProvider {
    inner: Arc<dyn Provider>,
    delay: Duration,
}

impl SlowProvider {
    pub fn new(inner: Arc<dyn Provider>, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn shared(inner: Arc<dyn Provider>, delay: Duration) -> Arc<dyn Provider> {
        Arc::new(Self::new(inner, delay))
    }
}

#[async_trait]
impl Provider for SlowProvider {
    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ContractError> {
        tokio::time::sleep(self.delay).await;
        self.inner.call(to, data).await
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ContractError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_balance(address).await
    }

    async fn gas_price(&self) -> Result<U256, ContractError> {
        tokio::time::sleep(self.delay).await;
        self.inner.gas_price().await
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ContractError> {
        tokio::time::sleep(self.delay).await;
        self.inner.transaction_count(address).await
    }
}
