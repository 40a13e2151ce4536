//! Multi-endpoint chain client.
//!
//! An [`Ecosystem`] owns the contract registry and an ordered list of
//! redundant providers. Every read is raced across all providers and resolves
//! with the first success; it fails only when every provider fails, reporting
//! the last error seen. Endpoints are not health-tracked: a provider that
//! failed one read is tried again on the next.

use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use stake_utils::{first_ok, RaceError};

use crate::error::ContractError;
use crate::handles::{Contract, Handle};
use crate::jsonrpc::JsonRpcProvider;
use crate::provider::Provider;
use crate::registry::{ContractInfo, ContractRegistry};

/// RPC endpoints for one chain, built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainEndpoints {
    pub plugin_id: String,
    pub rpc_urls: Vec<String>,
}

#[derive(Clone)]
pub struct Ecosystem {
    registry: Arc<ContractRegistry>,
    providers: Vec<Arc<dyn Provider>>,
}

impl Ecosystem {
    pub fn new(registry: ContractRegistry, providers: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            registry: Arc::new(registry),
            providers,
        }
    }

    /// One [`JsonRpcProvider`] per configured URL, in order.
    pub fn from_endpoints(
        registry: ContractRegistry,
        endpoints: &ChainEndpoints,
    ) -> Result<Self, ContractError> {
        let providers = endpoints
            .rpc_urls
            .iter()
            .map(|url| JsonRpcProvider::new(url.clone()).map(|p| Arc::new(p) as Arc<dyn Provider>))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(registry, providers))
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn get_contract_info(&self, key: &str) -> Result<&ContractInfo, ContractError> {
        self.registry.get_contract_info(key)
    }

    pub fn first_provider(&self) -> Result<Arc<dyn Provider>, ContractError> {
        self.providers.first().cloned().ok_or(ContractError::NoProviders)
    }

    /// Resolve a contract by name or address and bind it to the first provider.
    pub fn make_contract(&self, key: &str) -> Result<Contract, ContractError> {
        let info = self.registry.get_contract_info(key)?;
        Ok(Contract::new(info.address, self.first_provider()?))
    }

    /// Race a read on `handle` across every provider.
    pub async fn read<H, T, F, Fut>(&self, handle: &H, f: F) -> Result<T, ContractError>
    where
        H: Handle,
        F: Fn(H) -> Fut,
        Fut: Future<Output = Result<T, ContractError>>,
    {
        self.multipass(|provider| f(handle.connect(provider))).await
    }

    /// Run `f` against every provider concurrently; first success wins.
    pub async fn multipass<T, F, Fut>(&self, f: F) -> Result<T, ContractError>
    where
        F: Fn(Arc<dyn Provider>) -> Fut,
        Fut: Future<Output = Result<T, ContractError>>,
    {
        let tasks: Vec<_> = self
            .providers
            .iter()
            .map(|provider| {
                let endpoint = provider.url().to_string();
                let call = f(provider.clone());
                async move {
                    call.await.map_err(|e| {
                        warn!(endpoint = %endpoint, error = %e, "provider call failed");
                        e
                    })
                }
            })
            .collect();

        match first_ok(tasks).await {
            Ok(value) => Ok(value),
            Err(RaceError::NoTasks) => Err(ContractError::NoProviders),
            Err(RaceError::AllFailed(e)) => Err(e),
        }
    }
}
