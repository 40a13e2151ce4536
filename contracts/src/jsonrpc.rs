//! HTTP JSON-RPC provider backed by alloy.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider as _, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::Http;
use async_trait::async_trait;
use std::time::Duration;

use crate::error::ContractError;
use crate::provider::Provider;

/// Read-only client for one EVM JSON-RPC endpoint.
///
/// The underlying `reqwest::Client` carries request and connect timeouts so
/// a stalled endpoint eventually fails its branch of a multi-endpoint race.
#[derive(Clone)]
pub struct JsonRpcProvider {
    inner: RootProvider,
    url: String,
}

impl JsonRpcProvider {
    pub fn new(url: impl Into<String>) -> Result<Self, ContractError> {
        let url = url.into();
        let endpoint = url
            .parse()
            .map_err(|e| ContractError::Rpc(format!("invalid endpoint {url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ContractError::Rpc(format!("failed to create HTTP client: {e}")))?;
        let client = RpcClient::new(Http::with_client(http, endpoint), false);
        Ok(Self {
            inner: RootProvider::new(client),
            url,
        })
    }
}

fn rpc_error(method: &str, e: impl std::fmt::Display) -> ContractError {
    ContractError::Rpc(format!("{method} failed: {e}"))
}

#[async_trait]
impl Provider for JsonRpcProvider {
    fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ContractError> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.inner
            .call(&request)
            .await
            .map_err(|e| rpc_error("eth_call", e))
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ContractError> {
        self.inner
            .get_balance(address)
            .await
            .map_err(|e| rpc_error("eth_getBalance", e))
    }

    async fn gas_price(&self) -> Result<U256, ContractError> {
        let price = self
            .inner
            .get_gas_price()
            .await
            .map_err(|e| rpc_error("eth_gasPrice", e))?;
        Ok(U256::from(price))
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ContractError> {
        self.inner
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| rpc_error("eth_getTransactionCount", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_endpoint_url() {
        let provider = JsonRpcProvider::new("https://rpc.ftm.tools").unwrap();
        assert_eq!(provider.url(), "https://rpc.ftm.tools");
    }

    #[test]
    fn rejects_malformed_endpoint() {
        assert!(matches!(
            JsonRpcProvider::new("not a url"),
            Err(ContractError::Rpc(_))
        ));
    }
}
