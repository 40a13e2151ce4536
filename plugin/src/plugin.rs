//! The facade over the policy registry.

use alloy_primitives::B256;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use stake_contracts::Ecosystem;
use stake_policies::fantom::{fantom_contracts, fantom_policies};
use stake_policies::{
    ChangeQuoteRequest, PolicyRegistry, StakePolicyInfo, StakePositionRequest, TxMetadataCache,
    TxMetadataEntry,
};
use stake_types::{ChangeQuote, StakeDetails, StakeError, StakePolicy};
use stake_utils::{Clock, SystemClock};

use crate::config::PluginConfig;

pub struct StakePlugin {
    registry: PolicyRegistry,
    metadata: Arc<TxMetadataCache>,
    disabled: HashSet<String>,
}

impl StakePlugin {
    /// Connect to the configured Fantom endpoints and load the catalog.
    pub fn new(config: &PluginConfig) -> Result<Self, StakeError> {
        let endpoints = config.fantom.endpoints();
        debug!(endpoints = ?endpoints.rpc_urls, "connecting to fantom");
        let eco = Ecosystem::from_endpoints(fantom_contracts()?, &endpoints)?;
        Self::with_ecosystem(eco, &config.disabled_policies, Arc::new(SystemClock))
    }

    /// Load the Fantom catalog over an existing ecosystem.
    pub fn with_ecosystem(
        eco: Ecosystem,
        disabled_policies: &[String],
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StakeError> {
        let metadata = Arc::new(TxMetadataCache::new());
        let policies = fantom_policies(&eco, metadata.clone(), clock)?;
        Self::from_policies(policies, metadata, disabled_policies)
    }

    pub fn from_policies(
        policies: Vec<StakePolicyInfo>,
        metadata: Arc<TxMetadataCache>,
        disabled_policies: &[String],
    ) -> Result<Self, StakeError> {
        let registry = PolicyRegistry::new(policies)?;
        let disabled: HashSet<String> = disabled_policies.iter().cloned().collect();
        info!(
            policies = registry.len(),
            disabled = disabled.len(),
            "stake plugin ready"
        );
        Ok(Self {
            registry,
            metadata,
            disabled,
        })
    }

    fn check_enabled(&self, stake_policy_id: &str) -> Result<(), StakeError> {
        if self.disabled.contains(stake_policy_id) {
            return Err(StakeError::PolicyNotFound(stake_policy_id.to_string()));
        }
        Ok(())
    }

    pub fn get_stake_policies(&self) -> Vec<StakePolicy> {
        self.registry
            .public_policies()
            .into_iter()
            .filter(|p| !self.disabled.contains(&p.stake_policy_id))
            .collect()
    }

    pub async fn fetch_change_quote(
        &self,
        request: ChangeQuoteRequest,
    ) -> Result<ChangeQuote, StakeError> {
        self.check_enabled(&request.stake_policy_id)?;
        self.registry.fetch_change_quote(request).await
    }

    pub async fn fetch_stake_details(
        &self,
        request: StakePositionRequest,
    ) -> Result<StakeDetails, StakeError> {
        self.check_enabled(&request.stake_policy_id)?;
        let position = self.registry.fetch_stake_position(request).await?;
        Ok(StakeDetails { position })
    }

    /// Accounting notes recorded for a transaction this plugin broadcast.
    pub fn tx_metadata(&self, hash: &B256) -> Vec<TxMetadataEntry> {
        self.metadata.get(hash)
    }
}
