//! Lookup of stake policies by id.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, Instrument};

use stake_types::{ChangeQuote, StakeError, StakePolicy, StakePosition};

use crate::policy::{ChangeQuoteRequest, StakePolicyInfo, StakePositionRequest};
use crate::spans::{position_span, quote_span};

/// The static policy catalog, in load order.
///
/// Construction fails if two policies share an id.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: Vec<Arc<StakePolicyInfo>>,
    by_id: HashMap<String, usize>,
}

impl PolicyRegistry {
    pub fn new(policies: Vec<StakePolicyInfo>) -> Result<Self, StakeError> {
        let mut by_id = HashMap::with_capacity(policies.len());
        for (index, info) in policies.iter().enumerate() {
            if by_id.insert(info.stake_policy_id.clone(), index).is_some() {
                return Err(StakeError::Config(format!(
                    "duplicate stake policy id '{}'",
                    info.stake_policy_id
                )));
            }
        }
        Ok(Self {
            policies: policies.into_iter().map(Arc::new).collect(),
            by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StakePolicyInfo> {
        self.policies.iter().map(Arc::as_ref)
    }

    pub fn get(&self, stake_policy_id: &str) -> Result<&StakePolicyInfo, StakeError> {
        self.by_id
            .get(stake_policy_id)
            .and_then(|&index| self.policies.get(index))
            .map(Arc::as_ref)
            .ok_or_else(|| StakeError::PolicyNotFound(stake_policy_id.to_string()))
    }

    pub fn public_policies(&self) -> Vec<StakePolicy> {
        self.iter().map(StakePolicyInfo::to_public).collect()
    }

    pub async fn fetch_change_quote(
        &self,
        request: ChangeQuoteRequest,
    ) -> Result<ChangeQuote, StakeError> {
        let info = self.get(&request.stake_policy_id)?;
        let span = quote_span(&info.stake_policy_id, request.action.as_str());
        async {
            let quote = info.policy.fetch_change_quote(info, request).await?;
            debug!(allocations = quote.allocations.len(), "quote ready");
            Ok(quote)
        }
        .instrument(span)
        .await
    }

    pub async fn fetch_stake_position(
        &self,
        request: StakePositionRequest,
    ) -> Result<StakePosition, StakeError> {
        let info = self.get(&request.stake_policy_id)?;
        let span = position_span(&info.stake_policy_id);
        async {
            let position = info.policy.fetch_stake_position(info, request).await?;
            debug!(
                can_stake = position.can_stake,
                can_unstake = position.can_unstake,
                can_claim = position.can_claim,
                "position ready"
            );
            Ok(position)
        }
        .instrument(span)
        .await
    }
}
