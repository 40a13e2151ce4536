//! Change quotes: the allocations an action moves plus a deferred approval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::amount::NativeAmount;
use crate::error::StakeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationType {
    Stake,
    Unstake,
    Claim,
    Fee,
}

/// One line item of a quote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteAllocation {
    pub allocation_type: AllocationType,
    pub plugin_id: String,
    pub token_id: Option<String>,
    pub currency_code: String,
    pub native_amount: NativeAmount,
}

/// Executes the transaction pipeline captured by a quote.
#[async_trait]
pub trait Approve: Send + Sync {
    async fn approve(&self) -> Result<(), StakeError>;
}

/// A quote for one stake action.
///
/// `allocations` ends with exactly one `Fee` entry in the policy's native
/// asset. Nothing is broadcast until [`ChangeQuote::approve`] is called.
#[derive(Clone)]
pub struct ChangeQuote {
    pub allocations: Vec<QuoteAllocation>,
    approver: Arc<dyn Approve>,
}

impl ChangeQuote {
    pub fn new(allocations: Vec<QuoteAllocation>, approver: Arc<dyn Approve>) -> Self {
        Self {
            allocations,
            approver,
        }
    }

    pub async fn approve(&self) -> Result<(), StakeError> {
        self.approver.approve().await
    }

    pub fn fee(&self) -> Option<&QuoteAllocation> {
        self.allocations
            .iter()
            .rev()
            .find(|a| a.allocation_type == AllocationType::Fee)
    }
}

impl fmt::Debug for ChangeQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeQuote")
            .field("allocations", &self.allocations)
            .finish_non_exhaustive()
    }
}
