//! Accounting notes for broadcast transactions.
//!
//! Every step that broadcasts records, per affected currency, a display name,
//! a category and a note under the transaction hash. Wallet front-ends read
//! them back to label the transaction.

use alloy_primitives::B256;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetadataCategory {
    #[serde(rename = "Expense:Fees")]
    ExpenseFees,
    #[serde(rename = "Transfer:Staking")]
    TransferStaking,
    #[serde(rename = "Income:Staking")]
    IncomeStaking,
}

impl MetadataCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataCategory::ExpenseFees => "Expense:Fees",
            MetadataCategory::TransferStaking => "Transfer:Staking",
            MetadataCategory::IncomeStaking => "Income:Staking",
        }
    }
}

impl fmt::Display for MetadataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxMetadata {
    pub name: String,
    pub category: MetadataCategory,
    pub notes: String,
}

impl TxMetadata {
    pub fn new(name: &str, category: MetadataCategory, notes: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            category,
            notes: notes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxMetadataEntry {
    pub currency_code: String,
    #[serde(flatten)]
    pub metadata: TxMetadata,
}

/// In-memory cache keyed by transaction hash. Later records for the same
/// hash and currency replace earlier ones.
#[derive(Debug, Default)]
pub struct TxMetadataCache {
    entries: Mutex<HashMap<B256, Vec<TxMetadataEntry>>>,
}

impl TxMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<B256, Vec<TxMetadataEntry>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, hash: B256, currency_code: &str, metadata: TxMetadata) {
        let mut entries = self.entries();
        let list = entries.entry(hash).or_default();
        list.retain(|e| e.currency_code != currency_code);
        list.push(TxMetadataEntry {
            currency_code: currency_code.to_string(),
            metadata,
        });
    }

    pub fn get(&self, hash: &B256) -> Vec<TxMetadataEntry> {
        self.entries().get(hash).cloned().unwrap_or_default()
    }

    pub fn get_for(&self, hash: &B256, currency_code: &str) -> Option<TxMetadata> {
        self.entries()
            .get(hash)
            .and_then(|list| list.iter().find(|e| e.currency_code == currency_code))
            .map(|e| e.metadata.clone())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
