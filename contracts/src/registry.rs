//! Logical contract names and addresses.
//!
//! The registry is built once from a static list. Two entries sharing a name
//! or an address is a configuration bug, so construction fails instead of
//! letting the later entry shadow the earlier one.

use alloy::primitives::Address;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::ContractError;

/// Parse a hex address, with or without `0x`, in any case. Checksums are
/// not enforced.
pub fn parse_address(raw: &str) -> Result<Address, ContractError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != 40 {
        return Err(ContractError::InvalidAddress(raw.to_string()));
    }
    digits
        .parse()
        .map_err(|_| ContractError::InvalidAddress(raw.to_string()))
}

/// Lower-case hex without `0x`, the form used for token ids.
pub fn token_id(address: &Address) -> String {
    hex::encode(address)
}

/// Which interface a contract speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiKind {
    Erc20,
    WrappedNative,
    UniswapV2Pair,
    UniswapV2Router,
    Masonry,
    Treasury,
    RewardPool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractInfo {
    pub name: String,
    pub address: Address,
    pub abi: AbiKind,
}

impl ContractInfo {
    pub fn new(name: &str, address: &str, abi: AbiKind) -> Result<Self, ContractError> {
        Ok(Self {
            name: name.to_string(),
            address: parse_address(address)?,
            abi,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    entries: Vec<ContractInfo>,
    by_name: HashMap<String, usize>,
    by_address: HashMap<Address, usize>,
}

impl ContractRegistry {
    pub fn new(entries: Vec<ContractInfo>) -> Result<Self, ContractError> {
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_address = HashMap::with_capacity(entries.len());
        for (index, info) in entries.iter().enumerate() {
            if by_name.insert(info.name.clone(), index).is_some() {
                return Err(ContractError::DuplicateName(info.name.clone()));
            }
            if by_address.insert(info.address, index).is_some() {
                return Err(ContractError::DuplicateAddress(info.address.to_string()));
            }
        }
        Ok(Self {
            entries,
            by_name,
            by_address,
        })
    }

    /// Look up a contract by logical name or by address (`0x` optional, any case).
    pub fn get_contract_info(&self, key: &str) -> Result<&ContractInfo, ContractError> {
        let index = match self.by_name.get(key) {
            Some(index) => Some(*index),
            None => parse_address(key)
                .ok()
                .and_then(|address| self.by_address.get(&address).copied()),
        };
        index
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| ContractError::UnknownContract(key.to_string()))
    }

    pub fn by_address(&self, address: &Address) -> Option<&ContractInfo> {
        self.by_address.get(address).and_then(|i| self.entries.get(*i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContractInfo> {
        self.entries.iter()
    }
}
