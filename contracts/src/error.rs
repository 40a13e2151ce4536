//! Contract-layer error types.

use stake_types::StakeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    #[error("duplicate contract name: {0}")]
    DuplicateName(String),

    #[error("duplicate contract address: {0}")]
    DuplicateAddress(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("abi decode error: {0}")]
    Abi(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("no providers configured")]
    NoProviders,

    #[error("signer error: {0}")]
    Signer(String),

    #[error("transaction {0} reverted")]
    Reverted(String),
}

impl From<ContractError> for StakeError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::UnknownContract(_)
            | ContractError::DuplicateName(_)
            | ContractError::DuplicateAddress(_)
            | ContractError::InvalidAddress(_) => StakeError::Config(e.to_string()),
            ContractError::Signer(_) | ContractError::Reverted(_) => {
                StakeError::Transaction(e.to_string())
            }
            ContractError::Abi(_) | ContractError::Rpc(_) | ContractError::NoProviders => {
                StakeError::Provider(e.to_string())
            }
        }
    }
}
