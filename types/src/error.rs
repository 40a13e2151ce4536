//! Top-level error type shared across crates.

use thiserror::Error;

/// Every failure the stake engine reports to its callers.
///
/// Lower-level crates define their own error enums and convert into this
/// one at the crate boundary.
#[derive(Debug, Error)]
pub enum StakeError {
    #[error("stake policy not found: {0}")]
    PolicyNotFound(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("insufficient {currency_code} balance")]
    InsufficientBalance { currency_code: String },

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("numeric error: {0}")]
    Numeric(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl StakeError {
    pub fn insufficient(currency_code: impl Into<String>) -> Self {
        Self::InsufficientBalance {
            currency_code: currency_code.into(),
        }
    }
}
