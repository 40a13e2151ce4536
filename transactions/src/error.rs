use stake_contracts::ContractError;
use stake_types::StakeError;
use stake_utils::NumericError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<TxError>,
    },

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Numeric(#[from] NumericError),

    #[error("context is missing '{0}'")]
    MissingContext(&'static str),

    #[error("{0}")]
    Other(String),
}

impl TxError {
    /// Name of the step that failed, if the error came out of a pipeline run.
    pub fn step(&self) -> Option<&str> {
        match self {
            TxError::Step { step, .. } => Some(step),
            _ => None,
        }
    }
}

impl From<TxError> for StakeError {
    fn from(e: TxError) -> Self {
        StakeError::Transaction(e.to_string())
    }
}
