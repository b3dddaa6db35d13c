use alloy_primitives::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Chain unavailable: {0}")]
    ChainUnavailable(String),

    #[error("Chain read timed out after {0}ms")]
    ChainTimeout(u64),

    #[error("Block range {from}..={to} exceeds provider limit of {limit} blocks")]
    InvalidRange { from: u64, to: u64, limit: u64 },

    #[error("Event decode error: {0}")]
    EventDecode(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl IndexerError {
    /// Transient failures that the next tick retries without intervention
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IndexerError::ChainUnavailable(_) | IndexerError::ChainTimeout(_) | IndexerError::Store(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;

/// A best-effort reserve read that could not be completed.
/// Callers keep their previously mirrored values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Reserve read for {token} is stale: {reason}")]
pub struct StaleRead {
    pub token: Address,
    pub reason: String,
}
