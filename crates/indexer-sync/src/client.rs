use alloy::rpc::types::Log;
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use indexer_core::types::{ReserveUpdate, Reserves};
use indexer_core::{IndexerError, Result, StaleRead, MAX_LOG_RANGE};

/// Point-in-time curve state read from the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveSnapshot {
    pub reserves: Reserves,
    pub migrated: bool,
    pub pool: Option<Address>,
}

impl ReserveSnapshot {
    pub fn into_update(self, token: Address) -> ReserveUpdate {
        ReserveUpdate {
            token,
            reserves: self.reserves,
            migrated: self.migrated,
            pool: self.pool,
        }
    }
}

/// Read-only view of the chain used by the reconciler.
///
/// Every call is bounded in time; failures surface as typed errors and
/// never panic the caller.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Latest block height
    async fn current_height(&self) -> Result<u64>;

    /// Factory logs with the given topic0 in `[from, to]`.
    /// The range must satisfy `check_range`.
    async fn get_logs(&self, signature: B256, from: u64, to: u64) -> Result<Vec<Log>>;

    /// Best-effort reserve read, optionally pinned to a block
    async fn read_reserves(
        &self,
        token: Address,
        at_block: Option<u64>,
    ) -> std::result::Result<ReserveSnapshot, StaleRead>;
}

/// Validate a log query range against the provider ceiling
pub fn check_range(from: u64, to: u64) -> Result<()> {
    if to < from || to - from >= MAX_LOG_RANGE {
        return Err(IndexerError::InvalidRange {
            from,
            to,
            limit: MAX_LOG_RANGE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range() {
        assert!(check_range(1, 1).is_ok());
        assert!(check_range(1, 1000).is_ok());
        assert!(check_range(1, 1001).is_err());
        assert!(check_range(5, 4).is_err());
    }
}
