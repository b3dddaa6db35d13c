use alloy::network::{Ethereum, TransactionBuilder};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{BlockId, Filter, Log, TransactionRequest};
use alloy_primitives::{Address, B256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use indexer_core::config::ChainConfig;
use indexer_core::events::getTokenInfoCall;
use indexer_core::types::Reserves;
use indexer_core::{IndexerError, Result, StaleRead};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::client::{check_range, ChainClient, ReserveSnapshot};

/// Boxed provider trait for HTTP connections
pub type BoxedProvider = Arc<dyn Provider<Ethereum> + Send + Sync>;

/// `ChainClient` over JSON-RPC with a per-call timeout
pub struct RpcChainClient {
    provider: BoxedProvider,
    factory: Address,
    timeout: Duration,
}

impl RpcChainClient {
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let url: reqwest::Url = config
            .rpc_url
            .parse()
            .map_err(|e| IndexerError::Config(format!("Invalid RPC URL: {}", e)))?;

        Ok(Self {
            provider: Arc::new(ProviderBuilder::new().connect_http(url)),
            factory: config.factory,
            timeout: Duration::from_millis(config.rpc_timeout_ms),
        })
    }

    /// Run an RPC future under the configured timeout
    async fn timed<T, E, F>(&self, method: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, fut).await;
        indexer_metrics::histograms::rpc_request_duration(start.elapsed(), method);

        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(IndexerError::ChainUnavailable(format!("{}: {}", method, e))),
            Err(_) => Err(IndexerError::ChainTimeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn current_height(&self) -> Result<u64> {
        self.timed("eth_blockNumber", self.provider.get_block_number())
            .await
    }

    async fn get_logs(&self, signature: B256, from: u64, to: u64) -> Result<Vec<Log>> {
        check_range(from, to)?;

        let filter = Filter::new()
            .address(self.factory)
            .event_signature(signature)
            .from_block(from)
            .to_block(to);

        let logs = self
            .timed("eth_getLogs", self.provider.get_logs(&filter))
            .await?;
        debug!(from = from, to = to, signature = ?signature, logs = logs.len(), "Fetched logs");
        Ok(logs)
    }

    async fn read_reserves(
        &self,
        token: Address,
        at_block: Option<u64>,
    ) -> std::result::Result<ReserveSnapshot, StaleRead> {
        let stale = |reason: String| StaleRead { token, reason };

        let tx = TransactionRequest::default()
            .with_to(self.factory)
            .with_input(getTokenInfoCall { token }.abi_encode());
        let block = at_block.map(BlockId::number).unwrap_or_else(BlockId::latest);

        let output = self
            .timed("eth_call", async {
                self.provider.call(tx).block(block).await
            })
            .await
            .map_err(|e| stale(e.to_string()))?;

        let info = getTokenInfoCall::abi_decode_returns(&output)
            .map_err(|e| stale(format!("decode getTokenInfo: {}", e)))?;

        Ok(ReserveSnapshot {
            reserves: Reserves::new(info.reserveETH, info.reserveTokens),
            migrated: info.graduated,
            pool: (info.pool != Address::ZERO).then_some(info.pool),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rpc_url: &str) -> ChainConfig {
        ChainConfig {
            chain_id: 4326,
            rpc_url: rpc_url.to_string(),
            factory: Address::repeat_byte(0xfa),
            rpc_timeout_ms: 1_000,
        }
    }

    #[test]
    fn test_relative_url_is_a_config_error() {
        assert!(matches!(
            RpcChainClient::new(&config("127.0.0.1:8545")),
            Err(IndexerError::Config(_))
        ));
        assert!(RpcChainClient::new(&config("http://127.0.0.1:8545")).is_ok());
    }
}
