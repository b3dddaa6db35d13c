use crate::error::{IndexerError, Result};
use alloy_primitives::{Address, U256};
use std::env;

/// Provider-imposed ceiling on a single `eth_getLogs` range
pub const MAX_LOG_RANGE: u64 = 1000;

/// Chain connection configuration from environment variables
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub factory: Address,
    /// Per-call timeout for chain reads
    pub rpc_timeout_ms: u64,
}

impl ChainConfig {
    /// Load chain configuration.
    /// Fails if `RPC_URL` or `FACTORY_CONTRACT` is missing or malformed.
    pub fn load() -> Result<Self> {
        let rpc_url = sanitize_url(
            env::var("RPC_URL").map_err(|_| IndexerError::MissingEnvVar("RPC_URL".to_string()))?,
        );
        if rpc_url.is_empty() {
            return Err(IndexerError::MissingEnvVar("RPC_URL".to_string()));
        }
        validate_rpc_url(&rpc_url)?;

        let factory = env::var("FACTORY_CONTRACT")
            .map_err(|_| IndexerError::MissingEnvVar("FACTORY_CONTRACT".to_string()))?
            .trim()
            .parse::<Address>()
            .map_err(|e| IndexerError::Config(format!("FACTORY_CONTRACT: {}", e)))?;

        let chain_id = env::var("CHAIN_ID")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4326);

        let rpc_timeout_ms = env::var("RPC_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10_000);

        Ok(Self {
            chain_id,
            rpc_url,
            factory,
            rpc_timeout_ms,
        })
    }
}

/// Reconciler loop tuning
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Tick period in milliseconds
    pub poll_interval_ms: u64,
    /// Bootstrap depth below the current height on first run
    pub lookback_blocks: u64,
    /// Blocks fetched per tick (clamped to `MAX_LOG_RANGE`)
    pub window_blocks: u64,
    /// Re-read reserves for touched tokens after each window
    pub reserve_refresh: bool,
}

impl ReconcilerConfig {
    pub fn from_env() -> Self {
        let poll_interval_ms = env::var("INDEXER_POLL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);

        let lookback_blocks = env::var("INDEXER_LOOKBACK_BLOCKS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(500);

        let window_blocks = env::var("INDEXER_WINDOW_BLOCKS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(MAX_LOG_RANGE);

        let reserve_refresh = env::var("RESERVE_REFRESH_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            poll_interval_ms,
            lookback_blocks,
            window_blocks: window_blocks.clamp(1, MAX_LOG_RANGE),
            reserve_refresh,
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 8000,
            lookback_blocks: 500,
            window_blocks: MAX_LOG_RANGE,
            reserve_refresh: true,
        }
    }
}

/// Curve parameters the factory does not emit
#[derive(Debug, Clone)]
pub struct CurveConfig {
    /// The factory's `VIRTUAL_ETH`, added to the ETH side of every quote
    pub virtual_base: U256,
}

impl CurveConfig {
    pub fn from_env() -> Self {
        let virtual_base = env::var("CURVE_VIRTUAL_ETH_WEI")
            .ok()
            .and_then(|s| U256::from_str_radix(s.trim(), 10).ok())
            .unwrap_or_else(default_virtual_base);
        Self { virtual_base }
    }
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            virtual_base: default_virtual_base(),
        }
    }
}

fn default_virtual_base() -> U256 {
    U256::from(1_000_000_000_000_000_000u128)
}

/// Complete indexer configuration
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub chain: ChainConfig,
    pub reconciler: ReconcilerConfig,
}

impl IndexerConfig {
    /// Load complete configuration from environment
    pub fn load() -> Result<Self> {
        Ok(Self {
            chain: ChainConfig::load()?,
            reconciler: ReconcilerConfig::from_env(),
        })
    }
}

/// The provider only speaks HTTP(S); anything else is a misconfiguration
fn validate_rpc_url(url: &str) -> Result<()> {
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .ok_or_else(|| IndexerError::Config(format!("RPC_URL must be an http(s) URL, got {:?}", url)))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') {
        return Err(IndexerError::Config(format!("RPC_URL has no host: {:?}", url)));
    }
    Ok(())
}

/// Sanitize URL by removing surrounding quotes and whitespace
fn sanitize_url(url: String) -> String {
    let trimmed = url.trim();
    let without_quotes = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    without_quotes.to_string()
}
