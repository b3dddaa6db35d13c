use alloy_primitives::{Address, B256, U256};
use std::fmt;
use std::str::FromStr;

use super::canonical_hash;

/// Trade direction as persisted ("BUY" / "SELL")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "BUY",
            TradeDirection::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(TradeDirection::Buy),
            "SELL" => Ok(TradeDirection::Sell),
            other => Err(format!("invalid trade direction: {}", other)),
        }
    }
}

/// Unique key for trade lookup (tx_hash + log_index).
/// Both the reconciler and the agent trade path derive it from the emitting log,
/// so the same on-chain event always maps to the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradeKey {
    pub tx_hash: B256,
    pub log_index: u64,
}

impl TradeKey {
    pub fn new(tx_hash: B256, log_index: u64) -> Self {
        Self { tx_hash, log_index }
    }

    /// Persisted id: `0x<hash>_<logIndex>`
    pub fn id(&self) -> String {
        format!("{}_{}", canonical_hash(&self.tx_hash), self.log_index)
    }
}

/// An executed curve trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub key: TradeKey,
    pub token: Address,
    /// Attributed agent; `None` when the trader is not a known agent wallet
    pub agent_id: Option<String>,
    pub trader: Address,
    pub direction: TradeDirection,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee: U256,
    /// Unix seconds
    pub created_at: u64,
    pub block_number: u64,
}

impl Trade {
    pub fn id(&self) -> String {
        self.key.id()
    }

    /// ETH leg of the trade (input for buys, output for sells)
    pub fn eth_amount(&self) -> U256 {
        match self.direction {
            TradeDirection::Buy => self.amount_in,
            TradeDirection::Sell => self.amount_out,
        }
    }
}
