use indexer_core::types::{canonical_address, canonical_hash, Trade, TradeDirection, TradeKey};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_address, parse_amount, parse_hash};
use crate::{DatabaseError, Result};

/// Database model for trades table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTrade {
    /// Primary key: txHash_logIndex
    pub id: String,
    pub token_address: String,
    pub agent_id: Option<String>,
    pub trader_address: String,
    /// BUY or SELL
    pub direction: String,
    pub amount_in: String,
    pub amount_out: String,
    pub fee: String,
    pub tx_hash: String,
    pub log_index: i64,
    pub block_number: i64,
    pub created_at: i64,
}

impl From<&Trade> for DbTrade {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id(),
            token_address: canonical_address(&trade.token),
            agent_id: trade.agent_id.clone(),
            trader_address: canonical_address(&trade.trader),
            direction: trade.direction.as_str().to_string(),
            amount_in: trade.amount_in.to_string(),
            amount_out: trade.amount_out.to_string(),
            fee: trade.fee.to_string(),
            tx_hash: canonical_hash(&trade.key.tx_hash),
            log_index: trade.key.log_index as i64,
            block_number: trade.block_number as i64,
            created_at: trade.created_at as i64,
        }
    }
}

impl DbTrade {
    pub fn into_trade(self) -> Result<Trade> {
        let direction = self
            .direction
            .parse::<TradeDirection>()
            .map_err(DatabaseError::Serialization)?;

        Ok(Trade {
            key: TradeKey::new(parse_hash(&self.tx_hash)?, self.log_index.max(0) as u64),
            token: parse_address(&self.token_address)?,
            agent_id: self.agent_id,
            trader: parse_address(&self.trader_address)?,
            direction,
            amount_in: parse_amount(&self.amount_in)?,
            amount_out: parse_amount(&self.amount_out)?,
            fee: parse_amount(&self.fee)?,
            created_at: self.created_at.max(0) as u64,
            block_number: self.block_number.max(0) as u64,
        })
    }
}
