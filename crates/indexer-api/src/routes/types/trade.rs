use indexer_core::types::{canonical_address, canonical_hash, format_ether, iso_timestamp, Trade};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrade {
    pub id: String,
    pub token_address: String,
    pub agent_id: Option<String>,
    pub trader: String,
    pub direction: &'static str,
    pub amount_in: String,
    pub amount_out: String,
    pub fee: String,
    /// ETH side of the trade, formatted
    pub amount_eth: String,
    pub tx_hash: String,
    pub block_number: u64,
    pub created_at: String,
}

impl From<Trade> for ApiTrade {
    fn from(trade: Trade) -> Self {
        Self {
            id: trade.id(),
            token_address: canonical_address(&trade.token),
            amount_eth: format_ether(trade.eth_amount()),
            trader: canonical_address(&trade.trader),
            direction: trade.direction.as_str(),
            amount_in: trade.amount_in.to_string(),
            amount_out: trade.amount_out.to_string(),
            fee: trade.fee.to_string(),
            tx_hash: canonical_hash(&trade.key.tx_hash),
            block_number: trade.block_number,
            created_at: iso_timestamp(trade.created_at),
            agent_id: trade.agent_id,
        }
    }
}
