use indexer_core::types::{canonical_address, canonical_hash, iso_timestamp, Token};
use serde::Serialize;

/// Token as served over HTTP. Amounts are decimal strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToken {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub creator: String,
    pub agent_id: Option<String>,
    pub tx_hash: Option<String>,
    pub migrated: bool,
    pub pool_address: Option<String>,
    pub reserve_base: String,
    pub reserve_quote: String,
    pub created_at: String,
}

impl From<Token> for ApiToken {
    fn from(token: Token) -> Self {
        Self {
            address: canonical_address(&token.address),
            name: token.name,
            symbol: token.symbol,
            creator: canonical_address(&token.creator),
            agent_id: token.agent_id,
            tx_hash: token.tx_hash.as_ref().map(canonical_hash),
            migrated: token.migrated,
            pool_address: token.pool_address.as_ref().map(canonical_address),
            reserve_base: token.reserves.base.to_string(),
            reserve_quote: token.reserves.quote.to_string(),
            created_at: iso_timestamp(token.created_at),
        }
    }
}
