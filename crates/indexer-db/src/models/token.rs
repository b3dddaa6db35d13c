use indexer_core::types::{canonical_address, canonical_hash, Reserves, Token};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{parse_address, parse_amount, parse_hash};
use crate::Result;

/// Database model for tokens table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbToken {
    /// Primary key: lower-case token address
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub creator: String,
    pub agent_id: Option<String>,
    pub tx_hash: Option<String>,
    pub migrated: bool,
    pub pool_address: Option<String>,
    /// uint256 as decimal string
    pub reserve_base: String,
    /// uint256 as decimal string
    pub reserve_quote: String,
    pub created_at: i64,
}

impl From<&Token> for DbToken {
    fn from(token: &Token) -> Self {
        Self {
            address: canonical_address(&token.address),
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            creator: canonical_address(&token.creator),
            agent_id: token.agent_id.clone(),
            tx_hash: token.tx_hash.as_ref().map(canonical_hash),
            migrated: token.migrated,
            pool_address: token.pool_address.as_ref().map(canonical_address),
            reserve_base: token.reserves.base.to_string(),
            reserve_quote: token.reserves.quote.to_string(),
            created_at: token.created_at as i64,
        }
    }
}

impl DbToken {
    pub fn into_token(self) -> Result<Token> {
        Ok(Token {
            address: parse_address(&self.address)?,
            name: self.name,
            symbol: self.symbol,
            creator: parse_address(&self.creator)?,
            agent_id: self.agent_id,
            tx_hash: self.tx_hash.as_deref().map(parse_hash).transpose()?,
            migrated: self.migrated,
            pool_address: self.pool_address.as_deref().map(parse_address).transpose()?,
            reserves: Reserves::new(
                parse_amount(&self.reserve_base)?,
                parse_amount(&self.reserve_quote)?,
            ),
            created_at: self.created_at.max(0) as u64,
        })
    }
}
