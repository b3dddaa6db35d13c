use serde::Serialize;

use super::{canonical_address, canonical_hash, format_ether, iso_timestamp, Token, Trade, TradeDirection};
use alloy_primitives::{Address, B256};

/// Token summary carried in pushed events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRef {
    pub address: String,
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

impl TokenRef {
    pub fn from_token(token: &Token) -> Self {
        Self {
            address: canonical_address(&token.address),
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            creator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployNotice {
    pub token: TokenRef,
    pub ts: String,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeNotice {
    pub token: TokenRef,
    pub trader: String,
    pub agent_id: Option<String>,
    /// ETH leg, full precision ("0.5")
    pub amount_eth: String,
    pub ts: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraduationNotice {
    pub token: TokenRef,
    pub pool: String,
    pub ts: String,
    pub tx_hash: String,
}

/// One applied on-chain state change, as pushed to live clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DomainEvent {
    Deploy(DeployNotice),
    Buy(TradeNotice),
    Sell(TradeNotice),
    Graduate(GraduationNotice),
}

impl DomainEvent {
    pub fn deploy(token: &Token) -> Self {
        let mut token_ref = TokenRef::from_token(token);
        token_ref.creator = Some(canonical_address(&token.creator));

        DomainEvent::Deploy(DeployNotice {
            token: token_ref,
            ts: iso_timestamp(token.created_at),
            tx_hash: token.tx_hash.as_ref().map(canonical_hash),
        })
    }

    pub fn trade(token: &Token, trade: &Trade) -> Self {
        let notice = TradeNotice {
            token: TokenRef::from_token(token),
            trader: canonical_address(&trade.trader),
            agent_id: trade.agent_id.clone(),
            amount_eth: format_ether(trade.eth_amount()),
            ts: iso_timestamp(trade.created_at),
            tx_hash: canonical_hash(&trade.key.tx_hash),
        };
        match trade.direction {
            TradeDirection::Buy => DomainEvent::Buy(notice),
            TradeDirection::Sell => DomainEvent::Sell(notice),
        }
    }

    pub fn graduate(token: &Token, pool: Address, tx_hash: B256, ts: u64) -> Self {
        DomainEvent::Graduate(GraduationNotice {
            token: TokenRef::from_token(token),
            pool: canonical_address(&pool),
            ts: iso_timestamp(ts),
            tx_hash: canonical_hash(&tx_hash),
        })
    }

    /// Wire tag ("deploy", "buy", "sell", "graduate")
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::Deploy(_) => "deploy",
            DomainEvent::Buy(_) => "buy",
            DomainEvent::Sell(_) => "sell",
            DomainEvent::Graduate(_) => "graduate",
        }
    }
}
