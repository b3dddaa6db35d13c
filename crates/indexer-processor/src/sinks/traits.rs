use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use indexer_core::types::{DomainEvent, Token, Trade};
use indexer_core::Result;

/// State changes emitted after a successful mirror write
#[derive(Debug, Clone)]
pub enum SinkEvent {
    TokenCreated(Token),
    TradeRecorded {
        token: Token,
        trade: Trade,
    },
    TokenGraduated {
        token: Token,
        pool: Address,
        tx_hash: B256,
        timestamp: u64,
    },
}

impl SinkEvent {
    pub fn to_domain_event(&self) -> DomainEvent {
        match self {
            SinkEvent::TokenCreated(token) => DomainEvent::deploy(token),
            SinkEvent::TradeRecorded { token, trade } => DomainEvent::trade(token, trade),
            SinkEvent::TokenGraduated {
                token,
                pool,
                tx_hash,
                timestamp,
            } => DomainEvent::graduate(token, *pool, *tx_hash, *timestamp),
        }
    }
}

/// Downstream consumer of applied state changes
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn handle_event(&self, event: SinkEvent) -> Result<()>;

    fn name(&self) -> &'static str;
}
