use indexer_core::curve::initial_reserves;
use indexer_core::types::{now_secs, Token};
use indexer_core::{ChainEvent, EventPayload, IndexerError, Result};
use indexer_store::{AgentResolver, MirrorStore};
use std::sync::Arc;
use tracing::{debug, info};

use super::Applied;

pub struct TokenCreatedHandler {
    store: Arc<dyn MirrorStore>,
    resolver: AgentResolver,
}

impl TokenCreatedHandler {
    pub fn new(store: Arc<dyn MirrorStore>, resolver: AgentResolver) -> Self {
        Self { store, resolver }
    }

    pub async fn handle(&self, event: &ChainEvent) -> Result<Applied<()>> {
        let EventPayload::Created {
            token,
            creator,
            name,
            symbol,
            timestamp,
        } = &event.payload
        else {
            return Err(IndexerError::EventDecode("expected TokenCreated".to_string()));
        };

        let created_at = Some(*timestamp)
            .filter(|t| *t > 0)
            .or(event.meta.block_timestamp)
            .unwrap_or_else(now_secs);

        let row = Token {
            address: *token,
            name: name.clone(),
            symbol: symbol.clone(),
            creator: *creator,
            agent_id: self.resolver.resolve(creator).await,
            tx_hash: Some(event.meta.tx_hash),
            migrated: false,
            pool_address: None,
            reserves: initial_reserves(),
            created_at,
        };

        // Insert is idempotent - returns false if the deploy path or a
        // previous pass already created the row
        if !self.store.upsert_token_on_create(row.clone()).await? {
            debug!(token = ?token, symbol = %symbol, "Token already mirrored");
            return Ok(Applied::duplicate());
        }

        info!(
            token = ?token,
            symbol = %symbol,
            creator = ?creator,
            agent = ?row.agent_id,
            block = event.meta.block_number,
            "Token created"
        );

        Ok(Applied::changed(row, None))
    }
}
