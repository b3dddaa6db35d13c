use alloy_primitives::Address;
use indexer_core::types::ReserveUpdate;
use indexer_core::{ChainEvent, EventPayload, IndexerError, Result};
use indexer_store::MirrorStore;
use std::sync::Arc;
use tracing::{info, warn};

use super::Applied;

pub struct GraduatedHandler {
    store: Arc<dyn MirrorStore>,
}

impl GraduatedHandler {
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        Self { store }
    }

    /// Latch the migration flag and record the pool
    pub async fn handle(&self, event: &ChainEvent) -> Result<Applied<Address>> {
        let EventPayload::Graduated { token, pool, .. } = &event.payload else {
            return Err(IndexerError::EventDecode("expected TokenGraduated".to_string()));
        };

        let Some(mut existing) = self.store.get_token(token).await? else {
            warn!(token = ?token, block = event.meta.block_number, "Graduation for unknown token, skipping");
            return Ok(Applied::unknown());
        };

        let update = ReserveUpdate {
            token: *token,
            reserves: existing.reserves,
            migrated: true,
            pool: Some(*pool),
        };
        if !self.store.apply_reserve_update(update).await? {
            return Ok(Applied::duplicate());
        }
        existing.apply(&update);

        info!(token = ?token, pool = ?pool, block = event.meta.block_number, "Token graduated");

        Ok(Applied::changed(existing, Some(*pool)))
    }
}
