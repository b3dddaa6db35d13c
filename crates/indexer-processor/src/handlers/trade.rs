use alloy_primitives::U256;
use indexer_core::curve::check_trade;
use indexer_core::types::{now_secs, ReserveUpdate, Reserves, Trade, TradeDirection};
use indexer_core::{ChainEvent, EventPayload, IndexerError, Result};
use indexer_store::{AgentResolver, MirrorStore};
use std::sync::Arc;
use tracing::{debug, warn};

use super::Applied;

/// Applies TokensPurchased / TokensSold
pub struct TradeHandler {
    store: Arc<dyn MirrorStore>,
    resolver: AgentResolver,
}

impl TradeHandler {
    pub fn new(store: Arc<dyn MirrorStore>, resolver: AgentResolver) -> Self {
        Self { store, resolver }
    }

    /// `agent_override` attributes the trade without a wallet lookup
    /// (agent-initiated trades that already know who executed them).
    pub async fn handle(
        &self,
        event: &ChainEvent,
        agent_override: Option<&str>,
    ) -> Result<Applied<Trade>> {
        let (token, trader, direction, amount_in, amount_out, fee, reserves) = match &event.payload
        {
            EventPayload::Purchased {
                token,
                buyer,
                eth_in,
                tokens_out,
                fee,
                new_reserve_base,
                new_reserve_quote,
            } => (
                *token,
                *buyer,
                TradeDirection::Buy,
                *eth_in,
                *tokens_out,
                *fee,
                Reserves::new(*new_reserve_base, *new_reserve_quote),
            ),
            EventPayload::Sold {
                token,
                seller,
                tokens_in,
                eth_out,
                new_reserve_base,
                new_reserve_quote,
            } => (
                *token,
                *seller,
                TradeDirection::Sell,
                *tokens_in,
                *eth_out,
                U256::ZERO,
                Reserves::new(*new_reserve_base, *new_reserve_quote),
            ),
            _ => return Err(IndexerError::EventDecode("expected trade event".to_string())),
        };

        let Some(existing) = self.store.get_token(&token).await? else {
            warn!(
                token = ?token,
                block = event.meta.block_number,
                log_index = event.meta.log_index,
                "Trade for unknown token, skipping"
            );
            return Ok(Applied::unknown());
        };

        let agent_id = match agent_override {
            Some(agent) => Some(agent.to_string()),
            None => self.resolver.resolve(&trader).await,
        };

        let trade = Trade {
            key: event.meta.trade_key(),
            token,
            agent_id,
            trader,
            direction,
            amount_in,
            amount_out,
            fee,
            created_at: event.meta.block_timestamp.unwrap_or_else(now_secs),
            block_number: event.meta.block_number,
        };

        let inserted = self.store.record_trade(trade.clone()).await?;

        // Reserves are an overwrite, so re-applying on replay is harmless and
        // repairs a pass that failed between the two writes
        self.store
            .apply_reserve_update(ReserveUpdate {
                token,
                reserves,
                migrated: false,
                pool: None,
            })
            .await?;

        if !inserted {
            debug!(trade_id = %trade.id(), "Trade already mirrored");
            return Ok(Applied::duplicate());
        }

        // Compared against the reserves mirrored before this trade's write
        let discrepancies = check_trade(&existing.reserves, &event.payload);
        for discrepancy in &discrepancies {
            warn!(
                token = ?token,
                tx_hash = ?event.meta.tx_hash,
                discrepancy = %discrepancy,
                "Trade disagrees with mirrored curve state"
            );
        }

        let mut token_row = existing;
        token_row.reserves = reserves;

        debug!(
            trade_id = %trade.id(),
            token = ?token,
            direction = %direction,
            amount_in = %amount_in,
            amount_out = %amount_out,
            agent = ?trade.agent_id,
            "Trade recorded"
        );

        if !discrepancies.is_empty() {
            indexer_metrics::counters::curve_discrepancies(discrepancies.len() as u64);
        }

        let mut applied = Applied::changed(token_row, Some(trade));
        applied.discrepancies = discrepancies.len();
        Ok(applied)
    }
}
