use alloy::rpc::types::Log;
use alloy_primitives::Address;
use indexer_core::types::{now_secs, Trade};
use indexer_core::{apply_order, ChainEvent, EventDecoder, EventPayload, LogKind, Result};
use indexer_store::{AgentResolver, MirrorStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::handlers::{ApplyOutcome, GraduatedHandler, TokenCreatedHandler, TradeHandler};
use crate::sinks::{CompositeSink, SinkEvent};

/// Totals for one applied window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSummary {
    pub applied: u64,
    /// Newly inserted trades, a subset of `applied`
    pub trades: u64,
    pub duplicates: u64,
    pub unknown_tokens: u64,
    /// Newly applied trades that disagreed with the prior mirrored reserves
    pub curve_discrepancies: u64,
    /// Tokens whose creation event is in this window, including ones
    /// already mirrored by an earlier attempt or a deploy action
    pub created: Vec<Address>,
    /// Known tokens touched by a trade or graduation
    pub touched: BTreeSet<Address>,
}

/// Applies decoded events to the mirror and emits one sink event per change
pub struct EventProcessor {
    store: Arc<dyn MirrorStore>,

    // Handlers
    token_created: TokenCreatedHandler,
    trades: TradeHandler,
    graduated: GraduatedHandler,

    sinks: Arc<RwLock<CompositeSink>>,
}

impl EventProcessor {
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        let resolver = AgentResolver::new(store.clone());
        Self {
            token_created: TokenCreatedHandler::new(store.clone(), resolver.clone()),
            trades: TradeHandler::new(store.clone(), resolver),
            graduated: GraduatedHandler::new(store.clone()),
            store,
            sinks: Arc::new(RwLock::new(CompositeSink::new())),
        }
    }

    /// Set the composite sink
    pub async fn set_sinks(&self, sinks: CompositeSink) {
        let mut s = self.sinks.write().await;
        *s = sinks;
    }

    /// Get reference to the store
    pub fn store(&self) -> &Arc<dyn MirrorStore> {
        &self.store
    }

    /// Apply a single event. Store failures propagate; everything else
    /// (duplicates, unknown tokens) is an outcome.
    pub async fn process_event(&self, event: &ChainEvent) -> Result<ApplyOutcome> {
        Ok(self.apply(event).await?.0)
    }

    /// Outcome plus the number of curve discrepancies reported
    async fn apply(&self, event: &ChainEvent) -> Result<(ApplyOutcome, usize)> {
        let start = Instant::now();
        let kind = event.payload.kind();
        let mut discrepancies = 0;

        let (outcome, sink_event) = match &event.payload {
            EventPayload::Created { .. } => {
                let applied = self.token_created.handle(event).await?;
                let sink_event = applied.token.map(SinkEvent::TokenCreated);
                if sink_event.is_some() {
                    indexer_metrics::counters::tokens_indexed(1);
                }
                (applied.outcome, sink_event)
            }
            EventPayload::Purchased { .. } | EventPayload::Sold { .. } => {
                let applied = self.trades.handle(event, None).await?;
                discrepancies = applied.discrepancies;
                let sink_event = match (applied.token, applied.detail) {
                    (Some(token), Some(trade)) => {
                        indexer_metrics::counters::trades_indexed(1);
                        Some(SinkEvent::TradeRecorded { token, trade })
                    }
                    _ => None,
                };
                (applied.outcome, sink_event)
            }
            EventPayload::Graduated { .. } => {
                let applied = self.graduated.handle(event).await?;
                let sink_event = match (applied.token, applied.detail) {
                    (Some(token), Some(pool)) => Some(SinkEvent::TokenGraduated {
                        token,
                        pool,
                        tx_hash: event.meta.tx_hash,
                        timestamp: event.meta.block_timestamp.unwrap_or_else(now_secs),
                    }),
                    _ => None,
                };
                (applied.outcome, sink_event)
            }
        };

        match outcome {
            ApplyOutcome::Applied => indexer_metrics::counters::events_applied(1, kind.as_str()),
            ApplyOutcome::Duplicate => indexer_metrics::counters::duplicate_events(1),
            ApplyOutcome::UnknownToken => indexer_metrics::counters::errors(1, "unknown_token"),
        }
        indexer_metrics::histograms::event_apply_duration(start.elapsed(), kind.as_str());

        if let Some(sink_event) = sink_event {
            self.emit_to_sinks(sink_event).await;
        }

        debug!(
            kind = kind.as_str(),
            block = event.meta.block_number,
            log_index = event.meta.log_index,
            outcome = ?outcome,
            apply_us = start.elapsed().as_micros(),
            "Processed event"
        );

        Ok((outcome, discrepancies))
    }

    /// Apply a window in causal order. Stops at the first store failure,
    /// leaving the remainder for the retried window.
    pub async fn process_window(&self, mut events: Vec<ChainEvent>) -> Result<WindowSummary> {
        apply_order(&mut events);

        let mut summary = WindowSummary::default();
        for event in &events {
            let (outcome, discrepancies) = self.apply(event).await?;
            let token = event.payload.token();
            summary.curve_discrepancies += discrepancies as u64;

            match outcome {
                ApplyOutcome::Applied => summary.applied += 1,
                ApplyOutcome::Duplicate => summary.duplicates += 1,
                ApplyOutcome::UnknownToken => {
                    summary.unknown_tokens += 1;
                    continue;
                }
            }

            match event.payload.kind() {
                LogKind::Created => {
                    summary.created.push(token);
                    continue;
                }
                LogKind::Purchased | LogKind::Sold if outcome == ApplyOutcome::Applied => {
                    summary.trades += 1;
                }
                _ => {}
            }
            summary.touched.insert(token);
        }

        Ok(summary)
    }

    /// Mirror a trade executed on behalf of an agent from its confirmed
    /// receipt logs. Uses the same trade key as the reconciler, so the
    /// later replay of these logs is a no-op.
    pub async fn record_executed_trade(
        &self,
        decoder: &EventDecoder,
        logs: &[Log],
        agent_id: &str,
    ) -> Result<Vec<Trade>> {
        let mut recorded = Vec::new();

        for event in decoder.decode_all(logs) {
            if !matches!(
                event.payload,
                EventPayload::Purchased { .. } | EventPayload::Sold { .. }
            ) {
                continue;
            }

            let applied = self.trades.handle(&event, Some(agent_id)).await?;
            match (applied.outcome, applied.token, applied.detail) {
                (ApplyOutcome::Applied, Some(token), Some(trade)) => {
                    indexer_metrics::counters::trades_indexed(1);
                    self.emit_to_sinks(SinkEvent::TradeRecorded {
                        token,
                        trade: trade.clone(),
                    })
                    .await;
                    recorded.push(trade);
                }
                (ApplyOutcome::UnknownToken, _, _) => {
                    warn!(agent = agent_id, tx_hash = ?event.meta.tx_hash, "Executed trade for unknown token");
                }
                _ => {}
            }
        }

        if !recorded.is_empty() {
            info!(agent = agent_id, trades = recorded.len(), "Recorded agent-executed trades");
        }
        Ok(recorded)
    }

    /// Emit event to all configured sinks
    async fn emit_to_sinks(&self, event: SinkEvent) {
        let sinks = self.sinks.read().await;
        if !sinks.is_empty() {
            sinks.emit(event).await;
        }
    }
}
