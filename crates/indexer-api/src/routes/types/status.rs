use indexer_sync::ReconcilerStatus;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReconcilerStats {
    pub ticks_completed: u64,
    pub ticks_failed: u64,
    pub events_applied: u64,
    pub tokens_indexed: u64,
    pub trades_indexed: u64,
    pub duplicates_skipped: u64,
    pub unknown_token_events: u64,
    pub stale_reserve_reads: u64,
    pub curve_discrepancies: u64,
}

/// Reconciler and push-channel health
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    /// False when chain configuration is missing
    pub indexer_enabled: bool,
    pub chain_id: Option<u64>,
    pub phase: &'static str,
    pub last_confirmed_block: Option<u64>,
    pub chain_head: Option<u64>,
    pub watched_tokens: usize,
    pub subscribers: usize,
    /// Mirror storage answered a health check for this request
    pub store_healthy: bool,
    pub last_error: Option<String>,
    pub stats: Option<ApiReconcilerStats>,
}

impl ApiStatus {
    pub fn disabled(subscribers: usize, store_healthy: bool) -> Self {
        Self {
            indexer_enabled: false,
            chain_id: None,
            phase: "disabled",
            last_confirmed_block: None,
            chain_head: None,
            watched_tokens: 0,
            subscribers,
            store_healthy,
            last_error: None,
            stats: None,
        }
    }

    pub fn from_reconciler(
        status: ReconcilerStatus,
        chain_id: Option<u64>,
        subscribers: usize,
        store_healthy: bool,
    ) -> Self {
        let stats = status.stats;
        Self {
            indexer_enabled: true,
            chain_id,
            phase: status.phase.as_str(),
            last_confirmed_block: status.last_confirmed_block,
            chain_head: status.chain_head,
            watched_tokens: status.watched_tokens,
            subscribers,
            store_healthy,
            last_error: status.last_error,
            stats: Some(ApiReconcilerStats {
                ticks_completed: stats.ticks_completed,
                ticks_failed: stats.ticks_failed,
                events_applied: stats.events_applied,
                tokens_indexed: stats.tokens_indexed,
                trades_indexed: stats.trades_indexed,
                duplicates_skipped: stats.duplicates_skipped,
                unknown_token_events: stats.unknown_token_events,
                stale_reserve_reads: stats.stale_reserve_reads,
                curve_discrepancies: stats.curve_discrepancies,
            }),
        }
    }
}
