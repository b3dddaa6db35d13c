use alloy_primitives::Address;
use std::collections::HashSet;

/// Counters surfaced on the status endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilerStats {
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

/// Explicit reconciler state, passed into every tick.
///
/// Persisted through `MirrorStore::save_checkpoint`; the watch set is
/// rebuilt from the store on startup.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerState {
    /// Last block whose events were fully applied. `None` before bootstrap.
    pub last_confirmed_block: Option<u64>,

    /// Tokens known locally
    pub watched_tokens: HashSet<Address>,

    pub stats: ReconcilerStats,
}

impl ReconcilerState {
    pub fn new(last_confirmed_block: Option<u64>, watched: impl IntoIterator<Item = Address>) -> Self {
        Self {
            last_confirmed_block,
            watched_tokens: watched.into_iter().collect(),
            stats: ReconcilerStats::default(),
        }
    }

    /// Advance the watermark. Never moves backwards.
    pub fn confirm(&mut self, block: u64) {
        self.last_confirmed_block = Some(self.last_confirmed_block.map_or(block, |b| b.max(block)));
        self.stats.ticks_completed += 1;
    }

    pub fn watch(&mut self, token: Address) -> bool {
        self.watched_tokens.insert(token)
    }

    pub fn is_watched(&self, token: &Address) -> bool {
        self.watched_tokens.contains(token)
    }
}
