use alloy_primitives::Address;
use async_trait::async_trait;
use indexer_core::types::{Comment, ReserveUpdate, StatsTotals, Token, Trade, TradeDirection};
use indexer_core::Result;

/// Hard ceiling on page sizes for list queries
pub const MAX_PAGE_SIZE: usize = 100;

/// Filter for token listings, newest first
#[derive(Debug, Clone, Default)]
pub struct TokenQuery {
    pub limit: usize,
    pub offset: usize,
    pub creator: Option<Address>,
    pub agent_id: Option<String>,
}

/// Filter for trade listings, newest first
#[derive(Debug, Clone, Default)]
pub struct TradeQuery {
    pub limit: usize,
    pub token: Option<Address>,
    pub trader: Option<Address>,
    pub direction: Option<TradeDirection>,
    /// Only trades strictly older than this unix timestamp
    pub before: Option<u64>,
}

impl TokenQuery {
    pub fn page_size(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

impl TradeQuery {
    pub fn page_size(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Reconciled local state.
///
/// Every write is keyed by natural identity and idempotent, so replaying
/// a block window after a failure never duplicates rows.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Insert if absent. An existing row is left untouched.
    /// Returns true if the row was inserted.
    async fn upsert_token_on_create(&self, token: Token) -> Result<bool>;

    /// Insert if the trade key is absent. Returns true if inserted.
    async fn record_trade(&self, trade: Trade) -> Result<bool>;

    /// Overwrite mirrored reserves; `migrated` only ever latches to true.
    /// Returns true if an existing row changed.
    async fn apply_reserve_update(&self, update: ReserveUpdate) -> Result<bool>;

    async fn get_token(&self, address: &Address) -> Result<Option<Token>>;

    async fn list_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>>;

    async fn list_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>>;

    async fn list_comments(&self, token: &Address, limit: usize) -> Result<Vec<Comment>>;

    /// Agent id owning the given custody wallet
    async fn agent_by_wallet(&self, wallet: &Address) -> Result<Option<String>>;

    async fn known_token_addresses(&self) -> Result<Vec<Address>>;

    /// Last fully applied block, if any
    async fn load_checkpoint(&self) -> Result<Option<u64>>;

    async fn save_checkpoint(&self, block: u64) -> Result<()>;

    /// Raw aggregate figures relative to `now` (unix seconds)
    async fn stats_totals(&self, now: u64) -> Result<StatsTotals>;

    /// Whether the backing storage currently answers
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
