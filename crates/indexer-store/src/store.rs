use alloy_primitives::Address;
use async_trait::async_trait;
use indexer_core::types::{
    Comment, ReserveUpdate, StatsTotals, Token, TopTokenVolume, Trade,
};
use indexer_core::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::agents::AgentStore;
use crate::comments::CommentStore;
use crate::tokens::TokenStore;
use crate::trades::TradeStore;
use crate::traits::{MirrorStore, TokenQuery, TradeQuery};

const DAY_SECS: u64 = 86_400;
const HOUR_SECS: u64 = 3_600;

/// Sentinel for "no checkpoint yet"
const NO_CHECKPOINT: u64 = u64::MAX;

/// Thread-safe in-memory mirror, used when no database is configured
#[derive(Debug)]
pub struct InMemoryStore {
    pub tokens: Arc<TokenStore>,
    pub trades: Arc<TradeStore>,
    pub agents: Arc<AgentStore>,
    pub comments: Arc<CommentStore>,
    checkpoint: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(TokenStore::new()),
            trades: Arc::new(TradeStore::new()),
            agents: Arc::new(AgentStore::new()),
            comments: Arc::new(CommentStore::new()),
            checkpoint: AtomicU64::new(NO_CHECKPOINT),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MirrorStore for InMemoryStore {
    async fn upsert_token_on_create(&self, token: Token) -> Result<bool> {
        Ok(self.tokens.insert(token))
    }

    async fn record_trade(&self, trade: Trade) -> Result<bool> {
        Ok(self.trades.insert(trade))
    }

    async fn apply_reserve_update(&self, update: ReserveUpdate) -> Result<bool> {
        Ok(self.tokens.apply_update(&update))
    }

    async fn get_token(&self, address: &Address) -> Result<Option<Token>> {
        Ok(self.tokens.get(address))
    }

    async fn list_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>> {
        Ok(self.tokens.query(query))
    }

    async fn list_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
        Ok(self.trades.query(query))
    }

    async fn list_comments(&self, token: &Address, limit: usize) -> Result<Vec<Comment>> {
        Ok(self.comments.for_token(token, limit))
    }

    async fn agent_by_wallet(&self, wallet: &Address) -> Result<Option<String>> {
        Ok(self.agents.id_by_wallet(wallet))
    }

    async fn known_token_addresses(&self) -> Result<Vec<Address>> {
        Ok(self.tokens.addresses())
    }

    async fn load_checkpoint(&self) -> Result<Option<u64>> {
        let block = self.checkpoint.load(Ordering::Acquire);
        Ok((block != NO_CHECKPOINT).then_some(block))
    }

    async fn save_checkpoint(&self, block: u64) -> Result<()> {
        self.checkpoint.store(block, Ordering::Release);
        Ok(())
    }

    async fn stats_totals(&self, now: u64) -> Result<StatsTotals> {
        let day_ago = now.saturating_sub(DAY_SECS);

        let top_token = self
            .trades
            .buy_volume_by_token(day_ago)
            .into_iter()
            .filter_map(|(address, volume)| self.tokens.get(&address).map(|t| (t, volume)))
            .max_by(|(a, va), (b, vb)| va.cmp(vb).then_with(|| b.address.cmp(&a.address)))
            .map(|(token, vol_24h)| TopTokenVolume {
                address: token.address,
                symbol: token.symbol,
                name: token.name,
                vol_24h,
            });

        Ok(StatsTotals {
            total_tokens: self.tokens.count() as u64,
            total_agents: self.agents.count() as u64,
            total_trades: self.trades.count() as u64,
            graduated: self.tokens.migrated_count() as u64,
            vol_all: self.trades.buy_volume_since(0),
            vol_24h: self.trades.buy_volume_since(day_ago),
            trades_24h: self.trades.count_since(day_ago),
            trades_last_hour: self.trades.count_since(now.saturating_sub(HOUR_SECS)),
            top_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};
    use indexer_core::types::{Agent, Reserves, TradeDirection, TradeKey};

    fn token(byte: u8, created_at: u64) -> Token {
        Token {
            address: Address::repeat_byte(byte),
            name: format!("Token {}", byte),
            symbol: format!("T{}", byte),
            creator: Address::repeat_byte(0xc0),
            agent_id: None,
            tx_hash: None,
            migrated: false,
            pool_address: None,
            reserves: Reserves::default(),
            created_at,
        }
    }

    fn trade(token: u8, log_index: u64, direction: TradeDirection, amount_in: u64, at: u64) -> Trade {
        Trade {
            key: TradeKey::new(B256::repeat_byte(token), log_index),
            token: Address::repeat_byte(token),
            agent_id: None,
            trader: Address::repeat_byte(0xdd),
            direction,
            amount_in: U256::from(amount_in),
            amount_out: U256::from(1u64),
            fee: U256::ZERO,
            created_at: at,
            block_number: log_index,
        }
    }

    #[tokio::test]
    async fn test_token_insert_is_idempotent() {
        let store = InMemoryStore::new();
        assert!(store.upsert_token_on_create(token(1, 10)).await.unwrap());

        let mut renamed = token(1, 20);
        renamed.name = "Other".to_string();
        assert!(!store.upsert_token_on_create(renamed).await.unwrap());

        let stored = store.get_token(&Address::repeat_byte(1)).await.unwrap().unwrap();
        assert_eq!(stored.name, "Token 1");
        assert_eq!(stored.created_at, 10);
        assert_eq!(store.known_token_addresses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_trade_insert_is_idempotent() {
        let store = InMemoryStore::new();
        let t = trade(1, 0, TradeDirection::Buy, 500, 0);
        assert!(store.record_trade(t.clone()).await.unwrap());
        assert!(!store.record_trade(t).await.unwrap());
        assert_eq!(store.trades.count(), 1);
    }

    #[tokio::test]
    async fn test_reserve_update_on_unknown_token_is_noop() {
        let store = InMemoryStore::new();
        let changed = store
            .apply_reserve_update(ReserveUpdate {
                token: Address::repeat_byte(9),
                reserves: Reserves::default(),
                migrated: true,
                pool: None,
            })
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_checkpoint_round_trip() {
        let store = InMemoryStore::new();
        assert_eq!(store.load_checkpoint().await.unwrap(), None);
        store.save_checkpoint(1234).await.unwrap();
        assert_eq!(store.load_checkpoint().await.unwrap(), Some(1234));
    }

    #[tokio::test]
    async fn test_list_trades_filters_and_orders() {
        let store = InMemoryStore::new();
        store.record_trade(trade(1, 0, TradeDirection::Buy, 1, 100)).await.unwrap();
        store.record_trade(trade(1, 1, TradeDirection::Sell, 1, 200)).await.unwrap();
        store.record_trade(trade(2, 0, TradeDirection::Buy, 1, 300)).await.unwrap();

        let all = store
            .list_trades(&TradeQuery { limit: 10, ..Default::default() })
            .await
            .unwrap();
        let times: Vec<_> = all.iter().map(|t| t.created_at).collect();
        assert_eq!(times, vec![300, 200, 100]);

        let buys_for_one = store
            .list_trades(&TradeQuery {
                limit: 10,
                token: Some(Address::repeat_byte(1)),
                direction: Some(TradeDirection::Buy),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(buys_for_one.len(), 1);

        let older = store
            .list_trades(&TradeQuery { limit: 10, before: Some(200), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(older.len(), 1);
    }

    #[tokio::test]
    async fn test_list_tokens_paginates_newest_first() {
        let store = InMemoryStore::new();
        for (byte, at) in [(1u8, 10u64), (2, 30), (3, 20)] {
            store.upsert_token_on_create(token(byte, at)).await.unwrap();
        }
        let page = store
            .list_tokens(&TokenQuery { limit: 2, offset: 1, ..Default::default() })
            .await
            .unwrap();
        let symbols: Vec<_> = page.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["T3", "T1"]);
    }

    #[tokio::test]
    async fn test_stats_totals() {
        let store = InMemoryStore::new();
        let now = 1_000_000;
        store.upsert_token_on_create(token(1, 0)).await.unwrap();
        store.upsert_token_on_create(token(2, 0)).await.unwrap();
        store.agents.insert(Agent {
            id: "agent-1".into(),
            name: "bot".into(),
            description: None,
            wallet_address: Address::repeat_byte(0xaa),
            created_at: 0,
        });

        store.record_trade(trade(1, 0, TradeDirection::Buy, 100, now - 10)).await.unwrap();
        store.record_trade(trade(2, 0, TradeDirection::Buy, 300, now - 7_200)).await.unwrap();
        store.record_trade(trade(2, 1, TradeDirection::Sell, 999, now - 10)).await.unwrap();
        store.record_trade(trade(1, 1, TradeDirection::Buy, 1_000, now - 2 * DAY_SECS)).await.unwrap();

        let totals = store.stats_totals(now).await.unwrap();
        assert_eq!(totals.total_tokens, 2);
        assert_eq!(totals.total_agents, 1);
        assert_eq!(totals.total_trades, 4);
        assert_eq!(totals.vol_all, U256::from(1_400u64));
        assert_eq!(totals.vol_24h, U256::from(400u64));
        assert_eq!(totals.trades_24h, 3);
        assert_eq!(totals.trades_last_hour, 2);

        let top = totals.top_token.unwrap();
        assert_eq!(top.address, Address::repeat_byte(2));
        assert_eq!(top.vol_24h, U256::from(300u64));
    }
}
