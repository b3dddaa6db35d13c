use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use indexer_core::types::{Trade, TradeDirection, TradeKey};
use std::collections::HashMap;
use tracing::debug;

use crate::traits::TradeQuery;

/// Thread-safe store for trades
#[derive(Debug, Default)]
pub struct TradeStore {
    /// TradeKey (tx_hash + log_index) -> Trade
    trades: DashMap<TradeKey, Trade>,

    /// token -> Vec<TradeKey> (insertion order)
    token_trades: DashMap<Address, Vec<TradeKey>>,
}

impl TradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a trade (idempotent - duplicate keys are ignored)
    /// Returns true if trade was inserted, false if it already existed
    pub fn insert(&self, trade: Trade) -> bool {
        let key = trade.key;
        let token = trade.token;

        match self.trades.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                debug!(trade_id = %key.id(), "Trade already exists (duplicate), skipping insert");
                return false;
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(trade);
            }
        }

        self.token_trades.entry(token).or_default().push(key);

        debug!(
            trade_id = %key.id(),
            token = ?token,
            total_trades = self.trades.len(),
            "Trade stored in memory"
        );
        true
    }

    pub fn get(&self, key: &TradeKey) -> Option<Trade> {
        self.trades.get(key).map(|t| t.clone())
    }

    pub fn query(&self, query: &TradeQuery) -> Vec<Trade> {
        let candidates: Vec<Trade> = match query.token {
            Some(token) => self
                .token_trades
                .get(&token)
                .map(|keys| {
                    keys.iter()
                        .filter_map(|key| self.trades.get(key).map(|t| t.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            None => self.trades.iter().map(|e| e.value().clone()).collect(),
        };

        let mut matching: Vec<Trade> = candidates
            .into_iter()
            .filter(|t| query.trader.map_or(true, |trader| t.trader == trader))
            .filter(|t| query.direction.map_or(true, |d| t.direction == d))
            .filter(|t| query.before.map_or(true, |before| t.created_at < before))
            .collect();

        matching.sort_by(|a, b| {
            (b.created_at, b.block_number, b.key.log_index).cmp(&(
                a.created_at,
                a.block_number,
                a.key.log_index,
            ))
        });
        matching.truncate(query.page_size());
        matching
    }

    pub fn count(&self) -> usize {
        self.trades.len()
    }

    /// Count trades at or after `since`
    pub fn count_since(&self, since: u64) -> u64 {
        self.trades.iter().filter(|e| e.created_at >= since).count() as u64
    }

    /// Sum of BUY `amount_in` at or after `since`
    pub fn buy_volume_since(&self, since: u64) -> U256 {
        self.trades
            .iter()
            .filter(|e| e.direction == TradeDirection::Buy && e.created_at >= since)
            .fold(U256::ZERO, |acc, e| acc.saturating_add(e.amount_in))
    }

    /// BUY volume per token at or after `since`
    pub fn buy_volume_by_token(&self, since: u64) -> HashMap<Address, U256> {
        let mut volumes: HashMap<Address, U256> = HashMap::new();
        for e in self.trades.iter() {
            if e.direction == TradeDirection::Buy && e.created_at >= since {
                let entry = volumes.entry(e.token).or_default();
                *entry = entry.saturating_add(e.amount_in);
            }
        }
        volumes
    }
}
