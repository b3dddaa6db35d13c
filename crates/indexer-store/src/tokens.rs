use alloy_primitives::Address;
use dashmap::DashMap;
use indexer_core::types::{ReserveUpdate, Token};
use tracing::debug;

use crate::traits::TokenQuery;

/// Thread-safe store for tokens
#[derive(Debug, Default)]
pub struct TokenStore {
    /// Token address -> Token
    tokens: DashMap<Address, Token>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token (idempotent - existing rows are never overwritten)
    /// Returns true if token was inserted, false if it already existed
    pub fn insert(&self, token: Token) -> bool {
        let address = token.address;
        match self.tokens.entry(address) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                debug!(token = ?address, "Token already exists (duplicate), skipping insert");
                false
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(token);
                debug!(token = ?address, total_tokens = self.tokens.len(), "Token stored in memory");
                true
            }
        }
    }

    pub fn get(&self, address: &Address) -> Option<Token> {
        self.tokens.get(address).map(|t| t.clone())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.tokens.contains_key(address)
    }

    /// Apply a reserve update. Returns true if the row changed.
    pub fn apply_update(&self, update: &ReserveUpdate) -> bool {
        self.tokens
            .get_mut(&update.token)
            .map(|mut token| token.apply(update))
            .unwrap_or(false)
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.tokens.iter().map(|e| *e.key()).collect()
    }

    pub fn query(&self, query: &TokenQuery) -> Vec<Token> {
        let mut matching: Vec<Token> = self
            .tokens
            .iter()
            .filter(|e| query.creator.map_or(true, |c| e.creator == c))
            .filter(|e| {
                query
                    .agent_id
                    .as_ref()
                    .map_or(true, |a| e.agent_id.as_ref() == Some(a))
            })
            .map(|e| e.value().clone())
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.address.cmp(&b.address))
        });
        matching
            .into_iter()
            .skip(query.offset)
            .take(query.page_size())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    pub fn migrated_count(&self) -> usize {
        self.tokens.iter().filter(|e| e.migrated).count()
    }
}
