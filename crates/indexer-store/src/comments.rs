use alloy_primitives::Address;
use dashmap::DashMap;
use indexer_core::types::Comment;

/// Comments grouped by token, written only by external actions
#[derive(Debug, Default)]
pub struct CommentStore {
    by_token: DashMap<Address, Vec<Comment>>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, comment: Comment) {
        self.by_token
            .entry(comment.token_address)
            .or_default()
            .push(comment);
    }

    /// Newest first
    pub fn for_token(&self, token: &Address, limit: usize) -> Vec<Comment> {
        let mut comments = self
            .by_token
            .get(token)
            .map(|c| c.clone())
            .unwrap_or_default();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments.truncate(limit);
        comments
    }
}
