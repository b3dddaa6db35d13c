use alloy_primitives::Address;

/// Upper bound on comment content, in characters
pub const MAX_COMMENT_LEN: usize = 500;

/// Agent comment on a token. Never written by chain events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub token_address: Address,
    pub agent_id: String,
    pub author: Address,
    pub content: String,
    /// Parent comment for replies
    pub parent_id: Option<String>,
    pub created_at: u64,
}
