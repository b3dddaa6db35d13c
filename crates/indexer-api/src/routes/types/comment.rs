use indexer_core::types::{canonical_address, iso_timestamp, Comment};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiComment {
    pub id: String,
    pub token_address: String,
    pub agent_id: String,
    pub author: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub created_at: String,
}

impl From<Comment> for ApiComment {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            token_address: canonical_address(&comment.token_address),
            agent_id: comment.agent_id,
            author: canonical_address(&comment.author),
            content: comment.content,
            parent_id: comment.parent_id,
            created_at: iso_timestamp(comment.created_at),
        }
    }
}
