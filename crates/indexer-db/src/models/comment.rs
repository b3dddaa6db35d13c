use indexer_core::types::Comment;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::parse_address;
use crate::Result;

/// Database model for comments table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbComment {
    pub id: String,
    pub token_address: String,
    pub agent_id: String,
    pub author_address: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub created_at: i64,
}

impl DbComment {
    pub fn into_comment(self) -> Result<Comment> {
        Ok(Comment {
            id: self.id,
            token_address: parse_address(&self.token_address)?,
            agent_id: self.agent_id,
            author: parse_address(&self.author_address)?,
            content: self.content,
            parent_id: self.parent_id,
            created_at: self.created_at.max(0) as u64,
        })
    }
}
