use crate::models::DbComment;
use crate::Result;
use sqlx::PgPool;

pub struct CommentRepository;

impl CommentRepository {
    /// Newest first
    pub async fn list_by_token(pool: &PgPool, token: &str, limit: i64) -> Result<Vec<DbComment>> {
        let results = sqlx::query_as::<_, DbComment>(
            "SELECT * FROM comments WHERE token_address = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(token)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(results)
    }
}
