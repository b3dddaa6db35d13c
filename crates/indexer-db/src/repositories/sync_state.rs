use crate::Result;
use sqlx::PgPool;

pub struct SyncStateRepository;

impl SyncStateRepository {
    /// Get the last confirmed block from DB (returns None if not found or 0)
    pub async fn get_last_synced_block(pool: &PgPool) -> Result<Option<u64>> {
        let result: Option<(i64,)> = sqlx::query_as(
            "SELECT last_synced_block FROM sync_state WHERE id = 'main'",
        )
        .fetch_optional(pool)
        .await?;

        match result {
            Some((block,)) if block > 0 => Ok(Some(block as u64)),
            _ => Ok(None),
        }
    }

    /// Update the last confirmed block
    pub async fn set_last_synced_block(pool: &PgPool, block: u64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_state (id, last_synced_block, updated_at)
            VALUES ('main', $1, NOW())
            ON CONFLICT (id) DO UPDATE SET
                last_synced_block = EXCLUDED.last_synced_block,
                updated_at = NOW()
            "#,
        )
        .bind(block as i64)
        .execute(pool)
        .await?;
        Ok(())
    }
}
