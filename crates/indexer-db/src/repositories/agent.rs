use crate::Result;
use sqlx::PgPool;

pub struct AgentRepository;

impl AgentRepository {
    /// Agent id for a custody wallet (case-insensitive)
    pub async fn id_by_wallet(pool: &PgPool, wallet: &str) -> Result<Option<String>> {
        let result: Option<(String,)> =
            sqlx::query_as("SELECT id FROM agents WHERE LOWER(wallet_address) = LOWER($1)")
                .bind(wallet)
                .fetch_optional(pool)
                .await?;
        Ok(result.map(|(id,)| id))
    }
}
