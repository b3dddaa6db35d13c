use crate::models::DbTrade;
use crate::Result;
use sqlx::PgPool;

/// Optional filters for listing trades
#[derive(Debug, Default)]
pub struct TradeFilter<'a> {
    pub token_address: Option<&'a str>,
    pub trader_address: Option<&'a str>,
    pub direction: Option<&'a str>,
    pub before: Option<i64>,
    pub limit: i64,
}

pub struct TradeRepository;

impl TradeRepository {
    /// Insert trade (idempotent - ignores duplicates)
    pub async fn insert(pool: &PgPool, trade: &DbTrade) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO trades (id, token_address, agent_id, trader_address, direction,
                                amount_in, amount_out, fee, tx_hash, log_index, block_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.token_address)
        .bind(&trade.agent_id)
        .bind(&trade.trader_address)
        .bind(&trade.direction)
        .bind(&trade.amount_in)
        .bind(&trade.amount_out)
        .bind(&trade.fee)
        .bind(&trade.tx_hash)
        .bind(trade.log_index)
        .bind(trade.block_number)
        .bind(trade.created_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest first
    pub async fn list(pool: &PgPool, filter: &TradeFilter<'_>) -> Result<Vec<DbTrade>> {
        let results = sqlx::query_as::<_, DbTrade>(
            r#"
            SELECT * FROM trades
            WHERE ($1::text IS NULL OR token_address = $1)
              AND ($2::text IS NULL OR trader_address = $2)
              AND ($3::text IS NULL OR direction = $3)
              AND ($4::bigint IS NULL OR created_at < $4)
            ORDER BY created_at DESC, block_number DESC, log_index DESC
            LIMIT $5
            "#,
        )
        .bind(filter.token_address)
        .bind(filter.trader_address)
        .bind(filter.direction)
        .bind(filter.before)
        .bind(filter.limit)
        .fetch_all(pool)
        .await?;
        Ok(results)
    }
}
