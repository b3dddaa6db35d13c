use crate::Result;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
pub struct TopTokenRow {
    pub address: String,
    pub symbol: String,
    pub name: String,
    /// Decimal string sum
    pub vol: String,
}

/// Aggregates over mirrored rows. Volumes are summed as NUMERIC and
/// returned as text so no precision is lost.
pub struct StatsRepository;

impl StatsRepository {
    pub async fn count(pool: &PgPool, table: StatsTable) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(table.count_sql()).fetch_one(pool).await?;
        Ok(count.max(0) as u64)
    }

    pub async fn graduated(pool: &PgPool) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tokens WHERE migrated")
            .fetch_one(pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn trades_since(pool: &PgPool, since: i64) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trades WHERE created_at >= $1")
            .bind(since)
            .fetch_one(pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn buy_volume_since(pool: &PgPool, since: i64) -> Result<String> {
        let (volume,): (String,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount_in::numeric), 0)::text
            FROM trades
            WHERE direction = 'BUY' AND created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(pool)
        .await?;
        Ok(volume)
    }

    pub async fn top_token_since(pool: &PgPool, since: i64) -> Result<Option<TopTokenRow>> {
        let result = sqlx::query_as::<_, TopTokenRow>(
            r#"
            SELECT t.address, t.symbol, t.name, SUM(tr.amount_in::numeric)::text AS vol
            FROM trades tr
            JOIN tokens t ON tr.token_address = t.address
            WHERE tr.created_at >= $1 AND tr.direction = 'BUY'
            GROUP BY t.address, t.symbol, t.name
            ORDER BY SUM(tr.amount_in::numeric) DESC, t.address ASC
            LIMIT 1
            "#,
        )
        .bind(since)
        .fetch_optional(pool)
        .await?;
        Ok(result)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StatsTable {
    Tokens,
    Agents,
    Trades,
}

impl StatsTable {
    fn count_sql(&self) -> &'static str {
        match self {
            StatsTable::Tokens => "SELECT COUNT(*) FROM tokens",
            StatsTable::Agents => "SELECT COUNT(*) FROM agents",
            StatsTable::Trades => "SELECT COUNT(*) FROM trades",
        }
    }
}
