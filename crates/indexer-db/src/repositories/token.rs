use crate::models::DbToken;
use crate::Result;
use sqlx::PgPool;

/// Optional filters for listing tokens
#[derive(Debug, Default)]
pub struct TokenFilter<'a> {
    pub creator: Option<&'a str>,
    pub agent_id: Option<&'a str>,
    pub limit: i64,
    pub offset: i64,
}

/// Column values for a reserve overwrite
#[derive(Debug)]
pub struct ReserveUpdateParams<'a> {
    pub address: &'a str,
    pub reserve_base: &'a str,
    pub reserve_quote: &'a str,
    pub migrated: bool,
    pub pool_address: Option<&'a str>,
}

pub struct TokenRepository;

impl TokenRepository {
    /// Insert token (idempotent - ignores duplicates, never updates)
    pub async fn insert(pool: &PgPool, token: &DbToken) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO tokens (address, name, symbol, creator, agent_id, tx_hash, migrated,
                                pool_address, reserve_base, reserve_quote, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (address) DO NOTHING
            "#,
        )
        .bind(&token.address)
        .bind(&token.name)
        .bind(&token.symbol)
        .bind(&token.creator)
        .bind(&token.agent_id)
        .bind(&token.tx_hash)
        .bind(token.migrated)
        .bind(&token.pool_address)
        .bind(&token.reserve_base)
        .bind(&token.reserve_quote)
        .bind(token.created_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite reserves. `migrated` only latches on and the pool address
    /// is only set once. Returns true if the row changed.
    pub async fn update_reserves(pool: &PgPool, params: &ReserveUpdateParams<'_>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tokens SET
                reserve_base = $2,
                reserve_quote = $3,
                migrated = migrated OR $4,
                pool_address = COALESCE(pool_address, $5)
            WHERE address = $1
              AND (reserve_base <> $2
                   OR reserve_quote <> $3
                   OR (NOT migrated AND $4)
                   OR (pool_address IS NULL AND $5::text IS NOT NULL))
            "#,
        )
        .bind(params.address)
        .bind(params.reserve_base)
        .bind(params.reserve_quote)
        .bind(params.migrated)
        .bind(params.pool_address)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(pool: &PgPool, address: &str) -> Result<Option<DbToken>> {
        let result = sqlx::query_as::<_, DbToken>("SELECT * FROM tokens WHERE address = $1")
            .bind(address)
            .fetch_optional(pool)
            .await?;
        Ok(result)
    }

    /// Newest first
    pub async fn list(pool: &PgPool, filter: &TokenFilter<'_>) -> Result<Vec<DbToken>> {
        let results = sqlx::query_as::<_, DbToken>(
            r#"
            SELECT * FROM tokens
            WHERE ($1::text IS NULL OR creator = $1)
              AND ($2::text IS NULL OR agent_id = $2)
            ORDER BY created_at DESC, address ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.creator)
        .bind(filter.agent_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;
        Ok(results)
    }

    pub async fn all_addresses(pool: &PgPool) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT address FROM tokens")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(a,)| a).collect())
    }
}
