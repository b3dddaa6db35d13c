use alloy_primitives::Address;
use async_trait::async_trait;
use indexer_core::types::{
    canonical_address, Comment, ReserveUpdate, StatsTotals, Token, TopTokenVolume, Trade,
};
use indexer_core::Result;
use indexer_store::{MirrorStore, TokenQuery, TradeQuery};
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::models::{parse_address, parse_amount, DbToken, DbTrade};
use crate::repositories::{
    AgentRepository, CommentRepository, ReserveUpdateParams, StatsRepository, StatsTable,
    SyncStateRepository, TokenFilter, TokenRepository, TradeFilter, TradeRepository,
};
use crate::DatabasePool;

const DAY_SECS: u64 = 86_400;
const HOUR_SECS: u64 = 3_600;

/// PostgreSQL-backed mirror store
#[derive(Clone)]
pub struct PgStore {
    db: DatabasePool,
}

impl PgStore {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }

    fn pool(&self) -> &PgPool {
        self.db.inner()
    }
}

#[async_trait]
impl MirrorStore for PgStore {
    async fn upsert_token_on_create(&self, token: Token) -> Result<bool> {
        Ok(TokenRepository::insert(self.pool(), &DbToken::from(&token)).await?)
    }

    async fn record_trade(&self, trade: Trade) -> Result<bool> {
        Ok(TradeRepository::insert(self.pool(), &DbTrade::from(&trade)).await?)
    }

    async fn apply_reserve_update(&self, update: ReserveUpdate) -> Result<bool> {
        let address = canonical_address(&update.token);
        let reserve_base = update.reserves.base.to_string();
        let reserve_quote = update.reserves.quote.to_string();
        let pool_address = update.pool.as_ref().map(canonical_address);

        let params = ReserveUpdateParams {
            address: &address,
            reserve_base: &reserve_base,
            reserve_quote: &reserve_quote,
            migrated: update.migrated,
            pool_address: pool_address.as_deref(),
        };
        Ok(TokenRepository::update_reserves(self.pool(), &params).await?)
    }

    async fn get_token(&self, address: &Address) -> Result<Option<Token>> {
        let row = TokenRepository::get(self.pool(), &canonical_address(address)).await?;
        Ok(row.map(DbToken::into_token).transpose()?)
    }

    async fn list_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>> {
        let creator = query.creator.as_ref().map(canonical_address);
        let filter = TokenFilter {
            creator: creator.as_deref(),
            agent_id: query.agent_id.as_deref(),
            limit: query.page_size() as i64,
            offset: i64::try_from(query.offset).unwrap_or(i64::MAX),
        };
        let rows = TokenRepository::list(self.pool(), &filter).await?;
        Ok(rows
            .into_iter()
            .map(DbToken::into_token)
            .collect::<crate::Result<Vec<_>>>()?)
    }

    async fn list_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
        let token = query.token.as_ref().map(canonical_address);
        let trader = query.trader.as_ref().map(canonical_address);
        let filter = TradeFilter {
            token_address: token.as_deref(),
            trader_address: trader.as_deref(),
            direction: query.direction.map(|d| d.as_str()),
            before: query.before.map(|b| i64::try_from(b).unwrap_or(i64::MAX)),
            limit: query.page_size() as i64,
        };
        let rows = TradeRepository::list(self.pool(), &filter).await?;
        Ok(rows
            .into_iter()
            .map(DbTrade::into_trade)
            .collect::<crate::Result<Vec<_>>>()?)
    }

    async fn list_comments(&self, token: &Address, limit: usize) -> Result<Vec<Comment>> {
        let rows =
            CommentRepository::list_by_token(self.pool(), &canonical_address(token), limit as i64)
                .await?;
        Ok(rows
            .into_iter()
            .map(|c| c.into_comment())
            .collect::<crate::Result<Vec<_>>>()?)
    }

    async fn agent_by_wallet(&self, wallet: &Address) -> Result<Option<String>> {
        Ok(AgentRepository::id_by_wallet(self.pool(), &canonical_address(wallet)).await?)
    }

    async fn known_token_addresses(&self) -> Result<Vec<Address>> {
        let rows = TokenRepository::all_addresses(self.pool()).await?;
        Ok(rows
            .iter()
            .filter_map(|a| match parse_address(a) {
                Ok(address) => Some(address),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed token address");
                    None
                }
            })
            .collect())
    }

    async fn load_checkpoint(&self) -> Result<Option<u64>> {
        Ok(SyncStateRepository::get_last_synced_block(self.pool()).await?)
    }

    async fn save_checkpoint(&self, block: u64) -> Result<()> {
        Ok(SyncStateRepository::set_last_synced_block(self.pool(), block).await?)
    }

    async fn stats_totals(&self, now: u64) -> Result<StatsTotals> {
        let pool = self.pool();
        let day_ago = now.saturating_sub(DAY_SECS) as i64;
        let hour_ago = now.saturating_sub(HOUR_SECS) as i64;

        let top_token = match StatsRepository::top_token_since(pool, day_ago).await? {
            Some(row) => Some(TopTokenVolume {
                address: parse_address(&row.address)?,
                symbol: row.symbol,
                name: row.name,
                vol_24h: parse_amount(&row.vol)?,
            }),
            None => None,
        };

        Ok(StatsTotals {
            total_tokens: StatsRepository::count(pool, StatsTable::Tokens).await?,
            total_agents: StatsRepository::count(pool, StatsTable::Agents).await?,
            total_trades: StatsRepository::count(pool, StatsTable::Trades).await?,
            graduated: StatsRepository::graduated(pool).await?,
            vol_all: parse_amount(&StatsRepository::buy_volume_since(pool, 0).await?)?,
            vol_24h: parse_amount(&StatsRepository::buy_volume_since(pool, day_ago).await?)?,
            trades_24h: StatsRepository::trades_since(pool, day_ago).await?,
            trades_last_hour: StatsRepository::trades_since(pool, hour_ago).await?,
            top_token,
        })
    }

    async fn health_check(&self) -> Result<()> {
        let latency = self.db.ping().await?;
        debug!(latency_ms = latency.as_millis() as u64, "Mirror database reachable");
        Ok(())
    }
}
