use alloy_primitives::{Address, U256};
use axum::extract::{Path, Query, State};
use axum::Json;
use indexer_core::types::{AggregateStats, TradeDirection};
use indexer_store::{TokenQuery, TradeQuery, MAX_PAGE_SIZE};
use serde::Deserialize;
use tracing::warn;

use super::types::{ApiComment, ApiQuote, ApiStatus, ApiToken, ApiTrade};
use super::ApiContext;
use crate::{ApiError, Result};

/// Page size when the caller gives none
pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Default, Deserialize)]
pub struct TokenListParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub creator: Option<String>,
    pub agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TradeListParams {
    pub limit: Option<usize>,
    /// Unix seconds, exclusive
    pub before: Option<u64>,
    pub direction: Option<String>,
    pub trader: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteParams {
    /// BUY (default) or SELL
    pub direction: Option<String>,
    /// Wei for buys, token base units for sells
    pub amount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

fn parse_address(field: &str, raw: &str) -> Result<Address> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {}: {}", field, raw)))
}

fn page_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Offsets and cursors end up as signed 64-bit SQL parameters
fn page_offset(offset: Option<usize>) -> usize {
    offset.unwrap_or(0).min(i64::MAX as usize)
}

fn before_cursor(before: Option<u64>) -> Option<u64> {
    before.map(|b| b.min(i64::MAX as u64))
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn stats(State(ctx): State<ApiContext>) -> Result<Json<AggregateStats>> {
    Ok(Json(ctx.notifier.snapshot().await?))
}

pub async fn list_tokens(
    State(ctx): State<ApiContext>,
    Query(params): Query<TokenListParams>,
) -> Result<Json<Vec<ApiToken>>> {
    let query = TokenQuery {
        limit: page_limit(params.limit),
        offset: page_offset(params.offset),
        creator: params
            .creator
            .as_deref()
            .map(|raw| parse_address("creator", raw))
            .transpose()?,
        agent_id: params.agent,
    };

    let tokens = ctx.store.list_tokens(&query).await?;
    Ok(Json(tokens.into_iter().map(ApiToken::from).collect()))
}

pub async fn get_token(
    State(ctx): State<ApiContext>,
    Path(address): Path<String>,
) -> Result<Json<ApiToken>> {
    let token = parse_address("address", &address)?;
    ctx.store
        .get_token(&token)
        .await?
        .map(|token| Json(ApiToken::from(token)))
        .ok_or_else(|| ApiError::NotFound(format!("token {}", address)))
}

pub async fn token_trades(
    State(ctx): State<ApiContext>,
    Path(address): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ApiTrade>>> {
    let token = parse_address("address", &address)?;
    if ctx.store.get_token(&token).await?.is_none() {
        return Err(ApiError::NotFound(format!("token {}", address)));
    }

    let query = TradeQuery {
        limit: page_limit(params.limit),
        token: Some(token),
        ..Default::default()
    };
    let trades = ctx.store.list_trades(&query).await?;
    Ok(Json(trades.into_iter().map(ApiTrade::from).collect()))
}

pub async fn token_comments(
    State(ctx): State<ApiContext>,
    Path(address): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ApiComment>>> {
    let token = parse_address("address", &address)?;
    let comments = ctx
        .store
        .list_comments(&token, page_limit(params.limit))
        .await?;
    Ok(Json(comments.into_iter().map(ApiComment::from).collect()))
}

/// Curve estimate for a still-bonding token
pub async fn token_quote(
    State(ctx): State<ApiContext>,
    Path(address): Path<String>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<ApiQuote>> {
    let token_address = parse_address("address", &address)?;
    let direction = params
        .direction
        .as_deref()
        .unwrap_or("BUY")
        .parse::<TradeDirection>()
        .map_err(ApiError::BadRequest)?;

    let raw_amount = params.amount.as_deref().unwrap_or("0").trim();
    if raw_amount.is_empty() || !raw_amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::BadRequest(
            "amount must be a non-negative integer in base units".to_string(),
        ));
    }
    let amount = U256::from_str_radix(raw_amount, 10)
        .map_err(|e| ApiError::BadRequest(format!("invalid amount: {}", e)))?;

    let token = ctx
        .store
        .get_token(&token_address)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("token {}", address)))?;
    if token.migrated {
        return Err(ApiError::BadRequest(format!(
            "token {} has graduated off the curve",
            address
        )));
    }

    Ok(Json(ApiQuote::estimate(&token, direction, amount, ctx.curve.virtual_base)))
}

/// Recent-activity feed across all tokens
pub async fn list_trades(
    State(ctx): State<ApiContext>,
    Query(params): Query<TradeListParams>,
) -> Result<Json<Vec<ApiTrade>>> {
    let direction = params
        .direction
        .as_deref()
        .map(str::parse::<TradeDirection>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let query = TradeQuery {
        limit: page_limit(params.limit),
        token: None,
        trader: params
            .trader
            .as_deref()
            .map(|raw| parse_address("trader", raw))
            .transpose()?,
        direction,
        before: before_cursor(params.before),
    };

    let trades = ctx.store.list_trades(&query).await?;
    Ok(Json(trades.into_iter().map(ApiTrade::from).collect()))
}

pub async fn status(State(ctx): State<ApiContext>) -> Json<ApiStatus> {
    let subscribers = ctx.notifier.subscriber_count();
    let store_healthy = match ctx.store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Mirror store health check failed");
            false
        }
    };

    let status = match &ctx.reconciler {
        Some(reconciler) => ApiStatus::from_reconciler(
            reconciler.status().await,
            ctx.chain_id,
            subscribers,
            store_healthy,
        ),
        None => ApiStatus::disabled(subscribers, store_healthy),
    };
    Json(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use indexer_core::types::{Reserves, Token, Trade, TradeKey};
    use indexer_notifier::{Notifier, NotifierConfig};
    use indexer_store::{InMemoryStore, MirrorStore};
    use std::sync::Arc;

    fn token(byte: u8, created_at: u64) -> Token {
        Token {
            address: Address::repeat_byte(byte),
            name: format!("Token {}", byte),
            symbol: format!("T{}", byte),
            creator: Address::repeat_byte(0xc0),
            agent_id: None,
            tx_hash: None,
            migrated: false,
            pool_address: None,
            reserves: Reserves::new(U256::from(505u64), U256::from(999_900_000u64)),
            created_at,
        }
    }

    fn trade(token: Address, log_index: u64, direction: TradeDirection) -> Trade {
        Trade {
            key: TradeKey::new(B256::repeat_byte(0xab), log_index),
            token,
            agent_id: None,
            trader: Address::repeat_byte(0xb0),
            direction,
            amount_in: U256::from(500u64),
            amount_out: U256::from(100_000u64),
            fee: U256::from(5u64),
            created_at: 1_700_000_000 + log_index,
            block_number: 10,
        }
    }

    async fn context() -> ApiContext {
        let store = Arc::new(InMemoryStore::new());
        for i in 1..=3u8 {
            store.upsert_token_on_create(token(i, i as u64)).await.unwrap();
        }
        store
            .record_trade(trade(Address::repeat_byte(1), 0, TradeDirection::Buy))
            .await
            .unwrap();
        store
            .record_trade(trade(Address::repeat_byte(1), 1, TradeDirection::Sell))
            .await
            .unwrap();

        let notifier = Notifier::new(store.clone(), NotifierConfig::default());
        ApiContext::new(store, notifier)
    }

    #[tokio::test]
    async fn test_list_tokens_newest_first_with_limit() {
        let ctx = context().await;
        let params = TokenListParams {
            limit: Some(2),
            ..Default::default()
        };

        let Json(tokens) = list_tokens(State(ctx), Query(params)).await.unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].symbol, "T3");
        assert_eq!(tokens[0].reserve_base, "505");
    }

    #[tokio::test]
    async fn test_invalid_creator_is_bad_request() {
        let ctx = context().await;
        let params = TokenListParams {
            creator: Some("not-an-address".to_string()),
            ..Default::default()
        };

        let err = list_tokens(State(ctx), Query(params)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let ctx = context().await;
        let missing = format!("{:#x}", Address::repeat_byte(0x99));

        let err = get_token(State(ctx.clone()), Path(missing.clone())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = token_trades(State(ctx), Path(missing), Query(LimitParams::default()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_trade_feed_filters_by_direction() {
        let ctx = context().await;
        let params = TradeListParams {
            direction: Some("sell".to_string()),
            ..Default::default()
        };

        let Json(trades) = list_trades(State(ctx.clone()), Query(params)).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].direction, "SELL");
        assert_eq!(trades[0].id, format!("{:#x}_1", B256::repeat_byte(0xab)));

        let bad = TradeListParams {
            direction: Some("hold".to_string()),
            ..Default::default()
        };
        let err = list_trades(State(ctx), Query(bad)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_and_disabled_status() {
        let ctx = context().await;

        let Json(snapshot) = stats(State(ctx.clone())).await.unwrap();
        assert_eq!(snapshot.total_tokens, 3);
        assert_eq!(snapshot.total_trades, 2);

        let Json(current) = status(State(ctx)).await;
        assert!(!current.indexer_enabled);
        assert!(current.store_healthy);
        assert_eq!(current.phase, "disabled");
    }

    #[tokio::test]
    async fn test_quote_uses_mirrored_reserves() {
        let ctx = context().await.with_curve(indexer_core::CurveConfig {
            virtual_base: U256::from(1_000u64),
        });
        let address = format!("{:#x}", Address::repeat_byte(1));

        let params = QuoteParams {
            direction: None,
            amount: Some("1000".to_string()),
        };
        let Json(quote) = token_quote(State(ctx.clone()), Path(address.clone()), Query(params))
            .await
            .unwrap();
        assert_eq!(quote.direction, "BUY");
        assert_eq!(quote.fee, "10");
        assert_eq!(quote.estimated_out, "396753907");
        assert_eq!(quote.spot_price_wei, "1505150515051");

        let params = QuoteParams {
            direction: Some("sell".to_string()),
            amount: Some("1.5".to_string()),
        };
        let err = token_quote(State(ctx), Path(address), Query(params))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_quote_rejects_graduated_token() {
        let ctx = context().await;
        ctx.store
            .apply_reserve_update(indexer_core::types::ReserveUpdate {
                token: Address::repeat_byte(2),
                reserves: Reserves::default(),
                migrated: true,
                pool: Some(Address::repeat_byte(0x90)),
            })
            .await
            .unwrap();

        let params = QuoteParams {
            amount: Some("1000".to_string()),
            ..Default::default()
        };
        let err = token_quote(
            State(ctx),
            Path(format!("{:#x}", Address::repeat_byte(2))),
            Query(params),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_offsets_and_cursors_fit_sql_bigint() {
        assert_eq!(page_offset(None), 0);
        assert_eq!(page_offset(Some(usize::MAX)) as u64, i64::MAX as u64);
        assert_eq!(before_cursor(Some(u64::MAX)), Some(i64::MAX as u64));
        assert_eq!(before_cursor(Some(1_700_000_000)), Some(1_700_000_000));
    }

    #[tokio::test]
    async fn test_huge_offset_and_cursor_are_served() {
        let ctx = context().await;

        let params = TokenListParams {
            offset: Some(usize::MAX),
            ..Default::default()
        };
        let Json(tokens) = list_tokens(State(ctx.clone()), Query(params)).await.unwrap();
        assert!(tokens.is_empty());

        let params = TradeListParams {
            before: Some(u64::MAX),
            ..Default::default()
        };
        let Json(trades) = list_trades(State(ctx), Query(params)).await.unwrap();
        assert_eq!(trades.len(), 2);
    }

    #[test]
    fn test_page_limit_is_clamped() {
        assert_eq!(page_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(page_limit(Some(0)), 1);
        assert_eq!(page_limit(Some(10_000)), MAX_PAGE_SIZE);
    }
}
