use alloy_primitives::U256;
use indexer_core::curve::{quote_buy, quote_sell, spot_price};
use indexer_core::types::{format_ether, Token, TradeDirection};
use serde::Serialize;

/// Estimate against the mirrored reserves. The factory remains
/// authoritative; this is what the mirror predicts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiQuote {
    pub direction: &'static str,
    pub amount_in: String,
    pub estimated_out: String,
    pub estimated_out_formatted: String,
    pub fee: String,
    pub spot_price_wei: String,
    pub reserve_base: String,
    pub reserve_quote: String,
}

impl ApiQuote {
    pub fn estimate(token: &Token, direction: TradeDirection, amount_in: U256, virtual_base: U256) -> Self {
        let (estimated_out, fee) = match direction {
            TradeDirection::Buy => {
                let quote = quote_buy(&token.reserves, virtual_base, amount_in);
                (quote.tokens_out, quote.fee)
            }
            TradeDirection::Sell => (quote_sell(&token.reserves, virtual_base, amount_in), U256::ZERO),
        };

        Self {
            direction: direction.as_str(),
            amount_in: amount_in.to_string(),
            estimated_out: estimated_out.to_string(),
            estimated_out_formatted: format_ether(estimated_out),
            fee: fee.to_string(),
            spot_price_wei: spot_price(&token.reserves, virtual_base).to_string(),
            reserve_base: token.reserves.base.to_string(),
            reserve_quote: token.reserves.quote.to_string(),
        }
    }
}
