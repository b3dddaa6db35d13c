use alloy_primitives::{Address, U256};
use serde::Serialize;

use super::{canonical_address, format_units, iso_timestamp};
use crate::curve::bps_of;

/// Agent share of buy volume: 80% of the 1% platform fee, in basis points
const AGENT_FEE_BPS: u64 = 80;

/// Raw aggregate figures as read from a store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsTotals {
    pub total_tokens: u64,
    pub total_agents: u64,
    pub total_trades: u64,
    pub graduated: u64,
    /// Sum of BUY `amount_in`, all time (wei)
    pub vol_all: U256,
    /// Sum of BUY `amount_in` over the trailing 24h (wei)
    pub vol_24h: U256,
    pub trades_24h: u64,
    pub trades_last_hour: u64,
    pub top_token: Option<TopTokenVolume>,
}

/// Token with the largest trailing-24h BUY volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopTokenVolume {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub vol_24h: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopToken {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub vol_24h_eth: String,
}

/// Platform-wide snapshot pushed to subscribers and served by `/api/stats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_tokens: u64,
    pub total_agents: u64,
    pub total_trades: u64,
    pub graduated: u64,
    pub vol_all_eth: String,
    pub vol_24h_eth: String,
    pub agent_fees_eth: String,
    pub agent_fees_24h_eth: String,
    pub trades_24h: u64,
    pub trades_per_min: String,
    pub top_token: Option<TopToken>,
    pub updated_at: String,
}

impl AggregateStats {
    /// Format raw totals. `now` is unix seconds.
    pub fn from_totals(totals: &StatsTotals, now: u64) -> Self {
        let fee = |volume: U256| bps_of(volume, AGENT_FEE_BPS);

        Self {
            total_tokens: totals.total_tokens,
            total_agents: totals.total_agents,
            total_trades: totals.total_trades,
            graduated: totals.graduated,
            vol_all_eth: format_units(totals.vol_all, 18, 4),
            vol_24h_eth: format_units(totals.vol_24h, 18, 4),
            agent_fees_eth: format_units(fee(totals.vol_all), 18, 4),
            agent_fees_24h_eth: format_units(fee(totals.vol_24h), 18, 4),
            trades_24h: totals.trades_24h,
            trades_per_min: per_minute(totals.trades_last_hour),
            top_token: totals.top_token.as_ref().map(|top| TopToken {
                symbol: top.symbol.clone(),
                name: top.name.clone(),
                address: canonical_address(&top.address),
                vol_24h_eth: format_units(top.vol_24h, 18, 4),
            }),
            updated_at: iso_timestamp(now),
        }
    }
}

/// `count / 60` rendered with two decimals, rounded half-up
fn per_minute(count: u64) -> String {
    let hundredths = (count * 100 + 30) / 60;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_empty_totals() {
        let stats = AggregateStats::from_totals(&StatsTotals::default(), 0);
        assert_eq!(stats.vol_all_eth, "0.0000");
        assert_eq!(stats.agent_fees_eth, "0.0000");
        assert_eq!(stats.trades_per_min, "0.00");
        assert!(stats.top_token.is_none());
    }

    #[test]
    fn test_agent_fees_are_eight_tenths_percent() {
        let totals = StatsTotals {
            vol_all: U256::from(10 * ETH),
            vol_24h: U256::from(ETH),
            ..Default::default()
        };
        let stats = AggregateStats::from_totals(&totals, 0);
        assert_eq!(stats.vol_all_eth, "10.0000");
        assert_eq!(stats.agent_fees_eth, "0.0800");
        assert_eq!(stats.agent_fees_24h_eth, "0.0080");
    }

    #[test]
    fn test_trades_per_min() {
        assert_eq!(per_minute(0), "0.00");
        assert_eq!(per_minute(60), "1.00");
        assert_eq!(per_minute(1), "0.02");
        assert_eq!(per_minute(90), "1.50");
    }

    #[test]
    fn test_serializes_camel_case() {
        let totals = StatsTotals {
            top_token: Some(TopTokenVolume {
                address: Address::repeat_byte(0xaa),
                symbol: "CLAW".into(),
                name: "Claw".into(),
                vol_24h: U256::from(ETH / 2),
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(AggregateStats::from_totals(&totals, 0)).unwrap();
        assert_eq!(json["topToken"]["vol24hEth"], "0.5000");
        assert!(json.get("tradesPerMin").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
