//! Reference bonding-curve math.
//!
//! The factory contract is authoritative. These formulas sanity-check
//! mirrored events, seed freshly created tokens and serve read-only quotes.

use alloy_primitives::U256;
use thiserror::Error;

use crate::decoder::EventPayload;
use crate::types::Reserves;

/// Platform fee charged on buys, in basis points
pub const PLATFORM_FEE_BPS: u64 = 100;

const BPS_DENOMINATOR: u64 = 10_000;

/// 1e9 tokens with 18 decimals
pub fn total_supply() -> U256 {
    U256::from(10u64).pow(U256::from(27u64))
}

/// Reserves of a token that has not traded yet
pub fn initial_reserves() -> Reserves {
    Reserves::new(U256::ZERO, total_supply())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyQuote {
    pub fee: U256,
    pub tokens_out: U256,
}

/// `value * bps / 10_000`, rounded down, without overflowing near `U256::MAX`
pub fn bps_of(value: U256, bps: u64) -> U256 {
    let denominator = U256::from(BPS_DENOMINATOR);
    let bps = U256::from(bps);
    value / denominator * bps + value % denominator * bps / denominator
}

/// Platform fee for an ETH amount
pub fn platform_fee(eth_in: U256) -> U256 {
    bps_of(eth_in, PLATFORM_FEE_BPS)
}

/// Constant-product buy against `reserves` with `virtual_base` added to the ETH side
pub fn quote_buy(reserves: &Reserves, virtual_base: U256, eth_in: U256) -> BuyQuote {
    let fee = platform_fee(eth_in);
    let net = eth_in - fee;
    let base = reserves.base.saturating_add(virtual_base);
    let denominator = base.saturating_add(net);

    let tokens_out = if denominator.is_zero() {
        U256::ZERO
    } else {
        reserves.quote.saturating_mul(net) / denominator
    };
    BuyQuote { fee, tokens_out }
}

/// Constant-product sell, capped at the real ETH reserve
pub fn quote_sell(reserves: &Reserves, virtual_base: U256, tokens_in: U256) -> U256 {
    let base = reserves.base.saturating_add(virtual_base);
    let denominator = reserves.quote.saturating_add(tokens_in);
    if denominator.is_zero() {
        return U256::ZERO;
    }
    (base.saturating_mul(tokens_in) / denominator).min(reserves.base)
}

/// Price of one whole token in wei
pub fn spot_price(reserves: &Reserves, virtual_base: U256) -> U256 {
    if reserves.quote.is_zero() {
        return U256::ZERO;
    }
    reserves
        .base
        .saturating_add(virtual_base)
        .saturating_mul(U256::from(10u64).pow(U256::from(18u64)))
        / reserves.quote
}

/// Ways an event can disagree with the previously mirrored reserves
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveDiscrepancy {
    #[error("buy did not increase ETH reserve ({before} -> {after})")]
    BaseNotIncreased { before: U256, after: U256 },

    #[error("buy did not decrease token reserve ({before} -> {after})")]
    QuoteNotDecreased { before: U256, after: U256 },

    #[error("sell did not decrease ETH reserve ({before} -> {after})")]
    BaseNotDecreased { before: U256, after: U256 },

    #[error("sell did not increase token reserve ({before} -> {after})")]
    QuoteNotIncreased { before: U256, after: U256 },

    #[error("fee {fee} exceeds platform fee on {eth_in}")]
    FeeTooHigh { fee: U256, eth_in: U256 },
}

/// Compare a trade event with the reserves mirrored before it.
/// Unseeded (all-zero) reserves are not checked.
pub fn check_trade(previous: &Reserves, payload: &EventPayload) -> Vec<CurveDiscrepancy> {
    let mut found = Vec::new();

    match payload {
        EventPayload::Purchased {
            eth_in,
            fee,
            new_reserve_base,
            new_reserve_quote,
            ..
        } => {
            if *fee > platform_fee(*eth_in) {
                found.push(CurveDiscrepancy::FeeTooHigh { fee: *fee, eth_in: *eth_in });
            }
            if previous.is_zero() {
                return found;
            }
            if *new_reserve_base <= previous.base {
                found.push(CurveDiscrepancy::BaseNotIncreased {
                    before: previous.base,
                    after: *new_reserve_base,
                });
            }
            if *new_reserve_quote >= previous.quote {
                found.push(CurveDiscrepancy::QuoteNotDecreased {
                    before: previous.quote,
                    after: *new_reserve_quote,
                });
            }
        }
        EventPayload::Sold {
            new_reserve_base,
            new_reserve_quote,
            ..
        } => {
            if previous.is_zero() {
                return found;
            }
            if *new_reserve_base >= previous.base {
                found.push(CurveDiscrepancy::BaseNotDecreased {
                    before: previous.base,
                    after: *new_reserve_base,
                });
            }
            if *new_reserve_quote <= previous.quote {
                found.push(CurveDiscrepancy::QuoteNotIncreased {
                    before: previous.quote,
                    after: *new_reserve_quote,
                });
            }
        }
        _ => {}
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    const ETH: u128 = 1_000_000_000_000_000_000;

    fn purchased(eth_in: u128, fee: u128, base: u128, quote: u128) -> EventPayload {
        EventPayload::Purchased {
            token: Address::ZERO,
            buyer: Address::ZERO,
            eth_in: U256::from(eth_in),
            tokens_out: U256::ZERO,
            fee: U256::from(fee),
            new_reserve_base: U256::from(base),
            new_reserve_quote: U256::from(quote),
        }
    }

    #[test]
    fn test_platform_fee_is_one_percent() {
        assert_eq!(platform_fee(U256::from(ETH)), U256::from(ETH / 100));
        assert_eq!(platform_fee(U256::from(99u64)), U256::ZERO);
    }

    #[test]
    fn test_fee_on_huge_amounts_does_not_wrap() {
        let fee = platform_fee(U256::MAX);
        assert_eq!(fee, U256::MAX / U256::from(100u64));
        assert!(check_trade(&Reserves::default(), &EventPayload::Purchased {
            token: Address::ZERO,
            buyer: Address::ZERO,
            eth_in: U256::MAX,
            tokens_out: U256::ZERO,
            fee,
            new_reserve_base: U256::ZERO,
            new_reserve_quote: U256::ZERO,
        })
        .is_empty());
        assert_eq!(bps_of(U256::from(12_345u64), 80), U256::from(98u64));
    }

    #[test]
    fn test_quote_buy_constant_product() {
        let reserves = Reserves::new(U256::ZERO, U256::from(1_000_000u64));
        let quote = quote_buy(&reserves, U256::from(1_000u64), U256::from(1_000u64));
        // net 990 against 1000 virtual: 1_000_000 * 990 / 1990
        assert_eq!(quote.fee, U256::from(10u64));
        assert_eq!(quote.tokens_out, U256::from(497_487u64));
    }

    #[test]
    fn test_quote_sell_is_capped_by_real_reserve() {
        let reserves = Reserves::new(U256::from(10u64), U256::from(1_000u64));
        let out = quote_sell(&reserves, U256::from(1_000_000u64), U256::from(1_000u64));
        assert_eq!(out, U256::from(10u64));
    }

    #[test]
    fn test_spot_price() {
        let reserves = Reserves::new(U256::from(ETH), U256::from(2 * ETH));
        assert_eq!(spot_price(&reserves, U256::ZERO), U256::from(ETH / 2));
        assert_eq!(spot_price(&Reserves::default(), U256::from(ETH)), U256::ZERO);
    }

    #[test]
    fn test_check_trade_accepts_consistent_buy() {
        let previous = Reserves::new(U256::from(100u64), U256::from(1_000u64));
        assert!(check_trade(&previous, &purchased(100, 1, 199, 900)).is_empty());
    }

    #[test]
    fn test_check_trade_flags_inconsistent_buy() {
        let previous = Reserves::new(U256::from(100u64), U256::from(1_000u64));
        let found = check_trade(&previous, &purchased(100, 50, 90, 1_100));
        assert_eq!(found.len(), 3);
        assert!(matches!(found[0], CurveDiscrepancy::FeeTooHigh { .. }));
    }

    #[test]
    fn test_check_trade_skips_unseeded_reserves() {
        assert!(check_trade(&Reserves::default(), &purchased(100, 1, 0, 0)).is_empty());
    }

    #[test]
    fn test_initial_reserves() {
        assert_eq!(initial_reserves().quote.to_string(), "1000000000000000000000000000");
    }
}
