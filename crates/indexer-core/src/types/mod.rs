mod agent;
mod comment;
mod domain_event;
mod stats;
mod token;
mod trade;

pub use agent::Agent;
pub use comment::{Comment, MAX_COMMENT_LEN};
pub use domain_event::{DeployNotice, DomainEvent, GraduationNotice, TokenRef, TradeNotice};
pub use stats::{AggregateStats, StatsTotals, TopToken, TopTokenVolume};
pub use token::{ReserveUpdate, Reserves, Token};
pub use trade::{Trade, TradeDirection, TradeKey};

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current timestamp in seconds since Unix epoch
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// RFC 3339 rendering of a unix timestamp in seconds
pub fn iso_timestamp(secs: u64) -> String {
    DateTime::<Utc>::from_timestamp(secs as i64, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Canonical lower-case `0x` hex form used as the natural key everywhere
pub fn canonical_address(address: &Address) -> String {
    format!("{:#x}", address)
}

/// Lower-case `0x` hex form of a transaction hash
pub fn canonical_hash(hash: &B256) -> String {
    format!("{:#x}", hash)
}

/// Render a fixed-point integer with `decimals` implied decimals,
/// rounded half-up to `precision` fractional digits. Integer arithmetic only.
pub fn format_units(value: U256, decimals: u8, precision: u8) -> String {
    let ten = U256::from(10u64);
    let unit = ten.pow(U256::from(decimals));
    let scale = ten.pow(U256::from(precision));

    let scaled = value
        .saturating_mul(scale)
        .saturating_add(unit / U256::from(2u64))
        / unit;

    let whole = scaled / scale;
    if precision == 0 {
        return whole.to_string();
    }
    let frac = (scaled % scale).to_string();
    format!("{}.{:0>width$}", whole, frac, width = precision as usize)
}

/// Full-precision ether rendering with trailing zeros trimmed ("1.5", "0.0")
pub fn format_ether(value: U256) -> String {
    let rendered = format_units(value, 18, 18);
    let trimmed = rendered.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units_rounds_half_up() {
        let one_eth = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(format_units(one_eth, 18, 4), "1.0000");
        assert_eq!(format_units(U256::from(123_450_000_000_000_000u128), 18, 4), "0.1235");
        assert_eq!(format_units(U256::from(123_440_000_000_000_000u128), 18, 4), "0.1234");
        assert_eq!(format_units(U256::ZERO, 18, 4), "0.0000");
        assert_eq!(format_units(U256::from(12_345u64), 2, 0), "123");
    }

    #[test]
    fn test_format_ether_trims() {
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u128)), "1.5");
        assert_eq!(format_ether(U256::ZERO), "0.0");
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn test_canonical_address_is_lowercase() {
        let address: Address = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01".parse().unwrap();
        assert_eq!(
            canonical_address(&address),
            "0xabcdef0123456789abcdef0123456789abcdef01"
        );
    }

    #[test]
    fn test_iso_timestamp() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
    }
}
