mod comment;
mod token;
mod trade;

pub use comment::DbComment;
pub use token::DbToken;
pub use trade::DbTrade;

use crate::{DatabaseError, Result};
use alloy_primitives::{Address, B256, U256};

pub(crate) fn parse_address(value: &str) -> Result<Address> {
    value
        .parse()
        .map_err(|e| DatabaseError::Serialization(format!("address {:?}: {}", value, e)))
}

pub(crate) fn parse_hash(value: &str) -> Result<B256> {
    value
        .parse()
        .map_err(|e| DatabaseError::Serialization(format!("hash {:?}: {}", value, e)))
}

/// Decimal string to uint256
pub(crate) fn parse_amount(value: &str) -> Result<U256> {
    U256::from_str_radix(value.trim(), 10)
        .map_err(|e| DatabaseError::Serialization(format!("amount {:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_keeps_precision() {
        let value = "1000000000000000000000000007";
        assert_eq!(parse_amount(value).unwrap().to_string(), value);
        assert!(parse_amount("1.5").is_err());
        assert!(parse_amount("0x10").is_err());
    }
}
