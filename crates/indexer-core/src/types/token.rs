use alloy_primitives::{Address, B256, U256};

/// Curve reserves as mirrored from the factory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reserves {
    /// ETH-side reserve (wei)
    pub base: U256,
    /// Token-side reserve (token wei)
    pub quote: U256,
}

impl Reserves {
    pub fn new(base: U256, quote: U256) -> Self {
        Self { base, quote }
    }

    pub fn is_zero(&self) -> bool {
        self.base.is_zero() && self.quote.is_zero()
    }
}

/// A token deployed through the factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token contract address (natural key)
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub creator: Address,
    /// Deploying agent; `None` for external creators
    pub agent_id: Option<String>,
    /// Genesis transaction hash
    pub tx_hash: Option<B256>,
    /// One-way latch: never reverts to false
    pub migrated: bool,
    /// Liquidity pool, set once migrated
    pub pool_address: Option<Address>,
    pub reserves: Reserves,
    /// Unix seconds
    pub created_at: u64,
}

impl Token {
    /// Apply a reserve update in place, honouring the migration latch.
    /// Returns true if any field changed.
    pub fn apply(&mut self, update: &ReserveUpdate) -> bool {
        let before = (self.reserves, self.migrated, self.pool_address);

        self.reserves = update.reserves;
        self.migrated = self.migrated || update.migrated;
        if self.pool_address.is_none() {
            self.pool_address = update.pool;
        }

        before != (self.reserves, self.migrated, self.pool_address)
    }
}

/// Latest-known reserves for a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveUpdate {
    pub token: Address,
    pub reserves: Reserves,
    /// `false` never clears an already-set flag
    pub migrated: bool,
    pub pool: Option<Address>,
}
