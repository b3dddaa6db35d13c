use alloy_primitives::Address;

/// Registered agent, read-only from the indexer's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Custody wallet used for trade attribution
    pub wallet_address: Address,
    pub created_at: u64,
}
