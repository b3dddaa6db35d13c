use alloy_primitives::Address;
use dashmap::DashMap;
use indexer_core::types::Agent;

/// Read-mostly agent registry keyed by custody wallet
#[derive(Debug, Default)]
pub struct AgentStore {
    agents: DashMap<String, Agent>,
    wallet_index: DashMap<Address, String>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent (restoring state or seeding tests)
    pub fn insert(&self, agent: Agent) {
        self.wallet_index
            .insert(agent.wallet_address, agent.id.clone());
        self.agents.insert(agent.id.clone(), agent);
    }

    pub fn id_by_wallet(&self, wallet: &Address) -> Option<String> {
        self.wallet_index.get(wallet).map(|id| id.clone())
    }

    pub fn count(&self) -> usize {
        self.agents.len()
    }
}
