use alloy_primitives::Address;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::traits::MirrorStore;

/// Maps on-chain addresses to locally registered agents.
/// A miss or a failed lookup yields `None`; attribution is never fatal.
#[derive(Clone)]
pub struct AgentResolver {
    store: Arc<dyn MirrorStore>,
}

impl AgentResolver {
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, address: &Address) -> Option<String> {
        match self.store.agent_by_wallet(address).await {
            Ok(Some(agent_id)) => Some(agent_id),
            Ok(None) => {
                debug!(address = ?address, "No agent for address");
                None
            }
            Err(e) => {
                warn!(address = ?address, error = %e, "Agent lookup failed, leaving unattributed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;
    use indexer_core::types::Agent;

    #[tokio::test]
    async fn test_resolves_known_wallet_only() {
        let store = Arc::new(InMemoryStore::new());
        store.agents.insert(Agent {
            id: "agent-7".into(),
            name: "seven".into(),
            description: None,
            wallet_address: Address::repeat_byte(0x07),
            created_at: 0,
        });
        let resolver = AgentResolver::new(store);

        assert_eq!(
            resolver.resolve(&Address::repeat_byte(0x07)).await.as_deref(),
            Some("agent-7")
        );
        assert_eq!(resolver.resolve(&Address::repeat_byte(0x08)).await, None);
    }
}
