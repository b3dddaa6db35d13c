pub mod query;
pub mod types;
pub mod ws;

use indexer_core::CurveConfig;
use indexer_notifier::Notifier;
use indexer_store::MirrorStore;
use indexer_sync::Reconciler;
use std::sync::Arc;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn MirrorStore>,
    pub notifier: Notifier,
    /// `None` when the indexer is disabled
    pub reconciler: Option<Arc<Reconciler>>,
    pub chain_id: Option<u64>,
    pub curve: CurveConfig,
}

impl ApiContext {
    pub fn new(store: Arc<dyn MirrorStore>, notifier: Notifier) -> Self {
        Self {
            store,
            notifier,
            reconciler: None,
            chain_id: None,
            curve: CurveConfig::default(),
        }
    }

    pub fn with_curve(mut self, curve: CurveConfig) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_reconciler(mut self, reconciler: Arc<Reconciler>, chain_id: u64) -> Self {
        self.reconciler = Some(reconciler);
        self.chain_id = Some(chain_id);
        self
    }
}
