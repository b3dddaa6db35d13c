mod notifier;
pub mod traits;

pub use notifier::NotifierSink;
pub use traits::{EventSink, SinkEvent};

use std::sync::Arc;
use tracing::warn;

/// Composite sink that fans out to multiple sinks.
/// A failing sink is logged and does not stop the others.
pub struct CompositeSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub async fn emit(&self, event: SinkEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.handle_event(event.clone()).await {
                warn!(sink = sink.name(), error = %e, "Failed to emit event to sink");
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Default for CompositeSink {
    fn default() -> Self {
        Self::new()
    }
}
