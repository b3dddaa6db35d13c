use async_trait::async_trait;
use indexer_core::Result;
use indexer_notifier::Notifier;

use super::traits::{EventSink, SinkEvent};

/// Pushes each applied change to live subscribers, followed by fresh stats
pub struct NotifierSink {
    notifier: Notifier,
}

impl NotifierSink {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl EventSink for NotifierSink {
    async fn handle_event(&self, event: SinkEvent) -> Result<()> {
        self.notifier.publish_event(event.to_domain_event()).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "notifier"
    }
}
