use indexer_core::types::{now_secs, AggregateStats, DomainEvent};
use indexer_store::MirrorStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::NotifierConfig;
use crate::messages::{Frame, Outbound};
use crate::registry::SubscriberRegistry;
use crate::Result;

/// A registered subscriber's end of the fan-out
pub struct Subscription {
    pub id: Uuid,
    pub receiver: mpsc::Receiver<Frame>,
}

/// Broadcasts domain events and on-demand statistics to live subscribers
#[derive(Clone)]
pub struct Notifier {
    registry: Arc<SubscriberRegistry>,
    store: Arc<dyn MirrorStore>,
    config: NotifierConfig,
}

impl Notifier {
    pub fn new(store: Arc<dyn MirrorStore>, config: NotifierConfig) -> Self {
        Self {
            registry: Arc::new(SubscriberRegistry::new(config.queue_size)),
            store,
            config,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.count()
    }

    /// Aggregate statistics computed from the store on every call
    pub async fn snapshot(&self) -> Result<AggregateStats> {
        let now = now_secs();
        let totals = self.store.stats_totals(now).await?;
        Ok(AggregateStats::from_totals(&totals, now))
    }

    /// Best-effort fan-out. Returns the number of subscribers reached.
    pub fn broadcast(&self, message: &Outbound) -> usize {
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind = message.kind(), error = %e, "Failed to serialize broadcast");
                return 0;
            }
        };
        let delivered = self.registry.broadcast(&frame);
        indexer_metrics::counters::notifications(delivered as u64, message.kind());
        debug!(kind = message.kind(), delivered = delivered, "Broadcast sent");
        delivered
    }

    /// Publish one applied event followed by a fresh stats snapshot
    pub async fn publish_event(&self, event: DomainEvent) {
        self.broadcast(&Outbound::Event(event));

        match self.snapshot().await {
            Ok(stats) => {
                self.broadcast(&Outbound::Stats(stats));
            }
            Err(e) => warn!(error = %e, "Failed to compute stats snapshot"),
        }
    }

    /// Register a new subscriber with the current snapshot queued first
    pub async fn subscribe(&self) -> Subscription {
        let initial = match self.snapshot().await {
            Ok(stats) => match Outbound::Stats(stats).to_frame() {
                Ok(frame) => Some(frame),
                Err(e) => {
                    warn!(error = %e, "Failed to serialize snapshot");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to compute snapshot for new subscriber");
                None
            }
        };

        let (id, receiver) = self.registry.register(initial);
        indexer_metrics::gauges::set_subscribers(self.registry.count());
        Subscription { id, receiver }
    }

    pub fn unsubscribe(&self, id: &Uuid) {
        self.registry.remove(id);
        indexer_metrics::gauges::set_subscribers(self.registry.count());
    }

    /// Reply to a single subscriber (pong)
    pub fn reply(&self, id: &Uuid, message: &Outbound) -> bool {
        match message.to_frame() {
            Ok(frame) => self.registry.send_to(id, frame),
            Err(_) => false,
        }
    }

    pub fn mark_alive(&self, id: &Uuid) {
        self.registry.mark_alive(id);
    }

    /// Periodic liveness sweep
    pub fn start_heartbeat(&self) -> JoinHandle<()> {
        let registry = self.registry.clone();
        let period = self.config.heartbeat_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let removed = registry.sweep();
                if removed > 0 {
                    info!(removed = removed, "Dropped unresponsive subscribers");
                }
                indexer_metrics::gauges::set_subscribers(registry.count());
            }
        })
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.config.heartbeat_interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use indexer_core::types::{Reserves, Token};
    use indexer_store::InMemoryStore;

    fn token() -> Token {
        Token {
            address: Address::repeat_byte(0x11),
            name: "Claw".into(),
            symbol: "CLAW".into(),
            creator: Address::repeat_byte(0x22),
            agent_id: None,
            tx_hash: None,
            migrated: false,
            pool_address: None,
            reserves: Reserves::default(),
            created_at: 0,
        }
    }

    fn kind_of(frame: Frame) -> String {
        match frame {
            Frame::Text(text) => {
                let json: serde_json::Value = serde_json::from_str(&text).unwrap();
                json["type"].as_str().unwrap().to_string()
            }
            Frame::Probe => "probe".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_gets_snapshot_before_events() {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Notifier::new(store.clone(), NotifierConfig::default());

        store.upsert_token_on_create(token()).await.unwrap();
        let mut sub = notifier.subscribe().await;
        notifier.publish_event(DomainEvent::deploy(&token())).await;

        assert_eq!(kind_of(sub.receiver.recv().await.unwrap()), "stats");
        assert_eq!(kind_of(sub.receiver.recv().await.unwrap()), "event");
        assert_eq!(kind_of(sub.receiver.recv().await.unwrap()), "stats");
        assert!(sub.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_snapshot_reflects_store() {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Notifier::new(store.clone(), NotifierConfig::default());
        assert_eq!(notifier.snapshot().await.unwrap().total_tokens, 0);

        store.upsert_token_on_create(token()).await.unwrap();
        assert_eq!(notifier.snapshot().await.unwrap().total_tokens, 1);
    }

    #[tokio::test]
    async fn test_reply_and_unsubscribe() {
        let notifier = Notifier::new(Arc::new(InMemoryStore::new()), NotifierConfig::default());
        let mut sub = notifier.subscribe().await;
        let _snapshot = sub.receiver.recv().await.unwrap();

        assert!(notifier.reply(&sub.id, &Outbound::Pong));
        assert_eq!(kind_of(sub.receiver.recv().await.unwrap()), "pong");

        notifier.unsubscribe(&sub.id);
        assert_eq!(notifier.subscriber_count(), 0);
        assert_eq!(notifier.broadcast(&Outbound::Pong), 0);
    }
}
