use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::messages::Frame;

struct Subscriber {
    sender: mpsc::Sender<Frame>,
    /// Cleared by each heartbeat sweep, set again by any client traffic
    alive: AtomicBool,
}

/// Concurrent-safe set of live subscribers.
///
/// Delivery never blocks: a subscriber whose queue is full or closed is
/// removed, which closes its channel and ends its socket task.
pub struct SubscriberRegistry {
    subscribers: DashMap<Uuid, Subscriber>,
    queue_size: usize,
}

impl SubscriberRegistry {
    pub fn new(queue_size: usize) -> Self {
        Self {
            subscribers: DashMap::new(),
            queue_size: queue_size.max(1),
        }
    }

    /// Register a subscriber. `initial` frames are queued before the
    /// subscriber becomes visible to broadcasts, so they are always received first.
    pub fn register(&self, initial: impl IntoIterator<Item = Frame>) -> (Uuid, mpsc::Receiver<Frame>) {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.queue_size);

        for frame in initial {
            if sender.try_send(frame).is_err() {
                break;
            }
        }

        self.subscribers.insert(
            id,
            Subscriber {
                sender,
                alive: AtomicBool::new(true),
            },
        );
        info!(client_id = %id, subscribers = self.subscribers.len(), "Subscriber registered");
        (id, receiver)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            info!(client_id = %id, subscribers = self.subscribers.len(), "Subscriber removed");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.subscribers.len()
    }

    /// Record client traffic (pong or any message)
    pub fn mark_alive(&self, id: &Uuid) {
        if let Some(subscriber) = self.subscribers.get(id) {
            subscriber.alive.store(true, Ordering::Relaxed);
        }
    }

    /// Send to a single subscriber
    pub fn send_to(&self, id: &Uuid, frame: Frame) -> bool {
        let result = match self.subscribers.get(id) {
            Some(subscriber) => subscriber.sender.try_send(frame),
            None => return false,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                self.drop_failed(id, &e);
                false
            }
        }
    }

    /// Fan out to every subscriber. Returns the number that accepted the frame.
    pub fn broadcast(&self, frame: &Frame) -> usize {
        let mut delivered = 0;
        let mut failed = Vec::new();

        for entry in self.subscribers.iter() {
            match entry.sender.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => failed.push((*entry.key(), e)),
            }
        }

        // Removal happens outside the iteration to avoid holding shard locks
        for (id, error) in failed {
            self.drop_failed(&id, &error);
        }

        delivered
    }

    /// Drop subscribers that stayed silent since the previous sweep and
    /// probe the rest. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let mut dead = Vec::new();
        let mut failed = Vec::new();

        for entry in self.subscribers.iter() {
            if !entry.alive.swap(false, Ordering::Relaxed) {
                dead.push(*entry.key());
                continue;
            }
            if let Err(e) = entry.sender.try_send(Frame::Probe) {
                failed.push((*entry.key(), e));
            }
        }

        for id in &dead {
            if self.subscribers.remove(id).is_some() {
                debug!(client_id = %id, "Subscriber missed liveness probe");
            }
        }
        indexer_metrics::counters::subscribers_dropped(dead.len() as u64, "heartbeat");

        let failed_count = failed.len();
        for (id, error) in failed {
            self.drop_failed(&id, &error);
        }

        dead.len() + failed_count
    }

    fn drop_failed(&self, id: &Uuid, error: &TrySendError<Frame>) {
        let reason = match error {
            TrySendError::Full(_) => "queue_full",
            TrySendError::Closed(_) => "closed",
        };
        if self.subscribers.remove(id).is_some() {
            warn!(client_id = %id, reason = reason, "Dropping subscriber");
            indexer_metrics::counters::subscribers_dropped(1, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn text(s: &str) -> Frame {
        Frame::Text(Arc::from(s))
    }

    #[tokio::test]
    async fn test_initial_frames_precede_broadcasts() {
        let registry = SubscriberRegistry::new(8);
        let (_, mut rx) = registry.register([text("snapshot")]);
        registry.broadcast(&text("event"));

        assert_eq!(rx.recv().await, Some(text("snapshot")));
        assert_eq!(rx.recv().await, Some(text("event")));
    }

    #[tokio::test]
    async fn test_full_queue_drops_only_that_subscriber() {
        let registry = SubscriberRegistry::new(1);
        let (_slow, _slow_rx) = registry.register([text("snapshot")]);
        let (_fast, mut fast_rx) = registry.register([]);

        let delivered = registry.broadcast(&text("event"));
        assert_eq!(delivered, 1);
        assert_eq!(registry.count(), 1);
        assert_eq!(fast_rx.recv().await, Some(text("event")));
    }

    #[tokio::test]
    async fn test_closed_receiver_is_removed() {
        let registry = SubscriberRegistry::new(4);
        let (_, rx) = registry.register([]);
        drop(rx);
        assert_eq!(registry.broadcast(&text("event")), 0);
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_drops_silent_subscribers() {
        let registry = SubscriberRegistry::new(4);
        let (chatty, mut chatty_rx) = registry.register([]);
        let (_silent, _silent_rx) = registry.register([]);

        // First sweep probes everyone
        assert_eq!(registry.sweep(), 0);
        assert_eq!(chatty_rx.recv().await, Some(Frame::Probe));

        registry.mark_alive(&chatty);
        assert_eq!(registry.sweep(), 1);
        assert_eq!(registry.count(), 1);
        assert!(registry.send_to(&chatty, text("still here")));
    }
}
