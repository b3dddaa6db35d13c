use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Liveness probe period; a subscriber silent for a whole period is dropped
    pub heartbeat_secs: u64,
    /// Per-subscriber outbound queue capacity
    pub queue_size: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: 30,
            queue_size: 256,
        }
    }
}

impl NotifierConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            heartbeat_secs: env::var("WS_HEARTBEAT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(defaults.heartbeat_secs),
            queue_size: env::var("WS_CLIENT_QUEUE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(defaults.queue_size),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}
