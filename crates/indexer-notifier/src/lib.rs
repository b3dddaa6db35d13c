//! Live fan-out of reconciled state changes.
//!
//! Transport-agnostic: subscribers receive serialized frames over a bounded
//! channel and the websocket layer in `indexer-api` drains it.

mod config;
mod messages;
mod notifier;
mod registry;

pub use config::NotifierConfig;
pub use messages::{Frame, Inbound, Outbound};
pub use notifier::{Notifier, Subscription};
pub use registry::SubscriberRegistry;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] indexer_core::IndexerError),
}

pub type Result<T> = std::result::Result<T, NotifierError>;
