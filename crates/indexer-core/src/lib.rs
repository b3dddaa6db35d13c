pub mod config;
pub mod curve;
pub mod decoder;
pub mod error;
pub mod events;
pub mod types;

pub use config::{ChainConfig, CurveConfig, IndexerConfig, ReconcilerConfig, MAX_LOG_RANGE};
pub use decoder::{apply_order, ChainEvent, EventDecoder, EventPayload, LogKind, LogMeta};
pub use error::{IndexerError, Result, StaleRead};
