use indexer_core::types::{AggregateStats, DomainEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Server-to-client messages
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Outbound {
    Stats(AggregateStats),
    Event(DomainEvent),
    Pong,
}

impl Outbound {
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Stats(_) => "stats",
            Outbound::Event(_) => "event",
            Outbound::Pong => "pong",
        }
    }

    pub fn to_frame(&self) -> serde_json::Result<Frame> {
        Ok(Frame::Text(Arc::from(serde_json::to_string(self)?)))
    }
}

/// Client-to-server control messages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inbound {
    Ping,
}

impl Inbound {
    /// `None` for anything that is not a known control message
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// What a subscriber's socket task is asked to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Pre-serialized JSON, shared across subscribers
    Text(Arc<str>),
    /// Transport-level liveness probe
    Probe,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pong_has_no_data() {
        assert_eq!(serde_json::to_string(&Outbound::Pong).unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_inbound_ping_only() {
        assert_eq!(Inbound::parse(r#"{"type":"ping"}"#), Some(Inbound::Ping));
        assert_eq!(Inbound::parse(r#"{"type":"subscribe"}"#), None);
        assert_eq!(Inbound::parse("not json"), None);
    }

    #[test]
    fn test_stats_frame_shape() {
        let stats = AggregateStats::from_totals(&Default::default(), 0);
        let Frame::Text(text) = Outbound::Stats(stats).to_frame().unwrap() else {
            panic!("expected text frame");
        };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "stats");
        assert_eq!(json["data"]["totalTokens"], 0);
    }
}
