use alloy::rpc::types::Log;
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use tracing::{trace, warn};

use crate::events::{TokenCreated, TokenGraduated, TokensPurchased, TokensSold};
use crate::types::TradeKey;

/// Position of a log on chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogMeta {
    pub block_number: u64,
    pub log_index: u64,
    pub tx_hash: B256,
    /// Present when the provider returns it
    pub block_timestamp: Option<u64>,
}

impl LogMeta {
    /// Natural key for the trade emitted by this log
    pub fn trade_key(&self) -> TradeKey {
        TradeKey::new(self.tx_hash, self.log_index)
    }

    /// Chain ordering key
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

/// Decoded factory event payloads. All amounts stay as integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Created {
        token: Address,
        creator: Address,
        name: String,
        symbol: String,
        timestamp: u64,
    },
    Purchased {
        token: Address,
        buyer: Address,
        eth_in: U256,
        tokens_out: U256,
        fee: U256,
        new_reserve_base: U256,
        new_reserve_quote: U256,
    },
    Sold {
        token: Address,
        seller: Address,
        tokens_in: U256,
        eth_out: U256,
        new_reserve_base: U256,
        new_reserve_quote: U256,
    },
    Graduated {
        token: Address,
        pool: Address,
        base_liquidity: U256,
        quote_liquidity: U256,
    },
}

impl EventPayload {
    pub fn token(&self) -> Address {
        match self {
            EventPayload::Created { token, .. }
            | EventPayload::Purchased { token, .. }
            | EventPayload::Sold { token, .. }
            | EventPayload::Graduated { token, .. } => *token,
        }
    }

    pub fn kind(&self) -> LogKind {
        match self {
            EventPayload::Created { .. } => LogKind::Created,
            EventPayload::Purchased { .. } => LogKind::Purchased,
            EventPayload::Sold { .. } => LogKind::Sold,
            EventPayload::Graduated { .. } => LogKind::Graduated,
        }
    }
}

/// A decoded event with its chain position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEvent {
    pub meta: LogMeta,
    pub payload: EventPayload,
}

/// Closed classification of factory logs by topic0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Created,
    Purchased,
    Sold,
    Graduated,
    Unrecognized,
}

impl LogKind {
    /// Kinds fetched every tick
    pub const WATCHED: [LogKind; 4] = [
        LogKind::Created,
        LogKind::Purchased,
        LogKind::Sold,
        LogKind::Graduated,
    ];

    pub fn classify(topic0: &B256) -> Self {
        match *topic0 {
            sig if sig == TokenCreated::SIGNATURE_HASH => LogKind::Created,
            sig if sig == TokensPurchased::SIGNATURE_HASH => LogKind::Purchased,
            sig if sig == TokensSold::SIGNATURE_HASH => LogKind::Sold,
            sig if sig == TokenGraduated::SIGNATURE_HASH => LogKind::Graduated,
            _ => LogKind::Unrecognized,
        }
    }

    /// Event signature hash, `None` for `Unrecognized`
    pub fn signature(&self) -> Option<B256> {
        match self {
            LogKind::Created => Some(TokenCreated::SIGNATURE_HASH),
            LogKind::Purchased => Some(TokensPurchased::SIGNATURE_HASH),
            LogKind::Sold => Some(TokensSold::SIGNATURE_HASH),
            LogKind::Graduated => Some(TokenGraduated::SIGNATURE_HASH),
            LogKind::Unrecognized => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Created => "TokenCreated",
            LogKind::Purchased => "TokensPurchased",
            LogKind::Sold => "TokensSold",
            LogKind::Graduated => "TokenGraduated",
            LogKind::Unrecognized => "Unrecognized",
        }
    }
}

/// Turns raw factory logs into typed events. Never fails: anything that
/// cannot be decoded is logged and skipped.
#[derive(Debug, Clone)]
pub struct EventDecoder {
    factory: Address,
}

impl EventDecoder {
    pub fn new(factory: Address) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn classify(&self, log: &Log) -> LogKind {
        if log.address() != self.factory {
            return LogKind::Unrecognized;
        }
        log.topics()
            .first()
            .map(LogKind::classify)
            .unwrap_or(LogKind::Unrecognized)
    }

    pub fn decode(&self, log: &Log) -> Option<ChainEvent> {
        let kind = self.classify(log);
        if kind == LogKind::Unrecognized {
            trace!(address = ?log.address(), "Skipping unrecognized log");
            return None;
        }

        // Pending logs carry no position and cannot be keyed
        let (Some(block_number), Some(log_index), Some(tx_hash)) =
            (log.block_number, log.log_index, log.transaction_hash)
        else {
            warn!(kind = kind.as_str(), "Skipping log without block position");
            return None;
        };

        let meta = LogMeta {
            block_number,
            log_index,
            tx_hash,
            block_timestamp: log.block_timestamp,
        };

        match decode_payload(kind, log) {
            Ok(payload) => Some(ChainEvent { meta, payload }),
            Err(e) => {
                warn!(
                    kind = kind.as_str(),
                    block = block_number,
                    log_index = log_index,
                    error = %e,
                    "Failed to decode log, skipping"
                );
                None
            }
        }
    }

    /// Decode a batch, dropping anything unrecognized or malformed
    pub fn decode_all<'a>(&self, logs: impl IntoIterator<Item = &'a Log>) -> Vec<ChainEvent> {
        logs.into_iter().filter_map(|log| self.decode(log)).collect()
    }
}

fn decode_payload(kind: LogKind, log: &Log) -> alloy_sol_types::Result<EventPayload> {
    let payload = match kind {
        LogKind::Created => {
            let event = TokenCreated::decode_log(&log.inner)?;
            EventPayload::Created {
                token: event.token,
                creator: event.creator,
                name: event.name.clone(),
                symbol: event.symbol.clone(),
                timestamp: event.timestamp.saturating_to::<u64>(),
            }
        }
        LogKind::Purchased => {
            let event = TokensPurchased::decode_log(&log.inner)?;
            EventPayload::Purchased {
                token: event.token,
                buyer: event.buyer,
                eth_in: event.ethIn,
                tokens_out: event.tokensOut,
                fee: event.fee,
                new_reserve_base: event.newReserveETH,
                new_reserve_quote: event.newReserveTokens,
            }
        }
        LogKind::Sold => {
            let event = TokensSold::decode_log(&log.inner)?;
            EventPayload::Sold {
                token: event.token,
                seller: event.seller,
                tokens_in: event.tokensIn,
                eth_out: event.ethOut,
                new_reserve_base: event.newReserveETH,
                new_reserve_quote: event.newReserveTokens,
            }
        }
        LogKind::Graduated => {
            let event = TokenGraduated::decode_log(&log.inner)?;
            EventPayload::Graduated {
                token: event.token,
                pool: event.pool,
                base_liquidity: event.ethLiquidity,
                quote_liquidity: event.tokenLiquidity,
            }
        }
        LogKind::Unrecognized => {
            return Err(alloy_sol_types::Error::Other("unrecognized log".into()));
        }
    };
    Ok(payload)
}

/// Sort a window into apply order: every creation first, then trades and
/// graduations interleaved by (block, log index).
pub fn apply_order(events: &mut [ChainEvent]) {
    events.sort_by_key(|event| {
        let rank = match event.payload {
            EventPayload::Created { .. } => 0u8,
            _ => 1u8,
        };
        (rank, event.meta.block_number, event.meta.log_index)
    });
}
