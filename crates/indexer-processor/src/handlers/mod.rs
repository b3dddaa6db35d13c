mod graduated;
mod token_created;
mod trade;

pub use graduated::GraduatedHandler;
pub use token_created::TokenCreatedHandler;
pub use trade::TradeHandler;

use indexer_core::types::Token;

/// Result of applying one event to the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// State changed
    Applied,
    /// Already mirrored; no write happened
    Duplicate,
    /// Event references a token that is not in the mirror
    UnknownToken,
}

/// What a handler changed, for notification
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub outcome: ApplyOutcome,
    /// Token row after the write, when known
    pub token: Option<Token>,
    pub detail: Option<T>,
    /// Disagreements between a newly applied trade and the prior mirror
    pub discrepancies: usize,
}

impl<T> Applied<T> {
    pub fn changed(token: Token, detail: Option<T>) -> Self {
        Self {
            outcome: ApplyOutcome::Applied,
            token: Some(token),
            detail,
            discrepancies: 0,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            outcome: ApplyOutcome::Duplicate,
            token: None,
            detail: None,
            discrepancies: 0,
        }
    }

    pub fn unknown() -> Self {
        Self {
            outcome: ApplyOutcome::UnknownToken,
            token: None,
            detail: None,
            discrepancies: 0,
        }
    }
}
