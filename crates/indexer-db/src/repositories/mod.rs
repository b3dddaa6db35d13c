mod agent;
mod comment;
mod stats;
mod sync_state;
mod token;
mod trade;

pub use agent::AgentRepository;
pub use comment::CommentRepository;
pub use stats::{StatsRepository, StatsTable, TopTokenRow};
pub use sync_state::SyncStateRepository;
pub use token::{ReserveUpdateParams, TokenFilter, TokenRepository};
pub use trade::{TradeFilter, TradeRepository};
