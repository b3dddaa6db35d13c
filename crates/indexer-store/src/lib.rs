mod agents;
mod comments;
mod resolver;
mod store;
mod sync_state;
mod tokens;
mod trades;
mod traits;

pub use agents::AgentStore;
pub use comments::CommentStore;
pub use resolver::AgentResolver;
pub use store::InMemoryStore;
pub use sync_state::{ReconcilerState, ReconcilerStats};
pub use tokens::TokenStore;
pub use trades::TradeStore;
pub use traits::{MirrorStore, TokenQuery, TradeQuery, MAX_PAGE_SIZE};
