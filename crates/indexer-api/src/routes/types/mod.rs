pub mod comment;
pub mod quote;
pub mod status;
pub mod token;
pub mod trade;

pub use comment::ApiComment;
pub use quote::ApiQuote;
pub use status::ApiStatus;
pub use token::ApiToken;
pub use trade::ApiTrade;
