// Public modules
pub mod chat_reply;
pub mod ledger;
pub mod message;
pub mod user_profile;

// Re-exports
pub use chat_reply::{
    ChatQuery, ChatReply, DASHBOARD_INTENT, SuggestionDecodeError, SuggestionPayload,
};
pub use ledger::{AddMoneyParams, AddMoneyResponse, GoldTradeParams, TradeResponse, WalletUpdate};
pub use message::{Message, Role};
pub use user_profile::{AuthResponse, LoginParams, SignupParams, UserProfile};
