//! Seams between client-side state and the remote Aurum service.
//!
//! The chat controller, session store and portfolio actions talk to the
//! service only through these traits. [`AurumClient`] implements all three;
//! tests substitute in-memory implementations.
//!
//! [`AurumClient`]: crate::AurumClient

use crate::error::Result;
use crate::types::{
    AddMoneyParams, AddMoneyResponse, AuthResponse, ChatQuery, ChatReply, GoldTradeParams,
    LoginParams, SignupParams, TradeResponse,
};

/// The conversational endpoint.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends one user query and returns the decoded reply.
    async fn chat(&self, query: &ChatQuery) -> Result<ChatReply>;
}

/// The account endpoints.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Registers a new account.
    ///
    /// A non-success response is reported as [`Error::AuthFailure`].
    ///
    /// [`Error::AuthFailure`]: crate::Error::AuthFailure
    async fn signup(&self, params: &SignupParams) -> Result<AuthResponse>;

    /// Logs into an existing account.
    ///
    /// A non-success response is reported as [`Error::AuthFailure`].
    ///
    /// [`Error::AuthFailure`]: crate::Error::AuthFailure
    async fn login(&self, params: &LoginParams) -> Result<AuthResponse>;
}

/// The ledger endpoints. Every call carries the session's bearer token.
#[async_trait::async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Buys gold with wallet funds.
    async fn buy_gold(&self, token: Option<&str>, params: GoldTradeParams)
    -> Result<TradeResponse>;

    /// Sells gold into the wallet.
    async fn sell_gold(
        &self,
        token: Option<&str>,
        params: GoldTradeParams,
    ) -> Result<TradeResponse>;

    /// Adds money to the wallet.
    async fn add_money(
        &self,
        token: Option<&str>,
        params: AddMoneyParams,
    ) -> Result<AddMoneyResponse>;
}
