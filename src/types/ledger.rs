use serde::{Deserialize, Serialize};

/// Request body for `POST gold/buy` and `POST gold/sell`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoldTradeParams {
    /// Quantity of gold in grams.
    pub gold_gram: f64,
}

/// Request body for `POST gold/addmoney`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddMoneyParams {
    /// Amount in rupees.
    pub amount: f64,
}

/// Authoritative balances after a buy or sell.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeResponse {
    /// Wallet balance in rupees.
    pub wallet: f64,
    /// Gold holdings in grams.
    pub gold: f64,
}

/// The subset of the user record returned by `POST gold/addmoney`.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdate {
    /// Wallet balance in rupees.
    pub user_wallet: f64,
}

/// Authoritative balances after adding money.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddMoneyResponse {
    /// The updated user record.
    pub user: WalletUpdate,
    /// Gold holdings in grams, when the server reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<f64>,
}
