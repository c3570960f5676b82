use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The authenticated user's profile as returned by the server.
///
/// Fields the client does not know about are kept in `extra` so that a
/// persisted profile round-trips without loss.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Gold holdings in grams.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub user_gold: f64,

    /// Wallet balance in rupees.
    #[serde(default, deserialize_with = "null_as_zero")]
    pub user_wallet: f64,

    /// Any other fields supplied by the server.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// The name to greet the user by: full name, then user name, then email.
    pub fn display_name(&self) -> &str {
        [&self.full_name, &self.user_name, &self.email]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|name| !name.is_empty())
            .unwrap_or("")
    }
}

/// Request body for `POST user/signup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignupParams {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Login name.
    pub user_name: String,
    /// Display name.
    pub full_name: String,
    /// Initial gold holdings in grams.
    pub user_gold: f64,
}

/// Request body for `POST user/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginParams {
    /// Login name.
    pub user_name: String,
    /// Password.
    pub password: String,
}

impl LoginParams {
    /// Create a new `LoginParams`.
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }
}

/// Response body for a successful login or signup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    /// Opaque bearer token.
    pub token: String,
    /// The authenticated user's profile.
    pub user: UserProfile,
}

/// Balances the server sends as `null` read as zero.
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Option::<f64>::deserialize(deserializer).map(Option::unwrap_or_default)
}
