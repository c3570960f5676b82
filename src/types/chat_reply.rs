use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST chat/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatQuery {
    /// The user's message, sent verbatim.
    pub query: String,
}

impl ChatQuery {
    /// Create a new `ChatQuery`.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Suggested follow-up questions as the server sends them.
///
/// The server sends either a list of strings or a single string holding a
/// JSON-encoded list. Anything else is kept as `Other` so that the reply as a
/// whole still decodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SuggestionPayload {
    /// A list of suggestions.
    List(Vec<String>),

    /// A JSON-encoded list of suggestions.
    Encoded(String),

    /// Any other shape.
    Other(Value),
}

/// Why a suggestion payload could not be turned into a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionDecodeError {
    /// Description of the malformed payload.
    pub detail: String,
}

impl SuggestionPayload {
    /// Decode the payload into an ordered list of suggestions.
    ///
    /// Callers that only want the list should use [`SuggestionPayload::into_list`].
    pub fn decode(self) -> Result<Vec<String>, SuggestionDecodeError> {
        match self {
            SuggestionPayload::List(list) => Ok(list),
            SuggestionPayload::Encoded(text) => {
                serde_json::from_str::<Vec<String>>(&text).map_err(|err| SuggestionDecodeError {
                    detail: format!("encoded suggestions are not a list of strings: {err}"),
                })
            }
            SuggestionPayload::Other(value) => Err(SuggestionDecodeError {
                detail: format!("unexpected suggestion payload: {value}"),
            }),
        }
    }

    /// Decode the payload, treating any malformed payload as empty.
    pub fn into_list(self) -> Vec<String> {
        self.decode().unwrap_or_default()
    }
}

/// Response body for `POST chat/chat`.
///
/// Every field is optional; the fields that drive UI affordances are kept as
/// raw JSON so a surprising type never fails the whole reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    /// The assistant's answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// Suggested follow-up questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<SuggestionPayload>,

    /// Whether the buy call-to-action should be offered.
    #[serde(
        default,
        rename = "showBuyButton",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_buy_button: Option<Value>,

    /// Intent code; `1` means the user wants to see their dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intention: Option<Value>,
}

/// Intent code signalling the dashboard affordance.
pub const DASHBOARD_INTENT: i64 = 1;

impl ChatReply {
    /// The answer, if present and non-empty.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|answer| !answer.is_empty())
    }

    /// Whether the buy affordance is requested, using JSON truthiness.
    pub fn wants_buy(&self) -> bool {
        self.show_buy_button.as_ref().is_some_and(is_truthy)
    }

    /// Whether the intent code equals [`DASHBOARD_INTENT`].
    pub fn wants_dashboard(&self) -> bool {
        match &self.intention {
            Some(Value::Number(n)) => {
                n.as_i64() == Some(DASHBOARD_INTENT) || n.as_f64() == Some(DASHBOARD_INTENT as f64)
            }
            _ => false,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
