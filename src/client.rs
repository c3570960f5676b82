use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::backend::{AuthBackend, ChatBackend, LedgerBackend};
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{
    AddMoneyParams, AddMoneyResponse, AuthResponse, ChatQuery, ChatReply, GoldTradeParams,
    LoginParams, SignupParams, TradeResponse,
};

/// Base URL used when neither an explicit URL nor `AURUM_API_URL` is given.
pub const DEFAULT_API_URL: &str = "https://chatgold-1.onrender.com/api/v1/";

/// Environment variable consulted for the API base URL.
pub const API_URL_ENV: &str = "AURUM_API_URL";

const SIGNUP_ENDPOINT: &str = "user/signup";
const LOGIN_ENDPOINT: &str = "user/login";
const CHAT_ENDPOINT: &str = "chat/chat";
const BUY_ENDPOINT: &str = "gold/buy";
const SELL_ENDPOINT: &str = "gold/sell";
const ADD_MONEY_ENDPOINT: &str = "gold/addmoney";

/// Client for the Aurum API.
///
/// Every call is a single JSON `POST`. No request is retried.
#[derive(Clone)]
pub struct AurumClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl AurumClient {
    /// Create a new Aurum client.
    ///
    /// The base URL can be provided directly or read from the AURUM_API_URL
    /// environment variable; otherwise [`DEFAULT_API_URL`] is used. No
    /// request timeout is applied.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env::var(API_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request and response body.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self, bearer: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                Error::validation(
                    "session token contains characters not allowed in a header",
                    Some("token".to_string()),
                )
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Issue one `POST` and return the status code with the raw body.
    async fn post(
        &self,
        endpoint: &str,
        body: &Value,
        logged_body: &Value,
        bearer: Option<&str>,
    ) -> Result<(u16, String)> {
        let url = self.base_url.join(endpoint)?;
        let headers = self.default_headers(bearer)?;

        if let Some(logger) = &self.logger {
            logger.log_request(endpoint, logged_body);
        }
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                tracing::debug!(endpoint, error = %e, "request failed");
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        self.timeout.map(|t| t.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            Error::http_client(format!("Failed to read response: {e}"), Some(Box::new(e)))
        })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        tracing::debug!(endpoint, status, "response received");

        if let Some(logger) = &self.logger {
            logger.log_response(endpoint, status, &text);
        }
        Ok((status, text))
    }

    async fn authenticate<P: serde::Serialize>(
        &self,
        endpoint: &str,
        params: &P,
        failure: &str,
    ) -> Result<AuthResponse> {
        let body = serde_json::to_value(params)?;
        let (status, text) = self.post(endpoint, &body, &redact(&body), None).await?;
        if !is_success(status) {
            return Err(Error::auth_failure(status, failure));
        }
        parse_body(&text)
    }

    async fn ledger<P: serde::Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: Option<&str>,
        params: &P,
    ) -> Result<R> {
        let Some(token) = token else {
            return Err(Error::authentication("not logged in"));
        };
        let body = serde_json::to_value(params)?;
        let (status, text) = self.post(endpoint, &body, &body, Some(token)).await?;
        if !is_success(status) {
            return Err(process_error_body(status, text));
        }
        parse_body(&text)
    }

    /// Register a new account.
    pub async fn signup(&self, params: &SignupParams) -> Result<AuthResponse> {
        self.authenticate(SIGNUP_ENDPOINT, params, "Signup failed")
            .await
    }

    /// Log into an existing account.
    pub async fn login(&self, params: &LoginParams) -> Result<AuthResponse> {
        self.authenticate(LOGIN_ENDPOINT, params, "Login failed")
            .await
    }

    /// Send a chat query.
    ///
    /// The status code is not inspected; the body alone decides the reply.
    pub async fn chat(&self, query: &ChatQuery) -> Result<ChatReply> {
        let body = serde_json::to_value(query)?;
        let (status, text) = self.post(CHAT_ENDPOINT, &body, &body, None).await?;
        if !is_success(status) {
            tracing::warn!(status, "chat endpoint returned a non-success status");
        }
        parse_body(&text)
    }

    /// Buy `params.gold_gram` grams of gold.
    pub async fn buy_gold(
        &self,
        token: Option<&str>,
        params: GoldTradeParams,
    ) -> Result<TradeResponse> {
        self.ledger(BUY_ENDPOINT, token, &params).await
    }

    /// Sell `params.gold_gram` grams of gold.
    pub async fn sell_gold(
        &self,
        token: Option<&str>,
        params: GoldTradeParams,
    ) -> Result<TradeResponse> {
        self.ledger(SELL_ENDPOINT, token, &params).await
    }

    /// Add `params.amount` rupees to the wallet.
    pub async fn add_money(
        &self,
        token: Option<&str>,
        params: AddMoneyParams,
    ) -> Result<AddMoneyResponse> {
        self.ledger(ADD_MONEY_ENDPOINT, token, &params).await
    }
}

impl fmt::Debug for AurumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AurumClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
impl ChatBackend for AurumClient {
    async fn chat(&self, query: &ChatQuery) -> Result<ChatReply> {
        AurumClient::chat(self, query).await
    }
}

#[async_trait::async_trait]
impl AuthBackend for AurumClient {
    async fn signup(&self, params: &SignupParams) -> Result<AuthResponse> {
        AurumClient::signup(self, params).await
    }

    async fn login(&self, params: &LoginParams) -> Result<AuthResponse> {
        AurumClient::login(self, params).await
    }
}

#[async_trait::async_trait]
impl LedgerBackend for AurumClient {
    async fn buy_gold(
        &self,
        token: Option<&str>,
        params: GoldTradeParams,
    ) -> Result<TradeResponse> {
        AurumClient::buy_gold(self, token, params).await
    }

    async fn sell_gold(
        &self,
        token: Option<&str>,
        params: GoldTradeParams,
    ) -> Result<TradeResponse> {
        AurumClient::sell_gold(self, token, params).await
    }

    async fn add_money(
        &self,
        token: Option<&str>,
        params: AddMoneyParams,
    ) -> Result<AddMoneyResponse> {
        AurumClient::add_money(self, token, params).await
    }
}

/// Parse a base URL, making sure relative endpoints resolve beneath it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{raw} cannot be used as a base URL"), None));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        Error::serialization(
            format!("Failed to parse response: {e}"),
            Some(Box::new(e)),
        )
    })
}

/// Convert a rejected ledger response into an [`Error::Api`].
fn process_error_body(status: u16, body: String) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<String>,
    }

    let reason = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.error)
        .filter(|e| !e.is_empty());
    Error::api(status, reason, body)
}

fn redact(body: &Value) -> Value {
    let mut body = body.clone();
    if let Some(password) = body.get_mut("password") {
        *password = Value::String("********".to_string());
    }
    body
}
