//! The authenticated session.
//!
//! [`SessionStore`] is the one place the bearer token and user profile live.
//! It is constructed once at start-up from durable storage and passed
//! explicitly to everything that needs the session.

use crate::backend::AuthBackend;
use crate::error::Result;
use crate::observability::{SESSION_AUTH_FAILURES, SESSION_LOGINS, SESSION_LOGOUTS};
use crate::storage::Storage;
use crate::types::{AuthResponse, LoginParams, SignupParams, UserProfile};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the JSON-serialized user profile.
pub const USER_KEY: &str = "user";

/// Token and profile, mirrored into durable storage.
#[derive(Debug)]
pub struct SessionStore<S: Storage> {
    storage: S,
    token: Option<String>,
    user: Option<UserProfile>,
}

impl<S: Storage> SessionStore<S> {
    /// Restores the session persisted in `storage`.
    ///
    /// The profile is only loaded when a token is present. A profile that is
    /// missing or fails to parse is treated as absent; the token is kept.
    pub fn open(storage: S) -> Self {
        let token = storage.get(TOKEN_KEY);
        let user = if token.is_some() {
            storage
                .get(USER_KEY)
                .and_then(|raw| match serde_json::from_str::<UserProfile>(&raw) {
                    Ok(user) => Some(user),
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring malformed persisted profile");
                        None
                    }
                })
        } else {
            None
        };
        Self {
            storage,
            token,
            user,
        }
    }

    /// Registers a new account and starts a session for it.
    pub async fn signup<B: AuthBackend + ?Sized>(
        &mut self,
        backend: &B,
        params: &SignupParams,
    ) -> Result<&UserProfile> {
        let response = backend.signup(params).await.inspect_err(|err| {
            if err.is_auth_failure() {
                SESSION_AUTH_FAILURES.click();
            }
        })?;
        self.establish(response)
    }

    /// Logs into an existing account and starts a session for it.
    pub async fn login<B: AuthBackend + ?Sized>(
        &mut self,
        backend: &B,
        params: &LoginParams,
    ) -> Result<&UserProfile> {
        let response = backend.login(params).await.inspect_err(|err| {
            if err.is_auth_failure() {
                SESSION_AUTH_FAILURES.click();
            }
        })?;
        self.establish(response)
    }

    /// Ends the session, in memory and in storage. No server call is made.
    ///
    /// Memory is only cleared once storage no longer holds the session, so a
    /// failed write leaves the session intact.
    pub fn logout(&mut self) -> Result<()> {
        self.storage.remove_all(&[TOKEN_KEY, USER_KEY])?;
        self.token = None;
        self.user = None;
        SESSION_LOGOUTS.click();
        Ok(())
    }

    /// Overwrites the profile's balances with authoritative values and
    /// persists the result.
    ///
    /// A session whose profile could not be restored gets a profile holding
    /// just these balances. The in-memory profile is updated even when
    /// persisting it fails.
    pub fn update_balances(&mut self, wallet: f64, gold: f64) -> Result<()> {
        let user = self.user.get_or_insert_with(UserProfile::default);
        user.user_wallet = wallet;
        user.user_gold = gold;
        let raw = serde_json::to_string(user)?;
        self.storage.set(USER_KEY, raw)
    }

    /// The in-memory bearer token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The bearer token as durable storage currently holds it.
    ///
    /// Authenticated requests read their bearer from here.
    pub fn persisted_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY)
    }

    /// The loaded profile.
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Whether a profile is loaded.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn establish(&mut self, response: AuthResponse) -> Result<&UserProfile> {
        let raw = serde_json::to_string(&response.user)?;
        self.storage
            .set_all(&[(TOKEN_KEY, response.token.clone()), (USER_KEY, raw)])?;
        SESSION_LOGINS.click();
        self.token = Some(response.token);
        Ok(&*self.user.insert(response.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::MemoryStorage;
    use std::sync::Mutex;

    struct FakeAuth {
        status: Option<u16>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeAuth {
        fn accepting() -> Self {
            Self {
                status: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn rejecting(status: u16) -> Self {
            Self {
                status: Some(status),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn respond(&self, name: &str, user_name: &str, failure: &str) -> Result<AuthResponse> {
            self.calls.lock().unwrap().push(name.to_string());
            if let Some(status) = self.status {
                return Err(Error::auth_failure(status, failure));
            }
            Ok(AuthResponse {
                token: format!("token-for-{user_name}"),
                user: UserProfile {
                    user_name: Some(user_name.to_string()),
                    user_wallet: 1000.0,
                    user_gold: 1.5,
                    ..UserProfile::default()
                },
            })
        }
    }

    #[async_trait::async_trait]
    impl AuthBackend for FakeAuth {
        async fn signup(&self, params: &SignupParams) -> Result<AuthResponse> {
            self.respond("signup", &params.user_name, "Signup failed")
        }

        async fn login(&self, params: &LoginParams) -> Result<AuthResponse> {
            self.respond("login", &params.user_name, "Login failed")
        }
    }

    #[tokio::test]
    async fn login_persists_token_and_profile() {
        let backend = FakeAuth::accepting();
        let mut session = SessionStore::open(MemoryStorage::new());
        assert!(!session.is_authenticated());

        let user = session
            .login(&backend, &LoginParams::new("asha", "pw"))
            .await
            .unwrap();
        assert_eq!(user.user_name.as_deref(), Some("asha"));
        assert_eq!(session.token(), Some("token-for-asha"));
        assert_eq!(
            session.persisted_token().as_deref(),
            Some("token-for-asha")
        );

        let stored = session.storage().get(USER_KEY).unwrap();
        let stored: UserProfile = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.user_name.as_deref(), Some("asha"));
    }

    #[tokio::test]
    async fn signup_starts_session() {
        let backend = FakeAuth::accepting();
        let mut session = SessionStore::open(MemoryStorage::new());
        let params = SignupParams {
            user_name: "ravi".to_string(),
            ..SignupParams::default()
        };
        session.signup(&backend, &params).await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(backend.calls.lock().unwrap().as_slice(), ["signup"]);
    }

    #[tokio::test]
    async fn rejected_login_leaves_session_untouched() {
        let backend = FakeAuth::rejecting(401);
        let mut session = SessionStore::open(MemoryStorage::new());
        let err = session
            .login(&backend, &LoginParams::new("asha", "wrong"))
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(err.status_code(), Some(401));
        assert!(session.token().is_none());
        assert!(session.storage().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_memory_and_storage() {
        let backend = FakeAuth::accepting();
        let mut session = SessionStore::open(MemoryStorage::new());
        session
            .login(&backend, &LoginParams::new("asha", "pw"))
            .await
            .unwrap();
        session.logout().unwrap();

        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert!(session.storage().is_empty());

        let restarted = SessionStore::open(session.storage().clone());
        assert!(restarted.token().is_none());
        assert!(restarted.user().is_none());
    }

    #[test]
    fn open_restores_persisted_session() {
        let mut storage = MemoryStorage::new();
        storage
            .set_all(&[
                (TOKEN_KEY, "abc".to_string()),
                (USER_KEY, r#"{"userName":"asha","userWallet":10}"#.to_string()),
            ])
            .unwrap();
        let session = SessionStore::open(storage);
        assert_eq!(session.token(), Some("abc"));
        assert_eq!(session.user().unwrap().user_wallet, 10.0);
    }

    #[test]
    fn open_without_token_ignores_profile() {
        let mut storage = MemoryStorage::new();
        storage
            .set(USER_KEY, r#"{"userName":"asha"}"#.to_string())
            .unwrap();
        let session = SessionStore::open(storage);
        assert!(session.token().is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn open_with_malformed_profile_keeps_token() {
        let mut storage = MemoryStorage::new();
        storage
            .set_all(&[
                (TOKEN_KEY, "abc".to_string()),
                (USER_KEY, "{broken".to_string()),
            ])
            .unwrap();
        let session = SessionStore::open(storage);
        assert_eq!(session.token(), Some("abc"));
        assert!(session.user().is_none());
    }

    /// Storage whose writes can be made to fail.
    #[derive(Debug, Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: bool,
    }

    impl Storage for FlakyStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set_all(&mut self, entries: &[(&str, String)]) -> Result<()> {
            if self.fail_writes {
                return Err(Error::io("disk full", std::io::Error::other("disk full")));
            }
            self.inner.set_all(entries)
        }

        fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
            if self.fail_writes {
                return Err(Error::io("disk full", std::io::Error::other("disk full")));
            }
            self.inner.remove_all(keys)
        }
    }

    #[tokio::test]
    async fn failed_logout_keeps_session() {
        let backend = FakeAuth::accepting();
        let mut session = SessionStore::open(FlakyStorage::default());
        session
            .login(&backend, &LoginParams::new("asha", "pw"))
            .await
            .unwrap();
        session.storage.fail_writes = true;

        assert!(session.logout().is_err());
        assert_eq!(session.token(), Some("token-for-asha"));
        assert!(session.is_authenticated());
        assert_eq!(
            session.persisted_token().as_deref(),
            Some("token-for-asha")
        );

        session.storage.fail_writes = false;
        session.logout().unwrap();
        assert!(session.token().is_none());
        assert!(session.persisted_token().is_none());
    }

    #[test]
    fn open_restores_profile_with_null_balance() {
        let mut storage = MemoryStorage::new();
        storage
            .set_all(&[
                (TOKEN_KEY, "abc".to_string()),
                (
                    USER_KEY,
                    r#"{"userName":"asha","userGold":null,"userWallet":50}"#.to_string(),
                ),
            ])
            .unwrap();
        let session = SessionStore::open(storage);
        let user = session.user().unwrap();
        assert_eq!(user.user_gold, 0.0);
        assert_eq!(user.user_wallet, 50.0);
    }

    #[test]
    fn update_balances_without_profile_creates_one() {
        let mut storage = MemoryStorage::new();
        storage
            .set_all(&[(TOKEN_KEY, "abc".to_string()), (USER_KEY, "{broken".to_string())])
            .unwrap();
        let mut session = SessionStore::open(storage);
        assert!(session.user().is_none());

        session.update_balances(700.0, 1.25).unwrap();
        let user = session.user().unwrap();
        assert_eq!(user.user_wallet, 700.0);
        assert_eq!(user.user_gold, 1.25);

        let restored = SessionStore::open(session.storage().clone());
        assert_eq!(restored.user().unwrap().user_wallet, 700.0);
    }

    #[tokio::test]
    async fn update_balances_persists() {
        let backend = FakeAuth::accepting();
        let mut session = SessionStore::open(MemoryStorage::new());
        session
            .login(&backend, &LoginParams::new("asha", "pw"))
            .await
            .unwrap();
        session.update_balances(250.0, 3.25).unwrap();

        let user = session.user().unwrap();
        assert_eq!(user.user_wallet, 250.0);
        assert_eq!(user.user_gold, 3.25);

        let restored = SessionStore::open(session.storage().clone());
        assert_eq!(restored.user().unwrap().user_wallet, 250.0);
        assert_eq!(restored.user().unwrap().user_gold, 3.25);
    }
}
