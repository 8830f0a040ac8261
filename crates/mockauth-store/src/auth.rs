//! Mock authentication operations over key-value storage.
//!
//! [`AuthStore`] simulates what a backend auth API would do: it keeps the
//! list of registered accounts under [`USERS_KEY`], and the issued token
//! plus current user under [`TOKEN_KEY`] / [`USER_KEY`]. Passwords are
//! stored and compared in plaintext — this store exists to exercise
//! session plumbing, not to protect anything.
//!
//! At most one session is active per storage instance. Tokens are opaque
//! strings with no real validity; the issue time embedded in them feeds a
//! display-only countdown in the presentation layer.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::backend::StorageBackend;
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Storage keys
// ═══════════════════════════════════════════════════════════════════════

/// Storage key holding the current opaque token.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key holding the JSON-encoded current user.
pub const USER_KEY: &str = "auth_user";

/// Storage key holding the JSON-encoded list of registered credentials.
pub const USERS_KEY: &str = "mock_users";

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A registered user as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique identifier (UUID v7), assigned at registration.
    pub id: String,
    /// Login email — the unique key across accounts.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Unix timestamp when the account was registered.
    pub created_at: i64,
}

/// A stored registration tuple, retained verbatim for login comparison.
///
/// The password is plaintext: the store mocks a backend, it is not one.
/// `user_id` and `registered_at` pin the identity assigned at registration
/// so repeated logins rebuild the same [`UserRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Login email (unique, case-sensitive).
    pub email: String,
    /// Plaintext password as entered at registration.
    pub password: String,
    /// Display name as entered at registration.
    pub name: String,
    /// The user id assigned at registration.
    pub user_id: String,
    /// Unix timestamp of registration.
    pub registered_at: i64,
}

/// An issued token paired with the user it identifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token string.
    pub token: String,
    /// The authenticated user.
    pub user: UserRecord,
}

// ═══════════════════════════════════════════════════════════════════════
//  Token synthesis
// ═══════════════════════════════════════════════════════════════════════

/// Synthesize an opaque token embedding the issue time in millis.
fn issue_token(email: &str) -> String {
    format!("mock-token-{}-{}", email, Utc::now().timestamp_millis())
}

/// Recover the issue time embedded in a token, if the trailing segment
/// parses as unix millis. Display-only — nothing validates tokens here.
pub fn token_issued_at(token: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = token.rsplit('-').next()?.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

// ═══════════════════════════════════════════════════════════════════════
//  Input validation
// ═══════════════════════════════════════════════════════════════════════

/// Minimum accepted password length at registration.
const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));

/// Validate registration input the way the signup form does.
fn validate_registration(email: &str, password: &str, name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidArgument("name is required".into()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(StoreError::InvalidArgument(format!(
            "email is invalid: {email}"
        )));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(StoreError::InvalidArgument(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  AuthStore
// ═══════════════════════════════════════════════════════════════════════

/// Mock auth operations over an injected [`StorageBackend`].
///
/// Cheaply cloneable; all clones share the same backend.
#[derive(Clone)]
pub struct AuthStore {
    backend: Arc<dyn StorageBackend>,
}

impl AuthStore {
    /// Create an auth store over `backend`.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Register a new account and start a session.
    ///
    /// Fails with [`StoreError::DuplicateUser`] when the email is already
    /// registered (case-sensitive exact match), and with
    /// [`StoreError::InvalidArgument`] on malformed input. On success the
    /// new [`UserRecord`] and a fresh token are persisted as the current
    /// session.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> StoreResult<UserRecord> {
        validate_registration(email, password, name)?;

        let mut users = self.users().await?;
        if users.iter().any(|c| c.email == email) {
            return Err(StoreError::DuplicateUser {
                email: email.to_string(),
            });
        }

        let now = Utc::now().timestamp();
        let user = UserRecord {
            id: Uuid::now_v7().to_string(),
            email: email.to_string(),
            name: name.to_string(),
            created_at: now,
        };

        users.push(Credential {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            user_id: user.id.clone(),
            registered_at: now,
        });
        self.save_users(&users).await?;

        let token = issue_token(email);
        self.persist_session(&token, &user).await?;

        debug!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Log in with an existing account.
    ///
    /// Fails with [`StoreError::InvalidCredentials`] on an unknown email
    /// or a non-matching password. On success the [`UserRecord`] assigned
    /// at registration is rebuilt, a fresh token is issued, and both are
    /// persisted as the current session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> StoreResult<UserRecord> {
        let users = self.users().await?;
        let credential = users
            .iter()
            .find(|c| c.email == email)
            .filter(|c| c.password == password)
            .ok_or(StoreError::InvalidCredentials)?;

        let user = UserRecord {
            id: credential.user_id.clone(),
            email: credential.email.clone(),
            name: credential.name.clone(),
            created_at: credential.registered_at,
        };

        let token = issue_token(email);
        self.persist_session(&token, &user).await?;

        debug!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    /// End the current session. Idempotent; never fails on a missing one.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> StoreResult<()> {
        self.backend.remove(TOKEN_KEY).await?;
        self.backend.remove(USER_KEY).await?;
        debug!("session cleared");
        Ok(())
    }

    /// Issue a replacement token for the active session.
    ///
    /// The user entry is untouched. Fails with
    /// [`StoreError::NotAuthenticated`] when no session is active.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> StoreResult<String> {
        if !self.is_authenticated().await? {
            return Err(StoreError::NotAuthenticated);
        }
        let user = self
            .current_user()
            .await?
            .ok_or(StoreError::NotAuthenticated)?;

        let token = issue_token(&user.email);
        self.backend.put(TOKEN_KEY, &token).await?;

        debug!(user_id = %user.id, "token refreshed");
        Ok(token)
    }

    /// Read the persisted current user, without any validation.
    ///
    /// Absent is `None`; corrupt JSON is [`StoreError::Decode`], never a
    /// silent `None`.
    pub async fn current_user(&self) -> StoreResult<Option<UserRecord>> {
        match self.backend.get(USER_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Read the persisted current token.
    pub async fn current_token(&self) -> StoreResult<Option<String>> {
        self.backend.get(TOKEN_KEY).await
    }

    /// Read the full current session — token plus user — when both are
    /// persisted.
    pub async fn current_session(&self) -> StoreResult<Option<Session>> {
        let Some(token) = self.current_token().await? else {
            return Ok(None);
        };
        let Some(user) = self.current_user().await? else {
            return Ok(None);
        };
        Ok(Some(Session { token, user }))
    }

    /// True iff a token is persisted, regardless of its age.
    pub async fn is_authenticated(&self) -> StoreResult<bool> {
        Ok(self.backend.get(TOKEN_KEY).await?.is_some())
    }

    /// Check the session the way a server round-trip would.
    ///
    /// Equivalent to [`Self::is_authenticated`]; kept as a distinct
    /// operation because the session manager treats it as the startup
    /// probe.
    pub async fn verify(&self) -> StoreResult<bool> {
        self.is_authenticated().await
    }

    // ── internals ────────────────────────────────────────────────────

    /// Load the registered credentials, defaulting to empty when the key
    /// has never been written.
    async fn users(&self) -> StoreResult<Vec<Credential>> {
        match self.backend.get(USERS_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persist the registered credentials list.
    async fn save_users(&self, users: &[Credential]) -> StoreResult<()> {
        let json = serde_json::to_string(users)?;
        self.backend.put(USERS_KEY, &json).await
    }

    /// Persist `token` and `user` as the current session.
    async fn persist_session(&self, token: &str, user: &UserRecord) -> StoreResult<()> {
        self.backend.put(TOKEN_KEY, token).await?;
        let json = serde_json::to_string(user)?;
        self.backend.put(USER_KEY, &json).await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStorage;

    fn setup_store() -> AuthStore {
        AuthStore::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn register_starts_a_session() {
        let store = setup_store();

        let user = store.register("a@x.com", "secret1", "A").await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name, "A");

        assert!(store.is_authenticated().await.unwrap());
        assert!(store.current_token().await.unwrap().is_some());
        assert_eq!(store.current_user().await.unwrap().unwrap(), user);
    }

    #[tokio::test]
    async fn register_duplicate_email_fails() {
        let store = setup_store();

        store.register("a@x.com", "secret1", "A").await.unwrap();
        let err = store.register("a@x.com", "other66", "B").await.unwrap_err();
        match err {
            StoreError::DuplicateUser { email } => assert_eq!(email, "a@x.com"),
            other => panic!("expected DuplicateUser, got: {other}"),
        }
    }

    #[tokio::test]
    async fn duplicate_check_is_case_sensitive() {
        let store = setup_store();

        store.register("a@x.com", "secret1", "A").await.unwrap();
        // A different casing is a different account in this mock.
        store.register("A@x.com", "secret1", "A").await.unwrap();
    }

    #[tokio::test]
    async fn login_unknown_email_fails() {
        let store = setup_store();

        let err = store.login("nobody@x.com", "whatever").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_wrong_password_fails() {
        let store = setup_store();

        store.register("a@x.com", "secret1", "A").await.unwrap();
        let err = store.login("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_reuses_registered_identity() {
        let store = setup_store();

        let registered = store.register("a@x.com", "secret1", "A").await.unwrap();
        store.logout().await.unwrap();

        let logged_in = store.login("a@x.com", "secret1").await.unwrap();
        assert_eq!(logged_in.id, registered.id);
        assert_eq!(logged_in.created_at, registered.created_at);
    }

    #[tokio::test]
    async fn login_issues_a_token_for_the_account() {
        let store = setup_store();

        store.register("a@x.com", "secret1", "A").await.unwrap();
        store.login("a@x.com", "secret1").await.unwrap();

        let token = store.current_token().await.unwrap().unwrap();
        assert!(token.starts_with("mock-token-a@x.com-"));
    }

    #[tokio::test]
    async fn current_session_pairs_token_and_user() {
        let store = setup_store();
        assert!(store.current_session().await.unwrap().is_none());

        let user = store.register("a@x.com", "secret1", "A").await.unwrap();
        let session = store.current_session().await.unwrap().unwrap();
        assert_eq!(session.user, user);
        assert_eq!(
            session.token,
            store.current_token().await.unwrap().unwrap()
        );

        store.logout().await.unwrap();
        assert!(store.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_session_and_is_idempotent() {
        let store = setup_store();

        store.register("a@x.com", "secret1", "A").await.unwrap();
        store.logout().await.unwrap();

        assert!(!store.is_authenticated().await.unwrap());
        assert!(store.current_user().await.unwrap().is_none());
        assert!(store.current_token().await.unwrap().is_none());

        // Second logout with no session is safe.
        store.logout().await.unwrap();
    }

    #[tokio::test]
    async fn failed_login_leaves_session_unchanged() {
        let store = setup_store();

        let user = store.register("u@test.com", "secret1", "U").await.unwrap();
        let token = store.current_token().await.unwrap().unwrap();

        let err = store.login("u@test.com", "wrong").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));

        assert_eq!(store.current_user().await.unwrap().unwrap(), user);
        assert_eq!(store.current_token().await.unwrap().unwrap(), token);
    }

    #[tokio::test]
    async fn refresh_token_preserves_user() {
        let store = setup_store();

        let user = store.register("a@x.com", "secret1", "A").await.unwrap();
        let refreshed = store.refresh_token().await.unwrap();

        assert_eq!(store.current_token().await.unwrap().unwrap(), refreshed);
        assert_eq!(store.current_user().await.unwrap().unwrap(), user);
    }

    #[tokio::test]
    async fn refresh_token_without_session_fails() {
        let store = setup_store();

        let err = store.refresh_token().await.unwrap_err();
        assert!(matches!(err, StoreError::NotAuthenticated));

        store.register("a@x.com", "secret1", "A").await.unwrap();
        store.logout().await.unwrap();
        let err = store.refresh_token().await.unwrap_err();
        assert!(matches!(err, StoreError::NotAuthenticated));
    }

    #[tokio::test]
    async fn verify_matches_is_authenticated() {
        let store = setup_store();

        assert!(!store.verify().await.unwrap());
        store.register("a@x.com", "secret1", "A").await.unwrap();
        assert!(store.verify().await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_user_json_is_a_decode_error() {
        let backend = Arc::new(MemoryStorage::new());
        backend.put(USER_KEY, "{not json").await.unwrap();

        let store = AuthStore::new(backend);
        let err = store.current_user().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn corrupt_users_list_fails_registration() {
        let backend = Arc::new(MemoryStorage::new());
        backend.put(USERS_KEY, "[broken").await.unwrap();

        let store = AuthStore::new(backend);
        let err = store.register("a@x.com", "secret1", "A").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn registration_input_is_validated() {
        let store = setup_store();

        let err = store.register("a@x.com", "secret1", "  ").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        let err = store.register("not-an-email", "secret1", "A").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        let err = store.register("a@x.com", "short", "A").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        // Nothing was persisted by the rejected attempts.
        assert!(!store.is_authenticated().await.unwrap());
    }

    #[test]
    fn token_embeds_its_issue_time() {
        let token = issue_token("a@x.com");
        let issued = token_issued_at(&token).unwrap();

        let age = Utc::now().signed_duration_since(issued);
        assert!(age.num_seconds() >= 0);
        assert!(age.num_seconds() < 5);
    }

    #[test]
    fn token_without_millis_has_no_issue_time() {
        assert!(token_issued_at("opaque").is_none());
    }
}
