//! Reactive session state over the auth store.
//!
//! [`SessionManager`] wraps an [`AuthStore`] and tracks where the session
//! is in its lifecycle:
//!
//! ```text
//!            initialize()
//!   Unknown ─────────────► Authenticated ◄──┐
//!      │                        │           │ login() / register()
//!      └────────────────► Unauthenticated ──┘
//!            initialize()       ▲
//!                               │ logout()
//!                               └─── (from Authenticated)
//! ```
//!
//! A failed login or register leaves the state unchanged and surfaces the
//! error to the caller. Current state is exposed as a [`SessionSnapshot`]
//! on a `watch` channel; transitions additionally publish
//! [`SessionEvent`]s for presentation collaborators.
//!
//! Callers are expected to run [`SessionManager::initialize`] once at
//! startup before invoking the other operations.

use chrono::Utc;
use mockauth_store::{AuthStore, StoreError, UserRecord};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::events::{SessionBus, SessionEvent};

/// Event bus capacity; slow subscribers past this many events see `Lagged`.
const EVENT_CAPACITY: usize = 64;

// ═══════════════════════════════════════════════════════════════════════
//  State
// ═══════════════════════════════════════════════════════════════════════

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    /// Startup state, before the first [`SessionManager::initialize`].
    #[default]
    Unknown,
    /// A token is persisted; the session is considered active.
    Authenticated,
    /// No session is active.
    Unauthenticated,
}

/// The reactive view of the session, published on a `watch` channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    /// Current lifecycle state.
    pub state: AuthState,
    /// The current user, when one is persisted.
    pub user: Option<UserRecord>,
    /// True while an operation is in flight.
    pub loading: bool,
}

// ═══════════════════════════════════════════════════════════════════════
//  SessionManager
// ═══════════════════════════════════════════════════════════════════════

/// Session lifecycle manager over an [`AuthStore`].
///
/// Holds only a cached, disposable copy of session state; the store owns
/// everything persisted.
pub struct SessionManager {
    store: AuthStore,
    bus: SessionBus,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    /// Create a manager over `store`, starting in [`AuthState::Unknown`].
    pub fn new(store: AuthStore) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            store,
            bus: SessionBus::new(EVENT_CAPACITY),
            snapshot_tx,
        }
    }

    /// Probe the store and settle the initial state.
    ///
    /// Moves `Unknown` to `Authenticated` when a session was persisted,
    /// `Unauthenticated` otherwise. A corrupt persisted user downgrades
    /// to "no user" at startup instead of wedging the caller.
    pub async fn initialize(&self) -> Result<AuthState> {
        self.set_loading(true);

        let verified = match self.store.verify().await {
            Ok(v) => v,
            Err(err) => {
                self.set_loading(false);
                return Err(err.into());
            }
        };

        let user = if verified {
            match self.store.current_user().await {
                Ok(user) => user,
                Err(StoreError::Decode(err)) => {
                    warn!(%err, "persisted user is corrupt, continuing without one");
                    None
                }
                Err(err) => {
                    self.set_loading(false);
                    return Err(err.into());
                }
            }
        } else {
            None
        };

        let state = if verified {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        self.update(|s| {
            s.state = state;
            s.user = user;
            s.loading = false;
        });

        debug!(?state, "session initialized");
        Ok(state)
    }

    /// Log in and move to `Authenticated` on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserRecord> {
        self.set_loading(true);

        match self.store.login(email, password).await {
            Ok(user) => {
                self.session_started(&user);
                self.bus.publish(SessionEvent::LoggedIn {
                    user: user.clone(),
                    timestamp: Utc::now(),
                });
                Ok(user)
            }
            Err(err) => Err(self.auth_failed("login", err)),
        }
    }

    /// Register a new account and move to `Authenticated` on success.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<UserRecord> {
        self.set_loading(true);

        match self.store.register(email, password, name).await {
            Ok(user) => {
                self.session_started(&user);
                self.bus.publish(SessionEvent::Registered {
                    user: user.clone(),
                    timestamp: Utc::now(),
                });
                Ok(user)
            }
            Err(err) => Err(self.auth_failed("register", err)),
        }
    }

    /// End the session and move to `Unauthenticated`.
    pub async fn logout(&self) -> Result<()> {
        self.set_loading(true);

        match self.store.logout().await {
            Ok(()) => {
                self.update(|s| {
                    s.state = AuthState::Unauthenticated;
                    s.user = None;
                    s.loading = false;
                });
                self.bus.publish(SessionEvent::LoggedOut {
                    timestamp: Utc::now(),
                });
                debug!("session ended");
                Ok(())
            }
            Err(err) => {
                self.set_loading(false);
                Err(err.into())
            }
        }
    }

    /// Replace the active session's token. State is unchanged.
    pub async fn refresh_token(&self) -> Result<String> {
        let token = self.store.refresh_token().await?;
        self.bus.publish(SessionEvent::TokenRefreshed {
            timestamp: Utc::now(),
        });
        Ok(token)
    }

    // ── observation ──────────────────────────────────────────────────

    /// Current snapshot of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AuthState {
        self.snapshot_tx.borrow().state
    }

    /// Current user, when one is cached.
    pub fn user(&self) -> Option<UserRecord> {
        self.snapshot_tx.borrow().user.clone()
    }

    /// True when the session is `Authenticated`.
    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    /// Subscribe to snapshot changes.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<std::sync::Arc<SessionEvent>> {
        self.bus.subscribe()
    }

    /// The underlying store, for callers that read tokens directly.
    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    // ── internals ────────────────────────────────────────────────────

    fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        self.snapshot_tx.send_modify(f);
    }

    fn set_loading(&self, loading: bool) {
        self.update(|s| s.loading = loading);
    }

    fn session_started(&self, user: &UserRecord) {
        let user = user.clone();
        self.update(|s| {
            s.state = AuthState::Authenticated;
            s.user = Some(user);
            s.loading = false;
        });
        debug!("session authenticated");
    }

    fn auth_failed(&self, operation: &str, err: StoreError) -> SessionError {
        self.bus.publish(SessionEvent::AuthFailed {
            operation: operation.to_string(),
            message: err.to_string(),
            timestamp: Utc::now(),
        });
        self.set_loading(false);
        err.into()
    }
}

// ── tests ────────────────────────────────────────────────────────────
