//! Error types for the mockauth-store crate.
//!
//! All storage operations return [`StoreError`] via [`StoreResult`].
//! Uses `thiserror` for ergonomic, zero-cost error definitions.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Registration attempted with an email that is already taken.
    #[error("user already exists: {email}")]
    DuplicateUser {
        /// The email that was already registered.
        email: String,
    },

    /// Login with an unknown email or a non-matching password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An operation that requires an active session was called without one.
    #[error("no active session")]
    NotAuthenticated,

    /// An invalid argument was provided to a store operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A persisted JSON payload could not be decoded.
    #[error("corrupt stored value: {0}")]
    Decode(#[from] serde_json::Error),

    /// SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A schema migration failed.
    #[error("migration v{version} failed: {message}")]
    Migration { version: u32, message: String },

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

// ── tests ────────────────────────────────────────────────────────────
