//! Error types for the session manager crate.

use mockauth_store::StoreError;

/// Unified error type for the session manager.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An error propagated from the session store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, SessionError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
