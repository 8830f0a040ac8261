//! # mockauth-session
//!
//! Session manager for mockauth.
//!
//! Wraps the [`mockauth_store::AuthStore`] in an in-memory reactive layer:
//! a three-state lifecycle (`Unknown` → `Authenticated` /
//! `Unauthenticated`), a `watch` channel carrying the current
//! [`SessionSnapshot`], and a broadcast bus of [`SessionEvent`]s for
//! presentation collaborators (toasts, navigation).
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mockauth_session::SessionManager;
//! use mockauth_store::{AuthStore, MemoryStorage};
//!
//! let store = AuthStore::new(Arc::new(MemoryStorage::new()));
//! let manager = SessionManager::new(store);
//!
//! manager.initialize().await?;
//! let user = manager.register("a@x.com", "secret1", "A").await?;
//! assert!(manager.is_authenticated());
//! ```

pub mod error;
pub mod events;
pub mod manager;

// Re-export key types at the crate root for convenience.
pub use error::{Result, SessionError};
pub use events::{SessionBus, SessionEvent};
pub use manager::{AuthState, SessionManager, SessionSnapshot};
