//! # mockauth-store
//!
//! Session store for mockauth.
//!
//! Persists a mock authentication world — registered accounts, the
//! current token, and the current user — under three well-known keys in
//! pluggable key-value storage (SQLite by default, in-memory for tests).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  AuthStore (register / login / logout / │
//! │             refresh / verify)           │
//! ├─────────────────────────────────────────┤
//! │  StorageBackend trait                   │
//! │    SqliteStorage   (kv_entries table)   │
//! │    MemoryStorage   (HashMap)            │
//! ├─────────────────────────────────────────┤
//! │  Database (rusqlite WAL)                │
//! │  Migrations (versioned, transactional)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mockauth_store::{AuthStore, Database, SqliteStorage};
//!
//! let db = Database::open_and_migrate("data/mockauth.db").await?;
//! let store = AuthStore::new(Arc::new(SqliteStorage::new(db)));
//! let user = store.register("a@x.com", "secret1", "A").await?;
//! ```

pub mod auth;
pub mod backend;
pub mod db;
pub mod error;
pub mod migration;

// ── re-exports ───────────────────────────────────────────────────────

pub use auth::{
    AuthStore, Credential, Session, TOKEN_KEY, USER_KEY, USERS_KEY, UserRecord, token_issued_at,
};
pub use backend::{MemoryStorage, SqliteStorage, StorageBackend};
pub use db::Database;
pub use error::{StoreError, StoreResult};
