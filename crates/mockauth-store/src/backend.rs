//! Pluggable key-value storage backends.
//!
//! The auth store persists everything under three well-known string keys
//! (see [`crate::auth`]). The backend behind those keys is injected as a
//! trait object so presentation code gets durable SQLite storage while
//! tests substitute an in-memory double.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Trait
// ═══════════════════════════════════════════════════════════════════════

/// String key-value storage the auth store is built on.
///
/// Implementations must tolerate unknown keys: `get` returns `None` and
/// `remove` returns `false` when a key is absent.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Get a value by key, returning `None` if not found.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set a value for a key (insert or update).
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a key, returning `true` if it existed.
    async fn remove(&self, key: &str) -> StoreResult<bool>;
}

// ═══════════════════════════════════════════════════════════════════════
//  SQLite backend
// ═══════════════════════════════════════════════════════════════════════

/// Durable backend over the `kv_entries` table.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Create a new SQLite backend over `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    #[instrument(skip(self, value))]
    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO kv_entries (key, value) VALUES (?1, ?2) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![key, value],
                )?;
                debug!(key = %key, "kv entry updated");
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> StoreResult<bool> {
        let key = key.to_string();
        self.db
            .execute(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM kv_entries WHERE key = ?1",
                    rusqlite::params![key],
                )?;
                Ok(deleted > 0)
            })
            .await
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  In-memory backend
// ═══════════════════════════════════════════════════════════════════════

/// Ephemeral backend over a `HashMap` — for tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| StoreError::TaskJoin(format!("mutex poisoned: {e}")))
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }
}

// ── tests ────────────────────────────────────────────────────────────
