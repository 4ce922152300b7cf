//! Persistence port for the ledger and goal tracker.
//!
//! The core only ever needs three operations over string values, so storage is
//! expressed as the [`KeyValueStore`] trait. [`MemoryStore`] backs tests and
//! embedded use; [`SeaOrmStore`] persists to `SQLite`. Structured data goes
//! through [`JsonCollection`], which owns the JSON encoding and serializes
//! writers of the same key.

/// Typed JSON arrays stored under a single key
pub mod collection;
/// In-process `HashMap` store
pub mod memory;
/// `SQLite` store built on `SeaORM`
pub mod sea_orm_store;

pub use collection::JsonCollection;
pub use memory::MemoryStore;
pub use sea_orm_store::SeaOrmStore;

use crate::errors::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::error;

/// Key holding the savings-log collection.
pub const SAVINGS_LOG_KEY: &str = "ellio_savings_log";
/// Key holding the goals collection.
pub const SAVINGS_GOALS_KEY: &str = "ellio_savings_goals";
/// Key reserved for per-item price history; only ever cleared.
pub const PRICE_HISTORY_KEY: &str = "ellio_price_history";

/// Asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Writer locks for this store's keys.
    ///
    /// Everything holding the same store shares these locks, so read-modify-write
    /// cycles on one key never interleave.
    fn locks(&self) -> &KeyLocks;
}

/// One async writer lock per key, created on first use.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    /// Creates an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The writer lock for `key`.
    pub async fn for_key(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(key.to_string()).or_default())
    }
}

/// What the ledger and goal tracker do when storage fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and carry on with an empty result or a no-op
    #[default]
    Swallow,
    /// Return the failure to the caller
    Surface,
}

impl FailurePolicy {
    /// Applies the policy to `result`.
    ///
    /// Storage failures become `Ok(fallback())` under [`FailurePolicy::Swallow`].
    /// Non-storage errors are always returned unchanged.
    pub fn apply<T>(
        self,
        result: Result<T>,
        context: &str,
        fallback: impl FnOnce() -> T,
    ) -> Result<T> {
        match result {
            Err(e) if self == Self::Swallow && e.is_storage() => {
                error!("{context}: {e}");
                Ok(fallback())
            }
            other => other,
        }
    }
}
