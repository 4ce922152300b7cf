//! Shared test utilities for the savings ledger.
//!
//! Helpers for in-memory databases, ledgers and goal trackers with default
//! settings, and a store that fails every call.

use crate::{
    config::LedgerConfig,
    core::{GoalTracker, SavingsLedger},
    errors::{Error, Result},
    storage::{FailurePolicy, KeyLocks, KeyValueStore, MemoryStore},
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Ledger over a fresh [`MemoryStore`] with default configuration.
pub fn memory_ledger() -> SavingsLedger {
    SavingsLedger::new(Arc::new(MemoryStore::new()), &LedgerConfig::default())
}

/// Goal tracker over a fresh [`MemoryStore`] that surfaces failures.
pub fn memory_tracker() -> GoalTracker {
    GoalTracker::new(Arc::new(MemoryStore::new()), FailurePolicy::Surface)
}

/// Ledger whose every storage call fails.
pub fn failing_ledger(policy: FailurePolicy) -> SavingsLedger {
    let config = LedgerConfig {
        failure_policy: policy,
        ..LedgerConfig::default()
    };
    SavingsLedger::new(Arc::new(FailingStore::default()), &config)
}

/// Store that rejects every operation with `Error::Storage`.
#[derive(Default)]
pub struct FailingStore {
    locks: KeyLocks,
}

fn unavailable() -> Error {
    Error::Storage {
        message: "storage unavailable".to_string(),
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(unavailable())
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(unavailable())
    }

    fn locks(&self) -> &KeyLocks {
        &self.locks
    }
}

/// In-memory store that yields to the scheduler before every read, so
/// concurrent read-modify-write cycles interleave unless they are locked.
#[derive(Debug, Default)]
pub struct YieldingStore {
    inner: MemoryStore,
}

#[async_trait]
impl KeyValueStore for YieldingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }

    fn locks(&self) -> &KeyLocks {
        self.inner.locks()
    }
}
