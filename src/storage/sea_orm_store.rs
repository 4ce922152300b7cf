use super::{KeyLocks, KeyValueStore};
use crate::{
    entities::{KvEntry, kv_entry},
    errors::Result,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Key-value store persisted in the `kv_entries` table.
///
/// Clones share one set of writer locks.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    locks: Arc<KeyLocks>,
}

impl SeaOrmStore {
    /// Wraps an open connection. Tables must already exist; see
    /// [`create_tables`](crate::config::database::create_tables).
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            locks: Arc::new(KeyLocks::new()),
        }
    }

    /// The wrapped connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl KeyValueStore for SeaOrmStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = KvEntry::find()
            .filter(kv_entry::Column::Key.eq(key))
            .one(&self.db)
            .await?;
        debug!("Entry present: {}", entry.is_some());
        Ok(entry.map(|e| e.value))
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let existing = KvEntry::find()
            .filter(kv_entry::Column::Key.eq(key))
            .one(&txn)
            .await?;

        if let Some(entry) = existing {
            let mut active_model: kv_entry::ActiveModel = entry.into();
            active_model.value = Set(value.to_string());
            active_model.updated_at = Set(now);
            active_model.update(&txn).await?;
        } else {
            let new_entry = kv_entry::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(now),
                ..Default::default()
            };
            new_entry.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        let deleted = KvEntry::delete_many()
            .filter(kv_entry::Column::Key.eq(key))
            .exec(&self.db)
            .await?;
        debug!("Removed {} rows", deleted.rows_affected);
        Ok(())
    }

    fn locks(&self) -> &KeyLocks {
        &self.locks
    }
}
