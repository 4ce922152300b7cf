use super::KeyValueStore;
use crate::errors::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, marker::PhantomData, sync::Arc};
use tracing::{debug, instrument};

/// A JSON array of `T` stored under one key.
///
/// Writers take the store's lock for the key, so concurrent
/// [`update`](Self::update) calls run one after another even across
/// collections built separately over the same store.
pub struct JsonCollection<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonCollection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            _records: PhantomData,
        }
    }
}

impl<T> fmt::Debug for JsonCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCollection")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Binds a collection to `key` in `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _records: PhantomData,
        }
    }

    /// Storage key of this collection.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Reads the whole collection. An absent key reads as an empty collection.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn load(&self) -> Result<Vec<T>> {
        match self.store.get(&self.key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => {
                debug!("No records stored yet");
                Ok(Vec::new())
            }
        }
    }

    /// Loads the collection, lets `mutate` change it, and writes it back while
    /// holding the key's writer lock.
    ///
    /// Nothing is written if loading fails.
    #[instrument(skip(self, mutate), fields(key = %self.key))]
    pub async fn update<F, R>(&self, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> R + Send,
    {
        let lock = self.store.locks().for_key(&self.key).await;
        let _writer = lock.lock().await;
        let mut records = self.load().await?;
        let outcome = mutate(&mut records);
        let raw = serde_json::to_string(&records)?;
        self.store.set(&self.key, &raw).await?;
        debug!("Wrote {} records", records.len());
        Ok(outcome)
    }

    /// Deletes the collection from the store.
    pub async fn remove(&self) -> Result<()> {
        let lock = self.store.locks().for_key(&self.key).await;
        let _writer = lock.lock().await;
        self.store.remove(&self.key).await
    }
}
