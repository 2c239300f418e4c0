//! Key-value store trait and the typed cache wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::CacheError;

/// Maximum retry attempts for optimistic concurrency control.
pub const MAX_UPDATE_RETRIES: u32 = 8;

/// Raw byte-oriented key-value store.
///
/// Implementations must make [`compare_and_swap`](KvStore::compare_and_swap)
/// atomic with respect to every other write on the same key.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the raw value stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` at `key` unconditionally.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// List all keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// Atomically replace the value at `key` if it currently equals `expected`.
    ///
    /// `expected = None` means "the key must be absent"; `new = None` deletes
    /// the key. Returns `false` without writing when the current value differs.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<bool, CacheError>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Type-safe cache over a [`KvStore`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl Cache {
    /// Wrap a store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, bytes).await
    }

    /// Insert a value only if the key is currently absent.
    ///
    /// Returns `false` when the key already exists.
    pub async fn insert_new<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<bool, CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.compare_and_swap(key, None, Some(bytes)).await
    }

    /// Delete a value from the cache.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }

    /// Check if a key exists in the cache.
    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.exists(key).await
    }

    /// Get all keys with the given prefix, sorted.
    pub async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let mut keys = self.store.keys(prefix).await?;
        keys.sort();
        Ok(keys)
    }

    /// Get every value whose key starts with `prefix`.
    pub async fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, CacheError> {
        let mut values = Vec::new();
        for key in self.keys(prefix).await? {
            // A key deleted between listing and reading is simply skipped.
            if let Some(value) = self.get(&key).await? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Read-modify-write a value with optimistic concurrency control.
    ///
    /// The closure receives the latest persisted value (or `None`) and returns
    /// the value to write (`None` deletes the key). The write only lands if
    /// nobody else wrote the key in between; otherwise the closure runs again
    /// on the fresh value, up to [`MAX_UPDATE_RETRIES`] times.
    ///
    /// # Returns
    /// - `Ok(value)` - what was written
    /// - `Err(e)` - the closure's error, a store error, or
    ///   [`CacheError::ConcurrentModification`] once retries are exhausted
    pub async fn update<T, F, E>(&self, key: &str, mut f: F) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnMut(Option<T>) -> Result<Option<T>, E> + Send,
        E: From<CacheError>,
    {
        for attempt in 0..MAX_UPDATE_RETRIES {
            let current = self.store.get(key).await.map_err(E::from)?;

            let decoded = match current.as_deref() {
                Some(bytes) => Some(serde_json::from_slice(bytes).map_err(CacheError::from)?),
                None => None,
            };

            let next = f(decoded)?;

            let encoded = match next.as_ref() {
                Some(value) => Some(serde_json::to_vec(value).map_err(CacheError::from)?),
                None => None,
            };

            let swapped = self
                .store
                .compare_and_swap(key, current.as_deref(), encoded)
                .await
                .map_err(E::from)?;

            if swapped {
                return Ok(next);
            }

            tracing::debug!(key, attempt, "concurrent modification, retrying");
        }

        Err(CacheError::ConcurrentModification(format!(
            "{key}: max retries exceeded"
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn cache() -> Cache {
        Cache::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let cache = cache();
        cache.set("k", &vec![1, 2, 3]).await.unwrap();

        let value: Option<Vec<i32>> = cache.get("k").await.unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = cache.get("nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_insert_new_refuses_existing_key() {
        let cache = cache();
        assert!(cache.insert_new("order:1", &"first").await.unwrap());
        assert!(!cache.insert_new("order:1", &"second").await.unwrap());

        let value: Option<String> = cache.get("order:1").await.unwrap();
        assert_eq!(value.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_scan_by_prefix() {
        let cache = cache();
        cache.set("order:u1:a", &1).await.unwrap();
        cache.set("order:u1:b", &2).await.unwrap();
        cache.set("order:u2:c", &3).await.unwrap();

        let values: Vec<i32> = cache.scan("order:u1:").await.unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_update_applies_closure() {
        let cache = cache();
        cache.set("counter", &10u32).await.unwrap();

        let written = cache
            .update::<u32, _, CacheError>("counter", |n| Ok(n.map(|n| n + 5)))
            .await
            .unwrap();
        assert_eq!(written, Some(15));

        let stored: Option<u32> = cache.get("counter").await.unwrap();
        assert_eq!(stored, Some(15));
    }

    #[tokio::test]
    async fn test_update_closure_error_leaves_value() {
        let cache = cache();
        cache.set("counter", &1u32).await.unwrap();

        let result = cache
            .update::<u32, _, CacheError>("counter", |_| {
                Err(CacheError::NotFound("counter".to_string()))
            })
            .await;
        assert!(result.is_err());

        let stored: Option<u32> = cache.get("counter").await.unwrap();
        assert_eq!(stored, Some(1));
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let cache = cache();
        cache.set("counter", &0u32).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .update::<u32, _, CacheError>("counter", |n| Ok(Some(n.unwrap_or(0) + 1)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored: Option<u32> = cache.get("counter").await.unwrap();
        assert_eq!(stored, Some(4));
    }
}
