//! Store wrapper that fails selected writes.
//!
//! Used to exercise rollback paths: wrap a [`MemoryStore`](crate::MemoryStore),
//! fail writes to `order:` keys, and check that stock and cart are left as
//! they were.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::{CacheError, KvStore};

/// A [`KvStore`] that returns [`CacheError::StoreError`] for writes to keys
/// matching any configured prefix while armed.
pub struct FlakyStore {
    inner: Arc<dyn KvStore>,
    failing_prefixes: Vec<String>,
    armed: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self {
            inner,
            failing_prefixes: Vec::new(),
            armed: AtomicBool::new(true),
        }
    }

    /// Fail writes to keys starting with `prefix`.
    pub fn fail_writes_to(mut self, prefix: impl Into<String>) -> Self {
        self.failing_prefixes.push(prefix.into());
        self
    }

    /// Turn failure injection on or off.
    pub fn set_armed(&self, armed: bool) {
        self.armed.store(armed, Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> Result<(), CacheError> {
        if self.armed.load(Ordering::SeqCst)
            && self.failing_prefixes.iter().any(|p| key.starts_with(p))
        {
            return Err(CacheError::StoreError(format!("injected write failure: {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.check(key)?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check(key)?;
        self.inner.delete(key).await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        self.inner.keys(prefix).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<bool, CacheError> {
        self.check(key)?;
        self.inner.compare_and_swap(key, expected, new).await
    }
}
