//! Versioned per-visitor session records.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::clock::{system_clock, SharedClock};
use crate::{Cache, CacheError};

/// A unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new cryptographically secure session ID.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("sess_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Session record as persisted under `session:{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData<T> {
    pub id: SessionId,
    pub data: T,
    /// Bumped on every write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl<T> SessionData<T> {
    fn fresh(id: &SessionId, data: T, now: DateTime<Utc>) -> Self {
        Self {
            id: id.clone(),
            data,
            version: 1,
            created_at: now,
            last_accessed: now,
        }
    }
}

/// Typed session store over a [`Cache`].
///
/// # Example
///
/// ```rust,ignore
/// use omni_cache::{Cache, MemoryStore, Session, SessionId};
///
/// let sessions = Session::<ShopperState>::new(Cache::new(Arc::new(MemoryStore::new())));
/// let id = SessionId::generate();
///
/// let state = sessions.get_or_create(&id).await?;
/// sessions
///     .update::<_, CacheError>(&id, |s| {
///         s.phone_verified = true;
///         Ok(())
///     })
///     .await?;
/// ```
pub struct Session<T> {
    cache: Cache,
    clock: SharedClock,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            clock: self.clock.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl<T> Session<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send + Sync,
{
    /// Session store stamping records with the system clock.
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            clock: system_clock(),
            _phantom: PhantomData,
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Get session data, or create a new session if it doesn't exist.
    pub async fn get_or_create(&self, id: &SessionId) -> Result<T, CacheError> {
        let key = Self::session_key(id);
        if let Some(existing) = self.cache.get::<SessionData<T>>(&key).await? {
            return Ok(existing.data);
        }

        let record = SessionData::fresh(id, T::default(), self.clock.now());
        if self.cache.insert_new(&key, &record).await? {
            return Ok(record.data);
        }

        // Lost the creation race; take whatever the winner wrote.
        self.cache
            .get::<SessionData<T>>(&key)
            .await?
            .map(|s| s.data)
            .ok_or_else(|| CacheError::NotFound(key))
    }

    /// Get session data if it exists.
    pub async fn get(&self, id: &SessionId) -> Result<Option<T>, CacheError> {
        Ok(self.get_versioned(id).await?.map(|s| s.data))
    }

    /// Get full session data including version.
    pub async fn get_versioned(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionData<T>>, CacheError> {
        self.cache.get(&Self::session_key(id)).await
    }

    /// Replace session data unconditionally.
    pub async fn set(&self, id: &SessionId, data: &T) -> Result<(), CacheError> {
        let data = data.clone();
        self.update::<_, CacheError>(id, move |current| {
            *current = data.clone();
            Ok(())
        })
        .await
        .map(|_| ())
    }

    /// Delete a session.
    pub async fn delete(&self, id: &SessionId) -> Result<(), CacheError> {
        self.cache.delete(&Self::session_key(id)).await
    }

    /// Check if a session exists.
    pub async fn exists(&self, id: &SessionId) -> Result<bool, CacheError> {
        self.cache.exists(&Self::session_key(id)).await
    }

    /// Modify session data with optimistic concurrency control.
    ///
    /// A missing session starts from `T::default()`. The closure may run more
    /// than once if another writer races this one; an error from it aborts the
    /// update without writing.
    pub async fn update<F, E>(&self, id: &SessionId, mut f: F) -> Result<T, E>
    where
        F: FnMut(&mut T) -> Result<(), E> + Send,
        E: From<CacheError>,
    {
        let key = Self::session_key(id);
        let now = self.clock.now();

        let written = self
            .cache
            .update::<SessionData<T>, _, E>(&key, |current| {
                let mut record = match current {
                    Some(mut record) => {
                        record.version += 1;
                        record.last_accessed = now;
                        record
                    }
                    None => SessionData::fresh(id, T::default(), now),
                };
                f(&mut record.data)?;
                Ok(Some(record))
            })
            .await?;

        written
            .map(|record| record.data)
            .ok_or_else(|| CacheError::NotFound(key).into())
    }

    fn session_key(id: &SessionId) -> String {
        crate::cache_key!("session", id)
    }
}
