//! Single-file JSON store.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fd_lock::RwLock;

use crate::{CacheError, KvStore};

type Entries = BTreeMap<String, String>;

/// [`KvStore`] persisted as one JSON object on disk.
///
/// Nothing is cached in memory. Every operation takes an exclusive lock on a
/// `<file>.lock` sibling, reads the current document, and writes it back
/// through a temporary file and a rename. Any number of handles, in this
/// process or others, can share one file and still get atomic
/// [`compare_and_swap`](KvStore::compare_and_swap). Values must be UTF-8
/// (the [`Cache`](crate::Cache) wrapper always writes JSON).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file is missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };

        let keys = store
            .locked(|entries| Ok((entries.len(), false)))
            .await
            .map_err(|e| match e {
                CacheError::OpenError(_) => e,
                other => CacheError::OpenError(format!("{}: {other}", store.path.display())),
            })?;

        tracing::debug!(path = %store.path.display(), keys, "opened file store");
        Ok(store)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` on the current document under the file lock. `op` returns
    /// its result and whether the document changed and must be written.
    async fn locked<R, F>(&self, op: F) -> Result<R, CacheError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Entries) -> Result<(R, bool), CacheError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || run_locked(&path, op))
            .await
            .map_err(|e| CacheError::StoreError(format!("file store task failed: {e}")))?
    }

    fn decode(value: Vec<u8>) -> Result<String, CacheError> {
        String::from_utf8(value)
            .map_err(|_| CacheError::StoreError("file store values must be UTF-8".to_string()))
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut lock = path.as_os_str().to_owned();
    lock.push(".lock");
    PathBuf::from(lock)
}

fn run_locked<R>(
    path: &Path,
    op: impl FnOnce(&mut Entries) -> Result<(R, bool), CacheError>,
) -> Result<R, CacheError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(path))?;
    let mut lock = RwLock::new(lock_file);
    let _guard = lock.write()?;

    let mut entries = read_entries(path)?;
    let (result, changed) = op(&mut entries)?;
    if changed {
        write_entries(path, &entries)?;
    }
    Ok(result)
}

fn read_entries(path: &Path) -> Result<Entries, CacheError> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| CacheError::OpenError(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
        Err(e) => Err(CacheError::OpenError(format!("{}: {e}", path.display()))),
    }
}

fn write_entries(path: &Path, entries: &Entries) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec_pretty(entries)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = key.to_string();
        self.locked(move |entries| Ok((entries.get(&key).map(|v| v.clone().into_bytes()), false)))
            .await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let key = key.to_string();
        let value = Self::decode(value)?;
        self.locked(move |entries| {
            entries.insert(key, value);
            Ok(((), true))
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let key = key.to_string();
        self.locked(move |entries| Ok(((), entries.remove(&key).is_some())))
            .await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let prefix = prefix.to_string();
        self.locked(move |entries| {
            let keys = entries
                .keys()
                .filter(|k| k.starts_with(&prefix))
                .cloned()
                .collect();
            Ok((keys, false))
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<bool, CacheError> {
        let key = key.to_string();
        let expected = expected.map(<[u8]>::to_vec);
        let new = new.map(Self::decode).transpose()?;

        self.locked(move |entries| {
            if entries.get(&key).map(String::as_bytes) != expected.as_deref() {
                return Ok((false, false));
            }
            match new {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
            Ok((true, true))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).await.unwrap();
        assert!(store.keys("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let store = FileStore::open(&path).await.unwrap();
            store.set("product:p1", br#"{"stock":3}"#.to_vec()).await.unwrap();
            store.set("cart:s1", b"[]".to_vec()).await.unwrap();
            store.delete("cart:s1").await.unwrap();
        }

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("product:p1").await.unwrap(),
            Some(br#"{"stock":3}"#.to_vec())
        );
        assert_eq!(reopened.get("cart:s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_compare_and_swap_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).await.unwrap();

        assert!(store
            .compare_and_swap("k", None, Some(b"1".to_vec()))
            .await
            .unwrap());
        assert!(!store
            .compare_and_swap("k", Some(b"0"), Some(b"2".to_vec()))
            .await
            .unwrap());

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("k").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_handles_on_one_file_see_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let seed = FileStore::open(&path).await.unwrap();
        seed.set("product:p9", br#"{"stock":1}"#.to_vec()).await.unwrap();

        let alice = FileStore::open(&path).await.unwrap();
        let bob = FileStore::open(&path).await.unwrap();

        let sell = |store: FileStore, order: &'static str| async move {
            let sold = store
                .compare_and_swap(
                    "product:p9",
                    Some(br#"{"stock":1}"#),
                    Some(br#"{"stock":0}"#.to_vec()),
                )
                .await
                .unwrap();
            if sold {
                store.set(order, b"{}".to_vec()).await.unwrap();
            }
            sold
        };
        let (a, b) = tokio::join!(
            sell(alice.clone(), "order:alice:ORD-A"),
            sell(bob.clone(), "order:bob:ORD-B")
        );
        assert_eq!([a, b].iter().filter(|sold| **sold).count(), 1);

        // A write through one handle never drops another handle's keys.
        alice.set("order:alice:ORD-C", b"{}".to_vec()).await.unwrap();
        bob.set("order:bob:ORD-D", b"{}".to_vec()).await.unwrap();

        let orders = FileStore::open(&path).await.unwrap().keys("order:").await.unwrap();
        assert_eq!(orders.len(), 3);
        assert!(orders.contains(&"order:alice:ORD-C".to_string()));
        assert!(orders.contains(&"order:bob:ORD-D".to_string()));
        assert_eq!(
            bob.get("product:p9").await.unwrap(),
            Some(br#"{"stock":0}"#.to_vec())
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, CacheError::OpenError(_)));
    }

    #[tokio::test]
    async fn test_rejects_non_utf8_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json")).await.unwrap();

        let err = store.set("k", vec![0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, CacheError::StoreError(_)));
    }
}
