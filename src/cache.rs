use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

/// One stored response. Timestamps are Unix milliseconds.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: u64,
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    #[must_use]
    pub fn is_fresh_at(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at
    }
}

/// On-disk keyed store with per-entry expiry.
///
/// Cloning is cheap; clones share the same keyspace.
#[derive(Clone)]
pub struct PersistentCache {
    _db: fjall::Database,
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn now_millis() -> Result<u64> {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    Ok(u64::try_from(millis)?)
}

impl PersistentCache {
    /// Open (or create) the store under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("http_cache", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentCache {
            _db: db,
            store: items,
        })
    }

    /// Stores a serializable value with a time-to-live (TTL), replacing any
    /// previous entry under the same key.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let stored_at = now_millis()?;
        let ttl_ms = u64::try_from(ttl.as_millis()).map_err(|_| anyhow!("TTL overflow"))?;
        let expires_at = stored_at
            .checked_add(ttl_ms)
            .ok_or(anyhow!("TTL overflow"))?;
        let entry = CacheEntry {
            value,
            stored_at,
            expires_at,
        };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves an entry if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries; expired entries
    /// are removed.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get_entry<T: DeserializeOwned + Send + 'static>(
        &self,
        key: &str,
    ) -> Result<Option<CacheEntry<T>>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: CacheEntry<T> = postcard::from_bytes(&bytes)?;
        if entry.is_fresh_at(now_millis()?) {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Retrieves a value if it exists and has not expired.
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        Ok(self.get_entry(key).await?.map(|entry| entry.value))
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache
            .put("k", "body".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let entry = cache.get_entry::<String>("k").await.unwrap().unwrap();
        assert_eq!(entry.value, "body");
        assert_eq!(entry.expires_at - entry.stored_at, 60_000);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache.put("k", 1u32, Duration::from_secs(60)).await.unwrap();
        cache.put("k", 2u32, Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get::<u32>("k").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache.put("k", 1u32, Duration::ZERO).await.unwrap();

        assert_eq!(cache.get::<u32>("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();
        assert_eq!(cache.get::<u32>("nope").await.unwrap(), None);
    }

    #[test]
    fn test_freshness_boundary() {
        let entry = CacheEntry {
            value: (),
            stored_at: 1_000,
            expires_at: 2_000,
        };
        assert!(entry.is_fresh_at(1_999));
        assert!(!entry.is_fresh_at(2_000));
    }
}
