use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{CacheError, CacheRepository};

/// In-process cache with the same TTL semantics as the Redis backend.
/// Used by tests and doc examples; expiry is enforced lazily on read.
#[derive(Default)]
pub struct InMemoryCache {
    inner: RwLock<HashMap<String, (String, Instant)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheRepository for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let expired = {
            let map = self.inner.read().await;
            match map.get(key) {
                Some((value, expires_at)) if Instant::now() < *expires_at => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.inner.write().await.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut map = self.inner.write().await;
        map.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut map = self.inner.write().await;
        map.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn set_get_delete_roundtrip() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("user:a").await.unwrap(), None);

        cache.set("user:a", "{\"ulid\":\"a\"}", TTL).await.unwrap();
        assert_eq!(cache.get("user:a").await.unwrap().as_deref(), Some("{\"ulid\":\"a\"}"));

        cache.delete("user:a").await.unwrap();
        assert_eq!(cache.get("user:a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_ttl_expires_immediately() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_refreshes_value_and_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", "old", Duration::ZERO).await.unwrap();
        cache.set("k", "new", TTL).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn delete_on_missing_key_is_ok() {
        let cache = InMemoryCache::new();
        assert!(cache.delete("never-set").await.is_ok());
    }
}
