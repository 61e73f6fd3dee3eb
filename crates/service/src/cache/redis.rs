use async_trait::async_trait;
use bb8_redis::{
    bb8::Pool,
    redis::AsyncCommands,
    RedisConnectionManager,
};
use std::time::Duration;

use super::{CacheError, CacheRepository};

/// Redis-backed cache. The pool handle is cheap to clone and safe for
/// concurrent use; every operation is a single round trip, so per-key
/// ordering is whatever order the commands reach the server in.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let manager =
            RedisConnectionManager::new(url).map_err(|e| CacheError::Backend(e.to_string()))?;
        let pool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl CacheRepository for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.pool.get().await.map_err(|e| CacheError::Backend(e.to_string()))?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await.map_err(|e| CacheError::Backend(e.to_string()))?;
        // SETEX rejects a zero expiry; clamp to the smallest legal TTL.
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await.map_err(|e| CacheError::Backend(e.to_string()))?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}
