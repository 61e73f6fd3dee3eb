//! TTL-bounded key-value cache of materialized views.
//!
//! Advisory by contract: a miss means "consult the source of truth", never
//! "entity does not exist", and a backend failure on a read path degrades to
//! a source-of-truth fetch.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod memory;
pub mod redis;
pub mod views;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// Returns the cached value, or `None` on a miss or an expired entry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`; always refreshes the TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`; removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
