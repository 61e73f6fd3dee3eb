//! Typed helpers over the cache for the denormalized identity views.
//!
//! Key scheme: `user:{ulid}` for profile snapshots, `user_credentials:{ulid}`
//! for credential snapshots. Values are JSON; the TTL is supplied by the
//! caller (24 hours in the default configuration). Every helper is
//! best-effort: backend failures are logged and degrade to a miss or no-op,
//! the source of truth always wins.

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::warn;

use super::CacheRepository;

pub fn user_key(ulid: &str) -> String {
    format!("user:{ulid}")
}

pub fn user_credentials_key(ulid: &str) -> String {
    format!("user_credentials:{ulid}")
}

/// Read a cached view; any failure (backend or decode) is reported as a miss.
pub async fn get_cached<T: DeserializeOwned>(cache: &dyn CacheRepository, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cached view is undecodable; treating as miss");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "cache read failed; falling back to source of truth");
            None
        }
    }
}

/// Write a view snapshot; failures are logged, never surfaced.
pub async fn set_cached<T: Serialize>(
    cache: &dyn CacheRepository,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "view serialization failed; skipping cache write");
            return;
        }
    };
    if let Err(e) = cache.set(key, &raw, ttl).await {
        warn!(key, error = %e, "cache write failed; view will be repopulated on read");
    }
}

/// Drop a view after a mutation. A failed invalidation leaves the view stale
/// for up to its TTL, so it is logged loudly.
pub async fn invalidate(cache: &dyn CacheRepository, key: &str) {
    if let Err(e) = cache.delete(key).await {
        warn!(key, error = %e, "cache invalidation failed; stale view may persist until TTL");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCache;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct View {
        ulid: String,
    }

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn key_scheme_matches_the_wire_contract() {
        assert_eq!(user_key("01A"), "user:01A");
        assert_eq!(user_credentials_key("01A"), "user_credentials:01A");
    }

    #[tokio::test]
    async fn typed_roundtrip_and_invalidation() {
        let cache = InMemoryCache::new();
        let view = View { ulid: "01A".into() };

        set_cached(&cache, "user:01A", &view, TTL).await;
        assert_eq!(get_cached::<View>(&cache, "user:01A").await, Some(view));

        invalidate(&cache, "user:01A").await;
        assert_eq!(get_cached::<View>(&cache, "user:01A").await, None);
    }

    #[tokio::test]
    async fn undecodable_entries_read_as_miss() {
        let cache = InMemoryCache::new();
        cache.set("user:01A", "not json", TTL).await.unwrap();
        assert_eq!(get_cached::<View>(&cache, "user:01A").await, None);
    }
}
