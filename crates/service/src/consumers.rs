//! Event projections: each service subscribes to the peer's lifecycle
//! topics and mirrors the payload into its denormalized cache views.
//!
//! Handlers are pure upserts, so at-least-once redelivery is harmless; a
//! cache failure propagates so the delivery is nacked and retried.

use std::time::Duration;

use tracing::debug;

use crate::cache::{views, CacheRepository};
use crate::events::messages::{UserCreated, UserCredentialsCreated};
use crate::identity::domain::CredentialsView;
use crate::profile::domain::UserView;

/// Durable queue names, one per consuming application group so redelivery
/// survives restarts.
pub const USER_CREATED_QUEUE: &str = "auth-api.user-created";
pub const USER_CREDENTIALS_CREATED_QUEUE: &str = "users-api.user-credentials-created";

pub async fn handle_user_created(
    cache: &dyn CacheRepository,
    view_ttl: Duration,
    event: UserCreated,
) -> anyhow::Result<()> {
    let view = UserView { ulid: event.user_ulid.clone(), created_at: None };
    let raw = serde_json::to_string(&view)?;
    cache.set(&views::user_key(&event.user_ulid), &raw, view_ttl).await?;
    debug!(user_ulid = %event.user_ulid, "user view refreshed from event");
    Ok(())
}

pub async fn handle_user_credentials_created(
    cache: &dyn CacheRepository,
    view_ttl: Duration,
    event: UserCredentialsCreated,
) -> anyhow::Result<()> {
    let view = CredentialsView { user_ulid: event.user_ulid.clone(), email: event.email };
    let raw = serde_json::to_string(&view)?;
    cache.set(&views::user_credentials_key(&event.user_ulid), &raw, view_ttl).await?;
    debug!(user_ulid = %event.user_ulid, "credentials view refreshed from event");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCache;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn credentials_event_projects_the_cached_view() {
        let cache = InMemoryCache::new();
        let event = UserCredentialsCreated {
            user_ulid: "01ARZ3NDEKTSV4RRFFQ69G5FAV".into(),
            email: "a@x.com".into(),
        };
        handle_user_credentials_created(&cache, TTL, event.clone()).await.unwrap();

        let cached: Option<CredentialsView> = views::get_cached(
            &cache,
            &views::user_credentials_key("01ARZ3NDEKTSV4RRFFQ69G5FAV"),
        )
        .await;
        let view = cached.unwrap();
        assert_eq!(view.user_ulid, event.user_ulid);
        assert_eq!(view.email, "a@x.com");
    }

    #[tokio::test]
    async fn handlers_are_idempotent_under_redelivery() {
        let cache = InMemoryCache::new();
        let event = UserCreated { user_ulid: "01ARZ3NDEKTSV4RRFFQ69G5FAV".into() };

        handle_user_created(&cache, TTL, event.clone()).await.unwrap();
        let first = cache.get(&views::user_key(&event.user_ulid)).await.unwrap();

        // A redelivered event must converge on the same state.
        handle_user_created(&cache, TTL, event.clone()).await.unwrap();
        let second = cache.get(&views::user_key(&event.user_ulid)).await.unwrap();
        assert_eq!(first, second);

        let cached: Option<UserView> =
            views::get_cached(&cache, &views::user_key(&event.user_ulid)).await;
        assert_eq!(cached.unwrap().ulid, event.user_ulid);
    }
}
