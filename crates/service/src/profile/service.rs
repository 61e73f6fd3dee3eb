use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::domain::{UserDetails, UserView};
use super::repository::ProfileRepository;
use crate::cache::{views, CacheRepository};
use crate::clients::CredentialsClient;
use crate::errors::IdentityError;
use crate::events::messages::UserCreated;
use crate::events::{publish_event, EventPublisher};

/// Profile business service independent of any transport.
pub struct ProfileService<R: ProfileRepository> {
    repo: Arc<R>,
    cache: Arc<dyn CacheRepository>,
    publisher: Arc<dyn EventPublisher>,
    credentials: Arc<dyn CredentialsClient>,
    view_ttl: Duration,
}

impl<R: ProfileRepository> ProfileService<R> {
    pub fn new(
        repo: Arc<R>,
        cache: Arc<dyn CacheRepository>,
        publisher: Arc<dyn EventPublisher>,
        credentials: Arc<dyn CredentialsClient>,
        view_ttl: Duration,
    ) -> Self {
        Self { repo, cache, publisher, credentials, view_ttl }
    }

    /// Mint a bare profile. Internal-network operation: the transport layer
    /// gates it with the shared key before calling in.
    #[instrument(skip(self))]
    pub async fn create_profile(&self) -> Result<UserView, IdentityError> {
        let record = self.repo.create().await?;
        let view = UserView::from(&record);

        let event = UserCreated { user_ulid: record.ulid.clone() };
        if let Err(e) = publish_event(self.publisher.as_ref(), &event).await {
            warn!(user_ulid = %record.ulid, error = %e, "profile event publish failed");
        }
        views::set_cached(self.cache.as_ref(), &views::user_key(&record.ulid), &view, self.view_ttl)
            .await;
        info!(user_ulid = %record.ulid, "profile created");
        Ok(view)
    }

    /// Delete a profile and invalidate its view. Idempotent on missing so
    /// the saga's compensation can run more than once.
    #[instrument(skip(self))]
    pub async fn delete_profile(&self, user_ulid: &str) -> Result<(), IdentityError> {
        let existed = self.repo.delete_by_ulid(user_ulid).await?;
        // Invalidation follows the store delete; both are single round
        // trips issued sequentially, so the delete cannot be reordered
        // behind a concurrent repopulating set from this path.
        views::invalidate(self.cache.as_ref(), &views::user_key(user_ulid)).await;
        if existed {
            info!(user_ulid, "profile deleted");
        } else {
            debug!(user_ulid, "profile already absent");
        }
        Ok(())
    }

    /// Owner-facing read: read-through cached profile view enriched with the
    /// credentials view from the peer. A profile whose saga has not finished
    /// simply has no credentials yet.
    pub async fn user_details(&self, user_ulid: &str) -> Result<UserDetails, IdentityError> {
        let key = views::user_key(user_ulid);
        let view = match views::get_cached::<UserView>(self.cache.as_ref(), &key).await {
            Some(view) => view,
            None => {
                let record = self
                    .repo
                    .find_by_ulid(user_ulid)
                    .await?
                    .ok_or_else(|| IdentityError::not_found(format!("user '{user_ulid}'")))?;
                let view = UserView::from(&record);
                views::set_cached(self.cache.as_ref(), &key, &view, self.view_ttl).await;
                view
            }
        };

        let credentials = match self.credentials.credentials_by_ulid(user_ulid).await {
            Ok(view) => Some(view),
            Err(IdentityError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        Ok(UserDetails { user: view, credentials })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCache;
    use crate::clients::credentials::mock::MockCredentialsClient;
    use crate::events::messages::TOPIC_USER_CREATED;
    use crate::events::mock::RecordingPublisher;
    use crate::identity::domain::CredentialsView;
    use crate::profile::repository::mock::MockProfileRepository;

    struct TestBed {
        repo: Arc<MockProfileRepository>,
        cache: Arc<InMemoryCache>,
        publisher: Arc<RecordingPublisher>,
        credentials: Arc<MockCredentialsClient>,
        svc: ProfileService<MockProfileRepository>,
    }

    fn bed() -> TestBed {
        let repo = Arc::new(MockProfileRepository::default());
        let cache = Arc::new(InMemoryCache::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let credentials = Arc::new(MockCredentialsClient::default());
        let svc = ProfileService::new(
            repo.clone(),
            cache.clone(),
            publisher.clone(),
            credentials.clone(),
            Duration::from_secs(60),
        );
        TestBed { repo, cache, publisher, credentials, svc }
    }

    #[tokio::test]
    async fn create_profile_publishes_and_caches_the_view() {
        let bed = bed();
        let view = bed.svc.create_profile().await.unwrap();
        assert_eq!(view.ulid.len(), 26);

        let published = bed.publisher.messages_for(TOPIC_USER_CREATED);
        assert_eq!(published.len(), 1);
        let event: UserCreated = serde_json::from_slice(&published[0]).unwrap();
        assert_eq!(event.user_ulid, view.ulid);

        let cached: Option<UserView> =
            views::get_cached(bed.cache.as_ref(), &views::user_key(&view.ulid)).await;
        assert_eq!(cached, Some(view));
    }

    #[tokio::test]
    async fn delete_profile_is_idempotent_and_invalidates() {
        let bed = bed();
        let view = bed.svc.create_profile().await.unwrap();

        bed.svc.delete_profile(&view.ulid).await.unwrap();
        assert!(bed.repo.is_empty());
        assert!(bed.cache.get(&views::user_key(&view.ulid)).await.unwrap().is_none());

        // Second delete of the same (now missing) profile still succeeds.
        bed.svc.delete_profile(&view.ulid).await.unwrap();
    }

    #[tokio::test]
    async fn user_details_reads_through_and_enriches() {
        let bed = bed();
        let view = bed.svc.create_profile().await.unwrap();
        bed.credentials.insert(CredentialsView {
            user_ulid: view.ulid.clone(),
            email: "a@x.com".into(),
        });

        // Drop the write-through entry to force the store path once.
        bed.cache.delete(&views::user_key(&view.ulid)).await.unwrap();

        let details = bed.svc.user_details(&view.ulid).await.unwrap();
        assert_eq!(details.user.ulid, view.ulid);
        assert_eq!(details.credentials.unwrap().email, "a@x.com");
        // The read repopulated the cache.
        assert!(bed.cache.get(&views::user_key(&view.ulid)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn user_details_without_credentials_is_a_bare_profile() {
        let bed = bed();
        let view = bed.svc.create_profile().await.unwrap();
        let details = bed.svc.user_details(&view.ulid).await.unwrap();
        assert!(details.credentials.is_none());
    }

    #[tokio::test]
    async fn user_details_for_missing_profile_is_not_found() {
        let bed = bed();
        let err = bed.svc.user_details("01BX5ZZKBKACTAV9WEVGEMMVRZ").await.unwrap_err();
        assert!(matches!(err, IdentityError::NotFound(_)));
    }
}
