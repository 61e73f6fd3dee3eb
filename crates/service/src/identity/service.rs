use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use super::domain::{
    AuthSession, CredentialsRecord, CredentialsView, CurrentUser, LoginInput, RegisterInput,
};
use super::repository::CredentialsRepository;
use crate::cache::{views, CacheRepository};
use crate::clients::ProfileClient;
use crate::errors::IdentityError;
use crate::events::messages::UserCredentialsCreated;
use crate::events::{publish_event, EventPublisher};
use crate::guard;
use crate::password::PasswordVault;
use crate::token::TokenService;

/// Identity business service independent of any transport.
///
/// Owns the provisioning saga: a registration creates the profile in the
/// peer service first, then persists credentials locally, and undoes the
/// profile on any second-step failure. There is no cross-service
/// transaction; the compensation plus the email unique constraint are the
/// whole consistency story.
pub struct IdentityService<R: CredentialsRepository> {
    repo: Arc<R>,
    profiles: Arc<dyn ProfileClient>,
    cache: Arc<dyn CacheRepository>,
    publisher: Arc<dyn EventPublisher>,
    tokens: TokenService,
    view_ttl: Duration,
}

impl<R: CredentialsRepository> IdentityService<R> {
    pub fn new(
        repo: Arc<R>,
        profiles: Arc<dyn ProfileClient>,
        cache: Arc<dyn CacheRepository>,
        publisher: Arc<dyn EventPublisher>,
        tokens: TokenService,
        view_ttl: Duration,
    ) -> Self {
        Self { repo, profiles, cache, publisher, tokens, view_ttl }
    }

    /// Provision a new identity across both services.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use service::cache::memory::InMemoryCache;
    /// use service::clients::profiles::mock::MockProfileClient;
    /// use service::events::mock::RecordingPublisher;
    /// use service::identity::domain::RegisterInput;
    /// use service::identity::repository::mock::MockCredentialsRepository;
    /// use service::identity::IdentityService;
    /// use service::token::TokenService;
    ///
    /// let svc = IdentityService::new(
    ///     Arc::new(MockCredentialsRepository::default()),
    ///     Arc::new(MockProfileClient::default()),
    ///     Arc::new(InMemoryCache::new()),
    ///     Arc::new(RecordingPublisher::default()),
    ///     TokenService::new("secret", 30),
    ///     Duration::from_secs(60),
    /// );
    /// let view = tokio_test::block_on(
    ///     svc.register(RegisterInput { email: "user@example.com".into(), password: "Secret123".into() }),
    /// )
    /// .unwrap();
    /// assert_eq!(view.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<CredentialsView, IdentityError> {
        models::user_credentials::validate_email(&input.email)?;
        if input.password.is_empty() {
            return Err(IdentityError::Validation("password required".into()));
        }

        // Best-effort uniqueness guard; the store's unique constraint is the
        // backstop for two concurrent registrations racing past this check.
        if self.repo.find_by_email(&input.email).await?.is_some() {
            debug!("email already has credentials");
            return Err(IdentityError::Conflict);
        }

        // Step 1: the peer mints the profile. Failure aborts with no side
        // effects; nothing exists yet.
        let profile = self.profiles.create_profile().await?;

        // Step 2: hash and persist. Any failure here must undo step 1.
        match self.create_credentials(&profile.ulid, &input).await {
            Ok(record) => {
                let event = UserCredentialsCreated {
                    user_ulid: record.user_ulid.clone(),
                    email: record.email.clone(),
                };
                // Publication is at-least-once best effort; it is never
                // retried synchronously and never fails the registration.
                if let Err(e) = publish_event(self.publisher.as_ref(), &event).await {
                    warn!(user_ulid = %record.user_ulid, error = %e, "credentials event publish failed");
                }
                info!(user_ulid = %record.user_ulid, "user registered");
                Ok(CredentialsView::from(&record))
            }
            Err(err) => {
                if let Err(comp) = self.profiles.delete_profile(&profile.ulid).await {
                    // Leaves an orphaned profile behind; loud by design of
                    // the saga, never silently ignored.
                    error!(
                        user_ulid = %profile.ulid,
                        error = %comp,
                        "saga compensation failed; profile orphaned"
                    );
                }
                Err(err)
            }
        }
    }

    async fn create_credentials(
        &self,
        user_ulid: &str,
        input: &RegisterInput,
    ) -> Result<CredentialsRecord, IdentityError> {
        let (digest, salt) = PasswordVault::hash(&input.password)?;
        self.repo.create(user_ulid, &input.email, digest, salt).await
    }

    /// Authenticate an email/password pair and issue a bearer token carrying
    /// the persisted admin flag. Unknown email and wrong password are
    /// indistinguishable to the caller.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, IdentityError> {
        let record = self
            .repo
            .find_by_email(&input.email)
            .await?
            .ok_or(IdentityError::Unauthorized)?;

        if !PasswordVault::verify(&record.password_hash, &input.password, &record.salt) {
            return Err(IdentityError::Unauthorized);
        }

        let token = self.tokens.issue(&record.user_ulid, record.is_admin)?;
        info!(user_ulid = %record.user_ulid, "login succeeded");
        Ok(AuthSession { credentials: CredentialsView::from(&record), token })
    }

    /// Decode a bearer token once and resolve its subject against the cached
    /// view, falling back to the credentials store. A valid signature over a
    /// subject that no longer exists is an invalid token.
    pub async fn authenticate(&self, bearer_token: &str) -> Result<CurrentUser, IdentityError> {
        let claims = self.tokens.verify(bearer_token)?;
        let key = views::user_credentials_key(&claims.sub);
        if views::get_cached::<CredentialsView>(self.cache.as_ref(), &key).await.is_none() {
            let record = self
                .repo
                .find_by_user_ulid(&claims.sub)
                .await?
                .ok_or(IdentityError::InvalidToken)?;
            views::set_cached(
                self.cache.as_ref(),
                &key,
                &CredentialsView::from(&record),
                self.view_ttl,
            )
            .await;
        }
        Ok(CurrentUser { ulid: claims.sub, admin: claims.admin })
    }

    /// Read-through cached credentials view. The cache is advisory: a miss
    /// or backend failure falls through to the store, which always wins.
    pub async fn credentials_by_ulid(
        &self,
        user_ulid: &str,
    ) -> Result<CredentialsView, IdentityError> {
        let key = views::user_credentials_key(user_ulid);
        if let Some(view) = views::get_cached::<CredentialsView>(self.cache.as_ref(), &key).await {
            return Ok(view);
        }
        let record = self
            .repo
            .find_by_user_ulid(user_ulid)
            .await?
            .ok_or_else(|| IdentityError::not_found(format!("user '{user_ulid}'")))?;
        let view = CredentialsView::from(&record);
        views::set_cached(self.cache.as_ref(), &key, &view, self.view_ttl).await;
        Ok(view)
    }

    /// Re-hash and persist a new password for `target_ulid`, then invalidate
    /// its cached view. Owner-gated.
    #[instrument(skip(self, current, new_password), fields(target = target_ulid))]
    pub async fn change_password(
        &self,
        current: &CurrentUser,
        target_ulid: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        guard::ensure_owner(&current.ulid, target_ulid)?;
        if new_password.is_empty() {
            return Err(IdentityError::Validation("password required".into()));
        }
        let (digest, salt) = PasswordVault::hash(new_password)?;
        self.repo.update_password(target_ulid, digest, salt).await?;
        views::invalidate(self.cache.as_ref(), &views::user_credentials_key(target_ulid)).await;
        info!(user_ulid = target_ulid, "credentials updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCache;
    use crate::clients::profiles::mock::MockProfileClient;
    use crate::events::messages::TOPIC_USER_CREDENTIALS_CREATED;
    use crate::events::mock::{FailingPublisher, RecordingPublisher};
    use crate::identity::repository::mock::MockCredentialsRepository;

    struct TestBed {
        repo: Arc<MockCredentialsRepository>,
        profiles: Arc<MockProfileClient>,
        cache: Arc<InMemoryCache>,
        publisher: Arc<RecordingPublisher>,
        svc: IdentityService<MockCredentialsRepository>,
    }

    fn bed_with(repo: MockCredentialsRepository, profiles: MockProfileClient) -> TestBed {
        let repo = Arc::new(repo);
        let profiles = Arc::new(profiles);
        let cache = Arc::new(InMemoryCache::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let svc = IdentityService::new(
            repo.clone(),
            profiles.clone(),
            cache.clone(),
            publisher.clone(),
            TokenService::new("test-secret", 30),
            Duration::from_secs(60),
        );
        TestBed { repo, profiles, cache, publisher, svc }
    }

    fn bed() -> TestBed {
        bed_with(MockCredentialsRepository::default(), MockProfileClient::default())
    }

    fn register_input() -> RegisterInput {
        RegisterInput { email: "a@x.com".into(), password: "secretpassword".into() }
    }

    #[tokio::test]
    async fn register_creates_profile_and_credentials_and_publishes() {
        let bed = bed();
        let view = bed.svc.register(register_input()).await.unwrap();

        let created = bed.profiles.created_ulids();
        assert_eq!(created.len(), 1);
        assert_eq!(view.user_ulid, created[0]);
        assert_eq!(view.email, "a@x.com");
        assert_eq!(bed.repo.len(), 1);
        assert!(bed.profiles.deleted_ulids().is_empty());

        let published = bed.publisher.messages_for(TOPIC_USER_CREDENTIALS_CREATED);
        assert_eq!(published.len(), 1);
        let event: UserCredentialsCreated = serde_json::from_slice(&published[0]).unwrap();
        assert_eq!(event.user_ulid, created[0]);
        assert_eq!(event.email, "a@x.com");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_before_touching_the_peer() {
        let bed = bed();
        bed.svc.register(register_input()).await.unwrap();

        let err = bed.svc.register(register_input()).await.unwrap_err();
        assert!(matches!(err, IdentityError::Conflict));
        // Only the first registration reached the profile service.
        assert_eq!(bed.profiles.created_ulids().len(), 1);
    }

    #[tokio::test]
    async fn register_rejects_empty_passwords_and_bad_emails() {
        let bed = bed();
        let err = bed
            .svc
            .register(RegisterInput { email: "a@x.com".into(), password: "".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));

        let err = bed
            .svc
            .register(RegisterInput { email: "not-an-email".into(), password: "secret".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));
        assert!(bed.profiles.created_ulids().is_empty());
    }

    #[tokio::test]
    async fn failed_profile_creation_aborts_without_side_effects() {
        let bed = bed_with(
            MockCredentialsRepository::default(),
            MockProfileClient { fail_create: true, ..MockProfileClient::default() },
        );
        let err = bed.svc.register(register_input()).await.unwrap_err();
        assert!(matches!(err, IdentityError::Upstream(_)));
        assert!(bed.repo.is_empty());
        assert!(bed.profiles.deleted_ulids().is_empty());
        assert!(bed.publisher.messages_for(TOPIC_USER_CREDENTIALS_CREATED).is_empty());
    }

    #[tokio::test]
    async fn failed_credentials_persistence_compensates_exactly_once() {
        let bed = bed_with(
            MockCredentialsRepository::failing_on_create(),
            MockProfileClient::default(),
        );
        let err = bed.svc.register(register_input()).await.unwrap_err();

        // The original step-2 error is surfaced, not a success and not a
        // compensation artifact.
        assert!(matches!(err, IdentityError::Transient(_)));
        let created = bed.profiles.created_ulids();
        let deleted = bed.profiles.deleted_ulids();
        assert_eq!(created.len(), 1);
        assert_eq!(deleted, created);
        assert!(bed.publisher.messages_for(TOPIC_USER_CREDENTIALS_CREATED).is_empty());
    }

    #[tokio::test]
    async fn compensation_failure_still_surfaces_the_original_error() {
        let bed = bed_with(
            MockCredentialsRepository::failing_on_create(),
            MockProfileClient { fail_delete: true, ..MockProfileClient::default() },
        );
        let err = bed.svc.register(register_input()).await.unwrap_err();
        assert!(matches!(err, IdentityError::Transient(_)));
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_registration() {
        let repo = Arc::new(MockCredentialsRepository::default());
        let svc = IdentityService::new(
            repo.clone(),
            Arc::new(MockProfileClient::default()),
            Arc::new(InMemoryCache::new()),
            Arc::new(FailingPublisher),
            TokenService::new("test-secret", 30),
            Duration::from_secs(60),
        );
        let view = svc.register(register_input()).await.unwrap();
        assert_eq!(view.email, "a@x.com");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn login_issues_a_verifiable_token_for_the_subject() {
        let bed = bed();
        let view = bed.svc.register(register_input()).await.unwrap();

        let session = bed
            .svc
            .login(LoginInput { email: "a@x.com".into(), password: "secretpassword".into() })
            .await
            .unwrap();
        assert_eq!(session.credentials.user_ulid, view.user_ulid);

        let tokens = TokenService::new("test-secret", 30);
        let claims = tokens.verify(&session.token).unwrap();
        assert_eq!(claims.sub, view.user_ulid);
        assert!(!claims.admin);
    }

    #[tokio::test]
    async fn login_carries_the_persisted_admin_flag() {
        let bed = bed();
        let (digest, salt) = PasswordVault::hash("secretpassword").unwrap();
        bed.repo.insert(CredentialsRecord {
            user_ulid: "01ARZ3NDEKTSV4RRFFQ69G5FAV".into(),
            email: "root@x.com".into(),
            password_hash: digest,
            salt,
            is_admin: true,
        });

        let session = bed
            .svc
            .login(LoginInput { email: "root@x.com".into(), password: "secretpassword".into() })
            .await
            .unwrap();
        let claims = TokenService::new("test-secret", 30).verify(&session.token).unwrap();
        assert!(claims.admin);
    }

    #[tokio::test]
    async fn login_rejects_unknown_email_and_wrong_password_alike() {
        let bed = bed();
        bed.svc.register(register_input()).await.unwrap();

        let err = bed
            .svc
            .login(LoginInput { email: "nobody@x.com".into(), password: "secretpassword".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Unauthorized));

        let err = bed
            .svc
            .login(LoginInput { email: "a@x.com".into(), password: "wrongpassword".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Unauthorized));
    }

    #[tokio::test]
    async fn authenticate_resolves_the_subject_and_warms_the_cache() {
        let bed = bed();
        let view = bed.svc.register(register_input()).await.unwrap();
        let session = bed
            .svc
            .login(LoginInput { email: "a@x.com".into(), password: "secretpassword".into() })
            .await
            .unwrap();

        let current = bed.svc.authenticate(&session.token).await.unwrap();
        assert_eq!(current.ulid, view.user_ulid);
        assert!(!current.admin);

        let key = views::user_credentials_key(&view.user_ulid);
        let cached: Option<CredentialsView> =
            views::get_cached(bed.cache.as_ref(), &key).await;
        assert_eq!(cached, Some(view));
    }

    #[tokio::test]
    async fn authenticate_rejects_tokens_for_unknown_subjects() {
        let bed = bed();
        let token = TokenService::new("test-secret", 30)
            .issue("01BX5ZZKBKACTAV9WEVGEMMVRZ", false)
            .unwrap();
        let err = bed.svc.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken));
    }

    #[tokio::test]
    async fn credentials_read_is_read_through() {
        let bed = bed();
        let view = bed.svc.register(register_input()).await.unwrap();
        let key = views::user_credentials_key(&view.user_ulid);
        assert!(bed.cache.get(&key).await.unwrap().is_none());

        let fetched = bed.svc.credentials_by_ulid(&view.user_ulid).await.unwrap();
        assert_eq!(fetched, view);
        assert!(bed.cache.get(&key).await.unwrap().is_some());

        let err = bed.svc.credentials_by_ulid("01BX5ZZKBKACTAV9WEVGEMMVRZ").await.unwrap_err();
        assert!(matches!(err, IdentityError::NotFound(_)));
    }

    #[tokio::test]
    async fn change_password_is_owner_gated_and_invalidates_the_view() {
        let bed = bed();
        let view = bed.svc.register(register_input()).await.unwrap();
        // Warm the cached view first.
        bed.svc.credentials_by_ulid(&view.user_ulid).await.unwrap();

        let stranger = CurrentUser { ulid: "01BX5ZZKBKACTAV9WEVGEMMVRZ".into(), admin: false };
        let err = bed
            .svc
            .change_password(&stranger, &view.user_ulid, "anotherpassword")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Forbidden));

        let owner = CurrentUser { ulid: view.user_ulid.clone(), admin: false };
        bed.svc.change_password(&owner, &view.user_ulid, "anotherpassword").await.unwrap();

        let key = views::user_credentials_key(&view.user_ulid);
        assert!(bed.cache.get(&key).await.unwrap().is_none());

        assert!(bed
            .svc
            .login(LoginInput { email: "a@x.com".into(), password: "anotherpassword".into() })
            .await
            .is_ok());
        assert!(matches!(
            bed.svc
                .login(LoginInput { email: "a@x.com".into(), password: "secretpassword".into() })
                .await,
            Err(IdentityError::Unauthorized)
        ));
    }
}
