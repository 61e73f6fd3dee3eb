use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use common::types::ServiceResponse;
use common::INTERNAL_API_KEY_HEADER;

use super::{check_status, upstream};
use crate::errors::IdentityError;

/// Profile snapshot as returned by the users service. Unknown fields are
/// ignored so the profile schema can grow without breaking callers.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDto {
    pub ulid: String,
}

/// Creation/deletion of profiles in the peer users service.
#[async_trait]
pub trait ProfileClient: Send + Sync {
    /// Create a bare profile; the peer mints and returns the ULID.
    async fn create_profile(&self) -> Result<ProfileDto, IdentityError>;

    /// Delete a profile. Idempotent: deleting a missing profile succeeds,
    /// so the saga's compensation may safely run more than once.
    async fn delete_profile(&self, user_ulid: &str) -> Result<(), IdentityError>;
}

pub struct HttpProfileClient {
    http: reqwest::Client,
    base_url: String,
    internal_api_key: String,
}

impl HttpProfileClient {
    pub fn new(base_url: impl Into<String>, internal_api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            internal_api_key: internal_api_key.into(),
        }
    }
}

#[async_trait]
impl ProfileClient for HttpProfileClient {
    async fn create_profile(&self) -> Result<ProfileDto, IdentityError> {
        let resp = self
            .http
            .post(format!("{}/api/v1/users/", self.base_url))
            .header(INTERNAL_API_KEY_HEADER, &self.internal_api_key)
            .send()
            .await
            .map_err(upstream)?;
        let resp = check_status(resp)?;
        let envelope: ServiceResponse<ProfileDto> = resp.json().await.map_err(upstream)?;
        let profile = envelope
            .content
            .ok_or_else(|| IdentityError::Upstream("users service returned no profile".into()))?;
        debug!(user_ulid = %profile.ulid, "profile created by peer");
        Ok(profile)
    }

    async fn delete_profile(&self, user_ulid: &str) -> Result<(), IdentityError> {
        let resp = self
            .http
            .delete(format!("{}/api/v1/users/{}/", self.base_url, user_ulid))
            .header(INTERNAL_API_KEY_HEADER, &self.internal_api_key)
            .send()
            .await
            .map_err(upstream)?;
        if resp.status().as_u16() == 404 {
            // Already gone; the operation is idempotent on missing.
            return Ok(());
        }
        check_status(resp)?;
        debug!(user_ulid, "profile deleted by peer");
        Ok(())
    }
}

/// In-memory fake used by saga and doc-example tests.
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use ulid::Ulid;

    #[derive(Default)]
    pub struct MockProfileClient {
        pub fail_create: bool,
        pub fail_delete: bool,
        pub created: Mutex<Vec<String>>,
        pub deleted: Mutex<Vec<String>>,
    }

    impl MockProfileClient {
        pub fn created_ulids(&self) -> Vec<String> {
            self.created.lock().unwrap().clone()
        }

        pub fn deleted_ulids(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProfileClient for MockProfileClient {
        async fn create_profile(&self) -> Result<ProfileDto, IdentityError> {
            if self.fail_create {
                return Err(IdentityError::Upstream("users service unreachable".into()));
            }
            let ulid = Ulid::new().to_string();
            self.created.lock().unwrap().push(ulid.clone());
            Ok(ProfileDto { ulid })
        }

        async fn delete_profile(&self, user_ulid: &str) -> Result<(), IdentityError> {
            if self.fail_delete {
                return Err(IdentityError::Upstream("users service unreachable".into()));
            }
            self.deleted.lock().unwrap().push(user_ulid.to_string());
            Ok(())
        }
    }
}
