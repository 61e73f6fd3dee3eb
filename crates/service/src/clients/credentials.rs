use async_trait::async_trait;

use common::types::ServiceResponse;
use common::INTERNAL_API_KEY_HEADER;

use super::{check_status, upstream};
use crate::errors::IdentityError;
use crate::identity::domain::CredentialsView;

/// Privileged credentials lookup against the peer auth service.
#[async_trait]
pub trait CredentialsClient: Send + Sync {
    async fn credentials_by_ulid(&self, user_ulid: &str) -> Result<CredentialsView, IdentityError>;
}

pub struct HttpCredentialsClient {
    http: reqwest::Client,
    base_url: String,
    internal_api_key: String,
}

impl HttpCredentialsClient {
    pub fn new(base_url: impl Into<String>, internal_api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            internal_api_key: internal_api_key.into(),
        }
    }
}

#[async_trait]
impl CredentialsClient for HttpCredentialsClient {
    async fn credentials_by_ulid(&self, user_ulid: &str) -> Result<CredentialsView, IdentityError> {
        let resp = self
            .http
            .get(format!("{}/api/v1/auth/{}", self.base_url, user_ulid))
            .header(INTERNAL_API_KEY_HEADER, &self.internal_api_key)
            .send()
            .await
            .map_err(upstream)?;
        let resp = check_status(resp)?;
        let envelope: ServiceResponse<CredentialsView> = resp.json().await.map_err(upstream)?;
        // The peer reports a missing record inside a 200 envelope.
        if envelope.status_code == 404 {
            return Err(IdentityError::not_found(format!("user '{user_ulid}'")));
        }
        envelope
            .content
            .ok_or_else(|| IdentityError::Upstream("auth service returned no credentials".into()))
    }
}

/// In-memory fake for the profile read-path tests.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCredentialsClient {
        pub views: Mutex<HashMap<String, CredentialsView>>,
    }

    impl MockCredentialsClient {
        pub fn insert(&self, view: CredentialsView) {
            self.views.lock().unwrap().insert(view.user_ulid.clone(), view);
        }
    }

    #[async_trait]
    impl CredentialsClient for MockCredentialsClient {
        async fn credentials_by_ulid(
            &self,
            user_ulid: &str,
        ) -> Result<CredentialsView, IdentityError> {
            self.views
                .lock()
                .unwrap()
                .get(user_ulid)
                .cloned()
                .ok_or_else(|| IdentityError::not_found(format!("user '{user_ulid}'")))
        }
    }
}
