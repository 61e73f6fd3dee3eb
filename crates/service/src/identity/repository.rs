use async_trait::async_trait;

use super::domain::CredentialsRecord;
use crate::errors::IdentityError;

/// Repository abstraction for the credentials store.
#[async_trait]
pub trait CredentialsRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialsRecord>, IdentityError>;
    async fn find_by_user_ulid(
        &self,
        user_ulid: &str,
    ) -> Result<Option<CredentialsRecord>, IdentityError>;

    /// Insert a fresh record; the email unique constraint is the hard
    /// backstop behind the saga's best-effort lookup.
    async fn create(
        &self,
        user_ulid: &str,
        email: &str,
        password_hash: String,
        salt: String,
    ) -> Result<CredentialsRecord, IdentityError>;

    async fn update_password(
        &self,
        user_ulid: &str,
        password_hash: String,
        salt: String,
    ) -> Result<CredentialsRecord, IdentityError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockCredentialsRepository {
        pub rows: Mutex<HashMap<String, CredentialsRecord>>, // key: user_ulid
        pub fail_create: bool,
    }

    impl MockCredentialsRepository {
        pub fn failing_on_create() -> Self {
            Self { fail_create: true, ..Self::default() }
        }

        /// Seed a record directly, bypassing the saga.
        pub fn insert(&self, record: CredentialsRecord) {
            self.rows.lock().unwrap().insert(record.user_ulid.clone(), record);
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl CredentialsRepository for MockCredentialsRepository {
        async fn find_by_email(
            &self,
            email: &str,
        ) -> Result<Option<CredentialsRecord>, IdentityError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.values().find(|r| r.email == email).cloned())
        }

        async fn find_by_user_ulid(
            &self,
            user_ulid: &str,
        ) -> Result<Option<CredentialsRecord>, IdentityError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.get(user_ulid).cloned())
        }

        async fn create(
            &self,
            user_ulid: &str,
            email: &str,
            password_hash: String,
            salt: String,
        ) -> Result<CredentialsRecord, IdentityError> {
            if self.fail_create {
                return Err(IdentityError::Transient("credentials store offline".into()));
            }
            let mut rows = self.rows.lock().unwrap();
            if rows.values().any(|r| r.email == email) {
                return Err(IdentityError::Conflict);
            }
            let record = CredentialsRecord {
                user_ulid: user_ulid.to_string(),
                email: email.to_string(),
                password_hash,
                salt,
                is_admin: false,
            };
            rows.insert(user_ulid.to_string(), record.clone());
            Ok(record)
        }

        async fn update_password(
            &self,
            user_ulid: &str,
            password_hash: String,
            salt: String,
        ) -> Result<CredentialsRecord, IdentityError> {
            let mut rows = self.rows.lock().unwrap();
            let record = rows
                .get_mut(user_ulid)
                .ok_or_else(|| IdentityError::not_found(format!("user '{user_ulid}'")))?;
            record.password_hash = password_hash;
            record.salt = salt;
            Ok(record.clone())
        }
    }
}
