use async_trait::async_trait;

use super::domain::ProfileRecord;
use crate::errors::IdentityError;

/// Repository abstraction for the profile store.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert a bare profile; the store mints the ULID.
    async fn create(&self) -> Result<ProfileRecord, IdentityError>;

    async fn find_by_ulid(&self, ulid: &str) -> Result<Option<ProfileRecord>, IdentityError>;

    /// Returns whether a row was actually removed; missing rows are fine.
    async fn delete_by_ulid(&self, ulid: &str) -> Result<bool, IdentityError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use ulid::Ulid;

    #[derive(Default)]
    pub struct MockProfileRepository {
        pub rows: Mutex<HashMap<String, ProfileRecord>>,
    }

    impl MockProfileRepository {
        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl ProfileRepository for MockProfileRepository {
        async fn create(&self) -> Result<ProfileRecord, IdentityError> {
            let record =
                ProfileRecord { ulid: Ulid::new().to_string(), created_at: Utc::now() };
            self.rows.lock().unwrap().insert(record.ulid.clone(), record.clone());
            Ok(record)
        }

        async fn find_by_ulid(
            &self,
            ulid: &str,
        ) -> Result<Option<ProfileRecord>, IdentityError> {
            Ok(self.rows.lock().unwrap().get(ulid).cloned())
        }

        async fn delete_by_ulid(&self, ulid: &str) -> Result<bool, IdentityError> {
            Ok(self.rows.lock().unwrap().remove(ulid).is_some())
        }
    }
}
