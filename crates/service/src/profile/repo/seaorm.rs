use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::errors::IdentityError;
use crate::profile::domain::ProfileRecord;
use crate::profile::repository::ProfileRepository;

pub struct SeaOrmProfileRepository {
    pub db: DatabaseConnection,
}

fn to_record(m: models::user::Model) -> ProfileRecord {
    ProfileRecord { ulid: m.ulid, created_at: m.created_at.with_timezone(&Utc) }
}

#[async_trait::async_trait]
impl ProfileRepository for SeaOrmProfileRepository {
    async fn create(&self) -> Result<ProfileRecord, IdentityError> {
        let created = models::user::create(&self.db).await?;
        Ok(to_record(created))
    }

    async fn find_by_ulid(&self, ulid: &str) -> Result<Option<ProfileRecord>, IdentityError> {
        let res = models::user::find_by_ulid(&self.db, ulid).await?;
        Ok(res.map(to_record))
    }

    async fn delete_by_ulid(&self, ulid: &str) -> Result<bool, IdentityError> {
        Ok(models::user::delete_by_ulid(&self.db, ulid).await?)
    }
}
