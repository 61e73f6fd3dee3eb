use sea_orm::DatabaseConnection;

use crate::errors::IdentityError;
use crate::identity::domain::CredentialsRecord;
use crate::identity::repository::CredentialsRepository;

pub struct SeaOrmCredentialsRepository {
    pub db: DatabaseConnection,
}

fn to_record(m: models::user_credentials::Model) -> CredentialsRecord {
    CredentialsRecord {
        user_ulid: m.user_ulid,
        email: m.email,
        password_hash: m.password_hash,
        salt: m.salt,
        is_admin: m.is_admin,
    }
}

#[async_trait::async_trait]
impl CredentialsRepository for SeaOrmCredentialsRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialsRecord>, IdentityError> {
        let res = models::user_credentials::find_by_email(&self.db, email).await?;
        Ok(res.map(to_record))
    }

    async fn find_by_user_ulid(
        &self,
        user_ulid: &str,
    ) -> Result<Option<CredentialsRecord>, IdentityError> {
        let res = models::user_credentials::find_by_user_ulid(&self.db, user_ulid).await?;
        Ok(res.map(to_record))
    }

    async fn create(
        &self,
        user_ulid: &str,
        email: &str,
        password_hash: String,
        salt: String,
    ) -> Result<CredentialsRecord, IdentityError> {
        let created =
            models::user_credentials::create(&self.db, user_ulid, email, password_hash, salt)
                .await?;
        Ok(to_record(created))
    }

    async fn update_password(
        &self,
        user_ulid: &str,
        password_hash: String,
        salt: String,
    ) -> Result<CredentialsRecord, IdentityError> {
        let existing = models::user_credentials::find_by_user_ulid(&self.db, user_ulid)
            .await?
            .ok_or_else(|| IdentityError::not_found(format!("user '{user_ulid}'")))?;
        let updated =
            models::user_credentials::update_password(&self.db, existing, password_hash, salt)
                .await?;
        Ok(to_record(updated))
    }
}
